use std::time::Instant;

use axum::{
    extract::{Path, State},
    Json,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{
    error::ApiError,
    predictions::{PredictionRequest, PredictionResponse},
    response::ApiResponse,
};
use crate::app::AppState;
use crate::risk::RiskEngine;
use crate::scenario::{
    templates, BatchSummary, ImpactAnalysis, Overrides, ScenarioComparison, ScenarioDiffer,
    ScenarioTemplate, SensitivityAnalyzer, SensitivityResult,
};

const DEFAULT_SCENARIO_NAME: &str = "Custom Scenario";
const DEFAULT_SENSITIVITY_STEPS: usize = 10;

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct WhatIfRequest {
    #[validate(nested)]
    pub base_scenario: PredictionRequest,
    /// Dotted parameter path to new value, e.g. `{"weather.rainfall": 40}`
    #[cfg_attr(feature = "swagger", schema(value_type = Object))]
    pub modified_parameters: Overrides,
    #[serde(default = "default_scenario_name")]
    pub scenario_name: String,
}

fn default_scenario_name() -> String {
    DEFAULT_SCENARIO_NAME.to_string()
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct WhatIfResponse {
    pub simulation_id: Uuid,
    pub scenario_name: String,
    pub base_prediction: PredictionResponse,
    pub modified_prediction: PredictionResponse,
    pub risk_change: f64,
    pub impact_analysis: ImpactAnalysis,
}

impl WhatIfResponse {
    fn new(scenario_name: String, include_explanation: bool, comparison: ScenarioComparison) -> Self {
        Self {
            simulation_id: Uuid::new_v4(),
            scenario_name,
            risk_change: comparison.risk_change(),
            base_prediction: PredictionResponse::from_assessment(comparison.base, false),
            modified_prediction: PredictionResponse::from_assessment(
                comparison.modified,
                include_explanation,
            ),
            impact_analysis: comparison.impact,
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct WhatIfBatchResponse {
    pub results: Vec<WhatIfResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_summary: Option<BatchSummary>,
    pub total_simulations: usize,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<ScenarioTemplate>,
    pub total_templates: usize,
    pub usage_instructions: &'static str,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SensitivityRequest {
    #[validate(nested)]
    pub base_scenario: PredictionRequest,
    pub parameter: String,
    pub min_value: f64,
    pub max_value: f64,
    #[serde(default = "default_steps")]
    pub steps: usize,
}

fn default_steps() -> usize {
    DEFAULT_SENSITIVITY_STEPS
}

fn run_what_if(engine: &RiskEngine, request: WhatIfRequest) -> WhatIfResponse {
    let comparison =
        ScenarioDiffer::new(engine).compare(&request.base_scenario.scenario, &request.modified_parameters);
    WhatIfResponse::new(
        request.scenario_name,
        request.base_scenario.include_explanation,
        comparison,
    )
}

/// POST /api/v1/what-if
pub async fn what_if(
    State(state): State<AppState>,
    Json(request): Json<WhatIfRequest>,
) -> Result<ApiResponse<WhatIfResponse>, ApiError> {
    request.validate()?;

    let start = Instant::now();
    let engine = state.engine.clone();
    let response = tokio::task::spawn_blocking(move || run_what_if(&engine, request)).await?;

    tracing::info!(
        simulation_id = %response.simulation_id,
        scenario = %response.scenario_name,
        risk_change = response.risk_change,
        "What-if simulation served"
    );

    Ok(ApiResponse::success(response).with_duration(start.elapsed().as_millis() as u64))
}

/// POST /api/v1/what-if/batch
pub async fn what_if_batch(
    State(state): State<AppState>,
    Json(requests): Json<Vec<WhatIfRequest>>,
) -> Result<ApiResponse<WhatIfBatchResponse>, ApiError> {
    let limit = state.cfg.limits.max_batch_scenarios;
    if requests.len() > limit {
        return Err(ApiError::BadRequest(format!(
            "Batch size limited to {limit} scenarios, got {}",
            requests.len()
        )));
    }
    for (index, request) in requests.iter().enumerate() {
        request
            .validate()
            .map_err(|e| ApiError::ValidationError(format!("scenario {index}: {e}")))?;
    }

    let start = Instant::now();
    let handles = requests.into_iter().map(|request| {
        let engine = state.engine.clone();
        tokio::task::spawn_blocking(move || run_what_if(&engine, request))
    });
    let results = join_all(handles)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let batch_summary = BatchSummary::from_changes(
        results
            .iter()
            .map(|r| (r.scenario_name.as_str(), r.risk_change)),
    );

    tracing::info!(count = results.len(), "What-if batch served");

    let total_simulations = results.len();
    Ok(ApiResponse::success(WhatIfBatchResponse {
        results,
        batch_summary,
        total_simulations,
    })
    .with_count(total_simulations)
    .with_duration(start.elapsed().as_millis() as u64))
}

/// GET /api/v1/what-if/templates
pub async fn list_templates() -> ApiResponse<TemplatesResponse> {
    let templates = templates::templates();
    let total_templates = templates.len();
    ApiResponse::success(TemplatesResponse {
        templates,
        total_templates,
        usage_instructions: "Use template modifications as modified_parameters in a what-if request",
    })
}

/// GET /api/v1/what-if/templates/:key
pub async fn get_template(Path(key): Path<String>) -> Result<ApiResponse<ScenarioTemplate>, ApiError> {
    templates::find(&key)
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::NotFound(format!("template '{key}'")))
}

/// POST /api/v1/what-if/sensitivity
pub async fn sensitivity(
    State(state): State<AppState>,
    Json(request): Json<SensitivityRequest>,
) -> Result<ApiResponse<SensitivityResult>, ApiError> {
    request.validate()?;

    let start = Instant::now();
    let engine = state.engine.clone();
    let max_steps = state.cfg.limits.max_sensitivity_steps;
    let result = tokio::task::spawn_blocking(move || {
        SensitivityAnalyzer::new(engine.as_ref())
            .with_max_steps(max_steps)
            .analyze(
                &request.base_scenario.scenario,
                &request.parameter,
                request.min_value,
                request.max_value,
                request.steps,
            )
    })
    .await??;

    Ok(ApiResponse::success(result).with_duration(start.elapsed().as_millis() as u64))
}
