use std::time::Instant;

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{error::ApiError, response::ApiResponse};
use crate::app::AppState;
use crate::domain::{
    ConfidenceInterval, Explanation, RiskAssessment, RiskLevel, Scenario, ScoringMode,
};

/// Conditions to score. Accepts `weather_data`/`grid_data` as well as the
/// short `weather`/`grid` keys.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PredictionRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub scenario: Scenario,
    #[serde(default = "default_include_explanation")]
    pub include_explanation: bool,
}

fn default_include_explanation() -> bool {
    true
}

impl PredictionRequest {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            include_explanation: true,
        }
    }
}

/// A [`RiskAssessment`] as returned over HTTP.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResponse {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence_interval: ConfidenceInterval,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    pub contributing_factors: Vec<String>,
    pub scoring_mode: ScoringMode,
    pub prediction_horizon_hours: u32,
    pub generated_at: DateTime<Utc>,
}

impl PredictionResponse {
    pub fn from_assessment(assessment: RiskAssessment, include_explanation: bool) -> Self {
        Self {
            risk_score: assessment.risk_score,
            risk_level: assessment.risk_level,
            confidence_interval: assessment.confidence_interval,
            explanation: include_explanation.then_some(assessment.explanation),
            contributing_factors: assessment.contributing_factors,
            scoring_mode: assessment.scoring_mode,
            prediction_horizon_hours: assessment.prediction_horizon_hours,
            generated_at: assessment.generated_at,
        }
    }
}

/// POST /api/v1/predict
pub async fn predict(
    State(state): State<AppState>,
    Json(request): Json<PredictionRequest>,
) -> Result<ApiResponse<PredictionResponse>, ApiError> {
    request.validate()?;

    let start = Instant::now();
    let engine = state.engine.clone();
    let scenario = request.scenario;
    let assessment = tokio::task::spawn_blocking(move || engine.assess(&scenario)).await?;

    tracing::info!(
        risk_score = assessment.risk_score,
        risk_level = %assessment.risk_level,
        mode = %assessment.scoring_mode,
        "Prediction served"
    );

    Ok(
        ApiResponse::success(PredictionResponse::from_assessment(
            assessment,
            request.include_explanation,
        ))
        .with_duration(start.elapsed().as_millis() as u64),
    )
}

/// POST /api/v1/predict/batch
pub async fn predict_batch(
    State(state): State<AppState>,
    Json(requests): Json<Vec<PredictionRequest>>,
) -> Result<ApiResponse<Vec<PredictionResponse>>, ApiError> {
    let limit = state.cfg.limits.max_batch_predictions;
    if requests.len() > limit {
        return Err(ApiError::BadRequest(format!(
            "Batch size limited to {limit} predictions, got {}",
            requests.len()
        )));
    }
    for (index, request) in requests.iter().enumerate() {
        request
            .validate()
            .map_err(|e| ApiError::ValidationError(format!("request {index}: {e}")))?;
    }

    let start = Instant::now();
    let (scenarios, explain): (Vec<Scenario>, Vec<bool>) = requests
        .into_iter()
        .map(|r| (r.scenario, r.include_explanation))
        .unzip();

    let assessments = state.engine.clone().assess_batch(scenarios).await;
    let responses: Vec<PredictionResponse> = assessments
        .into_iter()
        .zip(explain)
        .map(|(assessment, include)| PredictionResponse::from_assessment(assessment, include))
        .collect();

    tracing::info!(count = responses.len(), "Batch prediction served");

    let count = responses.len();
    Ok(ApiResponse::success(responses)
        .with_count(count)
        .with_duration(start.elapsed().as_millis() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: PredictionRequest = serde_json::from_value(json!({
            "weather_data": {"rainfall": 10.0},
            "grid_data": {}
        }))
        .unwrap();
        assert!(request.include_explanation);
        assert_eq!(request.scenario.prediction_horizon, 24);
        assert_eq!(request.scenario.weather.rainfall, 10.0);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_request_rejects_out_of_range_horizon() {
        let request: PredictionRequest = serde_json::from_value(json!({
            "weather_data": {},
            "grid_data": {},
            "prediction_horizon": 96
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_rejects_out_of_range_humidity() {
        let request: PredictionRequest = serde_json::from_value(json!({
            "weather_data": {"humidity": 140.0},
            "grid_data": {}
        }))
        .unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_explanation_omitted_on_request() {
        let assessment = RiskAssessment::failed(ScoringMode::Fallback, 24);
        let response = PredictionResponse::from_assessment(assessment.clone(), false);
        let body = serde_json::to_value(&response).unwrap();
        assert!(body.get("explanation").is_none());
        assert_eq!(body["risk_level"], "low");

        let response = PredictionResponse::from_assessment(assessment, true);
        assert!(response.explanation.is_some());
    }
}
