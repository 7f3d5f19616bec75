use axum::extract::State;
use serde::Serialize;

use super::response::ApiResponse;
use crate::app::AppState;
use crate::domain::ScoringMode;
use crate::forecast::FeatureLayout;
use crate::ml::ModelMetadata;
use crate::risk::UncertaintyConfig;

const FALLBACK_NOTICE: &str =
    "No model artifact loaded; scores come from the fixed weighted-sum rule";

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub scoring_mode: ScoringMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ModelMetadata>,
    pub feature_layout: FeatureLayout,
    pub uncertainty: UncertaintyConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<&'static str>,
}

/// GET /api/v1/model
pub async fn model_info(State(state): State<AppState>) -> ApiResponse<ModelInfo> {
    let engine = &state.engine;
    let metadata = engine.model().map(|m| m.metadata.clone());
    let notice = metadata.is_none().then_some(FALLBACK_NOTICE);

    ApiResponse::success(ModelInfo {
        scoring_mode: engine.mode(),
        metadata,
        feature_layout: engine.layout().clone(),
        uncertainty: *engine.uncertainty(),
        notice,
    })
}
