use utoipa::OpenApi;

use crate::api::model::ModelInfo;
use crate::api::predictions::{PredictionRequest, PredictionResponse};
use crate::api::simulation::{
    SensitivityRequest, TemplatesResponse, WhatIfBatchResponse, WhatIfRequest, WhatIfResponse,
};
use crate::domain::{
    ConfidenceInterval, Explanation, ExplanationMethod, FeatureImpact, GridFeatures,
    RiskAssessment, RiskLevel, Scenario, ScoringMode, WeatherFeatures,
};
use crate::scenario::{BatchSummary, ImpactAnalysis, ScenarioTemplate, SensitivityResult};

#[derive(OpenApi)]
#[openapi(
    components(schemas(
        PredictionRequest,
        PredictionResponse,
        WhatIfRequest,
        WhatIfResponse,
        WhatIfBatchResponse,
        TemplatesResponse,
        SensitivityRequest,
        ModelInfo,
        Scenario,
        WeatherFeatures,
        GridFeatures,
        RiskAssessment,
        RiskLevel,
        ScoringMode,
        ConfidenceInterval,
        Explanation,
        ExplanationMethod,
        FeatureImpact,
        ImpactAnalysis,
        BatchSummary,
        ScenarioTemplate,
        SensitivityResult,
    )),
    tags((name = "outage-risk", description = "Outage risk scoring and scenario analysis API v1"))
)]
pub struct ApiDoc;
