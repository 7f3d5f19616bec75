//! Shared builders for the integration suites.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};

use outage_risk_forecaster::app::AppState;
use outage_risk_forecaster::config::Config;
use outage_risk_forecaster::domain::{GridFeatures, Scenario, WeatherFeatures};
use outage_risk_forecaster::forecast::FeatureLayout;
use outage_risk_forecaster::ml::{
    LinearRegressionModel, ModelMetadata, ModelType, RiskModel, ScoringSurface, WeatherEncoder,
};
use outage_risk_forecaster::risk::{RiskEngine, UncertaintyConfig};

/// Passthrough layout positions.
pub const WIND_SPEED: usize = 2;
pub const RAINFALL: usize = 3;
pub const FEATURE_COUNT: usize = 15;

pub fn linear_model(coefficients: Vec<f64>, intercept: f64) -> RiskModel {
    let layout = FeatureLayout::for_encoder(&WeatherEncoder::Passthrough);
    RiskModel {
        metadata: ModelMetadata {
            model_id: "linear-test".into(),
            model_type: ModelType::LinearRegression,
            version: "1.0.0".into(),
            trained_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            training_samples: 0,
            validation_metrics: None,
            feature_names: layout.names,
        },
        encoder: WeatherEncoder::Passthrough,
        scaler: None,
        surface: ScoringSurface::Linear(LinearRegressionModel::new(coefficients, intercept)),
    }
}

/// A model whose score is `slope * x[index] + intercept`.
pub fn single_feature_engine(index: usize, slope: f64, intercept: f64) -> RiskEngine {
    let mut coefficients = vec![0.0; FEATURE_COUNT];
    coefficients[index] = slope;
    let model = linear_model(coefficients, intercept);
    model.validate().unwrap();
    RiskEngine::with_model(model, UncertaintyConfig::default())
}

pub fn fallback_engine() -> RiskEngine {
    RiskEngine::fallback(UncertaintyConfig::default())
}

pub fn scenario(weather: WeatherFeatures, grid: GridFeatures) -> Scenario {
    Scenario::new(weather, grid).at(Utc.with_ymd_and_hms(2024, 7, 15, 14, 0, 0).unwrap())
}

pub fn state(engine: RiskEngine) -> AppState {
    AppState::with_engine(Config::default(), engine)
}
