use anyhow::Result;
use std::sync::Arc;

use crate::domain::{GridFeatures, ScoringMode, WeatherFeatures};
use crate::error::EngineError;
use crate::ml::{FeatureVector, MLModel, RiskModel};

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

/// Raw conditions behind a feature vector. The fallback rule reads these
/// directly.
#[derive(Debug, Clone, Copy)]
pub struct ScoringInput<'a> {
    pub weather: &'a WeatherFeatures,
    pub grid: &'a GridFeatures,
}

/// Terms of the no-model weighted sum, in summation order.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackTerms([(&'static str, f64); 8]);

impl FallbackTerms {
    pub fn new(weather: &WeatherFeatures, grid: &GridFeatures) -> Self {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        Self([
            ("rainfall", 0.8 * weather.rainfall),
            ("wind_speed", 0.3 * weather.wind_speed),
            ("lightning_strikes", 2.0 * weather.lightning_strikes as f64),
            ("storm_alert", 20.0 * flag(weather.storm_alert)),
            ("voltage_stability", 30.0 * (1.0 - grid.voltage_stability)),
            ("load_factor", 25.0 * grid.load_factor),
            ("maintenance_status", 15.0 * flag(grid.maintenance_status)),
            ("feeder_health", 20.0 * (1.0 - grid.feeder_health)),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.0.iter().copied()
    }

    /// Left-to-right sum, unclamped.
    pub fn total(&self) -> f64 {
        self.0.iter().fold(0.0, |acc, (_, term)| acc + term)
    }
}

/// Maps a feature vector to a risk score in [0, 100].
#[derive(Debug, Clone)]
pub enum RiskScorer {
    Model(Arc<RiskModel>),
    Fallback,
}

impl RiskScorer {
    pub fn mode(&self) -> ScoringMode {
        match self {
            Self::Model(_) => ScoringMode::Model,
            Self::Fallback => ScoringMode::Fallback,
        }
    }

    /// Whether the score depends on the working vector at all.
    pub fn responds_to_features(&self) -> bool {
        matches!(self, Self::Model(_))
    }

    /// The vector the scorer actually consumes: standardized in model mode,
    /// raw otherwise.
    pub fn working_features(&self, raw: &FeatureVector) -> Result<FeatureVector> {
        match self {
            Self::Model(model) => model.scale(raw),
            Self::Fallback => Ok(raw.clone()),
        }
    }

    pub fn score_working(&self, input: ScoringInput<'_>, working: &FeatureVector) -> Result<f64> {
        let raw = match self {
            Self::Model(model) => model.predict(working)?,
            Self::Fallback => FallbackTerms::new(input.weather, input.grid).total(),
        };
        clamp_score(raw)
    }

    pub fn score(&self, input: ScoringInput<'_>, raw: &FeatureVector) -> Result<f64> {
        let working = self.working_features(raw)?;
        self.score_working(input, &working)
    }
}

fn clamp_score(raw: f64) -> Result<f64> {
    if raw.is_nan() {
        return Err(EngineError::NonFiniteScore.into());
    }
    Ok(raw.clamp(MIN_SCORE, MAX_SCORE))
}
