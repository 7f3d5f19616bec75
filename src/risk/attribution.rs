use anyhow::Result;
use itertools::Itertools;
use std::sync::Arc;

use super::scorer::{FallbackTerms, ScoringInput};
use crate::domain::{Explanation, ExplanationMethod, FeatureImpact, GridFeatures, WeatherFeatures};
use crate::ml::{FeatureVector, MLModel, RiskModel};

/// Entries kept in `top_features` and `contributing_factors`.
pub const TOP_N: usize = 5;

pub const NORMAL_RANGE_FACTOR: &str = "Risk within normal range";

/// Explains a score in terms of its inputs.
#[derive(Debug, Clone)]
pub enum Attributor {
    /// Contributions reported by the fitted surface, in vector order.
    ModelBacked(Arc<RiskModel>),
    /// Terms of the fallback weighted sum.
    RuleBased,
}

impl Attributor {
    pub fn explain(&self, input: ScoringInput<'_>, working: &FeatureVector) -> Result<Explanation> {
        let (method, base_value, attributions): (_, _, Vec<FeatureImpact>) = match self {
            Self::ModelBacked(model) => {
                let contributions = model.contributions(working)?;
                let attributions = working
                    .feature_names
                    .iter()
                    .zip(contributions.values)
                    .map(|(name, impact)| FeatureImpact::new(name.clone(), impact))
                    .collect();
                (
                    ExplanationMethod::ModelAttribution,
                    contributions.base_value,
                    attributions,
                )
            }
            Self::RuleBased => {
                let attributions = FallbackTerms::new(input.weather, input.grid)
                    .iter()
                    .map(|(name, impact)| FeatureImpact::new(name, impact))
                    .collect();
                (ExplanationMethod::Heuristic, 0.0, attributions)
            }
        };

        Ok(Explanation {
            method,
            base_value: Some(base_value),
            top_features: rank(&attributions),
            attributions,
        })
    }
}

/// Top entries by absolute impact. Ties keep vector order.
pub fn rank(attributions: &[FeatureImpact]) -> Vec<FeatureImpact> {
    attributions
        .iter()
        .sorted_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()))
        .take(TOP_N)
        .cloned()
        .collect()
}

/// Human-readable drivers of the current conditions, in fixed priority order.
pub fn contributing_factors(weather: &WeatherFeatures, grid: &GridFeatures) -> Vec<String> {
    let rules = [
        (weather.rainfall > 25.0, "Heavy rainfall expected"),
        (weather.storm_alert, "Active storm warning"),
        (grid.voltage_stability < 0.7, "Grid voltage instability"),
        (grid.load_factor > 0.8, "High electrical demand"),
        (weather.lightning_strikes > 5, "Lightning activity detected"),
        (grid.feeder_health < 0.6, "Poor feeder condition"),
        (grid.maintenance_status, "Equipment under maintenance"),
    ];

    let factors: Vec<String> = rules
        .iter()
        .filter(|(fired, _)| *fired)
        .map(|(_, factor)| factor.to_string())
        .unique()
        .take(TOP_N)
        .collect();

    if factors.is_empty() {
        vec![NORMAL_RANGE_FACTOR.to_string()]
    } else {
        factors
    }
}
