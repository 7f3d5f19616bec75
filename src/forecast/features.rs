//! Feature engineering for the risk scorer
//!
//! Merges the weather embedding, grid status and temporal context into one
//! ordered, named feature vector.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{GridFeatures, WeatherFeatures};
use crate::error::EngineError;
use crate::ml::encoder::{weather_sequence, WeatherEncoder};
use crate::ml::FeatureVector;

/// Grid block, in contract order.
pub const GRID_FEATURES: [&str; 5] = [
    "load_factor",
    "voltage_stability",
    "historical_outages",
    "maintenance_status",
    "feeder_health",
];

/// Temporal block, in contract order.
pub const TEMPORAL_FEATURES: [&str; 4] = ["hour_of_day", "day_of_week", "month", "season"];

/// Grid features that take fractional values and may be perturbed.
const CONTINUOUS_GRID_FEATURES: [&str; 3] = ["load_factor", "voltage_stability", "feeder_health"];

/// Calendar features derived from a timestamp
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalContext {
    /// Hour of day (0-23)
    pub hour_of_day: u32,
    /// Day of week (0=Monday, 6=Sunday)
    pub day_of_week: u32,
    /// Month (1-12)
    pub month: u32,
    /// Season (0=winter, 1=summer, 2=monsoon, 3=post-monsoon)
    pub season: u32,
}

impl TemporalContext {
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        let month = timestamp.month();
        Self {
            hour_of_day: timestamp.hour(),
            day_of_week: timestamp.weekday().num_days_from_monday(),
            month,
            season: Self::season_of(month),
        }
    }

    pub fn season_of(month: u32) -> u32 {
        match month {
            12 | 1 | 2 => 0,     // Winter
            3..=5 => 1,          // Summer
            6..=9 => 2,          // Monsoon
            10 | 11 => 3,        // Post-monsoon
            _ => 0,
        }
    }

    fn values(&self) -> [f64; 4] {
        [
            self.hour_of_day as f64,
            self.day_of_week as f64,
            self.month as f64,
            self.season as f64,
        ]
    }
}

/// Names and perturbability of every position in the feature vector.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureLayout {
    pub names: Vec<String>,
    pub continuous: Vec<bool>,
}

impl FeatureLayout {
    pub fn for_encoder(encoder: &WeatherEncoder) -> Self {
        let names: Vec<String> = encoder
            .feature_names()
            .into_iter()
            .chain(GRID_FEATURES.iter().map(|n| n.to_string()))
            .chain(TEMPORAL_FEATURES.iter().map(|n| n.to_string()))
            .collect();

        let continuous = encoder
            .continuous()
            .into_iter()
            .chain(GRID_FEATURES.iter().map(|n| CONTINUOUS_GRID_FEATURES.contains(n)))
            .chain(TEMPORAL_FEATURES.iter().map(|_| false))
            .collect();

        Self { names, continuous }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Ensure a fitted model was trained on exactly this layout.
    pub fn check(&self, fitted: &[String]) -> Result<(), EngineError> {
        if fitted.len() != self.names.len() {
            return Err(EngineError::FeatureCountMismatch {
                expected: self.names.len(),
                actual: fitted.len(),
            });
        }
        match self.names.iter().zip(fitted).position(|(a, b)| a != b) {
            Some(index) => Err(EngineError::FeatureOrderMismatch {
                index,
                expected: self.names[index].clone(),
                actual: fitted[index].clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Builds feature vectors in the layout the scorer was fit on
#[derive(Debug, Clone)]
pub struct FeatureComposer {
    encoder: WeatherEncoder,
    layout: FeatureLayout,
}

impl Default for FeatureComposer {
    fn default() -> Self {
        Self::new(WeatherEncoder::Passthrough)
    }
}

impl FeatureComposer {
    pub fn new(encoder: WeatherEncoder) -> Self {
        let layout = FeatureLayout::for_encoder(&encoder);
        Self { encoder, layout }
    }

    pub fn layout(&self) -> &FeatureLayout {
        &self.layout
    }

    /// Compose the raw (unscaled) feature vector. Never fails.
    pub fn compose(
        &self,
        weather: &WeatherFeatures,
        grid: &GridFeatures,
        reference_time: DateTime<Utc>,
    ) -> FeatureVector {
        let embedding = self.encoder.encode(&weather_sequence(weather));
        let temporal = TemporalContext::from_timestamp(reference_time);

        let features: Vec<f64> = embedding
            .into_iter()
            .chain([
                grid.load_factor,
                grid.voltage_stability,
                grid.historical_outages as f64,
                if grid.maintenance_status { 1.0 } else { 0.0 },
                grid.feeder_health,
            ])
            .chain(temporal.values())
            .collect();

        debug_assert_eq!(features.len(), self.layout.len());
        FeatureVector {
            features,
            feature_names: self.layout.names.clone(),
        }
    }
}
