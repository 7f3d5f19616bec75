//! Weather sequence encoders
//!
//! A weather snapshot is expanded into a fixed-length hourly sequence and
//! reduced to an embedding that heads the feature vector.

use serde::{Deserialize, Serialize};

use crate::domain::WeatherFeatures;
use crate::error::EngineError;

/// Hours in an encoder input sequence.
pub const SEQUENCE_LENGTH: usize = 24;

/// Channels per sequence step, in order.
pub const WEATHER_CHANNELS: [&str; 6] = [
    "temperature",
    "humidity",
    "wind_speed",
    "rainfall",
    "lightning_strikes",
    "storm_alert",
];

const DISCRETE_WEATHER_CHANNELS: [&str; 2] = ["lightning_strikes", "storm_alert"];

pub type WeatherStep = [f64; WEATHER_CHANNELS.len()];

/// Expand a snapshot into an hourly sequence. Without history every step
/// repeats the snapshot.
pub fn weather_sequence(weather: &WeatherFeatures) -> Vec<WeatherStep> {
    let step = [
        weather.temperature,
        weather.humidity,
        weather.wind_speed,
        weather.rainfall,
        weather.lightning_strikes as f64,
        if weather.storm_alert { 1.0 } else { 0.0 },
    ];
    vec![step; SEQUENCE_LENGTH]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WeatherEncoder {
    /// Embedding is the last step's channels, unchanged.
    #[default]
    Passthrough,
    /// Mean-pool over time, then `tanh(W·x + b)`.
    Projection {
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
    },
}

impl WeatherEncoder {
    pub fn width(&self) -> usize {
        match self {
            Self::Passthrough => WEATHER_CHANNELS.len(),
            Self::Projection { weights, .. } => weights.len(),
        }
    }

    pub fn feature_names(&self) -> Vec<String> {
        match self {
            Self::Passthrough => WEATHER_CHANNELS.iter().map(|c| c.to_string()).collect(),
            Self::Projection { weights, .. } => {
                (0..weights.len()).map(|i| format!("weather_emb_{i}")).collect()
            }
        }
    }

    /// Which embedding positions take fractional values. Passthrough keeps the
    /// strike count and alert flag discrete.
    pub fn continuous(&self) -> Vec<bool> {
        match self {
            Self::Passthrough => WEATHER_CHANNELS
                .iter()
                .map(|c| !DISCRETE_WEATHER_CHANNELS.contains(c))
                .collect(),
            Self::Projection { weights, .. } => vec![true; weights.len()],
        }
    }

    /// Check projection shapes. Called once when an artifact is loaded.
    pub fn validate(&self) -> Result<(), EngineError> {
        let Self::Projection { weights, bias } = self else {
            return Ok(());
        };
        if weights.is_empty() {
            return Err(EngineError::InvalidModel(
                "projection encoder has no rows".into(),
            ));
        }
        if bias.len() != weights.len() {
            return Err(EngineError::InvalidModel(format!(
                "projection bias has {} entries for {} rows",
                bias.len(),
                weights.len()
            )));
        }
        if let Some((row, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| w.len() != WEATHER_CHANNELS.len())
        {
            return Err(EngineError::InvalidModel(format!(
                "projection row {row} has {} weights, expected {}",
                w.len(),
                WEATHER_CHANNELS.len()
            )));
        }
        Ok(())
    }

    pub fn encode(&self, sequence: &[WeatherStep]) -> Vec<f64> {
        match self {
            Self::Passthrough => sequence
                .last()
                .map(|step| step.to_vec())
                .unwrap_or_else(|| vec![0.0; WEATHER_CHANNELS.len()]),
            Self::Projection { weights, bias } => {
                let pooled = mean_pool(sequence);
                weights
                    .iter()
                    .zip(bias)
                    .map(|(row, b)| {
                        let z: f64 = row.iter().zip(&pooled).map(|(w, x)| w * x).sum::<f64>() + b;
                        z.tanh()
                    })
                    .collect()
            }
        }
    }
}

fn mean_pool(sequence: &[WeatherStep]) -> WeatherStep {
    let mut pooled = [0.0; WEATHER_CHANNELS.len()];
    if sequence.is_empty() {
        return pooled;
    }
    for step in sequence {
        for (acc, x) in pooled.iter_mut().zip(step) {
            *acc += x;
        }
    }
    let n = sequence.len() as f64;
    pooled.iter_mut().for_each(|acc| *acc /= n);
    pooled
}
