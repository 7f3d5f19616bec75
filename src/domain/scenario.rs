use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::{GridFeatures, GridField, WeatherFeatures, WeatherField};
use crate::error::EngineError;

pub const DEFAULT_PREDICTION_HORIZON_HOURS: u32 = 24;

/// Weather and grid conditions to be scored, plus the forecast horizon.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Scenario {
    #[serde(alias = "weather_data")]
    #[validate(nested)]
    pub weather: WeatherFeatures,
    #[serde(alias = "grid_data")]
    #[validate(nested)]
    pub grid: GridFeatures,
    /// Forecast horizon in hours. Informational at the scoring layer.
    #[serde(default = "default_horizon")]
    #[validate(range(min = 1, max = 72))]
    pub prediction_horizon: u32,
    /// Instant the temporal features are derived from; `None` means "now".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<DateTime<Utc>>,
}

fn default_horizon() -> u32 {
    DEFAULT_PREDICTION_HORIZON_HOURS
}

impl Scenario {
    pub fn new(weather: WeatherFeatures, grid: GridFeatures) -> Self {
        Self {
            weather,
            grid,
            prediction_horizon: DEFAULT_PREDICTION_HORIZON_HOURS,
            reference_time: None,
        }
    }

    pub fn at(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn get(&self, path: ParameterPath) -> Option<f64> {
        match path {
            ParameterPath::Weather(field) => self.weather.get(field),
            ParameterPath::Grid(field) => self.grid.get(field),
            ParameterPath::PredictionHorizon => Some(self.prediction_horizon as f64),
        }
    }

    /// Overwrite the value at `path` in place.
    pub fn set(&mut self, path: ParameterPath, value: ParameterValue) -> Result<(), EngineError> {
        let result = match path {
            ParameterPath::Weather(field) => self.weather.set(field, value),
            ParameterPath::Grid(field) => self.grid.set(field, value),
            ParameterPath::PredictionHorizon => value.count().and_then(|hours| {
                if (1..=72).contains(&hours) {
                    self.prediction_horizon = hours;
                    Ok(())
                } else {
                    Err(format!("horizon must be 1..=72 hours, got {hours}"))
                }
            }),
        };
        result.map_err(|reason| EngineError::InvalidParameterValue {
            path: path.to_string(),
            reason,
        })
    }
}

/// A dotted reference to one scenario field, e.g. `weather.rainfall`.
///
/// The roots `weather_data` and `grid_data` are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterPath {
    Weather(WeatherField),
    Grid(GridField),
    PredictionHorizon,
}

impl FromStr for ParameterPath {
    type Err = EngineError;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| EngineError::InvalidParameterPath {
            path: path.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();
        let leaf = segments.next();
        if segments.next().is_some() {
            return Err(invalid("too many segments"));
        }

        match (root, leaf) {
            ("prediction_horizon", None) => Ok(Self::PredictionHorizon),
            ("weather" | "weather_data", Some(field)) => field
                .parse()
                .map(Self::Weather)
                .map_err(|_| invalid("unknown weather field")),
            ("grid" | "grid_data", Some(field)) => field
                .parse()
                .map(Self::Grid)
                .map_err(|_| invalid("unknown grid field")),
            (_, None) => Err(invalid("expected <weather|grid>.<field>")),
            _ => Err(invalid("unknown root segment")),
        }
    }
}

impl fmt::Display for ParameterPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Weather(field) => write!(f, "weather.{field}"),
            Self::Grid(field) => write!(f, "grid.{field}"),
            Self::PredictionHorizon => write!(f, "prediction_horizon"),
        }
    }
}

impl Serialize for ParameterPath {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ParameterPath {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Value assigned by an override. Numbers and flags coerce into each other
/// the way JSON clients tend to send them (`1` for true, `true` for 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParameterValue {
    Number(f64),
    Flag(bool),
}

impl ParameterValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Number(n) => n,
            Self::Flag(true) => 1.0,
            Self::Flag(false) => 0.0,
        }
    }

    pub fn as_bool(&self) -> bool {
        match *self {
            Self::Number(n) => n != 0.0,
            Self::Flag(b) => b,
        }
    }

    pub(crate) fn finite(&self) -> Result<f64, String> {
        let n = self.as_f64();
        if n.is_finite() {
            Ok(n)
        } else {
            Err(format!("expected a finite number, got {n}"))
        }
    }

    pub(crate) fn count(&self) -> Result<u32, String> {
        let n = self.finite()?;
        if n < 0.0 || n > u32::MAX as f64 {
            return Err(format!("expected a non-negative count, got {n}"));
        }
        Ok(n.round() as u32)
    }
}

impl TryFrom<&serde_json::Value> for ParameterValue {
    type Error = String;

    fn try_from(value: &serde_json::Value) -> Result<Self, Self::Error> {
        match value {
            serde_json::Value::Bool(b) => Ok(Self::Flag(*b)),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .ok_or_else(|| format!("number {n} is not representable")),
            other => Err(format!("expected a number or boolean, got {other}")),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<bool> for ParameterValue {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}
