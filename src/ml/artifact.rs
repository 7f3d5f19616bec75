//! Serialized risk model
//!
//! One JSON document carrying the metadata, weather encoder, feature scaler
//! and scoring surface of a model fitted offline.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use super::boosting::GradientBoostedTrees;
use super::encoder::WeatherEncoder;
use super::models::{Contributions, LinearRegressionModel, MLModel};
use super::{FeatureVector, ModelMetadata, ModelType};
use crate::error::EngineError;
use crate::forecast::features::{FeatureComposer, FeatureLayout};

/// Per-feature z-score parameters captured at fit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn transform(&self, features: &FeatureVector) -> Result<FeatureVector> {
        features.standardize(&self.mean, &self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoringSurface {
    GradientBoosting(GradientBoostedTrees),
    Linear(LinearRegressionModel),
}

impl ScoringSurface {
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::GradientBoosting(_) => ModelType::GradientBoosting,
            Self::Linear(_) => ModelType::LinearRegression,
        }
    }

    fn as_model(&self) -> &dyn MLModel {
        match self {
            Self::GradientBoosting(m) => m,
            Self::Linear(m) => m,
        }
    }
}

impl MLModel for ScoringSurface {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.as_model().predict(features)
    }

    fn contributions(&self, features: &FeatureVector) -> Result<Contributions> {
        self.as_model().contributions(features)
    }

    fn n_features(&self) -> usize {
        self.as_model().n_features()
    }
}

/// Fitted encoder + scaler + scoring surface, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskModel {
    pub metadata: ModelMetadata,
    #[serde(default)]
    pub encoder: WeatherEncoder,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scaler: Option<StandardScaler>,
    pub surface: ScoringSurface,
}

impl RiskModel {
    /// Read and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read model artifact {}", path.display()))?;
        let model = Self::from_json(&raw)
            .with_context(|| format!("Invalid model artifact {}", path.display()))?;

        info!(
            model_id = %model.metadata.model_id,
            version = %model.metadata.version,
            model_type = ?model.surface.model_type(),
            features = model.metadata.feature_names.len(),
            "Loaded risk model"
        );
        Ok(model)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(raw).context("Malformed model JSON")?;
        model.validate()?;
        Ok(model)
    }

    /// Reject artifacts whose shapes disagree with the feature contract.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.encoder.validate()?;

        let layout = self.layout();
        layout.check(&self.metadata.feature_names)?;

        if self.metadata.model_type != self.surface.model_type() {
            return Err(EngineError::InvalidModel(format!(
                "metadata declares {:?} but surface is {:?}",
                self.metadata.model_type,
                self.surface.model_type()
            )));
        }
        if self.surface.n_features() != layout.len() {
            return Err(EngineError::FeatureCountMismatch {
                expected: layout.len(),
                actual: self.surface.n_features(),
            });
        }
        if let ScoringSurface::GradientBoosting(trees) = &self.surface {
            trees.validate()?;
        }
        if let Some(scaler) = &self.scaler {
            if scaler.mean.len() != layout.len() || scaler.scale.len() != layout.len() {
                return Err(EngineError::InvalidModel(format!(
                    "scaler has {}/{} parameters for {} features",
                    scaler.mean.len(),
                    scaler.scale.len(),
                    layout.len()
                )));
            }
        }
        Ok(())
    }

    pub fn layout(&self) -> FeatureLayout {
        FeatureLayout::for_encoder(&self.encoder)
    }

    pub fn composer(&self) -> FeatureComposer {
        FeatureComposer::new(self.encoder.clone())
    }

    /// Map a raw vector into the space the surface was fit in.
    pub fn scale(&self, raw: &FeatureVector) -> Result<FeatureVector> {
        match &self.scaler {
            Some(scaler) => scaler.transform(raw),
            None => Ok(raw.clone()),
        }
    }
}

impl MLModel for RiskModel {
    /// Expects an already scaled vector.
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.surface.predict(features)
    }

    fn contributions(&self, features: &FeatureVector) -> Result<Contributions> {
        self.surface.contributions(features)
    }

    fn n_features(&self) -> usize {
        self.surface.n_features()
    }
}
