//! Machine Learning Module
//!
//! Inference-only model components for outage risk scoring:
//! - Weather sequence encoders
//! - Gradient-boosted regression trees and a linear scoring surface
//! - The serialized model artifact tying encoder, scaler and surface together
//!
//! Models are fitted offline; this crate only loads and evaluates them.

use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod artifact;
pub mod boosting;
pub mod encoder;
pub mod models;

pub use artifact::{RiskModel, ScoringSurface, StandardScaler};
pub use boosting::{GradientBoostedTrees, RegressionTree, TreeNode};
pub use encoder::WeatherEncoder;
pub use models::{Contributions, LinearRegressionModel, MLModel};

/// ML Model Type
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    LinearRegression,
    GradientBoosting,
}

/// ML Model Metadata
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub model_id: String,
    pub model_type: ModelType,
    pub version: String,
    pub trained_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    pub training_samples: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_metrics: Option<ValidationMetrics>,
    /// Feature order the surface was fit on.
    pub feature_names: Vec<String>,
}

/// Validation Metrics
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationMetrics {
    pub mae: f64,  // Mean Absolute Error
    pub rmse: f64, // Root Mean Square Error
    pub r2: f64,   // R-squared
}

/// Feature Vector for ML models
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    pub features: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl FeatureVector {
    pub fn new(features: Vec<f64>, feature_names: Vec<String>) -> Result<Self> {
        if features.len() != feature_names.len() {
            anyhow::bail!(
                "Feature count mismatch: {} features, {} names",
                features.len(),
                feature_names.len()
            );
        }
        Ok(Self {
            features,
            feature_names,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Same names, different values.
    pub fn with_values(&self, features: Vec<f64>) -> Result<Self> {
        Self::new(features, self.feature_names.clone())
    }

    /// Standardize features using z-score normalization
    pub fn standardize(&self, means: &[f64], stds: &[f64]) -> Result<Self> {
        if means.len() != self.features.len() || stds.len() != self.features.len() {
            anyhow::bail!("Standardization parameter count mismatch");
        }

        let standardized = self
            .features
            .iter()
            .zip(means.iter().zip(stds.iter()))
            .map(|(f, (mean, std))| {
                if std.abs() < 1e-10 {
                    0.0 // Avoid division by zero
                } else {
                    (f - mean) / std
                }
            })
            .collect();

        Ok(Self {
            features: standardized,
            feature_names: self.feature_names.clone(),
        })
    }
}
