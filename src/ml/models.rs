//! ML Model Definitions
//!
//! The scoring-surface trait and the linear surface.

use super::FeatureVector;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Per-feature additive contributions: `base_value + Σ values == prediction`.
#[derive(Debug, Clone, PartialEq)]
pub struct Contributions {
    pub base_value: f64,
    pub values: Vec<f64>,
}

/// Trait for ML models
pub trait MLModel: Send + Sync {
    /// Predict a value from features
    fn predict(&self, features: &FeatureVector) -> Result<f64>;

    /// Attribute a prediction to the input features
    fn contributions(&self, features: &FeatureVector) -> Result<Contributions>;

    /// Number of inputs the model was fit on
    fn n_features(&self) -> usize;

    fn check_len(&self, features: &FeatureVector) -> Result<()> {
        if features.len() != self.n_features() {
            anyhow::bail!(
                "Feature count mismatch: expected {}, got {}",
                self.n_features(),
                features.len()
            );
        }
        Ok(())
    }
}

/// Simple Linear Regression Model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }
}

impl MLModel for LinearRegressionModel {
    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        self.check_len(features)?;

        let prediction: f64 = features
            .features
            .iter()
            .zip(self.coefficients.iter())
            .map(|(f, c)| f * c)
            .sum::<f64>()
            + self.intercept;

        Ok(prediction)
    }

    /// On standardized inputs the mean is zero, so `coef × x` is the exact
    /// deviation from the intercept.
    fn contributions(&self, features: &FeatureVector) -> Result<Contributions> {
        self.check_len(features)?;
        Ok(Contributions {
            base_value: self.intercept,
            values: features
                .features
                .iter()
                .zip(&self.coefficients)
                .map(|(f, c)| f * c)
                .collect(),
        })
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: Vec<f64>) -> FeatureVector {
        let names = (0..values.len()).map(|i| format!("feature_{i}")).collect();
        FeatureVector::new(values, names).unwrap()
    }

    #[test]
    fn test_linear_regression_prediction() {
        let model = LinearRegressionModel::new(vec![2.0, -1.0, 0.5], 10.0);
        let prediction = model.predict(&fv(vec![1.0, 2.0, 4.0])).unwrap();
        assert_eq!(prediction, 12.0);
    }

    #[test]
    fn test_linear_contributions_sum_to_prediction() {
        let model = LinearRegressionModel::new(vec![2.0, -1.0, 0.5], 10.0);
        let input = fv(vec![1.0, 2.0, 4.0]);
        let c = model.contributions(&input).unwrap();
        assert_eq!(c.values, vec![2.0, -2.0, 2.0]);
        assert_eq!(c.base_value + c.values.iter().sum::<f64>(), 12.0);
    }

    #[test]
    fn test_linear_rejects_wrong_length() {
        let model = LinearRegressionModel::new(vec![1.0; 3], 0.0);
        assert!(model.predict(&fv(vec![1.0; 4])).is_err());
        assert!(model.contributions(&fv(vec![1.0; 2])).is_err());
    }
}
