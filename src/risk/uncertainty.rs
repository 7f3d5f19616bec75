//! Perturbation-based confidence intervals
//!
//! No validation set is available at inference time, so the spread of scores
//! over small Gaussian perturbations of the working vector stands in for
//! model uncertainty.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::scorer::{MAX_SCORE, MIN_SCORE};
use crate::domain::ConfidenceInterval;
use crate::ml::FeatureVector;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UncertaintyConfig {
    /// Perturbed copies scored per call
    pub samples: usize,
    /// Noise standard deviation, in working (standardized) units
    pub noise_std: f64,
    /// Two-sided z value for the interval
    pub z_score: f64,
    /// Base seed mixed with a hash of the input
    pub seed: u64,
}

impl Default for UncertaintyConfig {
    fn default() -> Self {
        Self {
            samples: 10,
            noise_std: 0.1,
            z_score: 1.96,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct UncertaintyEstimator {
    config: UncertaintyConfig,
}

impl UncertaintyEstimator {
    pub fn new(config: UncertaintyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UncertaintyConfig {
        &self.config
    }

    /// Per-call seed: identical vectors always draw identical noise, on any
    /// toolchain. FNV-1a over the bit patterns of the features.
    fn seed_for(&self, working: &FeatureVector) -> u64 {
        let hash = working
            .features
            .iter()
            .flat_map(|value| value.to_bits().to_le_bytes())
            .fold(FNV_OFFSET_BASIS, |hash, byte| {
                (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
            });
        self.config.seed ^ hash
    }

    /// Interval around `score` from re-scoring perturbed copies of `working`.
    /// Only positions flagged in `continuous` receive noise.
    pub fn estimate<F>(
        &self,
        score: f64,
        working: &FeatureVector,
        continuous: &[bool],
        mut rescore: F,
    ) -> Result<ConfidenceInterval>
    where
        F: FnMut(&FeatureVector) -> Result<f64>,
    {
        if self.config.samples == 0 || self.config.noise_std <= 0.0 {
            return Ok(ConfidenceInterval::point(score));
        }

        let noise = Normal::new(0.0, self.config.noise_std).context("Invalid noise_std")?;
        let mut rng = StdRng::seed_from_u64(self.seed_for(working));

        let mut scores = Vec::with_capacity(self.config.samples);
        for _ in 0..self.config.samples {
            let perturbed: Vec<f64> = working
                .features
                .iter()
                .zip(continuous)
                .map(|(x, &c)| if c { x + noise.sample(&mut rng) } else { *x })
                .collect();
            scores.push(rescore(&working.with_values(perturbed)?)?);
        }

        let spread = population_std(&scores);
        let half_width = self.config.z_score * spread;
        Ok(ConfidenceInterval {
            lower: (score - half_width).clamp(MIN_SCORE, MAX_SCORE),
            upper: (score + half_width).clamp(MIN_SCORE, MAX_SCORE),
        })
    }
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fv(values: Vec<f64>) -> FeatureVector {
        let names = (0..values.len()).map(|i| format!("f{i}")).collect();
        FeatureVector::new(values, names).unwrap()
    }

    #[test]
    fn test_constant_scorer_gives_point_interval() {
        let estimator = UncertaintyEstimator::default();
        let ci = estimator
            .estimate(42.0, &fv(vec![1.0, 2.0]), &[true, true], |_| Ok(42.0))
            .unwrap();
        assert_eq!(ci, ConfidenceInterval::point(42.0));
    }

    #[test]
    fn test_interval_is_deterministic_and_contains_score() {
        let estimator = UncertaintyEstimator::default();
        let working = fv(vec![0.3, -1.2, 4.0]);
        let rescore = |v: &FeatureVector| Ok(50.0 + 10.0 * v.features[0] + 5.0 * v.features[1]);

        let a = estimator
            .estimate(50.0, &working, &[true, true, false], rescore)
            .unwrap();
        let b = estimator
            .estimate(50.0, &working, &[true, true, false], rescore)
            .unwrap();

        assert_eq!(a, b);
        assert!(a.width() > 0.0);
        assert!(a.contains(50.0));
    }

    #[test]
    fn test_discrete_fields_are_not_perturbed() {
        let estimator = UncertaintyEstimator::default();
        let working = fv(vec![7.0, 3.0]);
        let mut seen = Vec::new();
        estimator
            .estimate(10.0, &working, &[false, true], |v| {
                seen.push(v.features[0]);
                Ok(10.0)
            })
            .unwrap();
        assert_eq!(seen.len(), 10);
        assert!(seen.iter().all(|&x| x == 7.0));
    }

    #[test]
    fn test_interval_is_clamped() {
        let estimator = UncertaintyEstimator::new(UncertaintyConfig {
            noise_std: 5.0,
            ..Default::default()
        });
        let ci = estimator
            .estimate(99.0, &fv(vec![0.0]), &[true], |v| Ok(99.0 + 50.0 * v.features[0]))
            .unwrap();
        assert_eq!(ci.upper, 100.0);
        assert!(ci.lower >= 0.0);
    }

    #[test]
    fn test_seed_is_fixed_function_of_input() {
        let estimator = UncertaintyEstimator::new(UncertaintyConfig {
            seed: 0,
            ..Default::default()
        });
        // FNV-1a of an empty input is the offset basis.
        assert_eq!(estimator.seed_for(&fv(vec![])), FNV_OFFSET_BASIS);

        let mut expected = FNV_OFFSET_BASIS;
        for byte in 1.0f64.to_bits().to_le_bytes() {
            expected = (expected ^ u64::from(byte)).wrapping_mul(FNV_PRIME);
        }
        assert_eq!(estimator.seed_for(&fv(vec![1.0])), expected);
        assert_ne!(estimator.seed_for(&fv(vec![1.0])), estimator.seed_for(&fv(vec![2.0])));
    }

    #[test]
    fn test_population_std() {
        assert_eq!(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0);
        assert_eq!(population_std(&[]), 0.0);
    }
}
