//! One-parameter sensitivity sweeps
//!
//! A parameter is swept over an inclusive, evenly spaced range; each sample is
//! scored through the same override mechanism as a what-if run, and the
//! resulting curve is summarised by [`SensitivityMetrics`].

use serde::Serialize;
use strum::Display;
use tracing::info;

use super::ScenarioScorer;
use crate::domain::{ParameterPath, ParameterValue, RiskLevel, Scenario, RISK_BOUNDARIES};
use crate::error::EngineError;

pub const MIN_STEPS: usize = 2;
pub const DEFAULT_MAX_STEPS: usize = 20;

/// Share of the minimum score tolerated when collecting the optimal range.
const OPTIMAL_TOLERANCE: f64 = 0.1;

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivitySample {
    pub parameter_value: f64,
    pub risk_score: f64,
    /// Relative to the unmodified base scenario
    pub risk_change: f64,
    pub risk_level: RiskLevel,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CrossingDirection {
    Up,
    Down,
}

/// A risk boundary crossed between two consecutive samples.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdCrossing {
    pub threshold: f64,
    pub from_index: usize,
    pub to_index: usize,
    pub from_value: f64,
    pub to_value: f64,
    /// Score at `to_index`
    pub risk_score: f64,
    pub direction: CrossingDirection,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalRange {
    pub optimal_value: f64,
    pub minimum_risk: f64,
    pub range: ValueRange,
    pub risk_reduction_potential: f64,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityMetrics {
    pub sensitivity_coefficient: f64,
    pub correlation: f64,
    pub elasticity: f64,
    pub risk_gradient: Vec<f64>,
    pub threshold_crossings: Vec<ThresholdCrossing>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimal_range: Option<OptimalRange>,
}

impl SensitivityMetrics {
    /// Summarise a sampled curve. `values` and `scores` are paired by index.
    pub fn from_samples(values: &[f64], scores: &[f64]) -> Self {
        debug_assert_eq!(values.len(), scores.len());
        let value_range = spread(values);
        Self {
            sensitivity_coefficient: if value_range > 0.0 {
                spread(scores) / value_range
            } else {
                0.0
            },
            correlation: pearson(values, scores),
            elasticity: elasticity(values, scores),
            risk_gradient: gradients(values, scores),
            threshold_crossings: crossings(values, scores),
            optimal_range: optimal_range(values, scores),
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    #[cfg_attr(feature = "swagger", schema(value_type = String))]
    pub parameter: ParameterPath,
    pub value_range: ValueRange,
    pub base_risk_score: f64,
    pub results: Vec<SensitivitySample>,
    pub sensitivity_metrics: SensitivityMetrics,
    pub total_steps: usize,
}

/// Inclusive, evenly spaced samples. The last sample is exactly `max`.
pub fn sample_values(min: f64, max: f64, steps: usize) -> Vec<f64> {
    if steps < 2 {
        return vec![min];
    }
    let step = (max - min) / (steps - 1) as f64;
    (0..steps)
        .map(|i| if i == steps - 1 { max } else { min + i as f64 * step })
        .collect()
}

pub struct SensitivityAnalyzer<'a, S: ScenarioScorer + ?Sized> {
    scorer: &'a S,
    max_steps: usize,
}

impl<'a, S: ScenarioScorer + ?Sized> SensitivityAnalyzer<'a, S> {
    pub fn new(scorer: &'a S) -> Self {
        Self {
            scorer,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps.max(MIN_STEPS);
        self
    }

    /// Reject a sweep before any scoring happens.
    pub fn validate(
        &self,
        base: &Scenario,
        parameter: &str,
        min_value: f64,
        max_value: f64,
        steps: usize,
    ) -> Result<ParameterPath, EngineError> {
        if !(min_value.is_finite() && max_value.is_finite()) || min_value >= max_value {
            return Err(EngineError::InvalidSensitivityRange {
                min_value,
                max_value,
            });
        }
        if !(MIN_STEPS..=self.max_steps).contains(&steps) {
            return Err(EngineError::InvalidSensitivitySteps {
                steps,
                min: MIN_STEPS,
                max: self.max_steps,
            });
        }
        let path: ParameterPath = parameter.parse()?;
        // Every field accepts a convex range, so checking the endpoints covers
        // all samples in between.
        for bound in [min_value, max_value] {
            base.clone().set(path, ParameterValue::Number(bound))?;
        }
        Ok(path)
    }

    pub fn analyze(
        &self,
        base: &Scenario,
        parameter: &str,
        min_value: f64,
        max_value: f64,
        steps: usize,
    ) -> Result<SensitivityResult, EngineError> {
        let path = self.validate(base, parameter, min_value, max_value, steps)?;

        let mut base = base.clone();
        base.reference_time.get_or_insert_with(chrono::Utc::now);
        let base_risk_score = self.scorer.assess(&base).risk_score;

        let mut results = Vec::with_capacity(steps);
        for value in sample_values(min_value, max_value, steps) {
            let mut scenario = base.clone();
            scenario.set(path, ParameterValue::Number(value))?;
            // Counts round and flags collapse to 0/1; pair the score with what
            // was actually scored.
            let applied = scenario.get(path).unwrap_or(value);
            let assessment = self.scorer.assess(&scenario);
            results.push(SensitivitySample {
                parameter_value: applied,
                risk_score: assessment.risk_score,
                risk_change: assessment.risk_score - base_risk_score,
                risk_level: assessment.risk_level,
            });
        }

        let values: Vec<f64> = results.iter().map(|r| r.parameter_value).collect();
        let scores: Vec<f64> = results.iter().map(|r| r.risk_score).collect();
        let sensitivity_metrics = SensitivityMetrics::from_samples(&values, &scores);

        info!(
            parameter = %path,
            steps,
            coefficient = sensitivity_metrics.sensitivity_coefficient,
            crossings = sensitivity_metrics.threshold_crossings.len(),
            "Sensitivity sweep complete"
        );

        Ok(SensitivityResult {
            parameter: path,
            value_range: ValueRange {
                min: min_value,
                max: max_value,
            },
            base_risk_score,
            total_steps: results.len(),
            results,
            sensitivity_metrics,
        })
    }
}

fn spread(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    let max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

/// Pearson correlation, 0 when either series is constant.
fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return 0.0;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return 0.0;
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

/// Mean arc elasticity over consecutive pairs with non-zero bases and a
/// non-zero value step.
fn elasticity(values: &[f64], scores: &[f64]) -> f64 {
    let ratios: Vec<f64> = values
        .windows(2)
        .zip(scores.windows(2))
        .filter_map(|(v, s)| {
            let (v_prev, v_cur, s_prev, s_cur) = (v[0], v[1], s[0], s[1]);
            if v_prev == 0.0 || s_prev == 0.0 {
                return None;
            }
            let value_pct = (v_cur - v_prev) / v_prev;
            if value_pct == 0.0 {
                return None;
            }
            Some(((s_cur - s_prev) / s_prev) / value_pct)
        })
        .collect();

    if ratios.is_empty() {
        0.0
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}

fn gradients(values: &[f64], scores: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .zip(scores.windows(2))
        .map(|(v, s)| {
            let dv = v[1] - v[0];
            if dv == 0.0 {
                0.0
            } else {
                (s[1] - s[0]) / dv
            }
        })
        .collect()
}

fn crossings(values: &[f64], scores: &[f64]) -> Vec<ThresholdCrossing> {
    let mut found = Vec::new();
    for &threshold in &RISK_BOUNDARIES {
        for i in 1..scores.len().min(values.len()) {
            let (prev, cur) = (scores[i - 1], scores[i]);
            let direction = if prev < threshold && threshold <= cur {
                CrossingDirection::Up
            } else if prev > threshold && threshold >= cur {
                CrossingDirection::Down
            } else {
                continue;
            };
            found.push(ThresholdCrossing {
                threshold,
                from_index: i - 1,
                to_index: i,
                from_value: values[i - 1],
                to_value: values[i],
                risk_score: cur,
                direction,
            });
        }
    }
    found
}

fn optimal_range(values: &[f64], scores: &[f64]) -> Option<OptimalRange> {
    // First index wins ties.
    let (best, &minimum_risk) = scores
        .iter()
        .enumerate()
        .reduce(|best, cur| if cur.1 < best.1 { cur } else { best })?;
    let optimal_value = *values.get(best)?;
    let cutoff = minimum_risk + minimum_risk * OPTIMAL_TOLERANCE;

    let near_optimal: Vec<f64> = values
        .iter()
        .zip(scores)
        .filter(|(_, s)| **s <= cutoff)
        .map(|(&v, _)| v)
        .collect();

    let max_score = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some(OptimalRange {
        optimal_value,
        minimum_risk,
        range: ValueRange {
            min: near_optimal.iter().copied().fold(optimal_value, f64::min),
            max: near_optimal.iter().copied().fold(optimal_value, f64::max),
        },
        risk_reduction_potential: max_score - minimum_risk,
    })
}
