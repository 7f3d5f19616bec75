use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Risk score boundaries separating the four risk levels.
pub const RISK_BOUNDARIES: [f64; 3] = [30.0, 60.0, 80.0];

/// Outage risk category of a score.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Critical
        } else if score >= 60.0 {
            Self::High
        } else if score >= 30.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

/// Which scoring regime produced an assessment.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScoringMode {
    /// Fitted encoder + scoring surface loaded from an artifact
    Model,
    /// Documented weighted-sum heuristic over raw inputs
    Fallback,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    /// Zero-width interval at `score`.
    pub fn point(score: f64) -> Self {
        Self {
            lower: score,
            upper: score,
        }
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn contains(&self, score: f64) -> bool {
        self.lower <= score && score <= self.upper
    }
}

/// Signed contribution of one named feature to a score.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImpact {
    pub feature: String,
    pub impact: f64,
}

impl FeatureImpact {
    pub fn new(feature: impl Into<String>, impact: f64) -> Self {
        Self {
            feature: feature.into(),
            impact,
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExplanationMethod {
    /// Contributions reported by the fitted scoring surface
    ModelAttribution,
    /// Terms of the fallback weighted sum
    Heuristic,
    /// Scoring failed; nothing to attribute
    Unavailable,
}

/// Per-feature attribution of a score plus the strongest drivers.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub method: ExplanationMethod,
    /// Expected score before any feature is taken into account, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_value: Option<f64>,
    /// One entry per feature, in feature-vector order.
    pub attributions: Vec<FeatureImpact>,
    /// Up to five entries ranked by absolute impact.
    pub top_features: Vec<FeatureImpact>,
}

impl Explanation {
    pub fn unavailable() -> Self {
        Self {
            method: ExplanationMethod::Unavailable,
            base_value: None,
            attributions: Vec::new(),
            top_features: Vec::new(),
        }
    }
}

/// Result of scoring one scenario. Built once, never mutated.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub confidence_interval: ConfidenceInterval,
    pub explanation: Explanation,
    pub contributing_factors: Vec<String>,
    pub scoring_mode: ScoringMode,
    pub prediction_horizon_hours: u32,
    pub generated_at: DateTime<Utc>,
}

impl RiskAssessment {
    pub const FAILURE_FACTOR: &'static str = "Prediction failed";

    /// Safe zero-score result returned when scoring fails.
    pub fn failed(scoring_mode: ScoringMode, prediction_horizon_hours: u32) -> Self {
        Self {
            risk_score: 0.0,
            risk_level: RiskLevel::Low,
            confidence_interval: ConfidenceInterval::point(0.0),
            explanation: Explanation::unavailable(),
            contributing_factors: vec![Self::FAILURE_FACTOR.to_string()],
            scoring_mode,
            prediction_horizon_hours,
            generated_at: Utc::now(),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.explanation.method == ExplanationMethod::Unavailable
    }
}
