//! What-if comparison between a base scenario and an overridden copy.

use chrono::Utc;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use strum::Display;
use tracing::info;

use super::overrides::{apply_overrides, AppliedOverride, Overrides, SkippedOverride};
use super::ScenarioScorer;
use crate::domain::{GridField, ParameterPath, RiskAssessment, RiskLevel, Scenario, WeatherField};

/// Share of the total change attributed to a parameter before scaling by its
/// impact factor.
const CONTRIBUTION_SCALE: f64 = 0.7;

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
    NoChange,
}

impl Direction {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Self::Increase
        } else if change < 0.0 {
            Self::Decrease
        } else {
            Self::NoChange
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Magnitude {
    Minimal,
    Moderate,
    Significant,
    Major,
}

impl Magnitude {
    pub fn of(change: f64) -> Self {
        let change = change.abs();
        if change < 5.0 {
            Self::Minimal
        } else if change < 15.0 {
            Self::Moderate
        } else if change < 30.0 {
            Self::Significant
        } else {
            Self::Major
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterImpact {
    pub estimated_contribution: f64,
    pub impact_factor: f64,
    pub parameter_value: f64,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UncertaintyChange {
    Increased,
    Decreased,
    Unchanged,
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceChange {
    pub confidence_width_change: f64,
    pub uncertainty_change: UncertaintyChange,
    pub baseline_uncertainty: f64,
    pub modified_uncertainty: f64,
}

impl ConfidenceChange {
    fn between(base: &RiskAssessment, modified: &RiskAssessment) -> Self {
        let baseline = base.confidence_interval.width();
        let modified = modified.confidence_interval.width();
        let uncertainty_change = if modified > baseline {
            UncertaintyChange::Increased
        } else if modified < baseline {
            UncertaintyChange::Decreased
        } else {
            UncertaintyChange::Unchanged
        };
        Self {
            confidence_width_change: modified - baseline,
            uncertainty_change,
            baseline_uncertainty: baseline,
            modified_uncertainty: modified,
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskLevelChange {
    pub baseline_level: RiskLevel,
    pub modified_level: RiskLevel,
    pub level_changed: bool,
    /// Level changed and the score went up
    pub escalation: bool,
}

impl RiskLevelChange {
    fn between(base: f64, modified: f64) -> Self {
        let baseline_level = RiskLevel::from_score(base);
        let modified_level = RiskLevel::from_score(modified);
        let level_changed = baseline_level != modified_level;
        Self {
            baseline_level,
            modified_level,
            level_changed,
            escalation: level_changed && modified > base,
        }
    }
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImpactAnalysis {
    pub risk_change: f64,
    pub risk_change_percentage: f64,
    pub direction: Direction,
    pub magnitude: Magnitude,
    #[cfg_attr(feature = "swagger", schema(value_type = Object))]
    pub modified_parameters: Overrides,
    /// Heuristic per-parameter share of the change. Does not sum to it.
    pub impact_breakdown: BTreeMap<String, ParameterImpact>,
    pub confidence_change: ConfidenceChange,
    pub risk_level_change: RiskLevelChange,
    pub interpretation: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped_parameters: Vec<SkippedOverride>,
}

/// Both assessments of a what-if run and the analysis linking them.
#[derive(Debug, Clone)]
pub struct ScenarioComparison {
    pub base: RiskAssessment,
    pub modified: RiskAssessment,
    pub modified_scenario: Scenario,
    pub impact: ImpactAnalysis,
}

impl ScenarioComparison {
    pub fn risk_change(&self) -> f64 {
        self.impact.risk_change
    }
}

pub struct ScenarioDiffer<'a, S: ScenarioScorer + ?Sized> {
    scorer: &'a S,
}

impl<'a, S: ScenarioScorer + ?Sized> ScenarioDiffer<'a, S> {
    pub fn new(scorer: &'a S) -> Self {
        Self { scorer }
    }

    pub fn compare(&self, base: &Scenario, overrides: &Overrides) -> ScenarioComparison {
        // Both runs must see the same temporal features.
        let mut base = base.clone();
        base.reference_time.get_or_insert_with(Utc::now);

        let base_assessment = self.scorer.assess(&base);
        let outcome = apply_overrides(&base, overrides);
        let modified_assessment = self.scorer.assess(&outcome.scenario);

        let impact = analyze_impact(
            &base_assessment,
            &modified_assessment,
            overrides,
            &outcome.applied,
            outcome.skipped,
        );

        info!(
            risk_change = impact.risk_change,
            magnitude = %impact.magnitude,
            applied = outcome.applied.len(),
            skipped = impact.skipped_parameters.len(),
            "What-if comparison complete"
        );

        ScenarioComparison {
            base: base_assessment,
            modified: modified_assessment,
            modified_scenario: outcome.scenario,
            impact,
        }
    }
}

pub fn analyze_impact(
    base: &RiskAssessment,
    modified: &RiskAssessment,
    overrides: &Overrides,
    applied: &[AppliedOverride],
    skipped: Vec<SkippedOverride>,
) -> ImpactAnalysis {
    let risk_change = modified.risk_score - base.risk_score;

    let impact_breakdown = applied
        .iter()
        .map(|o| {
            let value = o.value.as_f64();
            let impact_factor = impact_factor(o.path, value);
            (
                o.parameter.clone(),
                ParameterImpact {
                    estimated_contribution: risk_change * impact_factor * CONTRIBUTION_SCALE,
                    impact_factor,
                    parameter_value: value,
                },
            )
        })
        .collect();

    let direction = Direction::of(risk_change);
    let magnitude = Magnitude::of(risk_change);
    let risk_level_change = RiskLevelChange::between(base.risk_score, modified.risk_score);
    let interpretation =
        interpret(risk_change, direction, magnitude, &risk_level_change, applied);

    ImpactAnalysis {
        risk_change,
        risk_change_percentage: risk_change / base.risk_score.max(1.0) * 100.0,
        direction,
        magnitude,
        modified_parameters: overrides.clone(),
        impact_breakdown,
        confidence_change: ConfidenceChange::between(base, modified),
        risk_level_change,
        interpretation,
        skipped_parameters: skipped,
    }
}

fn impact_factor(path: ParameterPath, value: f64) -> f64 {
    match path {
        ParameterPath::Weather(WeatherField::Rainfall) => (value / 50.0).min(1.0),
        ParameterPath::Weather(WeatherField::WindSpeed) => (value / 100.0).min(1.0),
        ParameterPath::Weather(WeatherField::Temperature) => ((value - 25.0).abs() / 20.0).min(1.0),
        ParameterPath::Grid(GridField::LoadFactor) => value,
        _ => 0.5,
    }
}

fn interpret(
    risk_change: f64,
    direction: Direction,
    magnitude: Magnitude,
    level: &RiskLevelChange,
    applied: &[AppliedOverride],
) -> String {
    let verb = match direction {
        Direction::NoChange => {
            return "The parameter changes had negligible impact on outage risk.".to_string()
        }
        Direction::Increase => "increased",
        Direction::Decrease => "decreased",
    };

    let mut text = format!(
        "The modifications {verb} outage risk by {:.1} points, representing a {magnitude} change.",
        risk_change.abs()
    );
    if level.level_changed {
        let _ = write!(
            text,
            " Risk level changed from {} to {}.",
            level.baseline_level, level.modified_level
        );
    }
    for o in applied {
        let v = o.value.as_f64();
        match o.path {
            ParameterPath::Weather(WeatherField::Rainfall) if v > 25.0 => {
                text.push_str(" Heavy rainfall is a major contributing factor.")
            }
            ParameterPath::Weather(WeatherField::WindSpeed) if v > 50.0 => {
                text.push_str(" Strong winds significantly impact grid stability.")
            }
            _ => {}
        }
    }
    text
}

#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MostImpactfulScenario {
    pub scenario_name: String,
    pub risk_change: f64,
    pub impact_type: Direction,
}

/// Aggregate view over a batch of what-if runs.
#[cfg_attr(feature = "swagger", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total_simulations: usize,
    pub average_risk_change: f64,
    pub max_risk_change: f64,
    pub min_risk_change: f64,
    pub risk_change_std: f64,
    pub scenarios_increasing_risk: usize,
    pub scenarios_decreasing_risk: usize,
    pub most_impactful_scenario: MostImpactfulScenario,
}

impl BatchSummary {
    /// `None` for an empty batch.
    pub fn from_changes<'n>(runs: impl IntoIterator<Item = (&'n str, f64)>) -> Option<Self> {
        let runs: Vec<(&str, f64)> = runs.into_iter().collect();
        let (first_name, first_change) = *runs.first()?;

        let n = runs.len() as f64;
        let mean = runs.iter().map(|(_, c)| c).sum::<f64>() / n;
        let variance = runs.iter().map(|(_, c)| (c - mean).powi(2)).sum::<f64>() / n;

        // First run wins ties.
        let (name, change) = runs.iter().fold((first_name, first_change), |best, &(name, c)| {
            if c.abs() > best.1.abs() {
                (name, c)
            } else {
                best
            }
        });

        Some(Self {
            total_simulations: runs.len(),
            average_risk_change: mean,
            max_risk_change: runs.iter().map(|(_, c)| *c).fold(f64::NEG_INFINITY, f64::max),
            min_risk_change: runs.iter().map(|(_, c)| *c).fold(f64::INFINITY, f64::min),
            risk_change_std: variance.sqrt(),
            scenarios_increasing_risk: runs.iter().filter(|(_, c)| *c > 0.0).count(),
            scenarios_decreasing_risk: runs.iter().filter(|(_, c)| *c < 0.0).count(),
            most_impactful_scenario: MostImpactfulScenario {
                scenario_name: name.to_string(),
                risk_change: change,
                impact_type: Direction::of(change),
            },
        })
    }
}
