//! What-if and sensitivity analysis
//!
//! Both analyses are thin loops around repeated scoring; they depend only on
//! [`ScenarioScorer`] so they can be driven by the real engine or a stub.

pub mod differ;
pub mod overrides;
pub mod sensitivity;
pub mod templates;

pub use differ::{BatchSummary, ImpactAnalysis, ScenarioComparison, ScenarioDiffer};
pub use overrides::{apply_overrides, OverrideOutcome, Overrides, SkippedOverride};
pub use sensitivity::{SensitivityAnalyzer, SensitivityMetrics, SensitivityResult};
pub use templates::ScenarioTemplate;

use crate::domain::{RiskAssessment, Scenario};
use crate::risk::RiskEngine;

/// Anything that can turn a scenario into an assessment.
#[cfg_attr(test, mockall::automock)]
pub trait ScenarioScorer: Send + Sync {
    fn assess(&self, scenario: &Scenario) -> RiskAssessment;
}

impl ScenarioScorer for RiskEngine {
    fn assess(&self, scenario: &Scenario) -> RiskAssessment {
        RiskEngine::assess(self, scenario)
    }
}
