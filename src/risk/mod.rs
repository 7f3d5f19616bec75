//! Risk scoring
//!
//! Turns a scenario into a bounded risk score with a confidence interval and
//! an attribution, under either a fitted model or the fallback heuristic.

pub mod attribution;
pub mod engine;
pub mod scorer;
pub mod uncertainty;

pub use attribution::{contributing_factors, Attributor};
pub use engine::RiskEngine;
pub use scorer::{FallbackTerms, RiskScorer, ScoringInput};
pub use uncertainty::{UncertaintyConfig, UncertaintyEstimator};
