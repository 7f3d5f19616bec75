use anyhow::Result;
use chrono::Utc;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::attribution::{contributing_factors, Attributor};
use super::scorer::{RiskScorer, ScoringInput};
use super::uncertainty::{UncertaintyConfig, UncertaintyEstimator};
use crate::domain::{ConfidenceInterval, RiskAssessment, RiskLevel, Scenario, ScoringMode};
use crate::forecast::features::{FeatureComposer, FeatureLayout};
use crate::ml::RiskModel;

/// Immutable scoring pipeline: compose → scale → score → perturb → attribute.
///
/// Built once at startup and shared behind an `Arc`; every call is
/// side-effect free.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    composer: FeatureComposer,
    scorer: RiskScorer,
    attributor: Attributor,
    uncertainty: UncertaintyEstimator,
}

impl RiskEngine {
    pub fn with_model(model: RiskModel, uncertainty: UncertaintyConfig) -> Self {
        let model = Arc::new(model);
        Self {
            composer: model.composer(),
            scorer: RiskScorer::Model(Arc::clone(&model)),
            attributor: Attributor::ModelBacked(model),
            uncertainty: UncertaintyEstimator::new(uncertainty),
        }
    }

    pub fn fallback(uncertainty: UncertaintyConfig) -> Self {
        Self {
            composer: FeatureComposer::default(),
            scorer: RiskScorer::Fallback,
            attributor: Attributor::RuleBased,
            uncertainty: UncertaintyEstimator::new(uncertainty),
        }
    }

    /// Load the artifact at `artifact_path`, or fall back to the heuristic
    /// when it is unset or unusable.
    pub fn load(artifact_path: Option<&Path>, uncertainty: UncertaintyConfig) -> Self {
        let Some(path) = artifact_path else {
            info!("No model artifact configured, using fallback scoring");
            return Self::fallback(uncertainty);
        };

        match RiskModel::load(path) {
            Ok(model) => Self::with_model(model, uncertainty),
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %format!("{e:#}"),
                    "Model unavailable, using fallback scoring"
                );
                Self::fallback(uncertainty)
            }
        }
    }

    pub fn mode(&self) -> ScoringMode {
        self.scorer.mode()
    }

    pub fn model(&self) -> Option<&RiskModel> {
        match &self.scorer {
            RiskScorer::Model(model) => Some(model),
            RiskScorer::Fallback => None,
        }
    }

    pub fn layout(&self) -> &FeatureLayout {
        self.composer.layout()
    }

    pub fn uncertainty(&self) -> &UncertaintyConfig {
        self.uncertainty.config()
    }

    /// Score a scenario, surfacing any computation failure.
    pub fn try_assess(&self, scenario: &Scenario) -> Result<RiskAssessment> {
        let reference_time = scenario.reference_time.unwrap_or_else(Utc::now);
        let input = ScoringInput {
            weather: &scenario.weather,
            grid: &scenario.grid,
        };

        let raw = self
            .composer
            .compose(&scenario.weather, &scenario.grid, reference_time);
        let working = self.scorer.working_features(&raw)?;
        let risk_score = self.scorer.score_working(input, &working)?;

        let confidence_interval = if self.scorer.responds_to_features() {
            self.uncertainty.estimate(
                risk_score,
                &working,
                &self.layout().continuous,
                |perturbed| self.scorer.score_working(input, perturbed),
            )?
        } else {
            ConfidenceInterval::point(risk_score)
        };

        let explanation = self.attributor.explain(input, &working)?;

        debug!(
            risk_score,
            lower = confidence_interval.lower,
            upper = confidence_interval.upper,
            mode = %self.mode(),
            "Scored scenario"
        );

        Ok(RiskAssessment {
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            confidence_interval,
            explanation,
            contributing_factors: contributing_factors(&scenario.weather, &scenario.grid),
            scoring_mode: self.mode(),
            prediction_horizon_hours: scenario.prediction_horizon,
            generated_at: Utc::now(),
        })
    }

    /// Score a scenario. Failures are logged and reported as a zero-score
    /// assessment with the single factor "Prediction failed".
    pub fn assess(&self, scenario: &Scenario) -> RiskAssessment {
        self.try_assess(scenario).unwrap_or_else(|e| {
            error!(error = %format!("{e:#}"), "Risk scoring failed");
            RiskAssessment::failed(self.mode(), scenario.prediction_horizon)
        })
    }

    /// Score many scenarios on blocking workers. Results keep input order.
    pub async fn assess_batch(self: Arc<Self>, scenarios: Vec<Scenario>) -> Vec<RiskAssessment> {
        let horizons: Vec<u32> = scenarios.iter().map(|s| s.prediction_horizon).collect();
        let handles = scenarios.into_iter().map(|scenario| {
            let engine = Arc::clone(&self);
            tokio::task::spawn_blocking(move || engine.assess(&scenario))
        });

        join_all(handles)
            .await
            .into_iter()
            .zip(horizons)
            .map(|(joined, horizon)| {
                joined.unwrap_or_else(|e| {
                    error!(error = %e, "Batch scoring task failed");
                    RiskAssessment::failed(self.mode(), horizon)
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExplanationMethod, GridFeatures, WeatherFeatures};
    use crate::ml::{LinearRegressionModel, ModelMetadata, ModelType, ScoringSurface, WeatherEncoder};

    fn linear_engine(coefficients: Vec<f64>, intercept: f64) -> RiskEngine {
        let layout = FeatureLayout::for_encoder(&WeatherEncoder::Passthrough);
        let model = RiskModel {
            metadata: ModelMetadata {
                model_id: "test".into(),
                model_type: ModelType::LinearRegression,
                version: "0".into(),
                trained_at: Utc::now(),
                training_samples: 0,
                validation_metrics: None,
                feature_names: layout.names.clone(),
            },
            encoder: WeatherEncoder::Passthrough,
            scaler: None,
            surface: ScoringSurface::Linear(LinearRegressionModel::new(coefficients, intercept)),
        };
        model.validate().unwrap();
        RiskEngine::with_model(model, UncertaintyConfig::default())
    }

    fn stormy() -> Scenario {
        Scenario::new(
            WeatherFeatures {
                rainfall: 20.0,
                wind_speed: 30.0,
                ..Default::default()
            },
            GridFeatures::default(),
        )
    }

    #[test]
    fn test_fallback_interval_is_degenerate() {
        let engine = RiskEngine::fallback(UncertaintyConfig::default());
        let assessment = engine.assess(&stormy());
        assert_eq!(assessment.scoring_mode, ScoringMode::Fallback);
        assert_eq!(assessment.confidence_interval.width(), 0.0);
        assert_eq!(assessment.explanation.method, ExplanationMethod::Heuristic);
    }

    #[test]
    fn test_model_mode_interval_brackets_score() {
        // 2 points per mm/hr of rainfall, plus 1 per km/h of wind
        let mut coef = vec![0.0; 15];
        coef[2] = 1.0;
        coef[3] = 2.0;
        let engine = linear_engine(coef, 5.0);
        let assessment = engine.assess(&stormy());

        assert_eq!(assessment.risk_score, 75.0);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert!(assessment.confidence_interval.width() > 0.0);
        assert!(assessment.confidence_interval.contains(75.0));
        assert_eq!(assessment.explanation.top_features[0].feature, "rainfall");
        assert_eq!(assessment.explanation.base_value, Some(5.0));
    }

    #[test]
    fn test_non_finite_score_yields_failed_assessment() {
        let mut coef = vec![0.0; 15];
        coef[0] = f64::NAN;
        let engine = linear_engine(coef, 0.0);
        let assessment = engine.assess(&stormy());
        assert!(assessment.is_failure());
        assert_eq!(assessment.risk_score, 0.0);
        assert_eq!(assessment.contributing_factors, vec!["Prediction failed"]);
    }

    #[test]
    fn test_missing_artifact_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let engine = RiskEngine::load(
            Some(&dir.path().join("absent.json")),
            UncertaintyConfig::default(),
        );
        assert_eq!(engine.mode(), ScoringMode::Fallback);
        assert!(engine.model().is_none());
        assert_eq!(RiskEngine::load(None, UncertaintyConfig::default()).mode(), ScoringMode::Fallback);
    }

    #[tokio::test]
    async fn test_batch_preserves_order() {
        let engine = Arc::new(RiskEngine::fallback(UncertaintyConfig::default()));
        let scenarios: Vec<Scenario> = (0..8)
            .map(|i| {
                Scenario::new(
                    WeatherFeatures {
                        rainfall: i as f64 * 10.0,
                        ..Default::default()
                    },
                    GridFeatures::default(),
                )
            })
            .collect();

        let results = engine.clone().assess_batch(scenarios.clone()).await;
        assert_eq!(results.len(), 8);
        for (scenario, result) in scenarios.iter().zip(&results) {
            assert_eq!(result.risk_score, engine.assess(scenario).risk_score);
        }
    }
}
