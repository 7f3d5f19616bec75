//! Property-based tests for risk scoring

mod common;

use proptest::prelude::*;

use outage_risk_forecaster::domain::{GridFeatures, RiskLevel, Scenario, WeatherFeatures};
use outage_risk_forecaster::risk::RiskEngine;

prop_compose! {
    fn arb_weather()(
        temperature in -20.0..45.0f64,
        humidity in 0.0..=100.0f64,
        wind_speed in 0.0..150.0f64,
        rainfall in 0.0..120.0f64,
        lightning_strikes in 0..50u32,
        storm_alert in any::<bool>(),
    ) -> WeatherFeatures {
        WeatherFeatures {
            temperature,
            humidity,
            wind_speed,
            rainfall,
            lightning_strikes,
            storm_alert,
            ..Default::default()
        }
    }
}

prop_compose! {
    fn arb_grid()(
        load_factor in 0.0..=1.0f64,
        voltage_stability in 0.0..=1.0f64,
        historical_outages in 0..20u32,
        maintenance_status in any::<bool>(),
        feeder_health in 0.0..=1.0f64,
    ) -> GridFeatures {
        GridFeatures {
            load_factor,
            voltage_stability,
            historical_outages,
            maintenance_status,
            feeder_health,
            ..Default::default()
        }
    }
}

fn model_engine() -> RiskEngine {
    let mut coefficients = vec![0.0; common::FEATURE_COUNT];
    coefficients[common::WIND_SPEED] = 0.4;
    coefficients[common::RAINFALL] = 0.9;
    coefficients[6] = 30.0; // load_factor
    coefficients[7] = -25.0; // voltage_stability
    let model = common::linear_model(coefficients, 30.0);
    RiskEngine::with_model(model, Default::default())
}

fn score(engine: &RiskEngine, weather: WeatherFeatures, grid: GridFeatures) -> f64 {
    engine.assess(&common::scenario(weather, grid)).risk_score
}

proptest! {
    #[test]
    fn prop_score_and_interval_stay_in_bounds(weather in arb_weather(), grid in arb_grid()) {
        for engine in [common::fallback_engine(), model_engine()] {
            let assessment = engine.assess(&common::scenario(weather.clone(), grid.clone()));
            let ci = assessment.confidence_interval;

            prop_assert!((0.0..=100.0).contains(&assessment.risk_score));
            prop_assert!(0.0 <= ci.lower && ci.lower <= ci.upper && ci.upper <= 100.0);
            prop_assert!(ci.contains(assessment.risk_score));
            prop_assert_eq!(assessment.risk_level, RiskLevel::from_score(assessment.risk_score));
            prop_assert!(assessment.contributing_factors.len() <= 5);
            prop_assert!(assessment.explanation.top_features.len() <= 5);
        }
    }

    #[test]
    fn prop_fallback_is_monotone_in_weather_severity(
        weather in arb_weather(),
        grid in arb_grid(),
        extra_rain in 0.0..50.0f64,
        extra_wind in 0.0..50.0f64,
        extra_strikes in 0..10u32,
    ) {
        let engine = common::fallback_engine();
        let base = score(&engine, weather.clone(), grid.clone());

        let wetter = WeatherFeatures { rainfall: weather.rainfall + extra_rain, ..weather.clone() };
        prop_assert!(score(&engine, wetter, grid.clone()) >= base);

        let windier = WeatherFeatures { wind_speed: weather.wind_speed + extra_wind, ..weather.clone() };
        prop_assert!(score(&engine, windier, grid.clone()) >= base);

        let stormier = WeatherFeatures {
            lightning_strikes: weather.lightning_strikes + extra_strikes,
            ..weather.clone()
        };
        prop_assert!(score(&engine, stormier, grid.clone()) >= base);

        let alerted = WeatherFeatures { storm_alert: true, ..weather.clone() };
        prop_assert!(score(&engine, alerted, grid) >= base);
    }

    #[test]
    fn prop_assessment_is_deterministic(weather in arb_weather(), grid in arb_grid()) {
        let engine = model_engine();
        let scenario: Scenario = common::scenario(weather, grid);

        let first = engine.assess(&scenario);
        let second = engine.assess(&scenario);

        prop_assert_eq!(first.risk_score, second.risk_score);
        prop_assert_eq!(first.confidence_interval, second.confidence_interval);
        prop_assert_eq!(first.explanation, second.explanation);
        prop_assert_eq!(first.contributing_factors, second.contributing_factors);
    }
}

#[test]
fn test_fallback_reference_scenario() {
    let weather = WeatherFeatures {
        rainfall: 0.0,
        wind_speed: 10.0,
        storm_alert: false,
        ..Default::default()
    };
    let grid = GridFeatures {
        load_factor: 0.5,
        voltage_stability: 0.95,
        maintenance_status: false,
        feeder_health: 0.9,
        ..Default::default()
    };

    let assessment = common::fallback_engine().assess(&common::scenario(weather, grid));

    // 3 (wind) + 1.5 (voltage) + 12.5 (load) + 2 (feeder)
    assert!((assessment.risk_score - 19.0).abs() < 1e-9);
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert_eq!(assessment.confidence_interval.width(), 0.0);
    assert!(assessment.confidence_interval.contains(assessment.risk_score));
}

#[test]
fn test_fallback_formula_is_bit_exact() {
    let weather = WeatherFeatures {
        rainfall: 12.5,
        wind_speed: 33.3,
        lightning_strikes: 4,
        storm_alert: true,
        ..Default::default()
    };
    let grid = GridFeatures {
        load_factor: 0.65,
        voltage_stability: 0.85,
        maintenance_status: true,
        feeder_health: 0.55,
        ..Default::default()
    };

    let expected: f64 = 0.8 * 12.5
        + 0.3 * 33.3
        + 2.0 * 4.0
        + 20.0 * 1.0
        + 30.0 * (1.0 - 0.85)
        + 25.0 * 0.65
        + 15.0 * 1.0
        + 20.0 * (1.0 - 0.55);

    let actual = score(&common::fallback_engine(), weather, grid);
    assert_eq!(actual, expected.clamp(0.0, 100.0));
}
