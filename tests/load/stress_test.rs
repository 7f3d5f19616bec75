//! Load Testing Suite
//!
//! Verifies scoring under concurrent pressure:
//! - Many simultaneous prediction requests through the router
//! - Large batches on the blocking pool
//! - Sensitivity sweeps interleaved with predictions
//!
//! Key Performance Requirements:
//! - A full prediction batch completes well under the request timeout
//! - Concurrent clients never observe reordered or failed results

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::json;
use tokio::task::JoinSet;
use tower::ServiceExt;

use outage_risk_forecaster::api;
use outage_risk_forecaster::domain::{GridFeatures, WeatherFeatures};
use outage_risk_forecaster::scenario::SensitivityAnalyzer;

use crate::common;

fn weather(i: usize) -> WeatherFeatures {
    WeatherFeatures {
        rainfall: (i % 60) as f64,
        wind_speed: (i % 90) as f64,
        lightning_strikes: (i % 7) as u32,
        storm_alert: i % 5 == 0,
        ..Default::default()
    }
}

#[tokio::test]
#[ignore] // Ignore by default as this is a slow test
async fn test_concurrent_prediction_clients() {
    let app = api::router(common::state(common::single_feature_engine(
        common::RAINFALL,
        1.5,
        5.0,
    )));

    let start = Instant::now();
    let mut clients = JoinSet::new();
    for i in 0..64 {
        let app = app.clone();
        clients.spawn(async move {
            let body = json!({
                "weather_data": {"rainfall": i as f64},
                "grid_data": {}
            });
            let request = Request::builder()
                .method(Method::POST)
                .uri("/api/v1/predict")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();
            app.oneshot(request).await.unwrap().status()
        });
    }

    while let Some(status) = clients.join_next().await {
        assert_eq!(status.unwrap(), StatusCode::OK);
    }
    let elapsed = start.elapsed();
    println!("64 concurrent predictions in {elapsed:?}");
    assert!(elapsed < Duration::from_secs(10));
}

#[tokio::test]
#[ignore] // Ignore by default as this is a slow test
async fn test_large_batches_keep_order() {
    let engine = Arc::new(common::single_feature_engine(common::RAINFALL, 1.0, 0.0));
    let scenarios: Vec<_> = (0..100)
        .map(|i| common::scenario(weather(i), GridFeatures::default()))
        .collect();
    let expected: Vec<f64> = scenarios.iter().map(|s| s.weather.rainfall).collect();

    for _ in 0..20 {
        let scores: Vec<f64> = engine
            .clone()
            .assess_batch(scenarios.clone())
            .await
            .into_iter()
            .map(|a| a.risk_score)
            .collect();
        assert_eq!(scores, expected);
    }
}

#[tokio::test]
#[ignore] // Ignore by default as this is a slow test
async fn test_sweeps_alongside_predictions() {
    let engine = Arc::new(common::fallback_engine());

    let mut tasks = JoinSet::new();
    for i in 0..16 {
        let engine = engine.clone();
        tasks.spawn_blocking(move || {
            let base = common::scenario(weather(i), GridFeatures::default());
            if i % 2 == 0 {
                let result = SensitivityAnalyzer::new(engine.as_ref())
                    .analyze(&base, "weather.wind_speed", 0.0, 120.0, 20)
                    .unwrap();
                result.total_steps
            } else {
                engine.assess(&base);
                1
            }
        });
    }

    let mut total = 0;
    while let Some(steps) = tasks.join_next().await {
        total += steps.unwrap();
    }
    assert_eq!(total, 8 * 20 + 8);
}
