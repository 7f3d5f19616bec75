//! Router-level tests: requests go through the full middleware stack.

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use outage_risk_forecaster::api;

fn app() -> Router {
    api::router(common::state(common::fallback_engine()))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn stormy_request() -> Value {
    json!({
        "weather_data": {
            "temperature": 28.0,
            "humidity": 85.0,
            "wind_speed": 45.0,
            "rainfall": 15.0,
            "lightning_strikes": 3,
            "storm_alert": false
        },
        "grid_data": {
            "load_factor": 0.8,
            "voltage_stability": 0.9,
            "historical_outages": 2,
            "maintenance_status": false,
            "feeder_health": 0.7
        },
        "reference_time": "2024-07-15T14:00:00Z"
    })
}

#[tokio::test]
async fn test_health_reports_fallback_mode() {
    let (status, body) = send(app(), get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["model"]["mode"], "fallback");

    let (status, _) = send(app(), get("/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(app(), get("/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_model_info_in_fallback_mode() {
    let (status, body) = send(app(), get("/api/v1/model")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["scoring_mode"], "fallback");
    assert!(body["data"]["notice"].is_string());
    assert!(body["data"].get("metadata").is_none());
    assert_eq!(
        body["data"]["feature_layout"]["names"].as_array().unwrap().len(),
        common::FEATURE_COUNT
    );
}

#[tokio::test]
async fn test_model_info_reports_metadata() {
    let app = api::router(common::state(common::single_feature_engine(
        common::RAINFALL,
        2.0,
        0.0,
    )));
    let (status, body) = send(app, get("/api/v1/model")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["scoring_mode"], "model");
    assert_eq!(body["data"]["metadata"]["model_id"], "linear-test");
    assert!(body["data"].get("notice").is_none());
}

#[tokio::test]
async fn test_predict_returns_fallback_score() {
    let (status, body) = send(app(), post("/api/v1/predict", stormy_request())).await;
    assert_eq!(status, StatusCode::OK);

    let expected = 0.8 * 15.0
        + 0.3 * 45.0
        + 2.0 * 3.0
        + 20.0 * 0.0
        + 30.0 * (1.0 - 0.9)
        + 25.0 * 0.8
        + 15.0 * 0.0
        + 20.0 * (1.0 - 0.7);
    let data = &body["data"];
    assert_eq!(data["risk_score"].as_f64().unwrap(), expected);
    assert_eq!(data["risk_level"], "high");
    assert_eq!(data["scoring_mode"], "fallback");
    assert_eq!(data["prediction_horizon_hours"], 24);
    assert_eq!(data["explanation"]["method"], "heuristic");
    assert!(!data["contributing_factors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_predict_can_omit_explanation() {
    let mut request = stormy_request();
    request["include_explanation"] = json!(false);
    let (status, body) = send(app(), post("/api/v1/predict", request)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].get("explanation").is_none());
}

#[tokio::test]
async fn test_predict_rejects_out_of_range_input() {
    let mut request = stormy_request();
    request["grid_data"]["load_factor"] = json!(1.5);
    let (status, body) = send(app(), post("/api/v1/predict", request)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_predict_batch_keeps_order() {
    let mut calm = stormy_request();
    calm["weather_data"] = json!({});
    calm["grid_data"] = json!({});
    let batch = json!([stormy_request(), calm]);

    let (status, body) = send(app(), post("/api/v1/predict/batch", batch)).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["data"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0]["risk_score"].as_f64().unwrap() > 60.0);
    assert_eq!(results[1]["risk_score"].as_f64().unwrap(), 0.0);
    assert_eq!(body["metadata"]["total_count"], 2);
}

#[tokio::test]
async fn test_predict_batch_over_limit_is_rejected() {
    let batch = Value::Array(vec![stormy_request(); 101]);
    let (status, body) = send(app(), post("/api/v1/predict/batch", batch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("100"));
}

#[tokio::test]
async fn test_what_if_reports_risk_change() {
    let request = json!({
        "base_scenario": stormy_request(),
        "modified_parameters": {"weather.storm_alert": true, "weather.tornado": 3},
        "scenario_name": "storm warning"
    });
    let (status, body) = send(app(), post("/api/v1/what-if", request)).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["scenario_name"], "storm warning");
    assert!((data["risk_change"].as_f64().unwrap() - 20.0).abs() < 1e-9);
    assert_eq!(data["impact_analysis"]["direction"], "increase");
    assert_eq!(
        data["impact_analysis"]["skipped_parameters"][0]["parameter"],
        "weather.tornado"
    );
    assert!(data["simulation_id"].is_string());
}

#[tokio::test]
async fn test_what_if_batch_summarises_runs() {
    let run = |name: &str, rainfall: f64| {
        json!({
            "base_scenario": stormy_request(),
            "modified_parameters": {"weather.rainfall": rainfall},
            "scenario_name": name
        })
    };
    let batch = json!([run("drier", 0.0), run("wetter", 40.0)]);

    let (status, body) = send(app(), post("/api/v1/what-if/batch", batch)).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["total_simulations"], 2);
    assert_eq!(data["results"][0]["scenario_name"], "drier");
    assert_eq!(data["results"][1]["scenario_name"], "wetter");
    assert_eq!(data["batch_summary"]["scenarios_increasing_risk"], 1);
    assert_eq!(data["batch_summary"]["scenarios_decreasing_risk"], 1);
    assert_eq!(
        data["batch_summary"]["most_impactful_scenario"]["scenario_name"],
        "wetter"
    );
}

#[tokio::test]
async fn test_what_if_batch_over_limit_is_rejected() {
    let run = json!({
        "base_scenario": stormy_request(),
        "modified_parameters": {}
    });
    let batch = Value::Array(vec![run; 21]);
    let (status, _) = send(app(), post("/api/v1/what-if/batch", batch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_templates_listing_and_lookup() {
    let (status, body) = send(app(), get("/api/v1/what-if/templates")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total_templates"], 5);

    let (status, body) = send(app(), get("/api/v1/what-if/templates/lightning_storm")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["key"], "lightning_storm");

    let (status, body) = send(app(), get("/api/v1/what-if/templates/volcano")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NotFound");
}

#[tokio::test]
async fn test_sensitivity_sweep() {
    let app = api::router(common::state(common::single_feature_engine(
        common::RAINFALL,
        2.0,
        0.0,
    )));
    let request = json!({
        "base_scenario": stormy_request(),
        "parameter": "weather.rainfall",
        "min_value": 0.0,
        "max_value": 40.0,
        "steps": 5
    });
    let (status, body) = send(app, post("/api/v1/what-if/sensitivity", request)).await;
    assert_eq!(status, StatusCode::OK);

    let data = &body["data"];
    assert_eq!(data["parameter"], "weather.rainfall");
    assert_eq!(data["total_steps"], 5);
    assert_eq!(data["base_risk_score"].as_f64().unwrap(), 30.0);
    assert_eq!(
        data["sensitivity_metrics"]["sensitivity_coefficient"]
            .as_f64()
            .unwrap(),
        2.0
    );
}

#[tokio::test]
async fn test_sensitivity_rejects_bad_requests() {
    let sweep = |min: f64, max: f64, steps: usize, parameter: &str| {
        json!({
            "base_scenario": stormy_request(),
            "parameter": parameter,
            "min_value": min,
            "max_value": max,
            "steps": steps
        })
    };

    let (status, body) = send(
        app(),
        post("/api/v1/what-if/sensitivity", sweep(10.0, 5.0, 5, "weather.rainfall")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("min_value (10) must be less than max_value (5)"));

    let (status, _) = send(
        app(),
        post("/api/v1/what-if/sensitivity", sweep(0.0, 5.0, 25, "weather.rainfall")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        app(),
        post("/api/v1/what-if/sensitivity", sweep(0.0, 5.0, 5, "weather.tornado")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
