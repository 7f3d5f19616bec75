use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::app::AppState;
use crate::domain::ScoringMode;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    version: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    checks: HealthChecks,
}

/// Individual health checks
#[derive(Debug, Serialize)]
pub struct HealthChecks {
    model: ComponentHealth,
}

/// Health status of a component
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    status: String,
    mode: ScoringMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    model_id: Option<String>,
}

impl ComponentHealth {
    fn healthy(model_id: String) -> Self {
        Self {
            status: "healthy".to_string(),
            mode: ScoringMode::Model,
            model_id: Some(model_id),
        }
    }

    fn degraded() -> Self {
        Self {
            status: "degraded".to_string(),
            mode: ScoringMode::Fallback,
            model_id: None,
        }
    }
}

fn check_model(state: &AppState) -> ComponentHealth {
    match state.engine.model() {
        Some(model) => ComponentHealth::healthy(model.metadata.model_id.clone()),
        None => ComponentHealth::degraded(),
    }
}

/// GET /health - Health check endpoint
///
/// Fallback scoring still answers every request, so a missing model reports
/// "degraded" with 200 rather than failing the check.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let model = check_model(&state);

    let response = HealthResponse {
        status: model.status.clone(),
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now(),
        checks: HealthChecks { model },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness probe for Kubernetes
///
/// The engine is built before the listener binds, so a running server is ready.
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    tracing::debug!(mode = %state.engine.mode(), "Readiness probe");
    StatusCode::OK
}

/// GET /health/live - Liveness probe for Kubernetes
///
/// Returns 200 if the application is running
pub async fn liveness_check() -> impl IntoResponse {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_health_healthy() {
        let health = ComponentHealth::healthy("risk-gbt-v3".to_string());
        assert_eq!(health.status, "healthy");
        assert_eq!(health.mode, ScoringMode::Model);
        assert_eq!(health.model_id.as_deref(), Some("risk-gbt-v3"));
    }

    #[test]
    fn test_component_health_degraded() {
        let health = ComponentHealth::degraded();
        assert_eq!(health.status, "degraded");
        assert_eq!(health.mode, ScoringMode::Fallback);
        assert!(health.model_id.is_none());
    }
}
