#[cfg(feature = "swagger")]
pub mod openapi;
pub mod error;
pub mod health;
pub mod model;
pub mod predictions;
pub mod response;
pub mod simulation;
pub mod v1;

use axum::{routing::get, Router};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    let cfg = state.cfg.clone();

    let health = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/health/ready", get(health::readiness_check))
        .with_state(state.clone());

    let mut router = Router::new()
        .merge(health)
        .nest("/api/v1", v1::router(state));

    if cfg.server.enable_cors {
        use tower_http::cors::AllowOrigin;
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::exact(axum::http::HeaderValue::from_static(
                "http://localhost:3000",
            )))
            .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
            .allow_headers([axum::http::header::CONTENT_TYPE]);
        router = router.layer(cors);
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(axum::extract::DefaultBodyLimit::max(1024 * 1024))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    cfg.server.request_timeout_secs,
                ))),
        )
        .layer(TraceLayer::new_for_http())
}

#[cfg(feature = "swagger")]
pub fn with_swagger(app: Router) -> Router {
    use crate::api::openapi::ApiDoc;
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;
    app.merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
}

#[cfg(feature = "metrics")]
pub fn with_metrics(app: Router) -> Router {
    use axum_prometheus::PrometheusMetricLayer;
    let (layer, handle) = PrometheusMetricLayer::pair();

    let metrics_router =
        Router::new().route("/metrics", axum::routing::get(move || async move { handle.render() }));

    app.layer(layer).merge(metrics_router)
}
