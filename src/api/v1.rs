use axum::{
    routing::{get, post},
    Router,
};

use super::{model, predictions, simulation};
use crate::app::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/model", get(model::model_info))
        .route("/predict", post(predictions::predict))
        .route("/predict/batch", post(predictions::predict_batch))
        .route("/what-if", post(simulation::what_if))
        .route("/what-if/batch", post(simulation::what_if_batch))
        .route("/what-if/templates", get(simulation::list_templates))
        .route("/what-if/templates/:key", get(simulation::get_template))
        .route("/what-if/sensitivity", post(simulation::sensitivity))
        .with_state(state)
}
