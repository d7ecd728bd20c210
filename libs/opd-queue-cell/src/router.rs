use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::OpdState;

pub fn opd_routes(state: Arc<OpdState>) -> Router {
    Router::new()
        .route("/tokens", post(handlers::register_token))
        .route("/tokens/emergency", post(handlers::register_emergency))
        .route("/tokens/{token_id}/start", post(handlers::start_consultation))
        .route(
            "/tokens/{token_id}/complete",
            post(handlers::complete_consultation),
        )
        .route("/tokens/{token_id}/delay", post(handlers::delay_patient))
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}/queue", get(handlers::get_queue))
        .route(
            "/doctors/{doctor_id}/queue/metrics",
            get(handlers::get_queue_metrics),
        )
        .route("/doctors/{doctor_id}/call-next", post(handlers::call_next))
        .with_state(state)
}
