use std::sync::Arc;

use axum::{routing::get, Router};

use opd_queue_cell::{opd_routes, OpdState};

pub fn create_router(state: Arc<OpdState>) -> Router {
    Router::new()
        .route("/", get(|| async { "MediSync OPD API is running!" }))
        .nest("/opd", opd_routes(state))
}
