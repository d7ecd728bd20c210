use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use opd_queue_cell::services::{SupabaseDoctorRegistry, SupabaseTokenStore};
use opd_queue_cell::{OpdState, QueueScheduler};
use shared_config::AppConfig;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting MediSync OPD API server");

    // Load configuration
    let config = AppConfig::from_env();
    let port = config.port;
    let recompute_interval = Duration::from_secs(config.recompute_interval_secs);

    // Wire the OPD cell to its external stores
    let token_store = Arc::new(SupabaseTokenStore::new(&config));
    let doctor_registry = Arc::new(SupabaseDoctorRegistry::new(&config));
    let state = Arc::new(OpdState::new(token_store.clone(), doctor_registry.clone()));

    // Background queue recompute: fixed interval plus change-triggered
    let scheduler = QueueScheduler::new(
        token_store,
        doctor_registry,
        state.changes.clone(),
        recompute_interval,
    );
    tokio::spawn(scheduler.run());

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
