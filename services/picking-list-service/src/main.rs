//! Picking List Service
//!
//! Accepts picking list uploads (XLSX, XLS, CSV) and returns the parsed
//! orders as JSON.

use anyhow::Result;
use axum::{extract::DefaultBodyLimit, routing::get, serve, Router};
use picking_utils::{init_logging, AppConfig, PickingListExtractor};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::info;

mod error;
mod handlers;
mod middleware;
mod routes;

use handlers::health_check;
use middleware::request_id_middleware;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration ({e}), using defaults");
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting Picking List Service");

    let addr = config.bind_address();
    let app = create_app(AppState::new(config));

    let listener = TcpListener::bind(&addr).await?;
    info!("Picking List Service listening on {}", addr);

    serve(listener, app).await?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", routes::create_api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id_middleware))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(state.config.server.max_upload_bytes)),
        )
        .with_state(state)
}

#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<PickingListExtractor>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            extractor: Arc::new(PickingListExtractor::from_config(&config.parser)),
            config,
        }
    }
}
