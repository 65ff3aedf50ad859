use std::{error::Error, sync::Arc};

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

use crate::{
    core::{app_state::AppState, server_settings::ServerSettings},
    error_handler::AppError,
    middleware_layer::{
        cors::{CorsPolicy, cors_middleware},
        json_extractor::json_error_mapper,
    },
    routes::{
        ai::ask_route::ask_route,
        finance::quote_route::quote_route,
        health::health_route::health_route,
        uploads::{presign_route::presign_route, register_route::register_route},
    },
};

/// Builds the HTTP surface over `state`.
pub fn build_router(state: Arc<AppState>, cors: CorsPolicy) -> Router {
    Router::new()
        .route("/ai/ask", post(ask_route))
        .route("/api/finance/quote", get(quote_route))
        .route("/presign", post(presign_route))
        .route("/register", post(register_route))
        .route("/health", get(health_route))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn_with_state(
            Arc::new(cors),
            cors_middleware,
        ))
        .with_state(state)
}

pub async fn start() -> Result<(), Box<dyn Error>> {
    let settings = ServerSettings::from_env().map_err(AppError::from)?;
    let state = Arc::new(AppState::from_env().await.map_err(AppError::from)?);

    let app = build_router(state.clone(), settings.cors);

    // Bind to address
    let listener = tokio::net::TcpListener::bind(&settings.address)
        .await
        .map_err(AppError::Bind)?;
    info!(address = %settings.address, "listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    state.orchestrator.pool().teardown().await;
    info!("shutdown complete");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(err) = signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
