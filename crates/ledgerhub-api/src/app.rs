//! Application builder: wires router, middleware and state into an Axum
//! app and runs it alongside the background sweep.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::middleware as axum_middleware;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

use ledgerhub_core::config::AppConfig;
use ledgerhub_core::error::AppError;
use ledgerhub_database::Database;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server);
    build_router(state)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the LedgerHub server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig, db: Database) -> Result<(), AppError> {
    tracing::info!("Starting LedgerHub server...");

    let config = Arc::new(config);
    let state = AppState::new(config.clone(), db.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper = state.cleanup.clone().spawn(shutdown_rx);

    let app = build_app(state);
    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("LedgerHub server listening on {}", addr);

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let result = server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")));

    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Session sweeper did not stop cleanly");
    }
    db.close().await;
    tracing::info!("LedgerHub server stopped");
    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
