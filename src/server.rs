use anyhow::{Context, Result};
use axum::Router;
use std::path::Path;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::pool::Pool;
use crate::routes;
use crate::state::{AppState, State};
use crate::upload::UploadStore;

pub const DASHBOARD_FILE: &str = "dashboard.html";

/// API routes plus the static front-end rooted at `public_dir`.
pub fn build_router(state: AppState, public_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(public_dir.join(DASHBOARD_FILE)))
        .merge(routes::api_routes(max_upload_bytes))
        .fallback_service(ServeDir::new(public_dir))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn run(config: Config) -> Result<()> {
    tracing::info!("Starting CivicOne server");

    let pool = Pool::open(&config.db, config.pool_size)?;
    pool.run(|db| db.ping())
        .await
        .context("Error acquiring database connection")?;
    tracing::info!(
        db = %config.db.display(),
        pool_size = pool.size(),
        "Successfully connected to database"
    );

    let uploads = UploadStore::ensure(&config.public_dir)?;
    let state = State::new(pool.clone(), uploads);
    let app = build_router(state, &config.public_dir, config.max_upload_bytes);

    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    tracing::info!("CivicOne server running at http://{}", config.addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, draining connection pool");
    pool.close();
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl+c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Received shutdown signal, finishing in-flight requests");
}
