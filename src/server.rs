//! HTTP server lifecycle.
//!
//! Opens the database, wires the services and serves the router until the
//! cancellation token fires. In-flight requests are drained before the pool
//! is closed.

use crate::api::{self, AppState};
use crate::config::Config;
use crate::db::{self, DbError};
use crate::services::{ReviewerSelector, Services};
use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("database setup failed: {0}")]
    Database(#[from] DbError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Build the shared state on top of an initialized pool.
pub fn build_state(pool: db::pool::DbPool, selector: ReviewerSelector) -> AppState {
    let services = Services::new(pool.clone(), selector);
    AppState::new(pool, services)
}

/// Serve until `shutdown` is cancelled.
pub async fn run(config: Config, shutdown: CancellationToken) -> Result<(), ServerError> {
    let pool = db::initialize(&config.database_path, config.db_max_connections).await?;
    let state = build_state(pool.clone(), ReviewerSelector::from_entropy());
    let app = api::router(state);

    let addr = config.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    log::info!("[server] Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.cancelled().await;
        })
        .await?;

    pool.close().await;
    log::info!("[server] Server stopped");
    Ok(())
}
