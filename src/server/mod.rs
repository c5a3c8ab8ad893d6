pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::task::JoinHandle;
use tracing::info;

use crate::adapters::attestor::LocalAttestor;

use self::routes::{attest_handler, health_handler, AppState};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
}

/// Build the attestation service router.
pub fn router(attestor: Arc<LocalAttestor>) -> Router {
    let state = AppState { attestor };
    Router::new()
        .route("/attest", post(attest_handler))
        .route("/health-check", get(health_handler))
        .with_state(state)
}

/// Start the attestation service. Binds `addr` (port 0 picks an ephemeral
/// port), returns the bound address and the serve task handle.
pub async fn start_server(
    attestor: Arc<LocalAttestor>,
    addr: SocketAddr,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let bound = listener
        .local_addr()
        .map_err(|source| ServerError::Bind { addr, source })?;

    let app = router(attestor);
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    info!(%bound, "attestation service started");
    Ok((bound, handle))
}
