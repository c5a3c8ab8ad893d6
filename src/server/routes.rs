use std::sync::Arc;

use alloy::primitives::{Address, B256};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::adapters::attestor::LocalAttestor;
use crate::ports::attestation::Attestation;

/// Shared application state for axum route handlers.
#[derive(Clone)]
pub struct AppState {
    pub attestor: Arc<LocalAttestor>,
}

/// Request body for POST /attest.
#[derive(Debug, Serialize, Deserialize)]
pub struct AttestationRequest {
    pub action_id: B256,
    pub user: Address,
}

/// POST /attest: issue a signed attestation for `(action_id, user)`.
pub async fn attest_handler(
    State(state): State<AppState>,
    Json(request): Json<AttestationRequest>,
) -> Result<Json<Attestation>, AppError> {
    let attestation = state
        .attestor
        .attest(request.action_id, request.user)
        .map_err(|e| AppError(e.to_string()))?;
    Ok(Json(attestation))
}

/// GET /health-check.
pub async fn health_handler() -> StatusCode {
    StatusCode::OK
}

/// Error wrapper mapping signing failures to 500s.
pub struct AppError(pub String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.0).into_response()
    }
}
