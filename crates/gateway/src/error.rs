//! Request-time error taxonomy (spec §7).
//!
//! Every pipeline stage either yields a value or a [`PipelineError`]; the
//! first error short-circuits the remaining stages straight to
//! `Responder::write_error`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use gateway_kernel::GatewayError;
use serde_json::{json, Value};
use thiserror::Error;

/// Per-request error type. Carries enough to reproduce spec §7's
/// `{ message, statusCode, cause? }` error object.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Body parse failure, malformed cache-admin payload.
    #[error("{0}")]
    BadRequest(String),

    /// Missing/invalid JWT, role mismatch, malformed `auth` spec.
    #[error("{0}")]
    AuthError(String),

    /// No matching route; no cache driver for an admin request.
    #[error("{0}")]
    NotFound(String),

    /// The backend reported a status code >= 400.
    #[error("backend error {status}")]
    BackendError { status: u16, body: Value },

    /// Unexpected failure: invoker transport, cache store, shaper invariant.
    #[error("{0}")]
    InternalError(String),

    /// A startup/definition-time error surfaced at request time (e.g. an
    /// `auth` field that is truthy but not a structured object).
    #[error(transparent)]
    Config(#[from] GatewayError),
}

impl PipelineError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PipelineError::BadRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::AuthError(_) => StatusCode::FORBIDDEN,
            PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
            PipelineError::BackendError { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            PipelineError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The JSON body written by `Responder::write_error`: `{ message, statusCode }`.
    /// Backend errors preserve the structured body under `message` rather than
    /// stringifying it (spec §9's open question, resolved — see SPEC_FULL.md).
    pub fn to_body(&self) -> Value {
        let status = self.status_code().as_u16();
        match self {
            PipelineError::BackendError { body, .. } => json!({
                "message": body,
                "statusCode": status,
            }),
            other => json!({
                "message": other.to_string(),
                "statusCode": status,
            }),
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(self.to_body())).into_response()
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
