//! HTTP API handlers — ping/pong exchange and read-only directory state.

pub mod node;
pub mod status;

use std::sync::Arc;
use std::time::Instant;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use waypoint_core::config::DirectoryConfig;
use waypoint_core::PingError;
use waypoint_services::DirectoryService;

pub use node::{handle_peers, handle_ping};
pub use status::{handle_identity, handle_status};

#[derive(Clone)]
pub struct ApiState {
    pub directory: DirectoryService,
    /// Effective configuration, reported by /status.
    pub config: Arc<DirectoryConfig>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(directory: DirectoryService, config: Arc<DirectoryConfig>) -> Self {
        Self {
            directory,
            config,
            started_at: Instant::now(),
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// JSON error body: `{"kind": .., "code": .., "message": ..}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &'static str, code: &'static str, message: String) -> Self {
        Self {
            status,
            body: ErrorBody {
                kind,
                code,
                message,
            },
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation", code, message.into())
    }

    pub fn too_many_requests() -> Self {
        Self::new(
            StatusCode::TOO_MANY_REQUESTS,
            "throttled",
            "too_many_requests",
            "Too many requests".into(),
        )
    }
}

impl From<PingError> for ApiError {
    fn from(err: PingError) -> Self {
        let status = match &err {
            PingError::HashMismatch { .. } | PingError::BadSignature { .. } => {
                StatusCode::UNAUTHORIZED
            }
            PingError::VersionRejected { .. } => StatusCode::UPGRADE_REQUIRED,
            PingError::TimestampSkew { .. } | PingError::Malformed { .. } => {
                StatusCode::BAD_REQUEST
            }
        };
        Self::new(status, err.kind().as_str(), err.code(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
