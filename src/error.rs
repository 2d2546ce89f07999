//! Request-level failures and their HTTP rendering.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

/// Direction of a transfer, used to word parameter errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Download,
    Upload,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures surfaced by the transfer endpoints.
///
/// Every variant ends only the request that produced it.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Size path parameter was non-numeric, zero, or above the ceiling.
    #[error("Failed to parse {direction} size from path")]
    InvalidParameter {
        direction: Direction,
        raw: String,
        reason: String,
    },

    /// Request body ended or failed before the declared byte count.
    #[error("Failed to read request payload. Failed at {read}")]
    IncompleteUpload {
        read: u64,
        expected: u64,
        cause: Option<String>,
    },
}

impl TransferError {
    pub fn status(&self) -> StatusCode {
        match self {
            TransferError::InvalidParameter { .. } | TransferError::IncompleteUpload { .. } => {
                StatusCode::BAD_REQUEST
            }
        }
    }

    /// Record the failure server-side with its raw details.
    pub fn log(&self) {
        match self {
            TransferError::InvalidParameter {
                direction,
                raw,
                reason,
            } => {
                warn!(%direction, raw = %raw, reason = %reason, "Rejected size parameter");
            }
            TransferError::IncompleteUpload {
                read,
                expected,
                cause,
            } => {
                warn!(
                    read,
                    expected,
                    cause = cause.as_deref().unwrap_or("body ended early"),
                    "Upload incomplete"
                );
            }
        }
    }
}

/// JSON error body: `{"message": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl IntoResponse for TransferError {
    fn into_response(self) -> Response {
        self.log();
        (
            self.status(),
            Json(ErrorBody {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}
