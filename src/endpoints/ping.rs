//! Liveness check.

/// GET /api/ping
pub async fn handle() -> &'static str {
    "Pong"
}
