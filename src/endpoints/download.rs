//! Sized download endpoint.
//!
//! The body is produced on demand by a `ByteBudgetSource`; nothing larger than
//! one scratch chunk is held in memory regardless of the requested size.

use axum::body::Body;
use axum::extract::Path;
use axum::http::{header, HeaderValue};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::endpoints::parse_size;
use crate::error::{Direction, TransferError};
use crate::generator::{ByteBudgetSource, DownloadStream};

/// Content type announced for download payloads.
pub const CONTENT_TYPE: &str = "text/data";

/// GET /api/download/Mb/{size}
pub async fn handle(Path(size): Path<String>) -> Result<Response, TransferError> {
    let bytes = parse_size(&size, Direction::Download)?;
    debug!(bytes, "Starting download");

    let stream = DownloadStream::new(ByteBudgetSource::new(bytes));
    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE)),
            (header::CONTENT_LENGTH, HeaderValue::from(bytes)),
        ],
        Body::from_stream(stream),
    )
        .into_response())
}
