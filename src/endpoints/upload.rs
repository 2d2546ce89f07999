//! Sized upload endpoint.
//!
//! The request body is pulled frame by frame into a `DiscardSink` until the
//! declared byte count has been consumed. Bytes past that count are ignored.

use axum::body::Body;
use axum::extract::Path;
use axum::Json;
use futures_util::StreamExt;
use serde::Serialize;
use tracing::debug;

use crate::endpoints::parse_size;
use crate::error::{Direction, TransferError};

/// Success body: `{"ok": true}`.
#[derive(Debug, Serialize)]
pub struct UploadStatus {
    pub ok: bool,
}

/// A write destination that counts bytes up to a limit and keeps none.
#[derive(Debug)]
pub struct DiscardSink {
    written: u64,
    limit: u64,
}

impl DiscardSink {
    pub fn new(limit: u64) -> Self {
        Self { written: 0, limit }
    }

    /// Accept as much of `chunk` as the limit allows, returning the count taken.
    pub fn accept(&mut self, chunk: &[u8]) -> usize {
        let room = self.limit - self.written;
        let taken = room.min(chunk.len() as u64);
        self.written += taken;
        taken as usize
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn is_full(&self) -> bool {
        self.written == self.limit
    }
}

/// POST /api/upload/Mb/{size}
pub async fn handle(
    Path(size): Path<String>,
    body: Body,
) -> Result<Json<UploadStatus>, TransferError> {
    let bytes = parse_size(&size, Direction::Upload)?;
    debug!(bytes, "Starting upload");

    let mut sink = DiscardSink::new(bytes);
    let mut stream = body.into_data_stream();

    while !sink.is_full() {
        match stream.next().await {
            Some(Ok(chunk)) => {
                sink.accept(&chunk);
            }
            Some(Err(e)) => {
                return Err(TransferError::IncompleteUpload {
                    read: sink.written(),
                    expected: bytes,
                    cause: Some(e.to_string()),
                });
            }
            None => {
                return Err(TransferError::IncompleteUpload {
                    read: sink.written(),
                    expected: bytes,
                    cause: None,
                });
            }
        }
    }

    Ok(Json(UploadStatus { ok: true }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discard_sink_caps_at_limit() {
        let mut sink = DiscardSink::new(10);
        assert_eq!(sink.accept(b"hello"), 5);
        assert!(!sink.is_full());
        assert_eq!(sink.accept(b"world!!"), 5);
        assert!(sink.is_full());
        assert_eq!(sink.accept(b"more"), 0);
        assert_eq!(sink.written(), 10);
    }

    #[test]
    fn test_discard_sink_empty_chunk() {
        let mut sink = DiscardSink::new(3);
        assert_eq!(sink.accept(&[]), 0);
        assert_eq!(sink.written(), 0);
    }
}
