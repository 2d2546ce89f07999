//! Bounded byte generator for download payloads.
//!
//! A `ByteBudgetSource` hands out exactly `remaining` bytes across any number
//! of read calls without ever materializing the whole payload. Every read
//! copies from the start of a shared, read-only pattern; only the byte count
//! matters to clients, not the content.
//!
//! ## Read Contract
//!
//! ```text
//! copy = min(pattern.len(), buf.len(), remaining)
//! remaining -= copy
//! End(copy)  if remaining is now zero (or was already zero, with copy = 0)
//! More(copy) otherwise
//! ```
//!
//! A read rarely fills the caller's buffer completely. The pattern is large
//! enough that the extra calls cost less than looping to pack each buffer.

use std::convert::Infallible;
use std::io;
use std::pin::Pin;
use std::sync::LazyLock;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_core::Stream;

/// Unit repeated to build the pattern.
const PATTERN_UNIT: &[u8] = b"0123456789";

/// Number of repetitions of `PATTERN_UNIT` (125,000 bytes total).
const PATTERN_REPEATS: usize = 100 * 1000 / 8;

/// Default scratch chunk size for `DownloadStream`.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Process-wide source pattern, built on first use and never written again.
static PATTERN: LazyLock<Box<[u8]>> =
    LazyLock::new(|| PATTERN_UNIT.repeat(PATTERN_REPEATS).into_boxed_slice());

/// Outcome of a single `ByteBudgetSource::read` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    /// Bytes were written and more remain in the budget.
    More(usize),
    /// The budget is exhausted; carries the bytes written by this call.
    End(usize),
}

impl ReadResult {
    /// Bytes written by the call.
    pub fn written(self) -> usize {
        match self {
            ReadResult::More(n) | ReadResult::End(n) => n,
        }
    }

    pub fn is_end(self) -> bool {
        matches!(self, ReadResult::End(_))
    }
}

/// An in-progress bounded byte stream.
///
/// Owned by exactly one request; moved into the response body and dropped
/// with it.
#[derive(Debug)]
pub struct ByteBudgetSource {
    remaining: u64,
}

impl ByteBudgetSource {
    /// Create a source that will emit exactly `budget` bytes.
    pub fn new(budget: u64) -> Self {
        Self { remaining: budget }
    }

    /// Bytes still to be emitted.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Fill a prefix of `buf` from the pattern and charge it to the budget.
    pub fn read(&mut self, buf: &mut [u8]) -> ReadResult {
        if self.remaining == 0 {
            return ReadResult::End(0);
        }

        let pattern = &PATTERN[..];
        let mut copy_size = pattern.len().min(buf.len());
        // Never hand out more than the budget allows.
        if copy_size as u64 > self.remaining {
            copy_size = self.remaining as usize;
        }

        buf[..copy_size].copy_from_slice(&pattern[..copy_size]);
        self.remaining -= copy_size as u64;

        if self.remaining == 0 {
            ReadResult::End(copy_size)
        } else {
            ReadResult::More(copy_size)
        }
    }
}

impl io::Read for ByteBudgetSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(ByteBudgetSource::read(self, buf).written())
    }
}

/// Response body stream driving a `ByteBudgetSource`.
///
/// Each poll reads into one reused scratch buffer and yields a copy of the
/// filled prefix as a `Bytes` chunk.
pub struct DownloadStream {
    source: ByteBudgetSource,
    scratch: Vec<u8>,
    chunk_size: usize,
    done: bool,
}

impl DownloadStream {
    pub fn new(source: ByteBudgetSource) -> Self {
        Self::with_chunk_size(source, DEFAULT_CHUNK_SIZE)
    }

    /// Create a stream with an explicit scratch chunk size.
    ///
    /// # Panics
    /// Panics if `chunk_size` is zero.
    pub fn with_chunk_size(source: ByteBudgetSource, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self {
            source,
            scratch: vec![0u8; chunk_size],
            chunk_size,
            done: false,
        }
    }
}

impl Stream for DownloadStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        let result = this.source.read(&mut this.scratch);
        if result.is_end() {
            this.done = true;
        }

        let written = result.written();
        if written == 0 {
            return Poll::Ready(None);
        }
        Poll::Ready(Some(Ok(Bytes::copy_from_slice(&this.scratch[..written]))))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done || self.source.is_exhausted() {
            return (0, Some(0));
        }
        let chunks = self.source.remaining().div_ceil(self.chunk_size as u64);
        let chunks = usize::try_from(chunks).unwrap_or(usize::MAX);
        (0, Some(chunks))
    }
}
