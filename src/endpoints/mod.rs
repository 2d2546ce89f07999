//! HTTP endpoints.
//!
//! - `download`: streams a sized synthetic payload to the client
//! - `upload`: consumes and discards a sized request body
//! - `ping`: liveness check
//!
//! Sizes arrive as megabit counts in the path and are converted to bytes
//! once, here, before any transfer starts.

pub mod download;
pub mod ping;
pub mod upload;

use crate::error::{Direction, TransferError};

/// Largest accepted size, in megabits.
pub const MAX_MEGABITS: u64 = 5000;

/// Convert a megabit count to bytes (decimal mega, truncating division).
pub fn megabits_to_bytes(megabits: u64) -> u64 {
    megabits * 1000 * 1000 / 8
}

/// Parse and validate a megabit path parameter, returning the byte count.
///
/// Accepts unsigned decimal integers in `(0, MAX_MEGABITS]`; signs are rejected.
pub fn parse_size(raw: &str, direction: Direction) -> Result<u64, TransferError> {
    let invalid = |reason: String| TransferError::InvalidParameter {
        direction,
        raw: raw.to_string(),
        reason,
    };

    // `u64::from_str` accepts a leading `+`; only bare digits are valid here.
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("expected an unsigned decimal integer".to_string()));
    }

    let megabits: u64 = raw.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
    if megabits == 0 || megabits > MAX_MEGABITS {
        return Err(invalid(format!("must be in 1..={MAX_MEGABITS}")));
    }

    Ok(megabits_to_bytes(megabits))
}
