//! Utility functions shared by the workspace and document code.

use std::borrow::Cow;

use encoding_rs::Encoding;

/// Get a time-based seed value for pseudo-random number generation.
pub fn time_seed_nanos() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(12345)
}

/// Small linear congruential generator for temporary directory names.
///
/// Not suitable for anything security related; collisions are handled by
/// the caller retrying with the next value.
#[derive(Debug, Clone)]
pub struct Lcg(u64);

impl Lcg {
    /// Seed from the clock and the process id so concurrent runs diverge.
    pub fn from_clock() -> Self {
        Self::new(time_seed_nanos() ^ (u64::from(std::process::id()) << 32))
    }

    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 32) as u32
    }

    /// Next value in `low..high`.
    pub fn next_in(&mut self, low: u32, high: u32) -> u32 {
        debug_assert!(low < high);
        low + self.next_u32() % (high - low)
    }
}

/// Decode bytes as UTF-8, honouring a BOM and replacing malformed sequences.
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_utf8(bytes: &[u8]) -> Cow<'_, str> {
    let (result, _encoding, _malformed) = encoding_rs::UTF_8.decode(bytes);
    result
}

/// Decode bytes with a specific single-byte encoding.
///
/// A BOM, if present, still takes precedence, matching how text readers
/// treat files that carry one.
pub fn decode_with<'a>(encoding: &'static Encoding, bytes: &'a [u8]) -> Cow<'a, str> {
    let (result, actual, malformed) = encoding.decode(bytes);
    if malformed {
        tracing::debug!(encoding = actual.name(), "replaced malformed input while decoding");
    }
    result
}
