//! Difficulty validation and work estimates.

use crate::digest::DIGEST_LEN;
use crate::error::SearchError;

/// Largest meaningful difficulty: every bit of the digest is zero.
pub const MAX_DIFFICULTY_BITS: u32 = (DIGEST_LEN * 8) as u32;

/// Check a requested difficulty and narrow it to the accepted `0..=256` range.
pub fn validate_difficulty(requested: i64) -> Result<u32, SearchError> {
    u32::try_from(requested)
        .ok()
        .filter(|bits| *bits <= MAX_DIFFICULTY_BITS)
        .ok_or(SearchError::InvalidDifficulty { requested })
}

/// Average number of digest evaluations needed to hit `bits` leading zeros.
pub fn expected_hashes(bits: u32) -> f64 {
    2f64.powi(bits.min(MAX_DIFFICULTY_BITS) as i32)
}

/// Format a hash count for display (e.g., "1.23G" for billion).
pub fn format_work(hashes: f64) -> String {
    if hashes >= 1e15 {
        format!("{:.2}P", hashes / 1e15)
    } else if hashes >= 1e12 {
        format!("{:.2}T", hashes / 1e12)
    } else if hashes >= 1e9 {
        format!("{:.2}G", hashes / 1e9)
    } else if hashes >= 1e6 {
        format!("{:.2}M", hashes / 1e6)
    } else if hashes >= 1e3 {
        format!("{:.2}K", hashes / 1e3)
    } else {
        format!("{:.0}", hashes)
    }
}
