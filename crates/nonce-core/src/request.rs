//! Search inputs, options and outcomes.

use std::time::Duration;

use crate::difficulty::validate_difficulty;
use crate::digest::Digest;
use crate::error::SearchError;

/// Size of the full nonce domain: every `u32` value.
pub const NONCE_DOMAIN: u64 = 1 << 32;

/// Evaluations between two checks of shared search state.
pub const DEFAULT_BATCH_SIZE: u32 = 4096;

/// An immutable search request: payload plus required leading zero bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    payload: Vec<u8>,
    difficulty_bits: u32,
}

impl SearchRequest {
    /// Create a request, rejecting difficulties outside `0..=256`.
    ///
    /// Validation happens here so an invalid request never reaches a search
    /// and no hashing is performed for it.
    pub fn new(payload: impl Into<Vec<u8>>, difficulty_bits: i64) -> Result<Self, SearchError> {
        let difficulty_bits = validate_difficulty(difficulty_bits)?;
        Ok(SearchRequest {
            payload: payload.into(),
            difficulty_bits,
        })
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn difficulty_bits(&self) -> u32 {
        self.difficulty_bits
    }
}

/// A winning nonce and what it cost to find it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    /// The smallest nonce meeting the difficulty.
    pub nonce: u32,
    /// Digest of the winning nonce and payload.
    pub digest: Digest,
    /// Wall-clock duration of the search.
    pub elapsed: Duration,
    /// Digest evaluations performed across all workers.
    pub hashes_tried: u64,
}

impl SearchResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Terminal state of one search.
///
/// For parallel searches `hashes_tried` is the sum of per-worker counters
/// when the search stopped, and includes evaluations done after the winner
/// was found. Only the sequential count is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A nonce meeting the difficulty was found.
    Found(SearchResult),
    /// Every nonce in the domain was tried without a match.
    Exhausted { hashes_tried: u64, elapsed: Duration },
    /// The deadline elapsed before a match or exhaustion.
    Timeout { hashes_tried: u64, elapsed: Duration },
}

impl SearchOutcome {
    pub fn found(&self) -> Option<&SearchResult> {
        match self {
            SearchOutcome::Found(result) => Some(result),
            _ => None,
        }
    }

    pub fn hashes_tried(&self) -> u64 {
        match self {
            SearchOutcome::Found(result) => result.hashes_tried,
            SearchOutcome::Exhausted { hashes_tried, .. }
            | SearchOutcome::Timeout { hashes_tried, .. } => *hashes_tried,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            SearchOutcome::Found(result) => result.elapsed,
            SearchOutcome::Exhausted { elapsed, .. } | SearchOutcome::Timeout { elapsed, .. } => {
                *elapsed
            }
        }
    }

    /// Short name of the outcome kind.
    pub fn name(&self) -> &'static str {
        match self {
            SearchOutcome::Found(_) => "found",
            SearchOutcome::Exhausted { .. } => "exhausted",
            SearchOutcome::Timeout { .. } => "timeout",
        }
    }

    /// Hashes per second over the whole search.
    pub fn hash_rate(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.hashes_tried() as f64 / secs
        } else {
            0.0
        }
    }
}

/// Tuning shared by the sequential engine and the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Give up with [`SearchOutcome::Timeout`] once this much time has passed.
    pub deadline: Option<Duration>,
    /// Evaluations between checks of the deadline and cancellation state.
    pub batch_size: u32,
    /// Exclusive upper bound of the nonce domain, at most [`NONCE_DOMAIN`].
    pub domain: u64,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            deadline: None,
            batch_size: DEFAULT_BATCH_SIZE,
            domain: NONCE_DOMAIN,
        }
    }
}

impl SearchOptions {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_batch_size(mut self, batch_size: u32) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Narrow the searched domain to `[0, domain)`.
    pub fn with_domain(mut self, domain: u64) -> Self {
        self.domain = domain;
        self
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.batch_size == 0 {
            return Err(SearchError::InvalidOptions(
                "batch size must be at least 1".to_string(),
            ));
        }
        if self.domain == 0 || self.domain > NONCE_DOMAIN {
            return Err(SearchError::InvalidOptions(format!(
                "nonce domain must be within 1..={}, got {}",
                NONCE_DOMAIN, self.domain
            )));
        }
        Ok(())
    }
}
