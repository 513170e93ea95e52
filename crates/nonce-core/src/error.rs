use thiserror::Error;

/// Faults that stop a search from producing an outcome.
///
/// Running out of nonces or time is not a fault; those are reported as
/// [`SearchOutcome::Exhausted`](crate::SearchOutcome::Exhausted) and
/// [`SearchOutcome::Timeout`](crate::SearchOutcome::Timeout).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("difficulty must be within 0..=256 bits, got {requested}")]
    InvalidDifficulty { requested: i64 },
    #[error("invalid search options: {0}")]
    InvalidOptions(String),
    #[error("worker {worker} failed: {reason}")]
    WorkerFailed { worker: usize, reason: String },
}
