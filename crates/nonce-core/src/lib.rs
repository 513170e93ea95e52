//! Proof-of-work nonce search.
//!
//! Finds the smallest 4-byte nonce which, prepended little-endian to an
//! arbitrary payload, yields a SHA256 digest with a required number of
//! leading zero bits.
//!
//! This crate provides:
//! - Digest evaluation and leading-zero-bit checks
//! - A sequential reference search (the correctness oracle)
//! - A parallel worker pool with lowest-nonce winner selection
//! - A benchmark harness that runs an ordered list of cases

pub mod bench;
pub mod clock;
pub mod difficulty;
pub mod digest;
pub mod engine;
pub mod error;
pub mod pool;
pub mod request;

pub use bench::{default_cases, BenchCase, BenchRow, BenchmarkHarness};
pub use clock::{Clock, ManualClock, SystemClock};
pub use digest::{evaluate, leading_zero_bits, matches, Digest, DigestEvaluator};
pub use engine::{search, search_with};
pub use error::SearchError;
pub use pool::{default_worker_count, search_parallel, WorkerPool, WorkerRange};
pub use request::{SearchOptions, SearchOutcome, SearchRequest, SearchResult};
