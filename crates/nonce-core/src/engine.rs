//! Sequential reference search.
//!
//! Tries nonces in increasing order and stops at the first match, so the
//! winning nonce is always the smallest one. The worker pool must agree
//! with this engine for the same request.

use std::time::Duration;

use tracing::{debug, info};

use crate::clock::{Clock, Stopwatch, SystemClock};
use crate::difficulty::{expected_hashes, format_work};
use crate::digest::{matches, Digest, DigestEvaluator};
use crate::error::SearchError;
use crate::request::{SearchOptions, SearchOutcome, SearchRequest, SearchResult};

/// A nonce whose digest met the difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub nonce: u32,
    pub digest: Digest,
}

/// Result of scanning one batch of nonces.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchScan {
    /// First matching nonce in the batch, if any.
    pub hit: Option<Hit>,
    /// Evaluations performed, up to and including the hit.
    pub hashes: u64,
}

/// Scan `[start, end)` in increasing order, stopping at the first match.
///
/// Both bounds must lie within the nonce domain.
#[inline]
pub(crate) fn scan_batch(
    evaluator: &mut DigestEvaluator,
    difficulty_bits: u32,
    start: u64,
    end: u64,
) -> BatchScan {
    for nonce in start..end {
        let nonce = nonce as u32;
        let digest = evaluator.evaluate(nonce);
        if matches(&digest, difficulty_bits) {
            return BatchScan {
                hit: Some(Hit { nonce, digest }),
                hashes: u64::from(nonce) - start + 1,
            };
        }
    }

    BatchScan {
        hit: None,
        hashes: end.saturating_sub(start),
    }
}

/// Search the full nonce domain with the wall clock and no deadline.
pub fn search(request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
    search_with(request, &SearchOptions::default(), &SystemClock::new())
}

/// Search with explicit options and time source.
///
/// The deadline is checked before every batch of `options.batch_size`
/// evaluations, so a zero deadline times out before any hashing.
pub fn search_with<C: Clock + ?Sized>(
    request: &SearchRequest,
    options: &SearchOptions,
    clock: &C,
) -> Result<SearchOutcome, SearchError> {
    options.validate()?;

    let difficulty_bits = request.difficulty_bits();
    let batch_size = u64::from(options.batch_size);
    let mut evaluator = DigestEvaluator::new(request.payload());
    let watch = Stopwatch::start(clock);

    debug!(
        "sequential search: {} bytes, {} bits, expected work {}",
        request.payload().len(),
        difficulty_bits,
        format_work(expected_hashes(difficulty_bits))
    );

    let mut nonce = 0u64;
    let mut hashes_tried = 0u64;

    while nonce < options.domain {
        if watch.expired(options.deadline) {
            let elapsed = watch.elapsed();
            info!(
                "search timed out after {:?} ({} hashes)",
                elapsed, hashes_tried
            );
            return Ok(SearchOutcome::Timeout {
                hashes_tried,
                elapsed,
            });
        }

        let batch_end = (nonce + batch_size).min(options.domain);
        let scan = scan_batch(&mut evaluator, difficulty_bits, nonce, batch_end);
        hashes_tried += scan.hashes;

        if let Some(hit) = scan.hit {
            let result = SearchResult {
                nonce: hit.nonce,
                digest: hit.digest,
                elapsed: nonzero(watch.elapsed()),
                hashes_tried,
            };
            info!(
                "found nonce {} after {} hashes in {:.4}s",
                result.nonce,
                result.hashes_tried,
                result.elapsed_seconds()
            );
            return Ok(SearchOutcome::Found(result));
        }

        nonce = batch_end;
    }

    let elapsed = watch.elapsed();
    info!(
        "nonce domain exhausted after {} hashes in {:?}",
        hashes_tried, elapsed
    );
    Ok(SearchOutcome::Exhausted {
        hashes_tried,
        elapsed,
    })
}

/// Coarse clocks can read the same instant twice; a finished search always
/// took some time.
pub(crate) fn nonzero(elapsed: Duration) -> Duration {
    elapsed.max(Duration::from_nanos(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::digest::evaluate;

    fn request(text: &str, bits: i64) -> SearchRequest {
        SearchRequest::new(text, bits).unwrap()
    }

    #[test]
    fn test_zero_difficulty_takes_first_nonce() {
        for payload in ["", "Esse é fácil", "É possível calcular esse?"] {
            let outcome = search(&request(payload, 0)).unwrap();
            let result = outcome.found().expect("zero difficulty always matches");
            assert_eq!(result.nonce, 0);
            assert_eq!(result.hashes_tried, 1);
        }
    }

    #[test]
    fn test_finds_smallest_nonce() {
        let outcome = search(&request("Esse é fácil", 8)).unwrap();
        let result = outcome.found().unwrap();

        assert_eq!(result.nonce, 33);
        assert_eq!(result.hashes_tried, u64::from(result.nonce) + 1);
        assert!(result.elapsed_seconds() > 0.0);
        assert_eq!(result.digest, evaluate(33, "Esse é fácil".as_bytes()));

        // Nothing below the winner qualifies
        for nonce in 0..result.nonce {
            assert!(!matches(&evaluate(nonce, "Esse é fácil".as_bytes()), 8));
        }
    }

    #[test]
    fn test_known_nonces() {
        let cases = [
            ("Esse é fácil", 10, 1610),
            ("Esse é fácil", 12, 16572),
            ("Texto maior muda o tempo?", 8, 35),
            ("Texto maior muda o tempo?", 12, 2411),
            ("É possível calcular esse?", 8, 713),
            ("É possível calcular esse?", 10, 754),
        ];

        for (text, bits, expected) in cases {
            let outcome = search(&request(text, bits)).unwrap();
            let result = outcome.found().unwrap();
            assert_eq!(result.nonce, expected, "{} @ {} bits", text, bits);
            assert_eq!(result.hashes_tried, u64::from(expected) + 1);
        }
    }

    #[test]
    fn test_batch_size_does_not_change_winner() {
        let req = request("Esse é fácil", 10);
        for batch_size in [1, 7, 1610, 1611, 100_000] {
            let options = SearchOptions::default().with_batch_size(batch_size);
            let outcome = search_with(&req, &options, &SystemClock::new()).unwrap();
            let result = outcome.found().unwrap();
            assert_eq!(result.nonce, 1610);
            assert_eq!(result.hashes_tried, 1611);
        }
    }

    #[test]
    fn test_exhausts_small_domain() {
        // No nonce below 256 gives more than 8 leading zero bits for this payload
        let options = SearchOptions::default().with_domain(256).with_batch_size(100);
        let outcome =
            search_with(&request("Esse é fácil", 9), &options, &SystemClock::new()).unwrap();

        match outcome {
            SearchOutcome::Exhausted { hashes_tried, .. } => assert_eq!(hashes_tried, 256),
            other => panic!("expected exhaustion, got {:?}", other),
        }
    }

    #[test]
    fn test_timeout_with_manual_clock() {
        // Each clock reading advances one second; five readings pass the deadline
        let clock = ManualClock::with_step(Duration::from_secs(1));
        let options = SearchOptions::default()
            .with_deadline(Duration::from_secs(5))
            .with_batch_size(1024);

        let outcome = search_with(&request("Esse é fácil", 31), &options, &clock).unwrap();
        match outcome {
            SearchOutcome::Timeout {
                hashes_tried,
                elapsed,
            } => {
                assert_eq!(hashes_tried, 4 * 1024);
                assert!(elapsed >= Duration::from_secs(5));
            }
            other => panic!("expected timeout, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_deadline_times_out_before_hashing() {
        let options = SearchOptions::default().with_deadline(Duration::ZERO);
        let outcome =
            search_with(&request("Esse é fácil", 31), &options, &SystemClock::new()).unwrap();

        assert_eq!(outcome.name(), "timeout");
        assert_eq!(outcome.hashes_tried(), 0);
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = SearchOptions::default().with_batch_size(0);
        assert!(matches!(
            search_with(&request("x", 1), &options, &SystemClock::new()),
            Err(SearchError::InvalidOptions(_))
        ));
    }
}
