//! Benchmark harness: run an ordered list of cases through the sequential
//! engine and collect one row per case.

use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::engine::search_with;
use crate::error::SearchError;
use crate::request::{SearchOptions, SearchOutcome, SearchRequest};

/// One benchmark input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchCase {
    /// Human-readable payload descriptor.
    pub label: String,
    pub payload: Vec<u8>,
    /// Requested difficulty; validated when the case runs.
    pub difficulty_bits: i64,
}

impl BenchCase {
    pub fn new(
        label: impl Into<String>,
        payload: impl Into<Vec<u8>>,
        difficulty_bits: i64,
    ) -> Self {
        BenchCase {
            label: label.into(),
            payload: payload.into(),
            difficulty_bits,
        }
    }

    /// A case whose payload is the UTF-8 encoding of `text`.
    pub fn from_text(text: &str, difficulty_bits: i64) -> Self {
        Self::new(text, text.as_bytes(), difficulty_bits)
    }
}

/// The classic nine-row table: three texts at increasing difficulties.
pub fn default_cases() -> Vec<BenchCase> {
    [
        ("Esse é fácil", 8),
        ("Esse é fácil", 10),
        ("Esse é fácil", 15),
        ("Texto maior muda o tempo?", 8),
        ("Texto maior muda o tempo?", 10),
        ("Texto maior muda o tempo?", 15),
        ("É possível calcular esse?", 18),
        ("É possível calcular esse?", 19),
        ("É possível calcular esse?", 20),
    ]
    .into_iter()
    .map(|(text, bits)| BenchCase::from_text(text, bits))
    .collect()
}

/// A case and what happened when it ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchRow {
    pub case: BenchCase,
    pub outcome: Result<SearchOutcome, SearchError>,
}

/// Runs cases one after another so timings stay comparable.
#[derive(Debug, Clone, Default)]
pub struct BenchmarkHarness<C = SystemClock> {
    options: SearchOptions,
    clock: C,
}

impl BenchmarkHarness<SystemClock> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> BenchmarkHarness<C> {
    /// Options applied to every case, e.g. a per-case deadline.
    pub fn options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn clock<D: Clock>(self, clock: D) -> BenchmarkHarness<D> {
        BenchmarkHarness {
            options: self.options,
            clock,
        }
    }

    /// Run every case once, in order. A failing case does not stop the run;
    /// its error is kept in its row.
    pub fn run(&self, cases: &[BenchCase]) -> Vec<BenchRow> {
        cases
            .iter()
            .map(|case| {
                let outcome = SearchRequest::new(case.payload.clone(), case.difficulty_bits)
                    .and_then(|request| search_with(&request, &self.options, &self.clock));

                match &outcome {
                    Ok(outcome) => info!(
                        "case {:?} @ {} bits: {} ({} hashes)",
                        case.label,
                        case.difficulty_bits,
                        outcome.name(),
                        outcome.hashes_tried()
                    ),
                    Err(err) => warn!("case {:?} failed: {}", case.label, err),
                }

                BenchRow {
                    case: case.clone(),
                    outcome,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;

    #[test]
    fn test_default_cases() {
        let cases = default_cases();
        assert_eq!(cases.len(), 9);
        assert_eq!(cases[0], BenchCase::from_text("Esse é fácil", 8));
        assert_eq!(cases[8].label, "É possível calcular esse?");
        assert_eq!(cases[8].difficulty_bits, 20);
        assert_eq!(cases[3].payload, "Texto maior muda o tempo?".as_bytes());
    }

    #[test]
    fn test_run_preserves_order() {
        let cases = vec![
            BenchCase::from_text("Texto maior muda o tempo?", 8),
            BenchCase::from_text("Esse é fácil", 8),
            BenchCase::from_text("Esse é fácil", 0),
        ];

        let rows = BenchmarkHarness::new().run(&cases);
        assert_eq!(rows.len(), 3);

        let nonces: Vec<u32> = rows
            .iter()
            .map(|row| row.outcome.as_ref().unwrap().found().unwrap().nonce)
            .collect();
        assert_eq!(nonces, vec![35, 33, 0]);

        for (row, case) in rows.iter().zip(&cases) {
            assert_eq!(&row.case, case);
        }
    }

    #[test]
    fn test_invalid_case_does_not_stop_run() {
        let cases = vec![
            BenchCase::from_text("Esse é fácil", 300),
            BenchCase::from_text("Esse é fácil", 8),
        ];

        let rows = BenchmarkHarness::new().run(&cases);
        assert_eq!(
            rows[0].outcome,
            Err(SearchError::InvalidDifficulty { requested: 300 })
        );
        assert_eq!(rows[1].outcome.as_ref().unwrap().found().unwrap().nonce, 33);
    }

    #[test]
    fn test_deadline_applies_per_case() {
        let clock = ManualClock::with_step(Duration::from_secs(1));
        let harness = BenchmarkHarness::new()
            .options(
                SearchOptions::default()
                    .with_deadline(Duration::from_secs(3))
                    .with_batch_size(512),
            )
            .clock(&clock);

        let rows = harness.run(&[
            BenchCase::from_text("Esse é fácil", 31),
            BenchCase::from_text("Esse é fácil", 8),
        ]);

        assert_eq!(rows[0].outcome.as_ref().unwrap().name(), "timeout");
        assert_eq!(rows[1].outcome.as_ref().unwrap().found().unwrap().nonce, 33);
    }
}
