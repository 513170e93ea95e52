//! Result rows and their table/JSON rendering.

use std::fmt::Write as _;

use serde::Serialize;

use nonce_core::{digest::digest_hex, BenchRow, SearchError, SearchOutcome};

/// One rendered line of results.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    /// Payload descriptor.
    pub payload: String,
    /// Requested difficulty.
    pub difficulty_bits: i64,
    /// "found", "exhausted", "timeout" or "error".
    pub outcome: String,
    /// The winning nonce (if found).
    pub nonce: Option<u32>,
    /// Winning digest in hex (if found).
    pub digest: Option<String>,
    pub elapsed_seconds: Option<f64>,
    pub hashes_tried: Option<u64>,
    /// Hashes per second.
    pub hash_rate: Option<f64>,
    pub error: Option<String>,
}

impl ReportRow {
    pub fn new(payload: &str, difficulty_bits: i64, outcome: &SearchOutcome) -> Self {
        let found = outcome.found();
        ReportRow {
            payload: payload.to_string(),
            difficulty_bits,
            outcome: outcome.name().to_string(),
            nonce: found.map(|r| r.nonce),
            digest: found.map(|r| digest_hex(&r.digest)),
            elapsed_seconds: Some(outcome.elapsed().as_secs_f64()),
            hashes_tried: Some(outcome.hashes_tried()),
            hash_rate: Some(outcome.hash_rate()),
            error: None,
        }
    }

    pub fn failed(payload: &str, difficulty_bits: i64, err: &SearchError) -> Self {
        ReportRow {
            payload: payload.to_string(),
            difficulty_bits,
            outcome: "error".to_string(),
            nonce: None,
            digest: None,
            elapsed_seconds: None,
            hashes_tried: None,
            hash_rate: None,
            error: Some(err.to_string()),
        }
    }

    pub fn from_bench_row(row: &BenchRow) -> Self {
        match &row.outcome {
            Ok(outcome) => Self::new(&row.case.label, row.case.difficulty_bits, outcome),
            Err(err) => Self::failed(&row.case.label, row.case.difficulty_bits, err),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Format a hash rate for display.
pub fn format_hash_rate(rate: f64) -> String {
    if rate >= 1_000_000_000.0 {
        format!("{:.2} GH/s", rate / 1_000_000_000.0)
    } else if rate >= 1_000_000.0 {
        format!("{:.2} MH/s", rate / 1_000_000.0)
    } else if rate >= 1_000.0 {
        format!("{:.2} KH/s", rate / 1_000.0)
    } else {
        format!("{:.2} H/s", rate)
    }
}

/// Fixed-width table: payload, bits, nonce, time, hashes, rate.
pub fn render_table(rows: &[ReportRow]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<30} {:>6} {:>12} {:>12} {:>14} {:>14}",
        "Payload", "Bits", "Nonce", "Time (s)", "Hashes", "Rate"
    );

    for row in rows {
        let nonce = match (&row.error, row.nonce) {
            (Some(_), _) => "error".to_string(),
            (None, Some(nonce)) => nonce.to_string(),
            (None, None) => row.outcome.clone(),
        };
        let elapsed = row
            .elapsed_seconds
            .map(|s| format!("{:.4}", s))
            .unwrap_or_else(|| "-".to_string());
        let hashes = row
            .hashes_tried
            .map(|h| h.to_string())
            .unwrap_or_else(|| "-".to_string());
        let rate = row
            .hash_rate
            .map(format_hash_rate)
            .unwrap_or_else(|| "-".to_string());

        let _ = writeln!(
            out,
            "{:<30} {:>6} {:>12} {:>12} {:>14} {:>14}",
            row.payload, row.difficulty_bits, nonce, elapsed, hashes, rate
        );
        if let Some(err) = &row.error {
            let _ = writeln!(out, "    {}", err);
        }
    }

    out
}

pub fn render_json(rows: &[ReportRow]) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nonce_core::{search, BenchCase, SearchRequest};
    use std::time::Duration;

    #[test]
    fn test_format_hash_rate() {
        assert_eq!(format_hash_rate(512.0), "512.00 H/s");
        assert_eq!(format_hash_rate(2_500.0), "2.50 KH/s");
        assert_eq!(format_hash_rate(3_000_000.0), "3.00 MH/s");
        assert_eq!(format_hash_rate(1_200_000_000.0), "1.20 GH/s");
    }

    #[test]
    fn test_found_row() {
        let request = SearchRequest::new("Esse é fácil", 8).unwrap();
        let outcome = search(&request).unwrap();
        let row = ReportRow::new("Esse é fácil", 8, &outcome);

        assert_eq!(row.outcome, "found");
        assert_eq!(row.nonce, Some(33));
        assert_eq!(row.hashes_tried, Some(34));
        assert_eq!(
            row.digest.as_deref(),
            Some("009d483618fff2afad51c1e91a8d0c4ff915a8d206544e59f0f52802f0b74fbd")
        );
        assert!(!row.is_error());

        let table = render_table(&[row]);
        let mut lines = table.lines();
        let header = lines.next().unwrap();
        assert!(header.starts_with("Payload"));
        assert!(header.contains("Nonce"));
        let line = lines.next().unwrap();
        assert!(line.starts_with("Esse é fácil"));
        assert!(line.contains(" 33 "));
        assert!(line.contains(" 34 "));
    }

    #[test]
    fn test_timeout_and_error_rows() {
        let timeout = SearchOutcome::Timeout {
            hashes_tried: 1_000,
            elapsed: Duration::from_millis(500),
        };
        let rows = vec![
            ReportRow::new("slow", 31, &timeout),
            ReportRow::failed("bad", 300, &SearchError::InvalidDifficulty { requested: 300 }),
        ];

        assert_eq!(rows[0].nonce, None);
        assert_eq!(rows[0].hash_rate, Some(2_000.0));
        assert!(rows[1].is_error());

        let table = render_table(&rows);
        assert!(table.contains("timeout"));
        assert!(table.contains("2.00 KH/s"));
        assert!(table.contains("difficulty must be within 0..=256 bits, got 300"));
    }

    #[test]
    fn test_from_bench_row_and_json() {
        let row = BenchRow {
            case: BenchCase::from_text("x", -1),
            outcome: Err(SearchError::InvalidDifficulty { requested: -1 }),
        };
        let report = ReportRow::from_bench_row(&row);
        assert_eq!(report.outcome, "error");

        let json = render_json(&[report]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["payload"], "x");
        assert_eq!(value[0]["difficulty_bits"], -1);
        assert_eq!(value[0]["outcome"], "error");
        assert!(value[0]["nonce"].is_null());
    }
}
