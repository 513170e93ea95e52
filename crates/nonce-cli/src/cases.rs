//! Benchmark case files.
//!
//! A case file is a JSON array. Each entry carries either a UTF-8 `text`
//! payload or a `hex` payload, the difficulty, and an optional label:
//!
//! ```json
//! [
//!   { "text": "Esse é fácil", "difficulty_bits": 8 },
//!   { "hex": "deadbeef", "difficulty_bits": 12, "label": "raw bytes" }
//! ]
//! ```

use std::{fs, path::Path};

use anyhow::{bail, Context};
use serde::Deserialize;

use nonce_core::BenchCase;

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct CaseEntry {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub hex: Option<String>,
    pub difficulty_bits: i64,
    #[serde(default)]
    pub label: Option<String>,
}

impl CaseEntry {
    pub fn into_case(self) -> anyhow::Result<BenchCase> {
        match (self.text, self.hex) {
            (Some(text), None) => {
                let label = self.label.unwrap_or_else(|| text.clone());
                Ok(BenchCase::new(label, text.into_bytes(), self.difficulty_bits))
            }
            (None, Some(hex)) => {
                let payload =
                    hex::decode(&hex).with_context(|| format!("invalid hex payload {hex:?}"))?;
                let label = self.label.unwrap_or_else(|| format!("0x{hex}"));
                Ok(BenchCase::new(label, payload, self.difficulty_bits))
            }
            (Some(_), Some(_)) => bail!("case has both `text` and `hex` payloads"),
            (None, None) => bail!("case needs a `text` or `hex` payload"),
        }
    }
}

pub fn parse_cases(json: &str) -> anyhow::Result<Vec<BenchCase>> {
    let entries: Vec<CaseEntry> = serde_json::from_str(json).context("parse case list")?;
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| entry.into_case().with_context(|| format!("case #{}", i + 1)))
        .collect()
}

pub fn load_cases<P>(path: P) -> anyhow::Result<Vec<BenchCase>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let json = fs::read_to_string(path)
        .with_context(|| format!("read case file {}", path.display()))?;
    parse_cases(&json).with_context(|| format!("load case file {}", path.display()))
}
