use std::path::PathBuf;

use clap::{Parser, Subcommand};

use nonce_core::request::DEFAULT_BATCH_SIZE;

#[derive(Parser, Debug)]
#[command(name = "nonce-miner", about, version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find the smallest nonce for a single payload.
    Search(SearchArgs),
    /// Run a list of cases and print the results table.
    Bench(BenchArgs),
}

#[derive(clap::Args, Debug)]
pub struct SearchArgs {
    #[arg(long, help = "Text to hash, encoded as UTF-8")]
    pub payload: String,

    #[arg(
        long,
        value_name = "BITS",
        allow_negative_numbers = true,
        help = "Number of leading zero bits required in the digest (0-256)"
    )]
    pub difficulty: i64,

    #[arg(
        long,
        default_value_t = 1,
        help = "Worker threads. 1 runs the sequential search, 0 uses every available core"
    )]
    pub workers: usize,

    #[arg(
        long,
        value_name = "HASHES",
        default_value_t = DEFAULT_BATCH_SIZE,
        help = "Digest evaluations between cancellation and deadline checks"
    )]
    pub batch_size: u32,

    #[arg(long, value_name = "MS", help = "Give up after this many milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(long, help = "Print the result as JSON")]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct BenchArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "JSON file with cases, e.g. [{\"text\": \"abc\", \"difficulty_bits\": 8}]. Defaults to the built-in table"
    )]
    pub cases: Option<PathBuf>,

    #[arg(long, value_name = "MS", help = "Per-case time limit in milliseconds")]
    pub timeout_ms: Option<u64>,

    #[arg(long, help = "Print the results as JSON")]
    pub json: bool,
}
