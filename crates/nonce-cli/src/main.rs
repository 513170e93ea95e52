use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::info;

use nonce_core::{
    default_cases, default_worker_count, search_with, BenchmarkHarness, SearchOptions,
    SearchRequest, SystemClock, WorkerPool,
};

use crate::{
    cases::load_cases,
    cli::{Args, BenchArgs, Command, SearchArgs},
    report::{render_json, render_table, ReportRow},
};

mod cases;
mod cli;
mod log;
mod report;

fn main() -> anyhow::Result<()> {
    log::init_log();

    let args = Args::parse();
    match args.command {
        Command::Search(args) => run_search(args),
        Command::Bench(args) => run_bench(args),
    }
}

fn run_search(args: SearchArgs) -> anyhow::Result<()> {
    let request = SearchRequest::new(args.payload.as_bytes(), args.difficulty)
        .context("invalid search request")?;

    let mut options = SearchOptions::default().with_batch_size(args.batch_size);
    if let Some(ms) = args.timeout_ms {
        options = options.with_deadline(Duration::from_millis(ms));
    }

    let workers = match args.workers {
        0 => default_worker_count(),
        n => n,
    };

    info!(
        "searching {:?} for {} leading zero bits with {} worker(s)",
        args.payload, args.difficulty, workers
    );

    let outcome = if workers == 1 {
        search_with(&request, &options, &SystemClock::new())
    } else {
        WorkerPool::new(workers).options(options).search(&request)
    }
    .context("search failed")?;

    let rows = [ReportRow::new(&args.payload, args.difficulty, &outcome)];
    print_rows(&rows, args.json)
}

fn run_bench(args: BenchArgs) -> anyhow::Result<()> {
    let cases = match &args.cases {
        Some(path) => load_cases(path)?,
        None => default_cases(),
    };

    let mut options = SearchOptions::default();
    if let Some(ms) = args.timeout_ms {
        options = options.with_deadline(Duration::from_millis(ms));
    }

    info!("running {} benchmark case(s)", cases.len());
    let rows: Vec<ReportRow> = BenchmarkHarness::new()
        .options(options)
        .run(&cases)
        .iter()
        .map(ReportRow::from_bench_row)
        .collect();

    print_rows(&rows, args.json)?;

    let failed = rows.iter().filter(|row| row.is_error()).count();
    if failed > 0 {
        bail!("{} of {} case(s) failed", failed, rows.len());
    }
    Ok(())
}

fn print_rows(rows: &[ReportRow], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", render_json(rows).context("serialize results")?);
    } else {
        print!("{}", render_table(rows));
    }
    Ok(())
}
