//! Parallel nonce search over disjoint worker ranges.
//!
//! The domain is split into one contiguous range per worker. Workers scan
//! their ranges in increasing order and share three pieces of state:
//!
//! - a result slot holding the lowest nonce claimed so far,
//! - a cancellation flag raised by the first claim, a timeout or a failure,
//! - flags recording why cancellation happened.
//!
//! After cancellation a worker keeps scanning only while its next nonce is
//! below the claimed one. A smaller match can therefore still be found by a
//! worker owning a lower range, and the scheduler returns the minimum of all
//! reported matches. This reproduces the sequential engine's answer.

use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;

use tracing::{debug, info, warn};

use crate::clock::{Clock, Stopwatch, SystemClock};
use crate::digest::DigestEvaluator;
use crate::engine::{nonzero, scan_batch, Hit};
use crate::error::SearchError;
use crate::request::{SearchOptions, SearchOutcome, SearchRequest, SearchResult};

/// Slot value while no worker has found a match.
const UNCLAIMED: u64 = u64::MAX;

/// A contiguous `[start, end)` slice of the nonce domain owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerRange {
    pub start: u64,
    pub end: u64,
}

impl WorkerRange {
    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split `[0, domain)` into `workers` contiguous ranges of near-equal size.
///
/// The last range absorbs the remainder. When there are more workers than
/// nonces the leading ranges are empty.
pub fn partition(domain: u64, workers: usize) -> Vec<WorkerRange> {
    if workers == 0 {
        return Vec::new();
    }

    let count = workers as u64;
    let per_worker = domain / count;

    (0..count)
        .map(|id| {
            let start = per_worker * id;
            let end = if id == count - 1 {
                domain
            } else {
                start + per_worker
            };
            WorkerRange { start, end }
        })
        .collect()
}

/// Number of workers matching the machine's available parallelism.
pub fn default_worker_count() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// State shared by all workers of one search.
#[derive(Debug)]
struct SharedState {
    slot: AtomicU64,
    cancelled: AtomicBool,
    timed_out: AtomicBool,
    aborted: AtomicBool,
}

impl SharedState {
    fn new() -> Self {
        SharedState {
            slot: AtomicU64::new(UNCLAIMED),
            cancelled: AtomicBool::new(false),
            timed_out: AtomicBool::new(false),
            aborted: AtomicBool::new(false),
        }
    }

    /// Record a match. Returns true for the single claim that wins the slot.
    fn claim(&self, nonce: u32) -> bool {
        let nonce = u64::from(nonce);
        match self
            .slot
            .compare_exchange(UNCLAIMED, nonce, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                self.cancelled.store(true, Ordering::Release);
                true
            }
            Err(_) => {
                self.slot.fetch_min(nonce, Ordering::AcqRel);
                false
            }
        }
    }

    /// Lowest nonce claimed so far, or `UNCLAIMED`.
    fn best(&self) -> u64 {
        self.slot.load(Ordering::Acquire)
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn time_out(&self) {
        self.timed_out.store(true, Ordering::Release);
        self.cancelled.store(true, Ordering::Release);
    }

    fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
        self.cancelled.store(true, Ordering::Release);
    }
}

/// Why a worker stopped scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStop {
    /// Found its first match.
    Matched,
    /// Scanned its whole range.
    Exhausted,
    /// Reached a nonce at or above the claimed winner.
    Superseded,
    /// Saw the deadline pass.
    TimedOut,
    /// Another worker failed.
    Aborted,
}

/// What one worker reports back to the scheduler.
#[derive(Debug, Clone)]
pub struct WorkerReport {
    pub worker: usize,
    pub range: WorkerRange,
    pub first_match: Option<Hit>,
    pub hashes_tried: u64,
    pub stop: WorkerStop,
}

/// Everything a worker needs to scan its range.
struct WorkerContext<'a, C: ?Sized> {
    worker: usize,
    range: WorkerRange,
    payload: &'a [u8],
    difficulty_bits: u32,
    options: &'a SearchOptions,
    state: &'a SharedState,
    watch: &'a Stopwatch<'a, C>,
}

/// Cancels the whole search when dropped during a panic.
struct AbortOnPanic<'a>(&'a SharedState);

impl Drop for AbortOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.abort();
        }
    }
}

/// Scan one worker's range until a match, exhaustion or cancellation.
fn scan_range<C: Clock + ?Sized>(ctx: &WorkerContext<'_, C>) -> WorkerReport {
    let WorkerRange { start, end } = ctx.range;
    let batch_size = u64::from(ctx.options.batch_size);
    let state = ctx.state;

    debug!("worker {} scanning {}..{}", ctx.worker, start, end);

    let mut evaluator = DigestEvaluator::new(ctx.payload);
    let mut nonce = start;
    let mut hashes_tried = 0u64;
    let mut first_match = None;

    let stop = loop {
        if nonce >= end {
            break WorkerStop::Exhausted;
        }
        if state.is_cancelled() {
            if state.aborted.load(Ordering::Acquire) {
                break WorkerStop::Aborted;
            }
            if state.timed_out.load(Ordering::Acquire) {
                break WorkerStop::TimedOut;
            }
        }
        // Nothing at or above a claimed nonce can win
        let best = state.best();
        if nonce >= best {
            break WorkerStop::Superseded;
        }
        if ctx.watch.expired(ctx.options.deadline) {
            state.time_out();
            break WorkerStop::TimedOut;
        }

        let batch_end = (nonce + batch_size).min(end).min(best);
        let scan = scan_batch(&mut evaluator, ctx.difficulty_bits, nonce, batch_end);
        hashes_tried += scan.hashes;

        if let Some(hit) = scan.hit {
            if state.claim(hit.nonce) {
                debug!("worker {} claimed nonce {}", ctx.worker, hit.nonce);
            }
            first_match = Some(hit);
            break WorkerStop::Matched;
        }

        nonce = batch_end;
    };

    WorkerReport {
        worker: ctx.worker,
        range: ctx.range,
        first_match,
        hashes_tried,
        stop,
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

/// A fixed-size pool of scoped worker threads.
#[derive(Debug, Clone)]
pub struct WorkerPool<C = SystemClock> {
    workers: usize,
    options: SearchOptions,
    clock: C,
}

impl WorkerPool<SystemClock> {
    /// Create a pool with `workers` threads, default options and the wall clock.
    pub fn new(workers: usize) -> Self {
        WorkerPool {
            workers,
            options: SearchOptions::default(),
            clock: SystemClock::new(),
        }
    }
}

impl<C: Clock> WorkerPool<C> {
    pub fn options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Swap the time source used for elapsed time and the deadline.
    pub fn clock<D: Clock>(self, clock: D) -> WorkerPool<D> {
        WorkerPool {
            workers: self.workers,
            options: self.options,
            clock,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Run a parallel search and return the lowest matching nonce.
    pub fn search(&self, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        self.race(request, scan_range::<C>)
    }

    /// Partition the domain, run `work` once per non-empty range and merge
    /// the reports.
    fn race<F>(&self, request: &SearchRequest, work: F) -> Result<SearchOutcome, SearchError>
    where
        F: Fn(&WorkerContext<'_, C>) -> WorkerReport + Sync,
    {
        self.options.validate()?;
        if self.workers == 0 {
            return Err(SearchError::InvalidOptions(
                "worker count must be at least 1".to_string(),
            ));
        }

        let ranges = partition(self.options.domain, self.workers);
        let state = SharedState::new();
        let watch = Stopwatch::start(&self.clock);

        debug!(
            "parallel search: {} workers over {} nonces, {} bits",
            self.workers,
            self.options.domain,
            request.difficulty_bits()
        );

        let (reports, failure) = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(ranges.len());
            let mut failure = None;

            for (worker, range) in ranges.iter().copied().enumerate() {
                if range.is_empty() {
                    continue;
                }

                let ctx = WorkerContext {
                    worker,
                    range,
                    payload: request.payload(),
                    difficulty_bits: request.difficulty_bits(),
                    options: &self.options,
                    state: &state,
                    watch: &watch,
                };
                let work = &work;
                let spawned = thread::Builder::new()
                    .name(format!("nonce-worker-{}", worker))
                    .spawn_scoped(scope, move || {
                        let _guard = AbortOnPanic(ctx.state);
                        work(&ctx)
                    });

                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(err) => {
                        warn!("failed to spawn worker {}: {}", worker, err);
                        state.abort();
                        failure = Some(SearchError::WorkerFailed {
                            worker,
                            reason: err.to_string(),
                        });
                        break;
                    }
                }
            }

            let mut reports = Vec::with_capacity(handles.len());
            for (worker, handle) in handles {
                match handle.join() {
                    Ok(report) => reports.push(report),
                    Err(payload) => {
                        let reason = panic_reason(payload.as_ref());
                        warn!("worker {} failed: {}", worker, reason);
                        if failure.is_none() {
                            failure = Some(SearchError::WorkerFailed { worker, reason });
                        }
                    }
                }
            }

            (reports, failure)
        });

        if let Some(err) = failure {
            return Err(err);
        }

        let hashes_tried: u64 = reports.iter().map(|r| r.hashes_tried).sum();
        let elapsed = watch.elapsed();

        if state.timed_out.load(Ordering::Acquire) {
            info!(
                "parallel search timed out after {:?} (~{} hashes)",
                elapsed, hashes_tried
            );
            return Ok(SearchOutcome::Timeout {
                hashes_tried,
                elapsed,
            });
        }

        let winner = reports
            .iter()
            .filter_map(|r| r.first_match)
            .min_by_key(|hit| hit.nonce);

        match winner {
            Some(hit) => {
                let result = SearchResult {
                    nonce: hit.nonce,
                    digest: hit.digest,
                    elapsed: nonzero(elapsed),
                    hashes_tried,
                };
                info!(
                    "found nonce {} with {} workers after ~{} hashes in {:.4}s",
                    result.nonce,
                    reports.len(),
                    result.hashes_tried,
                    result.elapsed_seconds()
                );
                Ok(SearchOutcome::Found(result))
            }
            None => {
                info!(
                    "nonce domain exhausted by {} workers after {} hashes",
                    reports.len(),
                    hashes_tried
                );
                Ok(SearchOutcome::Exhausted {
                    hashes_tried,
                    elapsed,
                })
            }
        }
    }
}

/// Search with `worker_count` threads checking shared state every
/// `batch_size` evaluations.
pub fn search_parallel(
    request: &SearchRequest,
    worker_count: usize,
    batch_size: u32,
) -> Result<SearchOutcome, SearchError> {
    WorkerPool::new(worker_count)
        .options(SearchOptions::default().with_batch_size(batch_size))
        .search(request)
}
