//! Generation manager: supervises one fleet of workers at a time

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use mnemovanity_pattern::PatternMatcher;
use mnemovanity_wallet::{Bip39Pipeline, CandidateSource, DeriveError};

use crate::config::{ConfigError, EngineOptions, SearchConfig};
use crate::result::{MatchResult, ThroughputTick};
use crate::worker::{ExitGuard, Worker, WorkerExit};

/// Builds the per-worker candidate source. Called on the worker's own thread.
pub type SourceFactory =
    Arc<dyn Fn(&SearchConfig) -> Result<Box<dyn CandidateSource>, DeriveError> + Send + Sync>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid search configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Failed to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("{0} workers of an earlier search are still running")]
    WorkersStillRunning(usize),
}

/// Real BIP39 pipeline per worker
pub fn bip39_factory() -> SourceFactory {
    Arc::new(|config: &SearchConfig| -> Result<Box<dyn CandidateSource>, DeriveError> {
        let pipeline = Bip39Pipeline::new(config.network, config.word_count, &config.address_indices)?;
        Ok(Box::new(pipeline) as Box<dyn CandidateSource>)
    })
}

/// State of the run in progress
struct ActiveRun {
    id: u64,
    cancel: Arc<AtomicBool>,
    exits: Receiver<usize>,
    workers: usize,
    started: Instant,
    // dropping the pool does not wait for its jobs
    _pool: rayon::ThreadPool,
}

/// Workers that outlived `stop_timeout`, still owed an exit notification
struct DetachedRun {
    id: u64,
    exits: Receiver<usize>,
    remaining: usize,
}

/// Starts and stops searches and exposes their result and throughput streams.
///
/// Each `start` gets a fresh cancellation flag and fresh channels. `stop`
/// waits (bounded) for the workers, then drains and disconnects the channels
/// so nothing from a finished run reaches the caller.
pub struct GenerationManager {
    options: EngineOptions,
    factory: SourceFactory,
    results: Receiver<MatchResult>,
    counts: Receiver<ThroughputTick>,
    /// Worker threads still executing, across all runs
    live: Arc<AtomicUsize>,
    run: Option<ActiveRun>,
    detached: Vec<DetachedRun>,
    next_run_id: u64,
}

impl GenerationManager {
    pub fn new() -> Self {
        Self::with_source(EngineOptions::default(), bip39_factory())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        Self::with_source(options, bip39_factory())
    }

    /// Manager whose workers draw candidates from `factory`
    pub fn with_source(options: EngineOptions, factory: SourceFactory) -> Self {
        let (results, counts) = idle_channels();
        Self {
            options,
            factory,
            results,
            counts,
            live: Arc::new(AtomicUsize::new(0)),
            run: None,
            detached: Vec::new(),
            next_run_id: 1,
        }
    }

    /// Validate `config`, retire any current run, and spawn
    /// `config.worker_count` workers. Returns without waiting for them.
    ///
    /// An invalid configuration is rejected before anything else happens; a
    /// run already in progress keeps going in that case.
    ///
    /// Workers detached by an earlier `stop` get one more `stop_timeout` to
    /// exit. If any are still alive after that, nothing is spawned and
    /// `WorkersStillRunning` is returned, so at most `worker_count` workers are
    /// ever alive. The engine is idle afterwards and `start` may be retried.
    pub fn start(&mut self, config: SearchConfig) -> Result<(), EngineError> {
        config.validate()?;
        self.stop();

        let stragglers = self.reap_detached(Instant::now() + self.options.stop_timeout);
        if stragglers > 0 {
            warn!(stragglers, "Earlier workers have not exited; refusing to start");
            return Err(EngineError::WorkersStillRunning(stragglers));
        }

        let workers = config.worker_count;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("mnemovanity-worker-{}", i))
            .panic_handler(|_| error!("Worker panicked and exited"))
            .build()?;

        let (results_tx, results_rx) = bounded(self.options.result_bound());
        let (counts_tx, counts_rx) = bounded(self.options.count_bound());
        self.results = results_rx;
        self.counts = counts_rx;

        let run_id = self.next_run_id;
        self.next_run_id += 1;

        let cancel = Arc::new(AtomicBool::new(false));
        let (exit_tx, exit_rx) = unbounded();
        let config = Arc::new(config);
        let matcher = Arc::new(PatternMatcher::new(&config.criteria));

        for id in 0..workers {
            let factory = self.factory.clone();
            let config = config.clone();
            let matcher = matcher.clone();
            let cancel = cancel.clone();
            let results = results_tx.clone();
            let counts = counts_tx.clone();
            let live = self.live.clone();
            let exits = exit_tx.clone();

            pool.spawn(move || {
                let _guard = ExitGuard::enter(id, live, exits);
                let source = match factory(&config) {
                    Ok(source) => source,
                    Err(e) => {
                        error!(run = run_id, worker = id, error = %e, "Could not build candidate source");
                        return;
                    }
                };

                let worker = Worker::new(id, source, config, matcher, cancel, results, counts);
                match worker.run() {
                    WorkerExit::Cancelled => debug!(run = run_id, worker = id, "Worker stopped"),
                    WorkerExit::Disconnected => debug!(run = run_id, worker = id, "Worker lost its consumer"),
                }
            });
        }

        info!(
            run = run_id,
            network = %config.network,
            words = config.word_count.words(),
            indices = ?config.address_indices,
            workers,
            "Search started"
        );

        self.run = Some(ActiveRun {
            id: run_id,
            cancel,
            exits: exit_rx,
            workers,
            started: Instant::now(),
            _pool: pool,
        });
        Ok(())
    }

    /// Cancel the current run, wait up to `stop_timeout` for its workers,
    /// then discard anything still buffered. No-op when idle.
    pub fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };

        run.cancel.store(true, Ordering::Release);

        let deadline = Instant::now() + self.options.stop_timeout;
        let remaining = wait_for_exits(&run.exits, run.workers, deadline);

        if remaining > 0 {
            // Their flag stays set and their channels are disconnected below,
            // so they exit at the next candidate without reaching the caller.
            warn!(
                run = run.id,
                remaining,
                timeout_ms = self.options.stop_timeout.as_millis() as u64,
                "Workers did not stop in time; detaching them"
            );
            self.detached.push(DetachedRun {
                id: run.id,
                exits: run.exits,
                remaining,
            });
        }

        let dropped_results = self.results.try_iter().count();
        let dropped_ticks = self.counts.try_iter().count();
        let (results, counts) = idle_channels();
        self.results = results;
        self.counts = counts;

        info!(
            run = run.id,
            elapsed_ms = run.started.elapsed().as_millis() as u64,
            dropped_results,
            dropped_ticks,
            "Search stopped"
        );
    }

    /// Wait until `deadline` for detached workers; returns how many are left
    fn reap_detached(&mut self, deadline: Instant) -> usize {
        for run in &mut self.detached {
            run.remaining = wait_for_exits(&run.exits, run.remaining, deadline);
            if run.remaining == 0 {
                debug!(run = run.id, "Detached workers exited");
            }
        }
        self.detached.retain(|run| run.remaining > 0);
        self.detached.iter().map(|run| run.remaining).sum()
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Worker threads still executing, including any detached by `stop`
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Match results of the current run. Re-fetch after each `start`.
    pub fn results(&self) -> &Receiver<MatchResult> {
        &self.results
    }

    /// Throughput ticks of the current run. Re-fetch after each `start`.
    pub fn counts(&self) -> &Receiver<ThroughputTick> {
        &self.counts
    }

    /// Everything currently buffered on the results channel, without blocking
    pub fn try_results(&self) -> Vec<MatchResult> {
        self.results.try_iter().collect()
    }

    /// Sum of all buffered ticks, without blocking
    pub fn drain_counts(&self) -> u64 {
        self.counts.try_iter().sum()
    }
}

impl Default for GenerationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GenerationManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Count exit notifications until `deadline`; returns the workers not heard from
fn wait_for_exits(exits: &Receiver<usize>, mut remaining: usize, deadline: Instant) -> usize {
    while remaining > 0 {
        let timeout = deadline.saturating_duration_since(Instant::now());
        match exits.recv_timeout(timeout) {
            Ok(_) => remaining -= 1,
            Err(RecvTimeoutError::Timeout) => break,
            // every guard has been dropped
            Err(RecvTimeoutError::Disconnected) => return 0,
        }
    }
    remaining
}

/// Receivers with no live senders: empty until the next `start`
fn idle_channels() -> (Receiver<MatchResult>, Receiver<ThroughputTick>) {
    let (_results_tx, results): (Sender<MatchResult>, _) = bounded(0);
    let (_counts_tx, counts): (Sender<ThroughputTick>, _) = bounded(0);
    (results, counts)
}
