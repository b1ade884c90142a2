//! The per-thread generate-and-match loop

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, trace};

use mnemovanity_pattern::PatternMatcher;
use mnemovanity_wallet::CandidateSource;

use crate::config::SearchConfig;
use crate::result::{MatchResult, ThroughputTick};

/// Why a worker loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// The shared cancellation flag was set
    Cancelled,
    /// The consumer side of a channel is gone
    Disconnected,
}

/// One worker: owns its candidate source, shares everything else read-only.
pub struct Worker {
    id: usize,
    source: Box<dyn CandidateSource>,
    config: Arc<SearchConfig>,
    matcher: Arc<PatternMatcher>,
    cancel: Arc<AtomicBool>,
    results: Sender<MatchResult>,
    counts: Sender<ThroughputTick>,
}

impl Worker {
    pub fn new(
        id: usize,
        source: Box<dyn CandidateSource>,
        config: Arc<SearchConfig>,
        matcher: Arc<PatternMatcher>,
        cancel: Arc<AtomicBool>,
        results: Sender<MatchResult>,
        counts: Sender<ThroughputTick>,
    ) -> Self {
        Self {
            id,
            source,
            config,
            matcher,
            cancel,
            results,
            counts,
        }
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Run batches until cancelled.
    ///
    /// The flag is checked before every batch, before every candidate and
    /// before publishing a match, so nothing from in-flight work is emitted
    /// after cancellation. A batch cut short emits no tick.
    pub fn run(mut self) -> WorkerExit {
        let network = self.config.network;
        let batch_size = self.config.batch_size;
        let mut skipped = 0u64;

        loop {
            if self.cancelled() {
                return WorkerExit::Cancelled;
            }

            let mut checked: ThroughputTick = 0;
            for _ in 0..batch_size {
                if self.cancelled() {
                    debug!(worker = self.id, skipped, "Worker cancelled mid-batch");
                    return WorkerExit::Cancelled;
                }

                let candidate = match self.source.next_candidate() {
                    Ok(candidate) => candidate,
                    Err(e) => {
                        skipped += 1;
                        trace!(worker = self.id, error = %e, "Skipping candidate");
                        continue;
                    }
                };

                for derived in &candidate.addresses {
                    checked += 1;

                    let Some(hit) = self.matcher.matches(&derived.address) else {
                        continue;
                    };
                    if self.cancelled() {
                        return WorkerExit::Cancelled;
                    }

                    let result = MatchResult::new(network, &candidate.mnemonic, derived, &hit);
                    debug!(worker = self.id, address = %result.address, label = %result.label, "Match found");
                    match self.results.try_send(result) {
                        Ok(()) => {}
                        Err(TrySendError::Full(dropped)) => {
                            debug!(worker = self.id, address = %dropped.address, "Results channel full, dropping match");
                        }
                        Err(TrySendError::Disconnected(_)) => return WorkerExit::Disconnected,
                    }
                }
            }

            match self.counts.try_send(checked) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => return WorkerExit::Disconnected,
            }
        }
    }
}

/// Tracks a live worker thread; signals the manager when dropped, including
/// when the worker unwinds from a panic.
pub(crate) struct ExitGuard {
    id: usize,
    live: Arc<AtomicUsize>,
    exits: Sender<usize>,
}

impl ExitGuard {
    pub(crate) fn enter(id: usize, live: Arc<AtomicUsize>, exits: Sender<usize>) -> Self {
        live.fetch_add(1, Ordering::AcqRel);
        Self { id, live, exits }
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
        let _ = self.exits.send(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::{bounded, Receiver};
    use mnemovanity_pattern::Criteria;
    use mnemovanity_wallet::{Candidate, DeriveError, DerivedAddress, Network};

    fn candidate(addresses: &[&str]) -> Candidate {
        Candidate {
            mnemonic: "test phrase".into(),
            addresses: addresses
                .iter()
                .enumerate()
                .map(|(i, a)| DerivedAddress { index: i as u32, address: a.to_string() })
                .collect(),
        }
    }

    /// Build a worker whose source can see the cancellation flag
    fn worker<F>(
        config: SearchConfig,
        capacity: usize,
        make_source: F,
    ) -> (Worker, Receiver<MatchResult>, Receiver<ThroughputTick>)
    where
        F: FnOnce(Arc<AtomicBool>) -> Box<dyn CandidateSource>,
    {
        let (results_tx, results) = bounded(capacity);
        let (counts_tx, counts) = bounded(capacity);
        let cancel = Arc::new(AtomicBool::new(false));
        let matcher = Arc::new(PatternMatcher::new(&config.criteria));
        let source = make_source(cancel.clone());
        let worker = Worker::new(0, source, Arc::new(config), matcher, cancel, results_tx, counts_tx);
        (worker, results, counts)
    }

    /// Same candidate every call; raises the flag while producing call `stop_at`
    fn repeating_source(
        addresses: &'static [&'static str],
        stop_at: usize,
    ) -> impl FnOnce(Arc<AtomicBool>) -> Box<dyn CandidateSource> {
        move |cancel| {
            let mut calls = 0;
            Box::new(move || {
                calls += 1;
                if calls == stop_at {
                    cancel.store(true, Ordering::Release);
                }
                Ok::<_, DeriveError>(candidate(addresses))
            }) as Box<dyn CandidateSource>
        }
    }

    #[test]
    fn test_tick_counts_address_checks() {
        let config = SearchConfig::new(Network::Eth, Criteria::new().contains(["ffff"])).batch_size(4);
        let (worker, results, counts) =
            worker(config, 16, repeating_source(&["0x01", "0x02", "0x03"], 9));

        assert_eq!(worker.run(), WorkerExit::Cancelled);
        // two complete batches of 4 candidates x 3 addresses; the third is cut short
        assert_eq!(counts.try_iter().collect::<Vec<_>>(), vec![12, 12]);
        assert!(results.try_recv().is_err());
    }

    #[test]
    fn test_derivation_errors_are_skipped() {
        let config = SearchConfig::new(Network::Eth, Criteria::new().starts_with(["0xdead"])).batch_size(4);
        let (worker, results, counts) = worker(config, 16, |cancel| {
            let mut calls = 0;
            Box::new(move || {
                calls += 1;
                match calls {
                    1 | 3 => Err(DeriveError::KeyDerivation("bad seed".into())),
                    7 => {
                        cancel.store(true, Ordering::Release);
                        Ok(candidate(&["0x00"]))
                    }
                    _ => Ok(candidate(&["0xdead00"])),
                }
            }) as Box<dyn CandidateSource>
        });

        assert_eq!(worker.run(), WorkerExit::Cancelled);
        // first batch: calls 1..=4 with two failures
        assert_eq!(counts.try_iter().collect::<Vec<_>>(), vec![2]);
        // calls 2, 4, 5 and 6
        assert_eq!(results.try_iter().count(), 4);
    }

    #[test]
    fn test_full_results_channel_drops_instead_of_blocking() {
        let config = SearchConfig::new(Network::Eth, Criteria::new().starts_with(["0x"])).batch_size(10);
        let (worker, results, _counts) = worker(config, 1, repeating_source(&["0xaa", "0xbb"], 20));

        assert_eq!(worker.run(), WorkerExit::Cancelled);
        let kept: Vec<_> = results.try_iter().collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].label, "Starts with '0x'");
        assert_eq!(kept[0].score, 10);
    }

    #[test]
    fn test_no_match_published_after_cancel() {
        let config = SearchConfig::new(Network::Eth, Criteria::new().contains(["dead"]));
        let (worker, results, counts) = worker(config, 16, repeating_source(&["0xdead"], 1));

        assert_eq!(worker.run(), WorkerExit::Cancelled);
        assert!(results.try_recv().is_err());
        assert!(counts.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_consumer_ends_worker() {
        let config = SearchConfig::new(Network::Eth, Criteria::new().contains(["zz"]));
        let (worker, _results, counts) = worker(config, 4, repeating_source(&["0x01"], usize::MAX));
        drop(counts);

        assert_eq!(worker.run(), WorkerExit::Disconnected);
    }

    #[test]
    fn test_exit_guard_tracks_live_workers() {
        let live = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = bounded(4);
        let guard = ExitGuard::enter(3, live.clone(), tx);
        assert_eq!(live.load(Ordering::Acquire), 1);
        drop(guard);
        assert_eq!(live.load(Ordering::Acquire), 0);
        assert_eq!(rx.try_recv(), Ok(3));
    }
}
