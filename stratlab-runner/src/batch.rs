//! Batch coordinator — one simulator run per symbol, sequential or pooled.
//!
//! Price series are placed once into a shared read-only store and fetched
//! by reference from every task, so workers never re-receive the data. The
//! pooled executor drains finished tasks in bounded batches with a poll
//! timeout: partial progress and partial failure are observable before the
//! whole batch completes. There is no cancellation — a submitted task runs
//! to completion — and a single symbol's failure lands in that symbol's
//! result slot without aborting siblings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::config::BacktestConfig;
use stratlab_core::domain::{bar::is_ascending, Bar};

use crate::runner::{run_strategy, BacktestResult};

// ─── Shared price store ──────────────────────────────────────────────

/// Read-only store of per-symbol bar series, shared by reference.
#[derive(Debug, Clone, Default)]
pub struct PriceStore {
    series: HashMap<String, Arc<Vec<Bar>>>,
}

impl PriceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place one symbol's bars into the store (broadcast once).
    pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<Bar>) {
        self.series.insert(symbol.into(), Arc::new(bars));
    }

    /// Fetch a series by handle — a cheap Arc clone, never a data copy.
    pub fn get(&self, symbol: &str) -> Option<Arc<Vec<Bar>>> {
        self.series.get(symbol).cloned()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

// ─── Configuration ───────────────────────────────────────────────────

/// How the batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Sequential,
    Distributed,
}

/// Batch coordinator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub mode: ExecutionMode,
    /// Worker threads in distributed mode; 0 = one per CPU.
    pub workers: usize,
    /// Maximum results drained per poll round.
    pub batch_size: usize,
    /// Poll timeout per drain round, in milliseconds.
    pub poll_timeout_ms: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Distributed,
            workers: 0,
            batch_size: 8,
            poll_timeout_ms: 200,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Per-symbol result slot: either a completed backtest or an isolated
/// failure. Failures never abort the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolOutcome {
    pub symbol: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<BacktestResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SymbolOutcome {
    fn ok(symbol: String, result: BacktestResult) -> Self {
        Self {
            symbol,
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn failed(symbol: String, error: String) -> Self {
        Self {
            symbol,
            success: false,
            result: None,
            error: Some(error),
        }
    }
}

/// Progress snapshot passed to the callback after each drained batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Errors from batch submission (per-symbol failures are data, not errors).
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("no symbols provided")]
    NoSymbols,
}

/// Progress callback type.
pub type ProgressFn<'a> = &'a (dyn Fn(&BatchProgress) + Sync);

// ─── Executor abstraction ────────────────────────────────────────────

/// Executes a set of per-symbol tasks. Implementations differ only in
/// scheduling; task semantics are identical, so callers never need to know
/// which one the probe picked.
pub trait Executor: Send + Sync {
    fn name(&self) -> &'static str;

    fn run_batch(
        &self,
        store: &PriceStore,
        symbols: &[String],
        config: &BacktestConfig,
        progress: Option<ProgressFn<'_>>,
    ) -> Vec<SymbolOutcome>;
}

/// Run one symbol's task against the shared store.
fn run_symbol(store: &PriceStore, symbol: &str, config: &BacktestConfig) -> SymbolOutcome {
    let Some(bars) = store.get(symbol) else {
        return SymbolOutcome::failed(symbol.to_string(), "symbol not found in price store".into());
    };
    if !is_ascending(&bars) {
        return SymbolOutcome::failed(
            symbol.to_string(),
            "bars are not ordered ascending by date".into(),
        );
    }
    match run_strategy(&bars, config) {
        Ok(result) => SymbolOutcome::ok(symbol.to_string(), result),
        Err(error) => SymbolOutcome::failed(symbol.to_string(), error.to_string()),
    }
}

// ─── Sequential executor ─────────────────────────────────────────────

/// Plain loop over symbols in the calling thread.
pub struct InProcessExecutor;

impl Executor for InProcessExecutor {
    fn name(&self) -> &'static str {
        "in_process"
    }

    fn run_batch(
        &self,
        store: &PriceStore,
        symbols: &[String],
        config: &BacktestConfig,
        progress: Option<ProgressFn<'_>>,
    ) -> Vec<SymbolOutcome> {
        let total = symbols.len();
        let mut outcomes = Vec::with_capacity(total);
        let mut failed = 0;

        for symbol in symbols {
            let outcome = run_symbol(store, symbol, config);
            if !outcome.success {
                failed += 1;
            }
            outcomes.push(outcome);
            if let Some(cb) = progress {
                cb(&BatchProgress {
                    total,
                    completed: outcomes.len(),
                    failed,
                });
            }
        }
        outcomes
    }
}

// ─── Worker-pool executor ────────────────────────────────────────────

/// Worker-pool executor: tasks are stateless given (symbol, shared bars,
/// config), so they may run on any worker with no synchronization between
/// tasks.
pub struct ThreadPoolExecutor {
    workers: usize,
    batch_size: usize,
    poll_timeout: Duration,
}

impl ThreadPoolExecutor {
    /// Build a pool with the requested worker count (0 = one per CPU).
    /// Returns None when fewer than two workers are available — the probe
    /// then degrades to sequential execution.
    pub fn new(workers: usize, batch_size: usize, poll_timeout: Duration) -> Option<Self> {
        let resolved = if workers == 0 {
            num_cpus::get()
        } else {
            workers
        };
        if resolved < 2 {
            return None;
        }
        Some(Self {
            workers: resolved,
            batch_size: batch_size.max(1),
            poll_timeout,
        })
    }

    fn from_config(config: &BatchConfig) -> Option<Self> {
        Self::new(
            config.workers,
            config.batch_size,
            Duration::from_millis(config.poll_timeout_ms),
        )
    }
}

struct SymbolTask {
    index: usize,
    symbol: String,
}

impl Executor for ThreadPoolExecutor {
    fn name(&self) -> &'static str {
        "thread_pool"
    }

    fn run_batch(
        &self,
        store: &PriceStore,
        symbols: &[String],
        config: &BacktestConfig,
        progress: Option<ProgressFn<'_>>,
    ) -> Vec<SymbolOutcome> {
        let total = symbols.len();
        let workers = self.workers.min(total.max(1));

        let (task_tx, task_rx) = bounded::<SymbolTask>(total);
        let (result_tx, result_rx) = bounded::<(usize, SymbolOutcome)>(total);

        let mut slots: Vec<Option<SymbolOutcome>> = (0..total).map(|_| None).collect();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    while let Ok(task) = task_rx.recv() {
                        let outcome = run_symbol(store, &task.symbol, config);
                        if result_tx.send((task.index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(task_rx);
            drop(result_tx);

            for (index, symbol) in symbols.iter().enumerate() {
                task_tx
                    .send(SymbolTask {
                        index,
                        symbol: symbol.clone(),
                    })
                    .expect("task channel has batch capacity");
            }
            drop(task_tx);

            // Drain completions in bounded batches: wait for up to
            // `batch_size` results (or the poll timeout), report progress,
            // repeat. This bounds peak latency between progress updates and
            // makes partial failure observable early.
            let mut completed = 0;
            let mut failed = 0;
            let mut disconnected = false;

            while completed < total && !disconnected {
                let mut drained = 0;
                while drained < self.batch_size {
                    match result_rx.recv_timeout(self.poll_timeout) {
                        Ok((index, outcome)) => {
                            if !outcome.success {
                                failed += 1;
                            }
                            slots[index] = Some(outcome);
                            completed += 1;
                            drained += 1;
                            if completed == total {
                                break;
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => break,
                        Err(RecvTimeoutError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }
                if drained > 0 {
                    if let Some(cb) = progress {
                        cb(&BatchProgress {
                            total,
                            completed,
                            failed,
                        });
                    }
                }
            }
        });

        slots
            .into_iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.unwrap_or_else(|| {
                    SymbolOutcome::failed(symbols[i].clone(), "worker terminated early".into())
                })
            })
            .collect()
    }
}

// ─── Capability probe & coordinator entry point ──────────────────────

/// Pick an executor for the given configuration.
///
/// Distributed mode degrades to sequential automatically when a pool
/// cannot be built; the rest of the system never learns which was chosen.
pub fn probe_executor(config: &BatchConfig) -> Box<dyn Executor> {
    match config.mode {
        ExecutionMode::Sequential => Box::new(InProcessExecutor),
        ExecutionMode::Distributed => match ThreadPoolExecutor::from_config(config) {
            Some(pool) => Box::new(pool),
            None => {
                log::info!("worker pool unavailable, falling back to sequential execution");
                Box::new(InProcessExecutor)
            }
        },
    }
}

/// Fan one strategy configuration out across many symbols.
pub fn run_batch_backtests(
    store: &PriceStore,
    symbols: &[String],
    config: &BacktestConfig,
    batch: &BatchConfig,
    progress: Option<ProgressFn<'_>>,
) -> Result<Vec<SymbolOutcome>, BatchError> {
    if symbols.is_empty() {
        return Err(BatchError::NoSymbols);
    }
    let executor = probe_executor(batch);
    log::info!(
        "batch of {} symbols on {} executor",
        symbols.len(),
        executor.name()
    );
    Ok(executor.run_batch(store, symbols, config, progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{make_bars, trending_closes};
    use stratlab_core::config::StrategyParams;

    fn store_with(symbols: &[(&str, Vec<f64>)]) -> PriceStore {
        let mut store = PriceStore::new();
        for (symbol, closes) in symbols {
            store.insert(*symbol, make_bars(closes));
        }
        store
    }

    fn config() -> BacktestConfig {
        let mut config = BacktestConfig::new(StrategyParams::BuyAndHold);
        config.commission_rate = 0.0;
        config.slippage_rate = 0.0;
        config
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sequential_all_succeed() {
        let store = store_with(&[
            ("AAA", trending_closes(60)),
            ("BBB", trending_closes(60)),
        ]);
        let outcomes = InProcessExecutor.run_batch(&store, &symbols(&["AAA", "BBB"]), &config(), None);
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.success));
    }

    #[test]
    fn one_bad_symbol_of_three_isolated() {
        let store = store_with(&[
            ("AAA", trending_closes(60)),
            ("BAD", vec![100.0]), // one bar: fails any MA warm-up
            ("CCC", trending_closes(60)),
        ]);
        let mut config = config();
        config.params = StrategyParams::MaCross {
            short_period: 3,
            long_period: 10,
        };

        let outcomes =
            run_batch_backtests(&store, &symbols(&["AAA", "BAD", "CCC"]), &config, &BatchConfig::default(), None)
                .unwrap();

        let successes = outcomes.iter().filter(|o| o.success).count();
        let failures: Vec<_> = outcomes.iter().filter(|o| !o.success).collect();
        assert_eq!(successes, 2);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].symbol, "BAD");
        assert!(failures[0].error.as_deref().unwrap().contains("insufficient data"));
    }

    #[test]
    fn missing_symbol_is_a_failure_slot() {
        let store = store_with(&[("AAA", trending_closes(60))]);
        let outcomes = InProcessExecutor.run_batch(
            &store,
            &symbols(&["AAA", "GHOST"]),
            &config(),
            None,
        );
        assert!(outcomes[0].success);
        assert!(!outcomes[1].success);
        assert!(outcomes[1].error.as_deref().unwrap().contains("not found"));
    }

    #[test]
    fn unordered_bars_are_a_failure_slot() {
        let mut bars = make_bars(&trending_closes(30));
        bars.swap(3, 4); // break the date ordering
        let mut store = PriceStore::new();
        store.insert("JUMBLED", bars);

        let outcomes = InProcessExecutor.run_batch(&store, &symbols(&["JUMBLED"]), &config(), None);
        assert!(!outcomes[0].success);
        assert!(outcomes[0].error.as_deref().unwrap().contains("ascending"));
    }

    #[test]
    fn pool_matches_sequential() {
        let store = store_with(&[
            ("AAA", trending_closes(80)),
            ("BBB", trending_closes(90)),
            ("CCC", trending_closes(100)),
            ("DDD", trending_closes(110)),
        ]);
        let names = symbols(&["AAA", "BBB", "CCC", "DDD"]);

        let seq = InProcessExecutor.run_batch(&store, &names, &config(), None);
        let pool = ThreadPoolExecutor::new(4, 2, Duration::from_millis(100))
            .unwrap()
            .run_batch(&store, &names, &config(), None);

        assert_eq!(seq.len(), pool.len());
        for (a, b) in seq.iter().zip(&pool) {
            assert_eq!(a.symbol, b.symbol); // input order preserved
            assert_eq!(a.success, b.success);
            let (ra, rb) = (a.result.as_ref().unwrap(), b.result.as_ref().unwrap());
            assert_eq!(ra.final_capital.to_bits(), rb.final_capital.to_bits());
        }
    }

    #[test]
    fn progress_reaches_total() {
        use std::sync::Mutex;
        let store = store_with(&[
            ("AAA", trending_closes(60)),
            ("BBB", trending_closes(60)),
            ("CCC", trending_closes(60)),
        ]);
        let names = symbols(&["AAA", "BBB", "CCC"]);
        let seen = Mutex::new(Vec::new());

        let cb = |p: &BatchProgress| {
            seen.lock().unwrap().push((p.completed, p.failed));
        };
        let outcomes = ThreadPoolExecutor::new(2, 2, Duration::from_millis(100))
            .unwrap()
            .run_batch(&store, &names, &config(), Some(&cb));

        assert_eq!(outcomes.len(), 3);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().unwrap().0, 3);
        // Completions are monotonically non-decreasing.
        assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn empty_symbol_set_is_an_error() {
        let store = PriceStore::new();
        assert!(matches!(
            run_batch_backtests(&store, &[], &config(), &BatchConfig::default(), None),
            Err(BatchError::NoSymbols)
        ));
    }

    #[test]
    fn probe_respects_sequential_mode() {
        let batch = BatchConfig {
            mode: ExecutionMode::Sequential,
            ..Default::default()
        };
        assert_eq!(probe_executor(&batch).name(), "in_process");
    }

    #[test]
    fn probe_degrades_single_worker_pool() {
        let batch = BatchConfig {
            mode: ExecutionMode::Distributed,
            workers: 1,
            ..Default::default()
        };
        assert_eq!(probe_executor(&batch).name(), "in_process");
    }
}
