//! StratLab Runner — backtest orchestration and validation.
//!
//! This crate builds on `stratlab-core` to provide:
//! - Single-backtest runner with derived metrics
//! - Exhaustive grid-search optimizer
//! - Monte Carlo validator over synthetic price paths
//! - Walk-forward validator with rolling re-optimization
//! - Batch coordinator with pluggable executors (sequential / worker pool)
//! - Display-ready report records with percentage mirrors
//! - TOML run specification for the CLI

pub mod batch;
pub mod config;
pub mod metrics;
pub mod monte_carlo;
pub mod optimizer;
pub mod report;
pub mod runner;
pub mod walk_forward;

pub use batch::{
    probe_executor, run_batch_backtests, BatchConfig, BatchError, BatchProgress, ExecutionMode,
    Executor, InProcessExecutor, PriceStore, SymbolOutcome, ThreadPoolExecutor,
};
pub use config::{RunSpec, SpecError};
pub use metrics::BacktestMetrics;
pub use monte_carlo::{run_monte_carlo, MonteCarloConfig, MonteCarloError, MonteCarloSummary};
pub use optimizer::{optimize, Evaluation, OptimizationResult, OptimizeError, ParamGrid};
pub use report::{
    format_pct, BacktestReport, BatchReport, MetricsSummary, MonteCarloReport, OptimizationReport,
    WalkForwardReport,
};
pub use runner::{run_strategy, BacktestResult, RunError};
pub use walk_forward::{
    run_walk_forward, WalkForwardConfig, WalkForwardError, WalkForwardResult, WalkForwardSegment,
};


#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn result_types_are_send_sync() {
        assert_send::<BacktestResult>();
        assert_sync::<BacktestResult>();
        assert_send::<BacktestMetrics>();
        assert_sync::<BacktestMetrics>();
        assert_send::<OptimizationResult>();
        assert_sync::<OptimizationResult>();
        assert_send::<WalkForwardResult>();
        assert_sync::<WalkForwardResult>();
        assert_send::<MonteCarloSummary>();
        assert_sync::<MonteCarloSummary>();
    }

    #[test]
    fn batch_types_are_send_sync() {
        assert_send::<PriceStore>();
        assert_sync::<PriceStore>();
        assert_send::<SymbolOutcome>();
        assert_sync::<SymbolOutcome>();
        assert_send::<BatchConfig>();
        assert_sync::<BatchConfig>();
        assert_send::<Box<dyn Executor>>();
        assert_sync::<Box<dyn Executor>>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<RunSpec>();
        assert_sync::<RunSpec>();
        assert_send::<ParamGrid>();
        assert_sync::<ParamGrid>();
        assert_send::<WalkForwardConfig>();
        assert_sync::<WalkForwardConfig>();
        assert_send::<MonteCarloConfig>();
        assert_sync::<MonteCarloConfig>();
    }
}
