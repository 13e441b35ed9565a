//! Backtest runner — wires the simulator and metrics into one result.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::config::BacktestConfig;
use stratlab_core::domain::{Bar, TradeRecord};
use stratlab_core::engine::{run_backtest, EngineError};

use crate::metrics::BacktestMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

/// Complete result of a single backtest run.
///
/// JSON-serializable; display-ready percentage mirrors live in
/// [`crate::report::BacktestReport`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub metrics: BacktestMetrics,
    pub final_capital: f64,
    pub trades_count: u32,
    pub wins_count: u32,
    pub equity_curve: Vec<f64>,
    pub trades: Vec<TradeRecord>,
    /// Echo of the input configuration.
    pub config: BacktestConfig,
    pub warmup_bars: usize,
    pub bar_count: usize,
    pub start_date: String,
    pub end_date: String,
}

/// Run one strategy over one symbol's bars and derive metrics.
pub fn run_strategy(bars: &[Bar], config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    let run = run_backtest(bars, config)?;
    let metrics = BacktestMetrics::compute(
        &run.equity_curve,
        config.initial_capital,
        run.final_capital,
        run.trades_count,
        run.wins_count,
    );

    Ok(BacktestResult {
        metrics,
        final_capital: run.final_capital,
        trades_count: run.trades_count,
        wins_count: run.wins_count,
        equity_curve: run.equity_curve,
        trades: run.trades,
        config: config.clone(),
        warmup_bars: run.warmup_bars,
        bar_count: run.bar_count,
        start_date: bars.first().map(|b| b.date.to_string()).unwrap_or_default(),
        end_date: bars.last().map(|b| b.date.to_string()).unwrap_or_default(),
    })
}
