//! Single-symbol simulator — flat/long state machine over one bar series.
//!
//! The per-bar loop has a sequential data dependency (state at bar t depends
//! on bar t-1) and runs once per symbol per optimizer or Monte Carlo
//! iteration, so it stays a tight scalar loop over precomputed series with
//! no per-bar allocation. Runs are fully independent across symbols: each
//! ledger is exclusively owned by its run.

use thiserror::Error;

use crate::config::{BacktestConfig, ConfigError};
use crate::domain::{Bar, Ledger, Signal, TradeRecord};
use crate::signals::build_rule;

/// Errors from a simulator run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("insufficient data: {got} bars, need at least {required} for warm-up")]
    InsufficientData { required: usize, got: usize },
}

/// Output of one completed run. The position is always flat here: any open
/// position was force-liquidated on the final bar.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// One value per bar from the warm-up index onward.
    pub equity_curve: Vec<f64>,
    pub trades: Vec<TradeRecord>,
    pub final_capital: f64,
    /// Fill count (buys and sells both count).
    pub trades_count: u32,
    pub wins_count: u32,
    pub warmup_bars: usize,
    pub bar_count: usize,
}

/// Replay `config` against `bars`, bar by bar.
///
/// On `Buy` while flat the ledger buys as many whole shares as cash affords
/// at the (possibly slippage-adjusted) close plus commission; on `Sell`
/// while long it liquidates the full position. Contrary signals in the
/// wrong state are ignored. An open position on the final bar is
/// unconditionally liquidated at the last close minus commission.
pub fn run_backtest(bars: &[Bar], config: &BacktestConfig) -> Result<RunResult, EngineError> {
    config.validate()?;

    let rule = build_rule(config, bars);
    let warmup = rule.warmup_bars();
    if bars.len() <= warmup {
        return Err(EngineError::InsufficientData {
            required: warmup + 1,
            got: bars.len(),
        });
    }

    // Slippage is a property of the rule, not the run: MA-cross and
    // buy-and-hold fill at the close, the others pay the fixed adjustment.
    let slippage = if rule.uses_slippage() {
        config.slippage_rate
    } else {
        0.0
    };

    let mut ledger = Ledger::new(config.initial_capital);
    let mut trades = Vec::new();
    let last = bars.len() - 1;

    for t in warmup..bars.len() {
        let bar = &bars[t];

        match rule.evaluate(bars, t, &ledger) {
            Signal::Buy if !ledger.is_long() => {
                let fill = bar.close * (1.0 + slippage);
                // Ignored when cash does not cover one share.
                ledger.buy(t, bar.date, fill, config.commission_rate);
            }
            Signal::Sell if ledger.is_long() => {
                let fill = bar.close * (1.0 - slippage);
                if let Some(trade) = ledger.sell(t, bar.date, fill, config.commission_rate) {
                    trades.push(trade);
                }
            }
            _ => {}
        }

        ledger.track_high(bar.close);

        // Forced liquidation: the last close minus commission, no slippage.
        if t == last && ledger.is_long() {
            if let Some(trade) = ledger.sell(t, bar.date, bar.close, config.commission_rate) {
                trades.push(trade);
            }
        }

        ledger.record_equity(bar.close);
    }

    debug_assert_eq!(ledger.shares, 0, "run must end flat");

    Ok(RunResult {
        final_capital: ledger.cash,
        trades_count: ledger.trades_count,
        wins_count: ledger.wins_count,
        equity_curve: ledger.equity,
        trades,
        warmup_bars: warmup,
        bar_count: bars.len(),
    })
}
