//! Performance metrics — pure functions over a completed equity curve.
//!
//! Every metric is a pure function: equity curve and/or counters in, scalar
//! out. No dependencies on the optimizer, validators, or batch coordinator.

use serde::{Deserialize, Serialize};

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub total_return: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub win_rate: f64,
}

impl BacktestMetrics {
    /// Compute all metrics for a completed run.
    pub fn compute(
        equity_curve: &[f64],
        initial_capital: f64,
        final_capital: f64,
        trades_count: u32,
        wins_count: u32,
    ) -> Self {
        Self {
            total_return: total_return(initial_capital, final_capital),
            max_drawdown: max_drawdown(equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve),
            win_rate: win_rate(wins_count, trades_count),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Total return as a fraction: (final - initial) / initial.
pub fn total_return(initial_capital: f64, final_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    (final_capital - initial_capital) / initial_capital
}

/// Maximum drawdown as a positive fraction in [0, 1].
///
/// Drawdown at bar t is (peak_t - equity[t]) / peak_t against the running
/// prefix maximum. Bars where the peak is not yet positive contribute 0.
pub fn max_drawdown(equity_curve: &[f64]) -> f64 {
    let mut peak = f64::MIN;
    let mut max_dd = 0.0_f64;

    for &eq in equity_curve {
        if eq > peak {
            peak = eq;
        }
        if peak > 0.0 {
            let dd = (peak - eq) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Annualized Sharpe ratio from daily equity returns.
///
/// Zero-valued returns are discarded first — days with no position held
/// would otherwise dilute the return distribution. Sharpe =
/// mean * 252 / (stdev * sqrt(252)) with sample stdev; 0.0 when no nonzero
/// returns remain or the deviation vanishes.
pub fn sharpe_ratio(equity_curve: &[f64]) -> f64 {
    let returns: Vec<f64> = daily_returns(equity_curve)
        .into_iter()
        .filter(|r| *r != 0.0)
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std = variance.sqrt();
    if std < 1e-15 {
        return 0.0;
    }

    mean * 252.0 / (std * 252.0_f64.sqrt())
}

/// Win rate: wins over recorded fills, 0.0 with no fills.
pub fn win_rate(wins_count: u32, trades_count: u32) -> f64 {
    if trades_count == 0 {
        return 0.0;
    }
    wins_count as f64 / trades_count as f64
}

/// Compute daily returns from an equity curve.
pub fn daily_returns(equity_curve: &[f64]) -> Vec<f64> {
    if equity_curve.len() < 2 {
        return Vec::new();
    }
    equity_curve
        .windows(2)
        .map(|w| if w[0] > 0.0 { w[1] / w[0] - 1.0 } else { 0.0 })
        .collect()
}
