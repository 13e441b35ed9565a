//! Monte Carlo validator — synthetic price paths from historical return
//! statistics.
//!
//! Estimates the sample mean and standard deviation of the input's daily
//! close returns, then replays the full simulator over i.i.d. normal
//! resamples of that distribution. Per-path RNGs are derived from the
//! master seed via BLAKE3 sub-seeding, so the fan-out is reproducible and
//! independent of rayon scheduling order.

use rand::distributions::Distribution;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use thiserror::Error;

use stratlab_core::config::BacktestConfig;
use stratlab_core::domain::Bar;
use stratlab_core::rng::SeedHierarchy;

use crate::metrics::max_drawdown;
use crate::runner::run_strategy;

// ─── Configuration ───────────────────────────────────────────────────

/// Monte Carlo settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonteCarloConfig {
    /// Number of synthetic paths (default 500).
    pub n_runs: usize,
    /// RNG master seed for reproducibility.
    pub seed: u64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            n_runs: 500,
            seed: 42,
        }
    }
}

// ─── Result types ────────────────────────────────────────────────────

/// Distribution summary over all completed synthetic runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub n_runs: usize,
    /// Runs that produced a usable result (non-positive synthetic prices
    /// and warm-up failures drop a run, never the whole validation).
    pub n_completed: usize,
    pub best_final_capital: f64,
    pub worst_final_capital: f64,
    pub mean_final_capital: f64,
    pub median_final_capital: f64,
    /// 5th percentile of final capital.
    pub confidence_95: f64,
    pub avg_max_drawdown: f64,
    pub worst_max_drawdown: f64,
}

/// Errors from Monte Carlo validation.
#[derive(Debug, Error)]
pub enum MonteCarloError {
    #[error("insufficient data: {got} bars, need at least 3 for return statistics")]
    InsufficientData { got: usize },
    #[error("no synthetic run produced a result")]
    NoRuns,
}

// ─── Validation ──────────────────────────────────────────────────────

/// Run the Monte Carlo validation: `mc.n_runs` synthetic paths, each
/// replayed through the full simulator with `config`.
pub fn run_monte_carlo(
    bars: &[Bar],
    config: &BacktestConfig,
    mc: &MonteCarloConfig,
) -> Result<MonteCarloSummary, MonteCarloError> {
    if bars.len() < 3 {
        return Err(MonteCarloError::InsufficientData { got: bars.len() });
    }

    let returns: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect();
    let mean = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let std = variance.sqrt();

    // Zero-variance history degrades to deterministic draws of the mean.
    let normal = if std > 0.0 {
        Normal::new(mean, std).ok()
    } else {
        None
    };

    let hierarchy = SeedHierarchy::new(mc.seed);

    let outcomes: Vec<(f64, f64)> = (0..mc.n_runs)
        .into_par_iter()
        .filter_map(|i| {
            let mut rng = hierarchy.rng_for("monte_carlo", i as u64);
            let draws: Vec<f64> = (0..returns.len())
                .map(|_| match &normal {
                    Some(dist) => dist.sample(&mut rng),
                    None => mean,
                })
                .collect();

            let synthetic = synthesize_path(bars, &draws)?;
            let result = run_strategy(&synthetic, config).ok()?;
            Some((
                result.final_capital,
                max_drawdown(&result.equity_curve),
            ))
        })
        .collect();

    if outcomes.is_empty() {
        return Err(MonteCarloError::NoRuns);
    }

    let mut finals: Vec<f64> = outcomes.iter().map(|o| o.0).collect();
    finals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let drawdowns: Vec<f64> = outcomes.iter().map(|o| o.1).collect();

    let n = finals.len();
    Ok(MonteCarloSummary {
        n_runs: mc.n_runs,
        n_completed: n,
        best_final_capital: finals[n - 1],
        worst_final_capital: finals[0],
        mean_final_capital: finals.iter().sum::<f64>() / n as f64,
        median_final_capital: percentile_sorted(&finals, 50.0),
        confidence_95: percentile_sorted(&finals, 5.0),
        avg_max_drawdown: drawdowns.iter().sum::<f64>() / n as f64,
        worst_max_drawdown: drawdowns.iter().copied().fold(0.0, f64::max),
    })
}

/// Reconstruct a synthetic bar series: cumulative product of (1 + r) draws
/// anchored at the real first close. Dates, volume and amount carry over
/// from the real bars. Returns None when a draw would push the price to
/// zero or below.
fn synthesize_path(bars: &[Bar], draws: &[f64]) -> Option<Vec<Bar>> {
    let mut price = bars[0].close;
    let mut out = Vec::with_capacity(bars.len());
    out.push(flat_bar(&bars[0], price));

    for (bar, &r) in bars[1..].iter().zip(draws) {
        price *= 1.0 + r;
        if price <= 0.0 || !price.is_finite() {
            return None;
        }
        out.push(flat_bar(bar, price));
    }
    Some(out)
}

/// A bar whose OHLC collapse to the synthetic close.
fn flat_bar(template: &Bar, price: f64) -> Bar {
    Bar {
        date: template.date,
        open: price,
        high: price,
        low: price,
        close: price,
        volume: template.volume,
        amount: template.amount,
    }
}

/// Percentile of a sorted slice using linear interpolation.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted[0];
    }
    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}
