//! Walk-forward validator — rolling re-optimization with out-of-sample
//! evaluation.
//!
//! Splits the bar series into consecutive train/test windows: optimize on
//! [i, i+train), evaluate the chosen parameters on the immediately
//! following [i+train, i+train+test), then advance by the test width. Test
//! windows never overlap, and each segment's out-of-sample return compounds
//! into the overall figure.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::config::{BacktestConfig, StrategyParams};
use stratlab_core::domain::Bar;

use crate::optimizer::{optimize, ParamGrid};
use crate::runner::run_strategy;

// ─── Configuration ───────────────────────────────────────────────────

/// Walk-forward window sizes, in bars.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardConfig {
    pub train_window: usize,
    pub test_window: usize,
}

// ─── Result types ────────────────────────────────────────────────────

/// One rolling segment: what was chosen in-sample and how it did
/// out-of-sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardSegment {
    pub period_label: String,
    pub chosen_params: StrategyParams,
    pub out_of_sample_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

/// Complete walk-forward outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardResult {
    pub segments: Vec<WalkForwardSegment>,
    /// Segment returns compounded multiplicatively.
    pub overall_return: f64,
}

/// Errors from walk-forward validation.
#[derive(Debug, Error)]
pub enum WalkForwardError {
    #[error("window sizes must be positive (train {train}, test {test})")]
    InvalidWindows { train: usize, test: usize },
    #[error("insufficient data: {total_bars} bars < one full train+test window ({required})")]
    InsufficientData { total_bars: usize, required: usize },
    #[error("no walk-forward segment produced a result")]
    EmptySegmentSet,
}

// ─── Orchestration ───────────────────────────────────────────────────

/// Run walk-forward validation over `bars`.
///
/// A segment whose in-sample optimization or out-of-sample evaluation fails
/// is skipped with a warning; only an empty segment set is an error.
pub fn run_walk_forward(
    bars: &[Bar],
    base: &BacktestConfig,
    grid: &ParamGrid,
    wf: &WalkForwardConfig,
) -> Result<WalkForwardResult, WalkForwardError> {
    if wf.train_window == 0 || wf.test_window == 0 {
        return Err(WalkForwardError::InvalidWindows {
            train: wf.train_window,
            test: wf.test_window,
        });
    }
    let required = wf.train_window + wf.test_window;
    if bars.len() < required {
        return Err(WalkForwardError::InsufficientData {
            total_bars: bars.len(),
            required,
        });
    }

    let mut segments = Vec::new();
    let mut i = 0;
    while i + required <= bars.len() {
        let train = &bars[i..i + wf.train_window];
        let test = &bars[i + wf.train_window..i + required];
        let label = format!(
            "{} → {}",
            test.first().map(|b| b.date.to_string()).unwrap_or_default(),
            test.last().map(|b| b.date.to_string()).unwrap_or_default(),
        );

        match evaluate_segment(train, test, base, grid) {
            Ok(mut segment) => {
                segment.period_label = label;
                segments.push(segment);
            }
            Err(reason) => {
                log::warn!("skipping walk-forward segment {label}: {reason}");
            }
        }

        i += wf.test_window;
    }

    if segments.is_empty() {
        return Err(WalkForwardError::EmptySegmentSet);
    }

    let overall_return = segments
        .iter()
        .map(|s| 1.0 + s.out_of_sample_return)
        .product::<f64>()
        - 1.0;

    Ok(WalkForwardResult {
        segments,
        overall_return,
    })
}

/// Optimize on the train slice, evaluate the winner out-of-sample.
fn evaluate_segment(
    train: &[Bar],
    test: &[Bar],
    base: &BacktestConfig,
    grid: &ParamGrid,
) -> Result<WalkForwardSegment, String> {
    let optimized = optimize(train, base, grid, true).map_err(|e| e.to_string())?;

    let mut config = base.clone();
    config.params = optimized.best_params.clone();
    let result = run_strategy(test, &config).map_err(|e| e.to_string())?;

    Ok(WalkForwardSegment {
        period_label: String::new(),
        chosen_params: optimized.best_params,
        out_of_sample_return: result.metrics.total_return,
        sharpe_ratio: result.metrics.sharpe_ratio,
        max_drawdown: result.metrics.max_drawdown,
    })
}
