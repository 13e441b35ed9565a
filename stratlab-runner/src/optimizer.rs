//! Parameter optimizer — exhaustive grid search scored by risk-adjusted
//! return.
//!
//! Structurally invalid combinations (short >= long, oversold >= overbought)
//! are skipped during grid expansion — they are not candidate solutions.
//! Combinations whose simulation fails (e.g. too few bars for that warm-up)
//! are likewise skipped. Producing zero evaluations is an explicit error,
//! never a vacuous best.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::config::{BacktestConfig, StrategyParams};
use stratlab_core::domain::Bar;

use crate::metrics::BacktestMetrics;
use crate::runner::run_strategy;

/// Discrete parameter ranges, one variant per optimizable rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ParamGrid {
    MaCross {
        short_periods: Vec<usize>,
        long_periods: Vec<usize>,
    },
    Momentum {
        lookbacks: Vec<usize>,
        thresholds: Vec<f64>,
    },
    Rsi {
        periods: Vec<usize>,
        oversolds: Vec<f64>,
        overboughts: Vec<f64>,
    },
}

impl ParamGrid {
    /// Default search ranges for a strategy. Buy-and-hold has no parameter
    /// space and returns None.
    pub fn default_for(params: &StrategyParams) -> Option<Self> {
        match params {
            StrategyParams::MaCross { .. } => Some(Self::MaCross {
                short_periods: vec![3, 5, 10, 15, 20],
                long_periods: vec![20, 30, 50, 100],
            }),
            StrategyParams::Momentum { .. } => Some(Self::Momentum {
                lookbacks: vec![5, 10, 20, 40, 60],
                thresholds: vec![0.01, 0.02, 0.05, 0.10],
            }),
            StrategyParams::Rsi { .. } => Some(Self::Rsi {
                periods: vec![6, 9, 14, 21],
                oversolds: vec![20.0, 25.0, 30.0, 35.0],
                overboughts: vec![65.0, 70.0, 75.0, 80.0],
            }),
            StrategyParams::BuyAndHold => None,
        }
    }

    /// Upper bound on grid size (before invalid combinations are dropped).
    pub fn size(&self) -> usize {
        match self {
            Self::MaCross {
                short_periods,
                long_periods,
            } => short_periods.len() * long_periods.len(),
            Self::Momentum {
                lookbacks,
                thresholds,
            } => lookbacks.len() * thresholds.len(),
            Self::Rsi {
                periods,
                oversolds,
                overboughts,
            } => periods.len() * oversolds.len() * overboughts.len(),
        }
    }

    /// Expand the grid into concrete parameter sets, skipping structurally
    /// invalid combinations.
    pub fn generate(&self) -> Vec<StrategyParams> {
        let mut out = Vec::new();
        match self {
            Self::MaCross {
                short_periods,
                long_periods,
            } => {
                for &short in short_periods {
                    for &long in long_periods {
                        if short == 0 || short >= long {
                            continue;
                        }
                        out.push(StrategyParams::MaCross {
                            short_period: short,
                            long_period: long,
                        });
                    }
                }
            }
            Self::Momentum {
                lookbacks,
                thresholds,
            } => {
                for &lookback in lookbacks {
                    for &threshold in thresholds {
                        if lookback == 0 || !threshold.is_finite() || threshold < 0.0 {
                            continue;
                        }
                        out.push(StrategyParams::Momentum {
                            lookback,
                            threshold,
                        });
                    }
                }
            }
            Self::Rsi {
                periods,
                oversolds,
                overboughts,
            } => {
                for &period in periods {
                    for &oversold in oversolds {
                        for &overbought in overboughts {
                            if period == 0 || oversold >= overbought {
                                continue;
                            }
                            out.push(StrategyParams::Rsi {
                                period,
                                oversold,
                                overbought,
                            });
                        }
                    }
                }
            }
        }
        out
    }
}

/// Optimization score: Sharpe scaled down by drawdown.
pub fn objective(metrics: &BacktestMetrics) -> f64 {
    metrics.sharpe_ratio * (1.0 - metrics.max_drawdown)
}

/// One evaluated grid point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub params: StrategyParams,
    pub metrics: BacktestMetrics,
    pub objective: f64,
}

/// Result of a grid search: the winner plus every evaluated point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub best_params: StrategyParams,
    pub best_score: f64,
    pub all_results: Vec<Evaluation>,
}

/// Errors from the optimizer.
#[derive(Debug, Error)]
pub enum OptimizeError {
    #[error("empty search space: no valid parameter combination produced a result")]
    EmptySearchSpace,
}

/// Exhaustive grid search over `grid`, replaying `bars` for every candidate.
///
/// The best is tracked by strict greater-than, so ties keep the first-seen
/// candidate; evaluation order is the deterministic grid expansion order
/// even when the sweep runs on rayon.
pub fn optimize(
    bars: &[Bar],
    base: &BacktestConfig,
    grid: &ParamGrid,
    parallel: bool,
) -> Result<OptimizationResult, OptimizeError> {
    let candidates = grid.generate();

    let evaluate = |params: &StrategyParams| -> Option<Evaluation> {
        let mut config = base.clone();
        config.params = params.clone();
        match run_strategy(bars, &config) {
            Ok(result) => Some(Evaluation {
                params: params.clone(),
                objective: objective(&result.metrics),
                metrics: result.metrics,
            }),
            Err(error) => {
                log::debug!("skipping {params:?}: {error}");
                None
            }
        }
    };

    let evaluations: Vec<Evaluation> = if parallel {
        candidates.par_iter().filter_map(evaluate).collect()
    } else {
        candidates.iter().filter_map(evaluate).collect()
    };

    if evaluations.is_empty() {
        return Err(OptimizeError::EmptySearchSpace);
    }

    let mut best = &evaluations[0];
    for eval in &evaluations[1..] {
        if eval.objective > best.objective {
            best = eval;
        }
    }

    log::info!(
        "grid search: {} evaluated, best {:?} (score {:.4})",
        evaluations.len(),
        best.params,
        best.objective
    );

    Ok(OptimizationResult {
        best_params: best.params.clone(),
        best_score: best.objective,
        all_results: evaluations,
    })
}
