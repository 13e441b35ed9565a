//! Display-ready report records.
//!
//! Every report is JSON-serializable and carries human-readable
//! percentage-formatted mirrors of its fractional fields, so callers can
//! render results without re-deriving formatting. Persisting these records
//! is the caller's concern.

use serde::{Deserialize, Serialize};

use stratlab_core::config::StrategyParams;

use crate::batch::SymbolOutcome;
use crate::metrics::BacktestMetrics;
use crate::monte_carlo::MonteCarloSummary;
use crate::runner::BacktestResult;
use crate::walk_forward::{WalkForwardResult, WalkForwardSegment};

/// Format a fraction as a percentage string: 0.1234 → "12.34%".
pub fn format_pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Numeric metrics plus their display mirrors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_return: f64,
    pub total_return_pct: String,
    pub max_drawdown: f64,
    pub max_drawdown_pct: String,
    pub sharpe_ratio: f64,
    pub win_rate: f64,
    pub win_rate_pct: String,
}

impl MetricsSummary {
    pub fn from_metrics(metrics: &BacktestMetrics) -> Self {
        Self {
            total_return: metrics.total_return,
            total_return_pct: format_pct(metrics.total_return),
            max_drawdown: metrics.max_drawdown,
            max_drawdown_pct: format_pct(metrics.max_drawdown),
            sharpe_ratio: metrics.sharpe_ratio,
            win_rate: metrics.win_rate,
            win_rate_pct: format_pct(metrics.win_rate),
        }
    }
}

/// Single-run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy: String,
    pub params: StrategyParams,
    pub start_date: String,
    pub end_date: String,
    pub initial_capital: f64,
    pub final_capital: f64,
    pub trades_count: u32,
    #[serde(flatten)]
    pub metrics: MetricsSummary,
}

impl BacktestReport {
    pub fn from_result(result: &BacktestResult) -> Self {
        Self {
            strategy: result.config.params.name().to_string(),
            params: result.config.params.clone(),
            start_date: result.start_date.clone(),
            end_date: result.end_date.clone(),
            initial_capital: result.config.initial_capital,
            final_capital: result.final_capital,
            trades_count: result.trades_count,
            metrics: MetricsSummary::from_metrics(&result.metrics),
        }
    }
}

/// One evaluated grid point, display-ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub params: StrategyParams,
    pub objective: f64,
    #[serde(flatten)]
    pub metrics: MetricsSummary,
}

/// Grid-search report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationReport {
    pub strategy: String,
    pub best_params: StrategyParams,
    pub best_score: f64,
    pub evaluated: usize,
    pub all_results: Vec<EvaluationReport>,
}

impl OptimizationReport {
    pub fn from_result(result: &crate::optimizer::OptimizationResult) -> Self {
        Self {
            strategy: result.best_params.name().to_string(),
            best_params: result.best_params.clone(),
            best_score: result.best_score,
            evaluated: result.all_results.len(),
            all_results: result
                .all_results
                .iter()
                .map(|e| EvaluationReport {
                    params: e.params.clone(),
                    objective: e.objective,
                    metrics: MetricsSummary::from_metrics(&e.metrics),
                })
                .collect(),
        }
    }
}

/// One walk-forward segment, display-ready.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentReport {
    pub period: String,
    pub chosen_params: StrategyParams,
    pub out_of_sample_return: f64,
    pub out_of_sample_return_pct: String,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub max_drawdown_pct: String,
}

impl SegmentReport {
    fn from_segment(segment: &WalkForwardSegment) -> Self {
        Self {
            period: segment.period_label.clone(),
            chosen_params: segment.chosen_params.clone(),
            out_of_sample_return: segment.out_of_sample_return,
            out_of_sample_return_pct: format_pct(segment.out_of_sample_return),
            sharpe_ratio: segment.sharpe_ratio,
            max_drawdown: segment.max_drawdown,
            max_drawdown_pct: format_pct(segment.max_drawdown),
        }
    }
}

/// Walk-forward report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkForwardReport {
    pub segments: Vec<SegmentReport>,
    pub overall_return: f64,
    pub overall_return_pct: String,
}

impl WalkForwardReport {
    pub fn from_result(result: &WalkForwardResult) -> Self {
        Self {
            segments: result.segments.iter().map(SegmentReport::from_segment).collect(),
            overall_return: result.overall_return,
            overall_return_pct: format_pct(result.overall_return),
        }
    }
}

/// Monte Carlo distribution report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloReport {
    pub n_runs: usize,
    pub n_completed: usize,
    pub best_final_capital: f64,
    pub worst_final_capital: f64,
    pub mean_final_capital: f64,
    pub median_final_capital: f64,
    pub confidence_95: f64,
    pub avg_max_drawdown: f64,
    pub avg_max_drawdown_pct: String,
    pub worst_max_drawdown: f64,
    pub worst_max_drawdown_pct: String,
}

impl MonteCarloReport {
    pub fn from_summary(summary: &MonteCarloSummary) -> Self {
        Self {
            n_runs: summary.n_runs,
            n_completed: summary.n_completed,
            best_final_capital: summary.best_final_capital,
            worst_final_capital: summary.worst_final_capital,
            mean_final_capital: summary.mean_final_capital,
            median_final_capital: summary.median_final_capital,
            confidence_95: summary.confidence_95,
            avg_max_drawdown: summary.avg_max_drawdown,
            avg_max_drawdown_pct: format_pct(summary.avg_max_drawdown),
            worst_max_drawdown: summary.worst_max_drawdown,
            worst_max_drawdown_pct: format_pct(summary.worst_max_drawdown),
        }
    }
}

/// Per-symbol batch entry: failure slots carry the error, success slots a
/// compact report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEntryReport {
    pub symbol: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<BacktestReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Batch report across symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub total: usize,
    pub successes: usize,
    pub failures: usize,
    pub entries: Vec<BatchEntryReport>,
}

impl BatchReport {
    pub fn from_outcomes(outcomes: &[SymbolOutcome]) -> Self {
        let entries: Vec<BatchEntryReport> = outcomes
            .iter()
            .map(|o| BatchEntryReport {
                symbol: o.symbol.clone(),
                success: o.success,
                report: o.result.as_ref().map(BacktestReport::from_result),
                error: o.error.clone(),
            })
            .collect();
        let successes = entries.iter().filter(|e| e.success).count();
        Self {
            total: entries.len(),
            successes,
            failures: entries.len() - successes,
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_pct_rounds_to_two_places() {
        assert_eq!(format_pct(0.12), "12.00%");
        assert_eq!(format_pct(0.12345), "12.35%");
        assert_eq!(format_pct(-0.05), "-5.00%");
        assert_eq!(format_pct(0.0), "0.00%");
    }

    #[test]
    fn metrics_summary_mirrors_numbers() {
        let metrics = BacktestMetrics {
            total_return: 0.12,
            max_drawdown: 0.08,
            sharpe_ratio: 1.4,
            win_rate: 0.5,
        };
        let summary = MetricsSummary::from_metrics(&metrics);
        assert_eq!(summary.total_return_pct, "12.00%");
        assert_eq!(summary.max_drawdown_pct, "8.00%");
        assert_eq!(summary.win_rate_pct, "50.00%");
        assert_eq!(summary.total_return, 0.12);
    }

    #[test]
    fn metrics_summary_serializes_both_forms() {
        let metrics = BacktestMetrics {
            total_return: 0.12,
            max_drawdown: 0.08,
            sharpe_ratio: 1.4,
            win_rate: 0.5,
        };
        let json = serde_json::to_string(&MetricsSummary::from_metrics(&metrics)).unwrap();
        assert!(json.contains("\"total_return\":0.12"));
        assert!(json.contains("\"total_return_pct\":\"12.00%\""));
    }
}
