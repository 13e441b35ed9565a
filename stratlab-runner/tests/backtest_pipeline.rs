//! End-to-end pipeline tests: bars → simulator → metrics → reports.

use stratlab_core::config::{BacktestConfig, StrategyParams};
use stratlab_core::domain::Bar;
use stratlab_runner::{
    optimize, run_strategy, BacktestReport, OptimizationReport, ParamGrid,
};

fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) * 1.01,
                low: open.min(close) * 0.99,
                close,
                volume: 10_000,
                amount: close * 10_000.0,
            }
        })
        .collect()
}

fn trending_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 100.0 + i as f64 * 0.2 + 8.0 * (i as f64 * 0.35).sin())
        .collect()
}

fn frictionless(params: StrategyParams) -> BacktestConfig {
    let mut config = BacktestConfig::new(params);
    config.commission_rate = 0.0;
    config.slippage_rate = 0.0;
    config
}

#[test]
fn buy_and_hold_closed_form_through_report() {
    let bars = make_bars(&[100.0, 105.0, 110.0, 108.0, 112.0]);
    let result = run_strategy(&bars, &frictionless(StrategyParams::BuyAndHold)).unwrap();

    assert!((result.metrics.total_return - 0.12).abs() < 1e-12);
    assert!((result.final_capital - 112_000.0).abs() < 1e-9);

    let report = BacktestReport::from_result(&result);
    assert_eq!(report.metrics.total_return_pct, "12.00%");
    assert_eq!(report.strategy, "buy_and_hold");

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"total_return_pct\":\"12.00%\""));
    assert!(json.contains("\"final_capital\":112000.0"));
}

#[test]
fn metric_bounds_hold_across_strategies() {
    let bars = make_bars(&trending_closes(150));
    let strategies = [
        StrategyParams::MaCross {
            short_period: 3,
            long_period: 10,
        },
        StrategyParams::Momentum {
            lookback: 10,
            threshold: 0.02,
        },
        StrategyParams::Rsi {
            period: 7,
            oversold: 35.0,
            overbought: 65.0,
        },
        StrategyParams::BuyAndHold,
    ];

    for params in strategies {
        let result = run_strategy(&bars, &BacktestConfig::new(params.clone())).unwrap();
        let m = &result.metrics;
        assert!((0.0..=1.0).contains(&m.max_drawdown), "{params:?}");
        assert!((0.0..=1.0).contains(&m.win_rate), "{params:?}");
        assert!(m.sharpe_ratio.is_finite(), "{params:?}");
        assert!(result.final_capital >= 0.0, "{params:?}");
    }
}

#[test]
fn optimizer_best_matches_exhaustive_max() {
    let bars = make_bars(&trending_closes(150));
    let base = frictionless(StrategyParams::MaCross {
        short_period: 3,
        long_period: 10,
    });
    let grid = ParamGrid::MaCross {
        short_periods: vec![2, 3, 5, 8],
        long_periods: vec![10, 15, 21],
    };

    let result = optimize(&bars, &base, &grid, true).unwrap();
    let max = result
        .all_results
        .iter()
        .map(|e| e.objective)
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(result.best_score, max);
    assert_eq!(result.all_results.len(), 12); // all combinations valid here

    let report = OptimizationReport::from_result(&result);
    assert_eq!(report.evaluated, 12);
    assert_eq!(report.best_score, result.best_score);
}

#[test]
fn optimizer_ties_keep_first_seen() {
    // Flat prices: every combination yields zero trades and objective 0.
    let bars = make_bars(&[100.0; 80]);
    let base = frictionless(StrategyParams::MaCross {
        short_period: 3,
        long_period: 10,
    });
    let grid = ParamGrid::MaCross {
        short_periods: vec![2, 3],
        long_periods: vec![10, 20],
    };

    let result = optimize(&bars, &base, &grid, false).unwrap();
    // Grid expansion order: (2,10), (2,20), (3,10), (3,20).
    assert_eq!(
        result.best_params,
        StrategyParams::MaCross {
            short_period: 2,
            long_period: 10
        }
    );
    assert_eq!(result.best_score, 0.0);
}
