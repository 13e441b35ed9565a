//! Property tests for simulator invariants.
//!
//! Uses proptest to verify, across random price series and parameters:
//! 1. Every run ends flat with non-negative final capital
//! 2. Fill counting — trades_count is exactly two fills per round trip
//! 3. Equity accounting — the equity identity holds at every recorded bar
//! 4. Determinism — identical inputs give bit-identical outputs

use proptest::prelude::*;
use stratlab_core::config::{BacktestConfig, StopRules, StrategyParams};
use stratlab_core::domain::Bar;
use stratlab_core::engine::run_backtest;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(10.0..500.0_f64, 30..120)
        .prop_map(|v| v.into_iter().map(|p| (p * 100.0).round() / 100.0).collect())
}

fn arb_params() -> impl Strategy<Value = StrategyParams> {
    prop_oneof![
        (1usize..8, 9usize..25).prop_map(|(short, long)| StrategyParams::MaCross {
            short_period: short,
            long_period: long,
        }),
        (1usize..15, 0.0..0.2_f64).prop_map(|(lookback, threshold)| StrategyParams::Momentum {
            lookback,
            threshold,
        }),
        (2usize..15, 10.0..45.0_f64, 55.0..90.0_f64).prop_map(|(period, oversold, overbought)| {
            StrategyParams::Rsi {
                period,
                oversold,
                overbought,
            }
        }),
        Just(StrategyParams::BuyAndHold),
    ]
}

fn arb_stops() -> impl Strategy<Value = Option<StopRules>> {
    prop_oneof![
        Just(None),
        (0.01..0.2_f64, 0.05..0.5_f64, 0.01..0.2_f64).prop_map(|(sl, tp, ts)| {
            Some(StopRules {
                stop_loss: Some(sl),
                take_profit: Some(tp),
                trailing_stop: Some(ts),
            })
        }),
    ]
}

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

fn make_config(params: StrategyParams, stops: Option<StopRules>) -> BacktestConfig {
    let mut config = BacktestConfig::new(params);
    config.stops = stops;
    config
}

proptest! {
    /// Every completed run is flat, solvent, and internally consistent.
    #[test]
    fn run_ends_flat_and_solvent(
        closes in arb_closes(),
        params in arb_params(),
        stops in arb_stops(),
    ) {
        let bars = make_bars(&closes);
        let config = make_config(params, stops);

        let Ok(result) = run_backtest(&bars, &config) else {
            return Ok(()); // short series vs warm-up: fail-fast path is fine
        };

        prop_assert!(result.final_capital >= 0.0);
        prop_assert!(result.final_capital.is_finite());
        prop_assert!(result.equity_curve.iter().all(|e| e.is_finite() && *e >= 0.0));
        prop_assert_eq!(
            result.equity_curve.len(),
            result.bar_count - result.warmup_bars
        );
        // Forced liquidation means the last equity point is pure cash.
        if let Some(&last) = result.equity_curve.last() {
            prop_assert!((last - result.final_capital).abs() < 1e-6);
        }
    }

    /// trades_count counts fills: every round trip is exactly one buy and
    /// one sell, and wins never exceed completed trades.
    #[test]
    fn fill_counting_is_consistent(
        closes in arb_closes(),
        params in arb_params(),
    ) {
        let bars = make_bars(&closes);
        let config = make_config(params, None);

        let Ok(result) = run_backtest(&bars, &config) else { return Ok(()); };

        prop_assert_eq!(result.trades_count as usize, 2 * result.trades.len());
        prop_assert!((result.wins_count as usize) <= result.trades.len());
    }

    /// Replaying the trade log reproduces the equity curve exactly:
    /// equity[t] == cash_t + shares_t * close[t] at every recorded bar.
    #[test]
    fn equity_identity(
        closes in arb_closes(),
        params in arb_params(),
        stops in arb_stops(),
    ) {
        let bars = make_bars(&closes);
        let config = make_config(params, stops);

        let Ok(result) = run_backtest(&bars, &config) else { return Ok(()); };

        let mut cash = config.initial_capital;
        let mut shares: u64 = 0;
        let mut trades = result.trades.iter().peekable();
        let mut in_position = false;

        for (offset, &equity) in result.equity_curve.iter().enumerate() {
            let t = result.warmup_bars + offset;
            if let Some(trade) = trades.peek() {
                if !in_position && trade.entry_bar == t {
                    cash -= trade.cost_basis;
                    shares = trade.shares;
                    in_position = true;
                }
                if in_position && trade.exit_bar == t {
                    cash += trade.proceeds;
                    shares = 0;
                    in_position = false;
                    trades.next();
                }
            }
            prop_assert!(cash >= -1e-6, "cash went negative at bar {}", t);
            let expected = cash + shares as f64 * bars[t].close;
            prop_assert!(
                (equity - expected).abs() < 1e-6,
                "identity broken at bar {}: {} vs {}", t, equity, expected
            );
        }
        prop_assert!(!in_position, "trade log left an open position");
    }

    /// Identical inputs give bit-identical outputs.
    #[test]
    fn determinism(
        closes in arb_closes(),
        params in arb_params(),
    ) {
        let bars = make_bars(&closes);
        let config = make_config(params, None);

        let (Ok(a), Ok(b)) = (run_backtest(&bars, &config), run_backtest(&bars, &config)) else {
            return Ok(());
        };

        prop_assert_eq!(a.final_capital.to_bits(), b.final_capital.to_bits());
        prop_assert_eq!(a.trades_count, b.trades_count);
        for (x, y) in a.equity_curve.iter().zip(&b.equity_curve) {
            prop_assert_eq!(x.to_bits(), y.to_bits());
        }
    }
}
