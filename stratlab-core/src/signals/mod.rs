//! Signal rules — per-bar trade decisions.
//!
//! Each rule precomputes its indicator series from the full bar slice at
//! construction, then answers `evaluate()` per bar with plain slice reads.
//! Rules are position-aware: momentum/RSI gate on flat vs long, and the
//! stop/target overlay reads the ledger's entry and trailing state.

pub mod buy_and_hold;
pub mod ma_cross;
pub mod momentum;
pub mod rsi;
pub mod stop_overlay;

pub use buy_and_hold::BuyAndHoldRule;
pub use ma_cross::MaCrossRule;
pub use momentum::MomentumRule;
pub use rsi::RsiRule;
pub use stop_overlay::StopOverlay;

use crate::config::{BacktestConfig, StrategyParams};
use crate::domain::{Bar, Ledger, Signal};

/// A trading rule evaluated once per bar.
pub trait SignalRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Bars required before the first decision can be made.
    fn warmup_bars(&self) -> usize;

    /// Whether fills under this rule carry the fixed slippage adjustment.
    ///
    /// Momentum, RSI and stop-overlay fills model slippage; MA-cross and
    /// buy-and-hold fill at the bar close.
    fn uses_slippage(&self) -> bool;

    /// Decide for bar `t`. `ledger` is read-only position state.
    fn evaluate(&self, bars: &[Bar], t: usize, ledger: &Ledger) -> Signal;
}

/// Build the configured rule, precomputing indicators over `bars`, and wrap
/// it in the stop/target overlay when stop rules are present.
pub fn build_rule(config: &BacktestConfig, bars: &[Bar]) -> Box<dyn SignalRule> {
    let base: Box<dyn SignalRule> = match config.params {
        StrategyParams::MaCross {
            short_period,
            long_period,
        } => Box::new(MaCrossRule::new(short_period, long_period, bars)),
        StrategyParams::Momentum {
            lookback,
            threshold,
        } => Box::new(MomentumRule::new(lookback, threshold, bars)),
        StrategyParams::Rsi {
            period,
            oversold,
            overbought,
        } => Box::new(RsiRule::new(period, oversold, overbought, bars)),
        StrategyParams::BuyAndHold => Box::new(BuyAndHoldRule::new()),
    };

    match config.stops {
        Some(stops) if !stops.is_empty() => Box::new(StopOverlay::new(base, stops)),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StopRules;
    use crate::indicators::make_bars;

    #[test]
    fn factory_builds_each_variant() {
        let bars = make_bars(&[100.0; 30]);
        for name in ["ma_cross", "momentum", "rsi", "buy_and_hold"] {
            let config = BacktestConfig::new(StrategyParams::from_name(name).unwrap());
            let rule = build_rule(&config, &bars);
            assert_eq!(rule.name(), name);
        }
    }

    #[test]
    fn factory_wraps_with_overlay_when_stops_set() {
        let bars = make_bars(&[100.0; 30]);
        let config = BacktestConfig::new(StrategyParams::BuyAndHold).with_stops(StopRules {
            stop_loss: Some(0.05),
            ..Default::default()
        });
        let rule = build_rule(&config, &bars);
        assert_eq!(rule.name(), "stop_overlay");
        assert!(rule.uses_slippage());
    }

    #[test]
    fn factory_ignores_empty_stops() {
        let bars = make_bars(&[100.0; 30]);
        let config = BacktestConfig::new(StrategyParams::BuyAndHold).with_stops(StopRules::default());
        let rule = build_rule(&config, &bars);
        assert_eq!(rule.name(), "buy_and_hold");
    }
}
