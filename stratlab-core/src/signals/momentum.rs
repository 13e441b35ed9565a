//! Momentum threshold rule.
//!
//! Buys when the fractional lookback return exceeds `threshold` while flat;
//! sells when it drops below `-threshold` while long. Fills carry slippage.

use super::SignalRule;
use crate::domain::{Bar, Ledger, Signal};
use crate::indicators::{Indicator, Momentum};

#[derive(Debug)]
pub struct MomentumRule {
    lookback: usize,
    threshold: f64,
    momentum: Vec<f64>,
}

impl MomentumRule {
    pub fn new(lookback: usize, threshold: f64, bars: &[Bar]) -> Self {
        assert!(lookback >= 1, "lookback must be >= 1");
        Self {
            lookback,
            threshold,
            momentum: Momentum::new(lookback).compute(bars),
        }
    }
}

impl SignalRule for MomentumRule {
    fn name(&self) -> &'static str {
        "momentum"
    }

    fn warmup_bars(&self) -> usize {
        self.lookback
    }

    fn uses_slippage(&self) -> bool {
        true
    }

    fn evaluate(&self, _bars: &[Bar], t: usize, ledger: &Ledger) -> Signal {
        if t < self.warmup_bars() || t >= self.momentum.len() {
            return Signal::Hold;
        }
        let mom = self.momentum[t];
        if mom.is_nan() {
            return Signal::Hold;
        }

        if mom > self.threshold && !ledger.is_long() {
            Signal::Buy
        } else if mom < -self.threshold && ledger.is_long() {
            Signal::Sell
        } else {
            Signal::Hold
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use chrono::NaiveDate;

    fn long_ledger() -> Ledger {
        let mut ledger = Ledger::new(100_000.0);
        ledger.buy(0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), 100.0, 0.0);
        ledger
    }

    #[test]
    fn buys_on_strong_momentum_while_flat() {
        // (112 - 100) / 100 = 0.12 > 0.05
        let bars = make_bars(&[100.0, 104.0, 112.0]);
        let rule = MomentumRule::new(2, 0.05, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 2, &ledger), Signal::Buy);
    }

    #[test]
    fn no_buy_while_long() {
        let bars = make_bars(&[100.0, 104.0, 112.0]);
        let rule = MomentumRule::new(2, 0.05, &bars);
        assert_eq!(rule.evaluate(&bars, 2, &long_ledger()), Signal::Hold);
    }

    #[test]
    fn sells_on_weak_momentum_while_long() {
        // (88 - 100) / 100 = -0.12 < -0.05
        let bars = make_bars(&[100.0, 96.0, 88.0]);
        let rule = MomentumRule::new(2, 0.05, &bars);
        assert_eq!(rule.evaluate(&bars, 2, &long_ledger()), Signal::Sell);
    }

    #[test]
    fn no_sell_while_flat() {
        let bars = make_bars(&[100.0, 96.0, 88.0]);
        let rule = MomentumRule::new(2, 0.05, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 2, &ledger), Signal::Hold);
    }

    #[test]
    fn holds_inside_threshold_band() {
        let bars = make_bars(&[100.0, 101.0, 102.0]);
        let rule = MomentumRule::new(2, 0.05, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 2, &ledger), Signal::Hold);
    }

    #[test]
    fn warmup_guard() {
        let bars = make_bars(&[100.0, 120.0, 140.0]);
        let rule = MomentumRule::new(2, 0.05, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 1, &ledger), Signal::Hold);
    }
}
