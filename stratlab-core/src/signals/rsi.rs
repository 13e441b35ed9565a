//! RSI mean-reversion rule.
//!
//! Buys when RSI drops below the oversold level while flat; sells when RSI
//! rises above the overbought level while long. Fills carry slippage.

use super::SignalRule;
use crate::domain::{Bar, Ledger, Signal};
use crate::indicators::{Indicator, Rsi};

#[derive(Debug)]
pub struct RsiRule {
    period: usize,
    oversold: f64,
    overbought: f64,
    rsi: Vec<f64>,
}

impl RsiRule {
    pub fn new(period: usize, oversold: f64, overbought: f64, bars: &[Bar]) -> Self {
        assert!(period >= 1, "period must be >= 1");
        assert!(
            oversold < overbought,
            "oversold must be < overbought"
        );
        Self {
            period,
            oversold,
            overbought,
            rsi: Rsi::new(period).compute(bars),
        }
    }
}

impl SignalRule for RsiRule {
    fn name(&self) -> &'static str {
        "rsi"
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn uses_slippage(&self) -> bool {
        true
    }

    fn evaluate(&self, _bars: &[Bar], t: usize, ledger: &Ledger) -> Signal {
        if t < self.warmup_bars() || t >= self.rsi.len() {
            return Signal::Hold;
        }
        let rsi = self.rsi[t];
        if rsi.is_nan() {
            return Signal::Hold;
        }

        if rsi < self.oversold && !ledger.is_long() {
            Signal::Buy
        } else if rsi > self.overbought && ledger.is_long() {
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
    fn buys_when_oversold_and_flat() {
        // Straight decline → RSI 0 after warm-up.
        let bars = make_bars(&[110.0, 108.0, 106.0, 104.0, 102.0]);
        let rule = RsiRule::new(3, 30.0, 70.0, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 3, &ledger), Signal::Buy);
    }

    #[test]
    fn sells_when_overbought_and_long() {
        // Straight rise → RSI 100 after warm-up.
        let bars = make_bars(&[100.0, 102.0, 104.0, 106.0, 108.0]);
        let rule = RsiRule::new(3, 30.0, 70.0, &bars);
        assert_eq!(rule.evaluate(&bars, 3, &long_ledger()), Signal::Sell);
    }

    #[test]
    fn oversold_while_long_is_hold() {
        let bars = make_bars(&[110.0, 108.0, 106.0, 104.0, 102.0]);
        let rule = RsiRule::new(3, 30.0, 70.0, &bars);
        assert_eq!(rule.evaluate(&bars, 3, &long_ledger()), Signal::Hold);
    }

    #[test]
    fn overbought_while_flat_is_hold() {
        let bars = make_bars(&[100.0, 102.0, 104.0, 106.0, 108.0]);
        let rule = RsiRule::new(3, 30.0, 70.0, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 3, &ledger), Signal::Hold);
    }

    #[test]
    fn neutral_band_holds() {
        let bars = make_bars(&[100.0, 101.0, 99.0, 102.0, 100.0, 101.0]);
        let rule = RsiRule::new(3, 10.0, 90.0, &bars);
        let ledger = Ledger::new(100_000.0);
        for t in 3..bars.len() {
            assert_eq!(rule.evaluate(&bars, t, &ledger), Signal::Hold, "bar {t}");
        }
    }

    #[test]
    fn warmup_guard() {
        let bars = make_bars(&[110.0, 108.0, 106.0, 104.0]);
        let rule = RsiRule::new(3, 30.0, 70.0, &bars);
        let ledger = Ledger::new(100_000.0);
        assert_eq!(rule.evaluate(&bars, 2, &ledger), Signal::Hold);
    }

    #[test]
    #[should_panic(expected = "oversold must be < overbought")]
    fn rejects_inverted_levels() {
        let bars = make_bars(&[100.0; 5]);
        RsiRule::new(3, 70.0, 30.0, &bars);
    }
}
