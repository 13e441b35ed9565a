//! Moving-average crossover rule — golden cross and death cross detection.
//!
//! Buys when the short MA crosses above the long MA on this bar (golden
//! cross), sells on the reverse (death cross). Fills at the bar close with
//! no slippage.

use super::SignalRule;
use crate::domain::{Bar, Ledger, Signal};
use crate::indicators::{Indicator, Sma};

#[derive(Debug)]
pub struct MaCrossRule {
    long_period: usize,
    short_ma: Vec<f64>,
    long_ma: Vec<f64>,
}

impl MaCrossRule {
    pub fn new(short_period: usize, long_period: usize, bars: &[Bar]) -> Self {
        assert!(short_period >= 1, "short_period must be >= 1");
        assert!(
            long_period > short_period,
            "long_period must be > short_period"
        );
        Self {
            long_period,
            short_ma: Sma::new(short_period).compute(bars),
            long_ma: Sma::new(long_period).compute(bars),
        }
    }
}

impl SignalRule for MaCrossRule {
    fn name(&self) -> &'static str {
        "ma_cross"
    }

    fn warmup_bars(&self) -> usize {
        self.long_period
    }

    fn uses_slippage(&self) -> bool {
        false
    }

    fn evaluate(&self, _bars: &[Bar], t: usize, _ledger: &Ledger) -> Signal {
        if t == 0 || t < self.warmup_bars() || t >= self.short_ma.len() {
            return Signal::Hold;
        }

        let short_cur = self.short_ma[t];
        let long_cur = self.long_ma[t];
        let short_prev = self.short_ma[t - 1];
        let long_prev = self.long_ma[t - 1];

        if short_cur.is_nan() || long_cur.is_nan() || short_prev.is_nan() || long_prev.is_nan() {
            return Signal::Hold;
        }

        // Golden cross: short was <= long, now above.
        if short_cur > long_cur && short_prev <= long_prev {
            return Signal::Buy;
        }
        // Death cross: short was >= long, now below.
        if short_cur < long_cur && short_prev >= long_prev {
            return Signal::Sell;
        }

        Signal::Hold
    }
}
