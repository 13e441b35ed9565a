//! Buy-and-hold baseline: buy on the first usable bar, hold to the end.

use super::SignalRule;
use crate::domain::{Bar, Ledger, Signal};

#[derive(Debug, Default)]
pub struct BuyAndHoldRule;

impl BuyAndHoldRule {
    pub fn new() -> Self {
        Self
    }
}

impl SignalRule for BuyAndHoldRule {
    fn name(&self) -> &'static str {
        "buy_and_hold"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn uses_slippage(&self) -> bool {
        false
    }

    fn evaluate(&self, _bars: &[Bar], _t: usize, ledger: &Ledger) -> Signal {
        if ledger.is_long() {
            Signal::Hold
        } else {
            Signal::Buy
        }
    }
}
