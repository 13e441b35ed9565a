//! Stop/target overlay — wraps any rule and forces exits.
//!
//! Independent of the wrapped rule's own sell logic, the overlay forces a
//! sell while long when the close breaches the fixed stop, the profit
//! target, or the trailing stop. Entry and trailing state is tracked in the
//! ledger, not here.

use super::SignalRule;
use crate::config::StopRules;
use crate::domain::{Bar, Ledger, Signal};

pub struct StopOverlay {
    inner: Box<dyn SignalRule>,
    stops: StopRules,
}

impl StopOverlay {
    pub fn new(inner: Box<dyn SignalRule>, stops: StopRules) -> Self {
        Self { inner, stops }
    }

    fn stop_hit(&self, close: f64, ledger: &Ledger) -> bool {
        if let Some(stop_loss) = self.stops.stop_loss {
            if close <= ledger.entry_price * (1.0 - stop_loss) {
                return true;
            }
        }
        if let Some(take_profit) = self.stops.take_profit {
            if close >= ledger.entry_price * (1.0 + take_profit) {
                return true;
            }
        }
        if let Some(trailing) = self.stops.trailing_stop {
            if close <= ledger.highest_price_since_entry * (1.0 - trailing) {
                return true;
            }
        }
        false
    }
}

impl SignalRule for StopOverlay {
    fn name(&self) -> &'static str {
        "stop_overlay"
    }

    fn warmup_bars(&self) -> usize {
        self.inner.warmup_bars()
    }

    fn uses_slippage(&self) -> bool {
        true
    }

    fn evaluate(&self, bars: &[Bar], t: usize, ledger: &Ledger) -> Signal {
        if ledger.is_long() && self.stop_hit(bars[t].close, ledger) {
            return Signal::Sell;
        }
        self.inner.evaluate(bars, t, ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::signals::BuyAndHoldRule;
    use chrono::NaiveDate;

    fn overlay(stops: StopRules) -> StopOverlay {
        StopOverlay::new(Box::new(BuyAndHoldRule::new()), stops)
    }

    fn ledger_long_at(entry: f64) -> Ledger {
        let mut ledger = Ledger::new(100_000.0);
        ledger.buy(0, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(), entry, 0.0);
        ledger
    }

    #[test]
    fn stop_loss_forces_sell() {
        let rule = overlay(StopRules {
            stop_loss: Some(0.05),
            ..Default::default()
        });
        let ledger = ledger_long_at(100.0);
        let bars = make_bars(&[100.0, 94.9]);
        assert_eq!(rule.evaluate(&bars, 1, &ledger), Signal::Sell);
    }

    #[test]
    fn take_profit_forces_sell() {
        let rule = overlay(StopRules {
            take_profit: Some(0.10),
            ..Default::default()
        });
        let ledger = ledger_long_at(100.0);
        let bars = make_bars(&[100.0, 110.0]);
        assert_eq!(rule.evaluate(&bars, 1, &ledger), Signal::Sell);
    }

    #[test]
    fn trailing_stop_tracks_highest_close() {
        let rule = overlay(StopRules {
            trailing_stop: Some(0.05),
            ..Default::default()
        });
        let mut ledger = ledger_long_at(100.0);
        ledger.track_high(120.0);

        // 13.3% below entry-relative high: trailing stop at 114 triggers.
        let bars = make_bars(&[100.0, 113.9]);
        assert_eq!(rule.evaluate(&bars, 1, &ledger), Signal::Sell);
    }

    #[test]
    fn inside_all_bands_delegates_to_inner() {
        let rule = overlay(StopRules {
            stop_loss: Some(0.05),
            take_profit: Some(0.10),
            trailing_stop: Some(0.08),
        });
        let ledger = ledger_long_at(100.0);
        let bars = make_bars(&[100.0, 101.0]);
        // Inner buy-and-hold holds while long.
        assert_eq!(rule.evaluate(&bars, 1, &ledger), Signal::Hold);
    }

    #[test]
    fn flat_ledger_skips_stop_checks() {
        let rule = overlay(StopRules {
            stop_loss: Some(0.05),
            ..Default::default()
        });
        let ledger = Ledger::new(100_000.0);
        let bars = make_bars(&[100.0, 50.0]);
        // Inner buy-and-hold wants in; the overlay must not veto while flat.
        assert_eq!(rule.evaluate(&bars, 1, &ledger), Signal::Buy);
    }
}
