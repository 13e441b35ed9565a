//! TradeRecord — a completed round-trip trade.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A complete round-trip: entry fill → exit fill.
///
/// `cost_basis` is the total cash paid at entry (fill price, commission
/// included); `proceeds` is the cash credited at exit. The win flag
/// compares the two, so it already accounts for both commissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub entry_bar: usize,
    pub entry_date: NaiveDate,
    pub entry_price: f64,
    pub exit_bar: usize,
    pub exit_date: NaiveDate,
    pub exit_price: f64,
    pub shares: u64,
    pub cost_basis: f64,
    pub proceeds: f64,
    pub won: bool,
}

impl TradeRecord {
    /// Net profit of the round trip.
    pub fn net_pnl(&self) -> f64 {
        self.proceeds - self.cost_basis
    }

    /// Return on the trade as a fraction of cost basis.
    pub fn return_pct(&self) -> f64 {
        if self.cost_basis <= 0.0 {
            return 0.0;
        }
        self.net_pnl() / self.cost_basis
    }
}
