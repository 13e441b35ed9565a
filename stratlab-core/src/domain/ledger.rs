//! Ledger — cash/shares accounting for one simulator run.
//!
//! Exclusively owned by a single run; no sharing between symbols. All state
//! transitions preserve the accounting identity
//! `equity == cash + shares * close`, cash never goes negative, and shares
//! is always a whole count.

use chrono::NaiveDate;
use serde::Serialize;

use super::TradeRecord;

/// Mutable run state: cash, position, counters, and the equity curve.
#[derive(Debug, Clone, Serialize)]
pub struct Ledger {
    pub cash: f64,
    pub shares: u64,
    /// Fill price of the open position (0.0 while flat).
    pub entry_price: f64,
    /// Total cash paid to open the position, commission included.
    pub cost_basis: f64,
    /// Highest close observed since entry; drives trailing stops.
    pub highest_price_since_entry: f64,
    pub trades_count: u32,
    pub wins_count: u32,
    /// One value per bar from the rule's warm-up index onward.
    pub equity: Vec<f64>,
    entry_bar: usize,
    entry_date: Option<NaiveDate>,
}

impl Ledger {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            cash: initial_capital,
            shares: 0,
            entry_price: 0.0,
            cost_basis: 0.0,
            highest_price_since_entry: 0.0,
            trades_count: 0,
            wins_count: 0,
            equity: Vec::new(),
            entry_bar: 0,
            entry_date: None,
        }
    }

    pub fn is_long(&self) -> bool {
        self.shares > 0
    }

    /// Open a position: buy as many whole shares as cash affords at
    /// `fill_price` plus commission. Returns false (and records nothing)
    /// when cash does not cover even one share.
    pub fn buy(
        &mut self,
        bar_index: usize,
        date: NaiveDate,
        fill_price: f64,
        commission_rate: f64,
    ) -> bool {
        debug_assert!(!self.is_long(), "buy while long");
        let unit_cost = fill_price * (1.0 + commission_rate);
        if unit_cost <= 0.0 {
            return false;
        }
        let shares = (self.cash / unit_cost).floor() as u64;
        if shares == 0 {
            return false;
        }
        let cost = shares as f64 * unit_cost;
        self.cash -= cost;
        self.shares = shares;
        self.entry_price = fill_price;
        self.cost_basis = cost;
        self.highest_price_since_entry = fill_price;
        self.entry_bar = bar_index;
        self.entry_date = Some(date);
        self.trades_count += 1;
        true
    }

    /// Close the position: sell all shares at `fill_price` minus commission.
    /// Returns the completed round trip, or None while flat.
    pub fn sell(
        &mut self,
        bar_index: usize,
        date: NaiveDate,
        fill_price: f64,
        commission_rate: f64,
    ) -> Option<TradeRecord> {
        if !self.is_long() {
            return None;
        }
        let proceeds = self.shares as f64 * fill_price * (1.0 - commission_rate);
        let won = proceeds > self.cost_basis;
        self.cash += proceeds;
        self.trades_count += 1;
        if won {
            self.wins_count += 1;
        }
        let record = TradeRecord {
            entry_bar: self.entry_bar,
            entry_date: self.entry_date.expect("long position has entry date"),
            entry_price: self.entry_price,
            exit_bar: bar_index,
            exit_date: date,
            exit_price: fill_price,
            shares: self.shares,
            cost_basis: self.cost_basis,
            proceeds,
            won,
        };
        self.shares = 0;
        self.entry_price = 0.0;
        self.cost_basis = 0.0;
        self.highest_price_since_entry = 0.0;
        self.entry_date = None;
        Some(record)
    }

    /// Update the trailing-stop reference with the latest close.
    pub fn track_high(&mut self, close: f64) {
        if self.is_long() && close > self.highest_price_since_entry {
            self.highest_price_since_entry = close;
        }
    }

    /// Mark to market and append to the equity curve.
    pub fn record_equity(&mut self, close: f64) {
        self.equity.push(self.cash + self.shares as f64 * close);
    }

    /// Current mark-to-market value without recording it.
    pub fn equity_at(&self, close: f64) -> f64 {
        self.cash + self.shares as f64 * close
    }
}
