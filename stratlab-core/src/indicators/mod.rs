//! Precomputed indicator series.
//!
//! Indicators are computed once over the full bar slice before the bar loop
//! starts; the simulator's inner loop then reads plain `f64` slices. Values
//! before an indicator's warm-up are NaN.

pub mod momentum;
pub mod rsi;
pub mod sma;

pub use momentum::Momentum;
pub use rsi::Rsi;
pub use sma::Sma;

use crate::domain::Bar;

/// A single-series indicator over close prices.
pub trait Indicator {
    /// Bars consumed before the first valid value.
    fn lookback(&self) -> usize;

    /// Compute the full series; indices before warm-up are NaN.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for the first bar),
/// high/low bracket open and close, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
                amount: close * 1000.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}
