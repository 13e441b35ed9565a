//! Momentum — fractional lookback return.
//!
//! momentum[t] = (close[t] - close[t-period]) / close[t-period]
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Momentum period must be >= 1");
        Self { period }
    }
}

impl Indicator for Momentum {
    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let base = bars[i - self.period].close;
            if base == 0.0 {
                continue; // NaN stays
            }
            result[i] = (bars[i].close - base) / base;
        }

        result
    }
}
