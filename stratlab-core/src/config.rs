//! Strategy configuration — a closed set of rule variants with typed fields.
//!
//! Unknown strategy names fail at construction time; there is no dynamic
//! parameter bag anywhere. Shared run settings (capital, commission,
//! slippage, stops) live in `BacktestConfig`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from strategy construction and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Per-rule parameters. One variant per signal rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyParams {
    MaCross {
        short_period: usize,
        long_period: usize,
    },
    Momentum {
        lookback: usize,
        /// Fractional return threshold (0.05 = 5%).
        threshold: f64,
    },
    Rsi {
        period: usize,
        oversold: f64,
        overbought: f64,
    },
    BuyAndHold,
}

impl StrategyParams {
    /// Resolve a strategy by name with its default parameters.
    ///
    /// An unrecognized name is a hard error — never a silent fallback to
    /// another strategy.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        match name {
            "ma_cross" => Ok(Self::MaCross {
                short_period: 5,
                long_period: 20,
            }),
            "momentum" => Ok(Self::Momentum {
                lookback: 20,
                threshold: 0.05,
            }),
            "rsi" => Ok(Self::Rsi {
                period: 14,
                oversold: 30.0,
                overbought: 70.0,
            }),
            "buy_and_hold" => Ok(Self::BuyAndHold),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MaCross { .. } => "ma_cross",
            Self::Momentum { .. } => "momentum",
            Self::Rsi { .. } => "rsi",
            Self::BuyAndHold => "buy_and_hold",
        }
    }

    /// Structural validation for direct construction paths (the optimizer
    /// skips invalid combinations instead of calling this).
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            Self::MaCross {
                short_period,
                long_period,
            } => {
                if short_period == 0 {
                    return Err(ConfigError::InvalidParameters(
                        "short_period must be >= 1".into(),
                    ));
                }
                if short_period >= long_period {
                    return Err(ConfigError::InvalidParameters(format!(
                        "short_period {short_period} must be < long_period {long_period}"
                    )));
                }
            }
            Self::Momentum {
                lookback,
                threshold,
            } => {
                if lookback == 0 {
                    return Err(ConfigError::InvalidParameters(
                        "lookback must be >= 1".into(),
                    ));
                }
                if !threshold.is_finite() || threshold < 0.0 {
                    return Err(ConfigError::InvalidParameters(format!(
                        "threshold {threshold} must be a non-negative finite number"
                    )));
                }
            }
            Self::Rsi {
                period,
                oversold,
                overbought,
            } => {
                if period == 0 {
                    return Err(ConfigError::InvalidParameters("period must be >= 1".into()));
                }
                if !(0.0..=100.0).contains(&oversold) || !(0.0..=100.0).contains(&overbought) {
                    return Err(ConfigError::InvalidParameters(
                        "RSI levels must be within [0, 100]".into(),
                    ));
                }
                if oversold >= overbought {
                    return Err(ConfigError::InvalidParameters(format!(
                        "oversold {oversold} must be < overbought {overbought}"
                    )));
                }
            }
            Self::BuyAndHold => {}
        }
        Ok(())
    }
}

/// Stop/target overlay settings. Each field is a fraction of the reference
/// price (0.05 = 5%); unset fields disable that exit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StopRules {
    pub stop_loss: Option<f64>,
    pub take_profit: Option<f64>,
    pub trailing_stop: Option<f64>,
}

impl StopRules {
    pub fn is_empty(&self) -> bool {
        self.stop_loss.is_none() && self.take_profit.is_none() && self.trailing_stop.is_none()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (label, value) in [
            ("stop_loss", self.stop_loss),
            ("take_profit", self.take_profit),
            ("trailing_stop", self.trailing_stop),
        ] {
            if let Some(v) = value {
                if !v.is_finite() || v <= 0.0 || v >= 1.0 {
                    return Err(ConfigError::InvalidParameters(format!(
                        "{label} {v} must be within (0, 1)"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Complete configuration for one simulator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    pub params: StrategyParams,
    #[serde(default)]
    pub stops: Option<StopRules>,
    pub initial_capital: f64,
    pub commission_rate: f64,
    /// Fixed fill-price slippage, applied only by rules that model it.
    pub slippage_rate: f64,
}

impl BacktestConfig {
    pub fn new(params: StrategyParams) -> Self {
        Self {
            params,
            stops: None,
            initial_capital: 100_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.001,
        }
    }

    pub fn with_stops(mut self, stops: StopRules) -> Self {
        self.stops = Some(stops);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.params.validate()?;
        if let Some(stops) = &self.stops {
            stops.validate()?;
        }
        if !self.initial_capital.is_finite() || self.initial_capital <= 0.0 {
            return Err(ConfigError::InvalidParameters(format!(
                "initial_capital {} must be positive",
                self.initial_capital
            )));
        }
        for (label, rate) in [
            ("commission_rate", self.commission_rate),
            ("slippage_rate", self.slippage_rate),
        ] {
            if !rate.is_finite() || rate < 0.0 || rate >= 1.0 {
                return Err(ConfigError::InvalidParameters(format!(
                    "{label} {rate} must be within [0, 1)"
                )));
            }
        }
        Ok(())
    }
}
