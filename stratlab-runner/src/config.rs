//! TOML run specification for the CLI.
//!
//! A single file describes the strategy, shared run settings, and optional
//! sections for the optimizer grid, walk-forward windows, and Monte Carlo
//! settings:
//!
//! ```toml
//! [strategy]
//! strategy = "ma_cross"
//! short_period = 5
//! long_period = 20
//!
//! [stops]
//! stop_loss = 0.05
//!
//! initial_capital = 100000.0
//! commission_rate = 0.001
//!
//! [grid]
//! strategy = "ma_cross"
//! short_periods = [3, 5, 10]
//! long_periods = [20, 50]
//!
//! [walk_forward]
//! train_window = 252
//! test_window = 63
//!
//! [monte_carlo]
//! n_runs = 500
//! seed = 42
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use stratlab_core::config::{BacktestConfig, ConfigError, StopRules, StrategyParams};

use crate::monte_carlo::MonteCarloConfig;
use crate::optimizer::ParamGrid;
use crate::walk_forward::WalkForwardConfig;

/// Errors from run spec loading.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Invalid(#[from] ConfigError),
}

/// Complete run specification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSpec {
    pub strategy: StrategyParams,
    #[serde(default)]
    pub stops: Option<StopRules>,
    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,
    #[serde(default = "default_slippage_rate")]
    pub slippage_rate: f64,
    #[serde(default)]
    pub grid: Option<ParamGrid>,
    #[serde(default)]
    pub walk_forward: Option<WalkForwardConfig>,
    #[serde(default)]
    pub monte_carlo: Option<MonteCarloConfig>,
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_commission_rate() -> f64 {
    0.001
}

fn default_slippage_rate() -> f64 {
    0.001
}

impl RunSpec {
    /// Parse and validate a spec from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, SpecError> {
        let spec: RunSpec = toml::from_str(text)?;
        spec.to_backtest_config().validate()?;
        Ok(spec)
    }

    /// The simulator-facing configuration.
    pub fn to_backtest_config(&self) -> BacktestConfig {
        BacktestConfig {
            params: self.strategy.clone(),
            stops: self.stops,
            initial_capital: self.initial_capital,
            commission_rate: self.commission_rate,
            slippage_rate: self.slippage_rate,
        }
    }

    /// The grid to optimize over: explicit section, or the strategy's
    /// default ranges.
    pub fn grid(&self) -> Option<ParamGrid> {
        self.grid
            .clone()
            .or_else(|| ParamGrid::default_for(&self.strategy))
    }
}
