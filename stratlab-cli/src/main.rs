//! StratLab CLI — run, optimize, validate, and batch backtests.
//!
//! Commands:
//! - `run` — single backtest over one CSV bar file
//! - `optimize` — exhaustive grid search
//! - `walk-forward` — rolling train/test re-optimization
//! - `monte-carlo` — synthetic-path validation
//! - `batch` — one run per CSV file in a directory, pooled or sequential
//!
//! Every command prints a JSON report (with percentage-formatted mirrors)
//! to stdout, or writes it to `--output`.

mod data;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;

use stratlab_core::config::{BacktestConfig, StopRules, StrategyParams};
use stratlab_runner::{
    run_batch_backtests, run_monte_carlo, run_strategy, run_walk_forward, BacktestReport,
    BatchConfig, BatchProgress, BatchReport, ExecutionMode, MonteCarloConfig, MonteCarloReport,
    OptimizationReport, ParamGrid, PriceStore, RunSpec, WalkForwardConfig, WalkForwardReport,
};

#[derive(Parser)]
#[command(name = "stratlab", about = "StratLab CLI — strategy backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Arguments shared by every subcommand.
#[derive(clap::Args)]
struct CommonArgs {
    /// TOML run spec. Flags below override its scalar settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Strategy name: ma_cross, momentum, rsi, buy_and_hold.
    #[arg(long)]
    strategy: Option<String>,

    /// Start date bound (YYYY-MM-DD), inclusive.
    #[arg(long)]
    start: Option<NaiveDate>,

    /// End date bound (YYYY-MM-DD), inclusive.
    #[arg(long)]
    end: Option<NaiveDate>,

    #[arg(long)]
    initial_capital: Option<f64>,

    #[arg(long)]
    commission: Option<f64>,

    #[arg(long)]
    slippage: Option<f64>,

    // ── Per-strategy parameter overrides ──
    #[arg(long)]
    short_period: Option<usize>,

    #[arg(long)]
    long_period: Option<usize>,

    #[arg(long)]
    lookback: Option<usize>,

    #[arg(long)]
    threshold: Option<f64>,

    #[arg(long)]
    period: Option<usize>,

    #[arg(long)]
    oversold: Option<f64>,

    #[arg(long)]
    overbought: Option<f64>,

    // ── Stop/target overlay ──
    #[arg(long)]
    stop_loss: Option<f64>,

    #[arg(long)]
    take_profit: Option<f64>,

    #[arg(long)]
    trailing_stop: Option<f64>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single backtest over one CSV bar file.
    Run {
        /// CSV file: date,open,high,low,close,volume,amount.
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Exhaustive grid search over the strategy's parameter ranges.
    Optimize {
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Disable the rayon sweep.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Rolling walk-forward validation with per-window re-optimization.
    WalkForward {
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Train window in bars.
        #[arg(long)]
        train_window: Option<usize>,

        /// Test window in bars.
        #[arg(long)]
        test_window: Option<usize>,
    },
    /// Monte Carlo validation over synthetic price paths.
    MonteCarlo {
        #[arg(long)]
        data: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Number of synthetic runs.
        #[arg(long)]
        runs: Option<usize>,

        /// RNG master seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// One backtest per CSV file in a directory (symbol = file stem).
    Batch {
        /// Directory of per-symbol CSV files.
        #[arg(long)]
        data_dir: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Execution mode: sequential or distributed.
        #[arg(long, default_value = "distributed")]
        mode: String,

        /// Worker threads in distributed mode (0 = one per CPU).
        #[arg(long, default_value_t = 0)]
        workers: usize,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { data, common } => {
            let config = resolve_config(&common)?;
            let bars = data::load_bars_csv(&data, common.start, common.end)?;
            let result = run_strategy(&bars, &config)?;
            emit(&BacktestReport::from_result(&result), &common.output)
        }
        Commands::Optimize {
            data,
            common,
            sequential,
        } => {
            let config = resolve_config(&common)?;
            let grid = resolve_grid(&common, &config.params)?;
            let bars = data::load_bars_csv(&data, common.start, common.end)?;
            let result = stratlab_runner::optimize(&bars, &config, &grid, !sequential)?;
            emit(&OptimizationReport::from_result(&result), &common.output)
        }
        Commands::WalkForward {
            data,
            common,
            train_window,
            test_window,
        } => {
            let config = resolve_config(&common)?;
            let grid = resolve_grid(&common, &config.params)?;
            let spec_wf = load_spec(&common)?.and_then(|s| s.walk_forward);
            let wf = WalkForwardConfig {
                train_window: train_window
                    .or(spec_wf.as_ref().map(|w| w.train_window))
                    .unwrap_or(252),
                test_window: test_window
                    .or(spec_wf.as_ref().map(|w| w.test_window))
                    .unwrap_or(63),
            };
            let bars = data::load_bars_csv(&data, common.start, common.end)?;
            let result = run_walk_forward(&bars, &config, &grid, &wf)?;
            emit(&WalkForwardReport::from_result(&result), &common.output)
        }
        Commands::MonteCarlo {
            data,
            common,
            runs,
            seed,
        } => {
            let config = resolve_config(&common)?;
            let spec_mc = load_spec(&common)?.and_then(|s| s.monte_carlo);
            let defaults = MonteCarloConfig::default();
            let mc = MonteCarloConfig {
                n_runs: runs
                    .or(spec_mc.as_ref().map(|m| m.n_runs))
                    .unwrap_or(defaults.n_runs),
                seed: seed
                    .or(spec_mc.as_ref().map(|m| m.seed))
                    .unwrap_or(defaults.seed),
            };
            let bars = data::load_bars_csv(&data, common.start, common.end)?;
            let summary = run_monte_carlo(&bars, &config, &mc)?;
            emit(&MonteCarloReport::from_summary(&summary), &common.output)
        }
        Commands::Batch {
            data_dir,
            common,
            mode,
            workers,
        } => {
            let config = resolve_config(&common)?;
            let (store, symbols) = load_store(&data_dir, common.start, common.end)?;
            let batch = BatchConfig {
                mode: parse_mode(&mode)?,
                workers,
                ..Default::default()
            };
            let progress = |p: &BatchProgress| {
                log::info!("batch progress: {}/{} ({} failed)", p.completed, p.total, p.failed);
            };
            let outcomes =
                run_batch_backtests(&store, &symbols, &config, &batch, Some(&progress))?;
            emit(&BatchReport::from_outcomes(&outcomes), &common.output)
        }
    }
}

/// Resolve the run configuration: TOML spec first, flag overrides second.
fn resolve_config(common: &CommonArgs) -> Result<BacktestConfig> {
    let mut config = match (load_spec(common)?, &common.strategy) {
        (Some(spec), _) => spec.to_backtest_config(),
        (None, Some(name)) => BacktestConfig::new(StrategyParams::from_name(name)?),
        (None, None) => bail!("either --config or --strategy is required"),
    };

    // A --strategy flag next to --config replaces the spec's strategy.
    if common.config.is_some() {
        if let Some(name) = &common.strategy {
            config.params = StrategyParams::from_name(name)?;
        }
    }

    apply_param_overrides(&mut config.params, common);

    let stops = StopRules {
        stop_loss: common.stop_loss.or(config.stops.and_then(|s| s.stop_loss)),
        take_profit: common
            .take_profit
            .or(config.stops.and_then(|s| s.take_profit)),
        trailing_stop: common
            .trailing_stop
            .or(config.stops.and_then(|s| s.trailing_stop)),
    };
    config.stops = (!stops.is_empty()).then_some(stops);

    if let Some(capital) = common.initial_capital {
        config.initial_capital = capital;
    }
    if let Some(commission) = common.commission {
        config.commission_rate = commission;
    }
    if let Some(slippage) = common.slippage {
        config.slippage_rate = slippage;
    }

    config.validate()?;
    Ok(config)
}

fn load_spec(common: &CommonArgs) -> Result<Option<RunSpec>> {
    let Some(path) = &common.config else {
        return Ok(None);
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(Some(RunSpec::from_toml_str(&text)?))
}

fn apply_param_overrides(params: &mut StrategyParams, common: &CommonArgs) {
    match params {
        StrategyParams::MaCross {
            short_period,
            long_period,
        } => {
            if let Some(v) = common.short_period {
                *short_period = v;
            }
            if let Some(v) = common.long_period {
                *long_period = v;
            }
        }
        StrategyParams::Momentum {
            lookback,
            threshold,
        } => {
            if let Some(v) = common.lookback {
                *lookback = v;
            }
            if let Some(v) = common.threshold {
                *threshold = v;
            }
        }
        StrategyParams::Rsi {
            period,
            oversold,
            overbought,
        } => {
            if let Some(v) = common.period {
                *period = v;
            }
            if let Some(v) = common.oversold {
                *oversold = v;
            }
            if let Some(v) = common.overbought {
                *overbought = v;
            }
        }
        StrategyParams::BuyAndHold => {}
    }
}

fn resolve_grid(common: &CommonArgs, params: &StrategyParams) -> Result<ParamGrid> {
    if let Some(spec) = load_spec(common)? {
        if let Some(grid) = spec.grid() {
            return Ok(grid);
        }
    }
    ParamGrid::default_for(params)
        .with_context(|| format!("strategy '{}' has no parameter space", params.name()))
}

fn parse_mode(mode: &str) -> Result<ExecutionMode> {
    match mode {
        "sequential" => Ok(ExecutionMode::Sequential),
        "distributed" => Ok(ExecutionMode::Distributed),
        other => bail!("unknown execution mode '{other}' (sequential|distributed)"),
    }
}

/// Load every CSV in a directory into the shared price store.
fn load_store(
    dir: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(PriceStore, Vec<String>)> {
    let mut store = PriceStore::new();
    let mut symbols = Vec::new();

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
        .collect();
    paths.sort();

    for path in paths {
        let symbol = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(str::to_uppercase)
            .unwrap_or_default();
        match data::load_bars_csv(&path, start, end) {
            Ok(bars) => store.insert(symbol.clone(), bars),
            Err(error) => {
                // Broken files still get a result slot: store an empty
                // series so the batch records the failure per symbol.
                log::warn!("{symbol}: {error}");
                store.insert(symbol.clone(), Vec::new());
            }
        }
        symbols.push(symbol);
    }

    if symbols.is_empty() {
        bail!("no CSV files found in {}", dir.display());
    }
    Ok((store, symbols))
}

/// Serialize a report to pretty JSON on stdout or into `--output`.
fn emit<T: Serialize>(report: &T, output: &Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json).with_context(|| format!("writing {}", path.display()))?;
            log::info!("report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
