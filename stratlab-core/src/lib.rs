//! StratLab Core — domain types, signal rules, and the bar-by-bar simulator.
//!
//! This crate contains the heart of the backtesting engine:
//! - Domain types (bars, ledger, trades, signals)
//! - Closed strategy configuration (one enum variant per rule)
//! - Precomputed indicators (SMA, RSI, momentum)
//! - Signal rules and the stop/target overlay
//! - Single-symbol simulator: flat/long state machine over a cash/shares ledger
//! - Deterministic seed derivation for validation fan-outs

pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod rng;
pub mod signals;
