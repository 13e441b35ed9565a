//! CSV bar loading.
//!
//! Expected columns: date,open,high,low,close,volume,amount (header row
//! required; `amount` may be omitted). Bars must already be ordered
//! ascending by date — the loader validates, it does not sort.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use stratlab_core::domain::{bar::is_ascending, Bar};

#[derive(Debug, Deserialize)]
struct CsvBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volume: u64,
    #[serde(default)]
    amount: f64,
}

/// Load one symbol's bars from a CSV file, optionally bounded to
/// [start, end] inclusive.
pub fn load_bars_csv(
    path: &Path,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<Bar>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut bars = Vec::new();
    for (line, row) in reader.deserialize::<CsvBar>().enumerate() {
        let row = row.with_context(|| format!("{} record {}", path.display(), line + 1))?;
        if start.is_some_and(|s| row.date < s) || end.is_some_and(|e| row.date > e) {
            continue;
        }
        let bar = Bar {
            date: row.date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
            amount: row.amount,
        };
        if !bar.is_sane() {
            bail!(
                "{} record {}: insane OHLC values on {}",
                path.display(),
                line + 1,
                bar.date
            );
        }
        bars.push(bar);
    }

    if bars.is_empty() {
        bail!("{}: no bars in the selected date range", path.display());
    }
    if !is_ascending(&bars) {
        bail!("{}: bars are not ordered ascending by date", path.display());
    }
    Ok(bars)
}
