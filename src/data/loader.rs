//! CSV ingestion for the price repository seam.
//!
//! Expects long-format files with a header: `date,symbol,close` for the
//! universe and `date,close` for the volatility index. This is the external
//! collaborator boundary; everything downstream operates on the in-memory
//! `MarketSnapshot`.

use super::{DataError, PriceSeries};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(value: &str, line: u64) -> Result<NaiveDate, DataError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| DataError::InvalidDate {
        value: value.to_string(),
        line,
    })
}

fn parse_close(value: &str, symbol: &str, line: u64) -> Result<f64, DataError> {
    let trimmed = value.trim();
    // An empty close is a missing observation, not an error.
    if trimmed.is_empty() {
        return Ok(f64::NAN);
    }
    trimmed.parse::<f64>().map_err(|_| DataError::InvalidPrice {
        value: value.to_string(),
        symbol: symbol.to_string(),
        line,
    })
}

/// Load `date,symbol,close` rows into per-symbol series.
///
/// Rows may arrive in any order; each symbol's series is sorted by date.
/// A duplicate (symbol, date) row fails series validation.
pub fn load_universe(path: &Path) -> Result<Vec<PriceSeries>, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut by_symbol: BTreeMap<String, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
    let mut duplicates: Vec<(String, NaiveDate)> = Vec::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let date = parse_date(record.get(0).unwrap_or(""), line)?;
        let symbol = record.get(1).unwrap_or("").trim().to_string();
        let close = parse_close(record.get(2).unwrap_or(""), &symbol, line)?;

        let entry = by_symbol.entry(symbol.clone()).or_default();
        if entry.insert(date, close).is_some() {
            duplicates.push((symbol, date));
        }
    }

    if let Some((symbol, date)) = duplicates.into_iter().next() {
        return Err(DataError::NonMonotonicDates { symbol, date });
    }

    let mut series = Vec::with_capacity(by_symbol.len());
    for (symbol, rows) in by_symbol {
        let (dates, closes): (Vec<NaiveDate>, Vec<f64>) = rows.into_iter().unzip();
        series.push(PriceSeries::new(symbol, dates, closes)?);
    }

    info!(path = %path.display(), symbols = series.len(), "Universe loaded");
    Ok(series)
}

/// Load a single `date,close` series (the volatility index).
pub fn load_index(path: &Path, symbol: &str) -> Result<PriceSeries, DataError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows: BTreeMap<NaiveDate, f64> = BTreeMap::new();

    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let date = parse_date(record.get(0).unwrap_or(""), line)?;
        let close = parse_close(record.get(1).unwrap_or(""), symbol, line)?;
        if rows.insert(date, close).is_some() {
            return Err(DataError::NonMonotonicDates {
                symbol: symbol.to_string(),
                date,
            });
        }
    }

    let (dates, closes): (Vec<NaiveDate>, Vec<f64>) = rows.into_iter().unzip();
    let series = PriceSeries::new(symbol.to_string(), dates, closes)?;
    info!(path = %path.display(), observations = series.len(), "Index series loaded");
    Ok(series)
}
