//! Price data model: per-instrument daily series and the aligned market
//! snapshot consumed by the walk-forward orchestrator.
//!
//! All series in a snapshot share one trading-date calendar. Missing
//! observations are carried as NaN and mean "no trade decision possible
//! that date" further down the pipeline, never an error.

pub mod loader;
pub mod sector;

use chrono::NaiveDate;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

pub use sector::{same_sector, sector_of, Sector};

#[derive(Error, Debug)]
pub enum DataError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid date '{value}' at line {line}")]
    InvalidDate { value: String, line: u64 },

    #[error("invalid price '{value}' for {symbol} at line {line}")]
    InvalidPrice {
        value: String,
        symbol: String,
        line: u64,
    },

    #[error("series {symbol}: dates must be strictly increasing (violation at {date})")]
    NonMonotonicDates { symbol: String, date: NaiveDate },

    #[error("no common trading dates across the universe")]
    EmptyCalendar,

    #[error("volatility index series is missing or empty")]
    MissingVolatilityIndex,
}

/// Ordered daily price history for one instrument.
///
/// Invariant: dates strictly increasing, no duplicates. NaN closes are
/// allowed and represent missing observations.
#[derive(Debug, Clone)]
pub struct PriceSeries {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub closes: Vec<f64>,
}

impl PriceSeries {
    pub fn new(
        symbol: String,
        dates: Vec<NaiveDate>,
        closes: Vec<f64>,
    ) -> Result<Self, DataError> {
        debug_assert_eq!(dates.len(), closes.len());
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(DataError::NonMonotonicDates {
                    symbol,
                    date: pair[1],
                });
            }
        }
        Ok(Self {
            symbol,
            dates,
            closes,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Immutable, fully materialized view of the universe: aligned close prices,
/// the volatility index on the same calendar, and a sector per symbol.
///
/// Built once before orchestration begins; the orchestrator only ever holds
/// a shared reference.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    /// Common trading-date calendar, strictly increasing.
    pub calendar: Vec<NaiveDate>,
    /// Close series per symbol, each the same length as `calendar`.
    pub closes: HashMap<String, Vec<f64>>,
    /// Volatility index on the same calendar.
    pub vix: Vec<f64>,
    /// Sector per symbol.
    pub sectors: HashMap<String, Sector>,
}

impl MarketSnapshot {
    /// Align a set of per-instrument series and a volatility index series
    /// to their common calendar.
    ///
    /// The calendar is governed by the index series: every index date
    /// within the instruments' overall date span is a calendar date, and
    /// an instrument missing any of those dates gets NaN there. Index
    /// dates outside the span are clipped.
    pub fn build(series: Vec<PriceSeries>, vix: PriceSeries) -> Result<Self, DataError> {
        if vix.is_empty() {
            return Err(DataError::MissingVolatilityIndex);
        }

        let span_start = series.iter().filter_map(|s| s.dates.first()).min().copied();
        let span_end = series.iter().filter_map(|s| s.dates.last()).max().copied();
        let (Some(span_start), Some(span_end)) = (span_start, span_end) else {
            return Err(DataError::EmptyCalendar);
        };

        // Index dates are already strictly increasing.
        let calendar: Vec<NaiveDate> = vix
            .dates
            .iter()
            .copied()
            .filter(|d| (span_start..=span_end).contains(d))
            .collect();
        if calendar.is_empty() {
            return Err(DataError::EmptyCalendar);
        }

        let index_of: HashMap<NaiveDate, usize> = calendar
            .iter()
            .copied()
            .enumerate()
            .map(|(i, d)| (d, i))
            .collect();

        let mut closes: HashMap<String, Vec<f64>> = HashMap::new();
        let mut sectors: HashMap<String, Sector> = HashMap::new();

        for s in series {
            let mut aligned = vec![f64::NAN; calendar.len()];
            let mut present = 0usize;
            for (date, close) in s.dates.iter().zip(s.closes.iter()) {
                if let Some(&i) = index_of.get(date) {
                    aligned[i] = *close;
                    present += 1;
                }
            }
            if present * 2 < calendar.len() {
                warn!(
                    symbol = %s.symbol,
                    present,
                    calendar = calendar.len(),
                    "Symbol covers less than half the calendar, excluding from universe"
                );
                continue;
            }
            sectors.insert(s.symbol.clone(), sector_of(&s.symbol));
            closes.insert(s.symbol, aligned);
        }

        let vix_by_date: HashMap<NaiveDate, f64> = vix
            .dates
            .iter()
            .copied()
            .zip(vix.closes.iter().copied())
            .collect();
        let vix_aligned: Vec<f64> = calendar
            .iter()
            .map(|d| vix_by_date.get(d).copied().unwrap_or(f64::NAN))
            .collect();

        info!(
            symbols = closes.len(),
            calendar_days = calendar.len(),
            start = %calendar[0],
            end = %calendar[calendar.len() - 1],
            "Market snapshot built"
        );

        Ok(Self {
            calendar,
            closes,
            vix: vix_aligned,
            sectors,
        })
    }

    /// Symbols in deterministic (sorted) order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut syms: Vec<&str> = self.closes.keys().map(String::as_str).collect();
        syms.sort_unstable();
        syms
    }

    /// Half-open index range of calendar positions with `start <= date < end`.
    pub fn index_range(&self, start: NaiveDate, end: NaiveDate) -> std::ops::Range<usize> {
        let lo = self.calendar.partition_point(|d| *d < start);
        let hi = self.calendar.partition_point(|d| *d < end);
        lo..hi
    }

    pub fn first_date(&self) -> NaiveDate {
        self.calendar[0]
    }

    pub fn last_date(&self) -> NaiveDate {
        self.calendar[self.calendar.len() - 1]
    }
}
