// src/error.rs

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Domain failures of table assembly.
///
/// Functions in this crate return `anyhow::Result`; these variants travel
/// inside the `anyhow::Error` so callers can `downcast_ref::<IndexError>()`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum IndexError {
    #[error("date {date} outside the valid range {earliest} .. {latest}")]
    OutOfRangeDate {
        date: NaiveDate,
        earliest: NaiveDate,
        latest: NaiveDate,
    },

    #[error("start date {start} is after end date {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("source feed not found: {}", path.display())]
    MissingSource { path: PathBuf },

    #[error("rolling average needs {needed} samples, only {available} available")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("feed {feed} has no row for {date}")]
    MissingDay { feed: String, date: NaiveDate },

    #[error("feed {feed}, line {line}: {reason}")]
    MalformedRecord {
        feed: String,
        line: usize,
        reason: String,
    },

    #[error("table expected a row for MJD {expected}, got {found}")]
    Discontinuity { expected: f64, found: f64 },
}
