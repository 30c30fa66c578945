// src/calendar.rs

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

/// Offset between Julian Date and Modified Julian Date.
pub const MJD_OFFSET: f64 = 2_400_000.5;

/// MJD 0 is 1858-11-17.
fn mjd_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1858, 11, 17).expect("1858-11-17 is a valid date")
}

/// Modified Julian Date of midnight on `date`.
pub fn to_mjd(date: NaiveDate) -> f64 {
    (date - mjd_epoch()).num_days() as f64
}

/// Julian Date column value → MJD.
pub fn jd_to_mjd(jd: f64) -> f64 {
    jd - MJD_OFFSET
}

/// Parse `"YYYY MM DD"` (any run of spaces between the parts).
pub fn parse_ymd(s: &str) -> Result<NaiveDate> {
    let mut parts = s.split_whitespace();
    let mut next = |what: &str| -> Result<u32> {
        parts
            .next()
            .with_context(|| format!("missing {} in {:?}", what, s))?
            .parse::<u32>()
            .with_context(|| format!("bad {} in {:?}", what, s))
    };
    let year = next("year")?;
    let month = next("month")?;
    let day = next("day")?;
    NaiveDate::from_ymd_opt(year as i32, month, day)
        .with_context(|| format!("{:?} is not a calendar date", s))
}

/// Year + day-of-year, as written in the JB2008 index files.
pub fn from_year_doy(year: i32, doy: u32) -> Option<NaiveDate> {
    NaiveDate::from_yo_opt(year, doy)
}

/// January 1st of the year containing `date`.
pub fn start_of_year(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_yo_opt(date.year(), 1).unwrap_or(date)
}
