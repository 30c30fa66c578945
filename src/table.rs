// src/table.rs

use anyhow::Result;
use chrono::{Duration, NaiveDate};

use crate::error::IndexError;

/// One calendar day of indices, as produced by either regime.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    pub mjd: f64,
    pub f10: f64,
    pub f10b: f64,
    pub s10: f64,
    pub s10b: f64,
    pub xm10: f64,
    pub xm10b: f64,
    /// 3-hourly ap, 00–03 UT first.
    pub ap: [u32; 8],
}

/// Parallel per-index sequences, one position per calendar day.
///
/// Append-only. Every push must be the day after the current last day, so
/// position `i` refers to the same day in every sequence.
#[derive(Debug, Clone, Default)]
pub struct IndexTable {
    dates: Vec<NaiveDate>,
    mjd: Vec<f64>,
    f10: Vec<f64>,
    f10b: Vec<f64>,
    s10: Vec<f64>,
    s10b: Vec<f64>,
    xm10: Vec<f64>,
    xm10b: Vec<f64>,
    ap: Vec<[u32; 8]>,
}

impl IndexTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Day the next pushed record must carry.
    pub fn next_date(&self) -> Option<NaiveDate> {
        self.last_date().map(|d| d + Duration::days(1))
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn mjd(&self) -> &[f64] {
        &self.mjd
    }

    pub fn f10(&self) -> &[f64] {
        &self.f10
    }

    pub fn f10b(&self) -> &[f64] {
        &self.f10b
    }

    pub fn s10(&self) -> &[f64] {
        &self.s10
    }

    pub fn s10b(&self) -> &[f64] {
        &self.s10b
    }

    pub fn xm10(&self) -> &[f64] {
        &self.xm10
    }

    pub fn xm10b(&self) -> &[f64] {
        &self.xm10b
    }

    pub fn ap(&self) -> &[[u32; 8]] {
        &self.ap
    }

    /// Append one day. Rejects anything but the immediate next day.
    pub fn push(&mut self, rec: DailyRecord) -> Result<()> {
        if let Some(expected) = self.next_date() {
            if rec.date != expected {
                return Err(IndexError::Discontinuity {
                    expected: crate::calendar::to_mjd(expected),
                    found: crate::calendar::to_mjd(rec.date),
                }
                .into());
            }
        }
        self.dates.push(rec.date);
        self.mjd.push(rec.mjd);
        self.f10.push(rec.f10);
        self.f10b.push(rec.f10b);
        self.s10.push(rec.s10);
        self.s10b.push(rec.s10b);
        self.xm10.push(rec.xm10);
        self.xm10b.push(rec.xm10b);
        self.ap.push(rec.ap);
        Ok(())
    }

    /// Append a batch; on failure the table is left as it was.
    pub fn extend(&mut self, records: Vec<DailyRecord>) -> Result<()> {
        let mut staged = self.clone();
        for rec in records {
            staged.push(rec)?;
        }
        *self = staged;
        Ok(())
    }

    /// Drop every day before `date` (lead-in rows used only for averaging).
    pub fn drop_before(&mut self, date: NaiveDate) {
        let n = self.dates.partition_point(|d| *d < date);
        if n == 0 {
            return;
        }
        self.dates.drain(..n);
        self.mjd.drain(..n);
        self.f10.drain(..n);
        self.f10b.drain(..n);
        self.s10.drain(..n);
        self.s10b.drain(..n);
        self.xm10.drain(..n);
        self.xm10b.drain(..n);
        self.ap.drain(..n);
    }
}
