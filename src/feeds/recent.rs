// src/feeds/recent.rs
//
// Days inside the publication latency: F10 and ap from celestrak's
// space-weather file, S10/XM10 derived from the GOME-2B Mg II index.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use std::path::Path;
use tracing::{debug, info, instrument};

use super::{days, index_by_date, read_lines, row_for, DatedRows, IndexSource, RawRecord};
use crate::calendar::{parse_ymd, to_mjd};
use crate::convert::{mg2_to_m10, mg2_to_s10};
use crate::error::IndexError;
use crate::rolling::{weighted_average, WINDOW};
use crate::table::{DailyRecord, IndexTable};

pub const SPACE_WEATHER_FEED: &str = "SW-Last5Years";
pub const MGII_FEED: &str = "GOME2B-MgII";

// SW-Last5Years columns
const SW_AP_FIRST: usize = 14;
const SW_F10: usize = 26;
const SW_F81: usize = 28;

/// Rows start with `YYYY MM DD`; `BEGIN OBSERVED`, `DATATYPE` and the like do not.
fn space_weather_date(rec: &RawRecord) -> Result<Option<NaiveDate>> {
    Ok(rec.columns(0..10).and_then(|s| parse_ymd(s).ok()))
}

/// Year in chars 1..5, `MM DD` in chars 13..18.
fn mgii_date(rec: &RawRecord) -> Result<Option<NaiveDate>> {
    let (Some(year), Some(month_day)) = (rec.columns(1..5), rec.columns(13..18)) else {
        return Ok(None);
    };
    Ok(parse_ymd(&format!("{} {}", year, month_day)).ok())
}

/// Proxy-derived indices for the trailing latency window.
#[derive(Debug, Clone)]
pub struct RecentSource {
    space_weather: DatedRows,
    mgii: DatedRows,
}

impl RecentSource {
    #[instrument(level = "info", skip_all, fields(space_weather = %space_weather.display(), mgii = %mgii.display()))]
    pub fn open(space_weather: &Path, mgii: &Path) -> Result<Self> {
        let sw_text = read_lines(space_weather)?.join("\n");
        let mgii_text = read_lines(mgii)?.join("\n");
        Self::from_text(&sw_text, &mgii_text)
    }

    pub fn from_text(space_weather: &str, mgii: &str) -> Result<Self> {
        let space_weather = index_by_date(SPACE_WEATHER_FEED, space_weather, 0, space_weather_date)
            .context("indexing space-weather rows")?;
        let mgii =
            index_by_date(MGII_FEED, mgii, 0, mgii_date).context("indexing Mg II rows")?;
        info!(
            sw_rows = space_weather.len(),
            mgii_rows = mgii.len(),
            "recent feeds loaded"
        );
        Ok(Self {
            space_weather,
            mgii,
        })
    }

    /// First and last day present in both feeds.
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = (*self.space_weather.keys().next()?).max(*self.mgii.keys().next()?);
        let last = (*self.space_weather.keys().last()?).min(*self.mgii.keys().last()?);
        (first <= last).then_some((first, last))
    }
}

/// Growing copy of one index's tail, long enough for the next average.
struct Trail {
    values: Vec<f64>,
}

impl Trail {
    fn new(history: &[f64]) -> Self {
        let keep = history.len().min(WINDOW - 1);
        Self {
            values: history[history.len() - keep..].to_vec(),
        }
    }

    /// Push today's value and return its weighted average.
    fn push(&mut self, value: f64) -> Result<f64> {
        self.values.push(value);
        let avg = weighted_average(&self.values, self.values.len() - 1)?;
        if self.values.len() >= WINDOW {
            self.values.remove(0);
        }
        Ok(avg)
    }
}

impl IndexSource for RecentSource {
    fn name(&self) -> &'static str {
        "recent"
    }

    #[instrument(level = "info", skip(self, table), fields(source = self.name()))]
    fn extend(&self, table: &mut IndexTable, from: NaiveDate, to: NaiveDate) -> Result<()> {
        if let Some(next) = table.next_date() {
            if next != from {
                anyhow::bail!("recent regime starts at {} but table ends before {}", from, next);
            }
        }

        if from < to {
            let last = to - Duration::days(1);
            match self.coverage() {
                Some((first, latest)) if from < first || last > latest => {
                    let date = if from < first { from } else { last };
                    return Err(IndexError::OutOfRangeDate {
                        date,
                        earliest: first,
                        latest,
                    })
                    .context("recent feeds do not cover the latency window");
                }
                Some(_) => {}
                None => anyhow::bail!("space-weather and Mg II feeds share no days"),
            }
        }

        let mut s10_trail = Trail::new(table.s10());
        let mut xm10_trail = Trail::new(table.xm10());
        let mut records = Vec::new();

        for day in days(from, to) {
            let sw = row_for(&self.space_weather, SPACE_WEATHER_FEED, day)?;
            let mg = row_for(&self.mgii, MGII_FEED, day)?;
            let mgii: f64 = mg.last_field()?.parse().with_context(|| {
                format!("{} line {}: Mg II value is not a number", MGII_FEED, mg.line)
            })?;

            let s10 = mg2_to_s10(mgii);
            let xm10 = mg2_to_m10(mgii);
            let s10b = s10_trail.push(s10).with_context(|| format!("S10B for {}", day))?;
            let xm10b = xm10_trail.push(xm10).with_context(|| format!("XM10B for {}", day))?;
            debug!(%day, mgii, s10, s10b, xm10, xm10b, "derived indices");

            records.push(DailyRecord {
                date: day,
                mjd: to_mjd(day),
                f10: sw.f64_at(SW_F10)?,
                f10b: sw.f64_at(SW_F81)?,
                s10,
                s10b,
                xm10,
                xm10b,
                ap: sw.ap_octet(SW_AP_FIRST)?,
            });
        }

        let n = records.len();
        table.extend(records)?;
        info!(rows = n, "recent rows appended");
        Ok(())
    }
}
