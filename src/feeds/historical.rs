// src/feeds/historical.rs
//
// JB2008 published indices: SOLFSMY.TXT (solar) + SOLRESAP.TXT (ap).

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use std::path::Path;
use tracing::{info, instrument, trace};

use super::{days, index_by_date, read_lines, row_for, DatedRows, IndexSource, RawRecord};
use crate::calendar::{from_year_doy, jd_to_mjd, start_of_year};
use crate::error::IndexError;
use crate::table::{DailyRecord, IndexTable};

pub const FLUX_FEED: &str = "SOLFSMY";
pub const GEOMAGNETIC_FEED: &str = "SOLRESAP";

/// Metadata lines at the top of both files.
pub const HEADER_LINES: usize = 4;

// SOLFSMY columns
const FLUX_JD: usize = 2;
const FLUX_F10: usize = 3;
const FLUX_F81: usize = 4;
const FLUX_S10: usize = 5;
const FLUX_S81: usize = 6;
const FLUX_M10: usize = 7;
const FLUX_M81: usize = 8;

// SOLRESAP columns 3..=10
const GEO_AP_FIRST: usize = 3;

/// `YYYY DDD` in the first two fields. Anything else is commentary.
fn year_doy(rec: &RawRecord) -> Result<Option<NaiveDate>> {
    if rec.field(0).map(|f| f.starts_with('#')).unwrap_or(true) {
        return Ok(None);
    }
    let (Ok(year), Ok(doy)) = (rec.field(0)?.parse::<i32>(), rec.u32_at(1)) else {
        return Ok(None);
    };
    Ok(from_year_doy(year, doy))
}

/// Precomputed indices for dates old enough to be published.
#[derive(Debug, Clone)]
pub struct HistoricalSource {
    flux: DatedRows,
    geomagnetic: DatedRows,
    epoch: NaiveDate,
    today: NaiveDate,
}

impl HistoricalSource {
    /// Read both feeds from disk. `today` anchors the one-day latency check.
    #[instrument(level = "info", skip_all, fields(flux = %flux.display(), geomagnetic = %geomagnetic.display()))]
    pub fn open(flux: &Path, geomagnetic: &Path, today: NaiveDate) -> Result<Self> {
        let flux_text = read_lines(flux)?.join("\n");
        let geo_text = read_lines(geomagnetic)?.join("\n");
        Self::from_text(&flux_text, &geo_text, today)
    }

    /// Parse both feeds from memory.
    pub fn from_text(flux: &str, geomagnetic: &str, today: NaiveDate) -> Result<Self> {
        let flux = index_by_date(FLUX_FEED, flux, HEADER_LINES, year_doy)
            .context("indexing SOLFSMY rows")?;
        let geomagnetic = index_by_date(GEOMAGNETIC_FEED, geomagnetic, HEADER_LINES, year_doy)
            .context("indexing SOLRESAP rows")?;

        // epoch: January 1st of the year of the first flux row
        let first = *flux
            .keys()
            .next()
            .with_context(|| format!("{} has no data rows", FLUX_FEED))?;
        let epoch = start_of_year(first);
        info!(%epoch, flux_rows = flux.len(), ap_rows = geomagnetic.len(), "historical feeds loaded");

        Ok(Self {
            flux,
            geomagnetic,
            epoch,
            today,
        })
    }

    /// Earliest date the feeds can represent.
    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Latest permitted (exclusive) end date.
    pub fn latest(&self) -> NaiveDate {
        self.today - Duration::days(1)
    }

    /// Range checks on a requested `[start, end)`.
    pub fn validate(&self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        validate_range(start, end, self.epoch, self.latest())
    }

    fn record_for(&self, day: NaiveDate) -> Result<DailyRecord> {
        let flux = row_for(&self.flux, FLUX_FEED, day)?;
        let geo = row_for(&self.geomagnetic, GEOMAGNETIC_FEED, day)?;
        trace!(%day, flux_line = flux.line, ap_line = geo.line, "merging rows");
        Ok(DailyRecord {
            date: day,
            mjd: jd_to_mjd(flux.f64_at(FLUX_JD)?),
            f10: flux.f64_at(FLUX_F10)?,
            f10b: flux.f64_at(FLUX_F81)?,
            s10: flux.f64_at(FLUX_S10)?,
            s10b: flux.f64_at(FLUX_S81)?,
            xm10: flux.f64_at(FLUX_M10)?,
            xm10b: flux.f64_at(FLUX_M81)?,
            ap: geo.ap_octet(GEO_AP_FIRST)?,
        })
    }
}

/// `earliest <= start <= end <= latest`, else the matching [`IndexError`].
pub fn validate_range(
    start: NaiveDate,
    end: NaiveDate,
    earliest: NaiveDate,
    latest: NaiveDate,
) -> Result<()> {
    for date in [start, end] {
        if date < earliest || date > latest {
            return Err(IndexError::OutOfRangeDate {
                date,
                earliest,
                latest,
            }
            .into());
        }
    }
    if start > end {
        return Err(IndexError::InvertedRange { start, end }.into());
    }
    Ok(())
}

impl IndexSource for HistoricalSource {
    fn name(&self) -> &'static str {
        "historical"
    }

    #[instrument(level = "info", skip(self, table), fields(source = self.name()))]
    fn extend(&self, table: &mut IndexTable, from: NaiveDate, to: NaiveDate) -> Result<()> {
        self.validate(from, to)?;

        let records = days(from, to)
            .map(|day| self.record_for(day))
            .collect::<Result<Vec<_>>>()?;
        let n = records.len();
        table.extend(records)?;
        info!(rows = n, "historical rows appended");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn epoch() -> NaiveDate {
        NaiveDate::from_ymd_opt(1997, 1, 1).unwrap()
    }

    /// SOLFSMY-shaped text, one row per day from 1997-01-01, F10 = day number.
    pub(crate) fn flux_text(days: usize) -> String {
        let mut s = String::from(
            "# SOLFSMY.TXT\n# test\n#\n# YYYY DDD   JulianDay  F10   F81c  S10   S81c  M10   M81c  Y10   Y81c  Ssrc\n",
        );
        for i in 0..days {
            let date = epoch() + Duration::days(i as i64);
            let jd = 2450449.5 + i as f64;
            let f10 = (i + 1) as f64;
            s.push_str(&format!(
                "  {} {:>3} {:.1} {:5.1} {:5.1} {:5.1} {:5.1} {:5.1} {:5.1}  70.0  71.0 4---\n",
                date.format("%Y"),
                date.format("%j").to_string().trim_start_matches('0'),
                jd,
                f10,
                f10 + 100.5,
                60.0,
                61.0 + i as f64 * 0.1,
                50.0,
                52.0,
            ));
        }
        s
    }

    /// SOLRESAP-shaped text, 23 rows of the previous year first.
    pub(crate) fn geomagnetic_text(days: usize) -> String {
        let mut s = String::from("# SOLRESAP.TXT\n# test\n#\n# YYYY DDD  F10 ap...\n");
        for i in -23..days as i64 {
            let date = epoch() + Duration::days(i);
            let base = (i.rem_euclid(10)) as u32;
            s.push_str(&format!(
                "  {} {:>3}  0 {} {} {} {} {} {} {} {}\n",
                date.format("%Y"),
                date.format("%j").to_string().trim_start_matches('0'),
                base,
                base + 1,
                base + 2,
                base + 3,
                base + 4,
                base + 5,
                base + 6,
                base + 7,
            ));
        }
        s
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn source(days: usize) -> HistoricalSource {
        HistoricalSource::from_text(&flux_text(days), &geomagnetic_text(days), today()).unwrap()
    }

    #[test]
    fn epoch_is_january_first_of_first_row() {
        assert_eq!(source(10).epoch(), epoch());
    }

    #[test]
    fn reads_requested_days_by_date() -> Result<()> {
        let src = source(100);
        let mut table = IndexTable::new();
        let from = epoch() + Duration::days(10);
        src.extend(&mut table, from, from + Duration::days(5))?;

        assert_eq!(table.len(), 5);
        assert_eq!(table.f10(), &[11.0, 12.0, 13.0, 14.0, 15.0]);
        assert_eq!(table.f10b()[0], 111.5);
        assert_eq!(table.mjd()[0], 50459.0);
        assert_eq!(table.ap()[0], [0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(table.s10b()[1], 62.1);
        Ok(())
    }

    #[test]
    fn geomagnetic_prefix_rows_do_not_shift_alignment() -> Result<()> {
        let src = source(30);
        let mut table = IndexTable::new();
        src.extend(&mut table, epoch(), epoch() + Duration::days(1))?;
        // day 0 in the ap feed is i = 0 → base 0
        assert_eq!(table.ap()[0][0], 0);
        assert_eq!(table.f10()[0], 1.0);
        Ok(())
    }

    #[test]
    fn start_before_epoch_is_out_of_range() {
        let src = source(10);
        let mut table = IndexTable::new();
        let err = src
            .extend(&mut table, epoch() - Duration::days(1), epoch() + Duration::days(2))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IndexError>(),
            Some(IndexError::OutOfRangeDate { .. })
        ));
    }

    #[test]
    fn end_at_today_is_out_of_range() {
        let src = source(10);
        let mut table = IndexTable::new();
        let err = src.extend(&mut table, epoch(), today()).unwrap_err();
        assert_eq!(
            err.downcast_ref::<IndexError>(),
            Some(&IndexError::OutOfRangeDate {
                date: today(),
                earliest: epoch(),
                latest: today() - Duration::days(1),
            })
        );
    }

    #[test]
    fn inverted_and_empty_ranges() -> Result<()> {
        let src = source(10);
        let mut table = IndexTable::new();
        let a = epoch() + Duration::days(3);
        let err = src.extend(&mut table, a, epoch()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<IndexError>(),
            Some(IndexError::InvertedRange { .. })
        ));
        src.extend(&mut table, a, a)?;
        assert!(table.is_empty());
        Ok(())
    }

    #[test]
    fn day_missing_from_feed_is_reported() {
        let src = source(10);
        let mut table = IndexTable::new();
        let err = src
            .extend(&mut table, epoch(), epoch() + Duration::days(20))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<IndexError>(),
            Some(&IndexError::MissingDay {
                feed: FLUX_FEED.to_string(),
                date: epoch() + Duration::days(10),
            })
        );
        assert!(table.is_empty());
    }
}
