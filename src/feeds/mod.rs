// src/feeds/mod.rs
//
// Row-level access to the four text feeds and the `IndexSource` seam shared
// by the historical and recent regimes.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::error::IndexError;
use crate::table::IndexTable;

pub mod historical;
pub mod recent;

pub use historical::HistoricalSource;
pub use recent::RecentSource;

/// Something that can append a contiguous run of days to an [`IndexTable`].
pub trait IndexSource {
    /// Short label used in logs and errors.
    fn name(&self) -> &'static str;

    /// Append every day in `[from, to)` to `table`.
    ///
    /// `table` must be empty or end on the day before `from`. On error the
    /// table is unchanged.
    fn extend(&self, table: &mut IndexTable, from: NaiveDate, to: NaiveDate) -> Result<()>;
}

/// Locations of the four feeds on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPaths {
    /// SOLFSMY.TXT
    pub flux: PathBuf,
    /// SOLRESAP.TXT
    pub geomagnetic: PathBuf,
    /// celestrak SW-Last5Years.txt
    pub space_weather: PathBuf,
    /// GOME-2B Mg II classic index
    pub mgii: PathBuf,
}

/// One text line of a feed, split on whitespace.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub feed: &'static str,
    /// 1-based line number within the feed.
    pub line: usize,
    pub text: String,
    fields: Vec<String>,
}

impl RawRecord {
    pub fn new(feed: &'static str, line: usize, text: &str) -> Self {
        Self {
            feed,
            line,
            text: text.to_string(),
            fields: text.split_whitespace().map(str::to_string).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn malformed(&self, reason: String) -> anyhow::Error {
        IndexError::MalformedRecord {
            feed: self.feed.to_string(),
            line: self.line,
            reason,
        }
        .into()
    }

    /// Field at zero-based position `pos`.
    pub fn field(&self, pos: usize) -> Result<&str> {
        self.fields
            .get(pos)
            .map(String::as_str)
            .ok_or_else(|| self.malformed(format!("no field {} (row has {})", pos, self.len())))
    }

    pub fn last_field(&self) -> Result<&str> {
        self.fields
            .last()
            .map(String::as_str)
            .ok_or_else(|| self.malformed("empty row".to_string()))
    }

    pub fn f64_at(&self, pos: usize) -> Result<f64> {
        let raw = self.field(pos)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("field {} {:?} is not a number", pos, raw)))
    }

    pub fn u32_at(&self, pos: usize) -> Result<u32> {
        let raw = self.field(pos)?;
        raw.parse()
            .map_err(|_| self.malformed(format!("field {} {:?} is not an integer", pos, raw)))
    }

    /// Eight consecutive integer fields starting at `first`.
    pub fn ap_octet(&self, first: usize) -> Result<[u32; 8]> {
        let mut ap = [0u32; 8];
        for (i, slot) in ap.iter_mut().enumerate() {
            *slot = self.u32_at(first + i)?;
        }
        Ok(ap)
    }

    /// Characters `range` of the raw line, if the line is long enough.
    pub fn columns(&self, range: std::ops::Range<usize>) -> Option<&str> {
        self.text.get(range)
    }
}

/// Rows of a feed keyed by the calendar day they describe.
pub type DatedRows = BTreeMap<NaiveDate, RawRecord>;

/// Read every line of the feed at `path`.
///
/// A missing file is reported as [`IndexError::MissingSource`]. The file is
/// closed before this returns.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IndexError::MissingSource {
                path: path.to_path_buf(),
            }
            .into())
        }
        Err(e) => return Err(e).with_context(|| format!("opening {}", path.display())),
    };
    BufReader::new(file)
        .lines()
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("reading {}", path.display()))
}

/// Index the data rows of a feed by date.
///
/// The first `header_lines` lines are skipped unconditionally. After that,
/// `date_of` decides: `Ok(Some(day))` keeps the row, `Ok(None)` skips it as
/// commentary, `Err` aborts. A day seen twice is malformed.
pub fn index_by_date<F>(
    feed: &'static str,
    content: &str,
    header_lines: usize,
    date_of: F,
) -> Result<DatedRows>
where
    F: Fn(&RawRecord) -> Result<Option<NaiveDate>>,
{
    let mut rows = DatedRows::new();
    let mut skipped = 0usize;
    for (idx, line) in content.lines().enumerate().skip(header_lines) {
        if line.trim().is_empty() {
            continue;
        }
        let rec = RawRecord::new(feed, idx + 1, line);
        match date_of(&rec)? {
            Some(day) => {
                if rows.contains_key(&day) {
                    return Err(rec.malformed(format!("second row for {}", day)));
                }
                rows.insert(day, rec);
            }
            None => skipped += 1,
        }
    }
    debug!(feed, rows = rows.len(), skipped, "indexed feed");
    Ok(rows)
}

/// Row for `day`, or [`IndexError::MissingDay`].
pub fn row_for<'a>(rows: &'a DatedRows, feed: &'static str, day: NaiveDate) -> Result<&'a RawRecord> {
    rows.get(&day).ok_or_else(|| {
        IndexError::MissingDay {
            feed: feed.to_string(),
            date: day,
        }
        .into()
    })
}

/// Every day in `[from, to)`.
pub fn days(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d < to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn fields_are_addressed_by_position() -> Result<()> {
        let rec = RawRecord::new("test", 7, "  1997   1 2450449.5  72.4  x");
        assert_eq!(rec.len(), 5);
        assert_eq!(rec.field(1)?, "1");
        assert_eq!(rec.f64_at(2)?, 2450449.5);
        assert_eq!(rec.u32_at(0)?, 1997);
        assert_eq!(rec.last_field()?, "x");
        assert_eq!(rec.columns(2..6), Some("1997"));
        assert_eq!(rec.columns(2..600), None);
        Ok(())
    }

    #[test]
    fn bad_fields_report_feed_and_line() {
        let rec = RawRecord::new("SOLFSMY", 12, "1997 1 abc");
        let err = rec.f64_at(2).unwrap_err();
        match err.downcast_ref::<IndexError>() {
            Some(IndexError::MalformedRecord { feed, line, .. }) => {
                assert_eq!(feed, "SOLFSMY");
                assert_eq!(*line, 12);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(rec.field(9).is_err());
        assert!(rec.ap_octet(0).is_err());
    }

    #[test]
    fn missing_file_is_missing_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.txt");
        let err = read_lines(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<IndexError>(),
            Some(&IndexError::MissingSource { path })
        );
    }

    #[test]
    fn reads_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("feed.txt");
        let mut f = File::create(&path)?;
        writeln!(f, "a b")?;
        writeln!(f, "c d")?;
        drop(f);
        assert_eq!(read_lines(&path)?, vec!["a b", "c d"]);
        Ok(())
    }

    #[test]
    fn index_by_date_skips_header_and_rejects_duplicates() {
        let day_of = |rec: &RawRecord| -> Result<Option<NaiveDate>> {
            Ok(rec
                .u32_at(0)
                .ok()
                .and_then(|d| NaiveDate::from_ymd_opt(2020, 1, d)))
        };
        let content = "header 1\n3 a\n\n# note\n4 b\n";
        let rows = index_by_date("t", content, 1, day_of).unwrap();
        assert_eq!(rows.len(), 2);
        let jan4 = NaiveDate::from_ymd_opt(2020, 1, 4).unwrap();
        assert_eq!(row_for(&rows, "t", jan4).unwrap().line, 5);
        assert!(row_for(&rows, "t", jan4.succ_opt().unwrap()).is_err());

        assert!(index_by_date("t", "3 a\n3 b\n", 0, day_of).is_err());
    }

    #[test]
    fn days_is_half_open() {
        let a = NaiveDate::from_ymd_opt(2020, 2, 28).unwrap();
        let b = NaiveDate::from_ymd_opt(2020, 3, 2).unwrap();
        assert_eq!(days(a, b).count(), 3);
        assert_eq!(days(a, a).count(), 0);
    }
}
