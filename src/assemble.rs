// src/assemble.rs
//
// Chooses which regime(s) cover a request and threads one table through them.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use tracing::{info, instrument, warn};

use crate::error::IndexError;
use crate::feeds::historical::validate_range;
use crate::feeds::{FeedPaths, HistoricalSource, IndexSource, RecentSource};
use crate::rolling::WINDOW;
use crate::table::IndexTable;

/// Days the JB2008 site lags behind real time.
pub const DEFAULT_LATENCY_DAYS: i64 = 45;

/// A half-open `[start, end)` request, evaluated as of `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub today: NaiveDate,
    pub latency_days: i64,
}

impl Request {
    pub fn new(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> Self {
        Self {
            start,
            end,
            today,
            latency_days: DEFAULT_LATENCY_DAYS,
        }
    }

    /// Rows the finished table must have.
    pub fn days(&self) -> usize {
        (self.end - self.start).num_days().max(0) as usize
    }
}

/// Which regime(s) a request needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// `end` is old enough for published indices only.
    Historical,
    /// Historical `[lead_in, split)`, then recent `[split, end)`.
    Stitched { lead_in: NaiveDate, split: NaiveDate },
}

/// Decide the plan. `epoch` bounds how far back the lead-in can reach.
pub fn plan(req: &Request, epoch: NaiveDate) -> Plan {
    if req.end <= req.today - Duration::days(req.latency_days) {
        return Plan::Historical;
    }
    let split = (req.end - Duration::days(req.latency_days)).max(epoch);
    // 80 trailing samples must precede the first stitched day
    let lead_in = req
        .start
        .min(split - Duration::days(WINDOW as i64 - 1))
        .max(epoch);
    Plan::Stitched {
        lead_in,
        split: split.max(lead_in),
    }
}

/// Build the table for `req` from already-opened sources.
///
/// `recent` is only consulted when the plan is stitched, and is an error to
/// omit then.
#[instrument(level = "info", skip(historical, recent), fields(start = %req.start, end = %req.end))]
pub fn assemble(
    req: &Request,
    historical: &HistoricalSource,
    recent: Option<&dyn IndexSource>,
) -> Result<IndexTable> {
    let epoch = historical.epoch();
    validate_range(req.start, req.end, epoch, req.today - Duration::days(1))?;
    if req.start == req.end {
        info!("empty range, nothing to read");
        return Ok(IndexTable::new());
    }

    let phases: Vec<(&dyn IndexSource, NaiveDate, NaiveDate)> = match plan(req, epoch) {
        Plan::Historical => {
            info!("historical regime only");
            vec![(historical as &dyn IndexSource, req.start, req.end)]
        }
        Plan::Stitched { lead_in, split } => {
            info!(%lead_in, %split, "stitching historical and recent regimes");
            let recent = recent.context("recent-regime feeds are required for this range")?;
            vec![
                (historical as &dyn IndexSource, lead_in, split),
                (recent, split, req.end),
            ]
        }
    };

    let mut table = IndexTable::new();
    for (source, from, to) in phases {
        source
            .extend(&mut table, from, to)
            .with_context(|| format!("{} regime [{}, {})", source.name(), from, to))?;
    }
    table.drop_before(req.start);

    if table.len() != req.days() {
        warn!(rows = table.len(), expected = req.days(), "row count mismatch");
        anyhow::bail!(
            "assembled {} rows for a {}-day request",
            table.len(),
            req.days()
        );
    }
    info!(rows = table.len(), "table assembled");
    Ok(table)
}

/// Open the feeds a request needs from disk and assemble.
///
/// The recent feeds are only opened when the plan needs them and the range
/// holds at least one day.
pub fn assemble_from_paths(req: &Request, paths: &FeedPaths) -> Result<IndexTable> {
    let historical = HistoricalSource::open(&paths.flux, &paths.geomagnetic, req.today)
        .context("opening historical feeds")?;

    let recent = match plan(req, historical.epoch()) {
        Plan::Stitched { .. } if req.start < req.end => Some(
            RecentSource::open(&paths.space_weather, &paths.mgii)
                .context("opening recent feeds")?,
        ),
        _ => None,
    };
    assemble(
        req,
        &historical,
        recent.as_ref().map(|r| r as &dyn IndexSource),
    )
}

/// True when `err` wraps [`IndexError::MissingSource`].
pub fn is_missing_source(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<IndexError>(),
        Some(IndexError::MissingSource { .. })
    )
}
