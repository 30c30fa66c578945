// src/emit/csv_writer.rs

use anyhow::{Context, Result};
use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path,
};
use tracing::info;

use super::{samples, HEADER};
use crate::table::IndexTable;

/// Write header + the first `rows` days of `table` as CSV.
pub fn write_csv<W: Write>(table: &IndexTable, rows: usize, out: W) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    wtr.write_record(HEADER).context("writing CSV header")?;
    for (i, sample) in samples(table, rows)?.iter().enumerate() {
        wtr.write_record(sample.to_fields())
            .with_context(|| format!("writing CSV row {}", i))?;
    }
    wtr.flush().context("flushing CSV")?;
    Ok(())
}

/// Write to `path` via a temp file + rename. The temp file never outlives a
/// failed write.
pub fn write_csv_file(table: &IndexTable, rows: usize, path: &Path) -> Result<()> {
    let tmp_path = path.with_extension("csv.tmp");
    let written = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))
        .and_then(|file| write_csv(table, rows, BufWriter::new(file)))
        .and_then(|()| {
            fs::rename(&tmp_path, path).with_context(|| {
                format!("renaming {} -> {}", tmp_path.display(), path.display())
            })
        });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e);
    }
    info!(path = %path.display(), rows, "wrote CSV");
    Ok(())
}
