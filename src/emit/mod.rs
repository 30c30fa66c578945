// src/emit/mod.rs

use anyhow::Result;

use crate::table::IndexTable;

pub mod csv_writer;
pub mod parquet_writer;

pub use csv_writer::{write_csv, write_csv_file};
pub use parquet_writer::write_parquet_file;

/// Output column order.
pub const HEADER: [&str; 15] = [
    "mjd", "ap1", "ap2", "ap3", "ap4", "ap5", "ap6", "ap7", "ap8", "F10", "F81", "S10", "S10B",
    "XM10", "XM10B",
];

/// One output row.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub mjd: f64,
    pub ap: [u32; 8],
    pub f10: f64,
    pub f81: f64,
    pub s10: f64,
    pub s10b: f64,
    pub xm10: f64,
    pub xm10b: f64,
}

impl Sample {
    /// Text fields in [`HEADER`] order.
    pub fn to_fields(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(HEADER.len());
        out.push(format!("{:.1}", self.mjd));
        out.extend(self.ap.iter().map(u32::to_string));
        for v in [self.f10, self.f81, self.s10, self.s10b, self.xm10, self.xm10b] {
            out.push(format!("{:.1}", v));
        }
        out
    }
}

/// Project the first `rows` days of `table` into samples.
pub fn samples(table: &IndexTable, rows: usize) -> Result<Vec<Sample>> {
    if rows > table.len() {
        anyhow::bail!("asked for {} rows, table holds {}", rows, table.len());
    }
    Ok((0..rows)
        .map(|i| Sample {
            mjd: table.mjd()[i],
            ap: table.ap()[i],
            f10: table.f10()[i],
            f81: table.f10b()[i],
            s10: table.s10()[i],
            s10b: table.s10b()[i],
            xm10: table.xm10()[i],
            xm10b: table.xm10b()[i],
        })
        .collect())
}
