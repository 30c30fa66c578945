//! Daily JB2006/JB2008 solar and geomagnetic index table.
//!
//! Published indices (SOLFSMY/SOLRESAP) cover everything older than the
//! publication latency; the trailing window is rebuilt from celestrak's
//! space-weather file and the GOME-2B Mg II proxy. Both regimes append to
//! one [`table::IndexTable`], which is then written out as CSV or Parquet.

pub mod assemble;
pub mod calendar;
pub mod config;
pub mod convert;
pub mod emit;
pub mod error;
pub mod feeds;
pub mod fetch;
pub mod rolling;
pub mod table;

pub use assemble::{assemble, assemble_from_paths, Plan, Request};
pub use config::Config;
pub use error::IndexError;
pub use table::{DailyRecord, IndexTable};
