// src/emit/parquet_writer.rs

use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, Float64Array, UInt32Array},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::{arrow::ArrowWriter, basic::Compression, file::properties::WriterProperties};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::Path,
    sync::Arc,
};
use tracing::info;

use super::{samples, Sample, HEADER};
use crate::table::IndexTable;

/// `mjd` and the six solar indices are Float64, ap1..ap8 UInt32.
pub fn schema() -> Schema {
    let fields = HEADER
        .iter()
        .map(|name| {
            let dt = if name.starts_with("ap") {
                DataType::UInt32
            } else {
                DataType::Float64
            };
            Field::new(*name, dt, false)
        })
        .collect::<Vec<_>>();
    Schema::new(fields)
}

fn to_batch(schema: Arc<Schema>, rows: &[Sample]) -> Result<RecordBatch> {
    let float = |f: fn(&Sample) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(rows.iter().map(f)))
    };

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(HEADER.len());
    columns.push(float(|s| s.mjd));
    for k in 0..8 {
        columns.push(Arc::new(UInt32Array::from_iter_values(
            rows.iter().map(|s| s.ap[k]),
        )));
    }
    columns.push(float(|s| s.f10));
    columns.push(float(|s| s.f81));
    columns.push(float(|s| s.s10));
    columns.push(float(|s| s.s10b));
    columns.push(float(|s| s.xm10));
    columns.push(float(|s| s.xm10b));

    RecordBatch::try_new(schema, columns).context("building index record batch")
}

fn write_batch(batch: &RecordBatch, tmp: &Path) -> Result<()> {
    let file = File::create(tmp).with_context(|| format!("creating {}", tmp.display()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(BufWriter::new(file), batch.schema(), Some(props))
        .context("creating Arrow writer")?;
    writer.write(batch).context("writing index batch")?;
    writer.close().context("closing Parquet writer")?;
    Ok(())
}

/// Write the first `rows` days of `table` to a Snappy-compressed Parquet file.
pub fn write_parquet_file(table: &IndexTable, rows: usize, path: &Path) -> Result<()> {
    let batch = to_batch(Arc::new(schema()), &samples(table, rows)?)?;

    let tmp = path.with_extension("parquet.tmp");
    let written = write_batch(&batch, &tmp).and_then(|()| {
        fs::rename(&tmp, path)
            .with_context(|| format!("renaming {} -> {}", tmp.display(), path.display()))
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }

    info!(path = %path.display(), rows, "wrote Parquet");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::tests::small_table;
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
    use tempfile::tempdir;

    #[test]
    fn schema_follows_header() {
        let schema = schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        assert_eq!(names, HEADER.to_vec());
        assert_eq!(schema.field(1).data_type(), &DataType::UInt32);
        assert_eq!(schema.field(9).data_type(), &DataType::Float64);
    }

    #[test]
    fn parquet_round_trip_keeps_values() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("indices.parquet");
        write_parquet_file(&small_table(5), 5, &path)?;

        let file = File::open(&path)?;
        let mut reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batch = reader.next().transpose()?.expect("one batch");
        assert_eq!(batch.num_rows(), 5);

        let f10 = batch
            .column(9)
            .as_any()
            .downcast_ref::<Float64Array>()
            .expect("F10 is Float64");
        assert_eq!(f10.value(4), 154.0);
        let ap8 = batch
            .column(8)
            .as_any()
            .downcast_ref::<UInt32Array>()
            .expect("ap8 is UInt32");
        assert_eq!(ap8.len(), 5);
        assert_eq!(ap8.value(3), 3);
        Ok(())
    }

    #[test]
    fn failed_rename_cleans_up_temp_file() -> Result<()> {
        let dir = tempdir()?;
        // a non-empty directory cannot be replaced by a file
        let path = dir.path().join("indices.parquet");
        fs::create_dir(&path)?;
        fs::write(path.join("keep"), "x")?;

        assert!(write_parquet_file(&small_table(3), 3, &path).is_err());
        assert!(!dir.path().join("indices.parquet.tmp").exists());
        assert!(path.is_dir());
        Ok(())
    }
}
