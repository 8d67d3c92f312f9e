// 🧱 Columnar Snapshot - the written row file, re-stored as parquet
//
// Same trip as the SQLite snapshot: the closed row file is read back and
// written as one record batch, one Arrow column per output header field.

use crate::db::load_output_csv;
use crate::deal::{OutputRow, OUTPUT_HEADER};
use anyhow::{Context, Result};
use arrow_array::{ArrayRef, RecordBatch, StringArray, UInt32Array, UInt64Array};
use arrow_schema::{DataType, Field as ArrowField, Schema};
use parquet::arrow::ArrowWriter;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Arrow schema of the output table, in header order
pub fn output_schema() -> Schema {
    let fields = OUTPUT_HEADER
        .iter()
        .map(|name| {
            let data_type = match *name {
                "ROW_NO" | "RowHash" => DataType::UInt64,
                "ProcessIdentifier" => DataType::UInt32,
                _ => DataType::Utf8,
            };
            ArrowField::new(*name, data_type, false)
        })
        .collect::<Vec<_>>();

    Schema::new(fields)
}

fn text_column<F>(rows: &[OutputRow], field: F) -> ArrayRef
where
    F: Fn(&OutputRow) -> &str,
{
    Arc::new(StringArray::from(rows.iter().map(field).collect::<Vec<_>>()))
}

/// Build a single record batch holding every row
pub fn rows_to_batch(rows: &[OutputRow]) -> Result<RecordBatch> {
    let row_numbers = UInt64Array::from(rows.iter().map(|r| r.row_no as u64).collect::<Vec<_>>());
    let as_of_dates = StringArray::from(
        rows.iter()
            .map(|r| r.as_of_date.to_string())
            .collect::<Vec<_>>(),
    );
    let process_ids = UInt32Array::from(
        rows.iter()
            .map(|r| r.process_identifier)
            .collect::<Vec<_>>(),
    );
    let hashes = UInt64Array::from(rows.iter().map(|r| r.row_hash).collect::<Vec<_>>());

    let columns: Vec<ArrayRef> = vec![
        Arc::new(row_numbers),
        text_column(rows, |r| r.deal_name.as_str()),
        text_column(rows, |r| r.d1.as_str()),
        text_column(rows, |r| r.d2.as_str()),
        text_column(rows, |r| r.d3.as_str()),
        text_column(rows, |r| r.d4.as_str()),
        text_column(rows, |r| r.d5.as_str()),
        text_column(rows, |r| r.is_active.as_str()),
        text_column(rows, |r| r.country.as_str()),
        text_column(rows, |r| r.currency.as_str()),
        text_column(rows, |r| r.company.as_str()),
        text_column(rows, |r| r.company_name.as_str()),
        Arc::new(as_of_dates),
        Arc::new(process_ids),
        Arc::new(hashes),
    ];

    RecordBatch::try_new(Arc::new(output_schema()), columns)
        .context("Failed to build output record batch")
}

pub fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create parquet file: {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)
        .with_context(|| format!("Failed to open parquet writer: {}", path.display()))?;
    writer
        .write(batch)
        .with_context(|| format!("Failed to write record batch: {}", path.display()))?;
    writer
        .close()
        .with_context(|| format!("Failed to close parquet writer: {}", path.display()))?;
    Ok(())
}

/// Load the row file into a parquet file. Returns rows stored.
pub fn write_columnar_snapshot(csv_path: &Path, parquet_path: &Path) -> Result<usize> {
    let rows = load_output_csv(csv_path)?;
    let batch = rows_to_batch(&rows)?;
    write_parquet(parquet_path, &batch)?;

    tracing::debug!("Stored {} rows in {}", batch.num_rows(), parquet_path.display());
    Ok(batch.num_rows())
}
