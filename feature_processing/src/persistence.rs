//! Writers and readers for the processed feature table.
//!
//! CSV carries RFC 3339 UTC timestamps; Parquet stores them as
//! `Timestamp(Microsecond, "UTC")` so downstream readers see a
//! timezone-aware column.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, Float64Array, Int64Array, StringArray, TimestampMicrosecondArray,
};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::FeatureError;
use crate::types::{FEATURE_TABLE_COLUMNS, FeatureRecord, FeatureTable};

const UTC: &str = "UTC";

fn ensure_parent(path: &Path) -> Result<(), FeatureError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

pub fn write_csv(table: &FeatureTable, path: &Path) -> Result<(), FeatureError> {
    ensure_parent(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    // header written by hand so an empty table still gets one
    writer.write_record(FEATURE_TABLE_COLUMNS)?;
    for record in &table.records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    info!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

pub fn read_csv(path: &Path) -> Result<FeatureTable, FeatureError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize::<FeatureRecord>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(FeatureTable::new(records))
}

pub fn feature_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(
            "timestamp",
            DataType::Timestamp(TimeUnit::Microsecond, Some(UTC.into())),
            false,
        ),
        Field::new("open", DataType::Float64, true),
        Field::new("high", DataType::Float64, true),
        Field::new("low", DataType::Float64, true),
        Field::new("close", DataType::Float64, false),
        Field::new("volume", DataType::Float64, false),
        Field::new("stock", DataType::Utf8, false),
        Field::new("rolling_avg_10", DataType::Float64, false),
        Field::new("volume_sum_10", DataType::Float64, false),
        Field::new("target", DataType::Int64, false),
    ]))
}

fn to_record_batch(table: &FeatureTable) -> Result<RecordBatch, FeatureError> {
    let records = &table.records;
    let floats = |f: fn(&FeatureRecord) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(records.iter().map(f)))
    };
    let nullable = |f: fn(&FeatureRecord) -> Option<f64>| -> ArrayRef {
        Arc::new(records.iter().map(f).collect::<Float64Array>())
    };

    let columns: Vec<ArrayRef> = vec![
        Arc::new(
            TimestampMicrosecondArray::from_iter_values(
                records.iter().map(|r| r.timestamp.timestamp_micros()),
            )
            .with_timezone(UTC),
        ),
        nullable(|r| r.open),
        nullable(|r| r.high),
        nullable(|r| r.low),
        floats(|r| r.close),
        floats(|r| r.volume),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.stock.as_str()),
        )),
        floats(|r| r.rolling_avg_10),
        floats(|r| r.volume_sum_10),
        Arc::new(Int64Array::from_iter_values(
            records.iter().map(|r| i64::from(r.target)),
        )),
    ];

    Ok(RecordBatch::try_new(feature_schema(), columns)?)
}

pub fn write_parquet(table: &FeatureTable, path: &Path) -> Result<(), FeatureError> {
    ensure_parent(path)?;
    let batch = to_record_batch(table)?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    info!("Saved {} rows to {}", table.len(), path.display());
    Ok(())
}

fn column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a T, FeatureError> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| FeatureError::InvalidColumn(name.to_string()))
}

fn micros_to_utc(micros: i64) -> Result<DateTime<Utc>, FeatureError> {
    let secs = micros.div_euclid(1_000_000);
    let nanos = (micros.rem_euclid(1_000_000) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).ok_or(FeatureError::InvalidTimestamp(micros))
}

fn from_record_batch(batch: &RecordBatch) -> Result<Vec<FeatureRecord>, FeatureError> {
    let timestamp = column::<TimestampMicrosecondArray>(batch, "timestamp")?;
    let open = column::<Float64Array>(batch, "open")?;
    let high = column::<Float64Array>(batch, "high")?;
    let low = column::<Float64Array>(batch, "low")?;
    let close = column::<Float64Array>(batch, "close")?;
    let volume = column::<Float64Array>(batch, "volume")?;
    let stock = column::<StringArray>(batch, "stock")?;
    let rolling_avg_10 = column::<Float64Array>(batch, "rolling_avg_10")?;
    let volume_sum_10 = column::<Float64Array>(batch, "volume_sum_10")?;
    let target = column::<Int64Array>(batch, "target")?;

    let optional = |array: &Float64Array, i: usize| (!array.is_null(i)).then(|| array.value(i));

    (0..batch.num_rows())
        .map(|i| {
            let label = u8::try_from(target.value(i))
                .ok()
                .filter(|t| *t <= 1)
                .ok_or_else(|| FeatureError::InvalidColumn("target".to_string()))?;
            Ok(FeatureRecord {
                timestamp: micros_to_utc(timestamp.value(i))?,
                open: optional(open, i),
                high: optional(high, i),
                low: optional(low, i),
                close: close.value(i),
                volume: volume.value(i),
                stock: stock.value(i).to_string(),
                rolling_avg_10: rolling_avg_10.value(i),
                volume_sum_10: volume_sum_10.value(i),
                target: label,
            })
        })
        .collect()
}

pub fn read_parquet(path: &Path) -> Result<FeatureTable, FeatureError> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        records.extend(from_record_batch(&batch?)?);
    }
    Ok(FeatureTable::new(records))
}
