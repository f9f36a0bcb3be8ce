//! Parquet loading through arrow record batches.

use std::fs::File;
use std::path::Path;

use arrow::array::{
    Array, ArrayRef, ArrowPrimitiveType, Date32Array, Date64Array, Int64Array, LargeStringArray,
    PrimitiveArray, StringArray,
};
use arrow::datatypes::{
    DataType, TimeUnit, TimestampMicrosecondType, TimestampMillisecondType,
    TimestampNanosecondType, TimestampSecondType,
};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Utc};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use std::collections::BTreeMap;

use super::frame::{Column, FeatureFrame};
use crate::error::{Error, Result};

const SECONDS_PER_DAY: i64 = 86_400;

/// Read a Parquet file into a [`FeatureFrame`].
///
/// Float/int columns become numeric, string columns text, date and
/// timestamp columns timestamps. Other column types are skipped.
pub fn read_parquet(path: &Path) -> Result<FeatureFrame> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .and_then(|builder| builder.build())
        .map_err(|e| Error::Dataset(format!("Failed to open parquet {}: {e}", path.display())))?;

    let mut columns: BTreeMap<String, Column> = BTreeMap::new();
    for batch in reader {
        let batch = batch
            .map_err(|e| Error::Dataset(format!("Failed to read {}: {e}", path.display())))?;
        append_batch(&mut columns, &batch)?;
    }

    FeatureFrame::from_columns(columns)
}

fn append_batch(columns: &mut BTreeMap<String, Column>, batch: &RecordBatch) -> Result<()> {
    let schema = batch.schema();
    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let Some(converted) = convert_array(array)? else {
            tracing::debug!(
                column = %field.name(),
                data_type = ?field.data_type(),
                "skipping unsupported column"
            );
            continue;
        };
        match (columns.get_mut(field.name()), converted) {
            (None, col) => {
                columns.insert(field.name().clone(), col);
            }
            (Some(Column::Numeric(acc)), Column::Numeric(new)) => acc.extend(new),
            (Some(Column::Text(acc)), Column::Text(new)) => acc.extend(new),
            (Some(Column::Timestamp(acc)), Column::Timestamp(new)) => acc.extend(new),
            (Some(existing), new) => {
                return Err(Error::Dataset(format!(
                    "column '{}' changes type between batches ({} → {})",
                    field.name(),
                    existing.type_name(),
                    new.type_name()
                )))
            }
        }
    }
    Ok(())
}

fn downcast<'a, T: 'static>(array: &'a ArrayRef) -> Result<&'a T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        Error::Dataset(format!("Failed to downcast arrow array of type {:?}", array.data_type()))
    })
}

fn numeric<T>(array: &ArrayRef) -> Result<Column>
where
    T: ArrowPrimitiveType,
    T::Native: Into<f64>,
{
    let arr = downcast::<PrimitiveArray<T>>(array)?;
    Ok(Column::Numeric(arr.iter().map(|v| v.map_or(f64::NAN, Into::into)).collect()))
}

fn epoch<T>(array: &ArrayRef, to_utc: fn(i64) -> Option<DateTime<Utc>>) -> Result<Column>
where
    T: ArrowPrimitiveType<Native = i64>,
{
    let arr = downcast::<PrimitiveArray<T>>(array)?;
    Ok(Column::Timestamp(arr.iter().map(|v| v.and_then(to_utc)).collect()))
}

fn convert_array(array: &ArrayRef) -> Result<Option<Column>> {
    let column = match array.data_type() {
        DataType::Float64 => numeric::<arrow::datatypes::Float64Type>(array)?,
        DataType::Float32 => numeric::<arrow::datatypes::Float32Type>(array)?,
        DataType::Int32 => numeric::<arrow::datatypes::Int32Type>(array)?,
        DataType::Int64 => {
            let arr = downcast::<Int64Array>(array)?;
            Column::Numeric(arr.iter().map(|v| v.map_or(f64::NAN, |x| x as f64)).collect())
        }
        DataType::Utf8 => {
            let arr = downcast::<StringArray>(array)?;
            Column::Text(arr.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::LargeUtf8 => {
            let arr = downcast::<LargeStringArray>(array)?;
            Column::Text(arr.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::Dictionary(_, value) if matches!(value.as_ref(), DataType::Utf8) => {
            let cast = arrow::compute::cast(array, &DataType::Utf8)
                .map_err(|e| Error::Dataset(format!("Failed to decode dictionary column: {e}")))?;
            let arr = downcast::<StringArray>(&cast)?;
            Column::Text(arr.iter().map(|v| v.map(str::to_string)).collect())
        }
        DataType::Date32 => {
            let arr = downcast::<Date32Array>(array)?;
            Column::Timestamp(
                arr.iter()
                    .map(|v| {
                        v.and_then(|d| DateTime::from_timestamp(i64::from(d) * SECONDS_PER_DAY, 0))
                    })
                    .collect(),
            )
        }
        DataType::Date64 => {
            let arr = downcast::<Date64Array>(array)?;
            Column::Timestamp(
                arr.iter().map(|v| v.and_then(DateTime::from_timestamp_millis)).collect(),
            )
        }
        DataType::Timestamp(unit, _) => match unit {
            TimeUnit::Second => {
                epoch::<TimestampSecondType>(array, |s| DateTime::from_timestamp(s, 0))?
            }
            TimeUnit::Millisecond => {
                epoch::<TimestampMillisecondType>(array, DateTime::from_timestamp_millis)?
            }
            TimeUnit::Microsecond => {
                epoch::<TimestampMicrosecondType>(array, DateTime::from_timestamp_micros)?
            }
            TimeUnit::Nanosecond => {
                epoch::<TimestampNanosecondType>(array, |ns| {
                    Some(DateTime::from_timestamp_nanos(ns))
                })?
            }
        },
        _ => return Ok(None),
    };
    Ok(Some(column))
}
