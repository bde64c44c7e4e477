use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use arrow::array::{Array, ArrayRef, AsArray, Float64Array, Int64Array};
use arrow::datatypes::{
    DataType, Field, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    Schema, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use super::model::{Column, ColumnData, Table};
use crate::error::{DatasetError, Result};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a columnar table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.arrow` / `.feather` / `.ipc` – Arrow IPC file (Feather v2)
/// * `.parquet` / `.pq`             – Parquet
/// * `.csv`                         – header row, numeric cells
///
/// `name` is the logical file name used in error messages
/// (`data.arrow`, `label.arrow`).
pub fn load_table(path: &Path, name: &str) -> Result<Table> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DatasetError::NotFound {
            name: name.to_string(),
            path: path.to_path_buf(),
        },
        _ => DatasetError::load_failed(name, path, e),
    })?;

    let table = match extension(path).as_str() {
        "arrow" | "feather" | "ipc" => load_ipc(file),
        "parquet" | "pq" => load_parquet(file),
        "csv" => load_csv(file),
        other => Err(anyhow!("unsupported file extension: .{other}")),
    }
    .map_err(|e| DatasetError::load_failed(name, path, format!("{e:#}")))?;

    let rows = table
        .num_rows()
        .map_err(|e| DatasetError::load_failed(name, path, e))?;
    log::info!(
        "loaded {name} from {}: {rows} rows, columns [{}]",
        path.display(),
        table.column_names().join(", ")
    );
    Ok(table)
}

/// Write a table in the format its extension names (`.arrow`-family or
/// `.parquet`). This is the output contract of the offline ETL step.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("table");
    write_batch(path, table).map_err(|e| DatasetError::load_failed(name, path, format!("{e:#}")))
}

fn write_batch(path: &Path, table: &Table) -> anyhow::Result<()> {
    let batch = to_record_batch(table)?;
    let ext = extension(path);
    if !matches!(ext.as_str(), "arrow" | "feather" | "ipc" | "parquet" | "pq") {
        bail!("unsupported file extension: .{ext}");
    }
    let file = File::create(path).context("creating file")?;

    if matches!(ext.as_str(), "parquet" | "pq") {
        let mut writer =
            ArrowWriter::try_new(file, batch.schema(), None).context("creating parquet writer")?;
        writer.write(&batch).context("writing parquet batch")?;
        writer.close().context("closing parquet writer")?;
    } else {
        let mut writer = FileWriter::try_new(file, &batch.schema()).context("creating IPC writer")?;
        writer.write(&batch).context("writing IPC batch")?;
        writer.finish().context("finishing IPC file")?;
    }
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// Arrow IPC / Parquet loaders
// ---------------------------------------------------------------------------

fn load_ipc(file: File) -> anyhow::Result<Table> {
    let reader = FileReader::try_new(file, None).context("reading IPC footer")?;
    collect_batches(reader.map(|b| b.context("reading IPC record batch")))
}

fn load_parquet(file: File) -> anyhow::Result<Table> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?
        .build()
        .context("building parquet reader")?;
    collect_batches(reader.map(|b| b.context("reading parquet record batch")))
}

/// Concatenate record batches column-wise into one [`Table`].
fn collect_batches<I>(batches: I) -> anyhow::Result<Table>
where
    I: Iterator<Item = anyhow::Result<RecordBatch>>,
{
    let mut columns: Vec<Column> = Vec::new();

    for batch in batches {
        let batch = batch?;
        let schema = batch.schema();

        if columns.is_empty() {
            columns = schema
                .fields()
                .iter()
                .zip(batch.columns())
                .map(|(field, array)| -> anyhow::Result<Column> {
                    let data = extract_column(array)
                        .with_context(|| format!("column '{}'", field.name()))?;
                    Ok(Column {
                        name: field.name().clone(),
                        data,
                    })
                })
                .collect::<anyhow::Result<_>>()?;
            continue;
        }

        if schema.fields().len() != columns.len() {
            bail!(
                "record batch has {} columns, expected {}",
                schema.fields().len(),
                columns.len()
            );
        }
        for (col, array) in columns.iter_mut().zip(batch.columns()) {
            let more = extract_column(array).with_context(|| format!("column '{}'", col.name))?;
            match (&mut col.data, more) {
                (ColumnData::Int(dst), ColumnData::Int(src)) => dst.extend(src),
                (ColumnData::Float(dst), ColumnData::Float(src)) => dst.extend(src),
                _ => bail!("column '{}' changes type between batches", col.name),
            }
        }
    }

    Ok(Table::new(columns))
}

// -- Arrow helpers --

macro_rules! int_values {
    ($col:expr, $ty:ty) => {{
        let arr = $col
            .as_primitive_opt::<$ty>()
            .ok_or_else(|| anyhow!("expected {:?} array", $col.data_type()))?;
        if arr.null_count() > 0 {
            bail!("{} null values in integer column", arr.null_count());
        }
        arr.values()
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                i64::try_from(v).map_err(|_| anyhow!("row {row}: value {v} does not fit in i64"))
            })
            .collect::<anyhow::Result<Vec<i64>>>()?
    }};
}

/// Widen any integer or float Arrow array to a [`ColumnData`].
fn extract_column(col: &ArrayRef) -> anyhow::Result<ColumnData> {
    let data = match col.data_type() {
        DataType::Int8 => ColumnData::Int(int_values!(col, Int8Type)),
        DataType::Int16 => ColumnData::Int(int_values!(col, Int16Type)),
        DataType::Int32 => ColumnData::Int(int_values!(col, Int32Type)),
        DataType::Int64 => ColumnData::Int(int_values!(col, Int64Type)),
        DataType::UInt8 => ColumnData::Int(int_values!(col, UInt8Type)),
        DataType::UInt16 => ColumnData::Int(int_values!(col, UInt16Type)),
        DataType::UInt32 => ColumnData::Int(int_values!(col, UInt32Type)),
        DataType::UInt64 => ColumnData::Int(int_values!(col, UInt64Type)),
        DataType::Float32 => {
            let arr = col
                .as_primitive_opt::<Float32Type>()
                .context("expected Float32 array")?;
            ColumnData::Float(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
        }
        DataType::Float64 => {
            let arr = col
                .as_primitive_opt::<Float64Type>()
                .context("expected Float64 array")?;
            ColumnData::Float(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
        }
        other => bail!("unsupported column type {other:?}"),
    };
    Ok(data)
}

fn to_record_batch(table: &Table) -> anyhow::Result<RecordBatch> {
    let mut fields = Vec::with_capacity(table.columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len());
    for col in &table.columns {
        match &col.data {
            ColumnData::Int(v) => {
                fields.push(Field::new(&col.name, DataType::Int64, false));
                arrays.push(Arc::new(Int64Array::from(v.clone())));
            }
            ColumnData::Float(v) => {
                fields.push(Field::new(&col.name, DataType::Float64, true));
                arrays.push(Arc::new(Float64Array::from(v.clone())));
            }
        }
    }
    RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays).context("building record batch")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one numeric value per cell.
/// A column is integer when every cell parses as `i64`, float otherwise.
/// Empty cells are NaN and force the column to float.
fn load_csv(file: File) -> anyhow::Result<Table> {
    let mut reader = csv::Reader::from_reader(file);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} cells, expected {}",
                record.len(),
                headers.len()
            );
        }
        for (col, value) in cells.iter_mut().zip(record.iter()) {
            col.push(value.trim().to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, values)| -> anyhow::Result<Column> {
            let data = parse_csv_column(&values).with_context(|| format!("CSV column '{name}'"))?;
            Ok(Column { name, data })
        })
        .collect::<anyhow::Result<_>>()?;
    Ok(Table::new(columns))
}

fn parse_csv_column(values: &[String]) -> anyhow::Result<ColumnData> {
    if let Ok(ints) = values
        .iter()
        .map(|s| s.parse::<i64>())
        .collect::<std::result::Result<Vec<i64>, _>>()
    {
        return Ok(ColumnData::Int(ints));
    }
    values
        .iter()
        .enumerate()
        .map(|(row, s)| {
            if s.is_empty() {
                return Ok(f64::NAN);
            }
            s.parse::<f64>()
                .map_err(|_| anyhow!("row {row}: '{s}' is not a number"))
        })
        .collect::<anyhow::Result<Vec<f64>>>()
        .map(ColumnData::Float)
}
