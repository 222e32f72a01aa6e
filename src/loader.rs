use polars::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::domain::TableError;
use crate::table::{ColumnDef, Record, Value};

#[derive(Debug, PartialEq)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// The bundled sample users shown when no file is given.
pub fn users_fixture() -> Vec<Record> {
    [
        (1_i64, "Ajay", 23_i64, "Bhopal"),
        (2, "virat", 35, "delhi"),
        (3, "Rohit", 28, "mumbai"),
        (4, "sachin", 35, "Mumbai"),
        (5, "gill", 22, "badodra"),
        (6, "Modi", 29, "Gujrat"),
        (7, "Jadeja", 31, "delhi"),
        (8, "yuvraj", 27, "Punjab"),
        (9, "harshit", 34, "Gwalior"),
        (10, "Abhinav", 26, "Prayagraj"),
    ]
    .into_iter()
    .map(|(id, name, age, city)| {
        Record::new()
            .with("id", id)
            .with("name", name)
            .with("age", age)
            .with("city", city)
    })
    .collect()
}

pub fn user_columns() -> Vec<ColumnDef> {
    vec![
        ColumnDef::new("id", "ID"),
        ColumnDef::new("name", "Name"),
        ColumnDef::new("age", "Age"),
        ColumnDef::new("city", "City"),
    ]
}

/// Loads a CSV, Parquet or Arrow IPC file. Every file column becomes a table column.
#[instrument]
pub fn load_data_file(path: &str) -> Result<(Vec<Record>, Vec<ColumnDef>), TableError> {
    let expanded = shellexpand::full(path)
        .map_err(|e| TableError::LoadingFailed(format!("Could not expand {path}: {e}")))?;
    let file_info = get_file_info(PathBuf::from(expanded.as_ref()))?;
    debug!("Loading {:?}", file_info);

    let frame = match file_info.file_type {
        FileType::CSV => load_csv(&file_info.path)?,
        FileType::PARQUET => load_parquet(&file_info.path)?,
        FileType::ARROW => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;

    // Each column is converted on its own rayon worker.
    let columns: Vec<(String, Vec<Value>)> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<_, PolarsError>>()?;

    let records = into_records(&columns, df.height());
    let defs = columns
        .iter()
        .map(|(name, _)| ColumnDef::new(name.clone(), name.clone()))
        .collect();

    info!(
        "Loaded {} rows x {} columns from {} ({} bytes) in {}ms",
        records.len(),
        columns.len(),
        file_info.path.display(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );
    Ok((records, defs))
}

fn into_records(columns: &[(String, Vec<Value>)], nrows: usize) -> Vec<Record> {
    let mut records = vec![Record::new(); nrows];
    for (name, values) in columns {
        for (record, value) in records.iter_mut().zip(values) {
            record.set(name.clone(), value.clone());
        }
    }
    records
}

fn is_integer_type(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
    )
}

fn is_float_type(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Float32 | DataType::Float64)
}

// UInt64 columns are only read as integers when every value fits into an i64.
fn fits_in_i64(column: &Column) -> Result<bool, PolarsError> {
    Ok(column
        .u64()?
        .max()
        .is_none_or(|max| max <= i64::MAX as u64))
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<(String, Vec<Value>), PolarsError> {
    let column = df.column(col_name)?;
    let dtype = column.dtype().clone();

    let as_integers = is_integer_type(&dtype)
        || (dtype == DataType::UInt64 && fits_in_i64(column)?);

    let values: Vec<Value> = if as_integers {
        let col = column.cast(&DataType::Int64)?;
        col.i64()?
            .into_iter()
            .map(|v| v.map(Value::Int).unwrap_or(Value::Null))
            .collect()
    } else if is_float_type(&dtype) {
        let col = column.cast(&DataType::Float64)?;
        col.f64()?
            .into_iter()
            .map(|v| v.map(Value::Float).unwrap_or(Value::Null))
            .collect()
    } else {
        let col = column.cast(&DataType::String)?;
        col.str()?
            .into_iter()
            .map(|v| match v {
                Some(s) => Value::Text(s.replace("\r\n", " ↵ ").replace('\n', " ↵ ")),
                None => Value::Null,
            })
            .collect()
    };

    Ok((col_name.to_string(), values))
}

fn detect_file_type(path: &Path) -> Result<FileType, TableError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(TableError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, TableError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => TableError::FileNotFound,
        ErrorKind::PermissionDenied => TableError::PermissionDenied,
        _ => TableError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(TableError::LoadingFailed("Not a file!".into()));
    }

    let file_size = metadata.len();
    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size,
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}
