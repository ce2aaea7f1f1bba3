use std::fs::File;
use std::io::Read;
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::error::DataLoadError;
use super::model::{ColumnDef, ColumnType, Dataset, Row, Schema, Value};

// ---------------------------------------------------------------------------
// Load options and report
// ---------------------------------------------------------------------------

/// How strictly malformed rows are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Skip ragged or undecodable rows instead of failing the whole load.
    /// Skipped rows are listed in the [`LoadReport`].
    pub tolerate_malformed_rows: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line in the source (record index for JSON).
    pub line: u64,
    pub reason: String,
}

/// Accepted vs. rejected row counts of one load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub accepted: usize,
    pub rejected: Vec<RejectedRow>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row followed by data rows
/// * `.json`    – `[{ "City": "Lagos", "Salary": 100 }, ...]`
/// * `.parquet` – flat string / integer / float / boolean columns
pub fn load_file(path: &Path, options: LoadOptions) -> Result<Dataset, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(open(path)?, options),
        "json" => {
            let mut text = String::new();
            open(path)?
                .read_to_string(&mut text)
                .map_err(|source| DataLoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
            load_json(&text, options)
        }
        "parquet" | "pq" => load_parquet(open(path)?),
        other => Err(DataLoadError::UnsupportedFormat(other.to_string())),
    }?;

    log::info!(
        "Loaded {} rows x {} columns from {}",
        dataset.len(),
        dataset.schema().len(),
        path.display()
    );
    Ok(dataset)
}

fn open(path: &Path) -> Result<File, DataLoadError> {
    File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Read CSV from any byte stream. The first record names the columns;
/// column types are inferred from the data.
pub fn load_csv<R: Read>(source: R, options: LoadOptions) -> Result<Dataset, DataLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(options.tolerate_malformed_rows)
        .from_reader(source);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.is_empty() {
        return Err(DataLoadError::MissingHeader);
    }

    let mut records = Vec::new();
    let mut report = LoadReport::default();

    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e)
                if options.tolerate_malformed_rows
                    && matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) =>
            {
                let line = e.position().map(|p| p.line()).unwrap_or(0);
                reject(&mut report, line, e.to_string());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        // Only reachable in tolerant mode: strict readers fail on unequal lengths.
        if record.len() != headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            reject(
                &mut report,
                line,
                format!("expected {} fields but found {}", headers.len(), record.len()),
            );
            continue;
        }
        records.push(record);
    }
    report.accepted = records.len();

    let columns: Vec<ColumnDef> = headers
        .into_iter()
        .enumerate()
        .map(|(i, name)| ColumnDef {
            name,
            ty: infer_column_type(records.iter().map(|r| r.get(i).unwrap_or(""))),
        })
        .collect();
    let schema = Schema::new(columns)?;

    let rows = records
        .iter()
        .map(|record| Row {
            values: record
                .iter()
                .zip(schema.columns())
                .map(|(cell, def)| parse_cell(cell, def.ty))
                .collect(),
        })
        .collect();

    Dataset::new(schema, rows, report)
}

fn reject(report: &mut LoadReport, line: u64, reason: String) {
    log::warn!("Skipping malformed row at line {line}: {reason}");
    report.rejected.push(RejectedRow { line, reason });
}

/// Narrowest type every non-empty cell parses as.
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnType {
    let mut ty = None;
    for cell in cells.map(str::trim).filter(|c| !c.is_empty()) {
        let cell_ty = if cell.parse::<i64>().is_ok() {
            ColumnType::Integer
        } else if cell.parse::<f64>().is_ok() {
            ColumnType::Float
        } else {
            return ColumnType::String;
        };
        ty = Some(match (ty, cell_ty) {
            (Some(ColumnType::Float), _) | (_, ColumnType::Float) => ColumnType::Float,
            _ => ColumnType::Integer,
        });
    }
    ty.unwrap_or(ColumnType::String)
}

fn parse_cell(cell: &str, ty: ColumnType) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match ty {
        ColumnType::Integer => trimmed.parse().map(Value::Integer).unwrap_or(Value::Null),
        ColumnType::Float => trimmed.parse().map(Value::Float).unwrap_or(Value::Null),
        ColumnType::String => Value::String(cell.to_string()),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "country_name": "Ghana", "year": 1995, "v2x_libdem": 0.41 },
///   ...
/// ]
/// ```
///
/// Keys missing from a record are null. Nested values are kept as JSON text.
pub fn load_json(text: &str, options: LoadOptions) -> Result<Dataset, DataLoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or_else(|| DataLoadError::InvalidRecord {
        index: 0,
        reason: "expected a top-level JSON array".to_string(),
    })?;

    let mut report = LoadReport::default();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        match rec.as_object() {
            Some(obj) => objects.push(obj),
            None if options.tolerate_malformed_rows => {
                reject(&mut report, i as u64 + 1, "record is not a JSON object".to_string());
            }
            None => {
                return Err(DataLoadError::InvalidRecord {
                    index: i,
                    reason: "record is not a JSON object".to_string(),
                })
            }
        }
    }
    report.accepted = objects.len();

    // Column order: first appearance across records.
    let mut names: Vec<String> = Vec::new();
    for obj in &objects {
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }
    if names.is_empty() && !objects.is_empty() {
        return Err(DataLoadError::MissingHeader);
    }

    let columns: Vec<ColumnDef> = names
        .iter()
        .map(|name| ColumnDef {
            name: name.clone(),
            ty: infer_json_type(objects.iter().filter_map(|obj| obj.get(name))),
        })
        .collect();
    let schema = Schema::new(columns)?;

    let rows = objects
        .iter()
        .map(|obj| Row {
            values: schema
                .columns()
                .iter()
                .map(|def| obj.get(&def.name).map_or(Value::Null, |v| json_to_value(v, def.ty)))
                .collect(),
        })
        .collect();

    Dataset::new(schema, rows, report)
}

fn infer_json_type<'a>(values: impl Iterator<Item = &'a JsonValue>) -> ColumnType {
    let mut ty = None;
    for val in values.filter(|v| !v.is_null()) {
        let val_ty = match val {
            JsonValue::Number(n) if n.is_i64() => ColumnType::Integer,
            JsonValue::Number(_) => ColumnType::Float,
            _ => return ColumnType::String,
        };
        ty = Some(match (ty, val_ty) {
            (Some(ColumnType::Float), _) | (_, ColumnType::Float) => ColumnType::Float,
            _ => ColumnType::Integer,
        });
    }
    ty.unwrap_or(ColumnType::String)
}

fn json_to_value(val: &JsonValue, ty: ColumnType) -> Value {
    match (val, ty) {
        (JsonValue::Null, _) => Value::Null,
        (JsonValue::Number(n), ColumnType::Integer) => {
            n.as_i64().map_or(Value::Null, Value::Integer)
        }
        (JsonValue::Number(n), ColumnType::Float) => n.as_f64().map_or(Value::Null, Value::Float),
        (JsonValue::String(s), _) => Value::String(s.clone()),
        (other, _) => Value::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing a flat table.
///
/// Integer columns of any width map to `Integer`, float columns to `Float`,
/// string, boolean and categorical columns to `String`. Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`), including their dictionary-encoded categoricals
/// and Polars' `Utf8View` strings.
pub fn load_parquet(file: File) -> Result<Dataset, DataLoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let columns = builder
        .schema()
        .fields()
        .iter()
        .map(|field| {
            let ty = column_type_for(field.data_type()).ok_or_else(|| {
                DataLoadError::UnsupportedColumnType {
                    column: field.name().clone(),
                    data_type: format!("{:?}", field.data_type()),
                }
            })?;
            Ok(ColumnDef {
                name: field.name().clone(),
                ty,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;
    let schema = Schema::new(columns)?;

    let reader = builder.build()?;
    let mut rows = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;
        let cells: Vec<Vec<Value>> = batch
            .columns()
            .iter()
            .zip(schema.columns())
            .map(|(array, def)| column_to_values(array, def))
            .collect::<Result<_, _>>()?;

        for row in 0..batch.num_rows() {
            rows.push(Row {
                values: cells.iter().map(|col| col[row].clone()).collect(),
            });
        }
    }

    let report = LoadReport {
        accepted: rows.len(),
        rejected: Vec::new(),
    };
    Dataset::new(schema, rows, report)
}

// -- Arrow helpers --

/// Column type an Arrow type is read as. Dictionary columns take the type
/// of their values.
fn column_type_for(data_type: &DataType) -> Option<ColumnType> {
    match data_type {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View | DataType::Boolean => {
            Some(ColumnType::String)
        }
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => Some(ColumnType::Integer),
        DataType::Float32 | DataType::Float64 => Some(ColumnType::Float),
        DataType::Dictionary(_, values) => column_type_for(values),
        _ => None,
    }
}

/// Convert one Arrow column into typed values by casting to the widest
/// Arrow type of its [`ColumnType`].
fn column_to_values(array: &ArrayRef, def: &ColumnDef) -> Result<Vec<Value>, DataLoadError> {
    let mismatch = || DataLoadError::UnsupportedColumnType {
        column: def.name.clone(),
        data_type: format!("{:?}", array.data_type()),
    };

    let values = match def.ty {
        ColumnType::Integer => {
            let cast_array = cast(array, &DataType::Int64)?;
            let ints = cast_array.as_primitive_opt::<Int64Type>().ok_or_else(mismatch)?;
            ints.iter().map(|v| v.map_or(Value::Null, Value::Integer)).collect()
        }
        ColumnType::Float => {
            let cast_array = cast(array, &DataType::Float64)?;
            let floats = cast_array.as_primitive_opt::<Float64Type>().ok_or_else(mismatch)?;
            floats.iter().map(|v| v.map_or(Value::Null, Value::Float)).collect()
        }
        ColumnType::String => {
            let cast_array = cast(array, &DataType::Utf8)?;
            let strings = cast_array.as_string_opt::<i32>().ok_or_else(mismatch)?;
            strings
                .iter()
                .map(|v| v.map_or(Value::Null, |s| Value::String(s.to_string())))
                .collect()
        }
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::array::{DictionaryArray, StringViewArray};
    use arrow::datatypes::Int32Type;

    use super::*;

    const SALARY_CSV: &str = "\
Name,City,Salary,Year
Ada,Lagos,100,1988
Kofi,Lagos,200,2001
Ama,Accra,150.5,1995
";

    #[test]
    fn test_csv_infers_column_types() {
        let ds = load_csv(SALARY_CSV.as_bytes(), LoadOptions::default()).unwrap();
        let types: Vec<ColumnType> = ds.schema().columns().iter().map(|c| c.ty).collect();
        assert_eq!(
            types,
            vec![
                ColumnType::String,
                ColumnType::String,
                ColumnType::Float,
                ColumnType::Integer
            ]
        );
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.value(0, "Salary").unwrap(), &Value::Float(100.0));
        assert_eq!(ds.value(2, "Year").unwrap(), &Value::Integer(1995));
        assert!(ds.report().is_clean());
        assert_eq!(ds.report().accepted, 3);
    }

    #[test]
    fn test_csv_empty_cells_are_null() {
        let csv = "City,Year\nLagos,\n,2001\n";
        let ds = load_csv(csv.as_bytes(), LoadOptions::default()).unwrap();
        assert_eq!(ds.schema().column_type("Year"), Ok(ColumnType::Integer));
        assert_eq!(ds.value(0, "Year").unwrap(), &Value::Null);
        assert_eq!(ds.value(1, "City").unwrap(), &Value::Null);
    }

    #[test]
    fn test_csv_ragged_row_fails_strict_load() {
        let csv = "City,Salary,Year\nLagos,100,1988\nAccra,150\n";
        let err = load_csv(csv.as_bytes(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Csv(_)));
    }

    #[test]
    fn test_csv_ragged_row_reported_in_tolerant_mode() {
        let csv = "City,Salary,Year\nLagos,100,1988\nAccra,150\nLagos,200,2001\n";
        let options = LoadOptions {
            tolerate_malformed_rows: true,
        };
        let ds = load_csv(csv.as_bytes(), options).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.report().accepted, 2);
        assert_eq!(ds.report().rejected.len(), 1);
        assert_eq!(ds.report().rejected[0].line, 3);
    }

    #[test]
    fn test_csv_duplicate_header_rejected() {
        let csv = "City,City\nLagos,Accra\n";
        let err = load_csv(csv.as_bytes(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn(_)));
    }

    #[test]
    fn test_csv_empty_source_has_no_header() {
        let err = load_csv("".as_bytes(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingHeader));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_file(Path::new("does/not/exist.csv"), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("table.xlsx"), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DataLoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn test_json_records() {
        let text = r#"[
            {"country_name": "Ghana", "year": 1995, "v2x_libdem": 0.41},
            {"country_name": "Ghana", "year": 1996},
            {"country_name": "Kenya", "year": 1995, "v2x_libdem": 1}
        ]"#;
        let ds = load_json(text, LoadOptions::default()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.schema().column_type("year"), Ok(ColumnType::Integer));
        assert_eq!(ds.schema().column_type("v2x_libdem"), Ok(ColumnType::Float));
        assert_eq!(ds.value(1, "v2x_libdem").unwrap(), &Value::Null);
        assert_eq!(ds.value(2, "v2x_libdem").unwrap(), &Value::Float(1.0));
    }

    #[test]
    fn test_json_non_object_record() {
        let text = r#"[{"year": 1995}, 42]"#;
        assert!(matches!(
            load_json(text, LoadOptions::default()),
            Err(DataLoadError::InvalidRecord { index: 1, .. })
        ));

        let options = LoadOptions {
            tolerate_malformed_rows: true,
        };
        let ds = load_json(text, options).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.report().rejected.len(), 1);
    }

    #[test]
    fn test_arrow_column_types() {
        let categorical = DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8));
        assert_eq!(column_type_for(&categorical), Some(ColumnType::String));
        assert_eq!(column_type_for(&DataType::Utf8View), Some(ColumnType::String));
        assert_eq!(column_type_for(&DataType::UInt16), Some(ColumnType::Integer));
        let coded = DataType::Dictionary(Box::new(DataType::UInt8), Box::new(DataType::Int64));
        assert_eq!(column_type_for(&coded), Some(ColumnType::Integer));
        assert_eq!(column_type_for(&DataType::Date32), None);
    }

    #[test]
    fn test_categorical_and_view_strings_read_as_text() {
        let def = ColumnDef {
            name: "country_name".to_string(),
            ty: ColumnType::String,
        };
        let expected = vec![Value::from("Ghana"), Value::Null, Value::from("Ghana")];

        let categorical: DictionaryArray<Int32Type> =
            vec![Some("Ghana"), None, Some("Ghana")].into_iter().collect();
        let array: ArrayRef = Arc::new(categorical);
        assert_eq!(column_to_values(&array, &def).unwrap(), expected);

        let view = StringViewArray::from(vec![Some("Ghana"), None, Some("Ghana")]);
        let view: ArrayRef = Arc::new(view);
        assert_eq!(column_to_values(&view, &def).unwrap(), expected);
    }
}
