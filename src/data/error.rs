use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a [`Dataset`](super::model::Dataset) from a source.
///
/// Always fatal for the load in progress: no partial dataset is returned.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("source has no header row")]
    MissingHeader,

    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    #[error("required column '{0}' is missing from the source")]
    MissingColumn(String),

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: String },

    #[error("record {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },
}

/// Failure of a query against a loaded dataset.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("column '{0}' not found")]
    ColumnNotFound(String),

    #[error("column '{0}' has no comparable values")]
    EmptyRange(String),
}
