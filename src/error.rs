//! Crate error type. Per-record problems never surface here; they are counted.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input directory {} does not exist", .0.display())]
    InputDirMissing(PathBuf),

    #[error("schema {} not found; train first to create it", .0.display())]
    SchemaNotFound(PathBuf),

    #[error("scaler state {} not found; train first to create it", .0.display())]
    ScalerNotFound(PathBuf),

    #[error("integrity violation: column `{column}` still holds {count} null or non-finite values")]
    Integrity { column: String, count: usize },

    #[error("no dataset files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("no column is shared by every dataset file")]
    NoCommonColumns,

    #[error("shape mismatch: expected {expected} columns, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    #[error("dataset {} has no rows", .0.display())]
    EmptyDataset(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
