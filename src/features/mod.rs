//! Canonical table → schema-stable, scaled numeric matrix for the detector.
//!
//! Training fixes the column schema and scaler ranges on disk; inference
//! reloads both and projects new data onto them.

mod align;
mod encoder;
mod scaler;
mod schema;
mod table;

pub use align::align;
pub use encoder::{median, text_fingerprint, FeatureEncoder, UNKNOWN};
pub use scaler::{ColumnRange, ScalerState};
pub use schema::Schema;
pub use table::{Column, ColumnData, NumericTable, Table};

pub(crate) use schema::write_json_atomic;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use ndarray::Array2;
use std::path::Path;
use tracing::info;

/// Row-major numeric features with named columns.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(Error::ShapeMismatch {
                expected: columns.len(),
                found: values.ncols(),
            });
        }
        Ok(Self { columns, values })
    }

    pub(crate) fn from_parts(columns: Vec<String>, values: Array2<f64>) -> Self {
        debug_assert_eq!(columns.len(), values.ncols());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|x| x.is_finite())
    }
}

/// Artifacts produced by a training preparation run.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub schema: Schema,
    pub scaler: ScalerState,
    pub matrix: FeatureMatrix,
}

/// Encode a dataset file or directory, then persist the schema and fitted scaler.
pub fn prepare_training(input: &Path, config: &PipelineConfig) -> Result<TrainingSet> {
    let encoder = FeatureEncoder::new(&config.features);
    let table = if input.is_dir() {
        encoder.encode_dir(input)?
    } else {
        encoder.encode_file(input)?
    };
    let schema = Schema::new(table.names.clone());
    let raw = align(&table, &schema);
    let scaler = ScalerState::fit(&raw);
    let matrix = scaler.transform(&raw)?;

    schema.save(&config.artifacts.schema_path)?;
    scaler.save(&config.artifacts.scaler_path)?;
    info!(
        rows = matrix.nrows(),
        columns = matrix.ncols(),
        schema = %config.artifacts.schema_path.display(),
        scaler = %config.artifacts.scaler_path.display(),
        "training features prepared"
    );
    Ok(TrainingSet { schema, scaler, matrix })
}

/// Encode one dataset file against the persisted schema and scaler.
///
/// Missing artifacts fail before any data is read.
pub fn prepare_inference(input: &Path, config: &PipelineConfig) -> Result<FeatureMatrix> {
    let schema = Schema::load(&config.artifacts.schema_path)?;
    let scaler = ScalerState::load(&config.artifacts.scaler_path)?;
    if scaler.len() != schema.len() {
        return Err(Error::ShapeMismatch {
            expected: schema.len(),
            found: scaler.len(),
        });
    }
    // medians are recomputed on this dataset, not carried over from training
    let table = FeatureEncoder::new(&config.features).encode_file(input)?;
    let matrix = scaler.transform(&align(&table, &schema))?;
    info!(rows = matrix.nrows(), columns = matrix.ncols(), "inference features prepared");
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &Path) -> PipelineConfig {
        let mut c = PipelineConfig::default();
        c.artifacts.schema_path = dir.join("schema.json");
        c.artifacts.scaler_path = dir.join("models").join("scaler.json");
        c
    }

    #[test]
    fn matrix_rejects_mismatched_names() {
        let err = FeatureMatrix::new(vec!["a".into()], Array2::zeros((2, 3))).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 1, found: 3 }));
    }

    #[test]
    fn inference_matches_training_schema() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let train = dir.path().join("train.csv");
        std::fs::write(&train, "dst_port,proto,raw\n22,tcp,a\n80,udp,b\n443,tcp,c\n").unwrap();
        let set = prepare_training(&train, &cfg).unwrap();
        assert_eq!(set.schema.columns(), &["dst_port", "proto", "raw_hash"]);
        assert!(set.matrix.values().iter().all(|x| (0.0..=1.0).contains(x)));

        let new = dir.path().join("new.csv");
        std::fs::write(&new, "proto,extra,dst_port\ntcp,1,8080\n").unwrap();
        let m = prepare_inference(&new, &cfg).unwrap();
        assert_eq!(m.columns(), set.schema.columns());
        assert_eq!(m.nrows(), 1);
        assert!(m.is_finite());
        // raw_hash absent → zero before scaling
        let hash_range = set.scaler.ranges[2];
        assert_eq!(m.values()[[0, 2]], hash_range.scale(0.0));
    }

    #[test]
    fn inference_without_schema_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config_in(dir.path());
        let new = dir.path().join("new.csv");
        std::fs::write(&new, "a\n1\n").unwrap();
        assert!(matches!(prepare_inference(&new, &cfg), Err(Error::SchemaNotFound(_))));
    }
}
