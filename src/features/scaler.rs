//! Per-column min-max scaling fitted on training data.

use super::schema::write_json_atomic;
use super::FeatureMatrix;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnRange {
    pub min: f64,
    pub max: f64,
}

impl ColumnRange {
    /// Constant columns map to 0. Values outside the fitted range are not clipped.
    pub fn scale(&self, x: f64) -> f64 {
        let span = self.max - self.min;
        if span > 0.0 {
            (x - self.min) / span
        } else {
            0.0
        }
    }
}

/// Fitted ranges, one per schema column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    pub ranges: Vec<ColumnRange>,
}

impl ScalerState {
    pub fn fit(matrix: &FeatureMatrix) -> Self {
        let ranges = matrix
            .values()
            .columns()
            .into_iter()
            .map(|col| {
                let (min, max) = col
                    .iter()
                    .filter(|x| x.is_finite())
                    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &x| (lo.min(x), hi.max(x)));
                if min.is_finite() {
                    ColumnRange { min, max }
                } else {
                    ColumnRange { min: 0.0, max: 0.0 }
                }
            })
            .collect();
        Self { ranges }
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn transform(&self, matrix: &FeatureMatrix) -> Result<FeatureMatrix> {
        if matrix.ncols() != self.ranges.len() {
            return Err(Error::ShapeMismatch {
                expected: self.ranges.len(),
                found: matrix.ncols(),
            });
        }
        let mut values = matrix.values().clone();
        for (mut col, range) in values.columns_mut().into_iter().zip(&self.ranges) {
            col.mapv_inplace(|x| range.scale(x));
        }
        Ok(FeatureMatrix::from_parts(matrix.columns().to_vec(), values))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ScalerNotFound(path.to_path_buf()));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}
