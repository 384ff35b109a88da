//! Seam to the external reconstruction model, plus threshold handling.
//! Training and running the model itself happen outside this crate.

mod detection;

pub use detection::{detect, percentile, summarize, DetectionSummary, Threshold, ThresholdSource};

use crate::error::{Error, Result};
use ndarray::{Array1, Array2, Axis};

/// An autoencoder-style model: reproduces its input, and reconstruction error is the anomaly score.
pub trait ReconstructionModel {
    fn fit(&mut self, training: &Array2<f64>) -> Result<()>;
    fn predict(&self, input: &Array2<f64>) -> Result<Array2<f64>>;
}

/// Per-row mean squared error between input and reconstruction.
pub fn reconstruction_errors(input: &Array2<f64>, reconstructed: &Array2<f64>) -> Result<Array1<f64>> {
    if input.dim() != reconstructed.dim() {
        return Err(Error::ShapeMismatch {
            expected: input.ncols(),
            found: reconstructed.ncols(),
        });
    }
    let diff = input - reconstructed;
    let squared = diff.mapv(|d| d * d);
    Ok(squared
        .mean_axis(Axis(1))
        .unwrap_or_else(|| Array1::zeros(input.nrows())))
}

/// Reconstruction error of `input` under an already fitted model.
pub fn score<M: ReconstructionModel>(model: &M, input: &Array2<f64>) -> Result<Array1<f64>> {
    let reconstructed = model.predict(input)?;
    reconstruction_errors(input, &reconstructed)
}
