//! Anomaly threshold: calibrated value on disk, or a percentile of the current batch.

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::features::write_json_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Linear interpolation between order statistics. `p` is in percent and clamped to [0, 100].
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return None;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let rank = p.clamp(0.0, 100.0) / 100.0 * (v.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    Some(v[lo] + (v[hi] - v[lo]) * (rank - lo as f64))
}

/// Calibrated anomaly threshold, persisted as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Threshold(pub f64);

impl Threshold {
    /// Threshold at the `percentile` of reconstruction errors from known-benign data.
    /// `None` when there is no finite error to calibrate on.
    pub fn calibrate(errors: &[f64], percentile: f64) -> Option<Self> {
        let t = self::percentile(errors, percentile)?;
        info!(percentile, threshold = t, samples = errors.len(), "threshold calibrated");
        Some(Self(t))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &serde_json::to_vec(self)?)
    }

    /// `None` when no threshold has been calibrated yet.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&fs::read(path)?)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Calibrated,
    /// Derived from the scored batch itself; lower confidence.
    BatchPercentile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub threshold: f64,
    pub source: ThresholdSource,
    pub anomalies: usize,
    pub total: usize,
    /// Percent of rows flagged
    pub anomaly_rate: f64,
}

/// Flag rows whose error exceeds the threshold. Without a calibrated
/// threshold, `fallback_percentile` of `errors` is used instead.
pub fn summarize(errors: &[f64], calibrated: Option<Threshold>, fallback_percentile: f64) -> DetectionSummary {
    let (threshold, source) = match calibrated {
        Some(Threshold(t)) => (t, ThresholdSource::Calibrated),
        None => {
            let t = percentile(errors, fallback_percentile).unwrap_or(0.0);
            warn!(
                percentile = fallback_percentile,
                threshold = t,
                "no calibrated threshold; using percentile of current batch"
            );
            (t, ThresholdSource::BatchPercentile)
        }
    };
    let anomalies = errors.iter().filter(|&&e| e > threshold).count();
    let total = errors.len();
    let anomaly_rate = if total == 0 {
        0.0
    } else {
        anomalies as f64 / total as f64 * 100.0
    };
    info!(anomalies, total, anomaly_rate, threshold, "detection summary");
    DetectionSummary {
        threshold,
        source,
        anomalies,
        total,
        anomaly_rate,
    }
}

/// Summarize against the threshold persisted at `artifacts.threshold_path`, if any.
pub fn detect(errors: &[f64], config: &PipelineConfig) -> Result<DetectionSummary> {
    let calibrated = Threshold::load(&config.artifacts.threshold_path)?;
    Ok(summarize(errors, calibrated, config.detection.fallback_percentile))
}
