//! Pipeline configuration. Every path used by a run lives here and is passed down explicitly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Scanning, parsing and canonical output
    pub ingest: IngestConfig,
    /// Feature encoding parameters
    pub features: FeaturesConfig,
    /// Persisted training artifacts
    pub artifacts: ArtifactsConfig,
    /// Anomaly threshold handling
    pub detection: DetectionConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Root directory scanned recursively for log files
    pub input_dir: PathBuf,
    /// Canonical CSV table (appended to)
    pub output_file: PathBuf,
    /// Events buffered before each flush
    pub batch_size: usize,
    /// Rows read per tabular chunk
    pub csv_chunk_rows: usize,
    /// Header bytes sampled for delimiter sniffing
    pub sniff_bytes: usize,
    /// Parse files on a worker pool; cross-file row order becomes undefined
    pub parallel: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    /// Columns with a null fraction above this are dropped
    pub missing_threshold: f64,
    /// Free-text column replaced by a numeric fingerprint
    pub text_column: String,
    /// Name of the fingerprint column
    pub hashed_column: String,
    /// Extension of dataset files picked up by the multi-file encoder
    pub dataset_ext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub schema_path: PathBuf,
    pub scaler_path: PathBuf,
    pub threshold_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Percentile of the current batch used when no calibrated threshold exists
    pub fallback_percentile: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            ingest: IngestConfig::default(),
            features: FeaturesConfig::default(),
            artifacts: ArtifactsConfig::default(),
            detection: DetectionConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("data"),
            output_file: PathBuf::from("tpot_logs.csv"),
            batch_size: 10_000,
            csv_chunk_rows: 50_000,
            sniff_bytes: 64 * 1024,
            parallel: false,
        }
    }
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            missing_threshold: 0.3,
            text_column: "raw".to_string(),
            hashed_column: "raw_hash".to_string(),
            dataset_ext: "csv".to_string(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("schema.json"),
            scaler_path: PathBuf::from("models").join("scaler.json"),
            threshold_path: PathBuf::from("models").join("threshold.json"),
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fallback_percentile: 95.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl PipelineConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<PipelineConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }
}
