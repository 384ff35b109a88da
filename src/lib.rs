//! honeyfeat — honeypot and IDS log normalization with a schema-stable feature pipeline.
//!
//! Modular structure:
//! - [`sources`] — Directory scan, format classification, tabular and line parsers
//! - [`normalize`] — Raw record → fixed-schema canonical event
//! - [`output`] — Batched append-only CSV writer, table splitting
//! - [`pipeline`] — Ingest orchestration, run report, cancellation
//! - [`features`] — Encoding, schema alignment and min-max scaling
//! - [`model`] — Reconstruction-model seam and anomaly threshold
//! - [`logging`] — Structured JSON logging

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod sources;

pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use features::{prepare_inference, prepare_training, FeatureMatrix, Schema, ScalerState};
pub use logging::StructuredLogger;
pub use normalize::{CanonicalEvent, Field, Normalizer};
pub use output::{split_by_size, StreamingWriter};
pub use pipeline::{IngestPipeline, ProgressCallback, ProgressInfo, RunReport, StopSignal};
pub use sources::{Origin, RawRecord};
