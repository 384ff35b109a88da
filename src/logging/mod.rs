//! Structured logging setup and one-shot JSON summaries.

mod format;

pub use format::StructuredLogger;
