//! JSON log lines: one JSON object per line (ndjson) so run summaries can be ingested downstream.

use serde::Serialize;
use std::io::Write;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initialize tracing with JSON format (one JSON object per line)
pub struct StructuredLogger;

impl StructuredLogger {
    /// Install global subscriber on stderr; level from RUST_LOG or the configured default.
    /// Calling it twice is harmless (the second install is ignored).
    pub fn init(json: bool, default_level: &str) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        if json {
            let fmt = tracing_subscriber::fmt::layer()
                .json()
                .with_span_events(FmtSpan::NONE)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry().with(filter).with(fmt).try_init();
        } else {
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init();
        }
    }

    /// Emit a single structured line (e.g. the run report) without going through tracing
    pub fn emit_json(event: &impl Serialize, w: &mut impl Write) {
        if let Ok(line) = serde_json::to_string(event) {
            let _ = writeln!(w, "{}", line);
        }
    }
}
