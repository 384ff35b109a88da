//! honeyfeat entrypoint: normalize every log under an input directory into one canonical CSV.
//! Prints the run report as a single JSON line on stdout.

use clap::Parser;
use honeyfeat::{IngestPipeline, PipelineConfig, StopSignal, StructuredLogger};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "honeyfeat", about = "Normalize honeypot and IDS logs into a canonical CSV table")]
struct Args {
    /// Root directory scanned recursively for logs
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Canonical CSV output (appended to)
    #[arg(long)]
    output_file: Option<PathBuf>,

    /// Events buffered per flush
    #[arg(long)]
    batch_size: Option<usize>,
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();
    let config_path = std::env::var("HONEYFEAT_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.json"));
    let mut config = PipelineConfig::load(&config_path);
    if let Some(dir) = args.input_dir {
        config.ingest.input_dir = dir;
    }
    if let Some(out) = args.output_file {
        config.ingest.output_file = out;
    }
    if let Some(n) = args.batch_size {
        config.ingest.batch_size = n.max(1);
    }

    StructuredLogger::init(config.log.json, &config.log.level);
    info!(
        input_dir = %config.ingest.input_dir.display(),
        output_file = %config.ingest.output_file.display(),
        "honeyfeat starting"
    );

    let stop = StopSignal::new();
    let handler_stop = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_stop.stop()) {
        warn!(error = %e, "could not install Ctrl+C handler");
    }

    let report = IngestPipeline::new(config.ingest).with_stop_signal(stop).run()?;
    StructuredLogger::emit_json(&report, &mut std::io::stdout().lock());
    Ok(())
}
