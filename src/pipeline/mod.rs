//! Scan → parse → normalize → buffer → flush.
//!
//! Per-record and per-file failures are contained and counted; an output write
//! failure aborts the run.

mod progress;
mod signal;

pub use progress::{ProgressCallback, ProgressInfo};
pub use signal::StopSignal;

use crate::config::IngestConfig;
use crate::error::{Error, Result};
use crate::normalize::{CanonicalEvent, Normalizer};
use crate::output::StreamingWriter;
use crate::sources::{parse_file, scan, ParseContext, ParseStats, SourceFile};
use rayon::prelude::*;
use serde::Serialize;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Events a parallel worker collects before taking the writer lock.
const WORKER_BATCH: usize = 1024;

/// Monotonic counters shared by workers
#[derive(Debug, Default)]
struct Counters {
    files_parsed: AtomicU64,
    files_failed: AtomicU64,
    files_empty: AtomicU64,
    records_parsed: AtomicU64,
    records_skipped: AtomicU64,
}

impl Counters {
    fn record_file(&self, stats: &ParseStats) {
        self.files_parsed.fetch_add(1, Ordering::Relaxed);
        self.records_parsed.fetch_add(stats.records, Ordering::Relaxed);
        self.records_skipped.fetch_add(stats.skipped, Ordering::Relaxed);
        if stats.records == 0 && stats.skipped > 0 {
            self.files_empty.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn files_done(&self) -> u64 {
        self.files_parsed.load(Ordering::Relaxed) + self.files_failed.load(Ordering::Relaxed)
    }
}

/// End-of-run summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub files_seen: u64,
    pub files_parsed: u64,
    pub files_failed: u64,
    /// Parsed without error but nothing in them could be decoded
    pub files_empty: u64,
    pub files_skipped: u64,
    pub records_parsed: u64,
    pub records_skipped: u64,
    pub rows_written: u64,
    pub flushes: u64,
    pub cancelled: bool,
}

/// Normalizes a directory tree of logs into the canonical table.
pub struct IngestPipeline {
    config: IngestConfig,
    stop: StopSignal,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl IngestPipeline {
    pub fn new(config: IngestConfig) -> Self {
        Self {
            config,
            stop: StopSignal::new(),
            progress: None,
        }
    }

    /// Share an externally owned stop flag (e.g. wired to Ctrl+C).
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    pub fn with_progress_callback(mut self, callback: impl ProgressCallback + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn run(&self) -> Result<RunReport> {
        let scanned = scan(&self.config.input_dir)?;
        info!(
            input_dir = %self.config.input_dir.display(),
            files = scanned.files.len(),
            unrecognized = scanned.unrecognized,
            "scan complete"
        );

        let mut writer = StreamingWriter::open(&self.config.output_file, self.config.batch_size)?;
        let counters = Counters::default();
        let ctx = ParseContext {
            chunk_rows: self.config.csv_chunk_rows,
            sniff_bytes: self.config.sniff_bytes,
            stop: &self.stop,
        };

        let cancelled = if self.config.parallel {
            let shared = Mutex::new(writer);
            let outcome = self.run_parallel(&scanned.files, &ctx, &shared, &counters);
            writer = shared.into_inner().map_err(|_| poisoned())?;
            // complete batches are written even when a worker failed
            let flushed = writer.flush();
            outcome?;
            flushed?;
            self.stop.is_set()
        } else {
            self.run_sequential(&scanned.files, &ctx, &mut writer, &counters)?
        };

        let written = writer.finish()?;
        let report = RunReport {
            files_seen: scanned.files.len() as u64 + scanned.unrecognized,
            files_parsed: counters.files_parsed.load(Ordering::Relaxed),
            files_failed: counters.files_failed.load(Ordering::Relaxed),
            files_empty: counters.files_empty.load(Ordering::Relaxed),
            files_skipped: scanned.unrecognized,
            records_parsed: counters.records_parsed.load(Ordering::Relaxed),
            records_skipped: counters.records_skipped.load(Ordering::Relaxed),
            rows_written: written.rows_written,
            flushes: written.flushes,
            cancelled,
        };
        info!(
            rows = report.rows_written,
            files_failed = report.files_failed,
            records_skipped = report.records_skipped,
            cancelled = report.cancelled,
            "ingest finished"
        );
        Ok(report)
    }

    /// Returns whether the run stopped early.
    fn run_sequential(
        &self,
        files: &[SourceFile],
        ctx: &ParseContext<'_>,
        writer: &mut StreamingWriter,
        counters: &Counters,
    ) -> Result<bool> {
        for file in files {
            if self.stop.is_set() {
                return Ok(true);
            }
            let normalizer = Normalizer::new(file.origin, &file.path);
            let mut write_err: Option<Error> = None;
            let mut file_records = 0u64;
            let parsed = parse_file(file, ctx, &mut |rec| {
                if let Err(e) = writer.push(normalizer.normalize(&rec)) {
                    write_err = Some(e);
                    return ControlFlow::Break(());
                }
                file_records += 1;
                if file_records % ctx.chunk_rows.max(1) as u64 == 0 {
                    self.report(&file.path, file_records, counters, files.len());
                }
                ControlFlow::Continue(())
            });
            if let Some(e) = write_err {
                return Err(e);
            }
            self.account(file, parsed, counters);
            self.report(&file.path, file_records, counters, files.len());
        }
        Ok(self.stop.is_set())
    }

    fn run_parallel(
        &self,
        files: &[SourceFile],
        ctx: &ParseContext<'_>,
        writer: &Mutex<StreamingWriter>,
        counters: &Counters,
    ) -> Result<()> {
        files.par_iter().try_for_each(|file| -> Result<()> {
            if self.stop.is_set() {
                return Ok(());
            }
            let normalizer = Normalizer::new(file.origin, &file.path);
            let mut local: Vec<CanonicalEvent> = Vec::with_capacity(WORKER_BATCH);
            let mut write_err: Option<Error> = None;
            let mut file_records = 0u64;
            let parsed = parse_file(file, ctx, &mut |rec| {
                local.push(normalizer.normalize(&rec));
                if local.len() >= WORKER_BATCH {
                    if let Err(e) = hand_off(writer, &mut local) {
                        write_err = Some(e);
                        return ControlFlow::Break(());
                    }
                }
                file_records += 1;
                if file_records % ctx.chunk_rows.max(1) as u64 == 0 {
                    self.report(&file.path, file_records, counters, files.len());
                }
                ControlFlow::Continue(())
            });
            if let Some(e) = write_err {
                return Err(e);
            }
            hand_off(writer, &mut local)?;
            self.account(file, parsed, counters);
            self.report(&file.path, file_records, counters, files.len());
            Ok(())
        })
    }

    fn account(&self, file: &SourceFile, parsed: Result<ParseStats>, counters: &Counters) {
        match parsed {
            Ok(stats) if stats.records == 0 && stats.skipped > 0 => {
                warn!(
                    path = %file.path.display(),
                    skipped = stats.skipped,
                    "no record could be decoded from file; skipping"
                );
                counters.record_file(&stats);
            }
            Ok(stats) => {
                debug!(
                    path = %file.path.display(),
                    origin = file.origin.map(|o| o.tag()).unwrap_or("-"),
                    records = stats.records,
                    skipped = stats.skipped,
                    "file parsed"
                );
                counters.record_file(&stats);
            }
            Err(e) => {
                warn!(path = %file.path.display(), error = %e, "failed to parse file; skipping");
                counters.files_failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn report(&self, file: &Path, file_records: u64, counters: &Counters, files_total: usize) {
        if let Some(cb) = &self.progress {
            cb.on_progress(&ProgressInfo {
                file,
                file_records,
                files_done: counters.files_done(),
                files_total: files_total as u64,
            });
        }
    }
}

/// Move a worker's events into the shared writer, keeping their order.
fn hand_off(writer: &Mutex<StreamingWriter>, local: &mut Vec<CanonicalEvent>) -> Result<()> {
    if local.is_empty() {
        return Ok(());
    }
    let mut w = writer.lock().map_err(|_| poisoned())?;
    w.extend(local.drain(..))
}

fn poisoned() -> Error {
    Error::Io(std::io::Error::new(std::io::ErrorKind::Other, "output writer lock poisoned"))
}
