//! Batched, append-only writer for the canonical table. Single writer per file.

use crate::error::Result;
use crate::normalize::{CanonicalEvent, Field};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteStats {
    pub rows_written: u64,
    pub flushes: u64,
}

pub struct StreamingWriter {
    path: PathBuf,
    batch_size: usize,
    buffer: Vec<CanonicalEvent>,
    header_written: bool,
    stats: WriteStats,
}

impl StreamingWriter {
    /// The header is written on the first flush only if the destination is absent or empty.
    pub fn open(path: &Path, batch_size: usize) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let header_written = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);
        let batch_size = batch_size.max(1);
        Ok(Self {
            path: path.to_path_buf(),
            batch_size,
            buffer: Vec::with_capacity(batch_size.min(16_384)),
            header_written,
            stats: WriteStats::default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Buffer one event; flushes when the batch is full.
    pub fn push(&mut self, event: CanonicalEvent) -> Result<()> {
        self.buffer.push(event);
        if self.buffer.len() >= self.batch_size {
            self.flush()?;
        }
        Ok(())
    }

    pub fn extend(&mut self, events: impl IntoIterator<Item = CanonicalEvent>) -> Result<()> {
        for ev in events {
            self.push(ev)?;
        }
        Ok(())
    }

    /// Append the buffered batch. A failure here is fatal for the run.
    pub fn flush(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut w = WriterBuilder::new().has_headers(false).from_writer(file);
        if !self.header_written {
            w.write_record(Field::header())?;
        }
        for ev in &self.buffer {
            w.write_record(ev.to_record())?;
        }
        w.flush()?;
        self.header_written = true;
        self.stats.rows_written += self.buffer.len() as u64;
        self.stats.flushes += 1;
        debug!(path = %self.path.display(), rows = self.buffer.len(), "batch flushed");
        self.buffer.clear();
        Ok(())
    }

    /// Flush the partial final batch and return totals.
    pub fn finish(mut self) -> Result<WriteStats> {
        self.flush()?;
        Ok(self.stats)
    }
}
