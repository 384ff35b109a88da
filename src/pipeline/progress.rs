//! Progress reporting hook for long ingests.

use std::path::Path;

/// Snapshot passed to a [`ProgressCallback`].
#[derive(Debug, Clone, Copy)]
pub struct ProgressInfo<'a> {
    /// File currently being read
    pub file: &'a Path,
    /// Records normalized from `file` so far
    pub file_records: u64,
    /// Files finished (parsed or failed) across the run
    pub files_done: u64,
    pub files_total: u64,
}

/// Called every `csv_chunk_rows` records within a file and once when a file ends.
/// In parallel mode it is called from worker threads.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, info: &ProgressInfo<'_>);
}

impl<F> ProgressCallback for F
where
    F: Fn(&ProgressInfo<'_>) + Send + Sync,
{
    fn on_progress(&self, info: &ProgressInfo<'_>) {
        self(info)
    }
}
