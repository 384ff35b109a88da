//! Recursive directory scan and format classification.

use super::Origin;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

const TABULAR_EXTENSIONS: &[&str] = &["csv"];
const LINE_EXTENSIONS: &[&str] = &["json", "jsonl", "ndjson", "log"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text with a header row
    Tabular,
    /// One JSON document per line, whole-document fallback
    Lines,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub format: SourceFormat,
    pub origin: Option<Origin>,
}

/// Result of walking an input tree
#[derive(Debug, Default)]
pub struct Scan {
    pub files: Vec<SourceFile>,
    /// Regular files with no recognized format
    pub unrecognized: u64,
    /// Entries the walk could not read
    pub walk_errors: u64,
}

/// Classify one file by name and path. `None` means skip.
///
/// Origin precedence: well-known sensor log name, then path segments, else none.
pub fn classify(path: &Path) -> Option<SourceFile> {
    let name = path.file_name()?.to_str()?.to_ascii_lowercase();
    let inner = name.strip_suffix(".gz").unwrap_or(&name);
    let ext = Path::new(inner).extension().and_then(|e| e.to_str()).unwrap_or("");

    if TABULAR_EXTENSIONS.contains(&ext) {
        return Some(SourceFile {
            path: path.to_path_buf(),
            format: SourceFormat::Tabular,
            origin: Origin::detect(path),
        });
    }

    if let Some(origin) = Origin::from_file_name(&name) {
        return Some(SourceFile {
            path: path.to_path_buf(),
            format: SourceFormat::Lines,
            origin: Some(origin),
        });
    }

    let origin = Origin::from_segments(path);
    // rotated logs keep their base extension inside the name (`tanner.json.1`)
    let rotated = origin.is_some() && (inner.contains(".json") || inner.contains(".log"));
    if LINE_EXTENSIONS.contains(&ext) || rotated {
        return Some(SourceFile {
            path: path.to_path_buf(),
            format: SourceFormat::Lines,
            origin,
        });
    }
    None
}

/// Walk `root` recursively and classify every regular file. Unreadable entries are
/// logged and counted; they never abort the scan.
pub fn scan(root: &Path) -> Result<Scan> {
    if !root.is_dir() {
        return Err(Error::InputDirMissing(root.to_path_buf()));
    }
    let mut out = Scan::default();
    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(error = %e, "unreadable entry skipped");
                out.walk_errors += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match classify(entry.path()) {
            Some(file) => out.files.push(file),
            None => {
                debug!(path = %entry.path().display(), "unrecognized file skipped");
                out.unrecognized += 1;
            }
        }
    }
    Ok(out)
}
