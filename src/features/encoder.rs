//! Table → all-numeric table: drop sparse columns, fingerprint free text,
//! label-encode categories, impute medians.

use super::table::{Column, ColumnData, NumericTable, Table};
use crate::config::FeaturesConfig;
use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Fill value for missing categorical and free-text cells.
pub const UNKNOWN: &str = "Unknown";

const FINGERPRINT_MODULUS: u64 = 1_000_000_000;

/// Stable across processes and platforms: SHA-256, first 8 bytes big-endian, mod 1e9.
pub fn text_fingerprint(text: &str) -> f64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % FINGERPRINT_MODULUS) as f64
}

/// Median of the finite values; 0 when there are none.
pub fn median(values: &[f64]) -> f64 {
    let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(|a, b| a.total_cmp(b));
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

fn impute(col: &mut [f64]) {
    let fill = median(col);
    for x in col.iter_mut().filter(|x| !x.is_finite()) {
        *x = fill;
    }
}

#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    missing_threshold: f64,
    text_column: String,
    hashed_column: String,
    dataset_ext: String,
}

impl FeatureEncoder {
    pub fn new(config: &FeaturesConfig) -> Self {
        Self {
            missing_threshold: config.missing_threshold,
            text_column: config.text_column.clone(),
            hashed_column: config.hashed_column.clone(),
            dataset_ext: config.dataset_ext.clone(),
        }
    }

    pub fn encode(&self, table: Table) -> NumericTable {
        let rows = table.rows();
        let mut out = NumericTable::default();
        let mut hashed = None;

        for Column { name, data } in table.columns {
            let data = without_non_finite(data);
            let null_ratio = if rows == 0 {
                0.0
            } else {
                data.null_count() as f64 / rows as f64
            };
            if null_ratio > self.missing_threshold {
                debug!(column = %name, null_ratio, "dropping sparse column");
                continue;
            }
            if name == self.text_column {
                hashed = Some(fingerprint_column(&data));
                continue;
            }
            let values = match data {
                ColumnData::Numeric(v) => v.into_iter().map(|x| x.unwrap_or(f64::NAN)).collect(),
                ColumnData::Text(v) => label_encode(&v),
            };
            out.push(name, values);
        }
        if let Some(values) = hashed {
            out.push(self.hashed_column.clone(), values);
        }
        for col in &mut out.columns {
            impute(col);
        }
        out
    }

    /// Load and encode one file. A file without data rows is an error.
    pub fn encode_file(&self, path: &Path) -> Result<NumericTable> {
        let table = Table::from_csv_path(path)?;
        if table.rows() == 0 {
            return Err(Error::EmptyDataset(path.to_path_buf()));
        }
        let encoded = self.encode(table);
        debug!(path = %path.display(), rows = encoded.rows(), columns = encoded.width(), "encoded dataset file");
        Ok(encoded)
    }

    /// Dataset files directly inside `dir`, sorted by name.
    pub fn dataset_files(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(Error::InputDirMissing(dir.to_path_buf()));
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            let matches_ext = entry
                .path()
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.eq_ignore_ascii_case(&self.dataset_ext))
                .unwrap_or(false);
            if entry.file_type().is_file() && matches_ext {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    /// Encode every dataset file in `dir` and stack them on their shared columns.
    ///
    /// Columns constant across all rows are dropped. Any remaining null or
    /// non-finite value is an integrity error.
    pub fn encode_dir(&self, dir: &Path) -> Result<NumericTable> {
        let mut parts = Vec::new();
        for path in self.dataset_files(dir)? {
            match self.encode_file(&path) {
                Ok(t) => parts.push(t),
                Err(Error::EmptyDataset(p)) => warn!(path = %p.display(), "skipping dataset file without rows"),
                Err(e) => return Err(e),
            }
        }
        if parts.is_empty() {
            return Err(Error::NoInputFiles(dir.to_path_buf()));
        }

        let common = common_columns(&parts);
        if common.is_empty() {
            return Err(Error::NoCommonColumns);
        }
        let mut merged = concat(&parts, &common);
        let before = merged.width();
        merged.retain_columns(|_, col| !is_constant(col));
        for col in &mut merged.columns {
            impute(col);
        }
        check_integrity(&merged)?;
        info!(
            files = parts.len(),
            rows = merged.rows(),
            columns = merged.width(),
            constant_dropped = before - merged.width(),
            "aggregated dataset"
        );
        Ok(merged)
    }
}

fn without_non_finite(data: ColumnData) -> ColumnData {
    match data {
        ColumnData::Numeric(v) => ColumnData::Numeric(v.into_iter().map(|x| x.filter(|f| f.is_finite())).collect()),
        text => text,
    }
}

fn fingerprint_column(data: &ColumnData) -> Vec<f64> {
    match data {
        ColumnData::Text(v) => v.iter().map(|s| text_fingerprint(s.as_deref().unwrap_or(UNKNOWN))).collect(),
        ColumnData::Numeric(v) => v
            .iter()
            .map(|x| match x {
                Some(f) => text_fingerprint(&f.to_string()),
                None => text_fingerprint(UNKNOWN),
            })
            .collect(),
    }
}

/// Index into the sorted distinct values, missing read as `Unknown`.
fn label_encode(values: &[Option<String>]) -> Vec<f64> {
    let labels: BTreeSet<&str> = values.iter().map(|v| v.as_deref().unwrap_or(UNKNOWN)).collect();
    let index: BTreeMap<&str, f64> = labels.into_iter().enumerate().map(|(i, l)| (l, i as f64)).collect();
    values
        .iter()
        .map(|v| index.get(v.as_deref().unwrap_or(UNKNOWN)).copied().unwrap_or(0.0))
        .collect()
}

/// Columns present in every part, in the first part's order.
fn common_columns(parts: &[NumericTable]) -> Vec<String> {
    let sets: Vec<HashSet<&str>> = parts.iter().map(|p| p.names.iter().map(String::as_str).collect()).collect();
    parts[0]
        .names
        .iter()
        .filter(|n| sets.iter().all(|s| s.contains(n.as_str())))
        .cloned()
        .collect()
}

fn concat(parts: &[NumericTable], names: &[String]) -> NumericTable {
    let mut out = NumericTable::default();
    for name in names {
        let mut col = Vec::new();
        for part in parts {
            if let Some(values) = part.column(name) {
                col.extend_from_slice(values);
            }
        }
        out.push(name.clone(), col);
    }
    out
}

/// At most one distinct non-missing value.
fn is_constant(col: &[f64]) -> bool {
    let mut first: Option<f64> = None;
    for &x in col.iter().filter(|x| !x.is_nan()) {
        match first {
            None => first = Some(x),
            Some(f) if f != x => return false,
            _ => {}
        }
    }
    true
}

fn check_integrity(table: &NumericTable) -> Result<()> {
    for (name, col) in table.names.iter().zip(&table.columns) {
        let count = col.iter().filter(|x| !x.is_finite()).count();
        if count > 0 {
            return Err(Error::Integrity {
                column: name.clone(),
                count,
            });
        }
    }
    Ok(())
}
