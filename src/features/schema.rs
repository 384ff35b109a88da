//! Ordered feature column list fixed at training time.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Persisted as a JSON array of column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema {
    columns: Vec<String>,
}

impl Schema {
    pub fn new(columns: Vec<String>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Overwrites any previous schema.
    pub fn save(&self, path: &Path) -> Result<()> {
        write_json_atomic(path, &serde_json::to_vec_pretty(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::SchemaNotFound(path.to_path_buf()));
        }
        Ok(serde_json::from_slice(&fs::read(path)?)?)
    }
}

/// Write to a sibling temp file, then rename over the target.
pub(crate) fn write_json_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saves_plain_array_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("schema.json");
        let schema = Schema::new(vec!["dst_port".into(), "proto".into(), "raw_hash".into()]);
        schema.save(&path).unwrap();
        let on_disk: Vec<String> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, schema.columns());
        assert_eq!(Schema::load(&path).unwrap(), schema);
    }

    #[test]
    fn missing_schema_is_distinct_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Schema::load(&dir.path().join("schema.json")).unwrap_err();
        assert!(matches!(err, Error::SchemaNotFound(_)));
    }
}
