//! Catalogue loading from a data directory.
//!
//! A catalogue directory either carries a `providers.json` manifest (a JSON
//! array of file stems, each naming `<stem>.json`) or is read as every
//! `*.json` file it contains, in file-name order.

use crate::error::{Result, SearchError};
use crate::record::ProviderRecord;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Manifest file name inside a catalogue directory.
pub const MANIFEST: &str = "providers.json";

/// The record files that make up one catalogue.
#[derive(Debug, Clone)]
pub struct CatalogueSource {
    root: PathBuf,
    files: Vec<PathBuf>,
    manifest: bool,
}

impl CatalogueSource {
    /// Resolve the record files of the catalogue in `dir`.
    ///
    /// Files are not read here; see [`load_record`] and
    /// [`load_all`](Self::load_all).
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let root = dir.as_ref().to_path_buf();
        let manifest_path = root.join(MANIFEST);

        let (files, manifest) = if manifest_path.is_file() {
            (manifest_files(&root, &manifest_path)?, true)
        } else {
            (directory_files(&root)?, false)
        };

        debug!(root = %root.display(), files = files.len(), manifest, "Catalogue resolved");
        Ok(Self { root, files, manifest })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Record files in load order
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether the file list came from a manifest
    pub fn has_manifest(&self) -> bool {
        self.manifest
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Load every record, skipping files that fail to load.
    ///
    /// Skipped files are logged and returned alongside the records.
    pub fn load_all(&self) -> (Vec<ProviderRecord>, Vec<SearchError>) {
        let mut records = Vec::with_capacity(self.files.len());
        let mut failures = Vec::new();

        for path in &self.files {
            match load_record(path) {
                Ok(record) => records.push(record),
                Err(err) => {
                    warn!(error = %err, "Skipping catalogue file");
                    failures.push(err);
                }
            }
        }

        (records, failures)
    }
}

/// Read one provider record from a JSON file.
pub fn load_record(path: &Path) -> Result<ProviderRecord> {
    let content = fs::read_to_string(path).map_err(|source| SearchError::CatalogueRead {
        path: path.display().to_string(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| SearchError::CatalogueParse {
        path: path.display().to_string(),
        source,
    })
}

fn manifest_files(root: &Path, manifest_path: &Path) -> Result<Vec<PathBuf>> {
    let content = fs::read_to_string(manifest_path).map_err(|source| SearchError::CatalogueRead {
        path: manifest_path.display().to_string(),
        source,
    })?;
    let stems: Vec<Value> =
        serde_json::from_str(&content).map_err(|source| SearchError::CatalogueParse {
            path: manifest_path.display().to_string(),
            source,
        })?;

    Ok(stems
        .iter()
        .filter_map(|stem| match stem.as_str() {
            Some(stem) if !stem.is_empty() => Some(root.join(format!("{stem}.json"))),
            _ => {
                warn!(entry = %stem, "Ignoring manifest entry that is not a file stem");
                None
            }
        })
        .collect())
}

fn directory_files(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|source| SearchError::CatalogueRead {
        path: root.display().to_string(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
