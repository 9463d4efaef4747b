//! vg_store - Snapshot storage layer for vmgrep
//!
//! This crate provides:
//! - The per-project snapshot directory (one JSON file per project)
//! - VM record types matching the inventory tool's native output
//! - Whole-file snapshot replacement and lenient loading

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod record;

pub use record::{AccessConfig, Instance, NetworkInterface, Tags};

/// Snapshot file extension
const SNAPSHOT_EXT: &str = "json";

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("No snapshot for project {0} (never refreshed?)")]
    MissingSnapshot(String),

    #[error("Snapshot for project {project} is not valid JSON: {source}")]
    MalformedSnapshot {
        project: String,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Directory of per-project snapshot files
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Open the store, creating the directory if absent.
    ///
    /// Safe to call concurrently: `create_dir_all` succeeds when the
    /// directory already exists, including when a sibling fetch created it
    /// a moment earlier.
    #[instrument]
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(root)?;
        info!(root = %root.display(), "Opened snapshot store");
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    /// Path of a project's snapshot file
    pub fn snapshot_path(&self, project: &str) -> PathBuf {
        self.root.join(format!("{project}.{SNAPSHOT_EXT}"))
    }

    /// Replace a project's snapshot with the raw inventory output.
    ///
    /// The content is captured verbatim; the previous snapshot, if any, is
    /// fully replaced. There is no merge path.
    pub fn write_snapshot(&self, project: &str, raw: &str) -> Result<(), StoreError> {
        let path = self.snapshot_path(project);
        std::fs::write(&path, raw)?;
        debug!(project, bytes = raw.len(), "Wrote snapshot");
        Ok(())
    }

    /// Load a project's snapshot as VM records.
    ///
    /// A missing file means the project was never refreshed. An empty or
    /// whitespace-only file loads as zero records rather than an error, so a
    /// fetch that captured no output does not poison later queries.
    pub fn load_snapshot(&self, project: &str) -> Result<Vec<Instance>, StoreError> {
        let path = self.snapshot_path(project);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::MissingSnapshot(project.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if raw.trim().is_empty() {
            return Ok(vec![]);
        }

        serde_json::from_str(&raw).map_err(|source| StoreError::MalformedSnapshot {
            project: project.to_string(),
            source,
        })
    }

    /// Project names with a stored snapshot, sorted lexicographically.
    ///
    /// Derived from the file names present, extension stripped. The sorted
    /// order is the tie-breaking order used when ranking fuzzy project
    /// matches.
    pub fn projects(&self) -> Result<Vec<String>, StoreError> {
        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SNAPSHOT_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                projects.push(stem.to_string());
            }
        }
        projects.sort();
        Ok(projects)
    }

    /// Store root directory
    pub fn root(&self) -> &Path {
        &self.root
    }
}
