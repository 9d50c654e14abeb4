//! Write-once snapshot store.
//!
//! Layout under the root:
//!
//! ```text
//! <root>/
//! ├── versions-YYYY-MM-DD.json   # index as fetched that day
//! ├── <version>.txt              # checksum manifest
//! ├── <version>.sig              # detached signature
//! └── checked/<version>/<file>.checked   # hash of a verified artifact
//! ```
//!
//! Nothing is ever overwritten. Each file is written to a temporary file in
//! its target directory and moved into place with no-clobber semantics, so
//! a concurrent writer or an interrupted run can not leave a partial or
//! replaced file behind.

use std::io::Write;
use std::path::{Path, PathBuf};

use sigwatch_schema::index::is_safe_component;
use sigwatch_schema::{VersionId, VersionIndex};
use tempfile::NamedTempFile;

use crate::error::{Error, Result};
use crate::paths;

/// Whether a write created the file or found it already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was written by this call.
    Created,
    /// The file existed and was left untouched.
    AlreadyPresent,
}

impl WriteOutcome {
    /// Whether this call wrote the file.
    pub fn created(self) -> bool {
        self == Self::Created
    }
}

/// Snapshot files under one explicit root.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    /// Store rooted at `root`. Nothing is created until [`Self::init`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the root (and marker) directories if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if they cannot be created.
    pub fn init(&self) -> Result<()> {
        let checked = self.root.join(paths::CHECKED_DIR);
        std::fs::create_dir_all(&checked).map_err(|e| Error::io(&checked, e))
    }

    /// The snapshot root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the index snapshot for `date`.
    pub fn index_path(&self, date: chrono::NaiveDate) -> PathBuf {
        self.root.join(paths::index_file_name(date))
    }

    /// Path of the manifest snapshot of `version`.
    pub fn manifest_path(&self, version: &VersionId) -> PathBuf {
        self.root.join(paths::manifest_file_name(version))
    }

    /// Path of the signature snapshot of `version`.
    pub fn signature_path(&self, version: &VersionId) -> PathBuf {
        self.root.join(paths::signature_file_name(version))
    }

    /// Marker location for one artifact of one version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if `filename` would escape the marker
    /// directory.
    pub fn marker_path(&self, version: &VersionId, filename: &str) -> Result<PathBuf> {
        if !is_safe_component(filename) {
            return Err(Error::Format(format!(
                "manifest of {version} names unsafe file '{filename}'"
            )));
        }
        Ok(self
            .root
            .join(paths::CHECKED_DIR)
            .join(version.as_str())
            .join(paths::marker_file_name(filename)))
    }

    /// Record the index fetched on `date`. A second call for the same date
    /// keeps the first snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure.
    pub fn record_index(&self, index: &VersionIndex, date: chrono::NaiveDate) -> Result<WriteOutcome> {
        let mut json = serde_json::to_vec_pretty(index)
            .map_err(|e| Error::Format(format!("cannot serialize index: {e}")))?;
        json.push(b'\n');
        write_once(&self.index_path(date), &json)
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure.
    pub fn write_manifest(&self, version: &VersionId, text: &str) -> Result<WriteOutcome> {
        write_once(&self.manifest_path(version), text.as_bytes())
    }

    /// # Errors
    ///
    /// Returns [`Error::Io`] on write failure.
    pub fn write_signature(&self, version: &VersionId, bytes: &[u8]) -> Result<WriteOutcome> {
        write_once(&self.signature_path(version), bytes)
    }

    /// Whether the manifest of `version` is already stored.
    pub fn has_manifest(&self, version: &VersionId) -> bool {
        self.manifest_path(version).is_file()
    }

    /// Whether the signature of `version` is already stored.
    pub fn has_signature(&self, version: &VersionId) -> bool {
        self.signature_path(version).is_file()
    }

    /// # Errors
    ///
    /// [`Error::Io`] if unreadable, [`Error::Format`] if not UTF-8.
    pub fn read_manifest(&self, version: &VersionId) -> Result<String> {
        let path = self.manifest_path(version);
        let bytes = std::fs::read(&path).map_err(|e| Error::io(&path, e))?;
        String::from_utf8(bytes)
            .map_err(|_| Error::Format(format!("{} is not UTF-8 text", path.display())))
    }

    /// # Errors
    ///
    /// [`Error::Io`] if unreadable.
    pub fn read_signature(&self, version: &VersionId) -> Result<Vec<u8>> {
        let path = self.signature_path(version);
        std::fs::read(&path).map_err(|e| Error::io(&path, e))
    }

    /// Hash recorded by an existing marker, if any.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] for unsafe file names, [`Error::Io`] if a marker
    /// exists but cannot be read.
    pub fn read_marker(&self, version: &VersionId, filename: &str) -> Result<Option<String>> {
        let path = self.marker_path(version, filename)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text.trim().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::io(&path, e)),
        }
    }

    /// Record that `filename` verified with `computed_hash`.
    ///
    /// # Errors
    ///
    /// [`Error::Format`] for unsafe file names, [`Error::Io`] on write failure.
    pub fn write_marker(
        &self,
        version: &VersionId,
        filename: &str,
        computed_hash: &str,
    ) -> Result<WriteOutcome> {
        let path = self.marker_path(version, filename)?;
        write_once(&path, format!("{computed_hash}\n").as_bytes())
    }
}

/// Create `path` with `contents` unless it already exists.
fn write_once(path: &Path, contents: &[u8]) -> Result<WriteOutcome> {
    if path.exists() {
        return Ok(WriteOutcome::AlreadyPresent);
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents).map_err(|e| Error::io(tmp.path(), e))?;
    tmp.as_file().sync_all().map_err(|e| Error::io(tmp.path(), e))?;

    match tmp.persist_noclobber(path) {
        Ok(_) => {
            tracing::debug!("wrote {}", path.display());
            Ok(WriteOutcome::Created)
        }
        Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => {
            Ok(WriteOutcome::AlreadyPresent)
        }
        Err(e) => Err(Error::io(path, e.error)),
    }
}
