//! The remote version index and the identifiers it lists.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;

use crate::SchemaError;

/// Index entries that are never version manifests.
///
/// `hello` is a sentinel the publisher keeps in the listing.
pub const IGNORED_ENTRIES: &[&str] = &["index.html", "versions.json", "hello"];

/// A version identifier from the remote index.
///
/// Identifiers double as remote path segments and local file names, so they
/// are restricted to a single, non-traversing path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    /// Validate an index entry as a version identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidVersionId`] for empty names, `.`/`..`,
    /// and names containing path separators or control characters.
    pub fn new(s: &str) -> Result<Self, SchemaError> {
        if is_safe_component(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(SchemaError::InvalidVersionId(s.to_string()))
        }
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether `s` can be joined onto a directory without escaping it.
pub fn is_safe_component(s: &str) -> bool {
    !s.is_empty()
        && s != "."
        && s != ".."
        && !s.contains(['/', '\\'])
        && !s.chars().any(char::is_control)
}

impl std::fmt::Display for VersionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::ops::Deref for VersionId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for VersionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for VersionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for VersionId {
    type Error = SchemaError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for VersionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Order in which candidate versions are processed.
///
/// Order never affects verification results; `Reverse` only gets the newest
/// releases checked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexOrder {
    /// As listed by the remote index.
    #[default]
    Forward,
    /// Last listed first.
    Reverse,
}

/// The list of identifiers exactly as the remote index returned it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionIndex(Vec<String>);

/// Result of filtering an index down to processable versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Versions to process, in processing order.
    pub versions: Vec<VersionId>,
    /// Entries that looked like versions but are not safe identifiers.
    pub rejected: Vec<String>,
}

impl VersionIndex {
    /// Wrap raw index entries.
    pub fn new(entries: Vec<String>) -> Self {
        Self(entries)
    }

    /// Raw entries, unfiltered.
    pub fn entries(&self) -> &[String] {
        &self.0
    }

    /// Number of raw entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the index has no entries at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether an entry is ignored outright: index pages, the sentinel,
    /// signature files and any caller-supplied names.
    pub fn is_ignored(entry: &str, extra: &[String]) -> bool {
        let entry = entry.trim();
        entry.is_empty()
            || IGNORED_ENTRIES.contains(&entry)
            || entry.ends_with(".sig")
            || extra.iter().any(|e| e == entry)
    }

    /// Filter, validate, de-duplicate and order the entries.
    pub fn select(&self, order: IndexOrder, extra_ignored: &[String]) -> Selection {
        let mut seen = HashSet::new();
        let mut selection = Selection::default();

        for entry in &self.0 {
            if Self::is_ignored(entry, extra_ignored) {
                continue;
            }
            let entry = entry.trim();
            match VersionId::new(entry) {
                Ok(id) => {
                    if seen.insert(id.clone()) {
                        selection.versions.push(id);
                    }
                }
                Err(_) => selection.rejected.push(entry.to_string()),
            }
        }

        if order == IndexOrder::Reverse {
            selection.versions.reverse();
        }
        selection
    }
}

impl From<Vec<String>> for VersionIndex {
    fn from(entries: Vec<String>) -> Self {
        Self::new(entries)
    }
}
