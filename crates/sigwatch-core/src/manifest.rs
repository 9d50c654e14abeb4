//! Checksum manifest parsing.
//!
//! A manifest is `sha512sum`-style text: one `<hex-hash> <filename>` pair per
//! line. Parsing is tolerant; lines of any other shape are skipped with a
//! warning so that one stray line does not hide the rest of a release.

use std::collections::BTreeMap;

use crate::error::{Error, Result};

/// Expected hashes per artifact file name.
///
/// Only trusted after its detached signature verified; see
/// [`crate::signature::verify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumManifest {
    entries: BTreeMap<String, String>,
    skipped: usize,
}

impl ChecksumManifest {
    /// Expected hash for `filename`, exactly as written in the manifest.
    pub fn expected(&self, filename: &str) -> Option<&str> {
        self.entries.get(filename).map(String::as_str)
    }

    /// Entries in file-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest lists no artifacts.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lines that were skipped while parsing.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

/// Parse manifest text into a [`ChecksumManifest`].
///
/// A leading `*` on the file name (binary-mode marker of GNU coreutils) is
/// dropped. When a file name repeats, the first line wins.
///
/// # Errors
///
/// Returns [`Error::Format`] only when the text is empty or whitespace.
pub fn parse_manifest(text: &str) -> Result<ChecksumManifest> {
    if text.trim().is_empty() {
        return Err(Error::Format("checksum manifest is empty".into()));
    }

    let mut entries = BTreeMap::new();
    let mut skipped = 0;

    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let (Some(hash), Some(filename), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            tracing::warn!(line = lineno + 1, "skipping malformed manifest line: {line}");
            skipped += 1;
            continue;
        };

        let filename = filename.strip_prefix('*').unwrap_or(filename);
        if filename.is_empty() {
            tracing::warn!(line = lineno + 1, "skipping manifest line without file name");
            skipped += 1;
            continue;
        }

        if entries.contains_key(filename) {
            tracing::warn!(line = lineno + 1, "skipping duplicate manifest entry for {filename}");
            skipped += 1;
            continue;
        }
        entries.insert(filename.to_string(), hash.to_string());
    }

    Ok(ChecksumManifest { entries, skipped })
}
