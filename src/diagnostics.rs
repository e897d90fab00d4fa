//! Skipped-entry diagnostics.
//!
//! A scan never aborts because one file misbehaves. Whatever could not be
//! listed, sized or read is recorded here as a [`SkippedEntry`] and handed
//! back next to the duplicate sets, so the caller sees both results and
//! exclusions.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::scanner::{HashError, ScanError};

/// The pipeline stage at which an entry was excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkipKind {
    /// A directory could not be listed.
    Traversal,
    /// A file's size could not be determined.
    Stat,
    /// A file's content could not be read.
    Read,
}

impl SkipKind {
    /// Lowercase label used in text and JSON output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Traversal => "traversal",
            Self::Stat => "stat",
            Self::Read => "read",
        }
    }
}

impl fmt::Display for SkipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A path excluded from the scan, with the reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// The excluded path
    pub path: PathBuf,
    /// Stage at which it was excluded
    pub kind: SkipKind,
    /// Human-readable cause
    pub reason: String,
}

impl SkippedEntry {
    /// Create a new skipped entry.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: SkipKind, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            reason: reason.into(),
        }
    }
}

impl From<&ScanError> for SkippedEntry {
    fn from(error: &ScanError) -> Self {
        match error {
            ScanError::Traversal { path, source } => {
                Self::new(path.clone(), SkipKind::Traversal, source.to_string())
            }
            ScanError::Stat { path, source } => {
                Self::new(path.clone(), SkipKind::Stat, source.to_string())
            }
            ScanError::NotAFile(path) => {
                Self::new(path.clone(), SkipKind::Stat, "not a regular file")
            }
        }
    }
}

impl From<ScanError> for SkippedEntry {
    fn from(error: ScanError) -> Self {
        Self::from(&error)
    }
}

impl From<&HashError> for SkippedEntry {
    fn from(error: &HashError) -> Self {
        let reason = match error {
            HashError::NotFound(_) => "file not found".to_string(),
            HashError::PermissionDenied(_) => "permission denied".to_string(),
            HashError::Io { source, .. } => source.to_string(),
        };
        Self::new(error.path().to_path_buf(), SkipKind::Read, reason)
    }
}

impl From<HashError> for SkippedEntry {
    fn from(error: HashError) -> Self {
        Self::from(&error)
    }
}

/// Ordered collection of skipped entries for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<SkippedEntry>,
}

impl Diagnostics {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one skipped entry.
    pub fn push(&mut self, entry: impl Into<SkippedEntry>) {
        let entry = entry.into();
        log::warn!("Skipping {} ({}): {}", entry.path.display(), entry.kind, entry.reason);
        self.entries.push(entry);
    }

    /// Record many skipped entries, keeping their order.
    pub fn extend<I, E>(&mut self, entries: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<SkippedEntry>,
    {
        for entry in entries {
            self.push(entry);
        }
    }

    /// Number of recorded entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in the order they were recorded.
    pub fn iter(&self) -> std::slice::Iter<'_, SkippedEntry> {
        self.entries.iter()
    }

    /// Number of entries of a given kind.
    #[must_use]
    pub fn count(&self, kind: SkipKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }

    /// Consume the collection.
    #[must_use]
    pub fn into_vec(self) -> Vec<SkippedEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a SkippedEntry;
    type IntoIter = std::slice::Iter<'a, SkippedEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
