//! JSON output formatter for duplicate scan results.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "skipped": [
//!     { "path": "/path/to/locked", "kind": "traversal", "reason": "Permission denied" }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "duplicate_sets": 5,
//!     "reclaimable_space": 51200,
//!     "exit_code": 3,
//!     "exit_code_name": "DH003"
//!   },
//!   "generated_at": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use dupehunter::duplicates::DuplicateFinder;
//! use dupehunter::output::json::JsonOutput;
//! use std::path::Path;
//!
//! let report = DuplicateFinder::with_defaults().find_duplicates(Path::new(".")).unwrap();
//! let output = JsonOutput::from_report(&report);
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diagnostics::{Diagnostics, SkippedEntry};
use crate::duplicates::{DuplicateSet, ScanReport, ScanSummary};
use crate::error::ExitCode;

/// A single duplicate set in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateSet {
    /// BLAKE3 hash as hexadecimal string (64 characters)
    pub hash: String,
    /// File size in bytes
    pub size: u64,
    /// Absolute paths of all members
    pub files: Vec<String>,
}

impl From<&DuplicateSet> for JsonDuplicateSet {
    fn from(set: &DuplicateSet) -> Self {
        Self {
            hash: set.hash_hex(),
            size: set.size,
            files: set
                .files
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Files never hashed because their size was unique
    pub eliminated_by_size: usize,
    /// Zero-byte files left out of the scan
    pub empty_files_skipped: usize,
    /// Files whose content was hashed
    pub files_hashed: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Total number of duplicate files (excluding originals)
    pub duplicate_files: usize,
    /// Space that removing the duplicates would free (bytes)
    pub reclaimable_space: u64,
    /// Number of skipped entries
    pub skipped_entries: usize,
    /// Whether byte verification ran
    pub verified: bool,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Duration of the walk in milliseconds
    pub walk_duration_ms: u64,
    /// Duration of hashing in milliseconds
    pub hash_duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DH000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a ScanSummary and an exit code.
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, exit_code: ExitCode) -> Self {
        Self {
            total_files: summary.total_files,
            total_size: summary.total_size,
            eliminated_by_size: summary.eliminated_by_size,
            empty_files_skipped: summary.empty_files_skipped,
            files_hashed: summary.files_hashed,
            bytes_hashed: summary.bytes_hashed,
            duplicate_sets: summary.duplicate_sets,
            duplicate_files: summary.duplicate_files,
            reclaimable_space: summary.reclaimable_space,
            skipped_entries: summary.skipped_entries,
            verified: summary.verified,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            walk_duration_ms: summary.walk_duration.as_millis() as u64,
            hash_duration_ms: summary.hash_duration.as_millis() as u64,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate sets in report order
    pub duplicates: Vec<JsonDuplicateSet>,
    /// Skipped entries, separate from the sets
    pub skipped: Vec<SkippedEntry>,
    /// Scan summary statistics
    pub summary: JsonSummary,
    /// When this document was produced
    pub generated_at: DateTime<Utc>,
}

impl JsonOutput {
    /// Build the document from its parts.
    ///
    /// ```
    /// use dupehunter::diagnostics::Diagnostics;
    /// use dupehunter::duplicates::{DuplicateSet, ScanSummary};
    /// use dupehunter::error::ExitCode;
    /// use dupehunter::output::json::JsonOutput;
    /// use std::path::PathBuf;
    ///
    /// let sets = vec![DuplicateSet::new(
    ///     [0u8; 32],
    ///     1024,
    ///     vec![PathBuf::from("/file1.txt"), PathBuf::from("/file2.txt")],
    /// )];
    ///
    /// let output = JsonOutput::new(&sets, &Diagnostics::new(), &ScanSummary::default(), ExitCode::Success);
    /// assert_eq!(output.duplicates.len(), 1);
    /// ```
    #[must_use]
    pub fn new(
        sets: &[DuplicateSet],
        diagnostics: &Diagnostics,
        summary: &ScanSummary,
        exit_code: ExitCode,
    ) -> Self {
        Self {
            duplicates: sets.iter().map(JsonDuplicateSet::from).collect(),
            skipped: diagnostics.iter().cloned().collect(),
            summary: JsonSummary::from_scan_summary(summary, exit_code),
            generated_at: Utc::now(),
        }
    }

    /// Build the document for a finished scan, deriving its exit code.
    #[must_use]
    pub fn from_report(report: &ScanReport) -> Self {
        let exit_code = ExitCode::for_scan(report.has_duplicates(), report.diagnostics.len());
        Self::new(&report.sets, &report.diagnostics, &report.summary, exit_code)
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
