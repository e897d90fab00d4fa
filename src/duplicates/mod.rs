//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - Streaming content fingerprinting on a bounded worker pool
//! - Optional byte-by-byte verification
//! - Duplicate set assembly

pub mod finder;
pub mod groups;
pub mod verify;

pub use finder::{
    fingerprint_groups, DuplicateFinder, FinderConfig, FinderError, FingerprintStats, ScanReport,
    ScanSummary,
};
pub use groups::{
    assemble_sets, group_by_size, partition_by_hash, DuplicateSet, GroupingStats, HashGroup,
    SizeGroup,
};
pub use verify::{files_identical, verify_set, verify_sets, VerifyOutcome};
