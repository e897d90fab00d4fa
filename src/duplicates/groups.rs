//! Size buckets, hash buckets and duplicate sets.
//!
//! # Overview
//!
//! This module holds the data structures that flow through the pipeline and
//! the two pure steps that need no I/O:
//!
//! - [`group_by_size`]: partition discovered files into [`SizeGroup`]s,
//!   dropping sizes seen only once (they cannot be duplicates)
//! - [`assemble_sets`]: flatten surviving [`HashGroup`]s into the final,
//!   ordered sequence of [`DuplicateSet`]s
//!
//! Ordering is deterministic: groups come in the order their size (or
//! digest) was first seen, and members keep discovery order.
//!
//! # Example
//!
//! ```
//! use dupehunter::scanner::FileEntry;
//! use dupehunter::duplicates::group_by_size;
//! use std::path::PathBuf;
//!
//! let files = vec![
//!     FileEntry::new(PathBuf::from("/file1.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file2.txt"), 1024),
//!     FileEntry::new(PathBuf::from("/file3.txt"), 2048),
//! ];
//!
//! let (groups, stats) = group_by_size(files);
//!
//! assert_eq!(stats.total_files, 3);
//! assert_eq!(stats.potential_duplicates, 2);
//! assert_eq!(groups.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::{FileEntry, Hash};

/// A group of files with the same size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeGroup {
    /// File size in bytes (shared by all files in this group)
    pub size: u64,
    /// Files with this exact size, in discovery order
    pub files: Vec<FileEntry>,
}

impl SizeGroup {
    /// Create an empty size group.
    #[must_use]
    pub fn new(size: u64) -> Self {
        Self {
            size,
            files: Vec::new(),
        }
    }

    /// Create a size group with initial files.
    #[must_use]
    pub fn with_files(size: u64, files: Vec<FileEntry>) -> Self {
        Self { size, files }
    }

    /// Add a file to this group.
    ///
    /// # Panics
    ///
    /// Debug assertion fails if file size doesn't match group size.
    pub fn add(&mut self, file: FileEntry) {
        debug_assert_eq!(
            file.size, self.size,
            "File size {} doesn't match group size {}",
            file.size, self.size
        );
        self.files.push(file);
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Check if this group has potential duplicates (2+ files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }
}

/// Files sharing both size and content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashGroup {
    /// File size in bytes
    pub size: u64,
    /// Content digest computed from the complete file
    pub hash: Hash,
    /// Files with this digest, in discovery order
    pub files: Vec<FileEntry>,
}

/// A confirmed set of identical files.
///
/// Always holds at least two paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSet {
    /// BLAKE3 digest of the shared content
    pub hash: Hash,
    /// File size in bytes, shared by every member
    pub size: u64,
    /// Member paths in discovery order
    pub files: Vec<PathBuf>,
}

impl DuplicateSet {
    /// Create a new duplicate set.
    #[must_use]
    pub fn new(hash: Hash, size: u64, files: Vec<PathBuf>) -> Self {
        Self { hash, size, files }
    }

    /// Number of files in this set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of redundant copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Bytes that removing the redundant copies would free.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }

    /// Digest as hexadecimal string.
    #[must_use]
    pub fn hash_hex(&self) -> String {
        crate::scanner::hash_to_hex(&self.hash)
    }

    /// Whether `path` is a member of this set.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|p| p == path)
    }
}

/// Statistics from size grouping phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupingStats {
    /// Total number of files processed
    pub total_files: usize,
    /// Total size of all files in bytes
    pub total_size: u64,
    /// Number of distinct file sizes
    pub unique_sizes: usize,
    /// Number of files that could be duplicates (in groups of 2+)
    pub potential_duplicates: usize,
    /// Number of files eliminated as unique (singleton groups)
    pub eliminated_unique: usize,
    /// Number of size groups with 2+ files
    pub duplicate_groups: usize,
    /// Number of zero-byte files seen (only when empty files are kept)
    pub empty_files: usize,
}

impl GroupingStats {
    /// Percentage of files eliminated by size grouping.
    #[must_use]
    pub fn elimination_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            (self.eliminated_unique as f64 / self.total_files as f64) * 100.0
        }
    }
}

/// Group files by size (first stage of duplicate detection).
///
/// Files with different sizes cannot be duplicates, so only groups of two or
/// more files are returned. No file I/O is performed.
///
/// # Example
///
/// ```
/// use dupehunter::scanner::FileEntry;
/// use dupehunter::duplicates::group_by_size;
/// use std::path::PathBuf;
///
/// let files = vec![
///     FileEntry::new(PathBuf::from("/a.txt"), 100),
///     FileEntry::new(PathBuf::from("/b.txt"), 100),
///     FileEntry::new(PathBuf::from("/c.txt"), 200),
/// ];
///
/// let (groups, stats) = group_by_size(files);
///
/// assert_eq!(groups.len(), 1);
/// assert_eq!(groups[0].size, 100);
/// assert_eq!(stats.eliminated_unique, 1);
/// ```
#[must_use]
pub fn group_by_size(
    files: impl IntoIterator<Item = FileEntry>,
) -> (Vec<SizeGroup>, GroupingStats) {
    let mut all_groups: Vec<SizeGroup> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();
    let mut stats = GroupingStats::default();

    for file in files {
        stats.total_files += 1;
        stats.total_size += file.size;
        if file.size == 0 {
            stats.empty_files += 1;
        }

        let slot = *index.entry(file.size).or_insert_with(|| {
            all_groups.push(SizeGroup::new(file.size));
            all_groups.len() - 1
        });
        all_groups[slot].add(file);
    }

    stats.unique_sizes = all_groups.len();

    let filtered_groups: Vec<SizeGroup> = all_groups
        .into_iter()
        .filter(|group| {
            if group.has_duplicates() {
                stats.potential_duplicates += group.len();
                stats.duplicate_groups += 1;
                log::debug!(
                    "Size group {} bytes: {} potential duplicates",
                    group.size,
                    group.len()
                );
                true
            } else {
                stats.eliminated_unique += group.len();
                if let Some(file) = group.files.first() {
                    log::trace!(
                        "Eliminated unique size {}: {}",
                        group.size,
                        file.path.display()
                    );
                }
                false
            }
        })
        .collect();

    (filtered_groups, stats)
}

/// Partition hashed files of one size bucket by digest.
///
/// Groups left with a single member are discarded.
#[must_use]
pub fn partition_by_hash(size: u64, hashed: Vec<(FileEntry, Hash)>) -> Vec<HashGroup> {
    let mut groups: Vec<HashGroup> = Vec::new();
    let mut index: HashMap<Hash, usize> = HashMap::new();

    for (file, hash) in hashed {
        let slot = *index.entry(hash).or_insert_with(|| {
            groups.push(HashGroup {
                size,
                hash,
                files: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].files.push(file);
    }

    groups.retain(|group| {
        let keep = group.files.len() > 1;
        if !keep {
            log::trace!(
                "Eliminated unique digest {} ({} bytes)",
                crate::scanner::hash_to_hex(&group.hash),
                size
            );
        }
        keep
    });
    groups
}

/// Flatten hash groups into duplicate sets.
///
/// Pure aggregation: order is preserved and nothing is recomputed.
#[must_use]
pub fn assemble_sets(groups: Vec<HashGroup>) -> Vec<DuplicateSet> {
    groups
        .into_iter()
        .filter(|group| group.files.len() > 1)
        .map(|group| {
            DuplicateSet::new(
                group.hash,
                group.size,
                group.files.into_iter().map(|f| f.path).collect(),
            )
        })
        .collect()
}
