//! Duplicate finder implementation.
//!
//! # Overview
//!
//! This module orchestrates the detection pipeline:
//! 1. **Walk** - Collect regular files under the root (see [`crate::scanner`])
//! 2. **Size grouping** - Bucket files by exact size, drop singletons
//! 3. **Fingerprinting** - Stream each surviving file through BLAKE3 and
//!    split buckets by digest
//! 4. **Verification** (optional) - Compare members byte by byte
//!
//! Every per-file failure becomes a [`SkippedEntry`](crate::diagnostics::SkippedEntry)
//! in the returned report; only an invalid root or a shutdown request ends
//! the scan early.
//!
//! # Example
//!
//! ```no_run
//! use dupehunter::scanner::{Walker, WalkerConfig, FileEntry, Hasher};
//! use dupehunter::duplicates::{group_by_size, fingerprint_groups, FinderConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! let files: Vec<FileEntry> = walker.walk().filter_map(Result::ok).collect();
//! let (size_groups, _) = group_by_size(files);
//!
//! let (hash_groups, stats) =
//!     fingerprint_groups(size_groups, &Hasher::new(), &FinderConfig::default());
//!
//! println!("{} files hashed, {} groups", stats.hashed_files, hash_groups.len());
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytesize::ByteSize;
use rayon::prelude::*;
use serde::Serialize;

use super::groups::{assemble_sets, group_by_size, partition_by_hash};
use super::{verify, DuplicateSet, HashGroup, SizeGroup};
use crate::diagnostics::{Diagnostics, SkippedEntry};
use crate::progress::ProgressCallback;
use crate::scanner::{FileEntry, Hash, HashError, Hasher, Walker, WalkerConfig};

/// Files above this size are logged when hashing starts.
const LARGE_FILE_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Configuration for the duplicate finder.
#[derive(Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Compare duplicate sets byte by byte after hashing.
    pub verify: bool,
    /// Directory walker configuration.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FinderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FinderConfig")
            .field("io_threads", &self.io_threads)
            .field("verify", &self.verify)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            verify: false,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Enable byte-by-byte verification.
    #[must_use]
    pub fn with_verify(mut self, enabled: bool) -> Self {
        self.verify = enabled;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

// ============================================================================
// Fingerprinting
// ============================================================================

/// Statistics from the fingerprinting stage.
#[derive(Debug, Default)]
pub struct FingerprintStats {
    /// Number of files submitted for hashing
    pub input_files: usize,
    /// Number of files successfully hashed
    pub hashed_files: usize,
    /// Total bytes read while hashing
    pub bytes_hashed: u64,
    /// Files that could not be read, in bucket order
    pub errors: Vec<HashError>,
    /// True if a shutdown request stopped hashing early
    pub interrupted: bool,
}

/// What happened to one file in the hashing pool.
enum HashOutcome {
    Hashed(Hash),
    Failed(HashError),
    Cancelled,
}

/// Fingerprint every size bucket on a bounded worker pool.
///
/// Files are hashed in parallel but regrouped in bucket order and, within
/// a bucket, in discovery order, so the result does not depend on
/// scheduling.
#[must_use]
pub fn fingerprint_groups(
    size_groups: Vec<SizeGroup>,
    hasher: &Hasher,
    config: &FinderConfig,
) -> (Vec<HashGroup>, FingerprintStats) {
    let sizes: Vec<u64> = size_groups.iter().map(|g| g.size).collect();
    let work: Vec<(usize, FileEntry)> = size_groups
        .into_iter()
        .enumerate()
        .flat_map(|(bucket, group)| group.files.into_iter().map(move |f| (bucket, f)))
        .collect();

    let mut stats = FingerprintStats {
        input_files: work.len(),
        ..Default::default()
    };

    if work.is_empty() {
        log::debug!("Fingerprinting: no files to process");
        return (Vec::new(), stats);
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_start("hashing", work.len());
    }

    log::info!(
        "Hashing {} files in {} size groups",
        work.len(),
        sizes.len()
    );

    let processed = AtomicUsize::new(0);
    let hash_one = |file: &FileEntry| -> HashOutcome {
        if config.is_shutdown_requested() {
            return HashOutcome::Cancelled;
        }

        if file.size > LARGE_FILE_THRESHOLD {
            log::debug!(
                "Hashing large file ({}): {}",
                ByteSize::b(file.size),
                file.path.display()
            );
        }

        if let Some(ref callback) = config.progress_callback {
            let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
            callback.on_progress(current, file.path.to_string_lossy().as_ref());
        }

        match hasher.full_hash(&file.path) {
            Ok(hash) => {
                log::trace!("Hashed: {}", file.path.display());
                if let Some(ref callback) = config.progress_callback {
                    callback.on_item_completed(file.size);
                }
                HashOutcome::Hashed(hash)
            }
            Err(e) => {
                log::debug!("Failed to hash {}: {}", file.path.display(), e);
                HashOutcome::Failed(e)
            }
        }
    };

    let outcomes: Vec<HashOutcome> = match rayon::ThreadPoolBuilder::new()
        .num_threads(config.io_threads.max(1))
        .build()
    {
        Ok(pool) => pool.install(|| work.par_iter().map(|(_, f)| hash_one(f)).collect()),
        Err(e) => {
            log::warn!("Failed to create hashing thread pool ({e}), hashing sequentially");
            work.iter().map(|(_, f)| hash_one(f)).collect()
        }
    };

    let mut per_bucket: Vec<Vec<(FileEntry, Hash)>> = vec![Vec::new(); sizes.len()];
    for ((bucket, file), outcome) in work.into_iter().zip(outcomes) {
        match outcome {
            HashOutcome::Hashed(hash) => {
                stats.hashed_files += 1;
                stats.bytes_hashed += file.size;
                per_bucket[bucket].push((file, hash));
            }
            HashOutcome::Failed(e) => stats.errors.push(e),
            HashOutcome::Cancelled => stats.interrupted = true,
        }
    }

    let hash_groups: Vec<HashGroup> = per_bucket
        .into_iter()
        .zip(sizes)
        .flat_map(|(hashed, size)| partition_by_hash(size, hashed))
        .collect();

    for group in &hash_groups {
        log::debug!(
            "Duplicate group {}: {} files, {} bytes each",
            crate::scanner::hash_to_hex(&group.hash),
            group.files.len(),
            group.size
        );
    }

    if let Some(ref callback) = config.progress_callback {
        callback.on_phase_end("hashing");
    }

    if stats.interrupted {
        log::info!("Hashing interrupted by shutdown signal");
    }

    log::info!(
        "Hashing complete: {} of {} files hashed, {} groups, {} unreadable",
        stats.hashed_files,
        stats.input_files,
        hash_groups.len(),
        stats.errors.len()
    );

    (hash_groups, stats)
}

// ============================================================================
// DuplicateFinder - Pipeline Orchestrator
// ============================================================================

/// Summary statistics from a duplicate scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    /// Total number of files discovered
    pub total_files: usize,
    /// Total size of all discovered files in bytes
    pub total_size: u64,
    /// Files eliminated by size grouping (unique sizes, never hashed)
    pub eliminated_by_size: usize,
    /// Zero-byte files left out of the scan
    pub empty_files_skipped: usize,
    /// Files whose content was hashed
    pub files_hashed: usize,
    /// Bytes read while hashing
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate sets
    pub duplicate_sets: usize,
    /// Total number of duplicate files (excluding one original per set)
    pub duplicate_files: usize,
    /// Space that removing the duplicates would free
    pub reclaimable_space: u64,
    /// Number of skipped entries
    pub skipped_entries: usize,
    /// Whether byte verification ran
    pub verified: bool,
    /// Duration of the entire scan
    #[serde(skip)]
    pub scan_duration: Duration,
    /// Duration of the directory walk
    #[serde(skip)]
    pub walk_duration: Duration,
    /// Duration of the hashing stage
    #[serde(skip)]
    pub hash_duration: Duration,
}

impl ScanSummary {
    /// Percentage of scanned bytes held by redundant copies.
    #[must_use]
    pub fn wasted_percentage(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            (self.reclaimable_space as f64 / self.total_size as f64) * 100.0
        }
    }

    /// Reclaimable space as a human-readable string.
    #[must_use]
    pub fn reclaimable_display(&self) -> String {
        ByteSize::b(self.reclaimable_space).to_string()
    }

    /// Total size as a human-readable string.
    #[must_use]
    pub fn total_size_display(&self) -> String {
        ByteSize::b(self.total_size).to_string()
    }

    fn record_sets(&mut self, sets: &[DuplicateSet]) {
        self.duplicate_sets = sets.len();
        self.duplicate_files = sets.iter().map(DuplicateSet::duplicate_count).sum();
        self.reclaimable_space = sets.iter().map(DuplicateSet::wasted_space).sum();
    }
}

/// Errors that abort a scan.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The provided root exists but cannot be listed.
    #[error("Cannot read directory {path}: {source}")]
    RootInaccessible {
        /// The root that failed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl FinderError {
    /// True for errors caused by a bad root path.
    #[must_use]
    pub fn is_invalid_root(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound(_) | Self::NotADirectory(_) | Self::RootInaccessible { .. }
        )
    }
}

/// The complete result of one scan.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// Confirmed duplicate sets, in deterministic order
    pub sets: Vec<DuplicateSet>,
    /// Everything excluded from the scan, with reasons
    pub diagnostics: Diagnostics,
    /// Counts and durations
    pub summary: ScanSummary,
}

impl ScanReport {
    /// Split into the `(duplicate_sets, diagnostics)` pair.
    #[must_use]
    pub fn into_parts(self) -> (Vec<DuplicateSet>, Vec<SkippedEntry>) {
        (self.sets, self.diagnostics.into_vec())
    }

    /// True if at least one duplicate set was found.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        !self.sets.is_empty()
    }
}

/// Check that `path` is a listable directory and make it absolute.
fn validate_root(path: &Path) -> Result<PathBuf, FinderError> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(FinderError::PathNotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(FinderError::RootInaccessible {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if !metadata.is_dir() {
        return Err(FinderError::NotADirectory(path.to_path_buf()));
    }

    fs::read_dir(path).map_err(|source| FinderError::RootInaccessible {
        path: path.to_path_buf(),
        source,
    })?;

    fs::canonicalize(path).map_err(|source| FinderError::RootInaccessible {
        path: path.to_path_buf(),
        source,
    })
}

/// Duplicate finder that runs the detection pipeline.
///
/// Each call to [`find_duplicates`](Self::find_duplicates) is independent:
/// no state survives between scans.
///
/// # Example
///
/// ```no_run
/// use dupehunter::duplicates::{DuplicateFinder, FinderConfig};
/// use std::path::Path;
///
/// let config = FinderConfig::default().with_io_threads(4);
/// let finder = DuplicateFinder::new(config);
///
/// let report = finder.find_duplicates(Path::new("/some/path")).unwrap();
///
/// println!("Found {} duplicate sets", report.summary.duplicate_sets);
/// println!("Reclaimable space: {}", report.summary.reclaimable_display());
/// ```
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    /// Create a new duplicate finder with the given configuration.
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// The configuration this finder runs with.
    #[must_use]
    pub fn config(&self) -> &FinderConfig {
        &self.config
    }

    /// Find all duplicate files under `path`.
    ///
    /// # Errors
    ///
    /// Returns `FinderError` if:
    /// - The path does not exist, is not a directory or cannot be listed
    /// - The scan is interrupted by shutdown signal
    ///
    /// Unreadable entries below the root never fail the scan; they are
    /// reported in [`ScanReport::diagnostics`].
    pub fn find_duplicates(&self, path: &Path) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let root = validate_root(path)?;

        log::info!("Starting duplicate scan of {}", root.display());

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_start("walking", 0);
            callback.on_message(&format!("Walking {}", root.display()));
        }

        let mut walker = Walker::new(&root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(flag.clone());
        }

        let mut diagnostics = Diagnostics::new();
        let mut files = Vec::new();
        for result in walker.walk() {
            match result {
                Ok(file) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_progress(files.len() + 1, file.path.to_string_lossy().as_ref());
                    }
                    files.push(file);
                }
                Err(e) => diagnostics.push(e),
            }
        }

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_phase_end("walking");
        }

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let walk_duration = start_time.elapsed();
        log::info!(
            "Found {} files, {} entries skipped during walk",
            files.len(),
            diagnostics.len()
        );

        let mut report = self.run_pipeline(files, diagnostics)?;
        report.summary.empty_files_skipped = walker.empty_files_skipped();
        report.summary.walk_duration = walk_duration;
        report.summary.scan_duration = start_time.elapsed();
        Ok(report)
    }

    /// Find duplicates from a pre-collected list of files.
    ///
    /// Use this when the files come from another source than the walker.
    /// Sizes are taken as given.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::Interrupted`] on shutdown.
    pub fn find_duplicates_from_files(
        &self,
        files: Vec<FileEntry>,
    ) -> Result<ScanReport, FinderError> {
        let start_time = Instant::now();
        let mut report = self.run_pipeline(files, Diagnostics::new())?;
        report.summary.scan_duration = start_time.elapsed();
        Ok(report)
    }

    /// Size grouping, fingerprinting, optional verification, assembly.
    fn run_pipeline(
        &self,
        files: Vec<FileEntry>,
        mut diagnostics: Diagnostics,
    ) -> Result<ScanReport, FinderError> {
        let mut summary = ScanSummary {
            verified: self.config.verify,
            ..Default::default()
        };

        let (size_groups, size_stats) = group_by_size(files);
        summary.total_files = size_stats.total_files;
        summary.total_size = size_stats.total_size;
        summary.eliminated_by_size = size_stats.eliminated_unique;

        log::info!(
            "Size grouping complete: {} → {} files ({:.1}% eliminated)",
            size_stats.total_files,
            size_stats.potential_duplicates,
            size_stats.elimination_rate()
        );
        log::info!(
            "Found {} files ({} total)",
            summary.total_files,
            summary.total_size_display()
        );

        if self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        if size_groups.is_empty() {
            log::info!("No potential duplicates found after size grouping");
            summary.skipped_entries = diagnostics.len();
            return Ok(ScanReport {
                sets: Vec::new(),
                diagnostics,
                summary,
            });
        }

        let hash_start = Instant::now();
        let (hash_groups, fingerprint_stats) =
            fingerprint_groups(size_groups, &self.hasher, &self.config);
        summary.hash_duration = hash_start.elapsed();
        summary.files_hashed = fingerprint_stats.hashed_files;
        summary.bytes_hashed = fingerprint_stats.bytes_hashed;
        diagnostics.extend(fingerprint_stats.errors);

        if fingerprint_stats.interrupted || self.config.is_shutdown_requested() {
            return Err(FinderError::Interrupted);
        }

        let mut sets = assemble_sets(hash_groups);

        if self.config.verify && !sets.is_empty() {
            let outcome = verify::verify_sets(
                sets,
                self.hasher.chunk_size(),
                self.config.shutdown_flag.as_deref(),
                self.config.progress_callback.as_deref(),
            );
            if outcome.interrupted {
                return Err(FinderError::Interrupted);
            }
            diagnostics.extend(outcome.errors);
            sets = outcome.sets;
        }

        summary.record_sets(&sets);
        summary.skipped_entries = diagnostics.len();

        log::info!(
            "Scan complete: {} duplicate sets, {} duplicate files, {} reclaimable, {} skipped",
            summary.duplicate_sets,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.skipped_entries
        );

        Ok(ScanReport {
            sets,
            diagnostics,
            summary,
        })
    }
}
