//! Directory walker implementation using jwalk.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct, the traversal collaborator of
//! the scan: it yields every regular file under a root directory as a
//! [`FileEntry`] with its size, recursing into subdirectories.
//!
//! Entries that cannot be processed are yielded as [`ScanError`] values
//! instead of stopping the walk:
//! - a subdirectory that cannot be listed yields [`ScanError::Traversal`]
//!   and its siblings are still enumerated
//! - a file whose metadata cannot be read yields [`ScanError::Stat`]
//! - a special file (fifo, socket, device) yields [`ScanError::NotAFile`]
//!
//! # Features
//!
//! - Children sorted by file name for deterministic output
//! - Optional symlink following
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Size filtering (min/max) and empty-file skipping
//! - Hidden file filtering
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use dupehunter::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Skipped: {}", e),
//!     }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
    /// Zero-byte files dropped because `include_empty` is off
    empty_skipped: AtomicUsize,
}

impl Walker {
    /// Create a new walker for the given path.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupehunter::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// ```
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
            empty_skipped: AtomicUsize::new(0),
        }
    }

    /// Number of zero-byte files the walk has dropped so far.
    #[must_use]
    pub fn empty_files_skipped(&self) -> usize {
        self.empty_skipped.load(Ordering::Relaxed)
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries
    /// before the next one.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build a gitignore matcher from the configured patterns.
    fn build_gitignore(&self) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(&self.root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a file passes size filters.
    fn passes_size_filter(&self, size: u64) -> bool {
        if let Some(min) = self.config.min_size {
            if size < min {
                return false;
            }
        }
        if let Some(max) = self.config.max_size {
            if size > max {
                return false;
            }
        }
        true
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Returns an iterator over [`FileEntry`] results. Errors are yielded
    /// as [`ScanError`] values rather than stopping iteration. The sequence
    /// is lazy and finite; children of each directory come in file-name
    /// order.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dupehunter::scanner::{Walker, WalkerConfig};
    /// use std::path::Path;
    ///
    /// let walker = Walker::new(Path::new("."), WalkerConfig::default());
    /// let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
    /// println!("Found {} files", files.len());
    /// ```
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let root = self.root.clone();

        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(move |_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });

                let Some(gi) = gitignore.as_ref() else {
                    return;
                };

                children.retain(|child| match child {
                    Ok(entry) if !entry.file_type().is_dir() => {
                        let ignored = is_ignored(gi, &root, &entry.path(), false);
                        if ignored {
                            log::trace!("Ignoring file: {}", entry.path().display());
                        }
                        !ignored
                    }
                    _ => true,
                });

                for entry in children.iter_mut().flatten() {
                    if entry.file_type().is_dir() && is_ignored(gi, &root, &entry.path(), true) {
                        log::trace!("Ignoring directory: {}", entry.path().display());
                        entry.read_children_path = None;
                    }
                }
            });

        walk_dir
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();

                    // Directories are only interesting when they failed to list
                    if file_type.is_dir() {
                        return entry
                            .read_children_error
                            .as_ref()
                            .map(|error| Err(self.handle_jwalk_error(entry.path(), error)));
                    }

                    let path = entry.path();

                    // Unfollowed links are ignored, but a dangling one is still a stat failure
                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        return match std::fs::metadata(&path) {
                            Ok(_) => {
                                log::trace!("Skipping symlink: {}", path.display());
                                None
                            }
                            Err(e) => Some(Err(self.handle_io_error(path, e))),
                        };
                    }

                    let metadata = if self.config.follow_symlinks {
                        std::fs::metadata(&path)
                    } else {
                        std::fs::symlink_metadata(&path)
                    };

                    match metadata {
                        Ok(m) if m.is_file() => self.process_file_entry(path, m.len()),
                        Ok(m) if m.is_dir() => None,
                        Ok(_) => {
                            log::debug!("Not a regular file: {}", path.display());
                            Some(Err(ScanError::NotAFile(path)))
                        }
                        Err(e) => Some(Err(self.handle_io_error(path, e))),
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Err(self.handle_entry_error(path, &e)))
                }
            })
    }

    /// Apply the size rules to a regular file.
    fn process_file_entry(&self, path: PathBuf, size: u64) -> Option<Result<FileEntry, ScanError>> {
        if size == 0 && !self.config.include_empty {
            log::debug!("Skipping empty file: {}", path.display());
            self.empty_skipped.fetch_add(1, Ordering::Relaxed);
            return None;
        }

        if !self.passes_size_filter(size) {
            log::trace!(
                "Skipping file due to size filter ({}): {}",
                size,
                path.display()
            );
            return None;
        }

        Some(Ok(FileEntry::new(path, size)))
    }

    /// Handle metadata errors for a single file.
    fn handle_io_error(&self, path: PathBuf, error: std::io::Error) -> ScanError {
        match error.kind() {
            std::io::ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
            }
            _ => {
                log::debug!("Cannot stat {}: {}", path.display(), error);
            }
        }
        ScanError::Stat {
            path,
            source: error,
        }
    }

    /// Handle an entry jwalk could not produce.
    ///
    /// Only a directory that fails to list is a traversal failure. Anything
    /// else, such as a dangling link being followed, failed its stat.
    fn handle_entry_error(&self, path: PathBuf, error: &jwalk::Error) -> ScanError {
        let is_dir = std::fs::symlink_metadata(&path).is_ok_and(|m| m.is_dir());
        if is_dir {
            return self.handle_jwalk_error(path, error);
        }
        log::debug!("Cannot stat {}: {}", path.display(), error);
        ScanError::Stat {
            path,
            source: jwalk_io_error(error),
        }
    }

    /// Handle jwalk errors for directories that cannot be listed.
    fn handle_jwalk_error(&self, path: PathBuf, error: &jwalk::Error) -> ScanError {
        log::debug!("Walker error for {}: {}", path.display(), error);
        ScanError::Traversal {
            path,
            source: jwalk_io_error(error),
        }
    }
}

fn jwalk_io_error(error: &jwalk::Error) -> std::io::Error {
    let kind = error
        .io_error()
        .map_or(std::io::ErrorKind::Other, std::io::Error::kind);
    std::io::Error::new(kind, error.to_string())
}

/// Match a path against the ignore patterns, relative to the walk root.
fn is_ignored(gitignore: &Gitignore, root: &Path, path: &Path, is_dir: bool) -> bool {
    // Gitignore matching expects relative paths with forward slashes
    let relative_path = path.strip_prefix(root).unwrap_or(path);
    let path_str = relative_path.to_string_lossy();
    let normalized_path = if cfg!(windows) {
        path_str.replace('\\', "/")
    } else {
        path_str.into_owned()
    };

    gitignore.matched(normalized_path, is_dir).is_ignore()
}
