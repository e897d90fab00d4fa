//! Byte-by-byte verification of duplicate sets.
//!
//! Digest equality is an approximation. When verification is enabled, every
//! set is re-read and each member is compared chunk by chunk against a
//! reference member before the set is reported.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use super::DuplicateSet;
use crate::progress::ProgressCallback;
use crate::scanner::HashError;

/// Result of verifying a batch of duplicate sets.
#[derive(Debug, Default)]
pub struct VerifyOutcome {
    /// Sets whose members were confirmed byte-identical
    pub sets: Vec<DuplicateSet>,
    /// Members excluded because they could not be read
    pub errors: Vec<HashError>,
    /// Number of sets that lost or split members
    pub rejected_sets: usize,
    /// True if a shutdown request stopped verification early
    pub interrupted: bool,
}

/// Compare two files byte by byte using `chunk_size`-byte windows.
///
/// # Errors
///
/// Returns [`HashError`] naming whichever file failed to open or read.
pub fn files_identical(a: &Path, b: &Path, chunk_size: usize) -> Result<bool, HashError> {
    let chunk_size = chunk_size.max(1);
    let mut file_a = File::open(a).map_err(|e| HashError::from_io(a, e))?;
    let mut file_b = File::open(b).map_err(|e| HashError::from_io(b, e))?;

    let mut buf_a = vec![0u8; chunk_size];
    let mut buf_b = vec![0u8; chunk_size];

    loop {
        let n_a = fill(&mut file_a, &mut buf_a).map_err(|e| HashError::from_io(a, e))?;
        let n_b = fill(&mut file_b, &mut buf_b).map_err(|e| HashError::from_io(b, e))?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the stream ends.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Verify a single set, splitting it into byte-identical groups.
///
/// The first member is the reference. Members equal to it stay with it;
/// the rest form a new candidate group that is checked the same way.
/// Unreadable members are excluded and returned as errors. If the
/// reference is unreadable the next member takes its place.
#[must_use]
pub fn verify_set(set: DuplicateSet, chunk_size: usize) -> (Vec<DuplicateSet>, Vec<HashError>) {
    let DuplicateSet { hash, size, files } = set;
    let mut confirmed = Vec::new();
    let mut errors = Vec::new();
    let mut pending: Vec<PathBuf> = files;

    while pending.len() >= 2 {
        let mut members = pending.into_iter();
        let Some(reference) = members.next() else {
            break;
        };

        let mut matched = vec![reference.clone()];
        let mut leftover = Vec::new();
        let mut reference_lost = false;

        while let Some(candidate) = members.next() {
            match files_identical(&reference, &candidate, chunk_size) {
                Ok(true) => matched.push(candidate),
                Ok(false) => {
                    log::debug!(
                        "Content mismatch despite equal digest: {} vs {}",
                        reference.display(),
                        candidate.display()
                    );
                    leftover.push(candidate);
                }
                Err(e) if e.path() == reference.as_path() => {
                    errors.push(e);
                    reference_lost = true;
                    leftover.push(candidate);
                    leftover.extend(members.by_ref());
                }
                Err(e) => errors.push(e),
            }
        }

        if reference_lost {
            // Members already matched get another chance under a new reference
            pending = matched.into_iter().skip(1).chain(leftover).collect();
            continue;
        }

        if matched.len() >= 2 {
            confirmed.push(DuplicateSet::new(hash, size, matched));
        }
        pending = leftover;
    }

    (confirmed, errors)
}

/// Verify every set in order, checking `shutdown_flag` between sets.
#[must_use]
pub fn verify_sets(
    sets: Vec<DuplicateSet>,
    chunk_size: usize,
    shutdown_flag: Option<&AtomicBool>,
    progress: Option<&dyn ProgressCallback>,
) -> VerifyOutcome {
    let mut outcome = VerifyOutcome::default();

    if let Some(callback) = progress {
        callback.on_phase_start("verifying", sets.len());
    }
    log::info!("Verifying {} duplicate sets byte by byte", sets.len());

    for (idx, set) in sets.into_iter().enumerate() {
        if shutdown_flag.is_some_and(|f| f.load(Ordering::SeqCst)) {
            log::debug!("Verification: shutdown requested, stopping");
            outcome.interrupted = true;
            break;
        }

        if let Some(callback) = progress {
            if let Some(first) = set.files.first() {
                callback.on_progress(idx + 1, first.to_string_lossy().as_ref());
            }
        }

        let original_len = set.len();
        let total_bytes = set.size * original_len as u64;
        let (confirmed, errors) = verify_set(set, chunk_size);

        let kept: usize = confirmed.iter().map(DuplicateSet::len).sum();
        if confirmed.len() != 1 || kept != original_len {
            outcome.rejected_sets += 1;
        }
        outcome.sets.extend(confirmed);
        outcome.errors.extend(errors);

        if let Some(callback) = progress {
            callback.on_item_completed(total_bytes);
        }
    }

    if let Some(callback) = progress {
        callback.on_phase_end("verifying");
    }
    log::info!(
        "Verification complete: {} sets confirmed, {} altered",
        outcome.sets.len(),
        outcome.rejected_sets
    );

    outcome
}
