//! BLAKE3 file hasher with streaming support.
//!
//! # Overview
//!
//! [`Hasher`] computes a content fingerprint by reading a file sequentially
//! in fixed-size chunks and feeding each chunk to an incremental BLAKE3
//! state. Memory use is one chunk buffer regardless of file size, so a
//! multi-gigabyte file costs the same 8 KiB as a tiny one.
//!
//! Digest equality is treated as content equality. BLAKE3 makes an
//! accidental collision astronomically unlikely, but this is an accepted
//! approximation rather than proof; see the byte verifier in
//! [`crate::duplicates::verify`] for a stronger check.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::HashError;

/// Size of each read from disk (8 KiB).
pub const CHUNK_SIZE: usize = 8 * 1024;

/// A BLAKE3 content digest.
pub type Hash = [u8; 32];

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    chunk_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher {
    /// Create a hasher reading [`CHUNK_SIZE`] bytes at a time.
    #[must_use]
    pub fn new() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
        }
    }

    /// Create a hasher with a custom chunk size (minimum 1 byte).
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// The number of bytes read per chunk.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Hash the complete content of a file.
    ///
    /// The file handle is dropped on every exit path, including errors
    /// partway through the stream.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or a read fails.
    pub fn full_hash(&self, path: &Path) -> Result<Hash, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        self.hash_reader(&mut file)
            .map_err(|e| HashError::from_io(path, e))
    }

    /// Hash everything a reader yields until end of stream.
    ///
    /// # Errors
    ///
    /// Returns the first non-`Interrupted` I/O error from the reader.
    pub fn hash_reader<R: Read>(&self, reader: &mut R) -> std::io::Result<Hash> {
        let mut state = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => {
                    state.update(&buffer[..n]);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        Ok(*state.finalize().as_bytes())
    }
}

/// Render a digest as 64 lowercase hex characters.
#[must_use]
pub fn hash_to_hex(hash: &Hash) -> String {
    blake3::Hash::from(*hash).to_hex().to_string()
}
