//! Byte-for-byte file equality.

use crate::error::CompareError;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

/// Bytes compared (and fingerprinted) before streaming the remainder
pub const HEADER_WINDOW: usize = 64 * 1024;

/// Chunk size for the streamed comparison past the header window
pub const CHUNK_SIZE: usize = 32 * 1024;

/// SHA-256 of a file's header window
pub type HeaderFingerprint = [u8; 32];

/// Decides whether two files hold exactly the same bytes.
///
/// Never reports a false positive. Size is checked first, so files of
/// different lengths are never opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentEngine;

impl ContentEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compare two files on disk
    pub fn identical(&self, a: &Path, b: &Path) -> Result<bool, CompareError> {
        let size_a = file_size(a)?;
        let size_b = file_size(b)?;
        if size_a != size_b {
            return Ok(false);
        }

        let file_a = open(a)?;
        let file_b = open(b)?;
        self.compare_streams(file_a, size_a, file_b, size_b)
            .map_err(|e| e.into_compare_error(a, b))
    }

    /// Compare two streams whose lengths are already known.
    ///
    /// Neither stream is read when the sizes differ.
    pub fn compare_streams<A: Read, B: Read>(
        &self,
        mut a: A,
        size_a: u64,
        mut b: B,
        size_b: u64,
    ) -> Result<bool, StreamError> {
        if size_a != size_b {
            return Ok(false);
        }

        let window = header_len(size_a);
        let mut buf_a = vec![0u8; window];
        let mut buf_b = vec![0u8; window];

        let n_a = read_full(&mut a, &mut buf_a).map_err(StreamError::First)?;
        let n_b = read_full(&mut b, &mut buf_b).map_err(StreamError::Second)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if size_a <= HEADER_WINDOW as u64 {
            return Ok(true);
        }

        let mut chunk_a = vec![0u8; CHUNK_SIZE];
        let mut chunk_b = vec![0u8; CHUNK_SIZE];
        loop {
            let n_a = read_full(&mut a, &mut chunk_a).map_err(StreamError::First)?;
            let n_b = read_full(&mut b, &mut chunk_b).map_err(StreamError::Second)?;
            if n_a != n_b || chunk_a[..n_a] != chunk_b[..n_b] {
                return Ok(false);
            }
            if n_a == 0 {
                return Ok(true);
            }
        }
    }

    /// SHA-256 over the first `min(size, HEADER_WINDOW)` bytes.
    ///
    /// Only good for narrowing candidates; equal fingerprints prove nothing.
    pub fn header_fingerprint(
        &self,
        path: &Path,
        size: u64,
    ) -> Result<HeaderFingerprint, CompareError> {
        let file = open(path)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file.take(header_len(size) as u64), &mut hasher).map_err(|source| {
            CompareError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(hasher.finalize().into())
    }
}

/// A read failure on one side of a stream comparison
#[derive(Debug)]
pub enum StreamError {
    First(io::Error),
    Second(io::Error),
}

impl StreamError {
    fn into_compare_error(self, a: &Path, b: &Path) -> CompareError {
        match self {
            StreamError::First(source) => CompareError::Read {
                path: a.to_path_buf(),
                source,
            },
            StreamError::Second(source) => CompareError::Read {
                path: b.to_path_buf(),
                source,
            },
        }
    }
}

fn header_len(size: u64) -> usize {
    usize::try_from(size).map_or(HEADER_WINDOW, |s| s.min(HEADER_WINDOW))
}

fn file_size(path: &Path) -> Result<u64, CompareError> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|source| CompareError::Stat {
            path: path.to_path_buf(),
            source,
        })
}

fn open(path: &Path) -> Result<File, CompareError> {
    File::open(path).map_err(|source| CompareError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Fill `buf` as far as the stream allows. Returns the byte count; less
/// than `buf.len()` only at end of stream.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
