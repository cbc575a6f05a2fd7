//! # Comparator Module
//!
//! Finds byte-identical files.
//!
//! ## How It Works
//! 1. Group files by exact size
//! 2. Split each size group by a SHA-256 fingerprint of the first 64 KiB
//! 3. Prove equality with a full streamed comparison
//! 4. Keep the oldest file of each cluster
//!
//! | Step        | Reads                  | Can prove equality |
//! |-------------|------------------------|--------------------|
//! | Size        | nothing                | no                 |
//! | Fingerprint | header window          | no                 |
//! | Comparison  | whole file (if needed) | yes                |

mod engine;
mod resolver;

pub use engine::{ContentEngine, HeaderFingerprint, StreamError, CHUNK_SIZE, HEADER_WINDOW};
pub use resolver::{DuplicateResolver, Resolution};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A set of byte-identical sources with one canonical member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// All members, in input order
    pub members: Vec<PathBuf>,
    /// The member that is kept
    pub canonical: PathBuf,
    /// Size shared by every member
    pub size: u64,
}

impl DuplicateGroup {
    /// Number of members that are skipped
    pub fn duplicate_count(&self) -> usize {
        self.members.len().saturating_sub(1)
    }

    /// Bytes not copied thanks to this group
    pub fn wasted_bytes(&self) -> u64 {
        self.size * self.duplicate_count() as u64
    }
}
