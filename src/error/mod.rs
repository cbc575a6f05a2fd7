//! # Error Module
//!
//! Error types for the media organizer.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - every I/O failure names the path it concerns
//! - **Fail before writing** - planning errors abort the run before any copy starts

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum OrganizerError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Timestamp attribution error: {0}")]
    Attribution(#[from] AttributionError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}

/// Errors that occur while walking the source tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that stop timestamp attribution for a file.
///
/// Metadata decoding problems never show up here; they are swallowed
/// and the attributor falls through to the next timestamp source.
#[derive(Error, Debug)]
pub enum AttributionError {
    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Expected a file but found a directory: {path}")]
    IsDirectory { path: PathBuf },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl AttributionError {
    /// True when the underlying cause is a missing file
    pub fn is_not_found(&self) -> bool {
        match self {
            AttributionError::Stat { source, .. } | AttributionError::Open { source, .. } => {
                source.kind() == std::io::ErrorKind::NotFound
            }
            AttributionError::IsDirectory { .. } => false,
        }
    }
}

/// Errors from an embedded-metadata extractor.
///
/// The attributor treats every one of these as "no metadata timestamp".
#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("Failed to read metadata: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode metadata: {0}")]
    Decode(String),
}

/// Errors raised while comparing file contents or probing the destination.
///
/// These are fatal to the surrounding batch: a partial duplicate or
/// collision determination is never acted on.
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Failed to stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from a single copy operation.
///
/// Recorded on the affected decision; other copies keep going.
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Destination file already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to open source {path}: {source}")]
    OpenSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create destination {path}: {source}")]
    CreateDestination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy content to {path}: {source}")]
    WriteContent {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to flush {path} to disk: {source}")]
    Sync {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, OrganizerError>;
