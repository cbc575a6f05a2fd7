//! # Scanner Module
//!
//! Discovers media files below a source root.
//!
//! ## Supported Formats
//! - Photos: JPEG, PNG, GIF, WebP, HEIC, TIFF, BMP
//! - Videos: MP4, MOV, M4V, MKV, AVI, WebM, MTS, 3GP
//!
//! Results come back sorted by their forward-slash relative path so that
//! every later stage sees the same order on every run.
//!
//! ## Example
//! ```rust,ignore
//! use media_organizer::core::scanner::{ScanConfig, WalkDirScanner};
//!
//! let scanner = WalkDirScanner::new(ScanConfig::default());
//! let records = scanner.scan(Path::new("/Users/me/DCIM"))?;
//! ```

mod filter;
mod walker;

pub use filter::{MediaFilter, PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
pub use walker::{ScanConfig, WalkDirScanner};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::SystemTime;

/// A discovered media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    /// Path relative to the scan root, always with `/` separators
    pub relative_path: String,
    /// Full path (scan root joined with the relative path)
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modified time, when the platform reports one
    pub modified: Option<SystemTime>,
}
