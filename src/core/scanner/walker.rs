//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, MediaFilter};
use super::SourceRecord;
use crate::error::ScanError;
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth below the root (None = unlimited, 0 = root only)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            extensions: None,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: MediaFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = MediaFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { config, filter }
    }

    /// Scan `root` and return every matching file sorted by relative path.
    ///
    /// Any unreadable entry aborts the scan: a partial listing would
    /// silently change which files are treated as duplicates.
    pub fn scan(&self, root: &Path) -> Result<Vec<SourceRecord>, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        // walkdir counts the root as depth 0 and its files as depth 1
        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth + 1);
        }

        let include_hidden = self.filter.includes_hidden();
        let entries = walker
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e.path()));

        let mut records = Vec::new();
        for entry_result in entries {
            let entry = entry_result.map_err(map_walk_error)?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }

            let path = entry.path();
            if !self.filter.should_include(path) {
                continue;
            }

            let metadata = if file_type.is_symlink() {
                // Unfollowed links are listed by what they point at
                match fs::metadata(path) {
                    Ok(target) if target.is_file() => target,
                    Ok(_) => continue,
                    Err(source) => {
                        return Err(ScanError::Stat {
                            path: path.to_path_buf(),
                            source,
                        })
                    }
                }
            } else if file_type.is_file() {
                entry.metadata().map_err(map_walk_error)?
            } else {
                continue;
            };
            let relative = path.strip_prefix(root).unwrap_or(path);

            records.push(SourceRecord {
                relative_path: to_slash(relative),
                path: path.to_path_buf(),
                size: metadata.len(),
                modified: metadata.modified().ok(),
            });
        }

        // Raw path order, so names differing only in invalid UTF-8 stay apart
        records.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));
        debug!(root = %root.display(), files = records.len(), "scan finished");
        Ok(records)
    }
}

fn map_walk_error(e: walkdir::Error) -> ScanError {
    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
    let message = e.to_string();

    match e.into_io_error() {
        Some(source) if source.kind() == io::ErrorKind::PermissionDenied => {
            ScanError::PermissionDenied { path }
        }
        Some(source) => ScanError::ReadDirectory { path, source },
        // Symlink loops carry no io::Error
        None => ScanError::ReadDirectory {
            path,
            source: io::Error::other(message),
        },
    }
}

fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
