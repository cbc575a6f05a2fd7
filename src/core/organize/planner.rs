//! Plan generator: date-based destination paths.
//!
//! Pure path arithmetic. Nothing on disk is consulted here; collisions with
//! files already in the destination are the reconciler's job.

use super::types::*;
use chrono::{DateTime, Datelike, FixedOffset};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// Folder used for files with no usable timestamp
pub const UNKNOWN_FOLDER: &str = "unknown";

/// Computes `<root>/YYYY/MM/DD/<filename>` destinations
#[derive(Debug, Clone)]
pub struct DestinationPlanner {
    root: PathBuf,
}

impl DestinationPlanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Plan a destination for every source, in order.
    ///
    /// Names claimed earlier in `reservations` are suffixed `_1`, `_2`, ...
    pub fn plan(&self, sources: &[SourceFile], reservations: &mut ReservationSet) -> Vec<Operation> {
        sources
            .iter()
            .map(|source| Operation {
                source_path: source.path.clone(),
                destination_path: self.destination(&source.path, source.best(), reservations),
            })
            .collect()
    }

    /// Destination for one file. Claims the returned path.
    pub fn destination(
        &self,
        source: &Path,
        created_at: Option<DateTime<FixedOffset>>,
        reservations: &mut ReservationSet,
    ) -> PathBuf {
        let dir = self.root.join(Self::build_folder_path(created_at));
        let filename = file_name(source);

        let mut n = 0;
        loop {
            let candidate = dir.join(suffixed_name(&filename, n));
            if reservations.reserve(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// `YYYY/MM/DD` in the timestamp's own zone, or `unknown`
    pub fn build_folder_path(created_at: Option<DateTime<FixedOffset>>) -> String {
        match created_at {
            Some(date) => format!("{:04}/{:02}/{:02}", date.year(), date.month(), date.day()),
            None => UNKNOWN_FOLDER.to_string(),
        }
    }
}

/// Base filename of a path, bytes untouched
pub(crate) fn file_name(path: &Path) -> OsString {
    path.file_name().map(OsStr::to_os_string).unwrap_or_default()
}

/// `name.ext` for `n == 0`, otherwise `name_n.ext`.
///
/// The extension starts at the last dot, so `archive.tar.gz` becomes
/// `archive.tar_1.gz`, `README` becomes `README_1` and `.hidden` becomes
/// `_1.hidden`. Names that are not valid UTF-8 keep their exact bytes.
pub fn suffixed_name(filename: &OsStr, n: usize) -> OsString {
    if n == 0 {
        return filename.to_os_string();
    }

    let suffix = format!("_{}", n);
    let path = Path::new(filename);
    let mut name = OsString::with_capacity(filename.len() + suffix.len());
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) => {
            name.push(stem);
            name.push(&suffix);
            name.push(".");
            name.push(ext);
        }
        // A leading dot is the only dot: everything after it is the extension
        _ if filename.as_encoded_bytes().first() == Some(&b'.') => {
            name.push(&suffix);
            name.push(filename);
        }
        _ => {
            name.push(filename);
            name.push(&suffix);
        }
    }
    name
}
