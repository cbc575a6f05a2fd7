//! Export functionality for organize reports.
//!
//! Text is one line per decision for people; JSON is the full entry list
//! for scripts.

use super::ReportEntry;
use crate::core::organize::Action;
use serde::Serialize;
use std::io::{self, Write};

/// Write any serializable value as pretty JSON followed by a newline
pub fn export_json<T: Serialize + ?Sized, W: Write>(value: &T, mut writer: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)
}

/// Write one line per entry. Failures go to `errors`, everything else to
/// `out`.
///
/// Returns how many entries ended well (copied or skipped).
pub fn export_text<W: Write, E: Write>(
    entries: &[ReportEntry],
    mut out: W,
    mut errors: E,
) -> io::Result<usize> {
    let mut succeeded = 0;

    for entry in entries {
        let source = entry.source_path.display();
        let target = entry
            .target
            .as_deref()
            .map(|t| t.display().to_string())
            .unwrap_or_default();

        match entry.action {
            Action::Copy | Action::CopyRenamed => {
                writeln!(out, "{} -> {}", source, target)?;
            }
            Action::Copied | Action::CopiedRenamed => {
                succeeded += 1;
                writeln!(out, "copied {} -> {}", source, target)?;
            }
            Action::SkippedIdentical => {
                succeeded += 1;
                writeln!(out, "skipped {} -> {} (identical)", source, target)?;
            }
            Action::SkippedDuplicateSource => {
                succeeded += 1;
                let original = entry
                    .duplicate_of
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                writeln!(out, "skipped {} (duplicate of {})", source, original)?;
            }
            Action::Failed => {
                writeln!(
                    errors,
                    "failed {}: {}",
                    source,
                    entry.error.as_deref().unwrap_or("unknown error")
                )?;
            }
        }
    }

    Ok(succeeded)
}
