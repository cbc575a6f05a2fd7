//! Types for the organize module.

use crate::core::timestamp::TimestampEvidence;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// A discovered source file together with its timestamp evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub evidence: TimestampEvidence,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, size: u64, evidence: TimestampEvidence) -> Self {
        Self {
            path: path.into(),
            size,
            modified: None,
            evidence,
        }
    }

    /// Best known creation time, if any
    pub fn best(&self) -> Option<DateTime<FixedOffset>> {
        self.evidence.best
    }
}

/// A planned write: copy `source_path` to `destination_path`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub source_path: PathBuf,
    pub destination_path: PathBuf,
}

/// What happens (or happened) to a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Will be copied to its planned name
    Copy,
    /// Will be copied under a suffixed name
    CopyRenamed,
    /// Copied to its planned name
    Copied,
    /// Copied under a suffixed name
    CopiedRenamed,
    /// An identical file already sits in the destination
    SkippedIdentical,
    /// Same content as another source that is kept instead
    SkippedDuplicateSource,
    Failed,
}

impl Action {
    /// Still waiting for the copy stage
    pub fn is_pending_copy(&self) -> bool {
        matches!(self, Action::Copy | Action::CopyRenamed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Copy => "copy",
            Action::CopyRenamed => "copy_renamed",
            Action::Copied => "copied",
            Action::CopiedRenamed => "copied_renamed",
            Action::SkippedIdentical => "skipped_identical",
            Action::SkippedDuplicateSource => "skipped_duplicate_source",
            Action::Failed => "failed",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The final verdict for one source file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub source_path: PathBuf,
    /// Where the planner put it; empty for duplicate-source skips
    pub destination_path: Option<PathBuf>,
    /// Where it actually goes after checking the destination
    pub final_destination_path: Option<PathBuf>,
    pub action: Action,
    /// Canonical source this one duplicates
    pub duplicate_of: Option<PathBuf>,
    pub error: Option<String>,
}

impl Decision {
    pub fn new(source_path: impl Into<PathBuf>, action: Action) -> Self {
        Self {
            source_path: source_path.into(),
            destination_path: None,
            final_destination_path: None,
            action,
            duplicate_of: None,
            error: None,
        }
    }

    pub fn duplicate(source_path: impl Into<PathBuf>, canonical: impl Into<PathBuf>) -> Self {
        Self {
            duplicate_of: Some(canonical.into()),
            ..Self::new(source_path, Action::SkippedDuplicateSource)
        }
    }

    /// Final destination when known, otherwise the planned one
    pub fn target(&self) -> Option<&Path> {
        self.final_destination_path
            .as_deref()
            .or(self.destination_path.as_deref())
    }

    /// Record a copy failure
    pub fn fail(&mut self, message: impl Into<String>) {
        self.action = Action::Failed;
        self.error = Some(message.into());
    }
}

/// Destination paths already claimed within one planning or
/// reconciliation call.
#[derive(Debug, Clone, Default)]
pub struct ReservationSet {
    claimed: HashSet<PathBuf>,
}

impl ReservationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path`. Returns false if it was already claimed.
    pub fn reserve(&mut self, path: impl Into<PathBuf>) -> bool {
        self.claimed.insert(path.into())
    }

    pub fn is_reserved(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
