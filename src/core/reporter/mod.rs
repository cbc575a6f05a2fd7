//! # Reporter Module
//!
//! Turns decisions into something a person (or a script) can read.
//!
//! Each [`ReportEntry`] joins a decision with what was learned about its
//! source: size, modification time, and every timestamp candidate. That
//! is enough to see *why* a file landed where it did.

mod export;

pub use export::{export_json, export_text};

use crate::core::organize::{Action, Decision, SourceFile};
use crate::core::scanner::SourceRecord;
use crate::core::timestamp::{TimestampEvidence, Zone};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Timestamp candidates as RFC 3339 strings; absent ones are omitted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAtReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filestat: Option<String>,
}

impl From<&TimestampEvidence> for CreatedAtReport {
    fn from(evidence: &TimestampEvidence) -> Self {
        Self {
            metadata: evidence.metadata.map(rfc3339),
            filename: evidence.filename.map(rfc3339),
            filestat: evidence.filestat.map(rfc3339),
        }
    }
}

/// One line of the organize report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    #[serde(serialize_with = "lossy_path")]
    pub source_path: PathBuf,
    pub created_at: CreatedAtReport,
    pub file_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "lossy_optional_path"
    )]
    pub destination_path: Option<PathBuf>,
    pub action: Action,
    /// Only present when it differs from `destination_path`
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "lossy_optional_path"
    )]
    pub final_destination_path: Option<PathBuf>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "lossy_optional_path"
    )]
    pub duplicate_of: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Where the effective target is, used for text output
    #[serde(skip)]
    pub target: Option<PathBuf>,
}

impl ReportEntry {
    pub fn new(source: &SourceFile, decision: &Decision, zone: Zone) -> Self {
        let final_destination_path = decision
            .final_destination_path
            .clone()
            .filter(|f| Some(f) != decision.destination_path.as_ref());

        Self {
            source_path: decision.source_path.clone(),
            created_at: CreatedAtReport::from(&source.evidence),
            file_size_bytes: source.size,
            mod_time: source.modified.map(|m| system_time(m, zone)),
            destination_path: decision.destination_path.clone(),
            action: decision.action,
            final_destination_path,
            duplicate_of: decision.duplicate_of.clone(),
            error: decision.error.clone(),
            target: decision.target().map(PathBuf::from),
        }
    }
}

/// One record of the `scan --json` listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanEntry {
    #[serde(serialize_with = "lossy_path")]
    pub source_path: PathBuf,
    pub created_at: CreatedAtReport,
    pub file_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mod_time: Option<String>,
}

impl ScanEntry {
    pub fn new(record: &SourceRecord, evidence: &TimestampEvidence, zone: Zone) -> Self {
        Self {
            source_path: record.path.clone(),
            created_at: CreatedAtReport::from(evidence),
            file_size_bytes: record.size,
            mod_time: record.modified.map(|m| system_time(m, zone)),
        }
    }
}

/// RFC 3339 with whole seconds, `Z` for a zero offset
pub fn rfc3339(stamp: DateTime<FixedOffset>) -> String {
    stamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Paths that are not valid UTF-8 are written with U+FFFD in place of
/// the bad bytes instead of failing the whole report
fn lossy_path<P: AsRef<Path>, S: Serializer>(path: &P, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&path.as_ref().to_string_lossy())
}

fn lossy_optional_path<S: Serializer>(
    path: &Option<PathBuf>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match path {
        Some(path) => lossy_path(path, serializer),
        None => serializer.serialize_none(),
    }
}

fn system_time(time: SystemTime, zone: Zone) -> String {
    zone.convert(DateTime::<Utc>::from(time))
        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
