//! # Timestamp Module
//!
//! Works out a best-effort creation time for each source file.
//!
//! ## Priority
//! | Source     | Why                                             |
//! |------------|-------------------------------------------------|
//! | `metadata` | Written by the camera at capture time           |
//! | `filename` | Camera/app naming schemes encode capture intent |
//! | `mtime`    | Reflects the last copy, not the capture         |
//! | `unknown`  | Nothing usable; file goes to the unknown bucket |
//!
//! Metadata failures are never fatal. Only a missing path or a directory
//! stops attribution.

mod filename;

pub use filename::{parse_filename_timestamp, parse_naive};

use crate::core::metadata::{ExifExtractor, MetadataExtractor};
use crate::error::AttributionError;
use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Zone used for timestamps that carry no offset of their own
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Zone {
    /// The process's local zone, including its daylight-saving rules
    #[default]
    Local,
    /// A fixed UTC offset
    Fixed(FixedOffset),
}

impl Zone {
    /// UTC
    pub fn utc() -> Self {
        Zone::Fixed(Utc.fix())
    }

    /// Interpret a wall-clock time in this zone.
    ///
    /// Ambiguous local times resolve to the earlier instant; times that
    /// fall in a daylight-saving gap do not exist and yield `None`.
    pub fn localize(&self, naive: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            Zone::Local => Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&dt.offset().fix())),
            Zone::Fixed(offset) => offset.from_local_datetime(&naive).single(),
        }
    }

    /// Express an instant in this zone
    pub fn convert(&self, instant: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Zone::Local => {
                let local = instant.with_timezone(&Local);
                local.with_timezone(&local.offset().fix())
            }
            Zone::Fixed(offset) => instant.with_timezone(offset),
        }
    }
}

impl FromStr for Zone {
    type Err = String;

    /// Accepts `local`, `utc`, `Z`, or an offset such as `+02:00` / `-0530`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(Zone::Local),
            "utc" | "z" => return Ok(Zone::utc()),
            _ => {}
        }

        let invalid = || format!("invalid UTC offset '{}', expected e.g. +02:00", trimmed);
        let (sign, rest) = if let Some(rest) = trimmed.strip_prefix('+') {
            (1, rest)
        } else if let Some(rest) = trimmed.strip_prefix('-') {
            (-1, rest)
        } else {
            return Err(invalid());
        };
        let digits: String = rest.chars().filter(|c| *c != ':').collect();
        if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
        let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }

        FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
            .map(Zone::Fixed)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Local => write!(f, "local"),
            Zone::Fixed(offset) => write!(f, "{}", offset),
        }
    }
}

/// Where the best timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampSource {
    Metadata,
    Filename,
    Mtime,
    Unknown,
}

impl fmt::Display for TimestampSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimestampSource::Metadata => write!(f, "metadata"),
            TimestampSource::Filename => write!(f, "filename"),
            TimestampSource::Mtime => write!(f, "mtime"),
            TimestampSource::Unknown => write!(f, "unknown"),
        }
    }
}

/// Every timestamp candidate considered for a file, plus the winner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimestampEvidence {
    /// Embedded metadata (EXIF)
    pub metadata: Option<DateTime<FixedOffset>>,
    /// Parsed from the filename
    pub filename: Option<DateTime<FixedOffset>>,
    /// Filesystem modification time
    pub filestat: Option<DateTime<FixedOffset>>,
    /// Highest-priority candidate that is present
    pub best: Option<DateTime<FixedOffset>>,
    /// Which candidate `best` is
    pub source: TimestampSource,
}

impl TimestampEvidence {
    /// Build evidence from the raw candidates, choosing `best` by priority
    pub fn from_candidates(
        metadata: Option<DateTime<FixedOffset>>,
        filename: Option<DateTime<FixedOffset>>,
        filestat: Option<DateTime<FixedOffset>>,
    ) -> Self {
        let (best, source) = if metadata.is_some() {
            (metadata, TimestampSource::Metadata)
        } else if filename.is_some() {
            (filename, TimestampSource::Filename)
        } else if filestat.is_some() {
            (filestat, TimestampSource::Mtime)
        } else {
            (None, TimestampSource::Unknown)
        };

        Self {
            metadata,
            filename,
            filestat,
            best,
            source,
        }
    }

    /// Evidence with nothing known
    pub fn unknown() -> Self {
        Self::from_candidates(None, None, None)
    }
}

impl Default for TimestampEvidence {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Attributes creation timestamps to files
pub struct TimestampAttributor {
    zone: Zone,
    extractor: Option<Box<dyn MetadataExtractor>>,
}

impl TimestampAttributor {
    /// Attributor reading EXIF and interpreting bare times in the local zone
    pub fn new() -> Self {
        Self {
            zone: Zone::Local,
            extractor: Some(Box::new(ExifExtractor)),
        }
    }

    /// Zone for timestamps that carry no offset
    pub fn with_zone(mut self, zone: Zone) -> Self {
        self.zone = zone;
        self
    }

    /// Replace the metadata extractor
    pub fn with_extractor(mut self, extractor: Box<dyn MetadataExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Skip embedded metadata entirely
    pub fn without_metadata(mut self) -> Self {
        self.extractor = None;
        self
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    /// Collect timestamp evidence for one file.
    ///
    /// Fails only when the path cannot be stat'd or opened, or is a
    /// directory.
    pub fn attribute(&self, path: &Path) -> Result<TimestampEvidence, AttributionError> {
        let info = fs::metadata(path).map_err(|source| AttributionError::Stat {
            path: path.to_path_buf(),
            source,
        })?;
        if info.is_dir() {
            return Err(AttributionError::IsDirectory {
                path: path.to_path_buf(),
            });
        }

        let metadata = match &self.extractor {
            Some(extractor) => self.read_metadata(extractor.as_ref(), path)?,
            None => None,
        };

        // Patterns are ASCII, so a lossy name still matches its dated prefix
        let filename = path
            .file_name()
            .and_then(|n| parse_filename_timestamp(&n.to_string_lossy(), self.zone));

        let filestat = info.modified().ok().and_then(|m| self.filestat(m));

        let evidence = TimestampEvidence::from_candidates(metadata, filename, filestat);
        debug!(
            path = %path.display(),
            source = %evidence.source,
            best = ?evidence.best,
            "attributed timestamp"
        );
        Ok(evidence)
    }

    fn read_metadata(
        &self,
        extractor: &dyn MetadataExtractor,
        path: &Path,
    ) -> Result<Option<DateTime<FixedOffset>>, AttributionError> {
        let file = File::open(path).map_err(|source| AttributionError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let mut reader = BufReader::new(file);

        match extractor.created_at(path, &mut reader, self.zone) {
            Ok(found) => Ok(found),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "metadata unavailable");
                Ok(None)
            }
        }
    }

    fn filestat(&self, modified: SystemTime) -> Option<DateTime<FixedOffset>> {
        if modified == UNIX_EPOCH {
            return None;
        }
        Some(self.zone.convert(DateTime::<Utc>::from(modified)))
    }
}

impl Default for TimestampAttributor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::MediaSource;
    use crate::error::MetadataError;
    use chrono::NaiveDate;
    use filetime::FileTime;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct FakeExtractor {
        found: Option<DateTime<FixedOffset>>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl FakeExtractor {
        fn boxed(found: Option<DateTime<FixedOffset>>, fail: bool) -> Box<Self> {
            Box::new(Self {
                found,
                fail,
                calls: Arc::new(AtomicUsize::new(0)),
            })
        }
    }

    impl MetadataExtractor for FakeExtractor {
        fn created_at(
            &self,
            _path: &Path,
            source: &mut dyn MediaSource,
            _zone: Zone,
        ) -> Result<Option<DateTime<FixedOffset>>, MetadataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut sink = Vec::new();
            source.read_to_end(&mut sink)?;
            if self.fail {
                return Err(MetadataError::Decode("boom".into()));
            }
            Ok(self.found)
        }
    }

    fn zone() -> Zone {
        Zone::Fixed(FixedOffset::east_opt(2 * 3600).unwrap())
    }

    fn at(zone: Zone, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
        zone.localize(
            NaiveDate::from_ymd_opt(y, mo, d)
                .unwrap()
                .and_hms_opt(h, mi, s)
                .unwrap(),
        )
        .unwrap()
    }

    fn write_file(dir: &TempDir, name: &str, mtime: Option<i64>) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"x").unwrap();
        drop(file);
        if let Some(secs) = mtime {
            filetime::set_file_mtime(&path, FileTime::from_unix_time(secs, 0)).unwrap();
        }
        path
    }

    const MTIME_2025: i64 = 1_735_689_600; // 2025-01-01T00:00:00Z

    #[test]
    fn metadata_beats_filename_and_mtime() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "IMG_20240102_030405.jpg", Some(MTIME_2025));
        let meta = at(Zone::utc(), 2023, 12, 31, 23, 59, 59);

        let attributor = TimestampAttributor::new()
            .with_zone(zone())
            .with_extractor(FakeExtractor::boxed(Some(meta), false));
        let evidence = attributor.attribute(&path).unwrap();

        assert_eq!(evidence.source, TimestampSource::Metadata);
        assert_eq!(evidence.best, Some(meta));
        assert!(evidence.filename.is_some());
        assert!(evidence.filestat.is_some());
    }

    #[test]
    fn filename_used_when_metadata_missing() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "IMG_20240102_030405.jpg", Some(MTIME_2025));

        let attributor = TimestampAttributor::new()
            .with_zone(zone())
            .with_extractor(FakeExtractor::boxed(None, false));
        let evidence = attributor.attribute(&path).unwrap();

        assert_eq!(evidence.source, TimestampSource::Filename);
        assert_eq!(evidence.best, Some(at(zone(), 2024, 1, 2, 3, 4, 5)));
    }

    #[test]
    fn metadata_error_falls_back_to_filename() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "IMG_20240102_030405.jpg", Some(MTIME_2025));

        let extractor = FakeExtractor::boxed(None, true);
        let calls = extractor.calls.clone();
        let attributor = TimestampAttributor::new()
            .with_zone(zone())
            .with_extractor(extractor);
        let evidence = attributor.attribute(&path).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(evidence.source, TimestampSource::Filename);
        assert_eq!(evidence.metadata, None);
    }

    #[test]
    fn mtime_used_when_filename_has_no_date() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "holiday.jpg", Some(MTIME_2025));

        let attributor = TimestampAttributor::new().with_zone(Zone::utc()).without_metadata();
        let evidence = attributor.attribute(&path).unwrap();

        assert_eq!(evidence.source, TimestampSource::Mtime);
        assert_eq!(evidence.best, Some(at(Zone::utc(), 2025, 1, 1, 0, 0, 0)));
    }

    #[test]
    fn epoch_mtime_is_treated_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "holiday.jpg", Some(0));

        let attributor = TimestampAttributor::new().without_metadata();
        let evidence = attributor.attribute(&path).unwrap();

        assert_eq!(evidence.source, TimestampSource::Unknown);
        assert_eq!(evidence.best, None);
    }

    #[test]
    fn img_filename_in_utc() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "IMG_20250102_030405.jpg", Some(MTIME_2025));

        let attributor = TimestampAttributor::new()
            .with_zone(Zone::utc())
            .with_extractor(FakeExtractor::boxed(None, false));
        let evidence = attributor.attribute(&path).unwrap();

        assert_eq!(evidence.source, TimestampSource::Filename);
        assert_eq!(
            evidence.best.unwrap().to_rfc3339(),
            "2025-01-02T03:04:05+00:00"
        );
    }

    #[test]
    fn missing_file_returns_not_found() {
        let dir = TempDir::new().unwrap();
        let err = TimestampAttributor::new()
            .attribute(&dir.path().join("missing.jpg"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn directory_returns_error() {
        let dir = TempDir::new().unwrap();
        let err = TimestampAttributor::new().attribute(dir.path()).unwrap_err();
        assert!(matches!(err, AttributionError::IsDirectory { .. }));
    }

    #[test]
    fn evidence_priority_is_fixed() {
        let t1 = at(Zone::utc(), 2020, 1, 1, 0, 0, 0);
        let t2 = at(Zone::utc(), 2021, 1, 1, 0, 0, 0);

        let e = TimestampEvidence::from_candidates(None, Some(t1), Some(t2));
        assert_eq!((e.best, e.source), (Some(t1), TimestampSource::Filename));

        let e = TimestampEvidence::from_candidates(None, None, Some(t2));
        assert_eq!((e.best, e.source), (Some(t2), TimestampSource::Mtime));

        assert_eq!(TimestampEvidence::unknown().source, TimestampSource::Unknown);
    }

    #[test]
    fn zone_parses_common_spellings() {
        assert_eq!("local".parse::<Zone>().unwrap(), Zone::Local);
        assert_eq!("UTC".parse::<Zone>().unwrap(), Zone::utc());
        assert_eq!(
            "+02:00".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::east_opt(7200).unwrap())
        );
        assert_eq!(
            "-0530".parse::<Zone>().unwrap(),
            Zone::Fixed(FixedOffset::west_opt(5 * 3600 + 1800).unwrap())
        );
        assert!("02:00".parse::<Zone>().is_err());
        assert!("+2".parse::<Zone>().is_err());
        assert!("+02:75".parse::<Zone>().is_err());
    }

    #[test]
    fn source_serializes_lowercase() {
        let json = serde_json::to_string(&TimestampSource::Mtime).unwrap();
        assert_eq!(json, "\"mtime\"");
    }
}
