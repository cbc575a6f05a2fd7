//! # Metadata Module
//!
//! Reads embedded capture timestamps from media files.
//!
//! ## Extraction Order
//! 1. `DateTimeOriginal` (when the shutter fired)
//! 2. `DateTimeDigitized`
//! 3. `DateTime` (last modification by the camera or editor)
//!
//! The matching `OffsetTime*` tag is applied when present; otherwise the
//! value is read in the configured zone.
//!
//! ## Supported Formats
//! EXIF is found in JPEG, TIFF, HEIF and PNG containers. Anything else
//! simply reports no timestamp.

use crate::core::timestamp::Zone;
use crate::error::MetadataError;
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use exif::{In, Reader, Tag, Value};
use std::io::{BufRead, Seek};
use std::path::Path;

/// A readable, seekable byte stream handed to extractors
pub trait MediaSource: BufRead + Seek {}

impl<T: BufRead + Seek> MediaSource for T {}

/// Capability for pulling a creation timestamp out of a media stream.
///
/// `Ok(None)` means the file carries no timestamp. Callers treat errors
/// the same way, so implementations may fail freely on odd input.
pub trait MetadataExtractor: Send + Sync {
    fn created_at(
        &self,
        path: &Path,
        source: &mut dyn MediaSource,
        zone: Zone,
    ) -> Result<Option<DateTime<FixedOffset>>, MetadataError>;
}

/// EXIF-based extractor backed by kamadak-exif
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifExtractor;

const DATE_TAGS: [(Tag, Tag); 3] = [
    (Tag::DateTimeOriginal, Tag::OffsetTimeOriginal),
    (Tag::DateTimeDigitized, Tag::OffsetTimeDigitized),
    (Tag::DateTime, Tag::OffsetTime),
];

impl MetadataExtractor for ExifExtractor {
    fn created_at(
        &self,
        _path: &Path,
        mut source: &mut dyn MediaSource,
        zone: Zone,
    ) -> Result<Option<DateTime<FixedOffset>>, MetadataError> {
        let exif = match Reader::new().read_from_container(&mut source) {
            Ok(exif) => exif,
            Err(exif::Error::Io(e)) => return Err(MetadataError::Io(e)),
            // Not an EXIF container, or no EXIF block in it
            Err(_) => return Ok(None),
        };

        for (date_tag, offset_tag) in DATE_TAGS {
            let Some(bytes) = exif
                .get_field(date_tag, In::PRIMARY)
                .and_then(|f| first_ascii(&f.value))
            else {
                continue;
            };
            let Ok(mut stamp) = exif::DateTime::from_ascii(bytes) else {
                continue;
            };

            if let Some(offset) = exif
                .get_field(offset_tag, In::PRIMARY)
                .and_then(|f| first_ascii(&f.value))
            {
                // A malformed offset leaves the stamp zone-less
                let _ = stamp.parse_offset(offset);
            }

            if let Some(created) = to_chrono(&stamp, zone) {
                return Ok(Some(created));
            }
        }

        Ok(None)
    }
}

fn first_ascii(value: &Value) -> Option<&[u8]> {
    match value {
        Value::Ascii(parts) => parts.first().map(Vec::as_slice),
        _ => None,
    }
}

fn to_chrono(stamp: &exif::DateTime, zone: Zone) -> Option<DateTime<FixedOffset>> {
    let naive = NaiveDate::from_ymd_opt(
        i32::from(stamp.year),
        u32::from(stamp.month),
        u32::from(stamp.day),
    )?
    .and_hms_opt(
        u32::from(stamp.hour),
        u32::from(stamp.minute),
        u32::from(stamp.second),
    )?;

    match stamp.offset {
        Some(minutes) => FixedOffset::east_opt(i32::from(minutes) * 60)?
            .from_local_datetime(&naive)
            .single(),
        None => zone.localize(naive),
    }
}
