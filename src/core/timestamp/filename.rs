//! Creation timestamps encoded in camera and app filenames.

use super::Zone;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Known naming schemes, most specific first. Every pattern exposes the
/// named groups `y`, `mo` and `d`; time groups are optional and default
/// to midnight.
const PATTERNS: &[&str] = &[
    // IMG_20250102_030405.jpg, VID_20250102_030405.mp4
    r"(?i)^(?:IMG|VID)_(?P<y>[0-9]{4})(?P<mo>[0-9]{2})(?P<d>[0-9]{2})_(?P<h>[0-9]{2})(?P<mi>[0-9]{2})(?P<s>[0-9]{2})",
    // PXL_20250102_030405123.jpg (sub-second digits dropped)
    r"(?i)^PXL_(?P<y>[0-9]{4})(?P<mo>[0-9]{2})(?P<d>[0-9]{2})_(?P<h>[0-9]{2})(?P<mi>[0-9]{2})(?P<s>[0-9]{2})[0-9]{3,}",
    // 2025-01-02 03.04.05.jpg, 2025-01-02_03.04.05.jpg
    r"^(?P<y>[0-9]{4})-(?P<mo>[0-9]{2})-(?P<d>[0-9]{2})[ _](?P<h>[0-9]{2})\.(?P<mi>[0-9]{2})\.(?P<s>[0-9]{2})",
    // IMG-20250102-WA0001.jpg
    r"(?i)^IMG-(?P<y>[0-9]{4})(?P<mo>[0-9]{2})(?P<d>[0-9]{2})-WA[0-9]+",
    // Screenshot_2025-01-02-03-04-05.png
    r"(?i)^Screenshot_(?P<y>[0-9]{4})-(?P<mo>[0-9]{2})-(?P<d>[0-9]{2})-(?P<h>[0-9]{2})-(?P<mi>[0-9]{2})-(?P<s>[0-9]{2})",
];

fn compiled() -> &'static [Regex] {
    static COMPILED: OnceLock<Vec<Regex>> = OnceLock::new();
    COMPILED.get_or_init(|| {
        PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("filename pattern is valid"))
            .collect()
    })
}

/// Parse a timestamp from a bare filename and place it in `zone`.
pub fn parse_filename_timestamp(filename: &str, zone: Zone) -> Option<DateTime<FixedOffset>> {
    zone.localize(parse_naive(filename)?)
}

/// The first pattern that matches decides. An impossible date under that
/// pattern means "no filename timestamp"; later patterns are not tried.
/// Out-of-range fields are rejected, never normalized, so `20250230` does
/// not roll over into March.
pub fn parse_naive(filename: &str) -> Option<NaiveDateTime> {
    let caps = compiled().iter().find_map(|re| re.captures(filename))?;
    from_captures(&caps)
}

fn from_captures(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let field = |name: &str| -> Option<u32> {
        match caps.name(name) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let year = i32::try_from(field("y")?).ok()?;
    NaiveDate::from_ymd_opt(year, field("mo")?, field("d")?)?.and_hms_opt(
        field("h")?,
        field("mi")?,
        field("s")?,
    )
}
