//! # Core Module
//!
//! The media organizing engine.
//!
//! ## Modules
//! - `scanner` - Discovers media files in a directory tree
//! - `metadata` - Reads EXIF capture timestamps
//! - `timestamp` - Picks the best creation time per file
//! - `comparator` - Byte equality and duplicate-source resolution
//! - `organize` - Destination planning, reconciliation and copying
//! - `reporter` - Text and JSON reports
//! - `pipeline` - Orchestrates the full workflow

pub mod comparator;
pub mod metadata;
pub mod organize;
pub mod pipeline;
pub mod reporter;
pub mod scanner;
pub mod timestamp;

// Re-export commonly used types
pub use comparator::{ContentEngine, DuplicateGroup, DuplicateResolver};
pub use organize::{Action, Decision, Operation, SourceFile};
pub use scanner::SourceRecord;
pub use timestamp::{TimestampAttributor, TimestampEvidence, TimestampSource, Zone};
