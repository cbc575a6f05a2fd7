//! # Media Organizer
//!
//! Copies photos and videos into a `YYYY/MM/DD` tree without ever losing
//! or overwriting anything.
//!
//! ## Core Philosophy
//! - **Dry run first** - nothing is copied until asked
//! - **Never overwrite** - collisions get a `_N` suffix instead
//! - **Copy once** - byte-identical sources and files already in the
//!   destination are skipped
//!
//! ## Architecture
//! The library is split into a core engine and presentation layers:
//! - `core` - Scanning, timestamps, duplicate detection, planning, copying
//! - `events` - Event-driven progress reporting
//! - `error` - Error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{OrganizerError, Result};

/// Initialize tracing for the library
///
/// Honours `RUST_LOG`; otherwise logs warnings, or debug output when
/// `verbose` is set. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
