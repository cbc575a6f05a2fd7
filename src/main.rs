//! # media-organizer CLI
//!
//! Command-line interface for the media organizer.
//!
//! ## Usage
//! ```bash
//! media-organizer organize ~/DCIM ~/Pictures --execute
//! media-organizer scan ~/DCIM --json
//! ```

mod cli;

use media_organizer::Result;

fn main() -> Result<()> {
    cli::run()
}
