//! Media organization module.
//!
//! Turns kept sources into date-based destination paths, checks them
//! against the destination tree, and performs the copies.

mod executor;
mod planner;
mod reconciler;
mod types;

pub use executor::{copy_file, CopyExecutor, CopyOptions, CopySummary};
pub use planner::{suffixed_name, DestinationPlanner, UNKNOWN_FOLDER};
pub use reconciler::DestinationReconciler;
pub use types::*;
