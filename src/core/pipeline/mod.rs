//! # Pipeline Module
//!
//! Orchestrates the full organize workflow.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover media files below the source root
//! 2. **Attribute** - Work out a creation timestamp per file
//! 3. **Dedupe** - Collapse byte-identical sources onto the oldest
//! 4. **Plan** - Compute `YYYY/MM/DD` destinations
//! 5. **Reconcile** - Check planned names against the destination tree
//! 6. **Copy** - Only with `execute`; otherwise the run is a dry run
//!
//! ## Parallelism
//! Header fingerprints are hashed with rayon; everything else runs in
//! order so that repeated runs make the same decisions.

mod executor;

pub use executor::{inventory, Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
