//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the organizer pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Timestamp attribution events
    Attribute(AttributeEvent),
    /// Duplicate resolution events
    Dedupe(DedupeEvent),
    /// Destination reconciliation events
    Reconcile(ReconcileEvent),
    /// Copy execution events
    Copy(CopyEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { root: PathBuf },
    /// Scanning completed
    Completed { total_files: usize },
}

/// Events while working out creation timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttributeEvent {
    /// Attribution has started
    Started { total_files: usize },
    /// Progress update
    Progress(AttributeProgress),
    /// Attribution completed
    Completed {
        /// Files whose best timestamp is known
        dated: usize,
        /// Files that land in the unknown bucket
        unknown: usize,
    },
}

/// Progress information during attribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeProgress {
    /// Files attributed so far
    pub completed: usize,
    /// Total files to attribute
    pub total: usize,
    /// File just attributed
    pub current_path: PathBuf,
}

/// Events during duplicate resolution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DedupeEvent {
    /// Resolution has started
    Started { total_files: usize },
    /// A duplicate group was found
    DuplicateFound {
        canonical: PathBuf,
        duplicate_count: usize,
    },
    /// Resolution completed
    Completed {
        total_groups: usize,
        total_duplicates: usize,
    },
}

/// Events while probing the destination tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReconcileEvent {
    /// Reconciliation has started
    Started { total_operations: usize },
    /// Reconciliation completed
    Completed {
        to_copy: usize,
        renamed: usize,
        already_present: usize,
    },
}

/// Events during copy execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CopyEvent {
    /// Copying has started
    Started { total_files: usize },
    /// Progress update
    Progress(CopyProgress),
    /// A single copy failed; the rest continue
    Error { path: PathBuf, message: String },
    /// Copying completed
    Completed { copied: usize, failed: usize },
}

/// Progress information during copying
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyProgress {
    /// Copies attempted so far
    pub completed: usize,
    /// Total copies to attempt
    pub total: usize,
    /// Source file just copied
    pub current_path: PathBuf,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Attributing,
    Deduplicating,
    Planning,
    Reconciling,
    Copying,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Total source files considered
    pub total_files: usize,
    /// Files planned for (or given) a fresh copy
    pub to_copy: usize,
    /// Files that were copied under a suffixed name
    pub renamed: usize,
    /// Files already present at the destination
    pub skipped_identical: usize,
    /// Files skipped as duplicates of another source
    pub skipped_duplicates: usize,
    /// Files actually copied (execute mode only)
    pub copied: usize,
    /// Files whose copy failed
    pub failed: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Attributing => write!(f, "Reading timestamps"),
            PipelinePhase::Deduplicating => write!(f, "Finding duplicates"),
            PipelinePhase::Planning => write!(f, "Planning"),
            PipelinePhase::Reconciling => write!(f, "Checking destination"),
            PipelinePhase::Copying => write!(f, "Copying"),
        }
    }
}
