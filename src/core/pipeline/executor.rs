//! Pipeline execution implementation.

use crate::core::comparator::{DuplicateGroup, DuplicateResolver};
use crate::core::metadata::MetadataExtractor;
use crate::core::organize::{
    Action, CopyExecutor, CopyOptions, CopySummary, Decision, DestinationPlanner,
    DestinationReconciler, ReservationSet, SourceFile,
};
use crate::core::reporter::{ReportEntry, ScanEntry};
use crate::core::scanner::{ScanConfig, SourceRecord, WalkDirScanner};
use crate::core::timestamp::{TimestampAttributor, TimestampSource, Zone};
use crate::error::Result;
use crate::events::{
    null_sender, AttributeEvent, AttributeProgress, Event, EventSender, PipelineEvent,
    PipelinePhase, PipelineSummary, ScanEvent,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// One entry per scanned file, in scan order
    pub entries: Vec<ReportEntry>,
    /// Byte-identical source clusters
    pub groups: Vec<DuplicateGroup>,
    /// Counts per outcome
    pub summary: PipelineSummary,
    /// Present when copies were executed
    pub copy: Option<CopySummary>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Directory to organize from
    pub source: PathBuf,
    /// Root of the date-based tree
    pub destination: PathBuf,
    /// Scanner configuration
    pub scan_config: ScanConfig,
    /// Zone for timestamps without an offset
    pub zone: Zone,
    /// Perform copies; otherwise only plan (dry run)
    pub execute: bool,
    /// Copy behaviour when executing
    pub copy_options: CopyOptions,
}

/// Builder for pipeline configuration
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
    extractor: Option<Box<dyn MetadataExtractor>>,
    skip_metadata: bool,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory to read media from
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.source = path.into();
        self
    }

    /// Root of the organized tree
    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.destination = path.into();
        self
    }

    /// Set scanner configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Zone for filename and EXIF times that carry no offset
    pub fn zone(mut self, zone: Zone) -> Self {
        self.config.zone = zone;
        self
    }

    /// Replace the EXIF extractor
    pub fn extractor(mut self, extractor: Box<dyn MetadataExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Ignore embedded metadata
    pub fn skip_metadata(mut self, skip: bool) -> Self {
        self.skip_metadata = skip;
        self
    }

    /// Copy files instead of only planning
    pub fn execute(mut self, execute: bool) -> Self {
        self.config.execute = execute;
        self
    }

    /// Allow replacing files at the destination
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.config.copy_options.overwrite = overwrite;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Pipeline {
        let mut attributor = TimestampAttributor::new().with_zone(self.config.zone);
        if let Some(extractor) = self.extractor {
            attributor = attributor.with_extractor(extractor);
        }
        if self.skip_metadata {
            attributor = attributor.without_metadata();
        }

        Pipeline {
            config: self.config,
            attributor,
        }
    }
}

/// The organize pipeline: scan, attribute, dedupe, plan, reconcile, copy
pub struct Pipeline {
    config: PipelineConfig,
    attributor: TimestampAttributor,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<PipelineResult> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// Nothing is written to the destination unless every stage before the
    /// copy succeeded.
    pub fn run_with_events(&self, events: &EventSender) -> Result<PipelineResult> {
        events.send(Event::Pipeline(PipelineEvent::Started));

        match self.run_stages(events) {
            Ok(result) => {
                events.send(Event::Pipeline(PipelineEvent::Completed {
                    summary: result.summary.clone(),
                }));
                Ok(result)
            }
            Err(e) => {
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                Err(e)
            }
        }
    }

    fn run_stages(&self, events: &EventSender) -> Result<PipelineResult> {
        let start_time = Instant::now();

        // Phase 1: Scanning
        phase(events, PipelinePhase::Scanning);
        let records = scan(&self.config.source, &self.config.scan_config, events)?;

        // Phase 2: Timestamps
        phase(events, PipelinePhase::Attributing);
        let sources = self.attribute(&records, events)?;

        // Phase 3: Duplicate sources
        phase(events, PipelinePhase::Deduplicating);
        let resolution = DuplicateResolver::new().resolve_with_events(&sources, events)?;

        // Phase 4: Planning
        phase(events, PipelinePhase::Planning);
        let planner = DestinationPlanner::new(&self.config.destination);
        let operations = planner.plan(&resolution.kept, &mut ReservationSet::new());

        // Phase 5: Destination check
        phase(events, PipelinePhase::Reconciling);
        let reconciled =
            DestinationReconciler::new().reconcile_with_events(&operations, events)?;
        let mut decisions = merge_decisions(resolution.decisions, reconciled);

        // Phase 6: Copying
        let copy = if self.config.execute {
            phase(events, PipelinePhase::Copying);
            let executor = CopyExecutor::new(self.config.copy_options);
            Some(executor.execute_with_events(&mut decisions, events))
        } else {
            None
        };

        let entries: Vec<ReportEntry> = sources
            .iter()
            .zip(&decisions)
            .map(|(source, decision)| ReportEntry::new(source, decision, self.config.zone))
            .collect();

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let summary = summarize(&decisions, duration_ms);
        info!(
            total = summary.total_files,
            to_copy = summary.to_copy,
            skipped_identical = summary.skipped_identical,
            skipped_duplicates = summary.skipped_duplicates,
            copied = summary.copied,
            failed = summary.failed,
            "pipeline finished"
        );

        Ok(PipelineResult {
            entries,
            groups: resolution.groups,
            summary,
            copy,
            duration_ms,
        })
    }

    fn attribute(&self, records: &[SourceRecord], events: &EventSender) -> Result<Vec<SourceFile>> {
        let total = records.len();
        events.send(Event::Attribute(AttributeEvent::Started { total_files: total }));

        let mut sources = Vec::with_capacity(total);
        for (i, record) in records.iter().enumerate() {
            let evidence = self.attributor.attribute(&record.path)?;
            sources.push(SourceFile {
                path: record.path.clone(),
                size: record.size,
                modified: record.modified,
                evidence,
            });
            events.send(Event::Attribute(AttributeEvent::Progress(AttributeProgress {
                completed: i + 1,
                total,
                current_path: record.path.clone(),
            })));
        }

        let unknown = sources
            .iter()
            .filter(|s| s.evidence.source == TimestampSource::Unknown)
            .count();
        events.send(Event::Attribute(AttributeEvent::Completed {
            dated: total - unknown,
            unknown,
        }));
        Ok(sources)
    }
}

/// Scan a directory and attribute every file, without planning anything
pub fn inventory(
    root: &Path,
    scan_config: &ScanConfig,
    attributor: &TimestampAttributor,
) -> Result<Vec<ScanEntry>> {
    let records = scan(root, scan_config, &null_sender())?;
    records
        .iter()
        .map(|record| -> Result<ScanEntry> {
            let evidence = attributor.attribute(&record.path)?;
            Ok(ScanEntry::new(record, &evidence, attributor.zone()))
        })
        .collect()
}

fn scan(root: &Path, config: &ScanConfig, events: &EventSender) -> Result<Vec<SourceRecord>> {
    events.send(Event::Scan(ScanEvent::Started {
        root: root.to_path_buf(),
    }));
    let records = WalkDirScanner::new(config.clone()).scan(root)?;
    debug!(root = %root.display(), files = records.len(), "scan complete");
    events.send(Event::Scan(ScanEvent::Completed {
        total_files: records.len(),
    }));
    Ok(records)
}

fn phase(events: &EventSender, phase: PipelinePhase) {
    events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));
}

/// Reconciler output replaces the resolver's `copy` placeholders;
/// duplicate-source skips always stand. Order follows `resolved`.
fn merge_decisions(resolved: Vec<Decision>, reconciled: Vec<Decision>) -> Vec<Decision> {
    let mut by_source: HashMap<PathBuf, Decision> = reconciled
        .into_iter()
        .map(|d| (d.source_path.clone(), d))
        .collect();

    resolved
        .into_iter()
        .map(|decision| {
            if decision.action == Action::SkippedDuplicateSource {
                return decision;
            }
            match by_source.remove(&decision.source_path) {
                Some(reconciled) => reconciled,
                None => {
                    let mut missing = decision;
                    missing.fail("no destination planned");
                    missing
                }
            }
        })
        .collect()
}

fn summarize(decisions: &[Decision], duration_ms: u64) -> PipelineSummary {
    let mut summary = PipelineSummary {
        total_files: decisions.len(),
        duration_ms,
        ..Default::default()
    };

    for decision in decisions {
        match decision.action {
            Action::Copy => summary.to_copy += 1,
            Action::CopyRenamed => {
                summary.to_copy += 1;
                summary.renamed += 1;
            }
            Action::Copied => summary.copied += 1,
            Action::CopiedRenamed => {
                summary.copied += 1;
                summary.renamed += 1;
            }
            Action::SkippedIdentical => summary.skipped_identical += 1,
            Action::SkippedDuplicateSource => summary.skipped_duplicates += 1,
            Action::Failed => summary.failed += 1,
        }
    }

    summary
}
