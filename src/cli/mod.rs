//! # CLI Module
//!
//! Command-line interface for the media organizer.
//!
//! ## Usage
//! ```bash
//! # Show what would happen (dry run)
//! media-organizer organize ~/DCIM ~/Pictures
//!
//! # Copy for real
//! media-organizer organize ~/DCIM ~/Pictures --execute
//!
//! # Machine-readable plan, filename times read as UTC
//! media-organizer organize ~/DCIM ~/Pictures --json --utc
//!
//! # List media files two levels deep
//! media-organizer scan ~/DCIM --max-depth 2
//! ```

use clap::{Args, Parser, Subcommand};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use media_organizer::core::pipeline::{inventory, Pipeline, PipelineResult};
use media_organizer::core::reporter::{export_json, export_text};
use media_organizer::core::scanner::{ScanConfig, WalkDirScanner};
use media_organizer::core::timestamp::{TimestampAttributor, Zone};
use media_organizer::error::Result;
use media_organizer::events::{
    AttributeEvent, CopyEvent, Event, EventChannel, PipelineEvent, ScanEvent,
};
use std::io;
use std::path::PathBuf;
use std::thread;

/// Media Organizer - sort photos and videos into dated folders
#[derive(Parser, Debug)]
#[command(name = "media-organizer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Organize media from source into destination/YYYY/MM/DD
    Organize {
        /// Directory to read media from
        source: PathBuf,

        /// Root of the organized tree
        destination: PathBuf,

        /// Copy files (default: dry run)
        #[arg(short = 'x', long)]
        execute: bool,

        /// Output decisions as JSON
        #[arg(long)]
        json: bool,

        /// Maximum recursion depth (0 = source directory only)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Ignore files and directories starting with a dot
        #[arg(long)]
        skip_hidden: bool,

        #[command(flatten)]
        zone: ZoneArgs,
    },

    /// List media files below a directory
    Scan {
        /// Directory to scan
        directory: PathBuf,

        /// Maximum recursion depth (0 = directory only)
        #[arg(long)]
        max_depth: Option<usize>,

        /// Output records with timestamp candidates as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        zone: ZoneArgs,
    },
}

/// How to read timestamps that carry no offset
#[derive(Args, Debug, Clone)]
struct ZoneArgs {
    /// Read zone-less timestamps as UTC instead of local time
    #[arg(long, conflicts_with = "utc_offset")]
    utc: bool,

    /// Read zone-less timestamps at a fixed offset, e.g. +02:00
    #[arg(long, value_name = "±HH:MM", allow_hyphen_values = true)]
    utc_offset: Option<Zone>,
}

impl ZoneArgs {
    fn zone(&self) -> Zone {
        if self.utc {
            return Zone::utc();
        }
        self.utc_offset.unwrap_or(Zone::Local)
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    media_organizer::init_tracing(cli.verbose);

    match cli.command {
        Commands::Organize {
            source,
            destination,
            execute,
            json,
            max_depth,
            skip_hidden,
            zone,
        } => {
            let scan_config = ScanConfig {
                max_depth,
                include_hidden: !skip_hidden,
                ..ScanConfig::default()
            };
            let pipeline = Pipeline::builder()
                .source(source)
                .destination(destination)
                .scan_config(scan_config)
                .zone(zone.zone())
                .execute(execute)
                .build();
            run_organize(&pipeline, json, cli.verbose)
        }
        Commands::Scan {
            directory,
            max_depth,
            json,
            zone,
        } => {
            let scan_config = ScanConfig {
                max_depth,
                ..ScanConfig::default()
            };
            run_scan(directory, scan_config, zone.zone(), json, cli.verbose)
        }
    }
}

fn run_organize(pipeline: &Pipeline, json: bool, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    // Progress bar for text output
    let progress = if json {
        None
    } else {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        Some(pb)
    };

    let (sender, receiver) = EventChannel::new();

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        // Dropping the receiver turns every send into a no-op
        let Some(pb) = progress else {
            return;
        };

        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_message(phase.to_string());
                }
                Event::Scan(ScanEvent::Completed { total_files }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Attribute(AttributeEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Copy(CopyEvent::Started { total_files }) => {
                    pb.set_position(0);
                    pb.set_length(total_files as u64);
                }
                Event::Copy(CopyEvent::Progress(p)) => {
                    pb.set_position(p.completed as u64);
                }
                Event::Pipeline(PipelineEvent::Completed { .. })
                | Event::Pipeline(PipelineEvent::Error { .. }) => {
                    pb.finish_and_clear();
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;

    if json {
        export_json(&result.entries, io::stdout().lock())?;
        return Ok(());
    }

    let succeeded = export_text(&result.entries, io::stdout().lock(), io::stderr().lock())?;

    if verbose {
        print_summary(&term, &result, succeeded, pipeline.config().execute);
    }

    Ok(())
}

fn print_summary(term: &Term, result: &PipelineResult, succeeded: usize, executed: bool) {
    let summary = &result.summary;

    term.write_line("").ok();
    term.write_line(&format!(
        "{} processed {} of {} files in {:.1}s",
        style("✓").green().bold(),
        style(succeeded).cyan(),
        summary.total_files,
        result.duration_ms as f64 / 1000.0
    ))
    .ok();

    if executed {
        term.write_line(&format!("  {} copied", style(summary.copied).cyan()))
            .ok();
        if let Some(copy) = &result.copy {
            term.write_line(&format!(
                "  {} written, {} folders created",
                style(format_bytes(copy.bytes_copied)).yellow(),
                copy.folders_created
            ))
            .ok();
        }
    } else {
        term.write_line(&format!("  {} to copy", style(summary.to_copy).cyan()))
            .ok();
    }

    term.write_line(&format!(
        "  {} renamed to avoid a collision",
        style(summary.renamed).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} already in destination",
        style(summary.skipped_identical).cyan()
    ))
    .ok();
    let reclaimed: u64 = result.groups.iter().map(|g| g.wasted_bytes()).sum();
    term.write_line(&format!(
        "  {} duplicate sources ({} not copied twice)",
        style(summary.skipped_duplicates).cyan(),
        style(format_bytes(reclaimed)).yellow()
    ))
    .ok();

    if summary.failed > 0 {
        term.write_line(&format!("  {} failed", style(summary.failed).red().bold()))
            .ok();
    }

    if !executed {
        term.write_line("").ok();
        term.write_line(&format!(
            "{}",
            style("Dry run: nothing was copied. Re-run with --execute to copy.").dim()
        ))
        .ok();
    }
}

fn run_scan(
    directory: PathBuf,
    scan_config: ScanConfig,
    zone: Zone,
    json: bool,
    verbose: bool,
) -> Result<()> {
    if json {
        let attributor = TimestampAttributor::new().with_zone(zone);
        let entries = inventory(&directory, &scan_config, &attributor)?;
        export_json(&entries, io::stdout().lock())?;
        return Ok(());
    }

    let records = WalkDirScanner::new(scan_config).scan(&directory)?;
    for record in &records {
        println!("{}", record.relative_path);
    }

    if verbose {
        Term::stderr()
            .write_line(&format!(
                "found {} media files",
                style(records.len()).cyan()
            ))
            .ok();
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
