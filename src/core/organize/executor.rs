//! Executor for reconciled decisions.

use super::types::*;
use crate::error::CopyError;
use crate::events::{null_sender, CopyEvent, CopyProgress, Event, EventSender};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, warn};

/// Copy behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopyOptions {
    /// Replace files that already exist at the destination
    pub overwrite: bool,
}

impl CopyOptions {
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// Result of executing the copies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopySummary {
    pub copied: usize,
    pub failed: usize,
    pub bytes_copied: u64,
    pub folders_created: usize,
    pub duration_ms: u64,
}

/// Performs the `copy`/`copy_renamed` decisions
#[derive(Debug, Clone, Default)]
pub struct CopyExecutor {
    options: CopyOptions,
}

impl CopyExecutor {
    pub fn new(options: CopyOptions) -> Self {
        Self { options }
    }

    pub fn execute(&self, decisions: &mut [Decision]) -> CopySummary {
        self.execute_with_events(decisions, &null_sender())
    }

    /// Copy every pending decision to its final destination.
    ///
    /// Successes become `copied`/`copied_renamed`; failures become `failed`
    /// with the error attached and do not stop the remaining copies.
    pub fn execute_with_events(
        &self,
        decisions: &mut [Decision],
        events: &EventSender,
    ) -> CopySummary {
        let start = Instant::now();
        let total = decisions.iter().filter(|d| d.action.is_pending_copy()).count();
        events.send(Event::Copy(CopyEvent::Started { total_files: total }));

        let mut summary = CopySummary::default();
        let mut created_dirs: HashSet<PathBuf> = HashSet::new();
        let mut completed = 0;

        for decision in decisions.iter_mut().filter(|d| d.action.is_pending_copy()) {
            let outcome = match decision.target().map(Path::to_path_buf) {
                Some(target) => self.copy_one(&decision.source_path, &target, &mut created_dirs),
                None => Err(CopyError::CreateDestination {
                    path: PathBuf::new(),
                    source: io::Error::new(ErrorKind::InvalidInput, "no destination planned"),
                }),
            };

            match outcome {
                Ok((bytes, new_dirs)) => {
                    decision.action = match decision.action {
                        Action::CopyRenamed => Action::CopiedRenamed,
                        _ => Action::Copied,
                    };
                    summary.copied += 1;
                    summary.bytes_copied += bytes;
                    summary.folders_created += new_dirs;
                }
                Err(e) => {
                    warn!(source = %decision.source_path.display(), error = %e, "copy failed");
                    events.send(Event::Copy(CopyEvent::Error {
                        path: decision.source_path.clone(),
                        message: e.to_string(),
                    }));
                    decision.fail(e.to_string());
                    summary.failed += 1;
                }
            }

            completed += 1;
            events.send(Event::Copy(CopyEvent::Progress(CopyProgress {
                completed,
                total,
                current_path: decision.source_path.clone(),
            })));
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        events.send(Event::Copy(CopyEvent::Completed {
            copied: summary.copied,
            failed: summary.failed,
        }));
        summary
    }

    /// Returns bytes written and the number of directories created
    fn copy_one(
        &self,
        source: &Path,
        target: &Path,
        created_dirs: &mut HashSet<PathBuf>,
    ) -> Result<(u64, usize), CopyError> {
        let mut new_dirs = 0;
        if let Some(parent) = target.parent() {
            if !created_dirs.contains(parent) {
                if !parent.is_dir() {
                    new_dirs = 1;
                }
                fs::create_dir_all(parent).map_err(|source| CopyError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
                created_dirs.insert(parent.to_path_buf());
            }
        }

        let bytes = copy_file(source, target, self.options.overwrite)?;
        debug!(source = %source.display(), target = %target.display(), bytes, "copied");
        Ok((bytes, new_dirs))
    }
}

/// Copy `source` to `target`, flushing to disk before returning.
///
/// Without `overwrite` the target is created exclusively, so an existing
/// file is never touched. A partially written file is removed when this
/// call created it.
pub fn copy_file(source: &Path, target: &Path, overwrite: bool) -> Result<u64, CopyError> {
    let mut input = File::open(source).map_err(|e| CopyError::OpenSource {
        path: source.to_path_buf(),
        source: e,
    })?;
    let permissions = input
        .metadata()
        .map_err(|e| CopyError::OpenSource {
            path: source.to_path_buf(),
            source: e,
        })?
        .permissions();

    let mut options = OpenOptions::new();
    options.write(true);
    if overwrite {
        options.create(true).truncate(true);
    } else {
        options.create_new(true);
    }

    let mut output = options.open(target).map_err(|e| {
        if e.kind() == ErrorKind::AlreadyExists {
            CopyError::DestinationExists {
                path: target.to_path_buf(),
            }
        } else {
            CopyError::CreateDestination {
                path: target.to_path_buf(),
                source: e,
            }
        }
    })?;

    let written = io::copy(&mut input, &mut output).and_then(|bytes| {
        output.set_permissions(permissions)?;
        Ok(bytes)
    });
    let bytes = match written {
        Ok(bytes) => bytes,
        Err(e) => {
            drop(output);
            if !overwrite {
                let _ = fs::remove_file(target);
            }
            return Err(CopyError::WriteContent {
                path: target.to_path_buf(),
                source: e,
            });
        }
    };

    output.sync_all().map_err(|e| CopyError::Sync {
        path: target.to_path_buf(),
        source: e,
    })?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use tempfile::TempDir;

    fn pending(source: &Path, target: PathBuf, action: Action) -> Decision {
        let mut decision = Decision::new(source, action);
        decision.destination_path = Some(target.clone());
        decision.final_destination_path = Some(target);
        decision
    }

    #[test]
    fn copies_and_creates_folders() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("a.jpg");
        fs::write(&file, b"test content").unwrap();

        let target = dst.path().join("2024/01/15/a.jpg");
        let mut decisions = vec![pending(&file, target.clone(), Action::Copy)];
        let summary = CopyExecutor::default().execute(&mut decisions);

        assert_eq!(summary.copied, 1);
        assert_eq!(summary.bytes_copied, 12);
        assert_eq!(summary.folders_created, 1);
        assert_eq!(decisions[0].action, Action::Copied);
        assert_eq!(fs::read(&target).unwrap(), b"test content");
        assert!(file.exists());
    }

    #[test]
    fn renamed_copy_flips_to_copied_renamed() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();

        let mut decisions = vec![pending(&file, dst.path().join("a_1.jpg"), Action::CopyRenamed)];
        CopyExecutor::default().execute(&mut decisions);
        assert_eq!(decisions[0].action, Action::CopiedRenamed);
    }

    #[test]
    fn refuses_to_overwrite_by_default() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("a.jpg");
        fs::write(&file, b"new").unwrap();
        let target = dst.path().join("a.jpg");
        fs::write(&target, b"old").unwrap();

        let mut decisions = vec![pending(&file, target.clone(), Action::Copy)];
        let summary = CopyExecutor::default().execute(&mut decisions);

        assert_eq!(summary.failed, 1);
        assert_eq!(decisions[0].action, Action::Failed);
        assert!(decisions[0].error.as_deref().unwrap().contains("already exists"));
        assert_eq!(fs::read(&target).unwrap(), b"old");
    }

    #[test]
    fn overwrite_replaces_existing_file() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("a.jpg");
        fs::write(&file, b"new").unwrap();
        let target = dst.path().join("a.jpg");
        fs::write(&target, b"older content").unwrap();

        let mut decisions = vec![pending(&file, target.clone(), Action::Copy)];
        let executor = CopyExecutor::new(CopyOptions::default().with_overwrite(true));
        let summary = executor.execute(&mut decisions);

        assert_eq!(summary.copied, 1);
        assert_eq!(fs::read(&target).unwrap(), b"new");
    }

    #[test]
    fn failure_does_not_stop_other_copies() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let good = src.path().join("good.jpg");
        fs::write(&good, b"ok").unwrap();

        let mut decisions = vec![
            pending(Path::new("/nonexistent/missing.jpg"), dst.path().join("missing.jpg"), Action::Copy),
            pending(&good, dst.path().join("good.jpg"), Action::Copy),
        ];
        let summary = CopyExecutor::default().execute(&mut decisions);

        assert_eq!((summary.copied, summary.failed), (1, 1));
        assert_eq!(decisions[0].action, Action::Failed);
        assert_eq!(decisions[1].action, Action::Copied);
        assert!(!dst.path().join("missing.jpg").exists());
    }

    #[test]
    fn non_pending_decisions_are_untouched() {
        let mut decisions = vec![
            Decision::duplicate("/src/b.jpg", "/src/a.jpg"),
            Decision::new("/src/c.jpg", Action::SkippedIdentical),
        ];
        let before = decisions.clone();

        let summary = CopyExecutor::default().execute(&mut decisions);
        assert_eq!(summary.copied + summary.failed, 0);
        assert_eq!(decisions, before);
    }

    #[test]
    fn reports_progress_events() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let file = src.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();

        let (sender, receiver) = EventChannel::new();
        let mut decisions = vec![pending(&file, dst.path().join("a.jpg"), Action::Copy)];
        CopyExecutor::default().execute_with_events(&mut decisions, &sender);
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(matches!(
            events.last(),
            Some(Event::Copy(CopyEvent::Completed { copied: 1, failed: 0 }))
        ));
    }
}
