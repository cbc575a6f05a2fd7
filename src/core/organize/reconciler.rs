//! Checks planned destinations against what is already on disk.

use super::planner::{file_name, suffixed_name};
use super::types::*;
use crate::core::comparator::ContentEngine;
use crate::error::CompareError;
use crate::events::{null_sender, Event, EventSender, ReconcileEvent};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

/// Resolves each planned operation to a final destination.
///
/// Probes `name.ext`, `name_1.ext`, ... in the planned directory. A free
/// name is claimed; an existing identical file means there is nothing to
/// copy; an existing different file moves on to the next suffix.
#[derive(Debug, Clone, Default)]
pub struct DestinationReconciler {
    engine: ContentEngine,
}

impl DestinationReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reconcile(&self, operations: &[Operation]) -> Result<Vec<Decision>, CompareError> {
        self.reconcile_with_events(operations, &null_sender())
    }

    /// Any stat error other than not-found, and any comparison error,
    /// aborts the batch.
    pub fn reconcile_with_events(
        &self,
        operations: &[Operation],
        events: &EventSender,
    ) -> Result<Vec<Decision>, CompareError> {
        events.send(Event::Reconcile(ReconcileEvent::Started {
            total_operations: operations.len(),
        }));

        let mut reservations = ReservationSet::new();
        let mut decisions = Vec::with_capacity(operations.len());
        for op in operations {
            decisions.push(self.resolve(op, &mut reservations)?);
        }

        let count = |action: Action| decisions.iter().filter(|d| d.action == action).count();
        events.send(Event::Reconcile(ReconcileEvent::Completed {
            to_copy: count(Action::Copy),
            renamed: count(Action::CopyRenamed),
            already_present: count(Action::SkippedIdentical),
        }));

        Ok(decisions)
    }

    fn resolve(
        &self,
        op: &Operation,
        reservations: &mut ReservationSet,
    ) -> Result<Decision, CompareError> {
        let dir = op
            .destination_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let filename = file_name(&op.source_path);

        let mut decision = Decision::new(&op.source_path, Action::Copy);
        decision.destination_path = Some(op.destination_path.clone());

        let mut n = 0;
        loop {
            let candidate = dir.join(suffixed_name(&filename, n));
            n += 1;
            if reservations.is_reserved(&candidate) {
                continue;
            }

            if !exists(&candidate)? {
                decision.action = if n == 1 {
                    Action::Copy
                } else {
                    Action::CopyRenamed
                };
                reservations.reserve(candidate.clone());
                decision.final_destination_path = Some(candidate);
                return Ok(decision);
            }

            if self.engine.identical(&op.source_path, &candidate)? {
                debug!(
                    source = %op.source_path.display(),
                    existing = %candidate.display(),
                    "identical file already in destination"
                );
                decision.action = Action::SkippedIdentical;
                decision.final_destination_path = Some(candidate);
                return Ok(decision);
            }
        }
    }
}

fn exists(path: &Path) -> Result<bool, CompareError> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(CompareError::Stat {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _src: TempDir,
        dst: TempDir,
        src_path: PathBuf,
    }

    fn fixture(name: &str, content: &[u8]) -> Fixture {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let src_path = src.path().join(name);
        fs::write(&src_path, content).unwrap();
        Fixture {
            _src: src,
            dst,
            src_path,
        }
    }

    fn op(source: &Path, destination: PathBuf) -> Operation {
        Operation {
            source_path: source.to_path_buf(),
            destination_path: destination,
        }
    }

    #[test]
    fn free_destination_is_copied() {
        let f = fixture("photo.jpg", b"new");
        let planned = f.dst.path().join("2025/01/02/photo.jpg");

        let decisions = DestinationReconciler::new()
            .reconcile(&[op(&f.src_path, planned.clone())])
            .unwrap();

        assert_eq!(decisions[0].action, Action::Copy);
        assert_eq!(decisions[0].destination_path, Some(planned.clone()));
        assert_eq!(decisions[0].final_destination_path, Some(planned));
    }

    #[test]
    fn different_existing_file_gets_renamed() {
        let f = fixture("photo.jpg", b"new");
        let planned = f.dst.path().join("photo.jpg");
        fs::write(&planned, b"old").unwrap();

        let decisions = DestinationReconciler::new()
            .reconcile(&[op(&f.src_path, planned.clone())])
            .unwrap();

        assert_eq!(decisions[0].action, Action::CopyRenamed);
        assert_eq!(
            decisions[0].final_destination_path,
            Some(f.dst.path().join("photo_1.jpg"))
        );
    }

    #[test]
    fn identical_existing_file_is_skipped() {
        let f = fixture("photo.jpg", b"same");
        let planned = f.dst.path().join("photo.jpg");
        fs::write(&planned, b"same").unwrap();

        let decisions = DestinationReconciler::new()
            .reconcile(&[op(&f.src_path, planned.clone())])
            .unwrap();

        assert_eq!(decisions[0].action, Action::SkippedIdentical);
        assert_eq!(decisions[0].final_destination_path, Some(planned));
    }

    #[test]
    fn identical_file_under_suffix_is_found() {
        let f = fixture("photo.jpg", b"same");
        fs::write(f.dst.path().join("photo.jpg"), b"other").unwrap();
        fs::write(f.dst.path().join("photo_1.jpg"), b"same").unwrap();

        let decisions = DestinationReconciler::new()
            .reconcile(&[op(&f.src_path, f.dst.path().join("photo.jpg"))])
            .unwrap();

        assert_eq!(decisions[0].action, Action::SkippedIdentical);
        assert_eq!(
            decisions[0].final_destination_path,
            Some(f.dst.path().join("photo_1.jpg"))
        );
    }

    #[test]
    fn names_claimed_earlier_in_the_batch_are_skipped() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::create_dir_all(src.path().join("a")).unwrap();
        fs::create_dir_all(src.path().join("b")).unwrap();
        let a = src.path().join("a/photo.jpg");
        let b = src.path().join("b/photo.jpg");
        fs::write(&a, b"first").unwrap();
        fs::write(&b, b"second").unwrap();

        // Planner output for two same-named sources on one day
        let ops = vec![
            op(&a, dst.path().join("photo.jpg")),
            op(&b, dst.path().join("photo_1.jpg")),
        ];
        let decisions = DestinationReconciler::new().reconcile(&ops).unwrap();

        assert_eq!(decisions[0].action, Action::Copy);
        assert_eq!(decisions[1].action, Action::CopyRenamed);
        assert_eq!(
            decisions[1].final_destination_path,
            Some(dst.path().join("photo_1.jpg"))
        );
    }

    #[test]
    fn extensionless_names_are_suffixed() {
        let f = fixture("README", b"new");
        fs::write(f.dst.path().join("README"), b"old").unwrap();

        let decisions = DestinationReconciler::new()
            .reconcile(&[op(&f.src_path, f.dst.path().join("README"))])
            .unwrap();

        assert_eq!(
            decisions[0].final_destination_path,
            Some(f.dst.path().join("README_1"))
        );
    }

    #[test]
    fn missing_source_aborts_batch() {
        let dst = TempDir::new().unwrap();
        fs::write(dst.path().join("photo.jpg"), b"old").unwrap();

        let err = DestinationReconciler::new()
            .reconcile(&[op(Path::new("/nonexistent/photo.jpg"), dst.path().join("photo.jpg"))])
            .unwrap_err();
        assert!(matches!(err, CompareError::Stat { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_names_do_not_collide() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let names = [OsStr::from_bytes(b"caf\xFE.jpg"), OsStr::from_bytes(b"caf\xFF.jpg")];
        let ops: Vec<Operation> = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let source = src.path().join(name);
                fs::write(&source, [i as u8]).unwrap();
                op(&source, dst.path().join(name))
            })
            .collect();

        let decisions = DestinationReconciler::new().reconcile(&ops).unwrap();

        for (decision, name) in decisions.iter().zip(names) {
            assert_eq!(decision.action, Action::Copy);
            assert_eq!(decision.final_destination_path, Some(dst.path().join(name)));
        }
    }
}
