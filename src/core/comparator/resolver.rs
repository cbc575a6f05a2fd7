//! Collapses byte-identical source files onto one canonical member.
//!
//! Narrowing happens in three steps, each cheaper than the next:
//! exact size, header fingerprint, then full comparison against a running
//! list of cluster representatives. Only the last step proves equality.

use super::engine::{ContentEngine, HeaderFingerprint};
use super::DuplicateGroup;
use crate::core::organize::{Action, Decision, SourceFile};
use crate::error::CompareError;
use crate::events::{null_sender, DedupeEvent, Event, EventSender};
use rayon::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Outcome of duplicate resolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Sources that survive, in input order
    pub kept: Vec<SourceFile>,
    /// One decision per input, in input order
    pub decisions: Vec<Decision>,
    /// Clusters with more than one member
    pub groups: Vec<DuplicateGroup>,
}

impl Resolution {
    pub fn duplicate_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::duplicate_count).sum()
    }
}

/// Finds byte-identical sources and keeps the oldest of each cluster
#[derive(Debug, Clone, Default)]
pub struct DuplicateResolver {
    engine: ContentEngine,
}

impl DuplicateResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, files: &[SourceFile]) -> Result<Resolution, CompareError> {
        self.resolve_with_events(files, &null_sender())
    }

    /// Resolve duplicates, reporting found groups as events.
    ///
    /// Any stat or read failure aborts the whole batch.
    pub fn resolve_with_events(
        &self,
        files: &[SourceFile],
        events: &EventSender,
    ) -> Result<Resolution, CompareError> {
        events.send(Event::Dedupe(DedupeEvent::Started {
            total_files: files.len(),
        }));

        let mut by_size: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
        for (index, file) in files.iter().enumerate() {
            by_size.entry(file.size).or_default().push(index);
        }

        // duplicate index -> canonical index
        let mut duplicate_of: HashMap<usize, usize> = HashMap::new();
        let mut groups = Vec::new();

        for (size, same_size) in by_size {
            if same_size.len() < 2 {
                continue;
            }

            for candidates in self.fingerprint_groups(files, &same_size)? {
                if candidates.len() < 2 {
                    continue;
                }

                for cluster in self.cluster(files, &candidates)? {
                    if cluster.len() < 2 {
                        continue;
                    }

                    let canonical = pick_oldest(files, &cluster);
                    for &member in &cluster {
                        if member != canonical {
                            duplicate_of.insert(member, canonical);
                        }
                    }

                    let group = DuplicateGroup {
                        members: cluster.iter().map(|&i| files[i].path.clone()).collect(),
                        canonical: files[canonical].path.clone(),
                        size,
                    };
                    debug!(
                        canonical = %group.canonical.display(),
                        duplicates = group.duplicate_count(),
                        "duplicate group"
                    );
                    events.send(Event::Dedupe(DedupeEvent::DuplicateFound {
                        canonical: group.canonical.clone(),
                        duplicate_count: group.duplicate_count(),
                    }));
                    groups.push(group);
                }
            }
        }

        let mut kept = Vec::with_capacity(files.len());
        let mut decisions = Vec::with_capacity(files.len());
        for (index, file) in files.iter().enumerate() {
            match duplicate_of.get(&index) {
                Some(&canonical) => {
                    decisions.push(Decision::duplicate(&file.path, &files[canonical].path));
                }
                None => {
                    kept.push(file.clone());
                    decisions.push(Decision::new(&file.path, Action::Copy));
                }
            }
        }

        let resolution = Resolution {
            kept,
            decisions,
            groups,
        };
        events.send(Event::Dedupe(DedupeEvent::Completed {
            total_groups: resolution.groups.len(),
            total_duplicates: resolution.duplicate_count(),
        }));
        Ok(resolution)
    }

    /// Split a same-size group by header fingerprint. Fingerprints are
    /// computed in parallel and collected back in input order.
    fn fingerprint_groups(
        &self,
        files: &[SourceFile],
        indices: &[usize],
    ) -> Result<Vec<Vec<usize>>, CompareError> {
        let fingerprints: Vec<HeaderFingerprint> = indices
            .par_iter()
            .map(|&i| self.engine.header_fingerprint(&files[i].path, files[i].size))
            .collect::<Result<_, _>>()?;

        let mut by_fingerprint: BTreeMap<HeaderFingerprint, Vec<usize>> = BTreeMap::new();
        for (&index, fingerprint) in indices.iter().zip(fingerprints) {
            by_fingerprint.entry(fingerprint).or_default().push(index);
        }
        Ok(by_fingerprint.into_values().collect())
    }

    /// Partition candidates into exact-equality clusters. Each cluster's
    /// first member is its representative; a candidate joins the first
    /// cluster whose representative it equals.
    fn cluster(
        &self,
        files: &[SourceFile],
        candidates: &[usize],
    ) -> Result<Vec<Vec<usize>>, CompareError> {
        let mut clusters: Vec<Vec<usize>> = Vec::new();

        'candidates: for &candidate in candidates {
            for cluster in clusters.iter_mut() {
                let representative = cluster[0];
                if self
                    .engine
                    .identical(&files[candidate].path, &files[representative].path)?
                {
                    cluster.push(candidate);
                    continue 'candidates;
                }
            }
            clusters.push(vec![candidate]);
        }

        Ok(clusters)
    }
}

/// Earliest known timestamp wins, ties broken by the smaller path.
/// Unknown timestamps lose to any known one; an all-unknown cluster
/// falls back to the smallest path.
fn pick_oldest(files: &[SourceFile], members: &[usize]) -> usize {
    let by_path = |a: &usize, b: &usize| {
        files[*a]
            .path
            .as_os_str()
            .cmp(files[*b].path.as_os_str())
    };

    let dated = members
        .iter()
        .filter(|&&i| files[i].best().is_some())
        .min_by(|a, b| {
            files[**a]
                .best()
                .cmp(&files[**b].best())
                .then_with(|| by_path(*a, *b))
        });

    match dated {
        Some(&index) => index,
        None => members
            .iter()
            .copied()
            .min_by(|a, b| by_path(a, b))
            .unwrap_or(members[0]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::timestamp::{TimestampEvidence, Zone};
    use crate::events::EventChannel;
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        Zone::utc()
            .localize(NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap())
            .unwrap()
    }

    fn source(
        dir: &TempDir,
        name: &str,
        content: &[u8],
        filename: Option<DateTime<FixedOffset>>,
    ) -> SourceFile {
        let path = dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        SourceFile::new(
            path,
            content.len() as u64,
            TimestampEvidence::from_candidates(None, filename, None),
        )
    }

    fn paths(files: &[SourceFile]) -> Vec<PathBuf> {
        files.iter().map(|f| f.path.clone()).collect()
    }

    #[test]
    fn oldest_identical_source_is_kept() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.jpg", b"same", Some(day(2020, 1, 1)));
        let b = source(&dir, "b.jpg", b"same", None);

        let resolution = DuplicateResolver::new().resolve(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(paths(&resolution.kept), vec![a.path.clone()]);
        assert_eq!(resolution.decisions[0].action, Action::Copy);
        assert_eq!(resolution.decisions[1].action, Action::SkippedDuplicateSource);
        assert_eq!(resolution.decisions[1].duplicate_of, Some(a.path.clone()));
        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.groups[0].canonical, a.path);
    }

    #[test]
    fn known_timestamp_beats_unknown_even_with_larger_path() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.jpg", b"same", None);
        let z = source(&dir, "z.jpg", b"same", Some(day(2024, 6, 1)));

        let resolution = DuplicateResolver::new().resolve(&[a.clone(), z.clone()]).unwrap();
        assert_eq!(paths(&resolution.kept), vec![z.path.clone()]);
        assert_eq!(resolution.decisions[0].duplicate_of, Some(z.path));
    }

    #[test]
    fn equal_timestamps_pick_smaller_path_regardless_of_order() {
        let dir = TempDir::new().unwrap();
        let when = Some(day(2021, 3, 3));
        let a = source(&dir, "a.jpg", b"same", when);
        let b = source(&dir, "b.jpg", b"same", when);
        let c = source(&dir, "c.jpg", b"same", when);

        let resolver = DuplicateResolver::new();
        let forward = resolver.resolve(&[a.clone(), b.clone(), c.clone()]).unwrap();
        let backward = resolver.resolve(&[c.clone(), b.clone(), a.clone()]).unwrap();

        assert_eq!(paths(&forward.kept), vec![a.path.clone()]);
        assert_eq!(paths(&backward.kept), vec![a.path.clone()]);
    }

    #[test]
    fn all_unknown_cluster_keeps_smallest_path() {
        let dir = TempDir::new().unwrap();
        let b = source(&dir, "b.jpg", b"same", None);
        let a = source(&dir, "a.jpg", b"same", None);

        let resolution = DuplicateResolver::new().resolve(&[b.clone(), a.clone()]).unwrap();
        assert_eq!(paths(&resolution.kept), vec![a.path.clone()]);
        assert_eq!(resolution.decisions[0].duplicate_of, Some(a.path));
    }

    #[test]
    fn same_size_different_content_are_both_kept() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.jpg", b"aaaa", None);
        let b = source(&dir, "b.jpg", b"bbbb", None);

        let resolution = DuplicateResolver::new().resolve(&[a, b]).unwrap();
        assert_eq!(resolution.kept.len(), 2);
        assert!(resolution.groups.is_empty());
        assert!(resolution
            .decisions
            .iter()
            .all(|d| d.action == Action::Copy));
    }

    #[test]
    fn separate_clusters_within_one_size_group() {
        let dir = TempDir::new().unwrap();
        let a1 = source(&dir, "a1.jpg", b"aaaa", None);
        let b1 = source(&dir, "b1.jpg", b"bbbb", None);
        let a2 = source(&dir, "a2.jpg", b"aaaa", None);
        let b2 = source(&dir, "b2.jpg", b"bbbb", None);

        let resolution = DuplicateResolver::new()
            .resolve(&[a1.clone(), b1.clone(), a2, b2])
            .unwrap();

        assert_eq!(paths(&resolution.kept), vec![a1.path.clone(), b1.path.clone()]);
        assert_eq!(resolution.groups.len(), 2);
        assert_eq!(resolution.duplicate_count(), 2);
        assert_eq!(resolution.decisions[2].duplicate_of, Some(a1.path));
        assert_eq!(resolution.decisions[3].duplicate_of, Some(b1.path));
    }

    #[test]
    fn three_identical_files_form_one_group() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            source(&dir, "one/x.jpg", b"triple", None),
            source(&dir, "two/x.jpg", b"triple", None),
            source(&dir, "three/x.jpg", b"triple", None),
        ];

        let resolution = DuplicateResolver::new().resolve(&files).unwrap();
        assert_eq!(resolution.groups.len(), 1);
        assert_eq!(resolution.groups[0].members.len(), 3);
        assert_eq!(resolution.kept.len(), 1);
        assert!(resolution.kept[0].path.ends_with("one/x.jpg"));
    }

    #[test]
    fn resolving_twice_gives_same_answer() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            source(&dir, "a.jpg", b"same", Some(day(2022, 1, 1))),
            source(&dir, "b.jpg", b"same", Some(day(2020, 1, 1))),
            source(&dir, "c.jpg", b"other", None),
            source(&dir, "d.jpg", b"other", None),
        ];

        let resolver = DuplicateResolver::new();
        let first = resolver.resolve(&files).unwrap();
        let second = resolver.resolve(&files).unwrap();

        assert_eq!(first.decisions, second.decisions);
        assert_eq!(paths(&first.kept), paths(&second.kept));
        assert_eq!(paths(&first.kept), vec![files[1].path.clone(), files[2].path.clone()]);
    }

    #[test]
    fn missing_file_in_size_group_aborts() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.jpg", b"same", None);
        let ghost = SourceFile::new(dir.path().join("ghost.jpg"), 4, TimestampEvidence::unknown());

        let err = DuplicateResolver::new().resolve(&[a, ghost]).unwrap_err();
        assert!(matches!(err, CompareError::Open { .. }));
    }

    #[test]
    fn singleton_sizes_are_never_opened() {
        // Neither path exists; unique sizes mean no I/O at all
        let a = SourceFile::new(Path::new("/nonexistent/a.jpg"), 1, TimestampEvidence::unknown());
        let b = SourceFile::new(Path::new("/nonexistent/b.jpg"), 2, TimestampEvidence::unknown());

        let resolution = DuplicateResolver::new().resolve(&[a, b]).unwrap();
        assert_eq!(resolution.kept.len(), 2);
    }

    #[test]
    fn emits_group_events() {
        let dir = TempDir::new().unwrap();
        let a = source(&dir, "a.jpg", b"same", None);
        let b = source(&dir, "b.jpg", b"same", None);

        let (sender, receiver) = EventChannel::new();
        DuplicateResolver::new()
            .resolve_with_events(&[a, b], &sender)
            .unwrap();
        drop(sender);

        let events: Vec<Event> = receiver.iter().collect();
        assert!(events.iter().any(|e| matches!(
            e,
            Event::Dedupe(DedupeEvent::Completed {
                total_groups: 1,
                total_duplicates: 1
            })
        )));
    }
}
