//! Deterministic interleaving of matches produced by several walks
//! (spec.md §4.5).
//!
//! Each walk yields a sequence of matches; a match carries the offset
//! counter of every iterable step active when it was produced (-1 for
//! non-iterable steps). The scheduler merges these per-walk sequences into
//! one, grouping matches that share a lexicographic offset prefix the way
//! a k-way merge groups entries that compare equal on a leading key.

use crate::json::JVal;
use crate::namespace::Namespace;
use crate::walk::{PathVec, SearchCache, Walk, WalkOutcome};
use std::collections::VecDeque;

/// One produced match plus the iterable-step offsets live at the time it
/// was emitted.
#[derive(Debug, Clone)]
struct Iteration {
    path: PathVec,
    counters: Vec<i64>,
}

/// A match as emitted by the scheduler, annotated with the bookkeeping the
/// output formatter needs to decide when to open a new grouped object.
#[derive(Debug, Clone)]
pub struct ScheduledMatch {
    /// Index into the walk slice this match came from.
    pub walk_index: usize,
    pub path: PathVec,
    /// Number of walks still competing at the column that decided this
    /// match's turn (spec.md: "grouping size").
    pub grouping_size: usize,
    /// The offset value that decided the last column filtered on; -1 if no
    /// column ever filtered (no iterable steps were active anywhere).
    pub lowest_counter: i64,
}

/// `-n` / `-nn`: disables interleaving entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Interleave,
    /// Walks are concatenated in order. `suppress_grouping` is `-nn`'s
    /// extra effect on jsonized array output.
    Sequential { suppress_grouping: bool },
}

/// Drain every walk to exhaustion and return the scheduled merge order.
pub fn run(
    walks: &mut [Walk],
    root: &JVal,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    version: u64,
    mode: Mode,
) -> Vec<ScheduledMatch> {
    let mut queues = materialize(walks, root, ns, cache, version);
    match mode {
        Mode::Interleave => interleave(&mut queues),
        Mode::Sequential { suppress_grouping } => sequential(&mut queues, suppress_grouping),
    }
}

fn materialize(
    walks: &mut [Walk],
    root: &JVal,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    version: u64,
) -> Vec<VecDeque<Iteration>> {
    walks
        .iter_mut()
        .map(|w| {
            let mut q = VecDeque::new();
            loop {
                match w.next(root, ns, cache, version) {
                    WalkOutcome::Matched(path) => {
                        let counters = w.counters();
                        q.push_back(Iteration { path, counters });
                    }
                    WalkOutcome::Done => break,
                }
            }
            q
        })
        .collect()
}

fn sequential(queues: &mut [VecDeque<Iteration>], suppress_grouping: bool) -> Vec<ScheduledMatch> {
    let mut out = Vec::new();
    for (walk_index, q) in queues.iter_mut().enumerate() {
        // With no interleaving, a walk's own run is the natural group;
        // `-nn` flattens that back down to one match per group.
        let grouping_size = if suppress_grouping { 1 } else { q.len() };
        while let Some(it) = q.pop_front() {
            out.push(ScheduledMatch {
                walk_index,
                path: it.path,
                grouping_size,
                lowest_counter: -1,
            });
        }
    }
    out
}

fn interleave(queues: &mut [VecDeque<Iteration>]) -> Vec<ScheduledMatch> {
    let mut out = Vec::new();
    while queues.iter().any(|q| !q.is_empty()) {
        let (winner, grouping_size, lowest_counter) = select_next(queues);
        let it = queues[winner].pop_front().expect("winner queue is non-empty");
        out.push(ScheduledMatch {
            walk_index: winner,
            path: it.path,
            grouping_size,
            lowest_counter,
        });
    }
    out
}

/// Build the front-offset matrix from each non-empty queue's head and pick
/// the first walk (in original order) surviving the column-by-column
/// narrowing described in spec.md §4.5.
fn select_next(queues: &[VecDeque<Iteration>]) -> (usize, usize, i64) {
    let mut remaining: Vec<usize> = (0..queues.len()).filter(|&i| !queues[i].is_empty()).collect();
    let max_cols = remaining
        .iter()
        .map(|&i| queues[i].front().unwrap().counters.len())
        .max()
        .unwrap_or(0);

    let mut lowest_counter = -1i64;
    for col in 0..max_cols {
        let competing: Vec<i64> = remaining
            .iter()
            .filter_map(|&i| queues[i].front().unwrap().counters.get(col).copied())
            .filter(|&c| c >= 0)
            .collect();
        if competing.is_empty() {
            continue;
        }
        let min = *competing.iter().min().unwrap();
        lowest_counter = min;
        remaining.retain(|&i| {
            match queues[i].front().unwrap().counters.get(col).copied() {
                Some(c) if c >= 0 => c == min,
                _ => true,
            }
        });
    }
    let grouping_size = remaining.len();
    (remaining[0], grouping_size, lowest_counter)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::parser::{parse, ParserOptions};
    use crate::walk::compile;

    fn make_walk(path: &str) -> Walk<'static> {
        Walk::new(compile(path).unwrap())
    }

    #[test]
    fn single_walk_preserves_document_order() {
        let root = parse(r#"[1,2,3]"#, &ParserOptions::default()).unwrap();
        let mut walks = vec![make_walk("[+0]")];
        let mut ns = Namespace::new();
        let mut cache = SearchCache::new();
        let out = run(&mut walks, &root, &mut ns, &mut cache, 0, Mode::Interleave);
        let values: Vec<i64> = out.iter().map(|m| m.path.resolve(&root).unwrap().as_number().unwrap().value() as i64).collect();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn walks_sharing_offset_prefix_interleave() {
        // two single-element (non-iterable) walks: both have an all -1
        // counter row, so they never compete and appear in argument order.
        let root = parse(r#"{"a":1,"b":2}"#, &ParserOptions::default()).unwrap();
        let mut walks = vec![make_walk("[b]"), make_walk("[a]")];
        let mut ns = Namespace::new();
        let mut cache = SearchCache::new();
        let out = run(&mut walks, &root, &mut ns, &mut cache, 0, Mode::Interleave);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].walk_index, 0);
        assert_eq!(out[1].walk_index, 1);
    }

    #[test]
    fn iterable_walks_interleave_by_matching_offset() {
        let root = parse(r#"{"a":[1,2],"b":[10,20]}"#, &ParserOptions::default()).unwrap();
        let mut walks = vec![make_walk("[a][+0]"), make_walk("[b][+0]")];
        let mut ns = Namespace::new();
        let mut cache = SearchCache::new();
        let out = run(&mut walks, &root, &mut ns, &mut cache, 0, Mode::Interleave);
        // Offset 0 from both walks ties and groups before offset 1 does.
        assert_eq!(out.iter().map(|m| m.walk_index).collect::<Vec<_>>(), vec![0, 1, 0, 1]);
        assert_eq!(out[0].grouping_size, 2);
    }

    #[test]
    fn sequential_mode_concatenates_in_argument_order() {
        let root = parse(r#"{"a":[1,2],"b":[10,20]}"#, &ParserOptions::default()).unwrap();
        let mut walks = vec![make_walk("[a][+0]"), make_walk("[b][+0]")];
        let mut ns = Namespace::new();
        let mut cache = SearchCache::new();
        let out = run(&mut walks, &root, &mut ns, &mut cache, 0, Mode::Sequential { suppress_grouping: false });
        assert_eq!(out.iter().map(|m| m.walk_index).collect::<Vec<_>>(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn doubled_sequential_mode_suppresses_grouping() {
        let root = parse(r#"{"a":[1,2],"b":[10,20]}"#, &ParserOptions::default()).unwrap();
        let mut walks = vec![make_walk("[a][+0]"), make_walk("[b][+0]")];
        let mut ns = Namespace::new();
        let mut cache = SearchCache::new();
        let out = run(&mut walks, &root, &mut ns, &mut cache, 0, Mode::Sequential { suppress_grouping: false });
        assert!(out.iter().all(|m| m.grouping_size == 2));

        let mut walks = vec![make_walk("[a][+0]"), make_walk("[b][+0]")];
        let mut ns = Namespace::new();
        let mut cache = SearchCache::new();
        let out = run(&mut walks, &root, &mut ns, &mut cache, 0, Mode::Sequential { suppress_grouping: true });
        assert!(out.iter().all(|m| m.grouping_size == 1));
    }
}
