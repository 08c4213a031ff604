//! Walks a compiled path from the root, one match at a time (spec.md §4.3).

use super::cache::SearchCache;
use super::pathvec::{PathEntry, PathVec};
use super::predicate::{self, order_key};
use super::step::{Direction, Directive, JumpKind, SearchKind, SizeMode, Step, StepKind, Subscript};
use crate::json::JVal;
use crate::namespace::Namespace;

/// A single call to [`Walk::next`]'s result.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkOutcome {
    Matched(PathVec),
    Done,
}

/// Host-supplied predicate invoked by the `u` directive. Defaults to
/// always-true when the driver doesn't wire one up (spec.md calls this an
/// "application callback bound by the host").
pub type Callback<'a> = dyn FnMut(&JVal) -> bool + 'a;

/// A compiled walk path plus the mutable iteration state (step offsets,
/// fail-safe restoration point, stop/jump flags) needed to produce its
/// sequence of matches.
pub struct Walk<'cb> {
    steps: Vec<Step>,
    started: bool,
    stopped: bool,
    /// Set once per `next()` call: the rightmost iterable step whose
    /// current offset must be advanced before being tried, rather than
    /// retried as-is (it already produced the previous match).
    force_advance: Option<usize>,
    failsafe: Option<PathVec>,
    callback: Option<Box<Callback<'cb>>>,
}

impl<'cb> Walk<'cb> {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps,
            started: false,
            stopped: false,
            force_advance: None,
            failsafe: None,
            callback: None,
        }
    }

    pub fn with_callback(mut self, cb: Box<Callback<'cb>>) -> Self {
        self.callback = Some(cb);
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The offset of every iterable step (-1 for non-iterable steps), in
    /// step order — the "front-offset" row the interleaving scheduler
    /// compares across walks (spec.md §4.5).
    pub fn counters(&self) -> Vec<i64> {
        self.steps.iter().map(|s| if s.is_iterable() { s.offset } else { -1 }).collect()
    }

    fn rightmost_iterable(&self) -> Option<usize> {
        self.steps.iter().rposition(|s| s.is_iterable())
    }

    pub fn next(
        &mut self,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
    ) -> WalkOutcome {
        if self.stopped {
            return WalkOutcome::Done;
        }
        if !self.started {
            self.started = true;
            self.force_advance = None;
        } else {
            match self.rightmost_iterable() {
                Some(idx) => self.force_advance = Some(idx),
                None => return WalkOutcome::Done,
            }
        }
        ns.begin_iteration();
        self.failsafe = None;
        match self.walk_from(0, PathVec::new(), root, ns, cache, version) {
            Some(path) => WalkOutcome::Matched(path),
            None => WalkOutcome::Done,
        }
    }

    /// Recursively attempt steps `[p..]` starting from `path`. Iterable
    /// steps retry their own range internally before propagating `None`
    /// (exhaustion) to the caller; this is how an irregular tree, where
    /// one branch has no match for a later lexeme but another does, gets
    /// explored without the caller needing to know why a deeper step
    /// failed (spec.md §4.3 "Iteration").
    fn walk_from(
        &mut self,
        p: usize,
        path: PathVec,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
    ) -> Option<PathVec> {
        if self.stopped {
            return None;
        }
        if p == self.steps.len() {
            return Some(path);
        }
        match self.steps[p].kind.clone() {
            StepKind::Directive(d) => self.apply_directive(p, &d, path, root, ns, cache, version),
            StepKind::Subscript(_) => self.walk_subscript(p, path, root, ns, cache, version),
            StepKind::Search(_) => self.walk_search(p, path, root, ns, cache, version),
        }
    }

    fn on_step_failure(
        &mut self,
        p: usize,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
    ) -> Option<PathVec> {
        match self.failsafe.take() {
            Some(restored) => self.walk_from(p + 1, restored, root, ns, cache, version),
            None => None,
        }
    }

    fn walk_subscript(
        &mut self,
        p: usize,
        path: PathVec,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
    ) -> Option<PathVec> {
        let sub = match &self.steps[p].kind {
            StepKind::Subscript(s) => s.clone(),
            _ => unreachable!(),
        };
        match sub {
            Subscript::Ascend(n) => {
                let mut next_path = path;
                let new_len = next_path.len().saturating_sub(n.max(0) as usize);
                next_path.truncate(new_len);
                self.walk_from(p + 1, next_path, root, ns, cache, version)
            }
            Subscript::Truncate(n) => {
                let mut next_path = path;
                let new_len = (n.max(0) as usize).min(next_path.len());
                next_path.truncate(new_len);
                self.walk_from(p + 1, next_path, root, ns, cache, version)
            }
            Subscript::Label(label) => {
                let found = path.resolve(root).and_then(|v| v.as_container()).and_then(|c| c.get(&label));
                if found.is_none() {
                    return self.on_step_failure(p, root, ns, cache, version);
                }
                let mut next_path = path;
                next_path.push(label);
                self.walk_from(p + 1, next_path, root, ns, cache, version)
            }
            Subscript::Index(_) => {
                let force_advance = self.force_advance == Some(p);
                if force_advance {
                    self.force_advance = None;
                }
                self.iterate_positions(p, path, root, ns, cache, version, force_advance)
            }
        }
    }

    /// Shared retry loop for iterable index subscripts: try positions
    /// `offset, offset+range_step, ...` up to the step's bound, recursing
    /// into `p+1` for each and only giving up once the bound is exceeded.
    #[allow(clippy::too_many_arguments)]
    fn iterate_positions(
        &mut self,
        p: usize,
        path: PathVec,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
        mut skip_current: bool,
    ) -> Option<PathVec> {
        loop {
            let is_iterable = self.steps[p].is_iterable();
            let bound = self.steps[p].range_end;
            let pos = self.steps[p].offset;

            if !skip_current {
                let within_bound = bound.map(|b| pos < b).unwrap_or(true);
                let candidate = if pos >= 0 && within_bound {
                    path.resolve(root)
                        .and_then(|v| v.as_container())
                        .and_then(|c| c.get_index(pos as usize))
                        .map(|(k, _)| k.to_string())
                } else {
                    None
                };
                match candidate {
                    Some(key) => {
                        let mut next_path = path.clone();
                        next_path.push(key);
                        if let Some(found) = self.walk_from(p + 1, next_path, root, ns, cache, version) {
                            return Some(found);
                        }
                    }
                    None if !is_iterable => {
                        return self.on_step_failure(p, root, ns, cache, version);
                    }
                    None => {}
                }
            }
            skip_current = false;

            if !is_iterable {
                return self.on_step_failure(p, root, ns, cache, version);
            }

            let step = &mut self.steps[p];
            step.offset += step.range_step.max(1);
            let new_pos = step.offset;
            let new_bound = step.range_end;

            let exhausted = match new_bound {
                Some(b) => new_pos >= b,
                None => {
                    let container_len = path
                        .resolve(root)
                        .and_then(|v| v.as_container())
                        .map(|c| c.len() as i64)
                        .unwrap_or(0);
                    new_pos >= container_len
                }
            };
            if exhausted {
                self.steps[p].reset_offset();
                return None;
            }
        }
    }

    fn walk_search(
        &mut self,
        p: usize,
        path: PathVec,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
    ) -> Option<PathVec> {
        let step = self.steps[p].clone();

        if step.is_iterable() {
            let base_key = path_key(&path);
            let candidates = cache
                .get_or_compute(version, &base_key, &step.text, || {
                    enumerate_matches(root, &path, &step, &mut *ns)
                })
                .to_vec();

            let force_advance = self.force_advance == Some(p);
            if force_advance {
                self.force_advance = None;
            }
            let mut offset = self.steps[p].offset;
            if force_advance {
                offset += step.range_step.max(1);
            }
            loop {
                let bound = step
                    .range_end
                    .map(|b| b.min(candidates.len() as i64))
                    .unwrap_or(candidates.len() as i64);
                if offset < 0 || offset >= bound {
                    self.steps[p].reset_offset();
                    return None;
                }
                self.steps[p].offset = offset;
                let mut next_path = path.clone();
                next_path.extend_from(&candidates[offset as usize]);
                if let Some(found) = self.walk_from(p + 1, next_path, root, ns, cache, version) {
                    return Some(found);
                }
                offset += step.range_step.max(1);
            }
        } else {
            let candidates = enumerate_matches(root, &path, &step, ns);
            let idx = step.offset;
            if idx < 0 || idx as usize >= candidates.len() {
                return self.on_step_failure(p, root, ns, cache, version);
            }
            let mut next_path = path.clone();
            next_path.extend_from(&candidates[idx as usize]);
            if let Some(found) = self.walk_from(p + 1, next_path, root, ns, cache, version) {
                return Some(found);
            }
            self.on_step_failure(p, root, ns, cache, version)
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_directive(
        &mut self,
        p: usize,
        d: &Directive,
        path: PathVec,
        root: &JVal,
        ns: &mut Namespace,
        cache: &mut SearchCache,
        version: u64,
    ) -> Option<PathVec> {
        let current = path.resolve(root).cloned();
        match d {
            Directive::StoreValue(name) => {
                if let Some(v) = &current {
                    ns.set_iteration(name.clone(), v.clone());
                }
            }
            Directive::StoreKey(name) => {
                let key_val = match path.last_key() {
                    Some(k) => match path_container_before_last(&path, root) {
                        Some(c) if c.is_array_kind() => {
                            JVal::Number(crate::json::JNumber::from_f64(c.array_index_of(k) as f64))
                        }
                        _ => JVal::String(k.to_string()),
                    },
                    None => current.clone().unwrap_or(JVal::Null),
                };
                ns.set_iteration(name.clone(), key_val);
            }
            Directive::Erase(name) => ns.erase(name),
            Directive::FailSafe => {
                self.failsafe = Some(path.clone());
            }
            Directive::Jump(JumpKind::NextIteration, _) => return None,
            Directive::Jump(JumpKind::StopWalking, _) => {
                self.stopped = true;
                return None;
            }
            Directive::Callback => {
                let ok = match (&mut self.callback, &current) {
                    (Some(cb), Some(v)) => cb(v),
                    _ => true,
                };
                if !ok {
                    return None;
                }
            }
            Directive::Increment { name, inc, mul } => {
                ns.increment(name, *inc, *mul);
            }
            Directive::StoreSize { name, mode } => {
                let size = match (&current, mode) {
                    (Some(v), SizeMode::Recursive) => v.descendant_count() as f64,
                    (Some(JVal::String(s)), SizeMode::StringLength) => s.chars().count() as f64,
                    (Some(_), SizeMode::StringLength) => -1.0,
                    (Some(v), SizeMode::Default) => v.size() as f64,
                    (None, _) => -1.0,
                };
                ns.set_iteration(name.clone(), JVal::Number(crate::json::JNumber::from_f64(size)));
            }
            Directive::StorePath(name) => {
                let arr = path.to_json_array(root);
                ns.set_iteration(name.clone(), arr);
            }
        }
        self.walk_from(p + 1, path, root, ns, cache, version)
    }
}

fn path_container_before_last<'a>(path: &PathVec, root: &'a JVal) -> Option<&'a crate::json::Container> {
    let mut prefix = path.clone();
    prefix.pop();
    prefix.resolve(root).and_then(|v| v.as_container())
}

fn path_key(path: &PathVec) -> String {
    path.entries()
        .iter()
        .map(|e| match e {
            PathEntry::Key(k) => k.as_str(),
            PathEntry::End => "$end",
        })
        .collect::<Vec<_>>()
        .join("\u{1f}")
}

fn step_search_kind(step: &Step) -> &SearchKind {
    match &step.kind {
        StepKind::Search(k) => k,
        _ => unreachable!(),
    }
}

/// Enumerate every match of `step`'s predicate within the subtree reached
/// from `base_path`, as path suffixes relative to it. Forward (`<…>`)
/// walks the whole subtree recursively in document order; backward
/// (`>…<`) walks only immediate children, in reverse (spec.md §4.2/§4.3).
fn enumerate_matches(root: &JVal, base_path: &PathVec, step: &Step, ns: &mut Namespace) -> Vec<PathVec> {
    let Some(start) = base_path.resolve(root) else {
        return Vec::new();
    };
    if let SearchKind::NamespaceKey(name) = step_search_kind(step) {
        return enumerate_by_key(start, name, ns);
    }
    let mut out = Vec::new();
    collect(start, &mut PathVec::new(), step, ns, &mut out);
    match step_search_kind(step) {
        SearchKind::Ascending | SearchKind::Descending => {
            let descending = matches!(step_search_kind(step), SearchKind::Descending);
            out.sort_by(|a, b| {
                let va = a.resolve(start).unwrap();
                let vb = b.resolve(start).unwrap();
                let ord = order_key(va).partial_cmp(&order_key(vb)).unwrap_or(std::cmp::Ordering::Equal);
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }
        _ => {}
    }
    out
}

fn enumerate_by_key(start: &JVal, name: &str, ns: &mut Namespace) -> Vec<PathVec> {
    let Some(target) = ns.get(name).cloned() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    if let Some(c) = start.as_container() {
        for (key, _) in c.iter() {
            let matches_key = if c.is_array_kind() {
                target.as_number().is_some_and(|n| n.value() as i64 == c.array_index_of(key))
            } else {
                target.as_str() == Some(key)
            };
            if matches_key {
                let mut p = PathVec::new();
                p.push(key.to_string());
                out.push(p);
            }
        }
    }
    out
}

fn collect(node: &JVal, path: &mut PathVec, step: &Step, ns: &mut Namespace, out: &mut Vec<PathVec>) {
    let Some(container) = node.as_container() else {
        return;
    };
    match step.direction {
        Direction::Forward => {
            for (key, child) in container.iter() {
                path.push(key.to_string());
                let parent_label = if container.is_array_kind() { None } else { Some(key) };
                if predicate::matches(
                    step_search_kind(step),
                    step.regex.as_ref(),
                    child,
                    parent_label,
                    step.attached_label.as_deref(),
                    ns,
                    &step.text,
                ) {
                    out.push(path.clone());
                }
                collect(child, path, step, ns, out);
                path.pop();
            }
        }
        Direction::Backward => {
            let entries: Vec<(&str, &JVal)> = container.iter().collect();
            for (key, child) in entries.into_iter().rev() {
                let parent_label = if container.is_array_kind() { None } else { Some(key) };
                if predicate::matches(
                    step_search_kind(step),
                    step.regex.as_ref(),
                    child,
                    parent_label,
                    step.attached_label.as_deref(),
                    ns,
                    &step.text,
                ) {
                    let mut p = path.clone();
                    p.push(key.to_string());
                    out.push(p);
                }
            }
        }
    }
}
