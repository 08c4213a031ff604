//! The three-tier namespace that carries state between walk steps and
//! across walk iterations (spec.md §4.4 "Namespace lifecycle").
//!
//! Lookups check the most specific tier first: the current iteration's
//! captures, then the owning iterator's persistent bindings, then the
//! global namespace that survives operation-set boundaries.

use crate::json::JVal;
use indexmap::IndexMap;
use std::collections::HashSet;

/// Reserved global key bound to the current input's filename.
pub const FILE_KEY: &str = "$file";
/// Reserved per-iterator key tracking the previously emitted match.
pub const PREV_RESULT_KEY: &str = "$?";

#[derive(Debug, Clone, Default)]
pub struct Namespace {
    global: IndexMap<String, JVal>,
    iterator: IndexMap<String, JVal>,
    iteration: IndexMap<String, JVal>,
    /// `q`/`Q` de-dup sets, keyed by the originating step's lexeme text so
    /// distinct search steps don't share a seen-set.
    seen: IndexMap<String, HashSet<String>>,
}

impl Namespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&JVal> {
        self.iteration
            .get(name)
            .or_else(|| self.iterator.get(name))
            .or_else(|| self.global.get(name))
    }

    /// Captures made by directives (`v`, `k`, predicate capture suffixes)
    /// live in the iteration tier so they don't leak past a failed match.
    pub fn set_iteration(&mut self, name: impl Into<String>, value: JVal) {
        self.iteration.insert(name.into(), value);
    }

    /// `$?`-style state that should outlive a single iteration but not the
    /// owning iterator (e.g. fail-safe restoration bookkeeping).
    pub fn set_iterator(&mut self, name: impl Into<String>, value: JVal) {
        self.iterator.insert(name.into(), value);
    }

    pub fn set_global(&mut self, name: impl Into<String>, value: JVal) {
        self.global.insert(name.into(), value);
    }

    /// Erase `name` from whichever tier currently holds it (iteration
    /// first, as that's where `z` directive targets normally live).
    pub fn erase(&mut self, name: &str) {
        if self.iteration.shift_remove(name).is_some() {
            return;
        }
        if self.iterator.shift_remove(name).is_some() {
            return;
        }
        self.global.shift_remove(name);
    }

    /// Clear per-iteration captures; called at the start of each walk
    /// iteration before directives run.
    pub fn begin_iteration(&mut self) {
        self.iteration.clear();
    }

    /// Clear per-iterator state; called when a walk iterator is (re)built.
    pub fn begin_iterator(&mut self) {
        self.iterator.clear();
        self.iteration.clear();
    }

    pub fn bind_file(&mut self, filename: impl Into<String>) {
        self.global.insert(FILE_KEY.to_string(), JVal::String(filename.into()));
    }

    pub fn record_prev_result(&mut self, value: JVal) {
        self.iterator.insert(PREV_RESULT_KEY.to_string(), value);
    }

    /// Has `key` (the canonical serialization of a candidate node) been
    /// seen before under the de-dup set for `step_text`? Records it either
    /// way so the next call reflects this one.
    pub fn seen_before(&mut self, step_text: &str, key: String) -> bool {
        !self.seen.entry(step_text.to_string()).or_default().insert(key)
    }

    /// `I` directive: fetch the current numeric value (defaulting to 0),
    /// apply `inc` then optionally `mul`, store and return the result.
    pub fn increment(&mut self, name: &str, inc: i64, mul: Option<i64>) -> f64 {
        let current = self.get(name).and_then(|v| v.as_number()).map(|n| n.value()).unwrap_or(0.0);
        let mut next = current + inc as f64;
        if let Some(m) = mul {
            next *= m as f64;
        }
        self.set_iteration(name, JVal::Number(crate::json::JNumber::from_f64(next)));
        next
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn iteration_shadows_global() {
        let mut ns = Namespace::new();
        ns.set_global("x", JVal::Bool(false));
        ns.set_iteration("x", JVal::Bool(true));
        assert_eq!(ns.get("x"), Some(&JVal::Bool(true)));
    }

    #[test]
    fn begin_iteration_clears_only_iteration_tier() {
        let mut ns = Namespace::new();
        ns.set_global("g", JVal::Null);
        ns.set_iteration("i", JVal::Null);
        ns.begin_iteration();
        assert!(ns.get("i").is_none());
        assert!(ns.get("g").is_some());
    }

    #[test]
    fn seen_before_tracks_per_step_sets() {
        let mut ns = Namespace::new();
        assert!(!ns.seen_before("<x>q", "1".into()));
        assert!(ns.seen_before("<x>q", "1".into()));
        assert!(!ns.seen_before("<y>q", "1".into()));
    }

    #[test]
    fn increment_defaults_and_multiplies() {
        let mut ns = Namespace::new();
        assert_eq!(ns.increment("n", 1, None), 1.0);
        assert_eq!(ns.increment("n", 2, Some(3)), 9.0);
    }
}
