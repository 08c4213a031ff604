//! Search cache for iterable search steps (spec.md §4.3 "Search steps").
//!
//! Enumerating every match of a recursive lexeme is the expensive part of
//! walking; once done for a given (node, step) pair it's memoized so
//! repeated iteration is O(1) per step. Keyed by the document's version
//! counter, so any mutation invalidates the whole cache in one stroke —
//! coarser than per-subtree invalidation, but correct and simple.

use super::pathvec::PathVec;
use std::collections::HashMap;
use xxhash_rust::xxh3::Xxh3Builder;

#[derive(Debug, Default)]
pub struct SearchCache {
    version: u64,
    entries: HashMap<(String, String), Vec<PathVec>, Xxh3Builder>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self {
            version: 0,
            entries: HashMap::with_hasher(Xxh3Builder::new()),
        }
    }

    /// Return the cached match vector for `(base_key, step_text)` under
    /// the tree's current `version`, computing and storing it on a miss.
    /// Any version change drops the entire cache first.
    pub fn get_or_compute(
        &mut self,
        version: u64,
        base_key: &str,
        step_text: &str,
        compute: impl FnOnce() -> Vec<PathVec>,
    ) -> &[PathVec] {
        if version != self.version {
            self.entries.clear();
            self.version = version;
        }
        self.entries
            .entry((base_key.to_string(), step_text.to_string()))
            .or_insert_with(compute)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn recomputes_after_version_bump() {
        let mut cache = SearchCache::new();
        let mut calls = 0;
        {
            let r = cache.get_or_compute(0, "base", "step", || {
                calls += 1;
                vec![PathVec::new()]
            });
            assert_eq!(r.len(), 1);
        }
        cache.get_or_compute(0, "base", "step", || {
            calls += 1;
            vec![PathVec::new()]
        });
        assert_eq!(calls, 1, "second call at the same version should hit cache");
        cache.get_or_compute(1, "base", "step", || {
            calls += 1;
            vec![PathVec::new()]
        });
        assert_eq!(calls, 2, "version bump should force recompute");
    }
}
