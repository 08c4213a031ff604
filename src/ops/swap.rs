//! `-s`: zip two walks' matches in pairs and swap the referenced values in
//! place (spec.md §4.6).

use crate::json::JVal;
use crate::walk::PathVec;

/// Swap every `(a, b)` pair. A pair whose either side was invalidated by
/// an earlier swap in the same batch (e.g. a shared ancestor was replaced)
/// is reported as skipped rather than applied.
pub fn swap_pairs(root: &mut JVal, a_matches: &[PathVec], b_matches: &[PathVec]) -> Vec<bool> {
    a_matches
        .iter()
        .zip(b_matches.iter())
        .map(|(a, b)| swap_one(root, a, b))
        .collect()
}

fn swap_one(root: &mut JVal, a: &PathVec, b: &PathVec) -> bool {
    if !a.is_valid(root) || !b.is_valid(root) {
        return false;
    }
    let Some(va) = a.resolve(root).cloned() else { return false };
    let Some(vb) = b.resolve(root).cloned() else { return false };
    let Some(slot_a) = a.resolve_mut(root) else { return false };
    *slot_a = vb;
    let Some(slot_b) = b.resolve_mut(root) else { return false };
    *slot_b = va;
    true
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::parser::{parse, ParserOptions};

    fn j(s: &str) -> JVal {
        parse(s, &ParserOptions::default()).unwrap()
    }

    fn path(root: &JVal, key_chain: &[&str]) -> PathVec {
        let mut p = PathVec::new();
        let mut cur = root;
        for &k in key_chain {
            let container = cur.as_container().unwrap();
            if let Some(idx) = k.parse::<usize>().ok() {
                let (actual_key, v) = container.get_index(idx).unwrap();
                p.push(actual_key.to_string());
                cur = v;
            } else {
                p.push(k);
                cur = container.get(k).unwrap();
            }
        }
        p
    }

    #[test]
    fn swaps_two_values_in_place() {
        let mut root = j(r#"{"a":1,"b":2}"#);
        let a = path(&root, &["a"]);
        let b = path(&root, &["b"]);
        let results = swap_pairs(&mut root, &[a], &[b]);
        assert_eq!(results, vec![true]);
        assert_eq!(root, j(r#"{"a":2,"b":1}"#));
    }

    #[test]
    fn invalid_path_is_reported_and_skipped() {
        let mut root = j(r#"{"a":1,"b":2}"#);
        let a = path(&root, &["a"]);
        let mut bogus = PathVec::new();
        bogus.push("missing");
        let results = swap_pairs(&mut root, &[a], &[bogus]);
        assert_eq!(results, vec![false]);
        assert_eq!(root, j(r#"{"a":1,"b":2}"#));
    }
}
