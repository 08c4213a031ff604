//! `-p` / `-pp`: delete destination matches, or invert to keep only the
//! ancestor/descendant spine around them (spec.md §4.6).

use crate::json::JVal;
use crate::walk::{PathEntry, PathVec};

/// `-p`: delete every match. Deepest paths first, so deleting a parent
/// never invalidates a still-pending child deletion's path.
pub fn purge(root: &mut JVal, matches: &[PathVec]) {
    let mut ordered: Vec<&PathVec> = matches.iter().collect();
    ordered.sort_by(|a, b| b.len().cmp(&a.len()));
    for m in ordered {
        remove_at(root, m);
    }
}

fn remove_at(root: &mut JVal, path: &PathVec) {
    let Some((parent_path, key)) = path.parent_and_key() else {
        return;
    };
    let Some(parent) = parent_path.resolve_mut(root) else {
        return;
    };
    let Some(container) = parent.as_container_mut() else {
        return;
    };
    container.remove_key(key);
}

/// `-pp`: prune every node that is neither an ancestor nor a descendant of
/// some match (siblings off the path to a match are dropped; the matches
/// themselves and everything under them survive intact).
pub fn purge_invert(root: &mut JVal, matches: &[PathVec]) {
    let mut path = PathVec::new();
    prune(root, &mut path, matches);
}

fn starts_with(long: &PathVec, short: &PathVec) -> bool {
    short.entries().len() <= long.entries().len()
        && short
            .entries()
            .iter()
            .zip(long.entries().iter())
            .all(|(a, b)| a == b)
}

fn is_ancestor_of_some_match(path: &PathVec, matches: &[PathVec]) -> bool {
    matches.iter().any(|m| starts_with(m, path))
}

fn is_match_or_descendant(path: &PathVec, matches: &[PathVec]) -> bool {
    matches.iter().any(|m| starts_with(path, m))
}

fn prune(node: &mut JVal, path: &mut PathVec, matches: &[PathVec]) {
    if is_match_or_descendant(path, matches) {
        return;
    }
    let Some(container) = node.as_container_mut() else {
        return;
    };
    let keys: Vec<String> = container.keys().map(|k| k.to_string()).collect();
    for k in keys {
        path.push(k.clone());
        let keep = is_ancestor_of_some_match(path, matches) || is_match_or_descendant(path, matches);
        if keep {
            if let Some(child) = container.get_mut(&k) {
                prune(child, path, matches);
            }
        } else {
            container.remove_key(&k);
        }
        let popped = path.pop();
        debug_assert!(matches!(popped, Some(PathEntry::Key(_))));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::parser::{parse, ParserOptions};

    fn j(s: &str) -> JVal {
        parse(s, &ParserOptions::default()).unwrap()
    }

    fn path(root: &JVal, keys: &[&str]) -> PathVec {
        let mut p = PathVec::new();
        let mut cur = root;
        for &k in keys {
            let container = cur.as_container().unwrap();
            cur = container.get(k).unwrap();
            p.push(k);
        }
        p
    }

    #[test]
    fn purge_deletes_the_match() {
        let mut root = j(r#"{"a":1,"b":2}"#);
        let a = path(&root, &["a"]);
        purge(&mut root, &[a]);
        assert_eq!(root, j(r#"{"b":2}"#));
    }

    #[test]
    fn purge_invert_keeps_spine_and_drops_siblings() {
        let mut root = j(r#"{"a":{"x":{"y":1},"z":2},"b":3}"#);
        let target = path(&root, &["a", "x"]);
        purge_invert(&mut root, &[target]);
        assert_eq!(root, j(r#"{"a":{"x":{"y":1}}}"#));
    }
}
