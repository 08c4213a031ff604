//! `-u`: rewrite destination, plus the `<>k` deferred label-rename path
//! (spec.md §4.6).

use super::SourceYield;
use crate::json::{Container, JVal};
use crate::walk::PathVec;

/// Apply one `(destination, source)` binding in place.
pub fn update(dst: &mut JVal, src: &SourceYield, merge: bool) {
    if !merge {
        *dst = src.value.clone();
        return;
    }
    match dst {
        JVal::Object(c) => {
            if let JVal::Object(sc) = &src.value {
                for (k, v) in sc.iter() {
                    overwrite_label(c, k, v);
                }
            } else {
                *dst = src.value.clone();
            }
        }
        JVal::Array(c) => {
            if let JVal::Array(sc) = &src.value {
                for (i, (_, v)) in sc.iter().enumerate() {
                    match c.get_index_mut(i) {
                        Some((_, slot)) => *slot = v.clone(),
                        None => c.push_back(v.clone()),
                    }
                }
            } else {
                *dst = src.value.clone();
            }
        }
        _ => *dst = src.value.clone(),
    }
}

/// Merge-with-overwrite: clashing labels are replaced; clashing
/// object-object labels recurse instead of being clobbered wholesale.
fn overwrite_label(c: &mut Container, label: &str, value: &JVal) {
    match (c.get(label).cloned(), value) {
        (Some(JVal::Object(mut existing)), JVal::Object(incoming)) => {
            for (k, v) in incoming.iter() {
                overwrite_label(&mut existing, k, v);
            }
            c.insert_labeled(label.to_string(), JVal::Object(existing));
        }
        _ => {
            c.insert_labeled(label.to_string(), value.clone());
        }
    }
}

/// A pending `<>k`-directive label rename: the destination's current path
/// and the new label it should carry.
pub struct LabelRename {
    pub path: PathVec,
    pub new_label: String,
}

/// Apply every queued rename, deepest path first, so renaming a parent
/// label never shifts a still-pending child rename's path out from under
/// it (spec.md §4.6).
pub fn apply_renames(root: &mut JVal, mut renames: Vec<LabelRename>) {
    renames.sort_by(|a, b| b.path.len().cmp(&a.path.len()));
    for rename in renames {
        rename_label(root, &rename.path, &rename.new_label);
    }
}

fn rename_label(root: &mut JVal, path: &PathVec, new_label: &str) {
    let Some((parent_path, old_key)) = path.parent_and_key() else {
        return;
    };
    let Some(parent) = parent_path.resolve_mut(root) else {
        return;
    };
    let Some(container) = parent.as_container_mut() else {
        return;
    };
    if container.is_array_kind() {
        return;
    }
    if let Some(idx) = container.index_of(old_key) {
        if let Some((_, value)) = container.remove_index(idx) {
            container.insert_labeled(new_label.to_string(), value);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::parser::{parse, ParserOptions};

    fn j(s: &str) -> JVal {
        parse(s, &ParserOptions::default()).unwrap()
    }

    #[test]
    fn without_merge_replaces_outright() {
        let mut dst = j(r#"{"a":1}"#);
        update(&mut dst, &SourceYield::bare(j("7")), false);
        assert_eq!(dst, j("7"));
    }

    #[test]
    fn merge_overwrites_clashing_labels() {
        let mut dst = j(r#"{"a":1,"b":2}"#);
        update(&mut dst, &SourceYield::bare(j(r#"{"a":9}"#)), true);
        assert_eq!(dst, j(r#"{"a":9,"b":2}"#));
    }

    #[test]
    fn merge_overwrites_array_prefix_positionally() {
        let mut dst = j("[1,2,3]");
        update(&mut dst, &SourceYield::bare(j("[9,9]")), true);
        assert_eq!(dst, j("[9,9,3]"));
    }

    #[test]
    fn rename_applies_deepest_path_first() {
        let mut root = j(r#"{"a":{"b":1}}"#);
        let mut outer = PathVec::new();
        outer.push("a");
        let mut inner = outer.clone();
        inner.push("b");
        apply_renames(
            &mut root,
            vec![
                LabelRename { path: outer, new_label: "a2".into() },
                LabelRename { path: inner, new_label: "b2".into() },
            ],
        );
        assert_eq!(root, j(r#"{"a2":{"b2":1}}"#));
    }
}
