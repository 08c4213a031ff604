//! `-i`: insert, never overwriting an existing destination (spec.md §4.6).

use super::SourceYield;
use crate::json::{Container, JVal};

/// Apply one `(destination, source)` binding in place, per the
/// destination-type table in spec.md §4.6.
pub fn insert(dst: &mut JVal, src: &SourceYield, merge: bool) {
    match dst {
        JVal::Array(c) => insert_into_array(c, src, merge),
        JVal::Object(c) => insert_into_object(c, src, merge),
        _ => {}
    }
}

fn insert_into_array(c: &mut Container, src: &SourceYield, merge: bool) {
    match &src.value {
        JVal::Array(sc) | JVal::Object(sc) if merge => {
            for (_, v) in sc.iter() {
                c.push_back(v.clone());
            }
        }
        v @ (JVal::Array(_) | JVal::Object(_)) => c.push_back(v.clone()),
        atom => {
            if let Some(label) = &src.label {
                let mut wrapped = Container::new_object();
                wrapped.insert_labeled(label.clone(), atom.clone());
                c.push_back(JVal::Object(wrapped));
            } else {
                c.push_back(atom.clone());
            }
        }
    }
}

fn insert_into_object(c: &mut Container, src: &SourceYield, merge: bool) {
    match &src.value {
        JVal::Object(sc) => {
            for (k, v) in sc.iter() {
                merge_label(c, k, v, merge);
            }
        }
        atom => {
            if let Some(label) = &src.label {
                if c.get(label).is_none() {
                    c.insert_labeled(label.clone(), atom.clone());
                }
            }
            // a bare atom carries no label to add it under: no-op.
        }
    }
}

/// Insert `value` under `label`, following the object-destination rules:
/// non-clashing labels are added; clashing object-object labels recurse;
/// with merge, clashing non-object labels are converted to an array and
/// appended; without merge, a clash is left untouched (insert never
/// overwrites).
fn merge_label(c: &mut Container, label: &str, value: &JVal, merge: bool) {
    match (c.get(label).cloned(), value) {
        (Some(JVal::Object(mut existing)), JVal::Object(incoming)) => {
            for (k, v) in incoming.iter() {
                merge_label(&mut existing, k, v, merge);
            }
            c.insert_labeled(label.to_string(), JVal::Object(existing));
        }
        (Some(existing), _) if merge => {
            let mut arr = match existing {
                JVal::Array(a) => a,
                other => {
                    let mut a = Container::new_array();
                    a.push_back(other);
                    a
                }
            };
            arr.push_back(value.clone());
            c.insert_labeled(label.to_string(), JVal::Array(arr));
        }
        (Some(_), _) => {}
        (None, _) => {
            c.insert_labeled(label.to_string(), value.clone());
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
    fn bare_atom_appends_to_array() {
        let mut dst = j("[1,2]");
        insert(&mut dst, &SourceYield::bare(j("3")), false);
        assert_eq!(dst, j("[1,2,3]"));
    }

    #[test]
    fn labeled_atom_wraps_before_appending() {
        let mut dst = j("[]");
        insert(&mut dst, &SourceYield::labeled(j("3"), "n"), false);
        assert_eq!(dst, j(r#"[{"n":3}]"#));
    }

    #[test]
    fn merge_appends_iterable_children_individually() {
        let mut dst = j("[1]");
        insert(&mut dst, &SourceYield::bare(j("[2,3]")), true);
        assert_eq!(dst, j("[1,2,3]"));
    }

    #[test]
    fn object_insert_never_overwrites_existing_label() {
        let mut dst = j(r#"{"a":1}"#);
        insert(&mut dst, &SourceYield::bare(j(r#"{"a":2,"b":3}"#)), false);
        assert_eq!(dst, j(r#"{"a":1,"b":3}"#));
    }

    #[test]
    fn object_insert_recurses_on_clashing_objects() {
        let mut dst = j(r#"{"a":{"x":1}}"#);
        insert(&mut dst, &SourceYield::bare(j(r#"{"a":{"y":2}}"#)), false);
        assert_eq!(dst, j(r#"{"a":{"x":1,"y":2}}"#));
    }

    #[test]
    fn merge_converts_clashing_atom_to_array() {
        let mut dst = j(r#"{"a":1}"#);
        insert(&mut dst, &SourceYield::bare(j(r#"{"a":2}"#)), true);
        assert_eq!(dst, j(r#"{"a":[1,2]}"#));
    }
}
