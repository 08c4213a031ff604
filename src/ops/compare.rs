//! `-c`: structural diff between destination and source (spec.md §4.6).

use crate::json::{Container, JVal};

/// The parts of `base` and `cmp` that don't structurally agree. Both
/// fields are `None` when the two values are equal.
#[derive(Debug, Clone, Default)]
pub struct Diff {
    pub base_only: Option<JVal>,
    pub cmp_only: Option<JVal>,
}

impl Diff {
    pub fn is_mismatch(&self) -> bool {
        self.base_only.is_some() || self.cmp_only.is_some()
    }
}

/// Diff two values: objects compare by label set then recurse on
/// intersecting labels; arrays zip positionally; atomics compare by type
/// then by value (spec.md §4.6).
pub fn diff(base: &JVal, cmp: &JVal) -> Diff {
    match (base, cmp) {
        (JVal::Object(b), JVal::Object(c)) => diff_object(b, c),
        (JVal::Array(b), JVal::Array(c)) => diff_array(b, c),
        _ => {
            if base == cmp {
                Diff::default()
            } else {
                Diff { base_only: Some(base.clone()), cmp_only: Some(cmp.clone()) }
            }
        }
    }
}

fn diff_object(b: &Container, c: &Container) -> Diff {
    let mut only_base = Container::new_object();
    let mut only_cmp = Container::new_object();
    for (k, bv) in b.iter() {
        match c.get(k) {
            Some(cv) => {
                let d = diff(bv, cv);
                if let Some(v) = d.base_only {
                    only_base.insert_labeled(k, v);
                }
                if let Some(v) = d.cmp_only {
                    only_cmp.insert_labeled(k, v);
                }
            }
            None => {
                only_base.insert_labeled(k, bv.clone());
            }
        }
    }
    for (k, cv) in c.iter() {
        if b.get(k).is_none() {
            only_cmp.insert_labeled(k, cv.clone());
        }
    }
    Diff {
        base_only: (!only_base.is_empty()).then_some(JVal::Object(only_base)),
        cmp_only: (!only_cmp.is_empty()).then_some(JVal::Object(only_cmp)),
    }
}

fn diff_array(b: &Container, c: &Container) -> Diff {
    let mut only_base = Container::new_array();
    let mut only_cmp = Container::new_array();
    let n = b.len().max(c.len());
    for i in 0..n {
        match (b.get_index(i), c.get_index(i)) {
            (Some((_, bv)), Some((_, cv))) => {
                let d = diff(bv, cv);
                if let Some(v) = d.base_only {
                    only_base.push_back(v);
                }
                if let Some(v) = d.cmp_only {
                    only_cmp.push_back(v);
                }
            }
            (Some((_, bv)), None) => only_base.push_back(bv.clone()),
            (None, Some((_, cv))) => only_cmp.push_back(cv.clone()),
            (None, None) => unreachable!(),
        }
    }
    Diff {
        base_only: (!only_base.is_empty()).then_some(JVal::Array(only_base)),
        cmp_only: (!only_cmp.is_empty()).then_some(JVal::Array(only_cmp)),
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
    fn identical_values_produce_no_diff() {
        let d = diff(&j(r#"{"a":1}"#), &j(r#"{"a":1}"#));
        assert!(!d.is_mismatch());
    }

    #[test]
    fn object_diff_reports_each_side() {
        let d = diff(&j(r#"{"a":1,"b":2}"#), &j(r#"{"a":1,"c":3}"#));
        assert!(d.is_mismatch());
        assert_eq!(d.base_only, Some(j(r#"{"b":2}"#)));
        assert_eq!(d.cmp_only, Some(j(r#"{"c":3}"#)));
    }

    #[test]
    fn array_diff_is_positional() {
        let d = diff(&j("[1,2,3]"), &j("[1,9]"));
        assert_eq!(d.base_only, Some(j("[2,3]")));
        assert_eq!(d.cmp_only, Some(j("[9]")));
    }

    #[test]
    fn type_mismatch_counts_as_a_diff() {
        let d = diff(&j("1"), &j(r#""1""#));
        assert!(d.is_mismatch());
    }
}
