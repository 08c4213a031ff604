//! Match predicates for search steps (spec.md §4.3 "Match predicates").

use super::step::SearchKind;
use crate::json::JVal;
use crate::namespace::Namespace;
use regex::Regex;

/// Does `candidate` (found under `parent_label`, if any) satisfy `kind`?
/// Predicates that capture (`P`, `N`, `b`, `n` with a named lexeme) write
/// the captured value into the iteration tier of `ns` as a side effect of
/// a successful match. `step_text` scopes the `q`/`Q` de-dup set.
#[allow(clippy::too_many_arguments)]
pub fn matches(
    kind: &SearchKind,
    regex: Option<&Regex>,
    candidate: &JVal,
    parent_label: Option<&str>,
    attached_label: Option<&str>,
    ns: &mut Namespace,
    step_text: &str,
) -> bool {
    if let Some(label) = attached_label {
        if parent_label != Some(label) {
            return false;
        }
    }
    match kind {
        SearchKind::Regular(s) => candidate.as_str() == Some(s.as_str()),
        SearchKind::Regex(_) => candidate
            .as_str()
            .is_some_and(|s| regex.is_some_and(|r| r.is_match(s))),
        SearchKind::AnyString(capture) => {
            if !candidate.is_string() {
                return false;
            }
            capture_if_named(capture, candidate, ns);
            true
        }
        SearchKind::Digital(s) => candidate.as_number().is_some_and(|n| n.text() == s),
        SearchKind::DigitalRegex(_) => candidate
            .as_number()
            .is_some_and(|n| regex.is_some_and(|r| r.is_match(n.text()))),
        SearchKind::AnyNumber(capture) => {
            if !candidate.is_number() {
                return false;
            }
            capture_if_named(capture, candidate, ns);
            true
        }
        SearchKind::Boolean(pinned, capture) => match (pinned, candidate.as_bool()) {
            (Some(want), Some(got)) => *want == got,
            (None, Some(_)) => {
                capture_if_named(capture, candidate, ns);
                true
            }
            _ => false,
        },
        SearchKind::Null(capture) => {
            if !candidate.is_null() {
                return false;
            }
            capture_if_named(capture, candidate, ns);
            true
        }
        SearchKind::LabelExact(label) => parent_label == Some(label.as_str()),
        SearchKind::LabelRegex(_) => {
            parent_label.is_some_and(|l| regex.is_some_and(|r| r.is_match(l)))
        }
        SearchKind::AnyAtomic => candidate.is_atomic(),
        SearchKind::AnyObject => candidate.is_object(),
        SearchKind::AnyArray => candidate.is_array(),
        SearchKind::AnyContainer => candidate.is_container(),
        SearchKind::EndNode => candidate.is_end_node(),
        SearchKind::Any => true,
        SearchKind::JsonLiteral(text) => {
            crate::json::parser::parse(text, &crate::json::ParserOptions::default())
                .map(|v| &v == candidate)
                .unwrap_or(false)
        }
        SearchKind::NamespaceValue(name) => ns.get(name).is_some_and(|v| v == candidate),
        SearchKind::NamespaceKey(_) => false, // matched against the *key*, not the value; see evaluator
        SearchKind::Unique => !ns.seen_before(step_text, candidate.canonical()),
        SearchKind::Duplicate => ns.seen_before(step_text, candidate.canonical()),
        // Ascending/Descending are resolved by enumeration order, not a
        // per-candidate predicate; any orderable atomic is a candidate.
        SearchKind::Ascending | SearchKind::Descending => is_orderable(candidate),
    }
}

fn capture_if_named(name: &Option<String>, value: &JVal, ns: &mut Namespace) {
    if let Some(name) = name {
        ns.set_iteration(name.clone(), value.clone());
    }
}

pub fn is_orderable(v: &JVal) -> bool {
    v.is_number() || v.is_string()
}

/// Ordering key for `g`/`G` enumeration: numbers by value, strings
/// lexicographically, numbers sorting before strings.
pub fn order_key(v: &JVal) -> (u8, f64, &str) {
    match v {
        JVal::Number(n) => (0, n.value(), ""),
        JVal::String(s) => (1, 0.0, s.as_str()),
        _ => (2, 0.0, ""),
    }
}
