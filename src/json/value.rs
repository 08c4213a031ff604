//! The in-memory JSON value (`JVal`) and its dual-representation number type.

use super::container::Container;
use std::fmt;

/// A parsed JSON value.
///
/// Numbers keep both their original textual form and a parsed `f64` view
/// (see [`JNumber`]) so that printing a parsed-then-unmodified number
/// reproduces its literal form. Strings are stored already escape-decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum JVal {
    Object(Container),
    Array(Container),
    String(String),
    Number(JNumber),
    Bool(bool),
    Null,
}

/// A JSON number: the text as it appeared in the source, plus a parsed
/// `f64` used for arithmetic, ordering and the `N`/`d`/`D` match suffixes.
#[derive(Debug, Clone)]
pub struct JNumber {
    text: Box<str>,
    value: f64,
}

impl JNumber {
    /// Build from already-validated source text (must match the grammar in
    /// `json::parser`; callers that don't parse text should use `from_f64`).
    pub fn from_text(text: impl Into<Box<str>>) -> Self {
        let text = text.into();
        let value = text.parse().unwrap_or(f64::NAN);
        Self { text, value }
    }

    /// Synthesize a number from a Rust `f64`, e.g. the result of the `I`
    /// directive. Renders the shortest round-tripping decimal form.
    pub fn from_f64(value: f64) -> Self {
        let text = if value.fract() == 0.0 && value.abs() < 1e15 {
            format!("{}", value as i64)
        } else {
            format!("{value}")
        };
        Self {
            text: text.into_boxed_str(),
            value,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl PartialEq for JNumber {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl fmt::Display for JNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl JVal {
    pub fn empty_object() -> Self {
        JVal::Object(Container::new_object())
    }

    pub fn empty_array() -> Self {
        JVal::Array(Container::new_array())
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JVal::Object(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, JVal::Array(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, JVal::Object(_) | JVal::Array(_))
    }

    /// Atomic: string, number, bool or null.
    pub fn is_atomic(&self) -> bool {
        !self.is_container()
    }

    /// "end node": a leaf, i.e. atomic, or an empty container.
    pub fn is_end_node(&self) -> bool {
        match self {
            JVal::Object(c) | JVal::Array(c) => c.is_empty(),
            _ => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JVal::Null)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, JVal::String(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, JVal::Number(_))
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, JVal::Bool(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JVal::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<&JNumber> {
        match self {
            JVal::Number(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JVal::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            JVal::Object(c) | JVal::Array(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_container_mut(&mut self) -> Option<&mut Container> {
        match self {
            JVal::Object(c) | JVal::Array(c) => Some(c),
            _ => None,
        }
    }

    /// Total number of descendants (recursive), used by the `Z` directive's
    /// recursive form.
    pub fn descendant_count(&self) -> usize {
        match self {
            JVal::Object(c) | JVal::Array(c) => {
                c.iter().map(|(_, v)| 1 + v.descendant_count()).sum()
            }
            _ => 0,
        }
    }

    /// Size used by the non-recursive `Z` directive: container child count,
    /// string length, or -1 for other atomics.
    pub fn size(&self) -> i64 {
        match self {
            JVal::Object(c) | JVal::Array(c) => c.len() as i64,
            JVal::String(s) => s.chars().count() as i64,
            _ => -1,
        }
    }

    /// A canonical, order-preserving serialization used as a de-dup key by
    /// the `q`/`Q` match suffixes.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        super::printer::write_canonical(self, &mut out);
        out
    }
}

/// Structural equality: objects compare by label set (order-independent);
/// arrays compare positionally, ignoring the hex key bias entirely.
impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        if self.is_array_kind() != other.is_array_kind() {
            return false;
        }
        if self.is_array_kind() {
            self.len() == other.len()
                && self
                    .iter()
                    .map(|(_, v)| v)
                    .zip(other.iter().map(|(_, v)| v))
                    .all(|(a, b)| a == b)
        } else {
            self.len() == other.len()
                && self
                    .iter()
                    .all(|(k, v)| other.get(k).map(|ov| ov == v).unwrap_or(false))
        }
    }
}
