//! Ordered container shared by `JVal::Object` and `JVal::Array`.
//!
//! Both variants keep children in an ordered map from a string key to a
//! child value: for objects the key is the label, for arrays it's a
//! hex-encoded index biased by [`ARRAY_KEY_BIAS`]. Biasing lets
//! `push_front`/`push_back` mint keys strictly below/above every existing
//! one without renumbering siblings, so outstanding iterators over other
//! elements stay valid across insertions at either end.

use super::value::JVal;
use indexmap::IndexMap;

/// Bias added to array indices before hex-encoding them as map keys.
pub const ARRAY_KEY_BIAS: i64 = 0x8000_0000;

#[derive(Debug, Clone)]
enum Kind {
    Object,
    Array,
}

#[derive(Debug, Clone)]
pub struct Container {
    kind: Kind,
    map: IndexMap<String, JVal>,
    /// Next biased value to use for `push_back`/`push_front`, tracked
    /// independently of `map.len()` so keys stay monotonic even after
    /// interior deletions.
    next_back: i64,
    next_front: i64,
}

impl Container {
    pub fn new_object() -> Self {
        Self {
            kind: Kind::Object,
            map: IndexMap::new(),
            next_back: ARRAY_KEY_BIAS,
            next_front: ARRAY_KEY_BIAS,
        }
    }

    pub fn new_array() -> Self {
        Self {
            kind: Kind::Array,
            map: IndexMap::new(),
            next_back: ARRAY_KEY_BIAS,
            next_front: ARRAY_KEY_BIAS - 1,
        }
    }

    pub fn is_array_kind(&self) -> bool {
        matches!(self.kind, Kind::Array)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&JVal> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut JVal> {
        self.map.get_mut(key)
    }

    pub fn get_index(&self, i: usize) -> Option<(&str, &JVal)> {
        self.map.get_index(i).map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_index_mut(&mut self, i: usize) -> Option<(&str, &mut JVal)> {
        self.map
            .get_index_mut(i)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.map.get_index_of(key)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &JVal)> {
        self.map.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.map.keys().map(|k| k.as_str())
    }

    /// Object-style insert/overwrite by label; returns the previous value.
    pub fn insert_labeled(&mut self, label: impl Into<String>, value: JVal) -> Option<JVal> {
        self.map.insert(label.into(), value)
    }

    /// Array-style append: mints a key strictly greater than all existing.
    pub fn push_back(&mut self, value: JVal) {
        let key = Self::encode(self.next_back);
        self.next_back += 1;
        self.map.insert(key, value);
    }

    /// Array-style prepend: mints a key strictly less than all existing.
    /// The map itself is still append-ordered internally, so we re-sort by
    /// key after inserting a front key (cheap relative to renumbering).
    pub fn push_front(&mut self, value: JVal) {
        let key = Self::encode(self.next_front);
        self.next_front -= 1;
        self.map.insert(key, value);
        self.map.sort_keys();
    }

    pub fn remove_index(&mut self, i: usize) -> Option<(String, JVal)> {
        self.map.shift_remove_index(i)
    }

    pub fn remove_key(&mut self, key: &str) -> Option<JVal> {
        self.map.shift_remove(key)
    }

    /// Rekeys an array container to dense biased indices `0..n-1` in
    /// current iteration order, idempotent when reapplied.
    pub fn normalize_idx(&mut self) {
        if !self.is_array_kind() {
            return;
        }
        let values: Vec<JVal> = self.map.drain(..).map(|(_, v)| v).collect();
        self.next_back = ARRAY_KEY_BIAS;
        self.next_front = ARRAY_KEY_BIAS - 1;
        for v in values {
            self.push_back(v);
        }
    }

    fn encode(biased: i64) -> String {
        format!("{biased:016x}")
    }

    /// Decode an array container's internal key back to its display index.
    /// Meaningless for object containers.
    pub fn array_index_of(&self, key: &str) -> i64 {
        i64::from_str_radix(key, 16).unwrap_or(ARRAY_KEY_BIAS) - ARRAY_KEY_BIAS
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn push_back_preserves_order() {
        let mut c = Container::new_array();
        c.push_back(JVal::Number(super::super::value::JNumber::from_f64(1.0)));
        c.push_back(JVal::Number(super::super::value::JNumber::from_f64(2.0)));
        c.push_back(JVal::Number(super::super::value::JNumber::from_f64(3.0)));
        let vals: Vec<_> = c.iter().map(|(_, v)| v.as_number().unwrap().value()).collect();
        assert_eq!(vals, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn push_front_precedes_existing() {
        let mut c = Container::new_array();
        c.push_back(JVal::Null);
        c.push_front(JVal::Bool(true));
        let (first_key, first_val) = c.get_index(0).unwrap();
        assert_eq!(*first_val, JVal::Bool(true));
        let (second_key, _) = c.get_index(1).unwrap();
        assert!(first_key < second_key);
    }

    #[test]
    fn normalize_idx_is_idempotent() {
        let mut c = Container::new_array();
        c.push_back(JVal::Null);
        c.push_front(JVal::Bool(false));
        c.normalize_idx();
        let once: Vec<String> = c.keys().map(|k| k.to_string()).collect();
        c.normalize_idx();
        let twice: Vec<String> = c.keys().map(|k| k.to_string()).collect();
        assert_eq!(once, twice);
    }
}
