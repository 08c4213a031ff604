//! `PathVec`: a sequence of container keys identifying a node relative to
//! the document root (spec.md §4.3 "End sentinel", "Validity").

use crate::json::{Container, JNumber, JVal};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathEntry {
    /// A container key: an object label, or an array's hex-biased index key.
    Key(String),
    /// The designated end-of-children sentinel; any step reaching it
    /// short-circuits the rest of the walk.
    End,
}

/// Tracks a walk's current position as a sequence of container keys from
/// the root. Resolution is always by key, not by cached reference, so a
/// `PathVec` stays meaningful across container mutations as long as its
/// keys still exist (spec.md's "validity" notion).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathVec(Vec<PathEntry>);

impl PathVec {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_end(&self) -> bool {
        matches!(self.0.last(), Some(PathEntry::End))
    }

    pub fn push(&mut self, key: impl Into<String>) {
        self.0.push(PathEntry::Key(key.into()));
    }

    pub fn push_end(&mut self) {
        self.0.push(PathEntry::End);
    }

    pub fn truncate(&mut self, n: usize) {
        self.0.truncate(n);
    }

    pub fn pop(&mut self) -> Option<PathEntry> {
        self.0.pop()
    }

    /// Append another path's entries (used to graft a search match's
    /// relative suffix onto the walk's accumulated prefix).
    pub fn extend_from(&mut self, other: &PathVec) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn entries(&self) -> &[PathEntry] {
        &self.0
    }

    pub fn last_key(&self) -> Option<&str> {
        match self.0.last() {
            Some(PathEntry::Key(k)) => Some(k),
            _ => None,
        }
    }

    /// Resolve this path against `root`. `None` if the end sentinel is
    /// present or any recorded key no longer exists.
    pub fn resolve<'a>(&self, root: &'a JVal) -> Option<&'a JVal> {
        let mut cur = root;
        for entry in &self.0 {
            match entry {
                PathEntry::End => return None,
                PathEntry::Key(k) => cur = cur.as_container()?.get(k)?,
            }
        }
        Some(cur)
    }

    /// Resolve this path mutably against `root` (same semantics as
    /// [`PathVec::resolve`]); used by the operation engine to mutate a
    /// destination in place.
    pub fn resolve_mut<'a>(&self, root: &'a mut JVal) -> Option<&'a mut JVal> {
        let mut cur = root;
        for entry in &self.0 {
            match entry {
                PathEntry::End => return None,
                PathEntry::Key(k) => cur = cur.as_container_mut()?.get_mut(k)?,
            }
        }
        Some(cur)
    }

    /// Split into the parent path and the final key, for operations that
    /// need to reach into the container that directly owns this node
    /// (renaming a label, deleting an entry).
    pub fn parent_and_key(&self) -> Option<(PathVec, &str)> {
        match self.0.split_last() {
            Some((PathEntry::Key(k), rest)) => Some((PathVec(rest.to_vec()), k.as_str())),
            _ => None,
        }
    }

    /// A path is valid when every recorded label still resolves in the
    /// current tree — tolerant of array reordering since resolution goes
    /// by key, not by position.
    pub fn is_valid(&self, root: &JVal) -> bool {
        self.resolve(root).is_some()
    }

    /// Render as a JSON array of labels/indices (the `W` directive's form).
    pub fn to_json_array(&self, root: &JVal) -> JVal {
        let mut out = Container::new_array();
        let mut cur = root;
        for entry in &self.0 {
            let PathEntry::Key(k) = entry else { break };
            let Some(container) = cur.as_container() else {
                break;
            };
            let label = if container.is_array_kind() {
                JVal::Number(JNumber::from_f64(container.array_index_of(k) as f64))
            } else {
                JVal::String(k.clone())
            };
            out.push_back(label);
            let Some(next) = container.get(k) else { break };
            cur = next;
        }
        JVal::Array(out)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::parser::{parse, ParserOptions};

    #[test]
    fn resolves_nested_path() {
        let root = parse(r#"{"a":[1,2,{"b":3}]}"#, &ParserOptions::default()).unwrap();
        let container = root.as_container().unwrap();
        let (a_key, _) = container.get_index(0).unwrap();
        let mut path = PathVec::new();
        path.push(a_key.to_string());
        let arr = root.as_container().unwrap().get(a_key).unwrap();
        let (third_key, _) = arr.as_container().unwrap().get_index(2).unwrap();
        path.push(third_key.to_string());
        let inner = arr.as_container().unwrap().get(third_key).unwrap();
        let (b_key, _) = inner.as_container().unwrap().get_index(0).unwrap();
        path.push(b_key.to_string());
        assert_eq!(path.resolve(&root), Some(&JVal::Number(JNumber::from_f64(3.0))));
    }

    #[test]
    fn end_sentinel_fails_resolution() {
        let root = JVal::empty_object();
        let mut path = PathVec::new();
        path.push_end();
        assert_eq!(path.resolve(&root), None);
        assert!(!path.is_valid(&root));
    }

    #[test]
    fn to_json_array_uses_decoded_index_for_arrays() {
        let root = parse(r#"[10,20,30]"#, &ParserOptions::default()).unwrap();
        let (key, _) = root.as_container().unwrap().get_index(1).unwrap();
        let mut path = PathVec::new();
        path.push(key.to_string());
        let arr = path.to_json_array(&root);
        assert_eq!(arr, JVal::Array({
            let mut c = Container::new_array();
            c.push_back(JVal::Number(JNumber::from_f64(1.0)));
            c
        }));
    }
}
