//! The compiled representation of a single walk-path lexeme (spec.md §3
//! "Walk step", §4.2).

use regex::Regex;

/// Which bracket form produced a search step: governs both the traversed
/// scope and the order candidates are visited in (spec.md §4.2/§4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `<…>` — recursive: the whole subtree, visited in document order.
    Forward,
    /// `>…<` — non-recursive: immediate children only, visited in reverse.
    Backward,
}

/// `[n]`, `[-n]`, `[^n]`, `[+n]`, `[n:m]`, `[n:m:s]` and the label-matching
/// `[label]` / `[ 1]` ("text subscript") forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Subscript {
    /// `[n]`: advance to the n-th child.
    Index(i64),
    /// `[-n]`: ascend n levels (truncate path by n entries from the tail).
    Ascend(i64),
    /// `[^n]`: truncate path to its first n steps from root.
    Truncate(i64),
    /// `[label]` (or `[ 1]`, `[]`): lookup child by exact label/key text.
    Label(String),
}

/// The predicate a search lexeme matches against a candidate node (plus its
/// parent label), per the suffix table in spec.md §4.3.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchKind {
    /// `r`: string values equal to the lexeme.
    Regular(String),
    /// `R`: string values matching the compiled regex.
    Regex(#[allow(dead_code)] String),
    /// `P`: any string; lexeme (if non-empty) names a capture variable.
    AnyString(Option<String>),
    /// `d`: numeric values whose textual form equals the lexeme.
    Digital(String),
    /// `D`: numeric values whose textual form matches the regex.
    DigitalRegex(#[allow(dead_code)] String),
    /// `N`: any numeric; lexeme (if non-empty) names a capture variable.
    AnyNumber(Option<String>),
    /// `b`: boolean. `Some(true/false)` pins the literal, `None` matches
    /// either and the lexeme (if non-empty) names a capture variable.
    Boolean(Option<bool>, Option<String>),
    /// `n`: null; lexeme (if non-empty) names a capture variable.
    Null(Option<String>),
    /// `l`: object labels equal to the lexeme.
    LabelExact(String),
    /// `L`: object labels matching the regex.
    LabelRegex(#[allow(dead_code)] String),
    AnyAtomic,
    AnyObject,
    AnyArray,
    AnyContainer,
    /// `e`: any end-node (leaf: atomic, or an empty container).
    EndNode,
    /// `w`: wide — matches anything.
    Any,
    /// `j`: value equal to the (template-interpolated) JSON literal text.
    JsonLiteral(String),
    /// `s`: value equal to a JSON value previously stored under this name.
    NamespaceValue(String),
    /// `t`: label/index equal to the value stored under this namespace name.
    NamespaceKey(String),
    /// `q`: only first-seen occurrences (by canonical serialization).
    Unique,
    /// `Q`: only duplicate occurrences.
    Duplicate,
    /// `g`: next element in ascending order across the subtree.
    Ascending,
    /// `G`: next element in descending order across the subtree.
    Descending,
}

/// Which of `Z`'s three size readings a directive reports (spec.md §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeMode {
    /// No quantifier: container child count, string length, or -1.
    Default,
    /// Quantifier `1`: string length, or -1 for anything that isn't a string
    /// (including containers, unlike the default reading).
    StringLength,
    /// Quantifier `2`: total descendant count, recursively.
    Recursive,
}

/// `<>F` / `><F` control-flow direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    /// `<>F`: skip to the next iteration.
    NextIteration,
    /// `><F`: stop walking entirely.
    StopWalking,
}

/// A directive: performs a side effect and does not itself advance the
/// path (spec.md §4.3 "Directives").
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// `v <name>`: store the current walked value under `name`.
    StoreValue(String),
    /// `k <name>`: store the current label/index under `name`.
    StoreKey(String),
    /// `z <name>`: erase `name` from the namespace.
    Erase(String),
    /// `f`: record a restoration point for this iteration.
    FailSafe,
    /// `F`: jump, with the optional extra-lexeme count.
    Jump(JumpKind, i64),
    /// `u`: invoke the host callback.
    Callback,
    /// `I <name>[n[:m]]`: increment then optionally multiply.
    Increment { name: String, inc: i64, mul: Option<i64> },
    /// `Z <name>`: store size (quantifier 1: string length; recursive:
    /// descendant count).
    StoreSize { name: String, mode: SizeMode },
    /// `W <name>`: store the current walk path as a JSON array.
    StorePath(String),
}

/// The dispatch tag for a compiled step (spec.md §3 "Walk step", `kind`).
#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
    Subscript(Subscript),
    Search(SearchKind),
    Directive(Directive),
}

/// A single compiled lexeme of a walk path.
#[derive(Debug, Clone)]
pub struct Step {
    /// Original lexeme text, including brackets/suffix/quantifier.
    pub text: String,
    pub kind: StepKind,
    /// Stripped lexeme content (the text between the brackets).
    pub content: String,
    /// `[label]:` prefix immediately before a search lexeme.
    pub attached_label: Option<String>,
    /// Compiled regex, present for `Regex`/`DigitalRegex`/`LabelRegex`.
    pub regex: Option<Regex>,
    /// Direction a search step traverses in; irrelevant for subscripts.
    pub direction: Direction,
    /// Instance index / absolute subscript (quantifier `n`, or the current
    /// position within an iterable quantifier).
    pub offset: i64,
    /// -1: non-iterable. -2: from-root truncate ([^n] only). >=0: iterable,
    /// holding the initial offset to reset to when the iterator wraps.
    pub init: i64,
    /// Open upper bound / step for `n:m[:s]` range quantifiers.
    pub range_end: Option<i64>,
    pub range_step: i64,
}

impl Step {
    pub fn is_iterable(&self) -> bool {
        self.init >= 0
    }

    pub fn reset_offset(&mut self) {
        if self.init >= 0 {
            self.offset = self.init;
        }
    }
}
