//! JSON serialization: pretty (indented), raw (one-line) and semi-compact
//! modes, plus inquote/unquote whole-value wrapping.

use super::value::JVal;

#[derive(Debug, Clone, Copy)]
pub struct PrinterOptions {
    /// `Some(n)` prints indented with `n` spaces per level; `None` prints
    /// everything on one line ("raw" mode).
    pub indent: Option<usize>,
    /// In indented mode, print a container whose children are all atomic
    /// on a single line, but still expand any container that holds a
    /// nested iterable.
    pub semi_compact: bool,
    /// Stringify the whole printed value (wrap it in a JSON string).
    pub inquote: bool,
    /// If the root value is a string, emit its decoded contents with no
    /// surrounding quotes.
    pub unquote: bool,
}

impl PrinterOptions {
    pub fn raw() -> Self {
        Self {
            indent: None,
            semi_compact: false,
            inquote: false,
            unquote: false,
        }
    }

    pub fn pretty(indent: usize) -> Self {
        Self {
            indent: Some(indent),
            semi_compact: false,
            inquote: false,
            unquote: false,
        }
    }
}

pub fn print(v: &JVal, opts: &PrinterOptions) -> String {
    if opts.unquote {
        if let JVal::String(s) = v {
            return s.clone();
        }
    }
    let mut out = String::new();
    write_value(v, opts, 0, &mut out);
    if opts.inquote {
        let mut q = String::new();
        q.push('"');
        write_escaped(&out, &mut q);
        q.push('"');
        return q;
    }
    out
}

/// A deterministic, order-preserving one-line form used as a de-dup key by
/// the `q`/`Q` match suffixes.
pub fn write_canonical(v: &JVal, out: &mut String) {
    write_value(v, &PrinterOptions::raw(), 0, out);
}

fn has_nested_container(c: &super::container::Container) -> bool {
    c.iter().any(|(_, v)| v.is_container())
}

fn write_value(v: &JVal, opts: &PrinterOptions, depth: usize, out: &mut String) {
    match v {
        JVal::Null => out.push_str("null"),
        JVal::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        JVal::Number(n) => out.push_str(n.text()),
        JVal::String(s) => {
            out.push('"');
            write_escaped(s, out);
            out.push('"');
        }
        JVal::Array(c) => write_container(c, '[', ']', opts, depth, out, |v, opts, d, out| {
            write_value(v, opts, d, out)
        }),
        JVal::Object(c) => write_container_labeled(c, opts, depth, out),
    }
}

fn compact_mode(opts: &PrinterOptions, c: &super::container::Container) -> bool {
    opts.indent.is_none() || (opts.semi_compact && !has_nested_container(c))
}

fn write_container(
    c: &super::container::Container,
    open: char,
    close: char,
    opts: &PrinterOptions,
    depth: usize,
    out: &mut String,
    write_child: impl Fn(&JVal, &PrinterOptions, usize, &mut String),
) {
    out.push(open);
    if c.is_empty() {
        out.push(close);
        return;
    }
    let compact = compact_mode(opts, c);
    let indent_unit = opts.indent.unwrap_or(0);
    let mut first = true;
    for (_, child) in c.iter() {
        if !first {
            out.push(',');
        }
        first = false;
        if !compact {
            out.push('\n');
            out.push_str(&" ".repeat(indent_unit * (depth + 1)));
        }
        write_child(child, opts, depth + 1, out);
    }
    if !compact {
        out.push('\n');
        out.push_str(&" ".repeat(indent_unit * depth));
    }
    out.push(close);
}

fn write_container_labeled(
    c: &super::container::Container,
    opts: &PrinterOptions,
    depth: usize,
    out: &mut String,
) {
    out.push('{');
    if c.is_empty() {
        out.push('}');
        return;
    }
    let compact = compact_mode(opts, c);
    let indent_unit = opts.indent.unwrap_or(0);
    let mut first = true;
    for (label, child) in c.iter() {
        if !first {
            out.push(',');
        }
        first = false;
        if !compact {
            out.push('\n');
            out.push_str(&" ".repeat(indent_unit * (depth + 1)));
        }
        out.push('"');
        write_escaped(label, out);
        out.push_str("\":");
        if !compact {
            out.push(' ');
        }
        write_value(child, opts, depth + 1, out);
    }
    if !compact {
        out.push('\n');
        out.push_str(&" ".repeat(indent_unit * depth));
    }
    out.push('}');
}

fn write_escaped(s: &str, out: &mut String) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{0008}' => out.push_str("\\b"),
            '\u{000C}' => out.push_str("\\f"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::json::parser::{parse, ParserOptions};

    #[test]
    fn pretty_indents_nested_values() {
        let v = parse(r#"{"a":[1,2]}"#, &ParserOptions::default()).unwrap();
        let s = print(&v, &PrinterOptions::pretty(2));
        assert!(s.contains('\n'));
        assert!(s.starts_with("{\n  \"a\": [\n    1,\n    2\n  ]\n}"));
    }

    #[test]
    fn raw_is_single_line() {
        let v = parse(r#"{"a":[1,2]}"#, &ParserOptions::default()).unwrap();
        let s = print(&v, &PrinterOptions::raw());
        assert_eq!(s, r#"{"a":[1,2]}"#);
    }

    #[test]
    fn semi_compact_expands_only_nested_iterables() {
        let v = parse(r#"{"a":1,"b":{"c":2}}"#, &ParserOptions::default()).unwrap();
        let mut opts = PrinterOptions::pretty(2);
        opts.semi_compact = true;
        let s = print(&v, &opts);
        // outer expands (has a nested container), inner "b" is atomic-only so stays compact
        assert!(s.contains("\"b\": {\"c\":2}"));
    }

    #[test]
    fn unquote_strips_quotes_from_root_string() {
        let v = JVal::String("hello".into());
        let mut opts = PrinterOptions::raw();
        opts.unquote = true;
        assert_eq!(print(&v, &opts), "hello");
    }

    #[test]
    fn inquote_wraps_whole_output() {
        let v = JVal::Bool(true);
        let mut opts = PrinterOptions::raw();
        opts.inquote = true;
        assert_eq!(print(&v, &opts), "\"true\"");
    }
}
