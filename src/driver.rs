//! Option-set decomposition and per-set orchestration (spec.md §4.7).
//!
//! The command line is split on bare `/` tokens into independent sets; each
//! set's result becomes the next set's input, with the namespace's global
//! tier carried across the boundary so `$file` survives a `/`. Within one
//! set this ties together every other module: compile the `-w` walks, bind
//! a mutator's source if one was given, schedule/apply it, and print.
//!
//! `-a` additionally splits a single input stream into several concatenated
//! JSON documents (spec.md §4.1, §5 "accepts multiple concatenated JSON
//! values"); every document in the batch runs through the same chain of
//! option sets independently, and `-J` folds the batch's final results back
//! into one array before printing.

use crate::cli::{self, Args, MutatorArg, MutatorKind};
use crate::json::parser::ParserOptions;
use crate::json::{print, Container, JNumber, Json, JVal, PrinterOptions, StreamParser};
use crate::namespace::Namespace;
use crate::ops::source::{self, SourceSpec};
use crate::ops::{compare, insert, purge, swap, update, OpsError};
use crate::scheduler::{self, Mode};
use crate::template::interpolate;
use crate::walk::{compile, Directive, PathVec, SearchCache, Step, StepKind, Walk, WalkOutcome};
use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};

/// The mini user-guide printed by `-g` (spec.md §6): a short summary of the
/// walk-path syntax, not the full grammar reference.
const GUIDE_TEXT: &str = "\
walk path syntax:
  [label]        descend into an object label
  [N]            descend into an array index
  [+N]           iterate array indices starting at N
  <text>s+N      search: s selects the kind (r regex, w word, d digit, ...)
  ><text>s+N     same, but only immediate children, in reverse order
  <name>v        store the current value under `name` in the namespace
  {name}         interpolate `name`'s naked form into a -T template or -e shell command
  {{name}}       interpolate `name`'s canonical JSON form
see spec.md §4.2-§4.4 for the complete grammar.";

/// Threaded across option sets: every document currently flowing through the
/// pipeline (more than one only when `-a` split the input, or several files
/// were given), the file each originated from (for `-f` write-back), and the
/// namespace tier that survives a `/` boundary.
struct Pipeline {
    docs: Vec<Json>,
    sources: Vec<Option<String>>,
    ns: Namespace,
    caches: Vec<SearchCache>,
}

/// Run a full command line (already stripped of argv[0]) to completion and
/// return what would be printed to stdout.
pub fn run(argv: &[String]) -> crate::error::Result<String> {
    let sets = cli::split_into_sets(argv);
    let total = sets.len();
    let mut pipeline: Option<Pipeline> = None;
    let mut results: Vec<JVal> = Vec::new();
    let mut last_args = Args::default();

    for (index, raw_tokens) in sets.into_iter().enumerate() {
        let pos = cli::set_position(index, total);
        let (remaining, mutators) = cli::extract_mutators(&raw_tokens)?;
        let (remaining, extra_walks, every_nth) = cli::extract_walk_parts(&remaining)?;
        let mut args = Args::parse_from_tokens(&remaining)?;
        args.extra_walks = extra_walks;
        args.every_nth = every_nth;
        cli::check_transient_placement(&args, pos)?;

        if args.guide {
            return Ok(GUIDE_TEXT.to_string());
        }

        let mut state = match pipeline.take() {
            Some(p) => p,
            None => load_initial(&args)?,
        };

        results = Vec::with_capacity(state.docs.len());
        for i in 0..state.docs.len() {
            let result = run_set(&mut state.docs[i], &mut state.ns, &mut state.caches[i], &args, &mutators)?;
            state.docs[i] = Json::new(result.clone());
            state.docs[i].bump();
            state.caches[i] = SearchCache::new();
            results.push(result);
        }

        if args.force_write {
            write_back(&state.sources, &results, &printer_options(&args))?;
        }

        last_args = args;
        pipeline = Some(state);
    }

    let opts = printer_options(&last_args);
    if last_args.jsonize_all && results.len() > 1 {
        let mut arr = Container::new_array();
        for r in results {
            arr.push_back(r);
        }
        Ok(print(&JVal::Array(arr), &opts))
    } else {
        Ok(results.iter().map(|r| print(r, &opts)).collect::<Vec<_>>().join("\n"))
    }
}

/// Read the starting document(s). Several positional files are read
/// concurrently (spec.md §5 "parallel input reading") and then parsed in
/// argument order; `-a` additionally splits each file's text into several
/// concatenated JSON values instead of exactly one.
fn load_initial(args: &Args) -> crate::error::Result<Pipeline> {
    let opts = ParserOptions { strict_solidus: args.quote_solidus >= 1 };
    let mut ns = Namespace::new();
    let mut docs = Vec::new();
    let mut sources = Vec::new();

    let real_paths: Vec<&String> = args.files.iter().filter(|p| p.as_str() != "-").collect();

    if real_paths.is_empty() {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        for v in read_documents(&text, args.all, &opts)? {
            docs.push(Json::new(v));
            sources.push(None);
        }
    } else {
        let texts = read_files_parallel(&real_paths)?;
        ns.bind_file(real_paths[0].clone());
        for (path, text) in real_paths.into_iter().zip(texts) {
            for v in read_documents(&text, args.all, &opts)? {
                docs.push(Json::new(v));
                sources.push(Some(path.clone()));
            }
        }
    }

    let caches = docs.iter().map(|_| SearchCache::new()).collect();
    Ok(Pipeline { docs, sources, ns, caches })
}

fn read_documents(text: &str, all: bool, opts: &ParserOptions) -> crate::error::Result<Vec<JVal>> {
    if all {
        StreamParser::new(text, *opts)
            .map(|r| r.map_err(Into::into))
            .collect()
    } else {
        Ok(vec![crate::json::parser::parse(text, opts)?])
    }
}

/// One reader thread per file when there's more than one; a lone file (the
/// overwhelmingly common case) is read inline with no thread overhead.
fn read_files_parallel(paths: &[&String]) -> crate::error::Result<Vec<String>> {
    if paths.len() <= 1 {
        return paths.iter().map(|p| fs::read_to_string(p).map_err(Into::into)).collect();
    }
    std::thread::scope(|scope| {
        let handles: Vec<_> = paths.iter().map(|p| scope.spawn(move || fs::read_to_string(p))).collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("reader thread panicked").map_err(Into::into))
            .collect()
    })
}

/// `-f` write-back: per spec.md §5, the first document emitted for a given
/// source file truncates it, later documents from the same `-a` batch append.
fn write_back(sources: &[Option<String>], results: &[JVal], opts: &PrinterOptions) -> crate::error::Result<()> {
    let mut truncated: HashSet<&str> = HashSet::new();
    for (path, result) in sources.iter().zip(results) {
        let Some(path) = path else { continue };
        let text = print(result, opts);
        let mut file = if truncated.insert(path.as_str()) {
            fs::File::create(path)?
        } else {
            fs::OpenOptions::new().append(true).open(path)?
        };
        writeln!(file, "{text}")?;
    }
    Ok(())
}

fn printer_options(args: &Args) -> PrinterOptions {
    let indent_n = args
        .indent
        .as_ref()
        .and_then(|s| s.trim_end_matches('c').parse().ok())
        .unwrap_or(3);
    PrinterOptions {
        indent: if args.raw >= 1 { None } else { Some(indent_n) },
        semi_compact: args.indent.as_ref().map(|s| s.ends_with('c')).unwrap_or(false),
        inquote: args.raw >= 2,
        unquote: args.quote_solidus >= 2,
    }
}

/// Compile every `-w` walk, plus whatever `-x`/`-y` assembled; an empty
/// combined list falls back to the implicit whole-document walk (an empty
/// step sequence matching the root once). `-x N[/M]` then narrows the
/// combined list down to every N-th entry, starting at offset M.
fn compile_walks(args: &Args) -> crate::error::Result<Vec<Walk<'static>>> {
    let combined: Vec<&String> = args.walk.iter().chain(args.extra_walks.iter()).collect();
    if combined.is_empty() {
        return Ok(vec![Walk::new(Vec::new())]);
    }
    let selected: Vec<&String> = match args.every_nth {
        Some((n, offset)) => combined
            .into_iter()
            .enumerate()
            .filter(|(i, _)| i % n == offset % n)
            .map(|(_, w)| w)
            .collect(),
        None => combined,
    };
    selected.into_iter().map(|w| Ok(Walk::new(compile(w)?))).collect()
}

fn schedule_matches(
    walks: &mut [Walk<'static>],
    root: &JVal,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    version: u64,
    args: &Args,
) -> Vec<PathVec> {
    let mode = if args.sequential >= 1 {
        Mode::Sequential { suppress_grouping: args.sequential >= 2 }
    } else {
        Mode::Interleave
    };
    scheduler::run(walks, root, ns, cache, version, mode)
        .into_iter()
        .map(|m| m.path)
        .collect()
}

fn run_set(
    doc: &mut Json,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    args: &Args,
    mutators: &[MutatorArg],
) -> crate::error::Result<JVal> {
    let mut walks = compile_walks(args)?;
    let matches = schedule_matches(&mut walks, &doc.root, ns, cache, doc.version(), args);

    if let Some(m) = mutators.first() {
        // Only a single destination walk unambiguously says which `-w`'s
        // trailing `k` directive governs the whole match set.
        let rename_key = match walks.as_slice() {
            [only] => store_key_name(only.steps()).map(str::to_string),
            _ => None,
        };
        return apply_mutator(doc, ns, cache, &matches, args, m, rename_key);
    }

    if args.purge > 0 {
        if args.purge >= 2 {
            purge::purge_invert(&mut doc.root, &matches);
        } else {
            purge::purge(&mut doc.root, &matches);
        }
        return Ok(doc.root.clone());
    }

    Ok(build_walk_output(doc, &matches, args))
}

/// A destination walk's trailing `k` directive selects `-u`'s label-rename
/// form instead of replacing the matched value (spec.md §4.6). `<>k` (empty
/// name) renames the match itself; `<name>k` instead renames the child
/// labeled `name` within it, letting the form stand alone with no preceding
/// navigation step (the directive doesn't otherwise move the match path).
fn store_key_name(steps: &[Step]) -> Option<&str> {
    match steps.last().map(|s| &s.kind) {
        Some(StepKind::Directive(Directive::StoreKey(name))) => Some(name.as_str()),
        _ => None,
    }
}

/// The full path a label-rename targets: `dst` itself for the empty-name
/// form, or `dst`'s child labeled `key_name` otherwise.
fn rename_target(dst: &PathVec, key_name: &str) -> PathVec {
    if key_name.is_empty() {
        dst.clone()
    } else {
        let mut p = dst.clone();
        p.push(key_name.to_string());
        p
    }
}

fn build_walk_output(doc: &Json, matches: &[PathVec], args: &Args) -> JVal {
    let values: Vec<(Option<String>, JVal)> = matches
        .iter()
        .filter_map(|p| Some((p, p.resolve(&doc.root)?.clone())))
        .flat_map(|(p, v)| gleaned_entries(p, v, &doc.root, args))
        .collect();

    let mut result = if args.jsonize >= 2 {
        let mut obj = Container::new_object();
        for (label, v) in values {
            obj.insert_labeled(label.unwrap_or_default(), v);
        }
        JVal::Object(obj)
    } else if args.jsonize == 1 || values.len() != 1 {
        let mut arr = Container::new_array();
        for (_, v) in values {
            arr.push_back(v);
        }
        JVal::Array(arr)
    } else {
        values.into_iter().next().map(|(_, v)| v).unwrap_or(JVal::Null)
    };

    if args.size >= 2 {
        return JVal::Number(JNumber::from_f64(result.descendant_count() as f64));
    }
    if args.size == 1 {
        let size = JVal::Number(JNumber::from_f64(result.descendant_count() as f64));
        let mut obj = Container::new_object();
        obj.insert_labeled("result", result);
        obj.insert_labeled("size", size);
        result = JVal::Object(obj);
    }
    result
}

/// `-l` attaches a match's own parent label; `-ll` instead gleans one entry
/// per label inside the matched value, when it's a non-empty object
/// (spec.md §6 "glean inner labels").
fn gleaned_entries(p: &PathVec, v: JVal, root: &JVal, args: &Args) -> Vec<(Option<String>, JVal)> {
    if args.labels >= 2 {
        if let Some(c) = v.as_container() {
            if !c.is_array_kind() && !c.is_empty() {
                return c.iter().map(|(k, child)| (Some(k.to_string()), child.clone())).collect();
            }
        }
    }
    let label = (args.labels > 0).then(|| match_label(p, root)).flatten();
    vec![(label, v)]
}

fn match_label(p: &PathVec, root: &JVal) -> Option<String> {
    let (parent, key) = p.parent_and_key()?;
    parent
        .resolve(root)
        .and_then(|v| v.as_container())
        .filter(|c| !c.is_array_kind())
        .map(|_| key.to_string())
}

/// Classify a `-c`/`-i`/`-u` argument as a literal, a file reference
/// (`@path`), or a walk path (spec.md §4.6, "given as file/json/walk").
fn classify_source(raw: &str) -> SourceSpec {
    if let Ok(v) = crate::json::parser::parse(raw, &ParserOptions::default()) {
        return SourceSpec::Static(v);
    }
    if let Some(path) = raw.strip_prefix('@') {
        if let Ok(text) = fs::read_to_string(path) {
            if let Ok(v) = crate::json::parser::parse(&text, &ParserOptions::default()) {
                return SourceSpec::Static(v);
            }
        }
    }
    SourceSpec::Walk(raw.to_string())
}

fn resolve_template(tmpl: &str, ns: &Namespace, current: Option<&JVal>) -> JVal {
    let text = interpolate(tmpl, ns, current);
    crate::json::parser::parse(&text, &ParserOptions::default()).unwrap_or(JVal::String(text))
}

/// When `spec` is a walk, re-walk it against the current document and
/// return its match paths (move semantics' purge target, spec.md §4.6); a
/// static or shell source has no location in the document to purge.
fn walk_source_matches(
    spec: &SourceSpec,
    doc: &Json,
    ns: &mut Namespace,
    cache: &mut SearchCache,
) -> crate::error::Result<Option<Vec<PathVec>>> {
    let SourceSpec::Walk(raw) = spec else { return Ok(None) };
    let mut w = Walk::new(compile(raw)?);
    let mut out = Vec::new();
    loop {
        match w.next(&doc.root, ns, cache, doc.version()) {
            WalkOutcome::Matched(p) => out.push(p),
            WalkOutcome::Done => break,
        }
    }
    Ok(Some(out))
}

fn apply_mutator(
    doc: &mut Json,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    matches: &[PathVec],
    args: &Args,
    m: &MutatorArg,
    rename_key: Option<String>,
) -> crate::error::Result<JVal> {
    let spec = if m.shell {
        SourceSpec::Shell(m.raw.clone())
    } else {
        classify_source(&m.raw)
    };
    let yields = source::materialize(&spec, &doc.root, ns, cache, doc.version())?;

    match m.kind {
        MutatorKind::Compare => {
            let mut diffs = Container::new_array();
            let mut any_mismatch = false;
            for (dst, src) in crate::ops::pair_with_source(matches, &yields) {
                let Some(base) = dst.resolve(&doc.root) else { continue };
                let d = compare::diff(base, &src.value);
                any_mismatch |= d.is_mismatch();
                let mut entry = Container::new_object();
                if let Some(v) = d.base_only {
                    entry.insert_labeled("base_only", v);
                }
                if let Some(v) = d.cmp_only {
                    entry.insert_labeled("cmp_only", v);
                }
                diffs.push_back(JVal::Object(entry));
            }
            if any_mismatch {
                return Err(OpsError::CompareMismatch.into());
            }
            Ok(JVal::Array(diffs))
        }
        MutatorKind::Insert | MutatorKind::Update => {
            // Move semantics (spec.md §4.6): capture the source's own match
            // paths before mutating, so `-p` can delete them afterward.
            let source_matches = if args.purge > 0 {
                walk_source_matches(&spec, doc, ns, cache)?
            } else {
                None
            };

            if let (MutatorKind::Update, Some(key_name)) = (m.kind, &rename_key) {
                let renames: Vec<update::LabelRename> = crate::ops::pair_with_source(matches, &yields)
                    .into_iter()
                    .filter_map(|(dst, src)| {
                        src.value
                            .as_str()
                            .map(|s| update::LabelRename { path: rename_target(dst, key_name), new_label: s.to_string() })
                    })
                    .collect();
                update::apply_renames(&mut doc.root, renames);
            } else {
                for (dst, src) in crate::ops::pair_with_source(matches, &yields) {
                    let mut templated = src.clone();
                    if let Some(tmpl) = args.template.first() {
                        let current = dst.resolve(&doc.root).cloned();
                        templated.value = resolve_template(tmpl, ns, current.as_ref());
                    }
                    if let Some(slot) = dst.resolve_mut(&mut doc.root) {
                        match m.kind {
                            MutatorKind::Insert => insert::insert(slot, &templated, args.merge),
                            MutatorKind::Update => update::update(slot, &templated, args.merge),
                            _ => unreachable!(),
                        }
                    }
                }
            }

            if let Some(source_matches) = source_matches {
                purge::purge(&mut doc.root, &source_matches);
            }

            Ok(doc.root.clone())
        }
        MutatorKind::Swap => {
            let mut w = Walk::new(compile(&m.raw)?);
            let mut b_matches = Vec::new();
            loop {
                match w.next(&doc.root, ns, cache, doc.version()) {
                    WalkOutcome::Matched(p) => b_matches.push(p),
                    WalkOutcome::Done => break,
                }
            }
            swap::swap_pairs(&mut doc.root, matches, &b_matches);
            Ok(doc.root.clone())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn classify_static_json_literal() {
        match classify_source("42") {
            SourceSpec::Static(v) => assert_eq!(v, JVal::Number(JNumber::from_f64(42.0))),
            _ => panic!("expected Static"),
        }
    }

    #[test]
    fn classify_non_json_as_walk() {
        match classify_source("<>x>r+0") {
            SourceSpec::Walk(w) => assert_eq!(w, "<>x>r+0"),
            _ => panic!("expected Walk"),
        }
    }

    #[test]
    fn read_documents_splits_concatenated_stream_only_with_all() {
        let opts = ParserOptions::default();
        let one = read_documents("{\"a\":1} {\"b\":2}", false, &opts);
        assert!(one.is_err(), "trailing content without -a is a parse error");

        let many = read_documents("{\"a\":1} {\"b\":2}", true, &opts).unwrap();
        assert_eq!(many.len(), 2);
    }

    #[test]
    fn walk_ending_in_store_key_is_detected() {
        assert_eq!(store_key_name(&compile("<age>k").unwrap()), Some("age"));
        assert_eq!(store_key_name(&compile("[age]").unwrap()), None);
        assert_eq!(store_key_name(&[]), None);
    }

    #[test]
    fn rename_target_pushes_non_empty_key_onto_destination() {
        let mut dst = PathVec::new();
        dst.push("a");
        let mut expected = dst.clone();
        expected.push("age");
        assert_eq!(rename_target(&dst, "age"), expected);
        assert_eq!(rename_target(&dst, ""), dst);
    }

    #[test]
    fn doubled_labels_glean_inner_entries() {
        let root = crate::json::parser::parse(r#"{"a":{"x":1,"y":2}}"#, &ParserOptions::default()).unwrap();
        let mut p = PathVec::new();
        p.push("a");
        let mut args = Args::default();
        args.labels = 2;
        let v = p.resolve(&root).unwrap().clone();
        let entries = gleaned_entries(&p, v, &root, &args);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0.as_deref(), Some("x"));
        assert_eq!(entries[1].0.as_deref(), Some("y"));
    }

    #[test]
    fn single_labels_does_not_glean() {
        let root = crate::json::parser::parse(r#"{"a":{"x":1,"y":2}}"#, &ParserOptions::default()).unwrap();
        let mut p = PathVec::new();
        p.push("a");
        let mut args = Args::default();
        args.labels = 1;
        let v = p.resolve(&root).unwrap().clone();
        let entries = gleaned_entries(&p, v, &root, &args);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0.as_deref(), Some("a"));
    }
}
