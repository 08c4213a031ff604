//! Resolves a `-c`/`-i`/`-u` source argument into the yields `pair_with_source`
//! binds against destinations (spec.md §4.6).

use super::{OpsError, SourceYield};
use crate::json::parser::{parse, ParserOptions};
use crate::json::JVal;
use crate::namespace::Namespace;
use crate::template::interpolate_shell;
use crate::walk::{compile, SearchCache, Walk, WalkOutcome};
use std::process::Command;

/// The four source shapes a mutator argument can take (spec.md §4.6).
pub enum SourceSpec {
    /// A literal JSON value given directly on the command line.
    Static(JVal),
    /// A walk-path string, evaluated against the current root.
    Walk(String),
    /// `-e`: a shell expression, interpolated then run through `sh -c`.
    Shell(String),
}

/// Produce the source's yield sequence.
pub fn materialize(
    spec: &SourceSpec,
    root: &JVal,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    version: u64,
) -> Result<Vec<SourceYield>, OpsError> {
    match spec {
        SourceSpec::Static(v) => Ok(vec![SourceYield::bare(v.clone())]),
        SourceSpec::Walk(path) => materialize_walk(path, root, ns, cache, version),
        SourceSpec::Shell(expr) => materialize_shell(expr, ns),
    }
}

fn materialize_walk(
    path: &str,
    root: &JVal,
    ns: &mut Namespace,
    cache: &mut SearchCache,
    version: u64,
) -> Result<Vec<SourceYield>, OpsError> {
    let steps = compile(path).map_err(|_| OpsError::InvalidDestination)?;
    let mut walk = Walk::new(steps);
    let mut out = Vec::new();
    loop {
        match walk.next(root, ns, cache, version) {
            WalkOutcome::Matched(p) => {
                if let Some(v) = p.resolve(root) {
                    let label = p.parent_and_key().and_then(|(parent_path, key)| {
                        parent_path
                            .resolve(root)
                            .and_then(|v| v.as_container())
                            .filter(|c| !c.is_array_kind())
                            .map(|_| key.to_string())
                    });
                    out.push(SourceYield { value: v.clone(), label });
                }
            }
            WalkOutcome::Done => break,
        }
    }
    Ok(out)
}

/// Run the `-e` shell expression, parsing stdout as JSON or, failing that,
/// promoting it to a JSON string once its control characters are escaped.
fn materialize_shell(expr: &str, ns: &Namespace) -> Result<Vec<SourceYield>, OpsError> {
    let interpolated = interpolate_shell(expr, ns, None);
    let output = Command::new("sh")
        .arg("-c")
        .arg(&interpolated)
        .output()
        .map_err(|e| OpsError::ShellSpawn(e.to_string()))?;
    if !output.status.success() {
        return Err(OpsError::ShellFailed(output.status.code().unwrap_or(-1)));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let trimmed = stdout.trim_end_matches('\n');
    let value = parse(trimmed, &ParserOptions::default()).unwrap_or_else(|_| JVal::String(trimmed.to_string()));
    Ok(vec![SourceYield::bare(value)])
}
