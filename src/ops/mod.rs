//! The operation engine: binds destination walks to a source and applies
//! compare/insert/update/swap/purge semantics (spec.md §4.6).

pub mod compare;
pub mod insert;
pub mod purge;
pub mod source;
pub mod swap;
pub mod update;

use crate::json::JVal;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum OpsError {
    #[error("destination walk at byte offset produced no valid match")]
    InvalidDestination,
    #[error("shell command exited with status {0}")]
    ShellFailed(i32),
    #[error("missing '\\;' terminator for -e shell expression")]
    MissingShellTerminator,
    #[error("failed to spawn shell: {0}")]
    ShellSpawn(String),
    #[error("comparison mismatch")]
    CompareMismatch,
}

impl OpsError {
    /// Exit code offset for this subsystem (spec.md §7 band 30-39).
    pub fn exit_code(&self) -> i32 {
        let slot = match self {
            OpsError::InvalidDestination => 0,
            OpsError::ShellFailed(_) => 1,
            OpsError::MissingShellTerminator => 2,
            OpsError::ShellSpawn(_) => 3,
            OpsError::CompareMismatch => 4,
        };
        30 + slot
    }
}

/// A single value produced by a source, carrying the label it was bound
/// under in its originating container when known (a walk match remembers
/// its key; a literal/shell/static source has none). The label governs the
/// "labeled atom" vs. "bare atom" rows of the insert/update tables
/// (spec.md §4.6).
#[derive(Debug, Clone)]
pub struct SourceYield {
    pub value: JVal,
    pub label: Option<String>,
}

impl SourceYield {
    pub fn bare(value: JVal) -> Self {
        Self { value, label: None }
    }

    pub fn labeled(value: JVal, label: impl Into<String>) -> Self {
        Self { value, label: Some(label.into()) }
    }
}

/// Pair up destination matches with source yields round-robin, except when
/// there is exactly one destination: then every source yield binds to it
/// (spec.md §4.6, "applied to the same destination").
///
/// Distinguishing "a destination walk that can only ever match once" from
/// "a destination walk that happened to match once this run" needs extra
/// compile-time metadata this engine doesn't track; we approximate it with
/// the runtime match count, which is exact in the common case and only
/// differs for an iterable destination that degenerates to a single match
/// (see DESIGN.md).
pub fn pair_with_source<'a, T>(destinations: &'a [T], sources: &'a [SourceYield]) -> Vec<(&'a T, &'a SourceYield)> {
    if sources.is_empty() {
        return Vec::new();
    }
    if destinations.len() == 1 {
        sources.iter().map(|s| (&destinations[0], s)).collect()
    } else {
        destinations
            .iter()
            .enumerate()
            .map(|(i, d)| (d, &sources[i % sources.len()]))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_destination_absorbs_every_source() {
        let dst = vec!["only"];
        let src = vec![SourceYield::bare(JVal::Null), SourceYield::bare(JVal::Bool(true))];
        let pairs = pair_with_source(&dst, &src);
        assert_eq!(pairs.len(), 2);
        assert_eq!(*pairs[0].0, "only");
        assert_eq!(*pairs[1].0, "only");
    }

    #[test]
    fn multiple_destinations_round_robin() {
        let dst = vec!["a", "b", "c"];
        let src = vec![SourceYield::bare(JVal::Null), SourceYield::bare(JVal::Bool(true))];
        let pairs = pair_with_source(&dst, &src);
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs[2].1.value, JVal::Null);
    }
}
