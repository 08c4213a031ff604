//! Top-level error aggregation (spec.md §4.8 / §7).
//!
//! Each subsystem defines its own error type and an `exit_code` it
//! contributes to a disjoint band (see `SPEC_FULL.md` §7); this enum just
//! wraps whichever one fired so `main` has a single type to match on.

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Json(#[from] crate::json::ParseError),

    #[error(transparent)]
    Walk(#[from] crate::walk::WalkError),

    #[error(transparent)]
    Ops(#[from] crate::ops::OpsError),

    #[error(transparent)]
    Cli(#[from] crate::cli::CliError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Json(e) => e.exit_code(),
            Error::Walk(e) => e.exit_code(),
            Error::Ops(e) => e.exit_code(),
            Error::Cli(e) => e.exit_code(),
            Error::Io(_) => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
