use thiserror::Error;

use crate::ast::{Pos, ShapeError};

use super::changelog::ChangelogError;
use super::data::ContainerId;

/// Failure while generating output from a successful match.
///
/// A replace failure aborts the patch application it belongs to: a partially
/// generated tree with unresolved content must never reach the splicer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplaceError {
    /// The container replacer ran without a prior match of the same pattern.
    #[error("no statement matches found for container {container}")]
    NoStmtListMatch { container: ContainerId },
    #[error("metavariable `{name}` has no bound value")]
    UnboundVariable { name: String },
    #[error("no statements were captured for `...` at {pos}")]
    UnboundDots { pos: Pos },
    #[error("{context} produced a {found}, expected a {expected}")]
    UnexpectedValue {
        context: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Changelog(#[from] ChangelogError),
}

/// Failure while applying a compiled patch to a whole tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplyError {
    #[error("patch `{patch}`: {source}")]
    Replace {
        patch: String,
        #[source]
        source: ReplaceError,
    },
    #[error("syntax tree is deeper than the configured limit of {max_depth}")]
    DepthExceeded { max_depth: usize },
    #[error(transparent)]
    Shape(#[from] ShapeError),
}
