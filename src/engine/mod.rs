//! Pattern matching and replacement over the syntax tree.
//!
//! A patch is compiled into a tree of `Matcher`s (from its "before" side) and
//! `Replacer`s (from its "after" side). Matchers never mutate anything: they
//! receive a binding context and return an extended copy on success.
//! Replacers consume that context to generate output nodes and record which
//! source regions survived verbatim in the `Changelog`.

use std::fmt;

use crate::ast::{Pos, Region, Value};

pub mod changelog;
pub mod compile;
pub mod data;
pub mod driver;
pub mod error;
pub mod generic;
pub mod slice;
pub mod stmt_list;

pub use changelog::{Changelog, ChangelogError, LedgerMode};
pub use compile::{MatcherCompiler, ReplacerCompiler};
pub use data::{ContainerId, Data, Entry, FromEntry, Key};
pub use driver::{Applied, Patch, PatchCompiler, PatchSpec};
pub use error::{ApplyError, ReplaceError};
pub use stmt_list::{
    ContainerKind, OtherFields, StmtListData, StmtSliceContainerMatcher, StmtSliceContainerReplacer,
};

/// Matches a compiled pattern against a value of the target tree.
pub trait Matcher: fmt::Debug + Send + Sync {
    /// Attempts to match `value`, which spans `region` of the source.
    ///
    /// # Returns
    /// The context extended with the bindings made by this match, or `None`
    /// if the value does not match. The caller's context is never modified.
    fn match_value(&self, value: &Value, data: &Data, region: Region) -> Option<Data>;
}

/// Generates output values from a binding context produced by a `Matcher`.
pub trait Replacer: fmt::Debug + Send + Sync {
    /// Produces the replacement value; newly generated nodes are placed at `pos`.
    fn replace(&self, data: &Data, cl: &mut Changelog, pos: Pos) -> Result<Value, ReplaceError>;
}
