//! Structural matching and replacement core of a semantic patching engine.
//!
//! A patch is a before/after pair of statement lists. Compiling it yields a
//! container matcher that finds the "before" statements inside any braced
//! block, `case` clause of a switch or `case` clause of a select, and a
//! container replacer that rebuilds the matched container around the
//! "after" statements while recording which source regions survived verbatim.

pub mod ast;
pub mod config;
pub mod engine;
pub mod logging;

pub use config::EngineConfig;
pub use engine::{Applied, Patch, PatchCompiler, PatchSpec};
