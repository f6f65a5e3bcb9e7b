//! Compiling patches and applying them to whole syntax trees.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, info, trace};

use crate::ast::{walk_node, Node, NodeVector, Pos, Region, Value, Visitor};
use crate::config::EngineConfig;

use super::changelog::Changelog;
use super::compile::{context_markers, MatcherCompiler, ReplacerCompiler};
use super::data::{ContainerId, Data, Key};
use super::error::ApplyError;
use super::stmt_list::{OtherFields, StmtSliceContainerMatcher, StmtSliceContainerReplacer};
use super::Matcher;

/// One before/after pair of a semantic patch, already parsed.
#[derive(Debug, Clone)]
pub struct PatchSpec {
    pub name: String,
    /// Identifiers that stand for arbitrary expressions.
    pub metavars: Vec<String>,
    /// Statements to find ("before" side).
    pub minus: Vec<Arc<Node>>,
    /// Statements to generate in their place ("after" side).
    pub plus: Vec<Arc<Node>>,
    /// Source region of the patch text; positions of `...` markers lie in it.
    pub span: Region,
}

/// Hands out container ids so that patches compiled together never share one.
#[derive(Debug, Default)]
pub struct PatchCompiler {
    next_id: usize,
}

impl PatchCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(&mut self, spec: &PatchSpec) -> Patch {
        let id = ContainerId(self.next_id);
        self.next_id += 1;

        let metavars: FxHashSet<String> = spec.metavars.iter().cloned().collect();
        let matcher = MatcherCompiler::new(metavars.clone(), spec.span).compile_stmt_list(id, &spec.minus);
        let replacer = ReplacerCompiler::new(metavars, spec.span).compile_stmt_list(id, &spec.plus);
        let (_, trailing) = context_markers(spec.span);
        debug!(
            "compiled patch `{}` as container {} ({} -> {} statements)",
            spec.name,
            id,
            spec.minus.len(),
            spec.plus.len()
        );

        Patch { name: spec.name.clone(), id, matcher, replacer, trailing }
    }
}

/// A compiled patch.
#[derive(Debug)]
pub struct Patch {
    name: String,
    id: ContainerId,
    matcher: StmtSliceContainerMatcher,
    replacer: StmtSliceContainerReplacer,
    /// Wildcard marker that captures the statements after a match.
    trailing: Pos,
}

/// Result of applying a patch to a tree.
#[derive(Debug)]
pub struct Applied {
    pub root: Arc<Node>,
    pub changelog: Changelog,
    pub matches: usize,
}

impl Patch {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn matcher(&self) -> &StmtSliceContainerMatcher {
        &self.matcher
    }

    pub fn replacer(&self) -> &StmtSliceContainerReplacer {
        &self.replacer
    }

    /// Rewrites every container of `root` that matches this patch.
    ///
    /// The tree is walked top-down. Within one container every occurrence is
    /// rewritten: after a match the patch is tried again on the statements
    /// that followed it. The walk then continues only into statements carried
    /// over from the original container, so generated code is never matched
    /// again. A replace failure aborts the whole application.
    pub fn apply(&self, root: &Arc<Node>, config: &EngineConfig) -> Result<Applied, ApplyError> {
        let mut visitor = PatchVisitor {
            patch: self,
            changelog: Changelog::with_mode(config.ledger_mode),
            matches: 0,
            depth: 0,
            max_depth: config.max_depth,
        };
        let new_root = visitor.visit_node(root)?;
        info!(
            "patch `{}`: {} matches, {} unchanged regions",
            self.name,
            visitor.matches,
            visitor.changelog.len()
        );
        Ok(Applied { root: new_root, changelog: visitor.changelog, matches: visitor.matches })
    }
}

struct PatchVisitor<'a> {
    patch: &'a Patch,
    changelog: Changelog,
    matches: usize,
    depth: usize,
    max_depth: usize,
}

impl PatchVisitor<'_> {
    fn rewrite(&mut self, node: &Arc<Node>) -> Result<Arc<Node>, ApplyError> {
        let Some(data) = self.patch.matcher.match_value(&Value::Node(node.clone()), &Data::new(), node.region())
        else {
            return walk_node(self, node);
        };

        let replaced = self
            .patch
            .replacer
            .replace_node(&data, &mut self.changelog)
            .map_err(|source| ApplyError::Replace { patch: self.patch.name.clone(), source })?;
        self.matches += 1;

        let replaced = self.rewrite_rest(node, data, replaced)?;
        self.visit_carried(node, replaced)
    }

    /// Matches the patch again on the statements following the last match,
    /// until the rest of the list no longer matches. Only the carried tail is
    /// ever rematched, and it shrinks on every round.
    fn rewrite_rest(
        &mut self,
        original: &Arc<Node>,
        mut data: Data,
        replaced: Arc<Node>,
    ) -> Result<Arc<Node>, ApplyError> {
        let (Some((_, old_stmts)), Some((other_fields, mut stmts))) =
            (OtherFields::split(original), OtherFields::split(&replaced))
        else {
            return Ok(replaced);
        };

        let mut matched_len = old_stmts.len();
        let mut rounds = 0;
        loop {
            let Some(rest) = data.lookup::<NodeVector>(&Key::Dots(self.patch.trailing)).cloned() else {
                break;
            };
            if rest.is_empty() || rest.len() >= matched_len || rest.len() > stmts.len() {
                break;
            }
            let keep = stmts.len() - rest.len();
            if !stmts.iter().skip(keep).zip(rest.iter()).all(|(a, b)| Arc::ptr_eq(a, b)) {
                break;
            }

            let candidate = Arc::new(other_fields.with_stmts(rest.clone()));
            let Some(next) =
                self.patch.matcher.match_value(&Value::Node(candidate), &Data::new(), original.region())
            else {
                break;
            };
            let generated = self
                .patch
                .replacer
                .replace_stmts(&next, &mut self.changelog)
                .map_err(|source| ApplyError::Replace { patch: self.patch.name.clone(), source })?;

            stmts = stmts
                .iter()
                .take(keep)
                .chain(generated.iter())
                .fold(NodeVector::new_with_ptr_kind(), |v, s| v.push_back(s.clone()));
            matched_len = rest.len();
            data = next;
            rounds += 1;
            self.matches += 1;
        }

        if rounds == 0 {
            return Ok(replaced);
        }
        trace!("patch `{}`: {} further matches in container at {}", self.patch.name, rounds, original.region());
        Ok(Arc::new(other_fields.with_stmts(stmts)))
    }

    /// Visits the statements of `replaced` that were carried over from
    /// `original`, leaving generated statements alone.
    fn visit_carried(&mut self, original: &Arc<Node>, replaced: Arc<Node>) -> Result<Arc<Node>, ApplyError> {
        let (Some((_, old_stmts)), Some((other_fields, new_stmts))) =
            (OtherFields::split(original), OtherFields::split(&replaced))
        else {
            return Ok(replaced);
        };

        let mut done: Vec<(Arc<Node>, Arc<Node>)> = Vec::new();
        let mut out = NodeVector::new_with_ptr_kind();
        let mut changed = false;
        for stmt in new_stmts.iter() {
            let visited = if let Some((_, v)) = done.iter().find(|(old, _)| Arc::ptr_eq(old, stmt)) {
                v.clone()
            } else if old_stmts.iter().any(|old| Arc::ptr_eq(old, stmt)) {
                let v = self.visit_node(stmt)?;
                done.push((stmt.clone(), v.clone()));
                v
            } else {
                stmt.clone()
            };
            changed |= !Arc::ptr_eq(stmt, &visited);
            out = out.push_back(visited);
        }

        if changed {
            Ok(Arc::new(other_fields.with_stmts(out)))
        } else {
            Ok(replaced)
        }
    }
}

impl Visitor for PatchVisitor<'_> {
    type Error = ApplyError;

    fn visit_node(&mut self, node: &Arc<Node>) -> Result<Arc<Node>, ApplyError> {
        if self.depth >= self.max_depth {
            return Err(ApplyError::DepthExceeded { max_depth: self.max_depth });
        }
        self.depth += 1;
        let result = self.rewrite(node);
        self.depth -= 1;
        result
    }
}
