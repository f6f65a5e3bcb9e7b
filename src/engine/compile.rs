//! Compilation of pattern trees into matchers and replacers.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::ast::{Node, Pos, Region, Value};

use super::data::ContainerId;
use super::generic::{
    AnyPos, ConstReplacer, ExactMatcher, MetavarMatcher, MetavarReplacer, NodeMatcher, NodeReplacer,
    OptNodeMatcher, OptNodeReplacer, PosReplacer,
};
use super::slice::{SliceElem, SliceMatcher, SliceReplacer};
use super::stmt_list::{StmtSliceContainerMatcher, StmtSliceContainerReplacer};
use super::{Matcher, Replacer};

/// Positions of the wildcard markers wrapped around a top-level statement
/// list. A `...` written in the pattern occupies three bytes inside the patch
/// span, so it always starts before `span.end`.
pub(crate) fn context_markers(span: Region) -> (Pos, Pos) {
    let leading = span.end.max(span.pos);
    (leading, leading + 1)
}

/// The statements of a top-level pattern with the context wildcards added.
fn with_context(stmts: &[Arc<Node>], span: Region) -> Vec<Arc<Node>> {
    let (leading, trailing) = context_markers(span);
    let mut out = Vec::with_capacity(stmts.len() + 2);
    out.push(Node::dots_stmt(leading));
    out.extend(stmts.iter().cloned());
    out.push(Node::dots_stmt(trailing));
    out
}

/// Compiles the "before" side of a patch.
#[derive(Debug, Clone)]
pub struct MatcherCompiler {
    metavars: FxHashSet<String>,
    span: Region,
}

impl MatcherCompiler {
    pub fn new(metavars: FxHashSet<String>, span: Region) -> Self {
        MatcherCompiler { metavars, span }
    }

    pub fn compile_node(&self, node: &Arc<Node>) -> Box<dyn Matcher> {
        if let Some(name) = node.ident_name().filter(|n| self.metavars.contains(*n)) {
            return Box::new(MetavarMatcher::new(name));
        }
        let fields = node.fields().iter().map(|f| self.compile_value(f)).collect();
        Box::new(NodeMatcher::new(node.kind(), fields))
    }

    pub fn compile_value(&self, value: &Value) -> Box<dyn Matcher> {
        match value {
            Value::Pos(_) => Box::new(AnyPos),
            Value::Name(_) | Value::Token(_) => Box::new(ExactMatcher(value.clone())),
            Value::Node(node) => self.compile_node(node),
            Value::OptNode(opt) => Box::new(OptNodeMatcher(opt.as_ref().map(|n| self.compile_node(n)))),
            Value::Nodes(list) => {
                let items: Vec<Arc<Node>> = list.iter().cloned().collect();
                Box::new(self.compile_slice(&items))
            }
        }
    }

    pub fn compile_slice(&self, items: &[Arc<Node>]) -> SliceMatcher {
        let elems = items
            .iter()
            .map(|item| match item.as_dots() {
                Some(pos) => SliceElem::Dots(pos),
                None => SliceElem::Item(self.compile_node(item)),
            })
            .collect();
        SliceMatcher::new(elems)
    }

    /// Compiles a top-level statement list into a container matcher that
    /// finds it inside any block or clause.
    pub fn compile_stmt_list(&self, id: ContainerId, stmts: &[Arc<Node>]) -> StmtSliceContainerMatcher {
        let slice = self.compile_slice(&with_context(stmts, self.span));
        StmtSliceContainerMatcher::new(id, Box::new(slice))
    }
}

/// Compiles the "after" side of a patch.
#[derive(Debug, Clone)]
pub struct ReplacerCompiler {
    metavars: FxHashSet<String>,
    span: Region,
}

impl ReplacerCompiler {
    pub fn new(metavars: FxHashSet<String>, span: Region) -> Self {
        ReplacerCompiler { metavars, span }
    }

    pub fn compile_node(&self, node: &Arc<Node>) -> Box<dyn Replacer> {
        if let Some(name) = node.ident_name().filter(|n| self.metavars.contains(*n)) {
            return Box::new(MetavarReplacer::new(name));
        }
        let fields = node.fields().iter().map(|f| self.compile_value(f)).collect();
        Box::new(NodeReplacer::new(node.kind(), fields))
    }

    pub fn compile_value(&self, value: &Value) -> Box<dyn Replacer> {
        match value {
            Value::Pos(_) => Box::new(PosReplacer),
            Value::Name(_) | Value::Token(_) => Box::new(ConstReplacer(value.clone())),
            Value::Node(node) => self.compile_node(node),
            Value::OptNode(opt) => Box::new(OptNodeReplacer(opt.as_ref().map(|n| self.compile_node(n)))),
            Value::Nodes(list) => {
                let items: Vec<Arc<Node>> = list.iter().cloned().collect();
                Box::new(self.compile_slice(&items))
            }
        }
    }

    pub fn compile_slice(&self, items: &[Arc<Node>]) -> SliceReplacer {
        let elems = items
            .iter()
            .map(|item| match item.as_dots() {
                Some(pos) => SliceElem::Dots(pos),
                None => SliceElem::Item(self.compile_node(item)),
            })
            .collect();
        SliceReplacer::new(elems)
    }

    pub fn compile_stmt_list(&self, id: ContainerId, stmts: &[Arc<Node>]) -> StmtSliceContainerReplacer {
        let slice = self.compile_slice(&with_context(stmts, self.span));
        StmtSliceContainerReplacer::new(id, Box::new(slice))
    }
}
