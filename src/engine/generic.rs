//! Field-by-field matchers and replacers for arbitrary nodes.

use std::sync::Arc;

use tracing::trace;

use crate::ast::{Node, NodeKind, Pos, Region, Value};

use super::changelog::Changelog;
use super::data::{Data, Key};
use super::error::ReplaceError;
use super::{Matcher, Replacer};

/// Matches any position; positions never take part in structural matching.
#[derive(Debug)]
pub struct AnyPos;

impl Matcher for AnyPos {
    fn match_value(&self, value: &Value, data: &Data, _region: Region) -> Option<Data> {
        matches!(value, Value::Pos(_)).then(|| data.clone())
    }
}

/// Matches a name or token equal to the one in the pattern.
#[derive(Debug)]
pub struct ExactMatcher(pub Value);

impl Matcher for ExactMatcher {
    fn match_value(&self, value: &Value, data: &Data, _region: Region) -> Option<Data> {
        (*value == self.0).then(|| data.clone())
    }
}

#[derive(Debug)]
pub struct OptNodeMatcher(pub Option<Box<dyn Matcher>>);

impl Matcher for OptNodeMatcher {
    fn match_value(&self, value: &Value, data: &Data, _region: Region) -> Option<Data> {
        match (&self.0, value) {
            (None, Value::OptNode(None)) => Some(data.clone()),
            (Some(m), Value::OptNode(Some(node)) | Value::Node(node)) => {
                m.match_value(&Value::Node(node.clone()), data, node.region())
            }
            _ => None,
        }
    }
}

/// Matches a node of one kind, field by field.
#[derive(Debug)]
pub struct NodeMatcher {
    kind: NodeKind,
    fields: Vec<Box<dyn Matcher>>,
}

impl NodeMatcher {
    pub fn new(kind: NodeKind, fields: Vec<Box<dyn Matcher>>) -> Self {
        NodeMatcher { kind, fields }
    }
}

impl Matcher for NodeMatcher {
    fn match_value(&self, value: &Value, data: &Data, region: Region) -> Option<Data> {
        let Value::Node(node) = value else {
            return None;
        };
        if node.kind() != self.kind {
            return None;
        }
        let mut data = data.clone();
        for (field, matcher) in node.fields().iter().zip(&self.fields) {
            data = matcher.match_value(field, &data, field.region(region))?;
        }
        Some(data)
    }
}

/// Binds a metavariable on first use and requires later uses to agree.
#[derive(Debug)]
pub struct MetavarMatcher {
    name: String,
}

impl MetavarMatcher {
    pub fn new(name: impl Into<String>) -> Self {
        MetavarMatcher { name: name.into() }
    }
}

impl Matcher for MetavarMatcher {
    fn match_value(&self, value: &Value, data: &Data, _region: Region) -> Option<Data> {
        let Value::Node(node) = value else {
            return None;
        };
        let key = Key::Var(self.name.clone());
        match data.lookup::<Arc<Node>>(&key) {
            Some(bound) if bound.same_shape(node) => Some(data.clone()),
            Some(_) => {
                trace!("metavariable `{}` already bound to a different value", self.name);
                None
            }
            None => Some(data.with_value(key, node.clone())),
        }
    }
}

/// Places generated tokens at the anchor position.
#[derive(Debug)]
pub struct PosReplacer;

impl Replacer for PosReplacer {
    fn replace(&self, _data: &Data, _cl: &mut Changelog, pos: Pos) -> Result<Value, ReplaceError> {
        Ok(Value::Pos(pos))
    }
}

/// Reproduces a name or token from the pattern.
#[derive(Debug)]
pub struct ConstReplacer(pub Value);

impl Replacer for ConstReplacer {
    fn replace(&self, _data: &Data, _cl: &mut Changelog, _pos: Pos) -> Result<Value, ReplaceError> {
        Ok(self.0.clone())
    }
}

#[derive(Debug)]
pub struct OptNodeReplacer(pub Option<Box<dyn Replacer>>);

impl Replacer for OptNodeReplacer {
    fn replace(&self, data: &Data, cl: &mut Changelog, pos: Pos) -> Result<Value, ReplaceError> {
        let Some(inner) = &self.0 else {
            return Ok(Value::OptNode(None));
        };
        match inner.replace(data, cl, pos)? {
            Value::Node(node) => Ok(Value::OptNode(Some(node))),
            other => Err(ReplaceError::UnexpectedValue {
                context: "optional field",
                expected: "node",
                found: other.type_name(),
            }),
        }
    }
}

/// Generates a node of one kind from per-field replacers.
#[derive(Debug)]
pub struct NodeReplacer {
    kind: NodeKind,
    fields: Vec<Box<dyn Replacer>>,
}

impl NodeReplacer {
    pub fn new(kind: NodeKind, fields: Vec<Box<dyn Replacer>>) -> Self {
        NodeReplacer { kind, fields }
    }
}

impl Replacer for NodeReplacer {
    fn replace(&self, data: &Data, cl: &mut Changelog, pos: Pos) -> Result<Value, ReplaceError> {
        let values = self
            .fields
            .iter()
            .map(|f| f.replace(data, cl, pos))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Node(Arc::new(Node::from_fields(self.kind, values)?)))
    }
}

/// Reproduces the node a metavariable was bound to.
#[derive(Debug)]
pub struct MetavarReplacer {
    name: String,
}

impl MetavarReplacer {
    pub fn new(name: impl Into<String>) -> Self {
        MetavarReplacer { name: name.into() }
    }
}

impl Replacer for MetavarReplacer {
    fn replace(&self, data: &Data, _cl: &mut Changelog, _pos: Pos) -> Result<Value, ReplaceError> {
        data.lookup::<Arc<Node>>(&Key::Var(self.name.clone()))
            .map(|node| Value::Node(node.clone()))
            .ok_or_else(|| ReplaceError::UnboundVariable { name: self.name.clone() })
    }
}
