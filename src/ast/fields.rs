//! Uniform view over the structural slots of a `Node`.
//!
//! Every node kind has a fixed, ordered list of fields. `Node::fields` exposes
//! them as `Value`s and `Node::from_fields` rebuilds a node from such a list,
//! which lets the generic matcher and replacer handle every node kind with a
//! single code path.

use std::sync::Arc;

use thiserror::Error;

use super::node::{Node, NodeKind, NodeVector, Token};
use super::position::{Pos, Region};

/// Value of one structural field, or a value flowing through the matchers.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Pos(Pos),
    Name(String),
    Token(Token),
    Node(Arc<Node>),
    OptNode(Option<Arc<Node>>),
    Nodes(NodeVector),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Pos(_) => "position",
            Value::Name(_) => "name",
            Value::Token(_) => "token",
            Value::Node(_) => "node",
            Value::OptNode(_) => "optional node",
            Value::Nodes(_) => "node list",
        }
    }

    /// Source region spanned by this value; `fallback` is used for values
    /// that do not cover any text of their own.
    pub fn region(&self, fallback: Region) -> Region {
        match self {
            Value::Node(n) | Value::OptNode(Some(n)) => n.region(),
            Value::Nodes(list) => match (list.first(), list.last()) {
                (Some(first), Some(last)) => Region::new(first.pos(), last.end()),
                _ => Region::at(fallback.pos),
            },
            _ => Region::at(fallback.pos),
        }
    }

    /// Structural equality that ignores positions.
    pub fn same_shape(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Pos(_), Value::Pos(_)) => true,
            (Value::Name(a), Value::Name(b)) => a == b,
            (Value::Token(a), Value::Token(b)) => a == b,
            (Value::Node(a), Value::Node(b)) => a.same_shape(b),
            (Value::OptNode(a), Value::OptNode(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => a.same_shape(b),
                _ => false,
            },
            (Value::Nodes(a), Value::Nodes(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(a, b)| a.same_shape(b))
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("{kind} has {expected} fields, got {found}")]
    FieldCount {
        kind: NodeKind,
        expected: usize,
        found: usize,
    },
    #[error("field `{field}` of {kind} must be a {expected}, got a {found}")]
    FieldType {
        kind: NodeKind,
        field: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}

impl NodeKind {
    /// Names of the structural fields of this kind, in field order.
    pub fn field_names(self) -> &'static [&'static str] {
        match self {
            NodeKind::Ident => &["name_pos", "name"],
            NodeKind::BasicLit => &["value_pos", "value"],
            NodeKind::Dots => &["dots"],
            NodeKind::Call => &["fun", "lparen", "args", "rparen"],
            NodeKind::Selector => &["x", "sel"],
            NodeKind::Unary => &["op_pos", "op", "x"],
            NodeKind::Binary => &["x", "op_pos", "op", "y"],
            NodeKind::TypeAssert => &["x", "lparen", "ty", "rparen"],
            NodeKind::ExprStmt => &["x"],
            NodeKind::Send => &["chan", "arrow", "value"],
            NodeKind::Assign => &["lhs", "tok_pos", "tok", "rhs"],
            NodeKind::Return => &["return_pos", "results"],
            NodeKind::Block => &["lbrace", "list", "rbrace"],
            NodeKind::If => &["if_pos", "init", "cond", "body", "else_branch"],
            NodeKind::Switch => &["switch_pos", "init", "tag", "body"],
            NodeKind::TypeSwitch => &["switch_pos", "init", "assign", "body"],
            NodeKind::Select => &["select_pos", "body"],
            NodeKind::CaseClause => &["case_pos", "list", "colon", "body"],
            NodeKind::CommClause => &["case_pos", "comm", "colon", "body"],
        }
    }

    pub fn field_count(self) -> usize {
        self.field_names().len()
    }

    /// Index of the named field, if this kind has it.
    pub fn field_index(self, name: &str) -> Option<usize> {
        self.field_names().iter().position(|f| *f == name)
    }
}

impl Node {
    /// Structural fields of this node in the order given by `NodeKind::field_names`.
    pub fn fields(&self) -> Vec<Value> {
        use Value as V;
        match self {
            Node::Ident { name_pos, name } => vec![V::Pos(*name_pos), V::Name(name.clone())],
            Node::BasicLit { value_pos, value } => vec![V::Pos(*value_pos), V::Name(value.clone())],
            Node::Dots { dots } => vec![V::Pos(*dots)],
            Node::Call { fun, lparen, args, rparen } => {
                vec![V::Node(fun.clone()), V::Pos(*lparen), V::Nodes(args.clone()), V::Pos(*rparen)]
            }
            Node::Selector { x, sel } => vec![V::Node(x.clone()), V::Node(sel.clone())],
            Node::Unary { op_pos, op, x } => vec![V::Pos(*op_pos), V::Token(*op), V::Node(x.clone())],
            Node::Binary { x, op_pos, op, y } => {
                vec![V::Node(x.clone()), V::Pos(*op_pos), V::Token(*op), V::Node(y.clone())]
            }
            Node::TypeAssert { x, lparen, ty, rparen } => {
                vec![V::Node(x.clone()), V::Pos(*lparen), V::OptNode(ty.clone()), V::Pos(*rparen)]
            }
            Node::ExprStmt { x } => vec![V::Node(x.clone())],
            Node::Send { chan, arrow, value } => {
                vec![V::Node(chan.clone()), V::Pos(*arrow), V::Node(value.clone())]
            }
            Node::Assign { lhs, tok_pos, tok, rhs } => {
                vec![V::Nodes(lhs.clone()), V::Pos(*tok_pos), V::Token(*tok), V::Nodes(rhs.clone())]
            }
            Node::Return { return_pos, results } => vec![V::Pos(*return_pos), V::Nodes(results.clone())],
            Node::Block { lbrace, list, rbrace } => {
                vec![V::Pos(*lbrace), V::Nodes(list.clone()), V::Pos(*rbrace)]
            }
            Node::If { if_pos, init, cond, body, else_branch } => vec![
                V::Pos(*if_pos),
                V::OptNode(init.clone()),
                V::Node(cond.clone()),
                V::Node(body.clone()),
                V::OptNode(else_branch.clone()),
            ],
            Node::Switch { switch_pos, init, tag, body } => vec![
                V::Pos(*switch_pos),
                V::OptNode(init.clone()),
                V::OptNode(tag.clone()),
                V::Node(body.clone()),
            ],
            Node::TypeSwitch { switch_pos, init, assign, body } => vec![
                V::Pos(*switch_pos),
                V::OptNode(init.clone()),
                V::Node(assign.clone()),
                V::Node(body.clone()),
            ],
            Node::Select { select_pos, body } => vec![V::Pos(*select_pos), V::Node(body.clone())],
            Node::CaseClause { case_pos, list, colon, body } => {
                vec![V::Pos(*case_pos), V::Nodes(list.clone()), V::Pos(*colon), V::Nodes(body.clone())]
            }
            Node::CommClause { case_pos, comm, colon, body } => {
                vec![V::Pos(*case_pos), V::OptNode(comm.clone()), V::Pos(*colon), V::Nodes(body.clone())]
            }
        }
    }

    /// Rebuilds a node of `kind` from its fields.
    pub fn from_fields(kind: NodeKind, values: Vec<Value>) -> Result<Node, ShapeError> {
        let expected = kind.field_count();
        if values.len() != expected {
            return Err(ShapeError::FieldCount { kind, expected, found: values.len() });
        }
        let mut r = FieldReader { kind, index: 0, values: values.into_iter() };
        let node = match kind {
            NodeKind::Ident => Node::Ident { name_pos: r.pos()?, name: r.name()? },
            NodeKind::BasicLit => Node::BasicLit { value_pos: r.pos()?, value: r.name()? },
            NodeKind::Dots => Node::Dots { dots: r.pos()? },
            NodeKind::Call => Node::Call { fun: r.node()?, lparen: r.pos()?, args: r.nodes()?, rparen: r.pos()? },
            NodeKind::Selector => Node::Selector { x: r.node()?, sel: r.node()? },
            NodeKind::Unary => Node::Unary { op_pos: r.pos()?, op: r.token()?, x: r.node()? },
            NodeKind::Binary => Node::Binary { x: r.node()?, op_pos: r.pos()?, op: r.token()?, y: r.node()? },
            NodeKind::TypeAssert => {
                Node::TypeAssert { x: r.node()?, lparen: r.pos()?, ty: r.opt_node()?, rparen: r.pos()? }
            }
            NodeKind::ExprStmt => Node::ExprStmt { x: r.node()? },
            NodeKind::Send => Node::Send { chan: r.node()?, arrow: r.pos()?, value: r.node()? },
            NodeKind::Assign => Node::Assign { lhs: r.nodes()?, tok_pos: r.pos()?, tok: r.token()?, rhs: r.nodes()? },
            NodeKind::Return => Node::Return { return_pos: r.pos()?, results: r.nodes()? },
            NodeKind::Block => Node::Block { lbrace: r.pos()?, list: r.nodes()?, rbrace: r.pos()? },
            NodeKind::If => Node::If {
                if_pos: r.pos()?,
                init: r.opt_node()?,
                cond: r.node()?,
                body: r.node()?,
                else_branch: r.opt_node()?,
            },
            NodeKind::Switch => {
                Node::Switch { switch_pos: r.pos()?, init: r.opt_node()?, tag: r.opt_node()?, body: r.node()? }
            }
            NodeKind::TypeSwitch => {
                Node::TypeSwitch { switch_pos: r.pos()?, init: r.opt_node()?, assign: r.node()?, body: r.node()? }
            }
            NodeKind::Select => Node::Select { select_pos: r.pos()?, body: r.node()? },
            NodeKind::CaseClause => {
                Node::CaseClause { case_pos: r.pos()?, list: r.nodes()?, colon: r.pos()?, body: r.nodes()? }
            }
            NodeKind::CommClause => {
                Node::CommClause { case_pos: r.pos()?, comm: r.opt_node()?, colon: r.pos()?, body: r.nodes()? }
            }
        };
        Ok(node)
    }

    /// Structural equality that ignores positions.
    pub fn same_shape(&self, other: &Node) -> bool {
        self.kind() == other.kind()
            && self
                .fields()
                .iter()
                .zip(other.fields().iter())
                .all(|(a, b)| a.same_shape(b))
    }
}

/// Consumes field values in order, checking each against the expected type.
struct FieldReader {
    kind: NodeKind,
    index: usize,
    values: std::vec::IntoIter<Value>,
}

impl FieldReader {
    fn next(&mut self) -> Result<(&'static str, Value), ShapeError> {
        let field = self.kind.field_names()[self.index];
        self.index += 1;
        self.values.next().map(|v| (field, v)).ok_or(ShapeError::FieldCount {
            kind: self.kind,
            expected: self.kind.field_count(),
            found: self.index - 1,
        })
    }

    fn mismatch(&self, field: &'static str, expected: &'static str, found: &Value) -> ShapeError {
        ShapeError::FieldType {
            kind: self.kind,
            field,
            expected,
            found: found.type_name(),
        }
    }

    fn pos(&mut self) -> Result<Pos, ShapeError> {
        match self.next()? {
            (_, Value::Pos(p)) => Ok(p),
            (field, other) => Err(self.mismatch(field, "position", &other)),
        }
    }

    fn name(&mut self) -> Result<String, ShapeError> {
        match self.next()? {
            (_, Value::Name(s)) => Ok(s),
            (field, other) => Err(self.mismatch(field, "name", &other)),
        }
    }

    fn token(&mut self) -> Result<Token, ShapeError> {
        match self.next()? {
            (_, Value::Token(t)) => Ok(t),
            (field, other) => Err(self.mismatch(field, "token", &other)),
        }
    }

    fn node(&mut self) -> Result<Arc<Node>, ShapeError> {
        match self.next()? {
            (_, Value::Node(n)) => Ok(n),
            (field, other) => Err(self.mismatch(field, "node", &other)),
        }
    }

    fn opt_node(&mut self) -> Result<Option<Arc<Node>>, ShapeError> {
        match self.next()? {
            (_, Value::OptNode(n)) => Ok(n),
            (_, Value::Node(n)) => Ok(Some(n)),
            (field, other) => Err(self.mismatch(field, "optional node", &other)),
        }
    }

    fn nodes(&mut self) -> Result<NodeVector, ShapeError> {
        match self.next()? {
            (_, Value::Nodes(list)) => Ok(list),
            (field, other) => Err(self.mismatch(field, "node list", &other)),
        }
    }
}
