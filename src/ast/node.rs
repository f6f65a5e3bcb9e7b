use std::fmt;
use std::sync::Arc;

use archery::ArcK;
use rpds::Vector;

use super::position::{Pos, Region};

pub type NodeVector = Vector<Arc<Node>, ArcK>;

/// Builds a `NodeVector` from any iterator of nodes.
pub fn node_vector<I: IntoIterator<Item = Arc<Node>>>(nodes: I) -> NodeVector {
    nodes.into_iter().collect()
}

/// Syntax tree of the patched language.
///
/// Positions are stored explicitly for every token the printer needs to
/// reproduce (delimiters, keywords, operators); everything else is derived.
/// Statement lists and expression lists are persistent vectors so that nodes
/// can be rebuilt cheaply while sharing unchanged children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Identifier (e.g., `x`).
    Ident { name_pos: Pos, name: String },
    /// Literal kept as its source text (e.g., `42`, `"msg"`).
    BasicLit { value_pos: Pos, value: String },
    /// Wildcard `...`; only ever present in compiled patterns.
    Dots { dots: Pos },
    /// Call expression (e.g., `f(a, b)`).
    Call { fun: Arc<Node>, lparen: Pos, args: NodeVector, rparen: Pos },
    /// Selector expression (e.g., `x.f`).
    Selector { x: Arc<Node>, sel: Arc<Node> },
    /// Unary expression (e.g., `!x`, `<-ch`).
    Unary { op_pos: Pos, op: Token, x: Arc<Node> },
    /// Binary expression (e.g., `a + b`).
    Binary { x: Arc<Node>, op_pos: Pos, op: Token, y: Arc<Node> },
    /// Type assertion; `ty == None` is the `x.(type)` form of a type switch.
    TypeAssert { x: Arc<Node>, lparen: Pos, ty: Option<Arc<Node>>, rparen: Pos },
    /// Expression used as a statement.
    ExprStmt { x: Arc<Node> },
    /// Channel send (e.g., `ch <- v`).
    Send { chan: Arc<Node>, arrow: Pos, value: Arc<Node> },
    /// Assignment or short variable declaration.
    Assign { lhs: NodeVector, tok_pos: Pos, tok: Token, rhs: NodeVector },
    /// Return statement.
    Return { return_pos: Pos, results: NodeVector },
    /// Braced statement block.
    Block { lbrace: Pos, list: NodeVector, rbrace: Pos },
    /// If statement; `else_branch` is either a `Block` or another `If`.
    If { if_pos: Pos, init: Option<Arc<Node>>, cond: Arc<Node>, body: Arc<Node>, else_branch: Option<Arc<Node>> },
    /// Expression switch; `body` is a `Block` of `CaseClause`s.
    Switch { switch_pos: Pos, init: Option<Arc<Node>>, tag: Option<Arc<Node>>, body: Arc<Node> },
    /// Type switch; `body` is a `Block` of `CaseClause`s.
    TypeSwitch { switch_pos: Pos, init: Option<Arc<Node>>, assign: Arc<Node>, body: Arc<Node> },
    /// Select statement; `body` is a `Block` of `CommClause`s.
    Select { select_pos: Pos, body: Arc<Node> },
    /// Branch of a switch; an empty `list` is the `default` branch.
    CaseClause { case_pos: Pos, list: NodeVector, colon: Pos, body: NodeVector },
    /// Branch of a select; `comm == None` is the `default` branch.
    CommClause { case_pos: Pos, comm: Option<Arc<Node>>, colon: Pos, body: NodeVector },
}

/// Operator and assignment tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Add,
    Sub,
    Mul,
    Quo,
    Eql,
    Neq,
    Lss,
    Gtr,
    LAnd,
    LOr,
    Not,
    Arrow,
    Assign,
    Define,
}

impl Token {
    pub fn as_str(self) -> &'static str {
        match self {
            Token::Add => "+",
            Token::Sub => "-",
            Token::Mul => "*",
            Token::Quo => "/",
            Token::Eql => "==",
            Token::Neq => "!=",
            Token::Lss => "<",
            Token::Gtr => ">",
            Token::LAnd => "&&",
            Token::LOr => "||",
            Token::Not => "!",
            Token::Arrow => "<-",
            Token::Assign => "=",
            Token::Define => ":=",
        }
    }

    pub fn len(self) -> usize {
        self.as_str().len()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fieldless discriminator of `Node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Ident,
    BasicLit,
    Dots,
    Call,
    Selector,
    Unary,
    Binary,
    TypeAssert,
    ExprStmt,
    Send,
    Assign,
    Return,
    Block,
    If,
    Switch,
    TypeSwitch,
    Select,
    CaseClause,
    CommClause,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Ident { .. } => NodeKind::Ident,
            Node::BasicLit { .. } => NodeKind::BasicLit,
            Node::Dots { .. } => NodeKind::Dots,
            Node::Call { .. } => NodeKind::Call,
            Node::Selector { .. } => NodeKind::Selector,
            Node::Unary { .. } => NodeKind::Unary,
            Node::Binary { .. } => NodeKind::Binary,
            Node::TypeAssert { .. } => NodeKind::TypeAssert,
            Node::ExprStmt { .. } => NodeKind::ExprStmt,
            Node::Send { .. } => NodeKind::Send,
            Node::Assign { .. } => NodeKind::Assign,
            Node::Return { .. } => NodeKind::Return,
            Node::Block { .. } => NodeKind::Block,
            Node::If { .. } => NodeKind::If,
            Node::Switch { .. } => NodeKind::Switch,
            Node::TypeSwitch { .. } => NodeKind::TypeSwitch,
            Node::Select { .. } => NodeKind::Select,
            Node::CaseClause { .. } => NodeKind::CaseClause,
            Node::CommClause { .. } => NodeKind::CommClause,
        }
    }

    /// Offset of the first byte belonging to this node.
    pub fn pos(&self) -> Pos {
        match self {
            Node::Ident { name_pos, .. } => *name_pos,
            Node::BasicLit { value_pos, .. } => *value_pos,
            Node::Dots { dots } => *dots,
            Node::Call { fun, .. } => fun.pos(),
            Node::Selector { x, .. } => x.pos(),
            Node::Unary { op_pos, .. } => *op_pos,
            Node::Binary { x, .. } => x.pos(),
            Node::TypeAssert { x, .. } => x.pos(),
            Node::ExprStmt { x } => x.pos(),
            Node::Send { chan, .. } => chan.pos(),
            Node::Assign { lhs, tok_pos, .. } => lhs.first().map_or(*tok_pos, |n| n.pos()),
            Node::Return { return_pos, .. } => *return_pos,
            Node::Block { lbrace, .. } => *lbrace,
            Node::If { if_pos, .. } => *if_pos,
            Node::Switch { switch_pos, .. } => *switch_pos,
            Node::TypeSwitch { switch_pos, .. } => *switch_pos,
            Node::Select { select_pos, .. } => *select_pos,
            Node::CaseClause { case_pos, .. } => *case_pos,
            Node::CommClause { case_pos, .. } => *case_pos,
        }
    }

    /// Offset one past the last byte belonging to this node.
    pub fn end(&self) -> Pos {
        match self {
            Node::Ident { name_pos, name } => *name_pos + name.len(),
            Node::BasicLit { value_pos, value } => *value_pos + value.len(),
            Node::Dots { dots } => *dots + 3,
            Node::Call { rparen, .. } => *rparen + 1,
            Node::Selector { sel, .. } => sel.end(),
            Node::Unary { x, .. } => x.end(),
            Node::Binary { y, .. } => y.end(),
            Node::TypeAssert { rparen, .. } => *rparen + 1,
            Node::ExprStmt { x } => x.end(),
            Node::Send { value, .. } => value.end(),
            Node::Assign { rhs, tok_pos, tok, .. } => rhs.last().map_or(*tok_pos + tok.len(), |n| n.end()),
            Node::Return { return_pos, results } => results.last().map_or(*return_pos + "return".len(), |n| n.end()),
            Node::Block { rbrace, .. } => *rbrace + 1,
            Node::If { body, else_branch, .. } => else_branch.as_ref().unwrap_or(body).end(),
            Node::Switch { body, .. } => body.end(),
            Node::TypeSwitch { body, .. } => body.end(),
            Node::Select { body, .. } => body.end(),
            Node::CaseClause { colon, body, .. } => body.last().map_or(*colon + 1, |n| n.end()),
            Node::CommClause { colon, body, .. } => body.last().map_or(*colon + 1, |n| n.end()),
        }
    }

    pub fn region(&self) -> Region {
        Region::new(self.pos(), self.end())
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&Arc<Node>> {
        let mut out = Vec::new();
        match self {
            Node::Ident { .. } | Node::BasicLit { .. } | Node::Dots { .. } => {}
            Node::Call { fun, args, .. } => {
                out.push(fun);
                out.extend(args.iter());
            }
            Node::Selector { x, sel } => out.extend([x, sel]),
            Node::Unary { x, .. } => out.push(x),
            Node::Binary { x, y, .. } => out.extend([x, y]),
            Node::TypeAssert { x, ty, .. } => {
                out.push(x);
                out.extend(ty.iter());
            }
            Node::ExprStmt { x } => out.push(x),
            Node::Send { chan, value, .. } => out.extend([chan, value]),
            Node::Assign { lhs, rhs, .. } => {
                out.extend(lhs.iter());
                out.extend(rhs.iter());
            }
            Node::Return { results, .. } => out.extend(results.iter()),
            Node::Block { list, .. } => out.extend(list.iter()),
            Node::If { init, cond, body, else_branch, .. } => {
                out.extend(init.iter());
                out.push(cond);
                out.push(body);
                out.extend(else_branch.iter());
            }
            Node::Switch { init, tag, body, .. } => {
                out.extend(init.iter());
                out.extend(tag.iter());
                out.push(body);
            }
            Node::TypeSwitch { init, assign, body, .. } => {
                out.extend(init.iter());
                out.push(assign);
                out.push(body);
            }
            Node::Select { body, .. } => out.push(body),
            Node::CaseClause { list, body, .. } => {
                out.extend(list.iter());
                out.extend(body.iter());
            }
            Node::CommClause { comm, body, .. } => {
                out.extend(comm.iter());
                out.extend(body.iter());
            }
        }
        out
    }

    /// Visits this node and all of its descendants in pre-order.
    pub fn for_each<'a>(self: &'a Arc<Self>, f: &mut dyn FnMut(&'a Arc<Node>)) {
        f(self);
        for child in self.children() {
            child.for_each(f);
        }
    }

    /// Synthetic `...` statement used as a wildcard marker in compiled patterns.
    pub fn dots_stmt(pos: Pos) -> Arc<Node> {
        Arc::new(Node::ExprStmt {
            x: Arc::new(Node::Dots { dots: pos }),
        })
    }

    /// Returns the marker position when this node is a `...` wildcard,
    /// either bare or wrapped in an expression statement.
    pub fn as_dots(&self) -> Option<Pos> {
        match self {
            Node::Dots { dots } => Some(*dots),
            Node::ExprStmt { x } => match &**x {
                Node::Dots { dots } => Some(*dots),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn ident_name(&self) -> Option<&str> {
        match self {
            Node::Ident { name, .. } => Some(name),
            _ => None,
        }
    }
}
