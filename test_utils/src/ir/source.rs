//! Builds source text and its syntax tree side by side.
//!
//! Every builder method appends text to the buffer and returns the node for
//! it, with positions pointing at the bytes just written. Each statement goes
//! on its own line; blocks and clause bodies indent their contents by four
//! spaces.

use std::sync::Arc;

use structpatch::ast::{node_vector, Node, NodeVector, Pos, Token};

const INDENT: &str = "    ";

#[derive(Debug, Default)]
pub struct SourceWriter {
    text: String,
    indent: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pos(&self) -> Pos {
        Pos(self.text.len())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn finish(self) -> String {
        self.text
    }

    /// Appends raw text and returns where it starts, indenting first when
    /// the text opens a new line.
    pub fn write(&mut self, s: &str) -> Pos {
        if self.text.ends_with('\n') {
            for _ in 0..self.indent {
                self.text.push_str(INDENT);
            }
        }
        let at = self.pos();
        self.text.push_str(s);
        at
    }

    fn end_stmt(&mut self, stmt: Arc<Node>) -> Arc<Node> {
        self.text.push('\n');
        stmt
    }

    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += 1;
        let out = f(self);
        self.indent -= 1;
        out
    }

    pub fn ident(&mut self, name: &str) -> Arc<Node> {
        let name_pos = self.write(name);
        Arc::new(Node::Ident { name_pos, name: name.to_string() })
    }

    pub fn lit(&mut self, value: &str) -> Arc<Node> {
        let value_pos = self.write(value);
        Arc::new(Node::BasicLit { value_pos, value: value.to_string() })
    }

    /// `fun(args...)` as an expression.
    pub fn call(&mut self, fun: &str, args: &[&str]) -> Arc<Node> {
        let fun = self.ident(fun);
        let lparen = self.write("(");
        let mut list = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                self.write(", ");
            }
            list.push(self.ident(arg));
        }
        let rparen = self.write(")");
        Arc::new(Node::Call { fun, lparen, args: node_vector(list), rparen })
    }

    pub fn call_stmt(&mut self, fun: &str, args: &[&str]) -> Arc<Node> {
        let x = self.call(fun, args);
        self.end_stmt(Arc::new(Node::ExprStmt { x }))
    }

    /// `lhs = rhs` or `lhs := rhs`
    pub fn assign(&mut self, lhs: &str, tok: Token, rhs: &str) -> Arc<Node> {
        let lhs = self.ident(lhs);
        self.write(" ");
        let tok_pos = self.write(tok.as_str());
        self.write(" ");
        let rhs = self.ident(rhs);
        self.end_stmt(Arc::new(Node::Assign { lhs: node_vector([lhs]), tok_pos, tok, rhs: node_vector([rhs]) }))
    }

    pub fn ret(&mut self, value: Option<&str>) -> Arc<Node> {
        let return_pos = self.write("return");
        let results = match value {
            Some(v) => {
                self.write(" ");
                node_vector([self.ident(v)])
            }
            None => NodeVector::new_with_ptr_kind(),
        };
        self.end_stmt(Arc::new(Node::Return { return_pos, results }))
    }

    /// A braced block, without a line break after the closing brace.
    pub fn block(&mut self, stmts: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let lbrace = self.write("{\n");
        let list = node_vector(self.indented(stmts));
        let rbrace = self.write("}");
        Arc::new(Node::Block { lbrace, list, rbrace })
    }

    /// A braced block used as a statement.
    pub fn block_stmt(&mut self, stmts: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let block = self.block(stmts);
        self.end_stmt(block)
    }

    pub fn if_stmt(&mut self, cond: &str, body: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let if_pos = self.write("if ");
        let cond = self.ident(cond);
        self.write(" ");
        let body = self.block(body);
        self.end_stmt(Arc::new(Node::If { if_pos, init: None, cond, body, else_branch: None }))
    }

    /// `case exprs...:` or, for no expressions, `default:`, followed by the
    /// indented body.
    pub fn case_clause(&mut self, exprs: &[&str], body: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let mut list = Vec::with_capacity(exprs.len());
        let case_pos = if exprs.is_empty() {
            self.write("default")
        } else {
            let at = self.write("case ");
            for (i, e) in exprs.iter().enumerate() {
                if i > 0 {
                    self.write(", ");
                }
                list.push(self.ident(e));
            }
            at
        };
        let colon = self.write(":\n");
        let body = node_vector(self.indented(body));
        Arc::new(Node::CaseClause { case_pos, list: node_vector(list), colon, body })
    }

    /// `case <-chan:` or, for no channel, `default:`, followed by the
    /// indented body.
    pub fn comm_clause(&mut self, chan: Option<&str>, body: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let (case_pos, comm) = match chan {
            Some(chan) => {
                let at = self.write("case ");
                let op_pos = self.write(Token::Arrow.as_str());
                let x = self.ident(chan);
                let recv = Arc::new(Node::ExprStmt { x: Arc::new(Node::Unary { op_pos, op: Token::Arrow, x }) });
                (at, Some(recv))
            }
            None => (self.write("default"), None),
        };
        let colon = self.write(":\n");
        let body = node_vector(self.indented(body));
        Arc::new(Node::CommClause { case_pos, comm, colon, body })
    }

    pub fn switch(&mut self, tag: Option<&str>, clauses: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let switch_pos = self.write("switch ");
        let tag = tag.map(|t| {
            let tag = self.ident(t);
            self.write(" ");
            tag
        });
        let body = self.block(clauses);
        self.end_stmt(Arc::new(Node::Switch { switch_pos, init: None, tag, body }))
    }

    pub fn select(&mut self, clauses: impl FnOnce(&mut Self) -> Vec<Arc<Node>>) -> Arc<Node> {
        let select_pos = self.write("select ");
        let body = self.block(clauses);
        self.end_stmt(Arc::new(Node::Select { select_pos, body }))
    }

    /// Wildcard statement `...` for writing patterns.
    pub fn dots(&mut self) -> Arc<Node> {
        let dots = self.write("...");
        self.end_stmt(Node::dots_stmt(dots))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slice(text: &str, node: &Node) -> String {
        node.region().slice(text).unwrap().to_string()
    }

    #[test]
    fn test_block_positions_follow_text() {
        let mut w = SourceWriter::new();
        let block = w.block(|w| vec![w.call_stmt("f", &["x"]), w.ret(Some("y"))]);
        let text = w.finish();
        assert_eq!(text, "{\n    f(x)\n    return y\n}");
        assert_eq!(slice(&text, &block), text);
        let Node::Block { list, .. } = &*block else { panic!("expected a block") };
        assert_eq!(slice(&text, list.get(0).unwrap()), "f(x)");
        assert_eq!(slice(&text, list.get(1).unwrap()), "return y");
    }

    #[test]
    fn test_switch_clause_positions() {
        let mut w = SourceWriter::new();
        let sw = w.switch(Some("v"), |w| {
            vec![w.case_clause(&["x", "y"], |w| vec![w.call_stmt("a", &[])]), w.case_clause(&[], |_| vec![])]
        });
        let text = w.finish();
        assert_eq!(text, "switch v {\n    case x, y:\n        a()\n    default:\n}\n");
        let Node::Switch { body, .. } = &*sw else { panic!("expected a switch") };
        let Node::Block { list, .. } = &**body else { panic!("expected a block") };
        assert_eq!(slice(&text, list.get(0).unwrap()), "case x, y:\n        a()");
        assert_eq!(slice(&text, list.get(1).unwrap()), "default:");
    }

    #[test]
    fn test_comm_clause_positions() {
        let mut w = SourceWriter::new();
        let clause = w.comm_clause(Some("ch"), |w| vec![w.assign("x", Token::Define, "y")]);
        let text = w.finish();
        assert_eq!(slice(&text, &clause), "case <-ch:\n    x := y");
    }
}
