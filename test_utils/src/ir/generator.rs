//! Random programs for property-based testing.
//!
//! `GenProgram` is a block of randomly nested statements covering every
//! container shape: plain blocks, `if` bodies, switch `case` clauses and
//! select `case` clauses. Identifiers are drawn from a small pool so that
//! patterns written against the pool match often.
//!
//! Generation functions take a depth parameter to bound nesting.

use std::sync::Arc;

use quickcheck::{Arbitrary, Gen};
use structpatch::ast::{Node, Token};

use super::source::SourceWriter;

/// Maximum nesting depth of generated containers.
const MAX_DEPTH: usize = 4;

/// Identifiers used for functions, variables and channels.
pub const NAMES: &[&str] = &["a", "b", "c", "f", "g", "x", "y", "ch"];

#[derive(Clone, Debug)]
pub enum GenStmt {
    Call { fun: String, args: Vec<String> },
    Assign { lhs: String, define: bool, rhs: String },
    Return(Option<String>),
    Block(Vec<GenStmt>),
    If { cond: String, body: Vec<GenStmt> },
    Switch { tag: Option<String>, cases: Vec<GenCase> },
    Select(Vec<GenComm>),
}

/// Switch clause; no expressions means `default`.
#[derive(Clone, Debug)]
pub struct GenCase {
    pub exprs: Vec<String>,
    pub body: Vec<GenStmt>,
}

/// Select clause; no channel means `default`.
#[derive(Clone, Debug)]
pub struct GenComm {
    pub chan: Option<String>,
    pub body: Vec<GenStmt>,
}

/// A whole program: the statements of one outer block.
#[derive(Clone, Debug)]
pub struct GenProgram(pub Vec<GenStmt>);

/// Generates a random number in the range [min, max] inclusive.
fn gen_range(g: &mut Gen, min: u32, max: u32) -> u32 {
    min + (u32::arbitrary(g) % (max - min + 1))
}

fn gen_name(g: &mut Gen) -> String {
    g.choose(NAMES).unwrap().to_string()
}

fn gen_stmts(g: &mut Gen, depth: usize) -> Vec<GenStmt> {
    (0..gen_range(g, 0, 4)).map(|_| gen_stmt(g, depth)).collect()
}

fn gen_stmt(g: &mut Gen, depth: usize) -> GenStmt {
    const LEAVES: &[&str] = &["call", "assign", "return"];
    const ALL: &[&str] = &["call", "call", "assign", "return", "block", "if", "switch", "select"];
    let choices = if depth == 0 { LEAVES } else { ALL };
    match *g.choose(choices).unwrap() {
        "call" => GenStmt::Call {
            fun: gen_name(g),
            args: (0..gen_range(g, 0, 2)).map(|_| gen_name(g)).collect(),
        },
        "assign" => GenStmt::Assign { lhs: gen_name(g), define: bool::arbitrary(g), rhs: gen_name(g) },
        "return" => GenStmt::Return(bool::arbitrary(g).then(|| gen_name(g))),
        "block" => GenStmt::Block(gen_stmts(g, depth - 1)),
        "if" => GenStmt::If { cond: gen_name(g), body: gen_stmts(g, depth - 1) },
        "switch" => GenStmt::Switch {
            tag: bool::arbitrary(g).then(|| gen_name(g)),
            cases: (0..gen_range(g, 0, 3))
                .map(|_| GenCase {
                    exprs: (0..gen_range(g, 0, 2)).map(|_| gen_name(g)).collect(),
                    body: gen_stmts(g, depth - 1),
                })
                .collect(),
        },
        _ => GenStmt::Select(
            (0..gen_range(g, 0, 3))
                .map(|_| GenComm {
                    chan: bool::arbitrary(g).then(|| gen_name(g)),
                    body: gen_stmts(g, depth - 1),
                })
                .collect(),
        ),
    }
}

impl Arbitrary for GenStmt {
    fn arbitrary(g: &mut Gen) -> Self {
        gen_stmt(g, g.size().min(MAX_DEPTH))
    }
}

impl Arbitrary for GenProgram {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = g.size().min(MAX_DEPTH);
        GenProgram(gen_stmts(g, depth))
    }

    fn shrink(&self) -> Box<dyn Iterator<Item = Self>> {
        let stmts = self.0.clone();
        Box::new((0..stmts.len()).map(move |i| {
            let mut fewer = stmts.clone();
            fewer.remove(i);
            GenProgram(fewer)
        }))
    }
}

fn write_stmts(w: &mut SourceWriter, stmts: &[GenStmt]) -> Vec<Arc<Node>> {
    stmts.iter().map(|s| s.write(w)).collect()
}

impl GenStmt {
    /// Writes this statement and returns its node.
    pub fn write(&self, w: &mut SourceWriter) -> Arc<Node> {
        match self {
            GenStmt::Call { fun, args } => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                w.call_stmt(fun, &args)
            }
            GenStmt::Assign { lhs, define, rhs } => {
                w.assign(lhs, if *define { Token::Define } else { Token::Assign }, rhs)
            }
            GenStmt::Return(value) => w.ret(value.as_deref()),
            GenStmt::Block(body) => w.block_stmt(|w| write_stmts(w, body)),
            GenStmt::If { cond, body } => w.if_stmt(cond, |w| write_stmts(w, body)),
            GenStmt::Switch { tag, cases } => w.switch(tag.as_deref(), |w| {
                cases
                    .iter()
                    .map(|c| {
                        let exprs: Vec<&str> = c.exprs.iter().map(String::as_str).collect();
                        w.case_clause(&exprs, |w| write_stmts(w, &c.body))
                    })
                    .collect()
            }),
            GenStmt::Select(comms) => w.select(|w| {
                comms
                    .iter()
                    .map(|c| w.comm_clause(c.chan.as_deref(), |w| write_stmts(w, &c.body)))
                    .collect()
            }),
        }
    }

    pub fn to_code(&self) -> String {
        let mut w = SourceWriter::new();
        self.write(&mut w);
        w.finish()
    }
}

impl GenProgram {
    /// Source text of the program together with its root block.
    pub fn build(&self) -> (String, Arc<Node>) {
        let mut w = SourceWriter::new();
        let root = w.block(|w| write_stmts(w, &self.0));
        (w.finish(), root)
    }

    pub fn to_code(&self) -> String {
        self.build().0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tree_spans_whole_text() {
        let mut g = Gen::new(8);
        for _ in 0..50 {
            let (text, root) = GenProgram::arbitrary(&mut g).build();
            assert_eq!(root.region().slice(&text), Some(text.as_str()));
        }
    }

    #[test]
    fn test_leaf_statements_at_depth_zero() {
        let mut g = Gen::new(8);
        for _ in 0..50 {
            let stmt = gen_stmt(&mut g, 0);
            assert!(matches!(stmt, GenStmt::Call { .. } | GenStmt::Assign { .. } | GenStmt::Return(_)));
        }
    }
}
