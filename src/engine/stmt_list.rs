//! Matching and replacement of statement-list containers.
//!
//! A container is a node whose payload is an ordered statement list embedded
//! in some fixed syntax: a braced block, a `case` clause of a switch or a
//! `case` clause of a select. The container matcher strips that syntax off,
//! remembers it in a `StmtListData` record and hands the bare statement list
//! to a list matcher. The replacer later restores the syntax verbatim around
//! whatever statements the list replacer generated, and records the prelude
//! (`{` or `case ...:`) as unchanged in the ledger.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::{Node, NodeKind, NodeVector, Pos, Region, Value};

use super::changelog::Changelog;
use super::data::{ContainerId, Data, Key};
use super::error::ReplaceError;
use super::{Matcher, Replacer};

/// The node shapes that carry a statement list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    Block,
    CaseClause,
    CommClause,
}

impl ContainerKind {
    pub fn of(node: &Node) -> Option<Self> {
        match node {
            Node::Block { .. } => Some(ContainerKind::Block),
            Node::CaseClause { .. } => Some(ContainerKind::CaseClause),
            Node::CommClause { .. } => Some(ContainerKind::CommClause),
            _ => None,
        }
    }

    pub fn node_kind(self) -> NodeKind {
        match self {
            ContainerKind::Block => NodeKind::Block,
            ContainerKind::CaseClause => NodeKind::CaseClause,
            ContainerKind::CommClause => NodeKind::CommClause,
        }
    }

    /// Index of the statement list among the node's fields.
    pub fn stmt_field(self) -> usize {
        match self {
            ContainerKind::Block => 1,
            ContainerKind::CaseClause | ContainerKind::CommClause => 3,
        }
    }

    pub fn field_count(self) -> usize {
        self.node_kind().field_count()
    }
}

/// Every field of a container except its statement list.
#[derive(Debug, Clone, PartialEq)]
pub enum OtherFields {
    Block { lbrace: Pos, rbrace: Pos },
    CaseClause { case_pos: Pos, list: NodeVector, colon: Pos },
    CommClause { case_pos: Pos, comm: Option<Arc<Node>>, colon: Pos },
}

impl OtherFields {
    /// Separates a container into its other fields and its statements.
    pub fn split(node: &Node) -> Option<(OtherFields, NodeVector)> {
        match node {
            Node::Block { lbrace, list, rbrace } => {
                Some((OtherFields::Block { lbrace: *lbrace, rbrace: *rbrace }, list.clone()))
            }
            Node::CaseClause { case_pos, list, colon, body } => Some((
                OtherFields::CaseClause { case_pos: *case_pos, list: list.clone(), colon: *colon },
                body.clone(),
            )),
            Node::CommClause { case_pos, comm, colon, body } => Some((
                OtherFields::CommClause { case_pos: *case_pos, comm: comm.clone(), colon: *colon },
                body.clone(),
            )),
            _ => None,
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            OtherFields::Block { .. } => ContainerKind::Block,
            OtherFields::CaseClause { .. } => ContainerKind::CaseClause,
            OtherFields::CommClause { .. } => ContainerKind::CommClause,
        }
    }

    /// Last offset of the syntax preceding the statements: the opening
    /// brace of a block, the colon of a clause.
    pub fn prelude_end(&self) -> Pos {
        match self {
            OtherFields::Block { lbrace, .. } => *lbrace,
            OtherFields::CaseClause { colon, .. } | OtherFields::CommClause { colon, .. } => *colon,
        }
    }

    /// The fields paired with their index in the full node.
    pub fn values(&self) -> Vec<(usize, Value)> {
        match self {
            OtherFields::Block { lbrace, rbrace } => vec![(0, Value::Pos(*lbrace)), (2, Value::Pos(*rbrace))],
            OtherFields::CaseClause { case_pos, list, colon } => vec![
                (0, Value::Pos(*case_pos)),
                (1, Value::Nodes(list.clone())),
                (2, Value::Pos(*colon)),
            ],
            OtherFields::CommClause { case_pos, comm, colon } => vec![
                (0, Value::Pos(*case_pos)),
                (1, Value::OptNode(comm.clone())),
                (2, Value::Pos(*colon)),
            ],
        }
    }

    /// Rebuilds the container around `stmts`.
    pub fn with_stmts(&self, stmts: NodeVector) -> Node {
        match self {
            OtherFields::Block { lbrace, rbrace } => Node::Block { lbrace: *lbrace, list: stmts, rbrace: *rbrace },
            OtherFields::CaseClause { case_pos, list, colon } => Node::CaseClause {
                case_pos: *case_pos,
                list: list.clone(),
                colon: *colon,
                body: stmts,
            },
            OtherFields::CommClause { case_pos, comm, colon } => Node::CommClause {
                case_pos: *case_pos,
                comm: comm.clone(),
                colon: *colon,
                body: stmts,
            },
        }
    }
}

/// Shape metadata passed from a container match to its replacement.
#[derive(Debug, Clone, PartialEq)]
pub struct StmtListData {
    pub kind: ContainerKind,
    pub other_fields: OtherFields,
    /// Source text of the container before its statements.
    pub unchanged_region: Region,
}

impl StmtListData {
    /// Index of the statement list among the container's fields.
    pub fn stmt_field(&self) -> usize {
        self.kind.stmt_field()
    }
}

/// Matches any statement-list container and delegates its statements.
#[derive(Debug)]
pub struct StmtSliceContainerMatcher {
    id: ContainerId,
    stmts: Box<dyn Matcher>,
}

impl StmtSliceContainerMatcher {
    pub fn new(id: ContainerId, stmts: Box<dyn Matcher>) -> Self {
        StmtSliceContainerMatcher { id, stmts }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }
}

impl Matcher for StmtSliceContainerMatcher {
    fn match_value(&self, value: &Value, data: &Data, region: Region) -> Option<Data> {
        let Value::Node(node) = value else {
            return None;
        };
        let (other_fields, stmts) = OtherFields::split(node)?;
        let kind = other_fields.kind();

        let boundary = match kind {
            ContainerKind::Block => region.pos,
            ContainerKind::CaseClause | ContainerKind::CommClause => other_fields.prelude_end(),
        };
        let scan_pos = boundary + 1;
        let unchanged_region = Region::new(region.pos.min(boundary), scan_pos);
        let scan = Region::new(scan_pos, region.end.max(scan_pos));

        trace!("{} container {} at {}: statements scanned from {}", kind.node_kind(), self.id, region, scan);

        let sd = StmtListData { kind, other_fields, unchanged_region };
        let result = self.stmts.match_value(&Value::Nodes(stmts), &data.with_value(Key::StmtList(self.id), sd), scan);
        if result.is_some() {
            debug!("{} container {} matched at {}", kind.node_kind(), self.id, region);
        }
        result
    }
}

/// Rebuilds a matched container around freshly generated statements.
#[derive(Debug)]
pub struct StmtSliceContainerReplacer {
    id: ContainerId,
    stmts: Box<dyn Replacer>,
}

impl StmtSliceContainerReplacer {
    pub fn new(id: ContainerId, stmts: Box<dyn Replacer>) -> Self {
        StmtSliceContainerReplacer { id, stmts }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    fn metadata<'d>(&self, data: &'d Data) -> Result<&'d StmtListData, ReplaceError> {
        data.lookup::<StmtListData>(&Key::StmtList(self.id))
            .ok_or(ReplaceError::NoStmtListMatch { container: self.id })
    }

    /// Generates the statements for a match of the same id, without
    /// rebuilding the container or recording its prelude.
    pub fn replace_stmts(&self, data: &Data, cl: &mut Changelog) -> Result<NodeVector, ReplaceError> {
        let sd = self.metadata(data)?;
        match self.stmts.replace(data, cl, sd.unchanged_region.end)? {
            Value::Nodes(stmts) => Ok(stmts),
            other => Err(ReplaceError::UnexpectedValue {
                context: "statement list replacer",
                expected: "node list",
                found: other.type_name(),
            }),
        }
    }

    /// Generates the replacement container for a match of the same id.
    pub fn replace_node(&self, data: &Data, cl: &mut Changelog) -> Result<Arc<Node>, ReplaceError> {
        let stmts = self.replace_stmts(data, cl)?;
        let sd = self.metadata(data)?;
        let region = sd.unchanged_region;
        let node = sd.other_fields.with_stmts(stmts);

        cl.unchanged(region.pos, region.end)?;
        debug!("rebuilt {} container {}, prelude {} kept", sd.kind.node_kind(), self.id, region);
        Ok(Arc::new(node))
    }
}

impl Replacer for StmtSliceContainerReplacer {
    fn replace(&self, data: &Data, cl: &mut Changelog, _pos: Pos) -> Result<Value, ReplaceError> {
        self.replace_node(data, cl).map(Value::Node)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::ast::node_vector;

    /// Delegate that accepts any statement list and records what it saw.
    #[derive(Debug, Default)]
    struct Recorder {
        seen: Mutex<Vec<(usize, Region, bool)>>,
    }

    impl Matcher for Recorder {
        fn match_value(&self, value: &Value, data: &Data, region: Region) -> Option<Data> {
            let Value::Nodes(list) = value else {
                return None;
            };
            let has_meta = data.contains(&Key::StmtList(ContainerId(0)));
            self.seen.lock().unwrap().push((list.len(), region, has_meta));
            Some(data.clone())
        }
    }

    impl Matcher for Arc<Recorder> {
        fn match_value(&self, value: &Value, data: &Data, region: Region) -> Option<Data> {
            (**self).match_value(value, data, region)
        }
    }

    #[derive(Debug)]
    struct Fixed(Value);

    impl Replacer for Fixed {
        fn replace(&self, _data: &Data, _cl: &mut Changelog, _pos: Pos) -> Result<Value, ReplaceError> {
            Ok(self.0.clone())
        }
    }

    fn call_stmt(name: &str, at: usize) -> Arc<Node> {
        Arc::new(Node::ExprStmt {
            x: Arc::new(Node::Call {
                fun: Arc::new(Node::Ident { name_pos: Pos(at), name: name.to_string() }),
                lparen: Pos(at + name.len()),
                args: NodeVector::new_with_ptr_kind(),
                rparen: Pos(at + name.len() + 1),
            }),
        })
    }

    fn block() -> Arc<Node> {
        Arc::new(Node::Block { lbrace: Pos(0), list: node_vector([call_stmt("a", 2)]), rbrace: Pos(7) })
    }

    fn matched(node: &Arc<Node>) -> (Data, Arc<Recorder>) {
        let rec = Arc::new(Recorder::default());
        let m = StmtSliceContainerMatcher::new(ContainerId(0), Box::new(rec.clone()));
        let d = m.match_value(&Value::Node(node.clone()), &Data::new(), node.region()).unwrap();
        (d, rec)
    }

    #[test]
    fn test_block_scans_after_lbrace() {
        let (d, rec) = matched(&block());
        assert_eq!(*rec.seen.lock().unwrap(), vec![(1, Region::new(Pos(1), Pos(8)), true)]);
        let sd = d.lookup::<StmtListData>(&Key::StmtList(ContainerId(0))).unwrap();
        assert_eq!(sd.kind, ContainerKind::Block);
        assert_eq!(sd.stmt_field(), 1);
        assert_eq!(sd.unchanged_region, Region::new(Pos(0), Pos(1)));
        assert_eq!(sd.other_fields.values().len(), NodeKind::Block.field_count() - 1);
    }

    #[test]
    fn test_non_container_leaves_context_alone() {
        let rec = Arc::new(Recorder::default());
        let m = StmtSliceContainerMatcher::new(ContainerId(0), Box::new(rec.clone()));
        let stmt = call_stmt("a", 0);
        assert!(m.match_value(&Value::Node(stmt.clone()), &Data::new(), stmt.region()).is_none());
        assert!(rec.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_bare_statement_list_is_rejected() {
        let rec = Arc::new(Recorder::default());
        let m = StmtSliceContainerMatcher::new(ContainerId(0), Box::new(rec.clone()));
        let list = Value::Nodes(node_vector([call_stmt("a", 0)]));
        assert!(m.match_value(&list, &Data::new(), Region::at(Pos(0))).is_none());
        assert!(rec.seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_comm_clause_captures_comm() {
        let recv = Arc::new(Node::ExprStmt {
            x: Arc::new(Node::Unary {
                op_pos: Pos(5),
                op: crate::ast::Token::Arrow,
                x: Arc::new(Node::Ident { name_pos: Pos(7), name: "ch".into() }),
            }),
        });
        let clause = Arc::new(Node::CommClause {
            case_pos: Pos(0),
            comm: Some(recv.clone()),
            colon: Pos(9),
            body: NodeVector::new_with_ptr_kind(),
        });
        let (d, rec) = matched(&clause);
        assert_eq!(rec.seen.lock().unwrap()[0].1.pos, Pos(10));
        let sd = d.lookup::<StmtListData>(&Key::StmtList(ContainerId(0))).unwrap();
        assert_eq!(sd.stmt_field(), 3);
        assert_eq!(sd.unchanged_region, Region::new(Pos(0), Pos(10)));
        assert_eq!(
            sd.other_fields,
            OtherFields::CommClause { case_pos: Pos(0), comm: Some(recv), colon: Pos(9) }
        );
    }

    #[test]
    fn test_replacer_requires_prior_match() {
        let r = StmtSliceContainerReplacer::new(ContainerId(3), Box::new(Fixed(Value::Nodes(NodeVector::new_with_ptr_kind()))));
        let mut cl = Changelog::new();
        let err = r.replace(&Data::new(), &mut cl, Pos(0)).unwrap_err();
        assert_eq!(err, ReplaceError::NoStmtListMatch { container: ContainerId(3) });
        assert_eq!(err.to_string(), "no statement matches found for container #3");
        assert!(cl.is_empty());
    }

    #[test]
    fn test_replacer_restores_other_fields() {
        let original = block();
        let (d, _) = matched(&original);
        let new_stmts = node_vector([call_stmt("b", 1)]);
        let r = StmtSliceContainerReplacer::new(ContainerId(0), Box::new(Fixed(Value::Nodes(new_stmts.clone()))));
        let mut cl = Changelog::new();
        let Value::Node(out) = r.replace(&d, &mut cl, Pos(0)).unwrap() else {
            panic!("expected a node");
        };
        assert_eq!(*out, Node::Block { lbrace: Pos(0), list: new_stmts, rbrace: Pos(7) });
        assert_eq!(cl.regions(), &[Region::new(Pos(0), Pos(1))]);
    }

    #[test]
    fn test_replace_stmts_leaves_ledger_alone() {
        let (d, _) = matched(&block());
        let new_stmts = node_vector([call_stmt("b", 1)]);
        let r = StmtSliceContainerReplacer::new(ContainerId(0), Box::new(Fixed(Value::Nodes(new_stmts.clone()))));
        let mut cl = Changelog::new();
        assert_eq!(r.replace_stmts(&d, &mut cl).unwrap(), new_stmts);
        assert!(cl.is_empty());
    }

    #[test]
    fn test_replacer_rejects_non_list_output() {
        let (d, _) = matched(&block());
        let r = StmtSliceContainerReplacer::new(ContainerId(0), Box::new(Fixed(Value::Pos(Pos(0)))));
        let mut cl = Changelog::new();
        let err = r.replace(&d, &mut cl, Pos(0)).unwrap_err();
        assert!(matches!(err, ReplaceError::UnexpectedValue { found: "position", .. }));
        assert!(cl.is_empty());
    }
}
