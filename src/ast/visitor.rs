use std::sync::Arc;

use super::fields::{ShapeError, Value};
use super::node::{Node, NodeVector};

/// Rewriting traversal over the syntax tree.
///
/// Implementors override `visit_node` to intercept nodes and call `walk_node`
/// to recurse into the children. Nodes are rebuilt only when at least one
/// child changed; otherwise the original `Arc` is returned, so pointer
/// identity tells callers which subtrees were left untouched.
pub trait Visitor {
    type Error: From<ShapeError>;

    /// Entry point for visiting a node.
    ///
    /// # Returns
    /// The transformed node, or the original if unchanged.
    fn visit_node(&mut self, node: &Arc<Node>) -> Result<Arc<Node>, Self::Error> {
        walk_node(self, node)
    }

    /// Visits every element of a node list.
    fn visit_list(&mut self, list: &NodeVector) -> Result<NodeVector, Self::Error> {
        walk_list(self, list)
    }
}

/// Visits the children of `node`, rebuilding it if any of them changed.
pub fn walk_node<V: Visitor + ?Sized>(visitor: &mut V, node: &Arc<Node>) -> Result<Arc<Node>, V::Error> {
    let fields = node.fields();
    let mut changed = false;
    let mut new_fields = Vec::with_capacity(fields.len());
    for field in fields {
        let new_field = match &field {
            Value::Node(child) => {
                let new_child = visitor.visit_node(child)?;
                changed |= !Arc::ptr_eq(child, &new_child);
                Value::Node(new_child)
            }
            Value::OptNode(Some(child)) => {
                let new_child = visitor.visit_node(child)?;
                changed |= !Arc::ptr_eq(child, &new_child);
                Value::OptNode(Some(new_child))
            }
            Value::Nodes(list) => {
                let new_list = visitor.visit_list(list)?;
                changed |= !same_elements(list, &new_list);
                Value::Nodes(new_list)
            }
            _ => field.clone(),
        };
        new_fields.push(new_field);
    }
    if !changed {
        return Ok(Arc::clone(node));
    }
    Ok(Arc::new(Node::from_fields(node.kind(), new_fields)?))
}

pub fn walk_list<V: Visitor + ?Sized>(visitor: &mut V, list: &NodeVector) -> Result<NodeVector, V::Error> {
    let mut out = NodeVector::new_with_ptr_kind();
    for item in list.iter() {
        out = out.push_back(visitor.visit_node(item)?);
    }
    Ok(out)
}

/// Whether both lists hold the very same nodes, compared by pointer.
pub fn same_elements(a: &NodeVector, b: &NodeVector) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| Arc::ptr_eq(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node::node_vector;
    use crate::ast::position::Pos;

    /// Renames every identifier `from` to `to`.
    struct Rename {
        from: &'static str,
        to: &'static str,
    }

    impl Visitor for Rename {
        type Error = ShapeError;

        fn visit_node(&mut self, node: &Arc<Node>) -> Result<Arc<Node>, ShapeError> {
            if let Node::Ident { name_pos, name } = &**node {
                if name == self.from {
                    return Ok(Arc::new(Node::Ident { name_pos: *name_pos, name: self.to.to_string() }));
                }
            }
            walk_node(self, node)
        }
    }

    fn stmt(name: &str, at: usize) -> Arc<Node> {
        Arc::new(Node::ExprStmt {
            x: Arc::new(Node::Ident { name_pos: Pos(at), name: name.to_string() }),
        })
    }

    #[test]
    fn test_unchanged_tree_keeps_identity() {
        let block = Arc::new(Node::Block { lbrace: Pos(0), list: node_vector([stmt("a", 2), stmt("b", 4)]), rbrace: Pos(6) });
        let mut v = Rename { from: "zzz", to: "y" };
        let out = v.visit_node(&block).unwrap();
        assert!(Arc::ptr_eq(&block, &out));
    }

    #[test]
    fn test_changed_child_rebuilds_parent_only() {
        let a = stmt("a", 2);
        let b = stmt("b", 4);
        let block = Arc::new(Node::Block { lbrace: Pos(0), list: node_vector([a.clone(), b.clone()]), rbrace: Pos(6) });
        let mut v = Rename { from: "b", to: "c" };
        let out = v.visit_node(&block).unwrap();
        assert!(!Arc::ptr_eq(&block, &out));
        let Node::Block { list, lbrace, rbrace } = &*out else { panic!("expected block") };
        assert_eq!((*lbrace, *rbrace), (Pos(0), Pos(6)));
        assert!(Arc::ptr_eq(list.get(0).unwrap(), &a));
        assert_eq!(list.get(1).unwrap().children()[0].ident_name(), Some("c"));
    }
}
