pub mod fields;
pub mod node;
pub mod position;
pub mod visitor;

pub use fields::{ShapeError, Value};
pub use node::{node_vector, Node, NodeKind, NodeVector, Token};
pub use position::{Pos, Region};
pub use visitor::{walk_list, walk_node, Visitor};
