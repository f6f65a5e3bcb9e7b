//! Binding context threaded through matching.
//!
//! `Data` is an immutable persistent map: `with_value` returns an extended
//! copy that shares structure with the original, so a failed match attempt
//! can simply drop its extensions and the caller's context is never touched.

use std::collections::hash_map::RandomState;
use std::fmt;
use std::sync::Arc;

use archery::ArcK;
use rpds::HashTrieMap;

use crate::ast::{Node, NodeVector, Pos};

use super::stmt_list::StmtListData;

/// Identifies one compiled statement-list container pattern.
///
/// The matcher and replacer compiled from the same patch share an id, which
/// keys the shape metadata passed from one to the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub usize);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Keys of the binding context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A metavariable named in the patch.
    Var(String),
    /// The statements skipped by the `...` marker at this pattern position.
    Dots(Pos),
    /// Shape metadata captured by a statement-list container match.
    StmtList(ContainerId),
}

#[derive(Debug, Clone)]
pub enum Entry {
    Node(Arc<Node>),
    Stmts(NodeVector),
    StmtList(Arc<StmtListData>),
}

impl From<Arc<Node>> for Entry {
    fn from(node: Arc<Node>) -> Self {
        Entry::Node(node)
    }
}

impl From<NodeVector> for Entry {
    fn from(stmts: NodeVector) -> Self {
        Entry::Stmts(stmts)
    }
}

impl From<StmtListData> for Entry {
    fn from(data: StmtListData) -> Self {
        Entry::StmtList(Arc::new(data))
    }
}

/// Typed view of an `Entry`, used by `Data::lookup`.
pub trait FromEntry {
    fn from_entry(entry: &Entry) -> Option<&Self>;
}

impl FromEntry for Arc<Node> {
    fn from_entry(entry: &Entry) -> Option<&Self> {
        match entry {
            Entry::Node(n) => Some(n),
            _ => None,
        }
    }
}

impl FromEntry for NodeVector {
    fn from_entry(entry: &Entry) -> Option<&Self> {
        match entry {
            Entry::Stmts(s) => Some(s),
            _ => None,
        }
    }
}

impl FromEntry for StmtListData {
    fn from_entry(entry: &Entry) -> Option<&Self> {
        match entry {
            Entry::StmtList(d) => Some(&**d),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct Data {
    bindings: HashTrieMap<Key, Entry, ArcK, RandomState>,
}

impl Data {
    pub fn new() -> Self {
        Data {
            bindings: HashTrieMap::new_with_hasher_and_ptr_kind(RandomState::new()),
        }
    }

    /// Returns a copy of this context with `key` bound to `value`.
    ///
    /// A later binding of the same key shadows the earlier one in the
    /// returned context only.
    pub fn with_value(&self, key: Key, value: impl Into<Entry>) -> Data {
        Data {
            bindings: self.bindings.insert(key, value.into()),
        }
    }

    /// Looks up `key` and views it as a `T`.
    ///
    /// Returns `None` both when the key is absent and when it is bound to a
    /// value of another type.
    pub fn lookup<T: FromEntry + ?Sized>(&self, key: &Key) -> Option<&T> {
        self.bindings.get(key).and_then(T::from_entry)
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.size()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for Data {
    fn default() -> Self {
        Data::new()
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.bindings.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::node_vector;

    fn ident(name: &str) -> Arc<Node> {
        Arc::new(Node::Ident { name_pos: Pos(0), name: name.to_string() })
    }

    #[test]
    fn test_with_value_does_not_touch_original() {
        let d0 = Data::new();
        let d1 = d0.with_value(Key::Var("x".into()), ident("a"));
        assert!(d0.is_empty());
        assert_eq!(d1.len(), 1);
        assert!(d0.lookup::<Arc<Node>>(&Key::Var("x".into())).is_none());
        assert_eq!(
            d1.lookup::<Arc<Node>>(&Key::Var("x".into())).and_then(|n| n.ident_name()),
            Some("a")
        );
    }

    #[test]
    fn test_lookup_wrong_type_is_not_found() {
        let d = Data::new().with_value(Key::Dots(Pos(3)), node_vector([ident("a")]));
        assert!(d.contains(&Key::Dots(Pos(3))));
        assert!(d.lookup::<Arc<Node>>(&Key::Dots(Pos(3))).is_none());
        assert_eq!(d.lookup::<NodeVector>(&Key::Dots(Pos(3))).map(|s| s.len()), Some(1));
    }

    #[test]
    fn test_shadowing_is_local_to_extension() {
        let d1 = Data::new().with_value(Key::Var("x".into()), ident("a"));
        let d2 = d1.with_value(Key::Var("x".into()), ident("b"));
        let name = |d: &Data| d.lookup::<Arc<Node>>(&Key::Var("x".into())).and_then(|n| n.ident_name().map(str::to_string));
        assert_eq!(name(&d1).as_deref(), Some("a"));
        assert_eq!(name(&d2).as_deref(), Some("b"));
    }
}
