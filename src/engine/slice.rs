//! Matching and replacement of node lists containing `...` wildcards.

use std::sync::Arc;

use tracing::trace;

use crate::ast::{Node, NodeVector, Pos, Region, Value};

use super::changelog::Changelog;
use super::data::{Data, Key};
use super::error::ReplaceError;
use super::{Matcher, Replacer};

/// One element of a compiled list pattern.
#[derive(Debug)]
pub enum SliceElem<T> {
    /// `...` at the given pattern position: zero or more items.
    Dots(Pos),
    /// Exactly one item.
    Item(T),
}

/// Matches a node list element by element.
///
/// Each `...` binds the run of items it skipped under `Key::Dots(pos)`, which
/// the replacer for the same position reproduces. Wildcards are lazy: they
/// take as few items as possible, so explicit elements match at their
/// earliest position.
#[derive(Debug)]
pub struct SliceMatcher {
    elems: Vec<SliceElem<Box<dyn Matcher>>>,
}

impl SliceMatcher {
    pub fn new(elems: Vec<SliceElem<Box<dyn Matcher>>>) -> Self {
        SliceMatcher { elems }
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    fn match_from(
        elems: &[SliceElem<Box<dyn Matcher>>],
        items: &[Arc<Node>],
        data: Data,
    ) -> Option<Data> {
        let Some((first, rest)) = elems.split_first() else {
            return items.is_empty().then_some(data);
        };
        match first {
            SliceElem::Dots(pos) => (0..=items.len()).find_map(|take| {
                let skipped: NodeVector = items[..take].iter().cloned().collect();
                let extended = data.with_value(Key::Dots(*pos), skipped);
                Self::match_from(rest, &items[take..], extended)
            }),
            SliceElem::Item(matcher) => {
                let (item, remaining) = items.split_first()?;
                let data = matcher.match_value(&Value::Node(item.clone()), &data, item.region())?;
                Self::match_from(rest, remaining, data)
            }
        }
    }
}

impl Matcher for SliceMatcher {
    fn match_value(&self, value: &Value, data: &Data, region: Region) -> Option<Data> {
        let Value::Nodes(list) = value else {
            return None;
        };
        let items: Vec<Arc<Node>> = list.iter().cloned().collect();
        let result = Self::match_from(&self.elems, &items, data.clone());
        trace!(
            "list of {} items at {} {} pattern of {} elements",
            items.len(),
            region,
            if result.is_some() { "matched" } else { "did not match" },
            self.elems.len()
        );
        result
    }
}

/// Generates a node list, reproducing the items captured by each `...`.
#[derive(Debug)]
pub struct SliceReplacer {
    elems: Vec<SliceElem<Box<dyn Replacer>>>,
}

impl SliceReplacer {
    pub fn new(elems: Vec<SliceElem<Box<dyn Replacer>>>) -> Self {
        SliceReplacer { elems }
    }
}

impl Replacer for SliceReplacer {
    fn replace(&self, data: &Data, cl: &mut Changelog, pos: Pos) -> Result<Value, ReplaceError> {
        let mut out = NodeVector::new_with_ptr_kind();
        for elem in &self.elems {
            match elem {
                SliceElem::Dots(dots) => {
                    let captured = data
                        .lookup::<NodeVector>(&Key::Dots(*dots))
                        .ok_or(ReplaceError::UnboundDots { pos: *dots })?;
                    for item in captured.iter() {
                        out = out.push_back(item.clone());
                    }
                }
                SliceElem::Item(replacer) => match replacer.replace(data, cl, pos)? {
                    Value::Node(node) => out = out.push_back(node),
                    other => {
                        return Err(ReplaceError::UnexpectedValue {
                            context: "list element",
                            expected: "node",
                            found: other.type_name(),
                        });
                    }
                },
            }
        }
        Ok(Value::Nodes(out))
    }
}
