use crate::{types::types::TypeId, Span};

use super::nodecl::{Nodecl, NodeclKind};

/// Ordered sequence of nodecls. The null list has no elements and no node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeclList {
    items: Vec<Nodecl>,
}

impl NodeclList {
    pub fn new() -> Self {
        NodeclList { items: vec![] }
    }

    pub fn from_vec(items: Vec<Nodecl>) -> Self {
        NodeclList { items }
    }

    /// Unpacks a list node built by [`NodeclList::into_nodecl`].
    pub fn from_nodecl(node: &Nodecl) -> Self {
        if node.kind() == NodeclKind::List {
            NodeclList::from_vec(node.children().to_vec())
        } else {
            NodeclList::from_vec(vec![node.clone()])
        }
    }

    pub fn is_null(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn head(&self) -> Option<&Nodecl> {
        self.items.first()
    }

    pub fn get(&self, index: usize) -> Option<&Nodecl> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Nodecl> {
        self.items.iter()
    }

    pub fn append(mut self, item: Nodecl) -> Self {
        self.items.push(item);
        self
    }

    pub fn concat(mut self, other: NodeclList) -> Self {
        self.items.extend(other.items);
        self
    }

    pub fn to_vec(&self) -> Vec<Nodecl> {
        self.items.clone()
    }

    pub fn any_error(&self) -> bool {
        self.items.iter().any(Nodecl::is_error)
    }

    pub fn shallow_copy(&self) -> Self {
        self.clone()
    }

    pub fn deep_copy(&self) -> Self {
        NodeclList::from_vec(self.items.iter().map(Nodecl::deep_copy).collect())
    }

    /// Wraps the list in a `List` node typed with `ty`.
    pub fn into_nodecl(self, ty: TypeId, span: Span) -> Nodecl {
        Nodecl::new(NodeclKind::List, self.items, ty, span)
    }
}

impl IntoIterator for NodeclList {
    type Item = Nodecl;
    type IntoIter = std::vec::IntoIter<Nodecl>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<Nodecl> for NodeclList {
    fn from_iter<I: IntoIterator<Item = Nodecl>>(iter: I) -> Self {
        NodeclList::from_vec(iter.into_iter().collect())
    }
}
