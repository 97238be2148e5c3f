use crate::{Element, Key};

/// Position of a node inside the tree arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NodeIndex(pub(crate) usize);

impl NodeIndex {
    /// The sentinel slot. Stands for every missing child and parent.
    pub(crate) const NIL: NodeIndex = NodeIndex(0);

    pub(crate) fn is_nil(self) -> bool {
        self == Self::NIL
    }
}

#[derive(Debug)]
pub(crate) struct AvlNode {
    pub(crate) key: Key,
    pub(crate) value: Element,
    pub(crate) left: NodeIndex,
    pub(crate) right: NodeIndex,
    /// Back-reference used for traversal and rebalancing. On a released slot
    /// this links to the next free slot instead.
    pub(crate) parent: NodeIndex,
    pub(crate) height: i32,
}

impl AvlNode {
    pub(crate) fn new_leaf(key: Key, value: Element, parent: NodeIndex) -> Self {
        Self {
            key,
            value,
            left: NodeIndex::NIL,
            right: NodeIndex::NIL,
            parent,
            height: 1,
        }
    }

    pub(crate) fn sentinel() -> Self {
        Self {
            key: Key::default(),
            value: Element::default(),
            left: NodeIndex::NIL,
            right: NodeIndex::NIL,
            parent: NodeIndex::NIL,
            height: 0,
        }
    }

    pub(crate) fn left_child(&self) -> NodeIndex {
        self.left
    }

    pub(crate) fn right_child(&self) -> NodeIndex {
        self.right
    }

    pub(crate) fn has_two_children(&self) -> bool {
        !self.left.is_nil() && !self.right.is_nil()
    }
}
