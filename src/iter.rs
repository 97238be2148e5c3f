use core::iter::FusedIterator;

use crate::node::NodeIndex;
use crate::{AvlTree, Element, Key};

/// Sorted iterator over the entries of an [`AvlTree`].
///
/// Walks the tree through parent links, so it needs no stack.
pub struct Iter<'a> {
    pub(crate) tree: &'a AvlTree,
    pub(crate) front: NodeIndex,
    pub(crate) back: NodeIndex,
    pub(crate) remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (Key, &'a Element);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree;
        let node = tree.node(self.front);

        self.front = tree.successor(self.front);
        self.remaining -= 1;

        Some((node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let tree = self.tree;
        let node = tree.node(self.back);

        self.back = tree.predecessor(self.back);
        self.remaining -= 1;

        Some((node.key, &node.value))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
