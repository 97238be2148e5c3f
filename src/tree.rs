use core::cmp::Ordering;
use core::mem;

use alloc::vec::Vec;
use log::trace;

use crate::iter::Iter;
use crate::node::{AvlNode, NodeIndex};
use crate::sequence::Version;
use crate::{Element, Error, Key};

/*
released arena slots are chained in a freelist: the head lives in `free`, the link to the next free slot is
stored in the slot's parent field. allocating pops the head, releasing pushes onto it.

rebalancing after an insertion stops as soon as a node ends up perfectly balanced (its height did not change).
after a removal it stops once a node is off by one, which also means its height did not change. removals may
still rotate at several levels on the way up.
*/
const INSERT_STOP: i32 = 0;
const REMOVE_STOP: i32 = 1;

/// An ordered map from integer keys to elements, kept height-balanced as
/// an AVL tree.
///
/// Nodes are stored in an arena and refer to each other through indices, so
/// the parent back-links never alias owned data.
#[derive(Debug)]
pub struct AvlTree {
    storage: Vec<AvlNode>,
    root: NodeIndex,
    free: NodeIndex,
    len: usize,
    pub(crate) version: Version,
}

impl AvlTree {
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: alloc::vec![AvlNode::sentinel()],
            root: NodeIndex::NIL,
            free: NodeIndex::NIL,
            len: 0,
            version: Version::new(),
        }
    }

    pub(crate) fn try_new() -> Result<Self, Error> {
        let mut storage = Vec::new();
        storage.try_reserve(1)?;
        storage.push(AvlNode::sentinel());

        Ok(Self {
            storage,
            root: NodeIndex::NIL,
            free: NodeIndex::NIL,
            len: 0,
            version: Version::new(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels in the tree, `0` when empty.
    #[must_use]
    pub fn height(&self) -> usize {
        self.node(self.root).height as usize
    }

    pub fn contains_key(&self, key: Key) -> bool {
        !self.find_node(key).is_nil()
    }

    pub fn get(&self, key: Key) -> Option<&Element> {
        let node_idx = self.find_node(key);

        (!node_idx.is_nil()).then(|| &self.node(node_idx).value)
    }

    pub fn get_mut(&mut self, key: Key) -> Option<&mut Element> {
        let node_idx = self.find_node(key);

        if node_idx.is_nil() {
            return None;
        }

        Some(&mut self.node_mut(node_idx).value)
    }

    /// Stores `value` under `key`.
    ///
    /// If the key is already present its value is replaced in place and the
    /// previous one is returned; the shape of the tree does not change and
    /// outstanding cursors stay valid. Otherwise a new leaf is linked in and
    /// the path up to the root is rebalanced.
    pub fn insert(&mut self, key: Key, value: Element) -> Result<Option<Element>, Error> {
        let mut current_node = self.root;
        let mut parent_node = NodeIndex::NIL;
        let mut goes_left = false;

        while !current_node.is_nil() {
            parent_node = current_node;
            let curr_node_storage = &mut self.storage[current_node.0];

            match key.cmp(&curr_node_storage.key) {
                Ordering::Less => {
                    goes_left = true;
                    current_node = curr_node_storage.left;
                }
                Ordering::Equal => {
                    return Ok(Some(mem::replace(&mut curr_node_storage.value, value)));
                }
                Ordering::Greater => {
                    goes_left = false;
                    current_node = curr_node_storage.right;
                }
            }
        }

        let new_node = self.allocate(AvlNode::new_leaf(key, value, parent_node))?;

        if parent_node.is_nil() {
            self.root = new_node;
        } else if goes_left {
            self.node_mut(parent_node).left = new_node;
        } else {
            self.node_mut(parent_node).right = new_node;
        }

        self.len += 1;
        self.version.bump();
        self.rebalance(parent_node, INSERT_STOP);

        Ok(None)
    }

    /// Removes `key` and returns its value. Absent keys leave the tree
    /// untouched.
    pub fn remove(&mut self, key: Key) -> Option<Element> {
        let node_idx = self.find_node(key);

        if node_idx.is_nil() {
            return None;
        }

        Some(self.remove_node(node_idx).1)
    }

    #[must_use]
    pub fn first_key_value(&self) -> Option<(Key, &Element)> {
        if self.root.is_nil() {
            return None;
        }

        let node = self.node(self.minimum(self.root));
        Some((node.key, &node.value))
    }

    #[must_use]
    pub fn last_key_value(&self) -> Option<(Key, &Element)> {
        if self.root.is_nil() {
            return None;
        }

        let node = self.node(self.maximum(self.root));
        Some((node.key, &node.value))
    }

    pub fn pop_first(&mut self) -> Option<(Key, Element)> {
        if self.root.is_nil() {
            return None;
        }

        let first = self.minimum(self.root);
        Some(self.remove_node(first))
    }

    pub fn pop_last(&mut self) -> Option<(Key, Element)> {
        if self.root.is_nil() {
            return None;
        }

        let last = self.maximum(self.root);
        Some(self.remove_node(last))
    }

    /// Drops every entry at once. Only the sentinel slot is kept.
    pub fn clear(&mut self) {
        self.storage.truncate(1);
        self.root = NodeIndex::NIL;
        self.free = NodeIndex::NIL;
        self.len = 0;
        self.version.bump();
    }

    /// In-order iterator over `(key, &value)` pairs.
    pub fn iter(&self) -> Iter<'_> {
        let (front, back) = if self.root.is_nil() {
            (NodeIndex::NIL, NodeIndex::NIL)
        } else {
            (self.minimum(self.root), self.maximum(self.root))
        };

        Iter {
            tree: self,
            front,
            back,
            remaining: self.len,
        }
    }

    pub(crate) fn node(&self, node_idx: NodeIndex) -> &AvlNode {
        &self.storage[node_idx.0]
    }

    pub(crate) fn node_mut(&mut self, node_idx: NodeIndex) -> &mut AvlNode {
        &mut self.storage[node_idx.0]
    }

    pub(crate) fn root(&self) -> NodeIndex {
        self.root
    }

    pub(crate) fn find_node(&self, key: Key) -> NodeIndex {
        let mut current_node = self.root;

        while !current_node.is_nil() {
            let curr_node_storage = self.node(current_node);

            match key.cmp(&curr_node_storage.key) {
                Ordering::Less => current_node = curr_node_storage.left,
                Ordering::Equal => return current_node,
                Ordering::Greater => current_node = curr_node_storage.right,
            }
        }

        NodeIndex::NIL
    }

    pub(crate) fn minimum(&self, mut node_idx: NodeIndex) -> NodeIndex {
        while !self.node(node_idx).left_child().is_nil() {
            node_idx = self.node(node_idx).left_child();
        }

        node_idx
    }

    pub(crate) fn maximum(&self, mut node_idx: NodeIndex) -> NodeIndex {
        while !self.node(node_idx).right_child().is_nil() {
            node_idx = self.node(node_idx).right_child();
        }

        node_idx
    }

    /// In-order successor, found through the right subtree or by climbing
    /// until we arrive from a left child. `NIL` past the largest key.
    pub(crate) fn successor(&self, node_idx: NodeIndex) -> NodeIndex {
        let right = self.node(node_idx).right_child();
        if !right.is_nil() {
            return self.minimum(right);
        }

        let mut child = node_idx;
        let mut parent = self.node(node_idx).parent;

        while !parent.is_nil() && self.node(parent).right_child() == child {
            child = parent;
            parent = self.node(parent).parent;
        }

        parent
    }

    pub(crate) fn predecessor(&self, node_idx: NodeIndex) -> NodeIndex {
        let left = self.node(node_idx).left_child();
        if !left.is_nil() {
            return self.maximum(left);
        }

        let mut child = node_idx;
        let mut parent = self.node(node_idx).parent;

        while !parent.is_nil() && self.node(parent).left_child() == child {
            child = parent;
            parent = self.node(parent).parent;
        }

        parent
    }

    /// Unlinks the entry stored at `node_idx` and returns it.
    ///
    /// A node with two children takes over its successor's entry, and the
    /// successor slot (which has at most one child) is the one spliced out.
    pub(crate) fn remove_node(&mut self, node_idx: NodeIndex) -> (Key, Element) {
        let mut doomed = node_idx;
        let removed;

        if self.node(node_idx).has_two_children() {
            let successor = self.minimum(self.node(node_idx).right_child());
            let (succ_key, succ_value) = {
                let succ_node = self.node(successor);
                (succ_node.key, succ_node.value)
            };

            let node = self.node_mut(node_idx);
            removed = (
                mem::replace(&mut node.key, succ_key),
                mem::replace(&mut node.value, succ_value),
            );
            doomed = successor;
        } else {
            let node = self.node(node_idx);
            removed = (node.key, node.value);
        }

        let parent = self.node(doomed).parent;
        let child = if self.node(doomed).left_child().is_nil() {
            self.node(doomed).right_child()
        } else {
            self.node(doomed).left_child()
        };

        self.replace_node(doomed, child);
        self.release(doomed);

        self.len -= 1;
        self.version.bump();
        self.rebalance(parent, REMOVE_STOP);

        removed
    }

    fn allocate(&mut self, node: AvlNode) -> Result<NodeIndex, Error> {
        if !self.free.is_nil() {
            let node_idx = self.free;
            self.free = self.node(node_idx).parent;
            self.storage[node_idx.0] = node;

            return Ok(node_idx);
        }

        self.storage.try_reserve(1)?;
        let node_idx = NodeIndex(self.storage.len());
        self.storage.push(node);

        Ok(node_idx)
    }

    fn release(&mut self, node_idx: NodeIndex) {
        let free_head = self.free;
        let node = self.node_mut(node_idx);

        node.left = NodeIndex::NIL;
        node.right = NodeIndex::NIL;
        node.height = 0;
        node.parent = free_head;

        self.free = node_idx;
    }

    /// Puts `replacement` where `node_idx` hangs from its parent.
    fn replace_node(&mut self, node_idx: NodeIndex, replacement: NodeIndex) {
        let parent_idx = self.node(node_idx).parent;

        if !replacement.is_nil() {
            self.node_mut(replacement).parent = parent_idx;
        }

        if parent_idx.is_nil() {
            self.root = replacement;
        } else if self.node(parent_idx).left_child() == node_idx {
            self.node_mut(parent_idx).left = replacement;
        } else {
            self.node_mut(parent_idx).right = replacement;
        }
    }

    fn height_of(&self, node_idx: NodeIndex) -> i32 {
        self.node(node_idx).height
    }

    fn balance_factor(&self, node_idx: NodeIndex) -> i32 {
        let node = self.node(node_idx);
        self.height_of(node.left) - self.height_of(node.right)
    }

    fn refresh_height(&mut self, node_idx: NodeIndex) {
        let node = self.node(node_idx);
        let height = 1 + self.height_of(node.left).max(self.height_of(node.right));

        self.node_mut(node_idx).height = height;
    }

    fn rotate_left(&mut self, center: NodeIndex) {
        let new_root = self.node(center).right_child();
        trace!("rotating left around key {}", self.node(center).key);

        self.replace_node(center, new_root);

        let inner = self.node(new_root).left_child();
        self.node_mut(center).right = inner;
        if !inner.is_nil() {
            self.node_mut(inner).parent = center;
        }

        self.node_mut(center).parent = new_root;
        self.node_mut(new_root).left = center;

        self.refresh_height(center);
        self.refresh_height(new_root);
    }

    fn rotate_right(&mut self, center: NodeIndex) {
        let new_root = self.node(center).left_child();
        trace!("rotating right around key {}", self.node(center).key);

        self.replace_node(center, new_root);

        let inner = self.node(new_root).right_child();
        self.node_mut(center).left = inner;
        if !inner.is_nil() {
            self.node_mut(inner).parent = center;
        }

        self.node_mut(center).parent = new_root;
        self.node_mut(new_root).right = center;

        self.refresh_height(center);
        self.refresh_height(new_root);
    }

    fn rebalance(&mut self, start_node_idx: NodeIndex, stop_criterion: i32) {
        let mut curr_node = start_node_idx;

        while !curr_node.is_nil() {
            self.refresh_height(curr_node);
            let balance = self.balance_factor(curr_node);
            let parent_idx = self.node(curr_node).parent;

            if balance.abs() == stop_criterion {
                return;
            }

            if balance == -2 {
                let right = self.node(curr_node).right_child();
                if self.balance_factor(right) > 0 {
                    self.rotate_right(right);
                }
                self.rotate_left(curr_node);
            } else if balance == 2 {
                let left = self.node(curr_node).left_child();
                if self.balance_factor(left) < 0 {
                    self.rotate_left(left);
                }
                self.rotate_right(curr_node);
            }

            curr_node = parent_idx;
        }
    }

    /// Checks ordering, parent links, cached heights and balance everywhere.
    #[cfg(test)]
    pub(crate) fn assert_invariants(&self) {
        fn walk(tree: &AvlTree, node_idx: NodeIndex, low: Option<Key>, high: Option<Key>) -> (i32, usize) {
            if node_idx.is_nil() {
                return (0, 0);
            }

            let node = tree.node(node_idx);
            assert!(low.is_none_or(|low| low < node.key), "key {} out of order", node.key);
            assert!(high.is_none_or(|high| node.key < high), "key {} out of order", node.key);

            for child in [node.left, node.right] {
                if !child.is_nil() {
                    assert_eq!(tree.node(child).parent, node_idx, "broken parent link");
                }
            }

            let (left_height, left_count) = walk(tree, node.left, low, Some(node.key));
            let (right_height, right_count) = walk(tree, node.right, Some(node.key), high);

            assert_eq!(node.height, 1 + left_height.max(right_height), "stale height");
            assert!((left_height - right_height).abs() <= 1, "unbalanced at key {}", node.key);

            (node.height, left_count + right_count + 1)
        }

        if !self.root.is_nil() {
            assert!(self.node(self.root).parent.is_nil());
        }

        let (_, count) = walk(self, self.root, None, None);
        assert_eq!(count, self.len);
    }

    #[cfg(test)]
    pub(crate) fn free_slots(&self) -> usize {
        let mut count = 0;
        let mut slot = self.free;

        while !slot.is_nil() {
            count += 1;
            slot = self.node(slot).parent;
        }

        count
    }
}

impl Default for AvlTree {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a AvlTree {
    type Item = (Key, &'a Element);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use quickcheck::quickcheck;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    use crate::{AvlTree, Key};

    fn keys(tree: &AvlTree) -> Vec<Key> {
        tree.iter().map(|(key, _)| key).collect()
    }

    #[test]
    pub fn create_tree() {
        let tree = AvlTree::new();

        assert_eq!(tree.len(), 0);
        assert_eq!(tree.height(), 0);
        assert!(tree.first_key_value().is_none());
        tree.assert_invariants();
    }

    #[test]
    pub fn mixed_insertion_order() {
        let mut tree = AvlTree::new();

        for key in [5, 3, 8, 1, 4, 7, 9] {
            assert_eq!(tree.insert(key, key * 10).unwrap(), None);
            tree.assert_invariants();
        }

        assert_eq!(keys(&tree), [1, 3, 4, 5, 7, 8, 9]);
        assert_eq!(tree.len(), 7);
        // ceil(1.44 * log2(8))
        assert!(tree.height() <= 5);
        assert_eq!(tree.get(4), Some(&40));
    }

    #[test]
    pub fn ascending_insertion_rotates() {
        let mut tree = AvlTree::new();

        for key in 1..=7 {
            tree.insert(key, 0).unwrap();
            tree.assert_invariants();
        }

        assert_eq!(tree.height(), 3);
        assert_eq!(keys(&tree), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    pub fn descending_insertion_rotates() {
        let mut tree = AvlTree::new();

        for key in (1..=15).rev() {
            tree.insert(key, 0).unwrap();
            tree.assert_invariants();
        }

        assert_eq!(tree.height(), 4);
    }

    #[test]
    pub fn double_rotation_cases() {
        let mut left_right = AvlTree::new();
        for key in [30, 10, 20] {
            left_right.insert(key, 0).unwrap();
        }
        left_right.assert_invariants();
        assert_eq!(left_right.node(left_right.root()).key, 20);

        let mut right_left = AvlTree::new();
        for key in [10, 30, 20] {
            right_left.insert(key, 0).unwrap();
        }
        right_left.assert_invariants();
        assert_eq!(right_left.node(right_left.root()).key, 20);
    }

    #[test]
    pub fn existing_key_overwrites_value() {
        let mut tree = AvlTree::new();

        tree.insert(3, 17).unwrap();
        tree.insert(2, 12).unwrap();

        assert_eq!(tree.insert(3, 19).unwrap(), Some(17));
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.get(3), Some(&19));

        *tree.get_mut(2).unwrap() = 5;
        assert_eq!(tree.get(2), Some(&5));
    }

    #[test]
    pub fn removing_absent_key_is_noop() {
        let mut tree = AvlTree::new();
        for key in [4, 2, 6] {
            tree.insert(key, key).unwrap();
        }

        let root_before = tree.root();
        assert_eq!(tree.remove(5), None);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.root(), root_before);
        assert_eq!(keys(&tree), [2, 4, 6]);
        assert_eq!(tree.remove(5), None);
    }

    #[test]
    pub fn remove_node_with_two_children() {
        let mut tree = AvlTree::new();
        for key in [5, 3, 8, 1, 4, 7, 9] {
            tree.insert(key, key * 10).unwrap();
        }

        assert_eq!(tree.remove(3), Some(30));
        tree.assert_invariants();
        assert_eq!(keys(&tree), [1, 4, 5, 7, 8, 9]);
        assert_eq!(tree.get(4), Some(&40));
    }

    #[test]
    pub fn remove_root_until_empty() {
        let mut tree = AvlTree::new();
        let inserted: Vec<Key> = (1..=63).collect();
        for &key in &inserted {
            tree.insert(key, key).unwrap();
        }

        while tree.len() > 0 {
            let root_key = tree.node(tree.root()).key;
            assert_eq!(tree.remove(root_key), Some(root_key));
            tree.assert_invariants();
        }

        assert_eq!(tree.height(), 0);
        for key in inserted {
            assert!(!tree.contains_key(key));
        }
        // every allocated slot went back to the freelist
        assert_eq!(tree.free_slots(), 63);
    }

    #[test]
    pub fn released_slots_are_reused() {
        let mut tree = AvlTree::new();
        for key in 0..10 {
            tree.insert(key, 0).unwrap();
        }
        for key in 0..5 {
            tree.remove(key);
        }
        assert_eq!(tree.free_slots(), 5);

        for key in 20..25 {
            tree.insert(key, 0).unwrap();
        }
        assert_eq!(tree.free_slots(), 0);
        assert_eq!(tree.storage.len(), 11);
        tree.assert_invariants();
    }

    #[test]
    pub fn pop_both_ends() {
        let mut tree = AvlTree::new();
        for key in [2, 9, 4, 7] {
            tree.insert(key, -key).unwrap();
        }

        assert_eq!(tree.pop_first(), Some((2, -2)));
        assert_eq!(tree.pop_last(), Some((9, -9)));
        assert_eq!(tree.first_key_value(), Some((4, &-4)));
        assert_eq!(tree.last_key_value(), Some((7, &-7)));
        tree.assert_invariants();

        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.pop_first(), None);
    }

    #[test]
    pub fn iterates_in_both_directions() {
        let mut tree = AvlTree::new();
        for key in [8, 1, 5, 3] {
            tree.insert(key, key).unwrap();
        }

        let reversed: Vec<Key> = tree.iter().rev().map(|(key, _)| key).collect();
        assert_eq!(reversed, [8, 5, 3, 1]);

        let mut iter = tree.iter();
        assert_eq!(iter.len(), 4);
        assert_eq!(iter.next(), Some((1, &1)));
        assert_eq!(iter.next_back(), Some((8, &8)));
        assert_eq!(iter.next(), Some((3, &3)));
        assert_eq!(iter.next_back(), Some((5, &5)));
        assert_eq!(iter.next(), None);
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    pub fn random_operations_match_btree_map() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut tree = AvlTree::new();
        let mut expected = BTreeMap::new();

        let mut order: Vec<Key> = (0..2000).collect();
        order.shuffle(&mut rng);

        for key in order {
            tree.insert(key, key * 2).unwrap();
            expected.insert(key, key * 2);
        }
        tree.assert_invariants();

        for _ in 0..4000 {
            let key = rng.gen_range(0..3000);
            if rng.gen_bool(0.5) {
                assert_eq!(tree.remove(key), expected.remove(&key));
            } else {
                assert_eq!(tree.insert(key, key).unwrap(), expected.insert(key, key));
            }
        }

        tree.assert_invariants();
        assert_eq!(tree.len(), expected.len());
        assert!(tree.iter().map(|(k, &v)| (k, v)).eq(expected.into_iter()));
    }

    quickcheck! {
        fn insertions_keep_balance(input: Vec<Key>) -> bool {
            let mut tree = AvlTree::new();
            for key in input {
                tree.insert(key, 0).unwrap();
                tree.assert_invariants();
            }
            true
        }

        fn inorder_is_strictly_increasing(input: Vec<Key>) -> bool {
            let mut tree = AvlTree::new();
            for &key in &input {
                tree.insert(key, 0).unwrap();
            }

            let keys = keys(&tree);
            keys.len() == tree.len() && keys.windows(2).all(|pair| pair[0] < pair[1])
        }

        fn size_grows_only_for_new_keys(input: Vec<Key>, probe: Key) -> bool {
            let mut tree = AvlTree::new();
            for key in input {
                tree.insert(key, 0).unwrap();
            }

            let before = tree.len();
            let existed = tree.contains_key(probe);
            tree.insert(probe, 1).unwrap();

            tree.len() == before + usize::from(!existed) && tree.get(probe) == Some(&1)
        }

        fn removals_keep_balance(input: Vec<Key>, doomed: Vec<Key>) -> bool {
            let mut tree = AvlTree::new();
            for &key in &input {
                tree.insert(key, key).unwrap();
            }

            for key in doomed {
                let present = tree.contains_key(key);
                let len = tree.len();
                assert_eq!(tree.remove(key).is_some(), present);
                assert_eq!(tree.len(), len - usize::from(present));
                tree.assert_invariants();
            }
            true
        }
    }
}
