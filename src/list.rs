use core::iter::FusedIterator;

use alloc::vec::Vec;

use crate::sequence::{Stamp, Version};
use crate::{Element, Error, Sequence};

#[derive(Debug)]
struct ListNode {
    value: Element,
    prev: usize,
    /// On a released slot: the next free slot, or `FREE_END`.
    next: usize,
}

/// A doubly linked list whose nodes live in an index arena.
///
/// Two sentinel nodes bracket the elements, so before-first and past-rear
/// are real positions and splicing never special-cases the ends.
#[derive(Debug)]
pub struct List {
    nodes: Vec<ListNode>,
    free: usize,
    len: usize,
    version: Version,
}

/// A node of a [`List`], sentinels included.
#[derive(Debug, Clone)]
pub struct ListCursor {
    stamp: Stamp,
    node: usize,
}

pub struct ListIter<'a> {
    list: &'a List,
    front: usize,
    back: usize,
    remaining: usize,
}

impl List {
    const BEFORE_FIRST: usize = 0;
    const PAST_REAR: usize = 1;
    const FREE_END: usize = usize::MAX;

    pub fn iter(&self) -> ListIter<'_> {
        ListIter {
            list: self,
            front: self.nodes[Self::BEFORE_FIRST].next,
            back: self.nodes[Self::PAST_REAR].prev,
            remaining: self.len,
        }
    }

    fn cursor(&self, node: usize) -> ListCursor {
        ListCursor {
            stamp: self.version.stamp(),
            node,
        }
    }

    fn element_slot(&self, cursor: &ListCursor) -> Option<usize> {
        let is_sentinel = cursor.node == Self::BEFORE_FIRST || cursor.node == Self::PAST_REAR;

        (self.version.is_current(cursor.stamp) && !is_sentinel).then_some(cursor.node)
    }

    fn allocate(&mut self, node: ListNode) -> Result<usize, Error> {
        if self.free != Self::FREE_END {
            let slot = self.free;
            self.free = self.nodes[slot].next;
            self.nodes[slot] = node;

            return Ok(slot);
        }

        self.nodes.try_reserve(1)?;
        self.nodes.push(node);

        Ok(self.nodes.len() - 1)
    }

    /// Links a new node in front of `at` and returns its slot.
    fn link_before(&mut self, at: usize, value: Element) -> Result<usize, Error> {
        let prev = self.nodes[at].prev;
        let slot = self.allocate(ListNode {
            value,
            prev,
            next: at,
        })?;

        self.nodes[prev].next = slot;
        self.nodes[at].prev = slot;
        self.len += 1;
        self.version.bump();

        Ok(slot)
    }

    /// Unlinks `slot`, releases it and returns the slot that followed it.
    fn unlink(&mut self, slot: usize) -> (Element, usize) {
        let (value, prev, next) = {
            let node = &self.nodes[slot];
            (node.value, node.prev, node.next)
        };

        self.nodes[prev].next = next;
        self.nodes[next].prev = prev;

        self.nodes[slot].next = self.free;
        self.free = slot;

        self.len -= 1;
        self.version.bump();

        (value, next)
    }
}

impl Sequence for List {
    type Cursor = ListCursor;

    fn create() -> Result<Self, Error> {
        let mut nodes = Vec::new();
        nodes.try_reserve(2)?;

        nodes.push(ListNode {
            value: Element::default(),
            prev: Self::BEFORE_FIRST,
            next: Self::PAST_REAR,
        });
        nodes.push(ListNode {
            value: Element::default(),
            prev: Self::BEFORE_FIRST,
            next: Self::PAST_REAR,
        });

        Ok(Self {
            nodes,
            free: Self::FREE_END,
            len: 0,
            version: Version::new(),
        })
    }

    fn len(&self) -> usize {
        self.len
    }

    /// Walks `index` steps from the front.
    fn cursor_at(&self, index: isize) -> ListCursor {
        let mut cursor = self.front();
        // a fresh cursor is always current
        let _ = self.shift(&mut cursor, index);

        cursor
    }

    fn front(&self) -> ListCursor {
        self.cursor(self.nodes[Self::BEFORE_FIRST].next)
    }

    fn past_rear(&self) -> ListCursor {
        self.cursor(Self::PAST_REAR)
    }

    fn is_dereferencable(&self, cursor: &ListCursor) -> bool {
        self.element_slot(cursor).is_some()
    }

    fn is_past_rear(&self, cursor: &ListCursor) -> bool {
        self.version.is_current(cursor.stamp) && cursor.node == Self::PAST_REAR
    }

    fn is_before_first(&self, cursor: &ListCursor) -> bool {
        self.version.is_current(cursor.stamp) && cursor.node == Self::BEFORE_FIRST
    }

    fn advance(&self, cursor: &mut ListCursor) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;

        if cursor.node != Self::PAST_REAR {
            cursor.node = self.nodes[cursor.node].next;
        }

        Ok(())
    }

    fn rewind(&self, cursor: &mut ListCursor) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;

        if cursor.node != Self::BEFORE_FIRST {
            cursor.node = self.nodes[cursor.node].prev;
        }

        Ok(())
    }

    fn set_position(&self, cursor: &mut ListCursor, index: isize) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;
        *cursor = self.front();

        self.shift(cursor, index)
    }

    fn dereference(&self, cursor: &ListCursor) -> Option<&Element> {
        self.element_slot(cursor).map(|slot| &self.nodes[slot].value)
    }

    fn dereference_mut(&mut self, cursor: &ListCursor) -> Option<&mut Element> {
        let slot = self.element_slot(cursor)?;

        Some(&mut self.nodes[slot].value)
    }

    fn insert_front(&mut self, value: Element) -> Result<(), Error> {
        let first = self.nodes[Self::BEFORE_FIRST].next;

        self.link_before(first, value).map(drop)
    }

    fn insert_rear(&mut self, value: Element) -> Result<(), Error> {
        self.link_before(Self::PAST_REAR, value).map(drop)
    }

    fn insert_before(&mut self, cursor: &mut ListCursor, value: Element) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;

        if cursor.node == Self::BEFORE_FIRST {
            return Ok(());
        }

        let slot = self.link_before(cursor.node, value)?;
        *cursor = self.cursor(slot);

        Ok(())
    }

    fn delete_front(&mut self) -> Option<Element> {
        let first = self.nodes[Self::BEFORE_FIRST].next;
        if first == Self::PAST_REAR {
            return None;
        }

        Some(self.unlink(first).0)
    }

    fn delete_rear(&mut self) -> Option<Element> {
        let last = self.nodes[Self::PAST_REAR].prev;
        if last == Self::BEFORE_FIRST {
            return None;
        }

        Some(self.unlink(last).0)
    }

    fn delete_at(&mut self, cursor: &mut ListCursor) -> Result<Option<Element>, Error> {
        self.version.check(cursor.stamp)?;

        let Some(slot) = self.element_slot(cursor) else {
            return Ok(None);
        };

        let (value, next) = self.unlink(slot);
        *cursor = self.cursor(next);

        Ok(Some(value))
    }
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let list = self.list;
        let node = &list.nodes[self.front];
        self.front = node.next;
        self.remaining -= 1;

        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl DoubleEndedIterator for ListIter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let list = self.list;
        let node = &list.nodes[self.back];
        self.back = node.prev;
        self.remaining -= 1;

        Some(&node.value)
    }
}

impl ExactSizeIterator for ListIter<'_> {}

impl FusedIterator for ListIter<'_> {}
