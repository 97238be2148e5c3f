use log::trace;

use crate::node::NodeIndex;
use crate::sequence::Stamp;
use crate::{AvlTree, Element, Error, Key, Sequence};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Position {
    BeforeFirst,
    At(NodeIndex),
    PastRear,
}

/// A position in an [`AvlTree`]: before the smallest key, on a key, or past
/// the largest key.
///
/// The cursor does not borrow the tree. Inserting a new key or removing one
/// makes it stale, after which the tree refuses to move it
/// ([`Error::InvalidIterator`]) and reports every state query as `false`.
#[derive(Debug, Clone)]
pub struct TreeCursor {
    pub(crate) stamp: Stamp,
    pub(crate) position: Position,
}

impl AvlTree {
    fn cursor(&self, position: Position) -> TreeCursor {
        TreeCursor {
            stamp: self.version.stamp(),
            position,
        }
    }

    /// Cursor on `key`, or past the rear when the key is not stored.
    pub fn cursor_at_key(&self, key: Key) -> TreeCursor {
        let node_idx = self.find_node(key);

        if node_idx.is_nil() {
            self.cursor(Position::PastRear)
        } else {
            self.cursor(Position::At(node_idx))
        }
    }

    /// Key under the cursor, if it is on an entry.
    pub fn key(&self, cursor: &TreeCursor) -> Option<Key> {
        self.node_under(cursor).map(|node_idx| self.node(node_idx).key)
    }

    fn node_under(&self, cursor: &TreeCursor) -> Option<NodeIndex> {
        if !self.version.is_current(cursor.stamp) {
            return None;
        }

        match cursor.position {
            Position::At(node_idx) => Some(node_idx),
            Position::BeforeFirst | Position::PastRear => None,
        }
    }

    fn step_forward(&self, position: Position) -> Position {
        match position {
            Position::BeforeFirst if self.root().is_nil() => Position::PastRear,
            Position::BeforeFirst => Position::At(self.minimum(self.root())),
            Position::At(node_idx) => {
                let next = self.successor(node_idx);
                if next.is_nil() {
                    Position::PastRear
                } else {
                    Position::At(next)
                }
            }
            Position::PastRear => Position::PastRear,
        }
    }

    fn step_backward(&self, position: Position) -> Position {
        match position {
            Position::PastRear if self.root().is_nil() => Position::BeforeFirst,
            Position::PastRear => Position::At(self.maximum(self.root())),
            Position::At(node_idx) => {
                let prev = self.predecessor(node_idx);
                if prev.is_nil() {
                    Position::BeforeFirst
                } else {
                    Position::At(prev)
                }
            }
            Position::BeforeFirst => Position::BeforeFirst,
        }
    }

    fn resync(&self, cursor: &mut TreeCursor, position: Position) {
        trace!("resyncing tree cursor to {position:?}");
        *cursor = self.cursor(position);
    }

    fn key_after_max(&self) -> Result<Key, Error> {
        match self.last_key_value() {
            None => Ok(0),
            Some((max, _)) => max.checked_add(1).ok_or(Error::NoFreeKey),
        }
    }
}

impl Sequence for AvlTree {
    type Cursor = TreeCursor;

    fn create() -> Result<Self, Error> {
        Self::try_new()
    }

    fn len(&self) -> usize {
        AvlTree::len(self)
    }

    /// The tree addresses elements by key: `index` is looked up as a key.
    fn cursor_at(&self, index: isize) -> TreeCursor {
        match Key::try_from(index) {
            Ok(key) => self.cursor_at_key(key),
            Err(_) => self.past_rear(),
        }
    }

    fn front(&self) -> TreeCursor {
        let mut cursor = self.cursor(Position::BeforeFirst);
        cursor.position = self.step_forward(cursor.position);

        cursor
    }

    fn past_rear(&self) -> TreeCursor {
        self.cursor(Position::PastRear)
    }

    fn is_dereferencable(&self, cursor: &TreeCursor) -> bool {
        self.node_under(cursor).is_some()
    }

    fn is_past_rear(&self, cursor: &TreeCursor) -> bool {
        self.version.is_current(cursor.stamp) && cursor.position == Position::PastRear
    }

    fn is_before_first(&self, cursor: &TreeCursor) -> bool {
        self.version.is_current(cursor.stamp) && cursor.position == Position::BeforeFirst
    }

    fn advance(&self, cursor: &mut TreeCursor) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;
        cursor.position = self.step_forward(cursor.position);

        Ok(())
    }

    fn rewind(&self, cursor: &mut TreeCursor) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;
        cursor.position = self.step_backward(cursor.position);

        Ok(())
    }

    /// Always counts from the front, one in-order step at a time, even though
    /// key lookups are logarithmic.
    fn set_position(&self, cursor: &mut TreeCursor, index: isize) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;
        cursor.position = Position::BeforeFirst;

        self.shift(cursor, index.saturating_add(1))
    }

    fn dereference(&self, cursor: &TreeCursor) -> Option<&Element> {
        self.node_under(cursor)
            .map(|node_idx| &self.node(node_idx).value)
    }

    fn dereference_mut(&mut self, cursor: &TreeCursor) -> Option<&mut Element> {
        let node_idx = self.node_under(cursor)?;

        Some(&mut self.node_mut(node_idx).value)
    }

    /// Stores `value` one below the smallest key, or under `0` when empty.
    fn insert_front(&mut self, value: Element) -> Result<(), Error> {
        let key = match self.first_key_value() {
            None => 0,
            Some((min, _)) => min.checked_sub(1).ok_or(Error::NoFreeKey)?,
        };

        self.insert(key, value).map(drop)
    }

    /// Stores `value` one above the largest key, or under `0` when empty.
    fn insert_rear(&mut self, value: Element) -> Result<(), Error> {
        let key = self.key_after_max()?;

        self.insert(key, value).map(drop)
    }

    /// Stores `value` under the key right below the cursor's key. Fails with
    /// [`Error::NoFreeKey`] when that key is already taken.
    fn insert_before(&mut self, cursor: &mut TreeCursor, value: Element) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;

        let key = match cursor.position {
            Position::BeforeFirst => return Ok(()),
            Position::PastRear => self.key_after_max()?,
            Position::At(node_idx) => {
                let key = self
                    .node(node_idx)
                    .key
                    .checked_sub(1)
                    .ok_or(Error::NoFreeKey)?;

                if self.contains_key(key) {
                    return Err(Error::NoFreeKey);
                }

                key
            }
        };

        self.insert(key, value)?;
        let node_idx = self.find_node(key);
        self.resync(cursor, Position::At(node_idx));

        Ok(())
    }

    fn delete_front(&mut self) -> Option<Element> {
        self.pop_first().map(|(_, value)| value)
    }

    fn delete_rear(&mut self) -> Option<Element> {
        self.pop_last().map(|(_, value)| value)
    }

    fn delete_at(&mut self, cursor: &mut TreeCursor) -> Result<Option<Element>, Error> {
        self.version.check(cursor.stamp)?;

        let Position::At(node_idx) = cursor.position else {
            return Ok(None);
        };

        let next = self.successor(node_idx);
        let next_key = (!next.is_nil()).then(|| self.node(next).key);

        let (_, value) = self.remove_node(node_idx);

        // the successor's entry may have moved into `node_idx`
        let position = match next_key {
            Some(key) => Position::At(self.find_node(key)),
            None => Position::PastRear,
        };
        self.resync(cursor, position);

        Ok(Some(value))
    }
}
