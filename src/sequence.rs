use core::fmt::Debug;
use core::sync::atomic::{AtomicU64, Ordering};

use crate::{Element, Error};

static NEXT_OWNER: AtomicU64 = AtomicU64::new(1);

/// Identity of a container at the moment a cursor was taken from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Stamp {
    owner: u64,
    generation: u64,
}

/// Owner id plus structural generation of a container.
///
/// Every structural mutation bumps the generation, which turns every cursor
/// stamped before it into an invalid iterator. Cursors are never repaired
/// behind the caller's back.
#[derive(Debug)]
pub(crate) struct Version {
    owner: u64,
    generation: u64,
}

impl Version {
    pub(crate) fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            generation: 0,
        }
    }

    pub(crate) fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub(crate) fn stamp(&self) -> Stamp {
        Stamp {
            owner: self.owner,
            generation: self.generation,
        }
    }

    pub(crate) fn is_current(&self, stamp: Stamp) -> bool {
        stamp.owner == self.owner && stamp.generation == self.generation
    }

    pub(crate) fn check(&self, stamp: Stamp) -> Result<(), Error> {
        if self.is_current(stamp) {
            Ok(())
        } else {
            Err(Error::InvalidIterator)
        }
    }
}

/// The contract shared by every sequence backend.
///
/// A sequence is a position-addressable container navigated through cursors.
/// A cursor is always in exactly one of three states: before the first
/// element, on an element, or past the last element. Cursors do not borrow
/// the sequence; any structural mutation invalidates the cursors taken
/// before it, except the one handed to a positional mutation, which is
/// re-stamped and keeps working.
///
/// Stale or foreign cursors make navigation and mutation fail with
/// [`Error::InvalidIterator`], state queries answer `false` and dereferencing
/// yields `None`.
pub trait Sequence: Sized {
    type Cursor: Clone + Debug;

    /// Creates an empty sequence, reporting allocation failure.
    fn create() -> Result<Self, Error>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cursor on the element addressed by `index`.
    fn cursor_at(&self, index: isize) -> Self::Cursor;

    /// Cursor on the first element, or past the rear if the sequence is empty.
    fn front(&self) -> Self::Cursor;

    fn past_rear(&self) -> Self::Cursor;

    fn is_dereferencable(&self, cursor: &Self::Cursor) -> bool;

    fn is_past_rear(&self, cursor: &Self::Cursor) -> bool;

    fn is_before_first(&self, cursor: &Self::Cursor) -> bool;

    /// Moves one element toward the rear. No-op past the rear.
    fn advance(&self, cursor: &mut Self::Cursor) -> Result<(), Error>;

    /// Moves one element toward the front. No-op before the first element.
    fn rewind(&self, cursor: &mut Self::Cursor) -> Result<(), Error>;

    /// Applies `delta` single steps, advancing when positive and rewinding
    /// when negative. Steps past a boundary are absorbed.
    fn shift(&self, cursor: &mut Self::Cursor, delta: isize) -> Result<(), Error> {
        for _ in 0..delta.unsigned_abs() {
            if delta > 0 {
                self.advance(cursor)?;
                if self.is_past_rear(cursor) {
                    break;
                }
            } else {
                self.rewind(cursor)?;
                if self.is_before_first(cursor) {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Moves the cursor to the `index`-th element counted from the front.
    fn set_position(&self, cursor: &mut Self::Cursor, index: isize) -> Result<(), Error>;

    fn dereference(&self, cursor: &Self::Cursor) -> Option<&Element>;

    fn dereference_mut(&mut self, cursor: &Self::Cursor) -> Option<&mut Element>;

    fn insert_front(&mut self, value: Element) -> Result<(), Error>;

    fn insert_rear(&mut self, value: Element) -> Result<(), Error>;

    /// Inserts `value` right before the cursor and leaves the cursor on the
    /// new element. No-op when the cursor is before the first element.
    fn insert_before(&mut self, cursor: &mut Self::Cursor, value: Element) -> Result<(), Error>;

    fn delete_front(&mut self) -> Option<Element>;

    fn delete_rear(&mut self) -> Option<Element>;

    /// Removes the element under the cursor and moves the cursor to the
    /// element that followed it. No-op when the cursor is not dereferencable.
    fn delete_at(&mut self, cursor: &mut Self::Cursor) -> Result<Option<Element>, Error>;
}
