use core::marker::PhantomData;

use alloc::vec::Vec;
use log::debug;

use crate::sequence::{Stamp, Version};
use crate::{Element, Error, Sequence};

/// Decides how much room an [`ArraySequence`] reserves.
pub trait GrowthPolicy {
    const INITIAL_CAPACITY: usize;

    /// Capacity to move to when a full array needs one more slot.
    fn grown(capacity: usize) -> Option<usize>;

    /// Capacity to move to after an element was removed.
    fn shrunk(_len: usize, capacity: usize) -> usize {
        capacity
    }
}

/// Starts with ten slots and adds exactly one whenever the array is full.
#[derive(Debug)]
pub struct StepGrowth;

impl GrowthPolicy for StepGrowth {
    const INITIAL_CAPACITY: usize = 10;

    fn grown(capacity: usize) -> Option<usize> {
        capacity.checked_add(1)
    }
}

/// Starts with one slot, doubles when full and halves once less than a
/// quarter of the slots are used.
#[derive(Debug)]
pub struct DoublingGrowth;

impl DoublingGrowth {
    const FACTOR: usize = 2;
    const SHRINK_BELOW: usize = 4;
}

impl GrowthPolicy for DoublingGrowth {
    const INITIAL_CAPACITY: usize = 1;

    fn grown(capacity: usize) -> Option<usize> {
        capacity.checked_mul(Self::FACTOR)
    }

    fn shrunk(len: usize, capacity: usize) -> usize {
        if len.saturating_mul(Self::SHRINK_BELOW) < capacity {
            (capacity / Self::FACTOR).max(1)
        } else {
            capacity
        }
    }
}

/// Array that grows one slot at a time.
pub type FixedArray = ArraySequence<StepGrowth>;

/// Array that resizes geometrically in both directions.
pub type DynArray = ArraySequence<DoublingGrowth>;

/// A contiguous sequence. Insertions and removals shift the tail.
#[derive(Debug)]
pub struct ArraySequence<G> {
    data: Vec<Element>,
    capacity: usize,
    version: Version,
    _growth: PhantomData<G>,
}

/// Signed index into an [`ArraySequence`]. `-1` is before the first
/// element and `len` is past the rear.
#[derive(Debug, Clone)]
pub struct ArrayCursor {
    stamp: Stamp,
    index: isize,
}

impl<G: GrowthPolicy> ArraySequence<G> {
    /// Slots currently set aside, as dictated by the growth policy.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Element] {
        &self.data
    }

    fn end(&self) -> isize {
        self.data.len() as isize
    }

    fn clamp(&self, index: isize) -> isize {
        index.clamp(-1, self.end())
    }

    fn cursor(&self, index: isize) -> ArrayCursor {
        ArrayCursor {
            stamp: self.version.stamp(),
            index,
        }
    }

    fn slot(&self, cursor: &ArrayCursor) -> Option<usize> {
        if !self.version.is_current(cursor.stamp) {
            return None;
        }

        usize::try_from(cursor.index)
            .ok()
            .filter(|&index| index < self.data.len())
    }

    fn insert_at(&mut self, index: usize, value: Element) -> Result<(), Error> {
        if self.data.len() == self.capacity {
            let grown = G::grown(self.capacity).ok_or(Error::OutOfMemory)?;
            self.data.try_reserve_exact(grown - self.data.len())?;

            debug!("growing array from {} to {} slots", self.capacity, grown);
            self.capacity = grown;
        }

        self.data.insert(index, value);
        self.version.bump();

        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Element {
        let value = self.data.remove(index);
        self.version.bump();

        let shrunk = G::shrunk(self.data.len(), self.capacity);
        if shrunk < self.capacity {
            debug!("shrinking array from {} to {} slots", self.capacity, shrunk);
            self.data.shrink_to(shrunk);
            self.capacity = shrunk;
        }

        value
    }
}

impl<G: GrowthPolicy> Sequence for ArraySequence<G> {
    type Cursor = ArrayCursor;

    fn create() -> Result<Self, Error> {
        let mut data = Vec::new();
        data.try_reserve_exact(G::INITIAL_CAPACITY)?;

        Ok(Self {
            data,
            capacity: G::INITIAL_CAPACITY,
            version: Version::new(),
            _growth: PhantomData,
        })
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn cursor_at(&self, index: isize) -> ArrayCursor {
        self.cursor(self.clamp(index))
    }

    fn front(&self) -> ArrayCursor {
        self.cursor(0)
    }

    fn past_rear(&self) -> ArrayCursor {
        self.cursor(self.end())
    }

    fn is_dereferencable(&self, cursor: &ArrayCursor) -> bool {
        self.slot(cursor).is_some()
    }

    fn is_past_rear(&self, cursor: &ArrayCursor) -> bool {
        self.version.is_current(cursor.stamp) && cursor.index >= self.end()
    }

    fn is_before_first(&self, cursor: &ArrayCursor) -> bool {
        self.version.is_current(cursor.stamp) && cursor.index < 0
    }

    fn advance(&self, cursor: &mut ArrayCursor) -> Result<(), Error> {
        self.shift(cursor, 1)
    }

    fn rewind(&self, cursor: &mut ArrayCursor) -> Result<(), Error> {
        self.shift(cursor, -1)
    }

    fn shift(&self, cursor: &mut ArrayCursor, delta: isize) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;
        cursor.index = self.clamp(cursor.index.saturating_add(delta));

        Ok(())
    }

    fn set_position(&self, cursor: &mut ArrayCursor, index: isize) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;
        cursor.index = self.clamp(index);

        Ok(())
    }

    fn dereference(&self, cursor: &ArrayCursor) -> Option<&Element> {
        self.slot(cursor).map(|index| &self.data[index])
    }

    fn dereference_mut(&mut self, cursor: &ArrayCursor) -> Option<&mut Element> {
        let index = self.slot(cursor)?;

        Some(&mut self.data[index])
    }

    fn insert_front(&mut self, value: Element) -> Result<(), Error> {
        self.insert_at(0, value)
    }

    fn insert_rear(&mut self, value: Element) -> Result<(), Error> {
        self.insert_at(self.data.len(), value)
    }

    fn insert_before(&mut self, cursor: &mut ArrayCursor, value: Element) -> Result<(), Error> {
        self.version.check(cursor.stamp)?;

        let Ok(index) = usize::try_from(cursor.index) else {
            return Ok(());
        };

        self.insert_at(index, value)?;
        *cursor = self.cursor(cursor.index);

        Ok(())
    }

    fn delete_front(&mut self) -> Option<Element> {
        if self.data.is_empty() {
            return None;
        }

        Some(self.remove_at(0))
    }

    fn delete_rear(&mut self) -> Option<Element> {
        let last = self.data.len().checked_sub(1)?;

        Some(self.remove_at(last))
    }

    fn delete_at(&mut self, cursor: &mut ArrayCursor) -> Result<Option<Element>, Error> {
        self.version.check(cursor.stamp)?;

        let Some(index) = self.slot(cursor) else {
            return Ok(None);
        };

        let value = self.remove_at(index);
        *cursor = self.cursor(cursor.index);

        Ok(Some(value))
    }
}
