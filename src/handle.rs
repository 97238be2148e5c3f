use alloc::collections::BTreeMap;
use log::debug;

use crate::{Error, Sequence};

/// Opaque name of a sequence stored in a [`SequenceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Handle(u32);

/// Owns sequences on behalf of callers that only keep a [`Handle`].
///
/// Handles are never reused, so operating on a destroyed one reports
/// [`Error::InvalidHandle`] instead of reaching some other sequence.
#[derive(Debug)]
pub struct SequenceTable<S> {
    map: BTreeMap<u32, S>,
    next_key: u32,
}

impl<S: Sequence> SequenceTable<S> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
            next_key: 1,
        }
    }

    /// Creates an empty sequence and returns its handle.
    pub fn create(&mut self) -> Result<Handle, Error> {
        let key = self.next_key;
        self.next_key = key.checked_add(1).ok_or(Error::OutOfMemory)?;

        self.map.insert(key, S::create()?);
        debug!("created sequence handle {key}");

        Ok(Handle(key))
    }

    /// Drops the sequence behind `handle` along with all of its elements.
    pub fn destroy(&mut self, handle: Handle) -> Result<(), Error> {
        self.map.remove(&handle.0).ok_or(Error::InvalidHandle)?;
        debug!("destroyed sequence handle {}", handle.0);

        Ok(())
    }

    pub fn size(&self, handle: Handle) -> Result<usize, Error> {
        self.get(handle).map(S::len)
    }

    pub fn get(&self, handle: Handle) -> Result<&S, Error> {
        self.map.get(&handle.0).ok_or(Error::InvalidHandle)
    }

    pub fn get_mut(&mut self, handle: Handle) -> Result<&mut S, Error> {
        self.map.get_mut(&handle.0).ok_or(Error::InvalidHandle)
    }

    /// Number of live sequences.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl<S: Sequence> Default for SequenceTable<S> {
    fn default() -> Self {
        Self::new()
    }
}
