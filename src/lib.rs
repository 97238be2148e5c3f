//! Interchangeable linear sequence containers.
//!
//! Every backend implements [`Sequence`]: a container addressed through
//! cursors that sit before the first element, on an element, or past the
//! last one. [`AvlTree`] additionally stores its elements under integer keys
//! and keeps them sorted; [`FixedArray`], [`DynArray`] and [`List`] keep
//! insertion order.
//!
//! ```
//! use linseq::{AvlTree, Sequence};
//!
//! let mut tree = AvlTree::new();
//! for key in [5, 3, 8] {
//!     tree.insert(key, key * 10).unwrap();
//! }
//!
//! let mut cursor = tree.front();
//! assert_eq!(tree.key(&cursor), Some(3));
//! tree.advance(&mut cursor).unwrap();
//! assert_eq!(tree.dereference(&cursor), Some(&50));
//! ```
//!
//! None of the containers synchronise access. Cursors do not borrow their
//! container: a structural change makes older cursors stale, and stale
//! cursors are rejected rather than repaired.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

mod array;
mod cursor;
mod error;
mod handle;
mod iter;
mod list;
mod node;
mod sequence;
mod tree;

pub use array::{ArrayCursor, ArraySequence, DoublingGrowth, DynArray, FixedArray, GrowthPolicy, StepGrowth};
pub use cursor::TreeCursor;
pub use error::Error;
pub use handle::{Handle, SequenceTable};
pub use iter::Iter;
pub use list::{List, ListCursor, ListIter};
pub use sequence::Sequence;
pub use tree::AvlTree;

/// The element type stored by every sequence.
pub type Element = i32;

/// Key type of the [`AvlTree`] backend.
pub type Key = i32;
