use alloc::collections::TryReserveError;

/// Failures reported by sequence operations.
///
/// Looking up or removing a key that is not stored is not an error: those
/// calls simply return `None`.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("sequence handle is not live")]
    InvalidHandle,
    #[error("cursor is stale or belongs to another sequence")]
    InvalidIterator,
    #[error("allocation failed")]
    OutOfMemory,
    #[error("no free key at the requested position")]
    NoFreeKey,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::OutOfMemory
    }
}
