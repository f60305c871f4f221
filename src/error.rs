//! Faults raised while walking a [`Stream`][`crate::Stream`].

use std::error::Error;

/// The error type returned by any stream operation that may force a tail.
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// `head` or `rest` was requested from an empty stream.
    ///
    /// `op` names the operation which reached past the end.
    #[error("accessed empty stream in `{op}`")]
    EmptyAccess { op: &'static str },

    /// A user-supplied callable reported a failure.
    #[error("stream callable failed")]
    Callable(#[source] Box<dyn Error>),
}

impl StreamError {
    /// Wraps the failure of a user-supplied callable.
    pub fn callable(e: impl Into<Box<dyn Error>>) -> Self {
        StreamError::Callable(e.into())
    }

    pub fn is_empty_access(&self) -> bool {
        matches!(self, StreamError::EmptyAccess { .. })
    }
}
