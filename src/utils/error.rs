//! The `error` module defines the error types returned by the dispatcher.
//!
//! Two kinds of failure exist:
//!
//! - `InvalidArgument`: a required topic was missing or empty. It is raised
//!   before any state is touched.
//! - `ListenerFailure`: a listener callback returned an error while being
//!   invoked, either during `publish` or during a `recoup` replay.
//!
//! Deprecation diagnostics are not errors and never show up here; see
//! [`crate::dispatcher::record::Diagnostic`].

use thiserror::Error;

/// Error type a listener callback may fail with.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{operation}() received {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: &'static str,
    },

    #[error("listener on topic '{topic}' failed: {source}")]
    ListenerFailure {
        topic: String,
        #[source]
        source: ListenerError,
    },
}

impl DispatchError {
    pub(crate) fn empty_topic(operation: &'static str) -> Self {
        Self::InvalidArgument {
            operation,
            reason: "an empty topic",
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub fn is_listener_failure(&self) -> bool {
        matches!(self, Self::ListenerFailure { .. })
    }
}
