//! The `utils` module collects the pieces shared across the crate that are not
//! part of the dispatch engine itself: error types and logging setup.

pub mod error;
pub mod logging;

pub use error::{DispatchError, DispatchResult, ListenerError};
