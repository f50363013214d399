//! # PubSub
//!
//! `pubsub` is an in-process publish/subscribe dispatcher. Callers register
//! interest in named, optionally namespaced topics, and publishing a topic
//! synchronously invokes every listener of that topic and of its enclosing
//! namespaces.
//!
//! ```rust
//! use pubsub::{Callback, Dispatcher};
//! use serde_json::json;
//!
//! let bus = Dispatcher::new();
//! let greet = Callback::new(|_, args| println!("got {args:?}"));
//! bus.subscribe("user", &greet)?
//!     .publish("user:login", &[json!("ada")])?;
//! # Ok::<(), pubsub::DispatchError>(())
//! ```
//!
//! ## Core Modules
//!
//! - `dispatcher`: the dispatch engine, listener records, namespace expansion
//!   and log records.
//! - `config`: loads dispatcher and logging settings from files and the
//!   environment.
//! - `utils`: error types and logging setup.

pub mod config;
pub mod dispatcher;
pub mod utils;

pub use dispatcher::{
    Callback, Context, Diagnostic, Dispatcher, DispatcherOptions, FailurePolicy, LogRecord,
    NamespacePolicy, Operation, Outcome, Receiver, SeparatorNamespace, SubscribeFlags, Topics,
};
pub use utils::error::{DispatchError, DispatchResult, ListenerError};
