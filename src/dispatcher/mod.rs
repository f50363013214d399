pub mod engine;
pub mod listener;
pub mod namespace;
pub mod options;
pub mod record;
pub mod topic;

pub use engine::Dispatcher;
pub use listener::{Callback, Context, IntoOutcome, Listener, Outcome, Receiver};
pub use namespace::{FlatNamespace, NamespacePolicy, SeparatorNamespace};
pub use options::{DispatcherOptions, FailurePolicy, LogSink, SubscribeFlags, WarningSink};
pub use record::{Diagnostic, LogRecord, Operation};
pub use topic::{Topic, Topics};

#[cfg(test)]
mod tests;
