//! Log records and usage diagnostics.
//!
//! When a log sink is configured, every `sub`, `unsub` and `pub` that passes
//! argument validation produces one [`LogRecord`]. Under
//! `FailurePolicy::Isolate`, a failing listener produces a `listener_failed`
//! record as well.
//!
//! [`Diagnostic`]s flag deprecated or risky call patterns. They are only
//! produced in strict mode and never change control flow.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operation {
    #[serde(rename = "sub")]
    Subscribe,
    #[serde(rename = "unsub")]
    Unsubscribe,
    #[serde(rename = "pub")]
    Publish,
    #[serde(rename = "listener_failed")]
    ListenerFailed,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Subscribe => "sub",
            Operation::Unsubscribe => "unsub",
            Operation::Publish => "pub",
            Operation::ListenerFailed => "listener_failed",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured description of one dispatcher operation.
///
/// - `dispatcher`: id of the dispatcher that ran the operation
/// - `topics`: the topics named by the call (after splitting)
/// - `args`: the remaining call arguments as JSON
/// - `timestamp`: milliseconds since UNIX epoch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub dispatcher: String,
    pub operation: Operation,
    pub topics: Vec<String>,
    pub args: Value,
    pub timestamp: i64,
}

impl LogRecord {
    pub fn new(dispatcher: &str, operation: Operation, topics: Vec<String>, args: Value) -> Self {
        Self {
            dispatcher: dispatcher.to_string(),
            operation,
            topics,
            args,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Deprecated or risky usage detected in strict mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// A context object was bound to a subscription.
    BoundContext { topics: String },
    /// Several topics were given as one whitespace-separated string.
    SpaceSeparatedTopics { topics: String },
    /// A plain subscription to a topic that already has a recorded payload;
    /// the listener will not see it.
    AlreadyPublished { topic: String },
    /// `recoup` replay was requested.
    RecoupDeprecated { topics: String },
    /// `pub` was called with more than one payload value.
    MultiplePayloadValues { topic: String, count: usize },
    /// `unsub` was called without a callback and clears the whole topic.
    UnsubscribeAll { topics: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BoundContext { topics } => write!(
                f,
                "sub(): binding a context is deprecated, capture it in the callback instead. Re: {topics}"
            ),
            Diagnostic::SpaceSeparatedTopics { topics } => write!(
                f,
                "sub(): space-separated topics are deprecated, pass a list of topics instead. Re: {topics}"
            ),
            Diagnostic::AlreadyPublished { topic } => write!(
                f,
                "sub(): topic was already published and the new listener will not receive that payload. Re: {topic}"
            ),
            Diagnostic::RecoupDeprecated { topics } => {
                write!(f, "sub(): recoup replay is deprecated. Re: {topics}")
            }
            Diagnostic::MultiplePayloadValues { topic, count } => write!(
                f,
                "pub(): publishing {count} payload values is deprecated, publish a single value. Re: {topic}"
            ),
            Diagnostic::UnsubscribeAll { topics } => write!(
                f,
                "unsub(): no callback given, removing every listener. Re: {topics}"
            ),
        }
    }
}
