//! Dispatcher construction options and per-subscription flags.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::dispatcher::namespace::{NamespacePolicy, SeparatorNamespace};
use crate::dispatcher::record::{Diagnostic, LogRecord};

/// Sink invoked with a record of each operation.
pub type LogSink = Arc<dyn Fn(&LogRecord) + Send + Sync>;

/// Sink invoked with each strict-mode diagnostic.
pub type WarningSink = Arc<dyn Fn(&Diagnostic) + Send + Sync>;

/// What happens when a listener returns an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// The error is returned to the caller and remaining deliveries of that
    /// call are skipped.
    #[default]
    Abort,
    /// The error is logged and reported to the log sink; delivery continues.
    Isolate,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Isolate => "isolate",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(FailurePolicy::Abort),
            "isolate" => Ok(FailurePolicy::Isolate),
            other => Err(format!(
                "unknown failure policy '{other}', expected 'abort' or 'isolate'"
            )),
        }
    }
}

/// Configuration for a [`Dispatcher`](crate::dispatcher::Dispatcher).
///
/// Defaults: not strict, `:` namespace separator, no log sink, abort on
/// listener failure.
#[derive(Clone)]
pub struct DispatcherOptions {
    pub strict: bool,
    pub failure_policy: FailurePolicy,
    pub namespace: Arc<dyn NamespacePolicy>,
    pub log: Option<LogSink>,
    pub on_warning: Option<WarningSink>,
}

impl DispatcherOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn separator(self, separator: char) -> Self {
        self.namespace(SeparatorNamespace::new(separator))
    }

    pub fn namespace<P: NamespacePolicy + 'static>(mut self, policy: P) -> Self {
        self.namespace = Arc::new(policy);
        self
    }

    pub fn log<F>(mut self, sink: F) -> Self
    where
        F: Fn(&LogRecord) + Send + Sync + 'static,
    {
        self.log = Some(Arc::new(sink));
        self
    }

    pub fn on_warning<F>(mut self, sink: F) -> Self
    where
        F: Fn(&Diagnostic) + Send + Sync + 'static,
    {
        self.on_warning = Some(Arc::new(sink));
        self
    }
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            strict: false,
            failure_policy: FailurePolicy::default(),
            namespace: Arc::new(SeparatorNamespace::default()),
            log: None,
            on_warning: None,
        }
    }
}

impl fmt::Debug for DispatcherOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatcherOptions")
            .field("strict", &self.strict)
            .field("failure_policy", &self.failure_policy)
            .field("namespace", &"dyn NamespacePolicy")
            .field("log", &self.log.is_some())
            .field("on_warning", &self.on_warning.is_some())
            .finish()
    }
}

/// Behavior flags for a single `sub` call. Both default to false.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubscribeFlags {
    /// Remove the listener after its first handled live delivery.
    pub once: bool,
    /// Replay the topic's last recorded payload right away.
    pub recoup: bool,
}

impl SubscribeFlags {
    pub fn once() -> Self {
        Self {
            once: true,
            recoup: false,
        }
    }

    pub fn recoup() -> Self {
        Self {
            once: false,
            recoup: true,
        }
    }
}
