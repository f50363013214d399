//! Dispatcher engine
//!
//! This module contains the in-process dispatcher responsible for:
//! - keeping the ordered listener list of every topic
//! - delivering published payloads across the topic's namespaces
//! - remembering the last payload of each namespace for `recoup` replay
//! - dropping `once` listeners after a handled delivery
//!
//! Concurrency and usage notes:
//! - Every call runs synchronously on the caller's thread. Registry and
//!   replay cache sit behind a single lock, which is released before any
//!   callback runs, so listeners may subscribe, unsubscribe or publish from
//!   inside a delivery.
//! - Delivery to a namespace works on a snapshot of its listeners. A
//!   listener removed mid-delivery still receives the in-flight payload, and
//!   a listener added mid-delivery waits for the next publish.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Value, json};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::dispatcher::listener::{Callback, Context, Listener, Outcome};
use crate::dispatcher::options::{DispatcherOptions, FailurePolicy, SubscribeFlags};
use crate::dispatcher::record::{Diagnostic, LogRecord, Operation};
use crate::dispatcher::topic::{Topic, Topics};
use crate::utils::error::{DispatchError, DispatchResult, ListenerError};

#[derive(Debug, Default)]
struct State {
    topics: HashMap<String, Topic>,
    last_payloads: HashMap<String, Arc<[Value]>>,
}

pub struct Dispatcher {
    id: String,
    options: DispatcherOptions,
    state: Mutex<State>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("id", &self.id)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::with_options(DispatcherOptions::default())
    }

    pub fn with_options(options: DispatcherOptions) -> Self {
        Self {
            id: format!("dispatcher-{}", Uuid::new_v4()),
            options,
            state: Mutex::new(State::default()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> &DispatcherOptions {
        &self.options
    }

    /// Namespaces a publish on `topic` is delivered to, coarsest first.
    pub fn event_namespace(&self, topic: &str) -> Vec<String> {
        self.options.namespace.expand(topic)
    }

    /// Subscribes `callback` to every topic in `topics`.
    pub fn subscribe(
        &self,
        topics: impl Into<Topics>,
        callback: &Callback,
    ) -> DispatchResult<&Self> {
        self.subscribe_with(topics, callback, None, SubscribeFlags::default())
    }

    /// Subscribes `callback` to each topic once-only: after the first live
    /// delivery it does not decline, every registration of `callback` on that
    /// namespace is removed, including ones made without `once`.
    ///
    /// While a delivery to the listener is in progress, other deliveries
    /// (nested or from another thread) skip it.
    pub fn once(&self, topics: impl Into<Topics>, callback: &Callback) -> DispatchResult<&Self> {
        self.subscribe_with(topics, callback, None, SubscribeFlags::once())
    }

    /// Subscribes `callback` and immediately replays the last payload of each
    /// topic that has one.
    pub fn recoup(&self, topics: impl Into<Topics>, callback: &Callback) -> DispatchResult<&Self> {
        self.subscribe_with(topics, callback, None, SubscribeFlags::recoup())
    }

    /// Appends a listener for `callback` to each topic in `topics`.
    ///
    /// With `flags.recoup`, a topic that already has a recorded payload
    /// triggers an immediate call with it. That replay ignores the callback's
    /// outcome, so a `once` listener stays subscribed until a live delivery.
    pub fn subscribe_with(
        &self,
        topics: impl Into<Topics>,
        callback: &Callback,
        context: Option<Context>,
        flags: SubscribeFlags,
    ) -> DispatchResult<&Self> {
        let topics = topics.into();
        if topics.is_blank() {
            return Err(DispatchError::empty_topic("sub"));
        }

        if context.is_some() {
            self.diagnose(|| Diagnostic::BoundContext {
                topics: topics.joined(),
            });
        }
        if topics.is_space_separated() {
            self.diagnose(|| Diagnostic::SpaceSeparatedTopics {
                topics: topics.joined(),
            });
        }
        if flags.recoup {
            self.diagnose(|| Diagnostic::RecoupDeprecated {
                topics: topics.joined(),
            });
        }

        self.record(Operation::Subscribe, topics.names(), || {
            json!({
                "once": flags.once,
                "recoup": flags.recoup,
                "context": context.is_some(),
            })
        });
        debug!(
            dispatcher = %self.id,
            topics = %topics.joined(),
            count = topics.len(),
            once = flags.once,
            recoup = flags.recoup,
            "sub"
        );

        for name in topics.names() {
            let listener = Listener::new(callback.clone(), context.clone(), flags.once);
            let replay = {
                let mut state = self.state();
                state
                    .topics
                    .entry(name.clone())
                    .or_insert_with(|| Topic::new(name))
                    .subscribe(listener.clone());
                state.last_payloads.get(name).cloned()
            };

            match replay {
                Some(args) if flags.recoup => {
                    debug!(dispatcher = %self.id, topic = %name, "replaying last payload");
                    if let Err(source) = listener.invoke(self, &args) {
                        self.listener_failed(name, source)?;
                    }
                }
                Some(_) => self.diagnose(|| Diagnostic::AlreadyPublished {
                    topic: name.clone(),
                }),
                None => {}
            }
        }

        Ok(self)
    }

    /// Removes listeners from each topic in `topics`, matching topic names
    /// exactly.
    ///
    /// With a callback, every listener registered with it goes. Without one,
    /// the topic is cleared.
    pub fn unsubscribe(
        &self,
        topics: impl Into<Topics>,
        callback: Option<&Callback>,
    ) -> DispatchResult<&Self> {
        let topics = topics.into();
        if topics.is_blank() {
            return Err(DispatchError::empty_topic("unsub"));
        }

        if callback.is_none() {
            self.diagnose(|| Diagnostic::UnsubscribeAll {
                topics: topics.joined(),
            });
        }

        self.record(Operation::Unsubscribe, topics.names(), || {
            json!({ "callback": callback.is_some() })
        });

        for name in topics.names() {
            let removed = self.remove(name, callback);
            debug!(dispatcher = %self.id, topic = %name, removed, "unsub");
        }

        Ok(self)
    }

    /// Delivers `payload` to every listener of every namespace of `topic`.
    ///
    /// Namespaces are visited coarsest first. Each one is fully delivered,
    /// and its payload recorded, before the next begins.
    pub fn publish(&self, topic: &str, payload: &[Value]) -> DispatchResult<&Self> {
        if topic.is_empty() {
            return Err(DispatchError::empty_topic("pub"));
        }

        if payload.len() > 1 {
            self.diagnose(|| Diagnostic::MultiplePayloadValues {
                topic: topic.to_string(),
                count: payload.len(),
            });
        }

        self.record(Operation::Publish, &[topic.to_string()], || {
            Value::Array(payload.to_vec())
        });
        debug!(dispatcher = %self.id, topic, values = payload.len(), "pub");

        let args: Arc<[Value]> = Arc::from(payload);
        for namespace in self.event_namespace(topic) {
            self.deliver(&namespace, &args)?;
            self.state().last_payloads.insert(namespace, args.clone());
        }

        Ok(self)
    }

    /// Number of listeners currently registered on exactly `topic`.
    pub fn listener_count(&self, topic: &str) -> usize {
        self.state().topics.get(topic).map_or(0, Topic::len)
    }

    pub fn has_listeners(&self, topic: &str) -> bool {
        self.listener_count(topic) > 0
    }

    /// The payload most recently recorded for exactly `topic`.
    pub fn last_payload(&self, topic: &str) -> Option<Vec<Value>> {
        self.state()
            .last_payloads
            .get(topic)
            .map(|args| args.to_vec())
    }

    /// Topics that currently have at least one listener, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state()
            .topics
            .values()
            .filter(|t| !t.is_empty())
            .map(|t| t.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Drops every subscription and every recorded payload.
    pub fn clear(&self) {
        let mut state = self.state();
        state.topics.clear();
        state.last_payloads.clear();
        debug!(dispatcher = %self.id, "cleared");
    }

    fn deliver(&self, namespace: &str, args: &[Value]) -> DispatchResult<()> {
        let snapshot: Vec<Listener> = self
            .state()
            .topics
            .get(namespace)
            .map(|t| t.listeners.clone())
            .unwrap_or_default();

        for listener in &snapshot {
            if !listener.try_claim() {
                debug!(dispatcher = %self.id, topic = namespace, "once listener already claimed");
                continue;
            }
            match listener.invoke(self, args) {
                Ok(Outcome::Handled) if listener.once => {
                    self.remove(namespace, Some(&listener.callback));
                }
                Ok(Outcome::Declined) => listener.release(),
                Ok(Outcome::Handled) => {}
                Err(source) => {
                    listener.release();
                    self.listener_failed(namespace, source)?;
                }
            }
        }

        Ok(())
    }

    fn remove(&self, topic: &str, callback: Option<&Callback>) -> usize {
        let mut state = self.state();
        match (state.topics.get_mut(topic), callback) {
            (Some(entry), Some(callback)) => entry.unsubscribe(callback),
            (Some(entry), None) => entry.clear(),
            (None, _) => 0,
        }
    }

    fn listener_failed(&self, topic: &str, source: ListenerError) -> DispatchResult<()> {
        match self.options.failure_policy {
            FailurePolicy::Abort => Err(DispatchError::ListenerFailure {
                topic: topic.to_string(),
                source,
            }),
            FailurePolicy::Isolate => {
                error!(dispatcher = %self.id, topic, "listener failed: {source}");
                self.record(Operation::ListenerFailed, &[topic.to_string()], || {
                    json!({ "error": source.to_string() })
                });
                Ok(())
            }
        }
    }

    fn record(&self, operation: Operation, topics: &[String], args: impl FnOnce() -> Value) {
        if let Some(sink) = &self.options.log {
            sink(&LogRecord::new(&self.id, operation, topics.to_vec(), args()));
        }
    }

    fn diagnose(&self, diagnostic: impl FnOnce() -> Diagnostic) {
        if !self.options.strict {
            return;
        }
        let diagnostic = diagnostic();
        warn!(dispatcher = %self.id, "{diagnostic}");
        if let Some(sink) = &self.options.on_warning {
            sink(&diagnostic);
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        // Callbacks never run under the lock, so a poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
