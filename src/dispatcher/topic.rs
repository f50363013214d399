//! Topic management
//!
//! A `Topic` holds the ordered listener list for one exact topic name.
//! Insertion order is delivery order, and registering the same callback twice
//! yields two entries.
//!
//! Concurrency note: callers must synchronize access to `Topic` (the
//! dispatcher keeps every topic behind its state lock) when modifying
//! subscriptions.

use crate::dispatcher::listener::{Callback, Listener};

#[derive(Debug, Default, Clone)]
pub struct Topic {
    pub name: String,
    pub listeners: Vec<Listener>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            listeners: Vec::new(),
        }
    }

    /// Append a listener to the end of the delivery order.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Remove every listener registered with `callback`, whatever its context
    /// or `once` flag. Returns how many entries were dropped.
    pub fn unsubscribe(&mut self, callback: &Callback) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|l| !l.callback.same(callback));
        before - self.listeners.len()
    }

    /// Remove all listeners. Returns how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let removed = self.listeners.len();
        self.listeners.clear();
        removed
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Topic names accepted by `sub` and `unsub`.
///
/// A string is split on whitespace, so `"a b"` names two topics (the
/// deprecated form). A list is taken verbatim, one topic per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topics {
    names: Vec<String>,
    space_separated: bool,
}

impl Topics {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when no usable topic was given: an empty or blank string, an
    /// empty list, or a list containing an empty name.
    pub fn is_blank(&self) -> bool {
        self.is_empty() || self.names.iter().any(|n| n.is_empty())
    }

    /// True when several topics came from one whitespace-separated string.
    pub fn is_space_separated(&self) -> bool {
        self.space_separated && self.names.len() > 1
    }

    pub(crate) fn joined(&self) -> String {
        self.names.join(" ")
    }

    fn from_list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            space_separated: false,
        }
    }
}

impl From<&str> for Topics {
    fn from(value: &str) -> Self {
        Self {
            names: value.split_whitespace().map(str::to_string).collect(),
            space_separated: true,
        }
    }
}

impl From<&String> for Topics {
    fn from(value: &String) -> Self {
        Topics::from(value.as_str())
    }
}

impl From<String> for Topics {
    fn from(value: String) -> Self {
        Topics::from(value.as_str())
    }
}

impl From<Vec<String>> for Topics {
    fn from(value: Vec<String>) -> Self {
        Self::from_list(value)
    }
}

impl From<Vec<&str>> for Topics {
    fn from(value: Vec<&str>) -> Self {
        Self::from_list(value)
    }
}

impl From<&[&str]> for Topics {
    fn from(value: &[&str]) -> Self {
        Self::from_list(value.iter().copied())
    }
}

impl<const N: usize> From<[&str; N]> for Topics {
    fn from(value: [&str; N]) -> Self {
        Self::from_list(value)
    }
}
