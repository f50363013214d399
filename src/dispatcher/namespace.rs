//! Namespace expansion
//!
//! On publish, a topic is expanded into the ordered list of namespaces to
//! deliver to, coarsest first. The default policy cuts the topic at each
//! separator: `"parent:child:event"` becomes
//! `["parent", "parent:child", "parent:child:event"]`.
//!
//! Subscriptions never expand. A listener on `"parent:child"` only hears a
//! publish whose expansion contains `"parent:child"` verbatim.

/// Strategy for turning a published topic into the namespaces it reaches.
///
/// The returned list is used as-is, in order. Any
/// `Fn(&str) -> Vec<String>` closure is a policy.
pub trait NamespacePolicy: Send + Sync {
    fn expand(&self, topic: &str) -> Vec<String>;
}

impl<F> NamespacePolicy for F
where
    F: Fn(&str) -> Vec<String> + Send + Sync,
{
    fn expand(&self, topic: &str) -> Vec<String> {
        self(topic)
    }
}

pub const DEFAULT_SEPARATOR: char = ':';

/// Cuts the topic before every occurrence of `separator`.
///
/// Consecutive or leading separators are not collapsed: `"a::b"` expands to
/// `["a", "a:", "a::b"]` and `":a"` to `["", ":a"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeparatorNamespace {
    pub separator: char,
}

impl SeparatorNamespace {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }
}

impl Default for SeparatorNamespace {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl NamespacePolicy for SeparatorNamespace {
    fn expand(&self, topic: &str) -> Vec<String> {
        let mut namespaces: Vec<String> = topic
            .match_indices(self.separator)
            .map(|(idx, _)| topic[..idx].to_string())
            .collect();
        namespaces.push(topic.to_string());
        namespaces
    }
}

/// Delivers only to the exact topic published.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatNamespace;

impl NamespacePolicy for FlatNamespace {
    fn expand(&self, topic: &str) -> Vec<String> {
        vec![topic.to_string()]
    }
}
