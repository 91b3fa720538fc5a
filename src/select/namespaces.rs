use std::collections::HashMap;

/// Resolves the namespace prefixes used in selector text (`soap:Body`) to namespace URIs.
///
/// Selectors are parsed against a lookup supplied by the caller; the document's own prefix bindings play no part,
/// since the same URI may be bound to different prefixes in different documents.
pub trait NamespaceLookup {
    fn namespace_uri(&self, prefix: &str) -> Option<&str>;
}

/// A simple prefix-to-URI table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespaces {
    by_prefix: HashMap<String, String>,
}

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `prefix` to `uri`, replacing any previous binding.
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) {
        self.by_prefix.insert(prefix.into(), uri.into());
    }

    /// Builder-style version of [`Self::insert`].
    pub fn with(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.insert(prefix, uri);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

impl NamespaceLookup for Namespaces {
    fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.by_prefix.get(prefix).map(String::as_str)
    }
}

impl NamespaceLookup for HashMap<String, String> {
    fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.get(prefix).map(String::as_str)
    }
}
