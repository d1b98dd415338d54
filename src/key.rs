//! Store key construction.
//!
//! Every externally stored attribute lives under `namespace:id:attribute`.
//! The same layout is used by the batch strategies and by direct
//! (unpreloaded) reads, so both paths always address the same key.

use std::fmt;

/// Separator between the key segments.
pub const KEY_SEPARATOR: char = ':';

/// Builds the store key for one attribute of one entity.
///
/// Pure and deterministic: identical inputs always give identical keys.
///
/// ```
/// use preload_store::key::build_key;
///
/// assert_eq!(build_key("widget", &42, "view_count"), "widget:42:view_count");
/// ```
pub fn build_key(namespace: &str, id: &impl fmt::Display, attribute: &str) -> String {
    format!("{namespace}{KEY_SEPARATOR}{id}{KEY_SEPARATOR}{attribute}")
}

/// The resolved address of one attribute of one entity.
///
/// Proxies carry one of these so they can fall back to a direct read and
/// route writes without consulting the registry again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeKey {
    namespace: String,
    id: String,
    attribute: String,
    key: String,
}

impl AttributeKey {
    pub fn new(namespace: &str, id: &impl fmt::Display, attribute: &str) -> Self {
        let id = id.to_string();
        Self {
            key: build_key(namespace, &id, attribute),
            namespace: namespace.to_string(),
            id,
            attribute: attribute.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// The full store key.
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for AttributeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for AttributeKey {
    fn as_ref(&self) -> &str {
        &self.key
    }
}
