//! Attribute registry: which externally stored attributes an entity type has
//! and how each one is stored.
//!
//! The preload engine only reads this registry. It decides the fetch strategy
//! for each requested attribute from its [`AttributeKind`]:
//!
//! - scalar kinds (`counter`, `value`) are fetched with one multi-get
//! - structured kinds (`list`, `set`, `sorted_set`, `map`) need a
//!   type-specific read command each and are sent as one pipeline
//!
//! Schemas can be declared in code:
//!
//! ```
//! use preload_store::schema::{AttributeKind, EntitySchema};
//!
//! let schema = EntitySchema::new("widget")
//!     .counter("view_count")
//!     .list("recent_ids")
//!     .map("metadata");
//!
//! assert_eq!(schema.kind_of("view_count"), Some(AttributeKind::Counter));
//! assert_eq!(schema.kind_of("missing"), None);
//! ```
//!
//! or loaded from TOML:
//!
//! ```toml
//! namespace = "widget"
//!
//! [attributes]
//! view_count = "counter"
//! tag_ids = "set"
//! metadata = "hash_key"
//! ```

use crate::error::{PreloadError, PreloadResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Storage kind of one attribute.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    /// Integer counter stored as a string
    Counter,
    /// Plain string value
    Value,
    List,
    Set,
    SortedSet,
    /// String to string mapping
    #[strum(to_string = "map", serialize = "hash_key", serialize = "dict")]
    Map,
}

/// How an attribute kind is fetched in a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum StorageClass {
    /// Readable with a single multi-key get
    Scalar,
    /// Needs its own read command per key
    Structured,
}

impl AttributeKind {
    pub fn storage_class(self) -> StorageClass {
        match self {
            AttributeKind::Counter | AttributeKind::Value => StorageClass::Scalar,
            AttributeKind::List
            | AttributeKind::Set
            | AttributeKind::SortedSet
            | AttributeKind::Map => StorageClass::Structured,
        }
    }

    pub fn is_scalar(self) -> bool {
        self.storage_class() == StorageClass::Scalar
    }
}

/// One declared attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub name: String,
    pub kind: AttributeKind,
}

/// The attributes of one entity type plus the key namespace they live under.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntitySchema {
    namespace: String,
    attributes: Vec<AttributeDescriptor>,
}

impl EntitySchema {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            attributes: Vec::new(),
        }
    }

    /// Declare an attribute. Redeclaring a name replaces its kind.
    pub fn attribute(mut self, name: impl Into<String>, kind: AttributeKind) -> Self {
        let name = name.into();
        match self.attributes.iter_mut().find(|d| d.name == name) {
            Some(existing) => existing.kind = kind,
            None => self.attributes.push(AttributeDescriptor { name, kind }),
        }
        self
    }

    pub fn counter(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Counter)
    }

    pub fn value(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Value)
    }

    pub fn list(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::List)
    }

    pub fn set(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Set)
    }

    pub fn sorted_set(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::SortedSet)
    }

    pub fn map(self, name: impl Into<String>) -> Self {
        self.attribute(name, AttributeKind::Map)
    }

    /// Shared key prefix for every attribute of this entity type.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn attributes(&self) -> &[AttributeDescriptor] {
        &self.attributes
    }

    pub fn descriptor(&self, name: &str) -> Option<&AttributeDescriptor> {
        self.attributes.iter().find(|d| d.name == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<AttributeKind> {
        self.descriptor(name).map(|d| d.kind)
    }

    /// Like [`kind_of`](Self::kind_of) but fails for undeclared names.
    pub fn require_kind(&self, name: &str) -> PreloadResult<AttributeKind> {
        self.kind_of(name)
            .ok_or_else(|| PreloadError::UnknownAttribute {
                namespace: self.namespace.clone(),
                attribute: name.to_string(),
            })
    }

    /// Parse a single schema from TOML.
    pub fn from_toml_str(content: &str) -> PreloadResult<Self> {
        let raw: SchemaToml = toml::from_str(content)?;
        raw.into_schema()
    }
}

// =============================================================================
// TOML Representation
// =============================================================================

#[derive(Debug, Deserialize)]
struct SchemaToml {
    namespace: String,
    #[serde(default)]
    attributes: BTreeMap<String, String>,
}

impl SchemaToml {
    fn into_schema(self) -> PreloadResult<EntitySchema> {
        let mut schema = EntitySchema::new(self.namespace);
        for (name, kind) in self.attributes {
            let kind = AttributeKind::from_str(&kind).map_err(|_| {
                PreloadError::Configuration(format!(
                    "Unknown attribute kind '{kind}' for '{name}' in namespace '{}'",
                    schema.namespace
                ))
            })?;
            schema = schema.attribute(name, kind);
        }
        Ok(schema)
    }
}

#[derive(Debug, Deserialize)]
struct RegistryToml {
    #[serde(default)]
    entities: BTreeMap<String, SchemaToml>,
}

// =============================================================================
// Registry
// =============================================================================

/// Schemas for several entity types, keyed by entity type name.
#[derive(Debug, Clone, Default)]
pub struct AttributeRegistry {
    schemas: HashMap<String, Arc<EntitySchema>>,
}

impl AttributeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity_type: impl Into<String>, schema: EntitySchema) -> Arc<EntitySchema> {
        let schema = Arc::new(schema);
        self.schemas.insert(entity_type.into(), Arc::clone(&schema));
        schema
    }

    pub fn schema(&self, entity_type: &str) -> Option<Arc<EntitySchema>> {
        self.schemas.get(entity_type).cloned()
    }

    pub fn namespace_for(&self, entity_type: &str) -> Option<&str> {
        self.schemas.get(entity_type).map(|s| s.namespace())
    }

    pub fn attribute_kind(&self, entity_type: &str, attribute: &str) -> Option<AttributeKind> {
        self.schemas.get(entity_type)?.kind_of(attribute)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    /// Parse a registry of the form `[entities.<type>]` from TOML.
    ///
    /// ```
    /// use preload_store::schema::{AttributeKind, AttributeRegistry};
    ///
    /// let registry = AttributeRegistry::from_toml_str(r#"
    ///     [entities.article]
    ///     namespace = "article"
    ///     attributes = { view_count = "counter", cached_summary = "value" }
    /// "#).unwrap();
    ///
    /// assert_eq!(registry.namespace_for("article"), Some("article"));
    /// assert_eq!(
    ///     registry.attribute_kind("article", "view_count"),
    ///     Some(AttributeKind::Counter)
    /// );
    /// ```
    pub fn from_toml_str(content: &str) -> PreloadResult<Self> {
        let raw: RegistryToml = toml::from_str(content)?;
        let mut registry = Self::new();
        for (entity_type, schema) in raw.entities {
            registry.register(entity_type, schema.into_schema()?);
        }
        debug!(
            "AttributeRegistry: Loaded {} entity schemas",
            registry.schemas.len()
        );
        Ok(registry)
    }

    /// Load a registry from a TOML file.
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> PreloadResult<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| {
            PreloadError::Configuration(format!(
                "Failed to read registry file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }
}
