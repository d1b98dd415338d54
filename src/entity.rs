//! Entities and their attribute proxies.
//!
//! An entity is anything with a stable id and a schema. It owns one proxy per
//! declared attribute and hands them out by name, which is all the preload
//! engine needs to attach a batch.
//!
//! Entities with a fixed shape can keep their proxies in named fields and
//! implement [`Entity::attribute`] with a `match`. Entities whose shape comes
//! from configuration can keep an [`AttributeSet`] bound from their schema.

use crate::attribute::{Counter, List, Map, PreloadTarget, Set, SortedSet, Value};
use crate::key::AttributeKey;
use crate::schema::{AttributeKind, EntitySchema};
use crate::store::SharedStore;
use derive_more::{Display, From, Into};
use std::sync::Arc;

/// Stable identifier of an entity, as it appears in its store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, From, Into)]
pub struct EntityId(String);

impl EntityId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

/// A record whose attributes live in the attribute store.
pub trait Entity {
    fn entity_id(&self) -> EntityId;

    /// The schema every entity of this type shares.
    fn schema(&self) -> &EntitySchema;

    /// The proxy for `name`, if this entity exposes one.
    fn attribute(&self, name: &str) -> Option<AttributeHandle<'_>>;
}

/// Borrowed view of one proxy of any kind.
#[derive(Debug, Clone, Copy, From)]
pub enum AttributeHandle<'a> {
    Counter(&'a Counter),
    Value(&'a Value),
    List(&'a List),
    Set(&'a Set),
    SortedSet(&'a SortedSet),
    Map(&'a Map),
}

impl AttributeHandle<'_> {
    pub fn kind(&self) -> AttributeKind {
        match self {
            Self::Counter(a) => a.binding_kind(),
            Self::Value(a) => a.binding_kind(),
            Self::List(a) => a.binding_kind(),
            Self::Set(a) => a.binding_kind(),
            Self::SortedSet(a) => a.binding_kind(),
            Self::Map(a) => a.binding_kind(),
        }
    }

    pub fn key(&self) -> &AttributeKey {
        match self {
            Self::Counter(a) => a.key(),
            Self::Value(a) => a.key(),
            Self::List(a) => a.key(),
            Self::Set(a) => a.key(),
            Self::SortedSet(a) => a.key(),
            Self::Map(a) => a.key(),
        }
    }

    pub(crate) fn target(&self) -> Arc<dyn PreloadTarget> {
        match self {
            Self::Counter(a) => a.target(),
            Self::Value(a) => a.target(),
            Self::List(a) => a.target(),
            Self::Set(a) => a.target(),
            Self::SortedSet(a) => a.target(),
            Self::Map(a) => a.target(),
        }
    }
}

/// An owned proxy of any kind.
#[derive(Debug, From)]
pub enum AnyAttribute {
    Counter(Counter),
    Value(Value),
    List(List),
    Set(Set),
    SortedSet(SortedSet),
    Map(Map),
}

impl AnyAttribute {
    /// Create the proxy type matching `kind`.
    pub fn bind(store: SharedStore, key: AttributeKey, kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Counter => Counter::new(store, key).into(),
            AttributeKind::Value => Value::new(store, key).into(),
            AttributeKind::List => List::new(store, key).into(),
            AttributeKind::Set => Set::new(store, key).into(),
            AttributeKind::SortedSet => SortedSet::new(store, key).into(),
            AttributeKind::Map => Map::new(store, key).into(),
        }
    }

    pub fn as_handle(&self) -> AttributeHandle<'_> {
        match self {
            Self::Counter(a) => a.into(),
            Self::Value(a) => a.into(),
            Self::List(a) => a.into(),
            Self::Set(a) => a.into(),
            Self::SortedSet(a) => a.into(),
            Self::Map(a) => a.into(),
        }
    }
}

/// Every proxy of one entity, created from its schema.
#[derive(Debug)]
pub struct AttributeSet {
    schema: Arc<EntitySchema>,
    attributes: Vec<(String, AnyAttribute)>,
}

impl AttributeSet {
    /// One proxy per attribute the schema declares, keyed under `id`.
    pub fn bind(store: &SharedStore, schema: Arc<EntitySchema>, id: &EntityId) -> Self {
        let attributes = schema
            .attributes()
            .iter()
            .map(|descriptor| {
                let key = AttributeKey::new(schema.namespace(), id, &descriptor.name);
                let attribute = AnyAttribute::bind(Arc::clone(store), key, descriptor.kind);
                (descriptor.name.clone(), attribute)
            })
            .collect();
        Self { schema, attributes }
    }

    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<AttributeHandle<'_>> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, attribute)| attribute.as_handle())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(name, _)| name.as_str())
    }

    pub fn counter(&self, name: &str) -> Option<&Counter> {
        match self.get(name)? {
            AttributeHandle::Counter(a) => Some(a),
            _ => None,
        }
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.get(name)? {
            AttributeHandle::Value(a) => Some(a),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&List> {
        match self.get(name)? {
            AttributeHandle::List(a) => Some(a),
            _ => None,
        }
    }

    pub fn set(&self, name: &str) -> Option<&Set> {
        match self.get(name)? {
            AttributeHandle::Set(a) => Some(a),
            _ => None,
        }
    }

    pub fn sorted_set(&self, name: &str) -> Option<&SortedSet> {
        match self.get(name)? {
            AttributeHandle::SortedSet(a) => Some(a),
            _ => None,
        }
    }

    pub fn map(&self, name: &str) -> Option<&Map> {
        match self.get(name)? {
            AttributeHandle::Map(a) => Some(a),
            _ => None,
        }
    }
}
