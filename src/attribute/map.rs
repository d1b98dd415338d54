//! String-to-string map attribute.

use super::{attribute_common, Binding};
use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use crate::store::WriteCommand;
use std::collections::BTreeMap;

/// Field/value pairs. A missing key reads as an empty map.
#[derive(Debug)]
pub struct Map {
    inner: Binding<BTreeMap<String, String>>,
}

attribute_common!(Map, AttributeKind::Map);

impl Map {
    pub fn all(&self) -> PreloadResult<BTreeMap<String, String>> {
        self.inner.read(Clone::clone)
    }

    /// Value of one field; the field is looked up by its string form.
    pub fn get(&self, field: impl ToString) -> PreloadResult<Option<String>> {
        let field = field.to_string();
        self.inner.read(|fields| fields.get(&field).cloned())
    }

    /// Field names, sorted by name rather than in the store's reply order.
    pub fn keys(&self) -> PreloadResult<Vec<String>> {
        self.inner.read(|fields| fields.keys().cloned().collect())
    }

    /// Values in the order of their sorted field names.
    pub fn values(&self) -> PreloadResult<Vec<String>> {
        self.inner.read(|fields| fields.values().cloned().collect())
    }

    pub fn len(&self) -> PreloadResult<usize> {
        self.inner.read(BTreeMap::len)
    }

    pub fn is_empty(&self) -> PreloadResult<bool> {
        self.inner.read(BTreeMap::is_empty)
    }

    /// Set one field in the store; `true` when the field is new.
    pub fn insert(&self, field: impl ToString, value: impl Into<String>) -> PreloadResult<bool> {
        let added = self.inner.write(WriteCommand::Put {
            key: self.key().as_str().to_string(),
            field: field.to_string(),
            value: value.into(),
        })?;
        Ok(added > 0)
    }
}
