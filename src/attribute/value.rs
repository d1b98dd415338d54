//! Plain string attribute.

use super::{attribute_common, Binding};
use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use crate::store::WriteCommand;

/// A single string value. A missing key reads as `None`.
#[derive(Debug)]
pub struct Value {
    inner: Binding<Option<String>>,
}

attribute_common!(Value, AttributeKind::Value);

impl Value {
    pub fn value(&self) -> PreloadResult<Option<String>> {
        self.inner.read(Clone::clone)
    }

    pub fn is_nil(&self) -> PreloadResult<bool> {
        self.inner.read(Option::is_none)
    }

    pub fn set(&self, value: impl Into<String>) -> PreloadResult<()> {
        self.inner.write(WriteCommand::Set {
            key: self.key().as_str().to_string(),
            value: value.into(),
        })?;
        Ok(())
    }
}
