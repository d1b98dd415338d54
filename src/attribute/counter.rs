//! Integer counter attribute.

use super::{attribute_common, Binding};
use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use crate::store::WriteCommand;

/// A counter stored as a decimal string.
///
/// Reads decode leniently: a missing key or a value that does not parse as
/// an integer reads as `0`. Use [`raw`](Self::raw) or [`is_nil`](Self::is_nil)
/// to tell "never set" apart from zero.
#[derive(Debug)]
pub struct Counter {
    inner: Binding<Option<String>>,
}

attribute_common!(Counter, AttributeKind::Counter);

/// Lenient integer view of a raw counter value.
pub(crate) fn to_integer(raw: Option<&str>) -> i64 {
    raw.and_then(|raw| raw.trim().parse().ok()).unwrap_or(0)
}

impl Counter {
    /// Current value, `0` when missing or unparsable.
    pub fn value(&self) -> PreloadResult<i64> {
        self.inner.read(|raw| to_integer(raw.as_deref()))
    }

    /// The stored string, untouched.
    pub fn raw(&self) -> PreloadResult<Option<String>> {
        self.inner.read(Clone::clone)
    }

    /// Whether the key is absent.
    pub fn is_nil(&self) -> PreloadResult<bool> {
        self.inner.read(Option::is_none)
    }

    /// Add `by` in the store and return the stored result.
    pub fn increment(&self, by: i64) -> PreloadResult<i64> {
        self.inner.write(WriteCommand::IncrBy {
            key: self.key().as_str().to_string(),
            by,
        })
    }

    pub fn decrement(&self, by: i64) -> PreloadResult<i64> {
        self.increment(-by)
    }

    /// Overwrite the stored value.
    pub fn set(&self, value: i64) -> PreloadResult<()> {
        self.inner.write(WriteCommand::Set {
            key: self.key().as_str().to_string(),
            value: value.to_string(),
        })?;
        Ok(())
    }
}
