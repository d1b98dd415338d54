//! Ordered list attribute.

use super::{attribute_common, Binding};
use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use crate::store::WriteCommand;

/// An ordered sequence of strings. A missing key reads as an empty list.
#[derive(Debug)]
pub struct List {
    inner: Binding<Vec<String>>,
}

attribute_common!(List, AttributeKind::List);

/// Position of `index` in a sequence of `len`, negative counting from the end.
fn position(len: usize, index: i64) -> Option<usize> {
    let resolved = if index < 0 { len as i64 + index } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

impl List {
    /// Every element, in order.
    pub fn value(&self) -> PreloadResult<Vec<String>> {
        self.inner.read(Clone::clone)
    }

    pub fn values(&self) -> PreloadResult<Vec<String>> {
        self.value()
    }

    /// Element at `index`; negative indices count from the end.
    pub fn get(&self, index: i64) -> PreloadResult<Option<String>> {
        self.inner
            .read(|items| position(items.len(), index).map(|i| items[i].clone()))
    }

    /// Up to `len` elements starting at `start`; negative `start` counts
    /// from the end. Out-of-range starts give an empty slice.
    pub fn slice(&self, start: i64, len: usize) -> PreloadResult<Vec<String>> {
        self.inner.read(|items| match position(items.len(), start) {
            Some(from) => items.iter().skip(from).take(len).cloned().collect(),
            None => Vec::new(),
        })
    }

    pub fn len(&self) -> PreloadResult<usize> {
        self.inner.read(Vec::len)
    }

    pub fn is_empty(&self) -> PreloadResult<bool> {
        self.inner.read(Vec::is_empty)
    }

    /// Append to the tail in the store; returns the new length.
    pub fn push(&self, value: impl Into<String>) -> PreloadResult<i64> {
        self.push_all([value])
    }

    pub fn push_all<I, S>(&self, values: I) -> PreloadResult<i64>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inner.write(WriteCommand::Push {
            key: self.key().as_str().to_string(),
            values: values.into_iter().map(Into::into).collect(),
        })
    }
}
