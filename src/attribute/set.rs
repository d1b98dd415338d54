//! Unordered set attribute.

use super::{attribute_common, Binding};
use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use crate::store::WriteCommand;

/// A set of strings. A missing key reads as an empty set.
#[derive(Debug)]
pub struct Set {
    inner: Binding<Vec<String>>,
}

attribute_common!(Set, AttributeKind::Set);

impl Set {
    /// Every member, in no particular order.
    pub fn members(&self) -> PreloadResult<Vec<String>> {
        self.inner.read(Clone::clone)
    }

    /// Membership test; `member` is compared by its string form.
    pub fn contains(&self, member: impl ToString) -> PreloadResult<bool> {
        let member = member.to_string();
        self.inner.read(|members| members.contains(&member))
    }

    pub fn len(&self) -> PreloadResult<usize> {
        self.inner.read(Vec::len)
    }

    pub fn is_empty(&self) -> PreloadResult<bool> {
        self.inner.read(Vec::is_empty)
    }

    /// Add a member in the store; `true` when it was not present yet.
    pub fn add(&self, member: impl ToString) -> PreloadResult<bool> {
        let added = self.inner.write(WriteCommand::Add {
            key: self.key().as_str().to_string(),
            members: vec![member.to_string()],
        })?;
        Ok(added > 0)
    }
}
