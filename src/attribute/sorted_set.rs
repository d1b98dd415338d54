//! Scored, ordered set attribute.

use super::{attribute_common, Binding};
use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use crate::store::WriteCommand;

/// Members with scores, ordered by ascending score.
///
/// Lookups by member compare the string form of the argument and use the
/// first match in order.
#[derive(Debug)]
pub struct SortedSet {
    inner: Binding<Vec<(String, f64)>>,
}

attribute_common!(SortedSet, AttributeKind::SortedSet);

impl SortedSet {
    pub fn members(&self) -> PreloadResult<Vec<String>> {
        self.inner
            .read(|entries| entries.iter().map(|(member, _)| member.clone()).collect())
    }

    pub fn members_with_scores(&self) -> PreloadResult<Vec<(String, f64)>> {
        self.inner.read(Clone::clone)
    }

    pub fn score(&self, member: impl ToString) -> PreloadResult<Option<f64>> {
        let member = member.to_string();
        self.inner.read(|entries| {
            entries
                .iter()
                .find(|(m, _)| *m == member)
                .map(|(_, score)| *score)
        })
    }

    /// Zero-based position of `member`, lowest score first.
    pub fn rank(&self, member: impl ToString) -> PreloadResult<Option<usize>> {
        let member = member.to_string();
        self.inner
            .read(|entries| entries.iter().position(|(m, _)| *m == member))
    }

    pub fn len(&self) -> PreloadResult<usize> {
        self.inner.read(Vec::len)
    }

    pub fn is_empty(&self) -> PreloadResult<bool> {
        self.inner.read(Vec::is_empty)
    }

    /// Add or rescore `member` in the store; `true` when it is new.
    pub fn add(&self, member: impl ToString, score: f64) -> PreloadResult<bool> {
        let added = self.inner.write(WriteCommand::ScoredAdd {
            key: self.key().as_str().to_string(),
            member: member.to_string(),
            score,
        })?;
        Ok(added > 0)
    }
}
