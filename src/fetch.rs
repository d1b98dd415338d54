//! Batch fetch strategies.
//!
//! Scalar attributes (counters, plain values) go out as one multi-get.
//! Structured attributes (lists, sets, sorted sets, maps) go out as one
//! pipeline with one full-read command per (attribute, entity). Either
//! strategy is skipped when it has no attributes, so a batch costs at most
//! two round trips whatever its size.

use crate::attribute::PreloadTarget;
use crate::distribute::{ResultDistributor, scalar_reply};
use crate::error::{PreloadError, PreloadResult};
use crate::schema::AttributeKind;
use crate::store::{AttributeStore, ReadCommand};
use log::debug;
use std::sync::Weak;
use std::time::Instant;

/// One requested attribute across every entity of the batch.
pub(crate) struct AttributeRow<'a> {
    pub(crate) name: &'a str,
    pub(crate) kind: AttributeKind,
    /// Indexed like the batch's entity ids
    pub(crate) targets: &'a [Weak<dyn PreloadTarget>],
    /// Store key of each target
    pub(crate) keys: &'a [String],
}

pub(crate) struct BatchFetcher<'a> {
    store: &'a dyn AttributeStore,
    namespace: &'a str,
    distributor: ResultDistributor,
}

impl<'a> BatchFetcher<'a> {
    pub(crate) fn new(
        store: &'a dyn AttributeStore,
        namespace: &'a str,
        context_id: u64,
    ) -> Self {
        Self {
            store,
            namespace,
            distributor: ResultDistributor::new(context_id),
        }
    }

    /// One multi-get for every scalar attribute of every entity.
    ///
    /// Keys are laid out attribute-major: all entities for the first
    /// attribute, then all entities for the second, and so on. The value for
    /// entity `j` and attribute `i` sits at `i * entity_count + j`.
    pub(crate) fn fetch_scalars(&self, rows: &[AttributeRow<'_>]) -> PreloadResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let start = Instant::now();
        let n = rows[0].keys.len();

        let keys: Vec<String> = rows.iter().flat_map(|row| row.keys.iter().cloned()).collect();
        let values = self.store.multi_get(&keys)?;
        if values.len() != keys.len() {
            return Err(PreloadError::Transport(format!(
                "multi-get returned {} values for {} keys",
                values.len(),
                keys.len()
            )));
        }

        for (position, (key, value)) in keys.iter().zip(values).enumerate() {
            let (i, j) = (position / n, position % n);
            self.distributor
                .deliver(&rows[i].targets[j], key, scalar_reply(value))?;
        }

        debug!(
            "BatchFetcher: multi-get of {} keys for '{}' {:?} in {:?}",
            keys.len(),
            self.namespace,
            rows.iter().map(|row| row.name).collect::<Vec<_>>(),
            start.elapsed()
        );
        Ok(())
    }

    /// One pipeline for every structured attribute of every entity.
    ///
    /// Replies come back in submission order and are matched to their
    /// attribute by walking the same order.
    pub(crate) fn fetch_structured(&self, rows: &[AttributeRow<'_>]) -> PreloadResult<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let start = Instant::now();

        let total: usize = rows.iter().map(|row| row.keys.len()).sum();
        let mut order: Vec<(usize, usize)> = Vec::with_capacity(total);
        let mut commands = Vec::with_capacity(total);
        for (i, row) in rows.iter().enumerate() {
            for (j, key) in row.keys.iter().enumerate() {
                commands.push(ReadCommand::full_read(row.kind, key.clone()));
                order.push((i, j));
            }
        }

        let replies = self.store.pipelined(&commands)?;
        if replies.len() != commands.len() {
            return Err(PreloadError::Transport(format!(
                "pipeline returned {} replies for {} commands",
                replies.len(),
                commands.len()
            )));
        }

        for ((command, (i, j)), reply) in commands.iter().zip(order).zip(replies) {
            self.distributor
                .deliver(&rows[i].targets[j], command.key(), reply)?;
        }

        debug!(
            "BatchFetcher: pipeline of {} commands for '{}' {:?} in {:?}",
            commands.len(),
            self.namespace,
            rows.iter().map(|row| row.name).collect::<Vec<_>>(),
            start.elapsed()
        );
        Ok(())
    }
}
