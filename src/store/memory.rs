//! In-memory store.
//!
//! Holds every key in one process-local table. Each `multi_get` and
//! `pipelined` call takes the lock once, so a batch observes one consistent
//! view of the data, which is what a real round trip would give.

use super::value::{self, StoredValue};
use super::{AttributeStore, ReadCommand, ReadReply, WriteCommand};
use crate::config::MemoryConfig;
use crate::error::PreloadResult;
use log::trace;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Process-local attribute store.
///
/// Cloning is cheap and clones share the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, StoredValue>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MemoryConfig) -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::with_capacity(config.initial_capacity))),
        }
    }

    /// Number of keys currently stored
    pub fn len(&self) -> PreloadResult<usize> {
        Ok(self.data.read()?.len())
    }

    pub fn is_empty(&self) -> PreloadResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every key
    pub fn clear(&self) -> PreloadResult<()> {
        self.data.write()?.clear();
        Ok(())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.data.read().map(|d| d.len()).unwrap_or_default();
        f.debug_struct("MemoryStore").field("keys", &len).finish()
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self, key: &str) -> PreloadResult<Option<String>> {
        let data = self.data.read()?;
        value::read_scalar(key, data.get(key))
    }

    fn multi_get(&self, keys: &[String]) -> PreloadResult<Vec<Option<String>>> {
        trace!("MemoryStore: multi_get {} keys", keys.len());
        let data = self.data.read()?;
        Ok(keys
            .iter()
            .map(|key| value::read_scalar_lenient(data.get(key)))
            .collect())
    }

    fn execute(&self, command: &ReadCommand) -> PreloadResult<ReadReply> {
        let data = self.data.read()?;
        value::read(command, data.get(command.key()))
    }

    fn pipelined(&self, commands: &[ReadCommand]) -> PreloadResult<Vec<ReadReply>> {
        trace!("MemoryStore: pipelined {} commands", commands.len());
        let data = self.data.read()?;
        commands
            .iter()
            .map(|command| value::read(command, data.get(command.key())))
            .collect()
    }

    fn write(&self, command: WriteCommand) -> PreloadResult<i64> {
        let mut data = self.data.write()?;
        let key = command.key().to_string();
        let current = data.remove(&key);
        let backup = current.clone();
        match value::apply(&command, current) {
            Ok((next, reply)) => {
                if let Some(next) = next {
                    data.insert(key, next);
                }
                Ok(reply)
            }
            Err(e) => {
                if let Some(backup) = backup {
                    data.insert(key, backup);
                }
                Err(e)
            }
        }
    }
}
