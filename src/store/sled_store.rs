//! Sled backend for attribute storage.
//!
//! Every attribute key maps to one entry of a single sled tree. The entry
//! value is a bincode-encoded [`StoredValue`], so scalar and structured
//! attributes share one keyspace the same way they do in a networked
//! key-value server.
//!
//! ## Round trips
//!
//! sled is embedded, so a "round trip" is one call into this store. Writes
//! that read the previous value (increments, pushes) are serialised through
//! a store-local lock.
//!
//! ## Usage
//!
//! ```no_run
//! use preload_store::config::SledConfig;
//! use preload_store::store::{AttributeStore, SledStore, WriteCommand};
//!
//! let store = SledStore::open(SledConfig::new("./data/attributes"))?;
//! store.write(WriteCommand::IncrBy { key: "widget:1:view_count".into(), by: 1 })?;
//! store.flush()?;
//! # Ok::<(), preload_store::error::PreloadError>(())
//! ```

use super::value::{self, StoredValue};
use super::{AttributeStore, ReadCommand, ReadReply, WriteCommand};
use crate::config::SledConfig;
use crate::error::PreloadResult;
use log::{debug, trace};
use std::sync::Mutex;
use std::time::Instant;

// =============================================================================
// Serialization Helpers
// =============================================================================

#[inline]
fn serialize_value(value: &StoredValue) -> PreloadResult<Vec<u8>> {
    Ok(bincode::encode_to_vec(value, bincode::config::standard())?)
}

#[inline]
fn deserialize_value(bytes: &[u8]) -> PreloadResult<StoredValue> {
    let (value, _len) = bincode::decode_from_slice(bytes, bincode::config::standard())?;
    Ok(value)
}

// =============================================================================
// SledStore Implementation
// =============================================================================

/// Persistent attribute store on sled.
pub struct SledStore {
    /// Kept for flushing and for direct access to sled's API
    db: sled::Db,
    tree: sled::Tree,
    write_lock: Mutex<()>,
}

impl SledStore {
    /// Open (or create) a store described by `config`.
    pub fn open(config: SledConfig) -> PreloadResult<Self> {
        let start = Instant::now();
        debug!("SledStore: Opening database at {}", config.path.display());

        let db = sled::Config::new()
            .path(&config.path)
            .cache_capacity(config.cache_capacity_bytes)
            .temporary(config.temporary)
            .flush_every_ms(config.flush_every_ms)
            .open()?;
        let tree = db.open_tree(&config.tree_name)?;

        debug!("SledStore: Opened in {:?}", start.elapsed());
        Ok(Self {
            db,
            tree,
            write_lock: Mutex::new(()),
        })
    }

    /// Create a temporary store, removed when dropped.
    pub fn temporary() -> PreloadResult<Self> {
        Self::open(SledConfig::temp())
    }

    /// Get a reference to the underlying sled database
    pub fn sled_database(&self) -> &sled::Db {
        &self.db
    }

    /// Flush all pending writes to disk
    pub fn flush(&self) -> PreloadResult<()> {
        let start = Instant::now();
        let bytes = self.db.flush()?;
        debug!("SledStore: Flushed {} bytes in {:?}", bytes, start.elapsed());
        Ok(())
    }

    fn load(&self, key: &str) -> PreloadResult<Option<StoredValue>> {
        match self.tree.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(deserialize_value(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl AttributeStore for SledStore {
    fn get(&self, key: &str) -> PreloadResult<Option<String>> {
        value::read_scalar(key, self.load(key)?.as_ref())
    }

    fn multi_get(&self, keys: &[String]) -> PreloadResult<Vec<Option<String>>> {
        trace!("SledStore: multi_get {} keys", keys.len());
        keys.iter()
            .map(|key| -> PreloadResult<Option<String>> {
                Ok(value::read_scalar_lenient(self.load(key)?.as_ref()))
            })
            .collect()
    }

    fn execute(&self, command: &ReadCommand) -> PreloadResult<ReadReply> {
        value::read(command, self.load(command.key())?.as_ref())
    }

    fn pipelined(&self, commands: &[ReadCommand]) -> PreloadResult<Vec<ReadReply>> {
        trace!("SledStore: pipelined {} commands", commands.len());
        commands.iter().map(|command| self.execute(command)).collect()
    }

    fn write(&self, command: WriteCommand) -> PreloadResult<i64> {
        let _guard = self.write_lock.lock()?;
        let key = command.key().as_bytes().to_vec();
        let current = self.load(command.key())?;
        let (next, reply) = value::apply(&command, current)?;
        match next {
            Some(next) => {
                self.tree.insert(key, serialize_value(&next)?)?;
            }
            None => {
                self.tree.remove(key)?;
            }
        }
        Ok(reply)
    }
}
