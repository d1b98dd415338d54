//! Store protocol consumed by the preload engine.
//!
//! The engine never talks to a concrete database. It is handed a
//! [`SharedStore`] and issues exactly these operations:
//!
//! - `multi_get`: many scalar keys in one round trip, answers in input order
//! - `pipelined`: many single-key read commands in one round trip, answers in
//!   input order
//! - `get` / `execute`: a single key, used by attributes that were never
//!   preloaded
//!
//! Writes go through [`AttributeStore::write`]. They are never batched or
//! cached by this crate.
//!
//! Two backends are provided: [`MemoryStore`](memory::MemoryStore) and, with
//! the `sled` feature, [`SledStore`](sled_store::SledStore).

use crate::error::PreloadResult;
use crate::schema::AttributeKind;
use std::ops::Range;
use std::sync::Arc;

pub mod memory;
#[cfg(feature = "sled")]
pub mod sled_store;
pub(crate) mod value;

pub use memory::MemoryStore;
#[cfg(feature = "sled")]
pub use sled_store::SledStore;

/// Handle to a store shared by every attribute and batch that uses it.
pub type SharedStore = Arc<dyn AttributeStore>;

/// A single-key read command.
///
/// `start`/`stop` are inclusive and may be negative to count from the end,
/// so `0..=-1` is the full range.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadCommand {
    /// Read a scalar value
    Get { key: String },
    /// Read a slice of a list
    Range { key: String, start: i64, stop: i64 },
    /// Read every member of a set
    Members { key: String },
    /// Read a slice of a sorted set together with the scores
    RangeWithScores { key: String, start: i64, stop: i64 },
    /// Read every field of a map
    Entries { key: String },
}

impl ReadCommand {
    /// The full read for an attribute of the given kind.
    pub fn full_read(kind: AttributeKind, key: impl Into<String>) -> Self {
        let key = key.into();
        match kind {
            AttributeKind::Counter | AttributeKind::Value => ReadCommand::Get { key },
            AttributeKind::List => ReadCommand::Range {
                key,
                start: 0,
                stop: -1,
            },
            AttributeKind::Set => ReadCommand::Members { key },
            AttributeKind::SortedSet => ReadCommand::RangeWithScores {
                key,
                start: 0,
                stop: -1,
            },
            AttributeKind::Map => ReadCommand::Entries { key },
        }
    }

    pub fn key(&self) -> &str {
        match self {
            ReadCommand::Get { key }
            | ReadCommand::Range { key, .. }
            | ReadCommand::Members { key }
            | ReadCommand::RangeWithScores { key, .. }
            | ReadCommand::Entries { key } => key,
        }
    }
}

/// Raw answer to one [`ReadCommand`], before any per-kind decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ReadReply {
    /// The key does not exist
    Nil,
    /// A scalar value
    Value(String),
    /// List or set members
    Array(Vec<String>),
    /// Sorted set members with their scores
    ScoredArray(Vec<(String, f64)>),
    /// Map fields with their values
    Pairs(Vec<(String, String)>),
}

/// A single-key write command.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCommand {
    Set { key: String, value: String },
    IncrBy { key: String, by: i64 },
    /// Append to the tail of a list
    Push { key: String, values: Vec<String> },
    /// Add members to a set
    Add { key: String, members: Vec<String> },
    /// Add or rescore a sorted set member
    ScoredAdd { key: String, member: String, score: f64 },
    /// Set one map field
    Put { key: String, field: String, value: String },
    Delete { key: String },
}

impl WriteCommand {
    pub fn key(&self) -> &str {
        match self {
            WriteCommand::Set { key, .. }
            | WriteCommand::IncrBy { key, .. }
            | WriteCommand::Push { key, .. }
            | WriteCommand::Add { key, .. }
            | WriteCommand::ScoredAdd { key, .. }
            | WriteCommand::Put { key, .. }
            | WriteCommand::Delete { key } => key,
        }
    }
}

/// A key-value store holding scalar and structured attribute values.
///
/// Implementations must be thread-safe. `multi_get` and `pipelined` each
/// represent one round trip and must answer in the order of their input.
pub trait AttributeStore: Send + Sync {
    /// Read one scalar key.
    fn get(&self, key: &str) -> PreloadResult<Option<String>>;

    /// Read many scalar keys in one round trip.
    ///
    /// A key holding a structured value answers `None` rather than failing
    /// the whole call. Only the single-key `get` reports `WrongType`.
    fn multi_get(&self, keys: &[String]) -> PreloadResult<Vec<Option<String>>>;

    /// Run one read command.
    fn execute(&self, command: &ReadCommand) -> PreloadResult<ReadReply>;

    /// Run many read commands in one round trip.
    fn pipelined(&self, commands: &[ReadCommand]) -> PreloadResult<Vec<ReadReply>>;

    /// Apply one write and return its integer reply: the new value for
    /// `IncrBy`, the new length for `Push`, the number of newly added
    /// elements for `Add`/`ScoredAdd`/`Put`, `1` for `Set` and the number of
    /// removed keys for `Delete`.
    fn write(&self, command: WriteCommand) -> PreloadResult<i64>;
}

/// Resolve an inclusive, possibly negative `start..=stop` against a length.
pub(crate) fn index_range(len: usize, start: i64, stop: i64) -> Range<usize> {
    let len_i = len as i64;
    let normalize = |i: i64| if i < 0 { len_i + i } else { i };
    let start = normalize(start).max(0);
    let stop = normalize(stop).min(len_i - 1);
    if len == 0 || start > stop {
        return 0..0;
    }
    start as usize..(stop + 1) as usize
}
