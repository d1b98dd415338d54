// Common test utilities and fixtures
#![allow(dead_code)]

use preload_store::prelude::*;
use preload_store::store::{ReadCommand, ReadReply, WriteCommand};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Entities
// =============================================================================

pub fn widget_schema() -> Arc<EntitySchema> {
    static SCHEMA: OnceLock<Arc<EntitySchema>> = OnceLock::new();
    Arc::clone(SCHEMA.get_or_init(|| {
        Arc::new(
            EntitySchema::new("widget")
                .counter("view_count")
                .value("last_seen")
                .list("recent_ids")
                .set("tag_ids")
                .sorted_set("ranking")
                .map("metadata"),
        )
    }))
}

/// Entity with one field per attribute kind.
#[derive(Debug)]
pub struct Widget {
    pub id: u64,
    schema: Arc<EntitySchema>,
    pub view_count: Counter,
    pub last_seen: Value,
    pub recent_ids: List,
    pub tag_ids: Set,
    pub ranking: SortedSet,
    pub metadata: Map,
}

impl Widget {
    pub fn new(store: &SharedStore, id: u64) -> Self {
        let key = |name: &str| AttributeKey::new("widget", &id, name);
        Self {
            id,
            schema: widget_schema(),
            view_count: Counter::new(Arc::clone(store), key("view_count")),
            last_seen: Value::new(Arc::clone(store), key("last_seen")),
            recent_ids: List::new(Arc::clone(store), key("recent_ids")),
            tag_ids: Set::new(Arc::clone(store), key("tag_ids")),
            ranking: SortedSet::new(Arc::clone(store), key("ranking")),
            metadata: Map::new(Arc::clone(store), key("metadata")),
        }
    }

    pub fn many(store: &SharedStore, ids: impl IntoIterator<Item = u64>) -> Vec<Self> {
        ids.into_iter().map(|id| Self::new(store, id)).collect()
    }
}

impl Entity for Widget {
    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    fn attribute(&self, name: &str) -> Option<AttributeHandle<'_>> {
        match name {
            "view_count" => Some((&self.view_count).into()),
            "last_seen" => Some((&self.last_seen).into()),
            "recent_ids" => Some((&self.recent_ids).into()),
            "tag_ids" => Some((&self.tag_ids).into()),
            "ranking" => Some((&self.ranking).into()),
            "metadata" => Some((&self.metadata).into()),
            _ => None,
        }
    }
}

pub fn article_schema() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::new("article")
            .counter("view_count")
            .value("cached_summary")
            .list("comment_ids"),
    )
}

/// Entity whose proxies are bound from its schema at runtime.
#[derive(Debug)]
pub struct Article {
    pub id: u64,
    pub attributes: AttributeSet,
}

impl Article {
    pub fn new(store: &SharedStore, schema: Arc<EntitySchema>, id: u64) -> Self {
        Self {
            id,
            attributes: AttributeSet::bind(store, schema, &id.into()),
        }
    }

    pub fn view_count(&self) -> &Counter {
        self.attributes.counter("view_count").expect("article declares view_count")
    }

    pub fn cached_summary(&self) -> &Value {
        self.attributes.value("cached_summary").expect("article declares cached_summary")
    }

    pub fn comment_ids(&self) -> &List {
        self.attributes.list("comment_ids").expect("article declares comment_ids")
    }
}

impl Entity for Article {
    fn entity_id(&self) -> EntityId {
        self.id.into()
    }

    fn schema(&self) -> &EntitySchema {
        self.attributes.schema()
    }

    fn attribute(&self, name: &str) -> Option<AttributeHandle<'_>> {
        self.attributes.get(name)
    }
}

// =============================================================================
// Stores
// =============================================================================

/// Memory store that counts every round trip it serves.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemoryStore,
    multi_gets: AtomicUsize,
    pipelines: AtomicUsize,
    direct_reads: AtomicUsize,
    last_multi_get: Mutex<Vec<String>>,
    last_pipeline: Mutex<Vec<ReadCommand>>,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn shared(self: &Arc<Self>) -> SharedStore {
        Arc::clone(self) as SharedStore
    }

    pub fn multi_gets(&self) -> usize {
        self.multi_gets.load(Ordering::SeqCst)
    }

    pub fn pipelines(&self) -> usize {
        self.pipelines.load(Ordering::SeqCst)
    }

    pub fn direct_reads(&self) -> usize {
        self.direct_reads.load(Ordering::SeqCst)
    }

    pub fn round_trips(&self) -> usize {
        self.multi_gets() + self.pipelines() + self.direct_reads()
    }

    pub fn last_multi_get(&self) -> Vec<String> {
        self.last_multi_get.lock().unwrap().clone()
    }

    pub fn last_pipeline(&self) -> Vec<ReadCommand> {
        self.last_pipeline.lock().unwrap().clone()
    }

    pub fn reset_counts(&self) {
        self.multi_gets.store(0, Ordering::SeqCst);
        self.pipelines.store(0, Ordering::SeqCst);
        self.direct_reads.store(0, Ordering::SeqCst);
    }
}

impl AttributeStore for CountingStore {
    fn get(&self, key: &str) -> PreloadResult<Option<String>> {
        self.direct_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn multi_get(&self, keys: &[String]) -> PreloadResult<Vec<Option<String>>> {
        self.multi_gets.fetch_add(1, Ordering::SeqCst);
        *self.last_multi_get.lock().unwrap() = keys.to_vec();
        self.inner.multi_get(keys)
    }

    fn execute(&self, command: &ReadCommand) -> PreloadResult<ReadReply> {
        self.direct_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.execute(command)
    }

    fn pipelined(&self, commands: &[ReadCommand]) -> PreloadResult<Vec<ReadReply>> {
        self.pipelines.fetch_add(1, Ordering::SeqCst);
        *self.last_pipeline.lock().unwrap() = commands.to_vec();
        self.inner.pipelined(commands)
    }

    fn write(&self, command: WriteCommand) -> PreloadResult<i64> {
        self.inner.write(command)
    }
}

/// Memory store whose reads can be switched to fail like a dropped
/// connection.
#[derive(Debug, Default)]
pub struct FailingStore {
    inner: MemoryStore,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Arc<Self> {
        let store = Self::default();
        store.failing.store(true, Ordering::SeqCst);
        Arc::new(store)
    }

    pub fn shared(self: &Arc<Self>) -> SharedStore {
        Arc::clone(self) as SharedStore
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Read round trips attempted, failed or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn check(&self) -> PreloadResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(PreloadError::Transport("connection reset by peer".into()))
        } else {
            Ok(())
        }
    }
}

impl AttributeStore for FailingStore {
    fn get(&self, key: &str) -> PreloadResult<Option<String>> {
        self.check()?;
        self.inner.get(key)
    }

    fn multi_get(&self, keys: &[String]) -> PreloadResult<Vec<Option<String>>> {
        self.check()?;
        self.inner.multi_get(keys)
    }

    fn execute(&self, command: &ReadCommand) -> PreloadResult<ReadReply> {
        self.check()?;
        self.inner.execute(command)
    }

    fn pipelined(&self, commands: &[ReadCommand]) -> PreloadResult<Vec<ReadReply>> {
        self.check()?;
        self.inner.pipelined(commands)
    }

    fn write(&self, command: WriteCommand) -> PreloadResult<i64> {
        self.inner.write(command)
    }
}

// =============================================================================
// Seeding
// =============================================================================

pub fn set(store: &dyn AttributeStore, key: &str, value: &str) {
    store
        .write(WriteCommand::Set {
            key: key.into(),
            value: value.into(),
        })
        .unwrap();
}

pub fn push(store: &dyn AttributeStore, key: &str, values: &[&str]) {
    store
        .write(WriteCommand::Push {
            key: key.into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        })
        .unwrap();
}

pub fn add(store: &dyn AttributeStore, key: &str, members: &[&str]) {
    store
        .write(WriteCommand::Add {
            key: key.into(),
            members: members.iter().map(|m| m.to_string()).collect(),
        })
        .unwrap();
}

pub fn zadd(store: &dyn AttributeStore, key: &str, member: &str, score: f64) {
    store
        .write(WriteCommand::ScoredAdd {
            key: key.into(),
            member: member.into(),
            score,
        })
        .unwrap();
}

pub fn hset(store: &dyn AttributeStore, key: &str, field: &str, value: &str) {
    store
        .write(WriteCommand::Put {
            key: key.into(),
            field: field.into(),
            value: value.into(),
        })
        .unwrap();
}
