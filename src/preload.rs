//! Explicit batch declaration.
//!
//! ```
//! use preload_store::prelude::*;
//! use std::sync::Arc;
//!
//! struct Widget {
//!     id: u64,
//!     schema: Arc<EntitySchema>,
//!     view_count: Counter,
//! }
//!
//! impl Entity for Widget {
//!     fn entity_id(&self) -> EntityId {
//!         self.id.into()
//!     }
//!
//!     fn schema(&self) -> &EntitySchema {
//!         &self.schema
//!     }
//!
//!     fn attribute(&self, name: &str) -> Option<AttributeHandle<'_>> {
//!         match name {
//!             "view_count" => Some((&self.view_count).into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let store: SharedStore = Arc::new(MemoryStore::new());
//! let schema = Arc::new(EntitySchema::new("widget").counter("view_count"));
//! let widgets: Vec<Widget> = (1..=3)
//!     .map(|id| Widget {
//!         id,
//!         schema: Arc::clone(&schema),
//!         view_count: Counter::new(Arc::clone(&store), AttributeKey::new("widget", &id, "view_count")),
//!     })
//!     .collect();
//! widgets[1].view_count.increment(5)?;
//!
//! let preloader = Preloader::new(Arc::clone(&store));
//! let widgets = preloader.preload(&widgets, &["view_count"])?;
//!
//! // One multi-get serves all three counters.
//! let counts: Vec<i64> = widgets
//!     .iter()
//!     .map(|w| w.view_count.value())
//!     .collect::<PreloadResult<_>>()?;
//! assert_eq!(counts, [0, 5, 0]);
//! # Ok::<(), PreloadError>(())
//! ```

use crate::config::PreloadOptions;
use crate::context::PreloadContext;
use crate::entity::Entity;
use crate::error::PreloadResult;
use crate::store::SharedStore;
use std::sync::Arc;

/// Attaches batches to entity collections.
#[derive(Clone)]
pub struct Preloader {
    store: SharedStore,
    options: PreloadOptions,
}

impl Preloader {
    pub fn new(store: SharedStore) -> Self {
        Self::with_options(store, PreloadOptions::default())
    }

    pub fn with_options(store: SharedStore, options: PreloadOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn options(&self) -> &PreloadOptions {
        &self.options
    }

    /// Attach one batch for `names` to every entity and hand the same
    /// collection back.
    ///
    /// Nothing is fetched until one of the attributes is read. Unknown
    /// attribute names fail here. An empty collection or an empty name list
    /// leaves everything untouched.
    pub fn preload<'a, E, S>(&self, entities: &'a [E], names: &[S]) -> PreloadResult<&'a [E]>
    where
        E: Entity,
        S: AsRef<str>,
    {
        let refs: Vec<&E> = entities.iter().collect();
        self.attach(&refs, names)?;
        Ok(entities)
    }

    /// Like [`preload`](Self::preload), for collections of borrowed or
    /// heterogeneous entities.
    pub fn preload_refs<E, S>(&self, entities: &[&E], names: &[S]) -> PreloadResult<()>
    where
        E: Entity + ?Sized,
        S: AsRef<str>,
    {
        self.attach(entities, names)?;
        Ok(())
    }

    /// Attach a batch and return it.
    pub fn attach<E, S>(&self, entities: &[&E], names: &[S]) -> PreloadResult<Arc<PreloadContext>>
    where
        E: Entity + ?Sized,
        S: AsRef<str>,
    {
        PreloadContext::attach(
            Arc::clone(&self.store),
            entities,
            names,
            self.options.failure_policy,
        )
    }
}

impl std::fmt::Debug for Preloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preloader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
