//! The batch coordinator.
//!
//! A [`PreloadContext`] covers one finalized list of entities and a list of
//! attribute names. Building it attaches it to every matching attribute
//! proxy but performs no I/O. The first read on any of those proxies calls
//! [`PreloadContext::resolve`], which:
//!
//! 1. returns at once if the batch already settled or is empty
//! 2. marks the batch resolved before dispatching
//! 3. splits the attributes into scalar and structured kinds
//! 4. fetches all scalar attributes of all entities with one multi-get
//! 5. fetches all structured attributes of all entities with one pipeline
//! 6. hands every result to its proxy
//!
//! The resolved flag sits behind a mutex that is held for the whole fetch, so
//! concurrent readers of different proxies in one batch wait for a single
//! fetch instead of issuing their own.
//!
//! The context only holds weak references to its proxies. Pending proxies
//! keep the context alive; once every proxy is resolved or dropped, the
//! context is freed.

use crate::attribute::PreloadTarget;
use crate::config::FailurePolicy;
use crate::entity::Entity;
use crate::error::{PreloadError, PreloadResult};
use crate::fetch::{AttributeRow, BatchFetcher};
use crate::schema::{AttributeKind, StorageClass};
use crate::store::SharedStore;
use log::{debug, warn};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Instant;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

enum ResolveState {
    Unresolved,
    Resolved,
    Failed(PreloadError),
}

struct RequestedAttribute {
    name: String,
    kind: AttributeKind,
    /// One entry per entity, in entity order
    targets: Vec<Weak<dyn PreloadTarget>>,
    /// Each target's own store key, indexed like `targets`
    keys: Vec<String>,
}

/// Shared coordinator for one batch of entities × attribute names.
pub struct PreloadContext {
    id: u64,
    store: SharedStore,
    namespace: String,
    ids: Vec<String>,
    attributes: Vec<RequestedAttribute>,
    policy: FailurePolicy,
    state: Mutex<ResolveState>,
}

impl PreloadContext {
    /// Build a batch for `entities` × `names` and attach it to every
    /// matching proxy.
    ///
    /// The batch reads each proxy's own key, so a batched read and a direct
    /// read of the same proxy always hit the same entry. No store call is
    /// made. Names are validated against the entities'
    /// schema here, so a misspelt attribute fails before any read. Repeated
    /// names are requested once. An empty entity list or an empty name list
    /// gives an inert batch that never touches the store.
    pub fn attach<E, S>(
        store: SharedStore,
        entities: &[&E],
        names: &[S],
        policy: FailurePolicy,
    ) -> PreloadResult<Arc<Self>>
    where
        E: Entity + ?Sized,
        S: AsRef<str>,
    {
        let mut unique: Vec<&str> = Vec::with_capacity(names.len());
        for name in names {
            if !unique.contains(&name.as_ref()) {
                unique.push(name.as_ref());
            }
        }

        let Some(first) = entities.first() else {
            return Ok(Arc::new(Self::inert(store, policy)));
        };
        if unique.is_empty() {
            return Ok(Arc::new(Self::inert(store, policy)));
        }

        let schema = first.schema();
        let namespace = schema.namespace().to_string();
        if let Some(other) = entities.iter().find(|e| e.schema().namespace() != namespace) {
            return Err(PreloadError::Configuration(format!(
                "Cannot preload entities of namespaces '{}' and '{}' in one batch",
                namespace,
                other.schema().namespace()
            )));
        }

        let mut strong: Vec<Arc<dyn PreloadTarget>> = Vec::with_capacity(entities.len() * unique.len());
        let mut attributes = Vec::with_capacity(unique.len());
        for name in unique {
            let kind = schema.require_kind(name)?;
            let mut targets = Vec::with_capacity(entities.len());
            let mut keys = Vec::with_capacity(entities.len());
            for entity in entities {
                let handle = entity.attribute(name).ok_or_else(|| PreloadError::NotAttached {
                    attribute: name.to_string(),
                })?;
                if handle.kind() != kind {
                    return Err(PreloadError::Configuration(format!(
                        "Attribute '{}' is declared as {} but the entity exposes a {}",
                        name,
                        kind,
                        handle.kind()
                    )));
                }
                keys.push(handle.key().as_str().to_string());
                let target = handle.target();
                targets.push(Arc::downgrade(&target));
                strong.push(target);
            }
            attributes.push(RequestedAttribute {
                name: name.to_string(),
                kind,
                targets,
                keys,
            });
        }

        let context = Arc::new(Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            store,
            namespace,
            ids: entities.iter().map(|e| e.entity_id().to_string()).collect(),
            attributes,
            policy,
            state: Mutex::new(ResolveState::Unresolved),
        });

        for target in strong {
            target.attach(Arc::clone(&context))?;
        }

        debug!(
            "PreloadContext#{}: Attached to {} entities x {} attributes in '{}'",
            context.id,
            context.ids.len(),
            context.attributes.len(),
            context.namespace
        );
        Ok(context)
    }

    fn inert(store: SharedStore, policy: FailurePolicy) -> Self {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
            store,
            namespace: String::new(),
            ids: Vec::new(),
            attributes: Vec::new(),
            policy,
            state: Mutex::new(ResolveState::Unresolved),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn entity_count(&self) -> usize {
        self.ids.len()
    }

    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.name.as_str())
    }

    /// Whether the batch has nothing to fetch.
    pub fn is_inert(&self) -> bool {
        self.ids.is_empty() || self.attributes.is_empty()
    }

    /// Whether a fetch has been dispatched and succeeded (or there was
    /// nothing to fetch).
    pub fn is_resolved(&self) -> PreloadResult<bool> {
        Ok(matches!(&*self.state.lock()?, ResolveState::Resolved))
    }

    /// Fetch every requested attribute of every entity, at most once.
    ///
    /// Calling this again after success is a no-op. After a failed fetch the
    /// behaviour follows the batch's [`FailurePolicy`]: `Sticky` returns the
    /// original error on every call without contacting the store, `Retry`
    /// fetches again.
    pub fn resolve(&self) -> PreloadResult<()> {
        let mut state = self.state.lock()?;
        match &*state {
            ResolveState::Resolved => return Ok(()),
            ResolveState::Failed(e) => return Err(e.clone()),
            ResolveState::Unresolved => {}
        }
        *state = ResolveState::Resolved;
        if self.is_inert() {
            return Ok(());
        }

        let start = Instant::now();
        match self.dispatch() {
            Ok(()) => {
                debug!(
                    "PreloadContext#{}: Resolved {} entities x {} attributes in {:?}",
                    self.id,
                    self.ids.len(),
                    self.attributes.len(),
                    start.elapsed()
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    "PreloadContext#{}: Batch fetch failed after {:?}: {}",
                    self.id,
                    start.elapsed(),
                    e
                );
                *state = match self.policy {
                    FailurePolicy::Sticky => ResolveState::Failed(e.clone()),
                    FailurePolicy::Retry => ResolveState::Unresolved,
                };
                Err(e)
            }
        }
    }

    fn dispatch(&self) -> PreloadResult<()> {
        let (scalar, structured): (Vec<AttributeRow<'_>>, Vec<AttributeRow<'_>>) = self
            .attributes
            .iter()
            .map(|a| AttributeRow {
                name: &a.name,
                kind: a.kind,
                targets: &a.targets,
                keys: &a.keys,
            })
            .partition(|row| row.kind.storage_class() == StorageClass::Scalar);

        let fetcher = BatchFetcher::new(self.store.as_ref(), &self.namespace, self.id);
        fetcher.fetch_scalars(&scalar)?;
        fetcher.fetch_structured(&structured)?;
        Ok(())
    }
}

impl fmt::Debug for PreloadContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state.lock().as_deref() {
            Ok(ResolveState::Unresolved) => "unresolved",
            Ok(ResolveState::Resolved) => "resolved",
            Ok(ResolveState::Failed(_)) => "failed",
            Err(_) => "poisoned",
        };
        f.debug_struct("PreloadContext")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("entities", &self.ids.len())
            .field("attributes", &self.attributes.iter().map(|a| &a.name).collect::<Vec<_>>())
            .field("state", &state)
            .finish()
    }
}
