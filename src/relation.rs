//! Query integration: attach a batch once a loaded entity list is final.
//!
//! A [`Relation`] wraps a loader that produces entities. Preload names are
//! declared up front with [`Relation::with_preload`]; [`Relation::load`]
//! runs the loader and attaches one batch to the result. Each loaded
//! generation is attached exactly once. [`Relation::reset`] drops the
//! generation, so the next load reruns the loader against fresh store state
//! and attaches a new batch instead of serving the old values.
//!
//! The relation only remembers which batch it attached. It holds the batch
//! weakly, so the batch is freed as soon as its proxies have resolved.

use crate::context::PreloadContext;
use crate::entity::Entity;
use crate::error::PreloadResult;
use crate::preload::Preloader;
use log::debug;
use std::fmt;
use std::sync::{Arc, Weak};

type Loader<E> = Arc<dyn Fn() -> PreloadResult<Vec<E>> + Send + Sync>;

/// A lazily loaded entity list with declared preloads.
pub struct Relation<E> {
    loader: Loader<E>,
    preloader: Preloader,
    preload_names: Vec<String>,
    records: Option<Vec<E>>,
    /// Set once the current generation has been attached
    batch: Option<(u64, Weak<PreloadContext>)>,
}

impl<E: Entity> Relation<E> {
    pub fn new<F>(preloader: Preloader, loader: F) -> Self
    where
        F: Fn() -> PreloadResult<Vec<E>> + Send + Sync + 'static,
    {
        Self {
            loader: Arc::new(loader),
            preloader,
            preload_names: Vec::new(),
            records: None,
            batch: None,
        }
    }

    /// A new, unloaded relation that also preloads `names`.
    pub fn with_preload<S: AsRef<str>>(&self, names: &[S]) -> Self {
        let mut preload_names = self.preload_names.clone();
        for name in names {
            if !preload_names.iter().any(|n| n == name.as_ref()) {
                preload_names.push(name.as_ref().to_string());
            }
        }
        Self {
            loader: Arc::clone(&self.loader),
            preloader: self.preloader.clone(),
            preload_names,
            records: None,
            batch: None,
        }
    }

    pub fn preload_names(&self) -> &[String] {
        &self.preload_names
    }

    /// Load the entities if needed and attach the declared preloads to them.
    pub fn load(&mut self) -> PreloadResult<&[E]> {
        let records = match self.records.take() {
            Some(records) => records,
            None => (self.loader)()?,
        };
        let records = self.records.insert(records);

        if self.batch.is_none() && !self.preload_names.is_empty() {
            let refs: Vec<&E> = records.iter().collect();
            let context = self.preloader.attach(&refs, self.preload_names.as_slice())?;
            debug!(
                "Relation: Attached batch #{} to {} records",
                context.id(),
                records.len()
            );
            self.batch = Some((context.id(), Arc::downgrade(&context)));
        }
        Ok(records.as_slice())
    }

    pub fn is_loaded(&self) -> bool {
        self.records.is_some()
    }

    /// Forget the loaded generation and its batch.
    pub fn reset(&mut self) -> &mut Self {
        self.records = None;
        self.batch = None;
        self
    }

    /// `reset` followed by `load`.
    pub fn reload(&mut self) -> PreloadResult<&[E]> {
        self.reset().load()
    }

    /// The loaded entities, without loading.
    pub fn records(&self) -> Option<&[E]> {
        self.records.as_deref()
    }

    /// Id of the batch attached to the current generation.
    pub fn batch_id(&self) -> Option<u64> {
        self.batch.as_ref().map(|(id, _)| *id)
    }

    /// The batch attached to the current generation, while it is still
    /// alive.
    pub fn context(&self) -> Option<Arc<PreloadContext>> {
        self.batch.as_ref().and_then(|(_, context)| context.upgrade())
    }

    /// Take the loaded entities out of the relation.
    pub fn into_records(mut self) -> PreloadResult<Vec<E>> {
        self.load()?;
        Ok(self.records.take().unwrap_or_default())
    }
}

impl<E: Entity> fmt::Debug for Relation<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relation")
            .field("preload_names", &self.preload_names)
            .field("loaded", &self.records.as_ref().map(Vec::len))
            .field("batch_id", &self.batch_id())
            .finish_non_exhaustive()
    }
}
