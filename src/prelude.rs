//! Prelude module for convenient imports.
//!
//! ```rust
//! use preload_store::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - Attribute proxies: [`Counter`], [`Value`], [`List`], [`Set`],
//!   [`SortedSet`], [`Map`]
//! - Entities: [`Entity`], [`EntityId`], [`AttributeHandle`], [`AttributeSet`]
//! - Schemas: [`EntitySchema`], [`AttributeKind`], [`AttributeRegistry`]
//! - Batching: [`Preloader`], [`Relation`], [`PreloadContext`], [`PreloadOptions`]
//! - Stores: [`AttributeStore`], [`SharedStore`], [`MemoryStore`] and, with the
//!   `sled` feature, `SledStore`
//! - Errors: [`PreloadError`], [`PreloadResult`]
//!
//! Store commands and replies are not included; import them from
//! [`crate::store`] when implementing a store.

pub use std::sync::Arc;

// Attribute proxies
pub use crate::attribute::{Counter, List, Map, Set, SortedSet, Value};

// Entities and schemas
pub use crate::entity::{AnyAttribute, AttributeHandle, AttributeSet, Entity, EntityId};
pub use crate::key::AttributeKey;
pub use crate::schema::{AttributeKind, AttributeRegistry, EntitySchema};

// Batching
pub use crate::config::{FailurePolicy, MemoryConfig, PreloadOptions, SledConfig};
pub use crate::context::PreloadContext;
pub use crate::preload::Preloader;
pub use crate::relation::Relation;

// Stores
pub use crate::store::{AttributeStore, MemoryStore, SharedStore};
#[cfg(feature = "sled")]
pub use crate::store::SledStore;

// Error handling
pub use crate::error::{PreloadError, PreloadResult};
