//! # Preload Store
//!
//! Batch preloading for attributes that live in a key-value store next to
//! your records.
//!
//! Reading one counter, list or map per record for a page of records costs
//! one store round trip per (record, attribute). Declaring a preload for the
//! page attaches one shared batch to every attribute proxy of those records.
//! The first read on any of them fetches all of them in at most two round
//! trips, and every other read is served from memory.
//!
//! ## Features
//!
//! - **Lazy**: attaching a batch performs no I/O
//! - **Exactly once**: a batch fetches at most once, even under concurrent readers
//! - **Kind aware**: counters and plain values share one multi-get, lists,
//!   sets, sorted sets and maps share one pipeline
//! - **Transparent fallback**: proxies that were never preloaded read their
//!   own key directly with the same decoding
//! - **Pluggable stores**: an in-memory store and a sled-backed store ship
//!   with the crate; anything implementing [`store::AttributeStore`] works
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use preload_store::prelude::*;
//!
//! let store: SharedStore = Arc::new(SledStore::open(SledConfig::new("attrs.db"))?);
//! let preloader = Preloader::new(Arc::clone(&store));
//!
//! let widgets = load_widgets(&store)?;
//! preloader.preload(&widgets, &["view_count", "tag_ids"])?;
//!
//! for widget in &widgets {
//!     // The first iteration fetches everything, the rest hit memory.
//!     println!("{} {}", widget.view_count.value()?, widget.tag_ids.len()?);
//! }
//! ```

pub mod attribute;
pub mod config;
pub mod context;
mod distribute;
pub mod entity;
pub mod error;
mod fetch;
pub mod key;
pub mod prelude;
pub mod preload;
pub mod relation;
pub mod schema;
pub mod store;

pub use error::{PreloadError, PreloadResult};
