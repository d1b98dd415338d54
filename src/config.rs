//! Configuration for stores and for the preload engine.
//!
//! All configuration types use the builder pattern via `typed-builder`.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::{Display, EnumString};
use typed_builder::TypedBuilder;

/// What a batch does after its shared fetch has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FailurePolicy {
    /// The batch stays failed. Every attribute of the batch returns the same
    /// error when touched and the store is not contacted again.
    #[default]
    Sticky,
    /// The batch returns to its unresolved state, so the next attribute read
    /// retries the whole batch fetch.
    Retry,
}

/// Options applied to every batch created by a [`Preloader`](crate::preload::Preloader).
///
/// # Examples
///
/// ```
/// use preload_store::config::{FailurePolicy, PreloadOptions};
///
/// let options = PreloadOptions::builder()
///     .failure_policy(FailurePolicy::Retry)
///     .build();
/// assert_eq!(options.failure_policy, FailurePolicy::Retry);
/// ```
#[derive(Debug, Clone, Default, TypedBuilder)]
#[builder(doc)]
pub struct PreloadOptions {
    /// Behaviour of a batch after a failed fetch
    #[builder(default)]
    pub failure_policy: FailurePolicy,
}

/// Configuration for the in-memory store.
///
/// # Examples
///
/// ```
/// use preload_store::config::MemoryConfig;
///
/// let config = MemoryConfig::builder()
///     .initial_capacity(10000)
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct MemoryConfig {
    /// Initial capacity hint for the key table
    #[builder(default = 1000)]
    pub initial_capacity: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 1000,
        }
    }
}

static NEXT_TEMP_ID: AtomicUsize = AtomicUsize::new(0);

/// Configuration for the sled-backed store.
///
/// # Examples
///
/// ```
/// use preload_store::config::SledConfig;
///
/// // Create with defaults
/// let config = SledConfig::builder()
///     .path("attributes.db")
///     .build();
///
/// // Customize options
/// let config = SledConfig::builder()
///     .path("/data/attributes.db")
///     .cache_capacity_bytes(64 * 1024 * 1024)
///     .flush_every_ms(None)
///     .build();
/// ```
#[derive(Debug, Clone, TypedBuilder)]
#[builder(doc)]
pub struct SledConfig {
    /// Path to the database directory
    #[builder(setter(into))]
    pub path: PathBuf,

    /// Page cache size in bytes
    #[builder(default = 256 * 1024 * 1024)]
    pub cache_capacity_bytes: u64,

    /// Remove the database when it is dropped
    #[builder(default = false)]
    pub temporary: bool,

    /// Background flush interval, `None` disables periodic flushing
    #[builder(default = Some(500))]
    pub flush_every_ms: Option<u64>,

    /// Name of the sled tree holding the attribute keys
    #[builder(default = String::from("attributes"), setter(into))]
    pub tree_name: String,
}

impl SledConfig {
    /// Create a basic configuration with just a path
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            cache_capacity_bytes: 256 * 1024 * 1024,
            temporary: false,
            flush_every_ms: Some(500),
            tree_name: String::from("attributes"),
        }
    }

    /// Create configuration for a temporary database
    pub fn temp() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        let sequence = NEXT_TEMP_ID.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "preload_store_{}_{nanos:x}_{sequence}",
            std::process::id()
        ));
        Self {
            temporary: true,
            ..Self::new(path)
        }
    }
}
