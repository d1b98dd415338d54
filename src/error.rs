//! Error types for preload operations.
//!
//! All public APIs in this crate return `PreloadResult<T>`, an alias for
//! `Result<T, PreloadError>`.
//!
//! A missing key is never an error: it decodes to the empty form of its
//! attribute kind. Errors are reserved for transport failures, type clashes
//! inside the store and configuration mistakes.
//!
//! # Error Handling Example
//!
//! ```
//! use preload_store::error::{PreloadError, PreloadResult};
//!
//! fn example_operation() -> PreloadResult<i64> {
//!     Err(PreloadError::Transport("connection reset".to_string()))
//! }
//!
//! match example_operation() {
//!     Ok(count) => println!("count = {count}"),
//!     Err(PreloadError::Transport(msg)) => eprintln!("store unreachable: {msg}"),
//!     Err(e) => eprintln!("other error: {e}"),
//! }
//! ```
//!
//! # Sharing
//!
//! `PreloadError` is `Clone`. Foreign error types are held behind an `Arc` so
//! that one failed batch fetch can hand the same error to every attribute of
//! the batch.

use std::sync::Arc;
use thiserror::Error;

/// Result type alias for preload operations.
pub type PreloadResult<T> = Result<T, PreloadError>;

/// The main error type for preload operations.
#[derive(Error, Debug, Clone)]
pub enum PreloadError {
    /// Wraps errors from the sled database
    #[cfg(feature = "sled")]
    #[error(transparent)]
    SledError(Arc<sled::Error>),

    /// Wraps deserialization errors from bincode
    #[cfg(feature = "sled")]
    #[error(transparent)]
    DecodeError(Arc<bincode::error::DecodeError>),

    /// Wraps serialization errors from bincode
    #[cfg(feature = "sled")]
    #[error(transparent)]
    EncodeError(Arc<bincode::error::EncodeError>),

    /// I/O error
    #[error(transparent)]
    IoError(Arc<std::io::Error>),

    /// TOML deserialization error while loading a schema
    #[error(transparent)]
    TomlDeError(Arc<toml::de::Error>),

    /// The store could not be reached or the round trip failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The key exists but holds a value of a different kind
    #[error("Wrong type at {key}: expected {expected}")]
    WrongType { key: String, expected: String },

    /// Preload was requested for an attribute the registry does not declare
    #[error("Unknown attribute `{attribute}` for namespace `{namespace}`")]
    UnknownAttribute { namespace: String, attribute: String },

    /// The registry declares an attribute the entity does not expose
    #[error("Entity does not expose attribute `{attribute}`")]
    NotAttached { attribute: String },

    /// Configuration error (e.g., invalid TOML schema)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A lock was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    Poisoned(String),
}

macro_rules! impl_from_shared {
    ($($(#[$meta:meta])* $err:ty => $variant:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            impl From<$err> for PreloadError {
                fn from(err: $err) -> Self {
                    PreloadError::$variant(Arc::new(err))
                }
            }
        )*
    };
}

impl_from_shared!(
    #[cfg(feature = "sled")]
    sled::Error => SledError,
    #[cfg(feature = "sled")]
    bincode::error::DecodeError => DecodeError,
    #[cfg(feature = "sled")]
    bincode::error::EncodeError => EncodeError,
    std::io::Error => IoError,
    toml::de::Error => TomlDeError,
);

impl<T> From<std::sync::PoisonError<T>> for PreloadError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        PreloadError::Poisoned(err.to_string())
    }
}

impl PreloadError {
    /// Whether this error came from the round trip itself rather than from
    /// a misconfiguration.
    pub fn is_transport(&self) -> bool {
        match self {
            #[cfg(feature = "sled")]
            PreloadError::SledError(_) => true,
            PreloadError::Transport(_) | PreloadError::IoError(_) => true,
            _ => false,
        }
    }
}
