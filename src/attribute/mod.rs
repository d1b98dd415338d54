//! Attribute proxies: one value holder per (entity, attribute).
//!
//! Every proxy wraps a shared [`Slot`] in one of three states:
//!
//! - **unbound**: no batch was declared; reads go straight to the store
//! - **pending**: attached to a [`PreloadContext`] that has not fetched yet
//! - **resolved**: holds its materialized value
//!
//! Any read on a pending proxy resolves the whole batch first. The batch
//! fills every slot it knows about, so the sibling proxies become resolved
//! without touching the store again.
//!
//! Writes never go through the slot. They are sent to the store as-is and a
//! resolved proxy keeps serving the value it was resolved with.

use crate::context::PreloadContext;
use crate::distribute::Decode;
use crate::error::PreloadResult;
use crate::key::AttributeKey;
use crate::schema::AttributeKind;
use crate::store::{ReadCommand, ReadReply, SharedStore, WriteCommand};
use log::trace;
use std::fmt;
use std::sync::{Arc, Mutex};

mod counter;
mod list;
mod map;
mod set;
mod sorted_set;
mod value;

pub use counter::Counter;
pub use list::List;
pub use map::Map;
pub use set::Set;
pub use sorted_set::SortedSet;
pub use value::Value;

// =============================================================================
// Slot
// =============================================================================

pub(crate) enum SlotState<T> {
    Unbound,
    Pending(Arc<PreloadContext>),
    Resolved(T),
}

/// Interior state of one proxy, shared with the batch it is attached to.
pub(crate) struct Slot<T> {
    state: Mutex<SlotState<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(SlotState::Unbound),
        }
    }
}

/// The side of a proxy a batch talks to.
pub(crate) trait PreloadTarget: Send + Sync {
    /// Point this proxy at a new batch, dropping any earlier value or batch.
    fn attach(&self, context: Arc<PreloadContext>) -> PreloadResult<()>;

    /// Store the value fetched by batch `context_id`. Ignored unless the
    /// proxy is still pending on that batch.
    fn materialize(&self, context_id: u64, key: &str, reply: ReadReply) -> PreloadResult<()>;

    fn is_pending(&self) -> PreloadResult<bool>;
}

impl<T: Decode + Send> PreloadTarget for Slot<T> {
    fn attach(&self, context: Arc<PreloadContext>) -> PreloadResult<()> {
        *self.state.lock()? = SlotState::Pending(context);
        Ok(())
    }

    fn materialize(&self, context_id: u64, key: &str, reply: ReadReply) -> PreloadResult<()> {
        let mut state = self.state.lock()?;
        if let SlotState::Pending(context) = &*state {
            if context.id() == context_id {
                *state = SlotState::Resolved(T::decode(key, reply)?);
            }
        }
        Ok(())
    }

    fn is_pending(&self) -> PreloadResult<bool> {
        Ok(matches!(&*self.state.lock()?, SlotState::Pending(_)))
    }
}

// =============================================================================
// Binding
// =============================================================================

/// What every proxy kind has in common: its key, the store to fall back
/// to and its slot.
pub(crate) struct Binding<T> {
    key: AttributeKey,
    kind: AttributeKind,
    store: SharedStore,
    slot: Arc<Slot<T>>,
}

impl<T: Decode + Send + 'static> Binding<T> {
    pub(crate) fn new(store: SharedStore, key: AttributeKey, kind: AttributeKind) -> Self {
        Self {
            key,
            kind,
            store,
            slot: Arc::new(Slot::new()),
        }
    }

    pub(crate) fn key(&self) -> &AttributeKey {
        &self.key
    }

    pub(crate) fn kind(&self) -> AttributeKind {
        self.kind
    }

    pub(crate) fn target(&self) -> Arc<dyn PreloadTarget> {
        Arc::clone(&self.slot) as Arc<dyn PreloadTarget>
    }

    /// Serve `f` from the materialized value, resolving a pending batch
    /// first. Unbound proxies read their own key directly.
    pub(crate) fn read<R>(&self, f: impl Fn(&T) -> R) -> PreloadResult<R> {
        // The slot lock is never held while the context lock is taken: a
        // resolving batch takes them in the opposite order.
        loop {
            let context = {
                let state = self.slot.state.lock()?;
                match &*state {
                    SlotState::Resolved(value) => return Ok(f(value)),
                    SlotState::Unbound => break,
                    SlotState::Pending(context) => Arc::clone(context),
                }
            };
            context.resolve()?;

            // Settled without filling this slot: nothing left to wait for.
            let mut state = self.slot.state.lock()?;
            if let SlotState::Pending(current) = &*state {
                if current.id() == context.id() {
                    *state = SlotState::Unbound;
                }
            }
        }

        let value = self.fetch_direct()?;
        Ok(f(&value))
    }

    fn fetch_direct(&self) -> PreloadResult<T> {
        trace!("{}: direct read of {}", self.kind, self.key);
        let reply = match self.kind {
            AttributeKind::Counter | AttributeKind::Value => {
                crate::distribute::scalar_reply(self.store.get(self.key.as_str())?)
            }
            kind => self
                .store
                .execute(&ReadCommand::full_read(kind, self.key.as_str()))?,
        };
        T::decode(self.key.as_str(), reply)
    }

    pub(crate) fn write(&self, command: WriteCommand) -> PreloadResult<i64> {
        self.store.write(command)
    }

    /// Whether a batch read is still outstanding for this proxy.
    pub(crate) fn is_pending(&self) -> PreloadResult<bool> {
        self.slot.is_pending()
    }

    pub(crate) fn is_resolved(&self) -> PreloadResult<bool> {
        Ok(matches!(&*self.slot.state.lock()?, SlotState::Resolved(_)))
    }

    /// Remove the key from the store.
    pub(crate) fn delete(&self) -> PreloadResult<bool> {
        let removed = self.store.write(WriteCommand::Delete {
            key: self.key.as_str().to_string(),
        })?;
        Ok(removed > 0)
    }
}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.slot.state.lock().as_deref() {
            Ok(SlotState::Unbound) => "unbound",
            Ok(SlotState::Pending(_)) => "pending",
            Ok(SlotState::Resolved(_)) => "resolved",
            Err(_) => "poisoned",
        };
        f.debug_struct("Attribute")
            .field("key", &self.key.as_str())
            .field("kind", &self.kind)
            .field("state", &state)
            .finish()
    }
}

/// Generates the constructor and the batch-state queries shared by every
/// proxy type.
macro_rules! attribute_common {
    ($ty:ident, $kind:expr) => {
        impl $ty {
            pub fn new(store: $crate::store::SharedStore, key: $crate::key::AttributeKey) -> Self {
                Self {
                    inner: $crate::attribute::Binding::new(store, key, $kind),
                }
            }

            pub fn key(&self) -> &$crate::key::AttributeKey {
                self.inner.key()
            }

            /// Whether this proxy is attached to a batch that has not fetched yet
            pub fn is_pending(&self) -> $crate::error::PreloadResult<bool> {
                self.inner.is_pending()
            }

            /// Whether this proxy holds a materialized value
            pub fn is_resolved(&self) -> $crate::error::PreloadResult<bool> {
                self.inner.is_resolved()
            }

            /// Remove the key from the store. The materialized value, if any,
            /// is kept.
            pub fn delete(&self) -> $crate::error::PreloadResult<bool> {
                self.inner.delete()
            }

            pub(crate) fn binding_kind(&self) -> $crate::schema::AttributeKind {
                self.inner.kind()
            }

            pub(crate) fn target(&self) -> std::sync::Arc<dyn $crate::attribute::PreloadTarget> {
                self.inner.target()
            }
        }
    };
}

pub(crate) use attribute_common;
