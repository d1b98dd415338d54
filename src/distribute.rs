//! Decoding raw replies and handing them to the attributes that asked.
//!
//! Every attribute kind has one materialized form. A missing key always
//! decodes to the empty form of its kind: `None` for scalars, an empty
//! sequence for lists, sets and sorted sets, an empty mapping for maps.

use crate::attribute::PreloadTarget;
use crate::error::{PreloadError, PreloadResult};
use crate::store::ReadReply;
use log::trace;
use std::collections::BTreeMap;
use std::sync::Weak;

/// Conversion from a raw reply to a materialized attribute value.
pub(crate) trait Decode: Sized {
    const EXPECTED: &'static str;

    fn decode(key: &str, reply: ReadReply) -> PreloadResult<Self>;
}

fn unexpected(key: &str, expected: &str) -> PreloadError {
    PreloadError::WrongType {
        key: key.to_string(),
        expected: expected.to_string(),
    }
}

impl Decode for Option<String> {
    const EXPECTED: &'static str = "value";

    fn decode(key: &str, reply: ReadReply) -> PreloadResult<Self> {
        match reply {
            ReadReply::Nil => Ok(None),
            ReadReply::Value(raw) => Ok(Some(raw)),
            _ => Err(unexpected(key, Self::EXPECTED)),
        }
    }
}

impl Decode for Vec<String> {
    const EXPECTED: &'static str = "array";

    fn decode(key: &str, reply: ReadReply) -> PreloadResult<Self> {
        match reply {
            ReadReply::Nil => Ok(Vec::new()),
            ReadReply::Array(items) => Ok(items),
            _ => Err(unexpected(key, Self::EXPECTED)),
        }
    }
}

impl Decode for Vec<(String, f64)> {
    const EXPECTED: &'static str = "scored array";

    fn decode(key: &str, reply: ReadReply) -> PreloadResult<Self> {
        match reply {
            ReadReply::Nil => Ok(Vec::new()),
            ReadReply::ScoredArray(entries) => Ok(entries),
            _ => Err(unexpected(key, Self::EXPECTED)),
        }
    }
}

impl Decode for BTreeMap<String, String> {
    const EXPECTED: &'static str = "pairs";

    fn decode(key: &str, reply: ReadReply) -> PreloadResult<Self> {
        match reply {
            ReadReply::Nil => Ok(BTreeMap::new()),
            ReadReply::Pairs(pairs) => Ok(pairs.into_iter().collect()),
            _ => Err(unexpected(key, Self::EXPECTED)),
        }
    }
}

/// Lift a multi-get answer into the reply shape the decoders expect.
pub(crate) fn scalar_reply(raw: Option<String>) -> ReadReply {
    match raw {
        Some(raw) => ReadReply::Value(raw),
        None => ReadReply::Nil,
    }
}

/// Hands decoded results to the attributes of one batch.
pub(crate) struct ResultDistributor {
    context_id: u64,
}

impl ResultDistributor {
    pub(crate) fn new(context_id: u64) -> Self {
        Self { context_id }
    }

    /// Deliver one raw reply. Attributes that were dropped or have since been
    /// attached to another batch are skipped.
    pub(crate) fn deliver(
        &self,
        target: &Weak<dyn PreloadTarget>,
        key: &str,
        reply: ReadReply,
    ) -> PreloadResult<()> {
        match target.upgrade() {
            Some(target) => target.materialize(self.context_id, key, reply),
            None => {
                trace!("ResultDistributor: {} dropped before delivery", key);
                Ok(())
            }
        }
    }
}
