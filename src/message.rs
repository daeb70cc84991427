//! Session message types.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;

/// One complete decoded message: a JSON object.
///
/// A value of this type always came from a fully reassembled text payload;
/// partial fragments are never observable to consumers.
pub type Message = Map<String, Value>;

/// Payload submitted on the outbound channel.
///
/// Both policies from the wire contract are supported: callers that already
/// hold encoded bytes submit [`Outbound::Raw`], callers working with
/// structured values submit [`Outbound::Json`] and let the write pump
/// serialize.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    /// Pre-encoded payload, written verbatim as one text frame.
    Raw(Vec<u8>),
    /// Structured value, serialized by the write pump.
    Json(Value),
}

impl Outbound {
    /// Serialize any value up front, yielding a [`Outbound::Raw`] payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`](crate::Error::Encode) if serialization
    /// fails.
    pub fn encode<T: Serialize>(value: &T) -> Result<Self> {
        Ok(Outbound::Raw(serde_json::to_vec(value)?))
    }

    /// Returns `true` if this payload is pre-encoded bytes.
    #[must_use]
    pub const fn is_raw(&self) -> bool {
        matches!(self, Outbound::Raw(_))
    }

    /// Returns `true` if this payload still needs serialization.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self, Outbound::Json(_))
    }
}

impl From<Value> for Outbound {
    fn from(value: Value) -> Self {
        Outbound::Json(value)
    }
}

impl From<Message> for Outbound {
    fn from(message: Message) -> Self {
        Outbound::Json(Value::Object(message))
    }
}

impl From<Vec<u8>> for Outbound {
    fn from(raw: Vec<u8>) -> Self {
        Outbound::Raw(raw)
    }
}

impl From<String> for Outbound {
    fn from(text: String) -> Self {
        Outbound::Raw(text.into_bytes())
    }
}

impl From<&str> for Outbound {
    fn from(text: &str) -> Self {
        Outbound::Raw(text.as_bytes().to_vec())
    }
}
