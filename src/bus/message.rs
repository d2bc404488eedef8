//! Message envelope and the typed message contract.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Address of an endpoint's inbound queue.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Address {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How a message is routed.
///
/// Commands go to exactly one endpoint through the static route map.
/// Events fan out to every endpoint currently subscribed to their type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    Command,
    Event,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Command => f.write_str("command"),
            MessageKind::Event => f.write_str("event"),
        }
    }
}

/// A typed message that can travel on the bus.
///
/// ```
/// use order_bus::bus::{Message, MessageKind};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Ping {
///     seq: u32,
/// }
///
/// impl Message for Ping {
///     const MESSAGE_TYPE: &'static str = "Ping";
///     const KIND: MessageKind = MessageKind::Event;
/// }
/// ```
pub trait Message: Serialize + DeserializeOwned {
    /// Routing key used by the command map and the subscription registry.
    const MESSAGE_TYPE: &'static str;
    const KIND: MessageKind;
}

/// A message on the wire: encoded payload plus routing metadata.
///
/// Envelopes are immutable once built. The router hands each recipient its
/// own clone.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    id: String,
    message_type: String,
    kind: MessageKind,
    payload: Vec<u8>,
    origin: Option<Address>,
    causation_id: Option<String>,
    metadata: Vec<(String, String)>,
}

impl Envelope {
    /// Create an envelope from already-encoded payload bytes.
    pub fn new(
        id: impl Into<String>,
        message_type: impl Into<String>,
        kind: MessageKind,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            id: id.into(),
            message_type: message_type.into(),
            kind,
            payload,
            origin: None,
            causation_id: None,
            metadata: Vec::new(),
        }
    }

    /// Encode a typed message with bitcode under a fresh id.
    pub fn encode<M: Message>(message: &M) -> Result<Self, bitcode::Error> {
        let bytes = bitcode::serialize(message)?;
        Ok(Self::new(
            uuid::Uuid::new_v4().to_string(),
            M::MESSAGE_TYPE,
            M::KIND,
            bytes,
        ))
    }

    /// Decode the payload from bitcode.
    pub fn decode<M: DeserializeOwned>(&self) -> Result<M, bitcode::Error> {
        bitcode::deserialize(&self.payload)
    }

    /// Whether this envelope carries a message of type `M`.
    pub fn is<M: Message>(&self) -> bool {
        self.message_type == M::MESSAGE_TYPE && self.kind == M::KIND
    }

    pub fn with_origin(mut self, origin: Address) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_causation_id(mut self, id: impl Into<String>) -> Self {
        self.causation_id = Some(id.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn message_type(&self) -> &str {
        &self.message_type
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Endpoint that produced this message, if any.
    pub fn origin(&self) -> Option<&Address> {
        self.origin.as_ref()
    }

    /// Id of the message whose handler produced this one.
    pub fn causation_id(&self) -> Option<&str> {
        self.causation_id.as_deref()
    }

    pub fn metadata(&self) -> &[(String, String)] {
        &self.metadata
    }

    /// First metadata value stored under `key`.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.metadata
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}
