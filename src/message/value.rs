//! Immutable, reference-counted message value (spec §3, §4.1).

// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use super::codec::MAX_WIRE_LEN;
use super::error::MessageError;

/// Read-only view over a [`Message`]'s properties.
///
/// Returned as a cheap `Arc` clone so it stays valid after the originating
/// `Message` handle is dropped (spec §4.1: "independent of m's lifetime").
pub type Properties = Arc<HashMap<String, String>>;

/// Immutable, reference-counted message: a byte payload plus a string
/// property map (spec §3).
///
/// # Ownership
///
/// `Message` wraps an `Arc<MessageInner>`. Cloning increments the refcount
/// in O(1) without copying the payload (spec §4.1 `Message::Clone`);
/// dropping the last clone frees the payload and property map (spec §4.1
/// `Message::Destroy`). There is no separate `destroy()` method — Rust's
/// `Drop` plays that role, and `Clone::clone` plays the role of
/// `Message_Clone`.
///
/// # Example
///
/// ```rust
/// use broker_core::message::Message;
/// use std::collections::HashMap;
///
/// let mut props = HashMap::new();
/// props.insert("source".to_string(), "test".to_string());
/// let msg = Message::try_create(b"HELLO", props).unwrap();
///
/// assert_eq!(msg.content(), b"HELLO");
/// assert_eq!(msg.properties().get("source").map(String::as_str), Some("test"));
///
/// let clone = msg.clone();
/// drop(msg);
/// // clone still observes the same content; properties outlive either handle.
/// assert_eq!(clone.content(), b"HELLO");
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    inner: Arc<MessageInner>,
}

#[derive(Debug)]
struct MessageInner {
    payload: Box<[u8]>,
    properties: Properties,
}

impl Message {
    /// Create a new message, copying `payload` and `properties` into it
    /// (spec §3: "Payload and properties passed in are COPIED").
    ///
    /// Fails with [`MessageError::InvalidArgument`] if any property key is
    /// empty (spec §3: keys must be non-empty UTF-8 strings), or if the
    /// payload or any single key/value is too large to ever be encoded by
    /// [`Message::to_bytes`] (spec §3: `0 <= size <= 2^31-1`, matching the
    /// original gateway's `int32_t size` field). Rejecting oversized
    /// inputs here keeps the wire codec's `u32::try_from` length
    /// conversions infallible.
    pub fn try_create(
        payload: &[u8],
        properties: HashMap<String, String>,
    ) -> Result<Self, MessageError> {
        if properties.keys().any(|k| k.is_empty()) {
            return Err(MessageError::InvalidArgument(
                "property keys must be non-empty".to_string(),
            ));
        }
        if payload.len() > MAX_WIRE_LEN {
            return Err(MessageError::InvalidArgument(format!(
                "payload of {} bytes exceeds the maximum of {MAX_WIRE_LEN}",
                payload.len()
            )));
        }
        for (key, value) in &properties {
            if key.len() > MAX_WIRE_LEN || value.len() > MAX_WIRE_LEN {
                return Err(MessageError::InvalidArgument(format!(
                    "property {key:?} exceeds the maximum encodable length of {MAX_WIRE_LEN}"
                )));
            }
        }

        Ok(Self {
            inner: Arc::new(MessageInner {
                payload: payload.into(),
                properties: Arc::new(properties),
            }),
        })
    }

    /// Convenience constructor for payloads with no properties.
    ///
    /// Infallible because it carries no properties and `payload.len()` is
    /// always within `usize`'s range on the targets this crate supports;
    /// payloads near `2^31` bytes in a single in-process [`Message`] are
    /// not a realistic use of this constructor, but [`Message::try_create`]
    /// is the validating path for untrusted or arbitrarily large input.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            inner: Arc::new(MessageInner {
                payload: payload.into(),
                properties: Arc::new(HashMap::new()),
            }),
        }
    }

    /// Read-only byte slice, valid for as long as this handle is alive
    /// (spec §4.1 `Content`).
    pub fn content(&self) -> &[u8] {
        &self.inner.payload
    }

    /// Cheap `Arc` clone of the property map, independent of this handle's
    /// lifetime (spec §4.1 `Properties`).
    pub fn properties(&self) -> Properties {
        Arc::clone(&self.inner.properties)
    }

    /// Number of live handles aliasing the same underlying value. Exposed
    /// for tests verifying P6 (refcount); not part of the external
    /// contract's error surface.
    pub fn strong_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Content-equality used by round-trip tests (spec §8 P5): same bytes,
    /// same properties, regardless of map iteration order.
    pub fn content_eq(&self, other: &Message) -> bool {
        self.inner.payload == other.inner.payload && self.inner.properties == other.inner.properties
    }
}
