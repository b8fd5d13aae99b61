//! Error types for the [`Message`](super::Message) construction and byte-form APIs.
//!
//! Spec §6.4 and §7 reserve these error codes for the Message API only;
//! broker-boundary errors live in [`crate::broker::error::BrokerError`].

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
// (none)

/// Errors surfaced by [`Message::try_create`](super::Message::try_create),
/// [`Message::to_bytes`](super::Message::to_bytes) and
/// [`Message::from_bytes`](super::Message::from_bytes).
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum MessageError {
    /// A caller-input error: an empty property key, or (at the FFI boundary
    /// this crate's safe API makes unreachable by construction) a nonzero
    /// size with no backing bytes.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reserved for parity with the spec's error taxonomy (§6.4). Rust's
    /// global allocator aborts the process on exhaustion rather than
    /// returning an error, so no code path in this crate constructs this
    /// variant; it exists so callers matching exhaustively on the full
    /// error set compile against the same surface as the wire contract.
    #[error("allocation failed")]
    AllocationFailed,

    /// `to_bytes`/`write_to` could not produce a serialized form: either
    /// the destination buffer was too small, or the payload/a property
    /// exceeds the wire format's `0 <= size <= 2^31-1` bound.
    /// [`super::Message::try_create`] rejects oversized input up front,
    /// so in practice this only fires for a buffer that's too small, or
    /// for a message built via [`super::Message::from_payload`] with an
    /// out-of-bound payload.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    /// `from_bytes` rejected the input: truncation, an inner length
    /// exceeding the remaining input, or a version byte other than
    /// [`crate::message::codec::MESSAGE_FORMAT_VERSION`].
    #[error("malformed message bytes: {0}")]
    MalformedBytes(String),
}
