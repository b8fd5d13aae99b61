//! Immutable, reference-counted message value and its canonical byte form.
//!
//! # Components
//!
//! - [`Message`] — the value type (§3, §4.1).
//! - [`codec`] — `ToBytes`/`FromBytes` wire layout (§6.1, normative).
//! - [`error`] — `MessageError` (§6.4 error codes scoped to this API).
//!
//! # Modules (§4.3 style: this file only declares and re-exports)

pub mod codec;
pub mod error;
pub mod value;

pub use codec::MESSAGE_FORMAT_VERSION;
pub use error::MessageError;
pub use value::{Message, Properties};
