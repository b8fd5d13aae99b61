//! Subscriber (module) interface consumed by the broker.
//!
//! # Modules
//!
//! - [`traits`]: the `Subscriber` vtable and its attach-time descriptor.

pub mod traits;

pub use traits::{Subscriber, SubscriberDescriptor};
