//! # broker-core — in-process pub/sub message broker
//!
//! A reference-counted, thread-safe message broker for composing
//! independently-authored modules inside a single process: modules
//! attach as subscribers, publish [`Message`](message::Message) values
//! through the broker, and are delivered every message except their own
//! (spec §4.2).
//!
//! # Quick Start
//!
//! ```rust
//! use broker_core::broker::{Broker, BrokerConfig};
//! use broker_core::message::Message;
//! use broker_core::subscriber::{Subscriber, SubscriberDescriptor};
//! use broker_core::util::ModuleHandle;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! struct Printer(AtomicUsize);
//!
//! impl Subscriber for Printer {
//!     fn receive(&self, message: &Message) {
//!         self.0.fetch_add(message.content().len(), Ordering::SeqCst);
//!     }
//! }
//!
//! let broker = Broker::new(BrokerConfig::default()).unwrap();
//! let handle = ModuleHandle::new();
//! let printer = Arc::new(Printer(AtomicUsize::new(0)));
//! broker
//!     .attach(SubscriberDescriptor::new(handle, printer))
//!     .unwrap();
//! broker.publish(None, &Message::from_payload(b"hello")).unwrap();
//! broker.detach(handle).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`message`]: the immutable, reference-counted [`Message`](message::Message)
//!   value and its canonical byte form (spec §3, §4.1, §6.1).
//! - [`broker`]: the [`Broker`](broker::Broker) engine, its configuration,
//!   errors, registry, and the two delivery strategies (spec §4.2–§4.4,
//!   §6.3, §6.4).
//! - [`subscriber`]: the [`Subscriber`](subscriber::Subscriber) vtable
//!   every attached module implements (spec §6.2).
//! - [`util`]: [`ModuleHandle`](util::ModuleHandle) and
//!   [`StopToken`](util::StopToken), the opaque identity types threaded
//!   through the public API (spec §5).
//!
//! # Non-goals
//!
//! This crate is the broker core only: it does not load modules from a
//! manifest, ship a logger/telemetry module, or bridge to any external
//! message service. See each module's documentation for what it
//! deliberately does not cover.

pub mod broker;
pub mod message;
pub mod subscriber;
pub mod util;

pub use broker::{Broker, BrokerConfig, BrokerError};
pub use message::{Message, MessageError};
pub use subscriber::{Subscriber, SubscriberDescriptor};
pub use util::{ModuleHandle, StopToken};
