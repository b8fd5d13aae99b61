//! The message broker: registry, delivery workers, and the two `Inbox`
//! strategies (spec §4.2, §4.3, §4.4).
//!
//! # Modules
//!
//! - [`engine`]: the [`Broker`] handle itself — `new`/`attach`/`detach`/
//!   `publish`, reference-counted like every other handle in this crate.
//! - [`config`]: [`BrokerConfig`] and its builder (spec §6.3).
//! - [`error`]: [`BrokerError`] (spec §6.4).
//! - [`registry`]: the attached-subscriber table.
//! - [`inbox`]: the `Inbox` trait both delivery strategies implement.
//! - [`worker`]: the in-memory `Inbox` and `DeliveryWorker` state machine
//!   (spec §4.3 variant A, §4.4).
//! - [`transport`] (feature `transport`): the `inproc://` pub/sub `Inbox`
//!   (spec §4.3 variant B).
//! - [`guard`]: self-detach-from-`receive` detection (spec §9).

pub mod config;
pub mod engine;
pub mod error;
pub(crate) mod guard;
pub mod inbox;
pub mod registry;
#[cfg(feature = "transport")]
pub mod transport;
pub mod worker;

pub use config::{BrokerConfig, BrokerConfigBuilder, InboxVariant};
pub use engine::Broker;
pub use error::BrokerError;
pub use worker::WorkerState;
