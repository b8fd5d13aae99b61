//! The `Inbox` trait unifying both delivery mechanisms (spec §4.3).
//!
//! [`crate::broker::worker::InMemoryInbox`] and, behind the `transport`
//! feature, [`crate::broker::transport::TransportInbox`] both implement
//! this so `Broker::attach`/`publish`/`detach` do not need to know which
//! variant a given subscriber was attached with.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::broker::error::BrokerError;
use crate::message::Message;
use crate::util::StopToken;

/// Delivery channel into one subscriber's [`DeliveryWorker`](crate::broker::worker).
pub trait Inbox: Send + Sync {
    /// Enqueue a message for delivery. Best-effort, non-blocking (spec
    /// §4.2): failure is reported, never retried or queued past this
    /// call.
    fn enqueue(&self, message: Message) -> Result<(), BrokerError>;

    /// Post the stop sentinel, signaling the worker to exit (spec §4.2
    /// step 2).
    fn post_stop(&self, token: StopToken);

    /// Discard any messages still queued. Called after the worker
    /// thread has been joined (spec §4.2 step 5).
    fn drain_residual(&self);
}
