//! The subscriber (module) interface the broker consumes (spec §6.2).
//!
//! This is the boundary contract only — the module-loading glue that
//! instantiates modules from a JSON manifest and the modules themselves
//! (telemetry producer, logger, IoT-Hub bridge, ...) are out of scope
//! (spec §1).

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::message::Message;
use crate::util::ModuleHandle;

/// The callback vtable every subscriber implements (spec §6.2).
///
/// Dispatched as `Arc<dyn Subscriber>` rather than the generic,
/// zero-cost-dispatch style the teacher uses for its `Actor` trait: the
/// spec requires an opaque-handle/vtable boundary (independently authored
/// modules, no compile-time knowledge of each other's message types), so
/// dynamic dispatch is the correct shape here, not a shortcut.
///
/// # Threading
///
/// [`Subscriber::receive`] runs on this subscriber's own
/// [`DeliveryWorker`](crate::broker::worker) thread; the broker guarantees
/// calls are serialized (never two `receive` calls for the same subscriber
/// concurrently) but makes no guarantee about which thread across
/// attach/detach cycles. Implementations must not call
/// [`Broker::detach`](crate::broker::Broker::detach) on themselves
/// synchronously from within `receive` (spec §9, Open Question 2) — doing
/// so deadlocks against the worker's own join.
pub trait Subscriber: Send + Sync {
    /// Invoked once per delivered message, on this subscriber's worker
    /// thread. `message` is borrowed, not owned — clone it to retain a
    /// copy past the callback's return (spec §6.2).
    fn receive(&self, message: &Message);

    /// Invoked once after `Attach` succeeds, signaling the broker is ready
    /// to deliver (spec §6.2, optional). May publish. Default: no-op.
    fn start(&self) {}
}

/// Descriptor supplied to [`Broker::attach`](crate::broker::Broker::attach):
/// a module's identity plus its vtable (spec §6.2, §4.2 step 1).
#[derive(Clone)]
pub struct SubscriberDescriptor {
    pub module_handle: ModuleHandle,
    pub subscriber: Arc<dyn Subscriber>,
}

impl SubscriberDescriptor {
    pub fn new(module_handle: ModuleHandle, subscriber: Arc<dyn Subscriber>) -> Self {
        Self {
            module_handle,
            subscriber,
        }
    }
}

impl std::fmt::Debug for SubscriberDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberDescriptor")
            .field("module_handle", &self.module_handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSubscriber {
        received: AtomicUsize,
    }

    impl Subscriber for CountingSubscriber {
        fn receive(&self, _message: &Message) {
            self.received.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn default_start_is_a_no_op() {
        let sub = CountingSubscriber {
            received: AtomicUsize::new(0),
        };
        sub.start();
        assert_eq!(sub.received.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn descriptor_carries_handle_and_vtable() {
        let handle = ModuleHandle::new();
        let sub: Arc<dyn Subscriber> = Arc::new(CountingSubscriber {
            received: AtomicUsize::new(0),
        });
        let descriptor = SubscriberDescriptor::new(handle, sub);
        assert_eq!(descriptor.module_handle, handle);
    }
}
