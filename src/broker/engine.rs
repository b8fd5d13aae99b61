//! The `Broker` engine: `New`/`IncRef`/`DecRef`/`Attach`/`Detach`/`Publish`
//! (spec §4.2).
//!
//! Grounded on `examples/original_source/core/src/broadcast_broker.c`'s
//! `Broker_Create`/`Broker_Publish`/`Module_DestroyInternal` sequencing,
//! translated from explicit C refcounting to `Arc`-backed Rust: cloning a
//! [`Broker`] plays the role of `Broker_IncRef`, and dropping the last
//! clone plays the role of the final `Broker_DecRef` that frees
//! resources.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::Mutex;
use tracing::{info, instrument, warn};

// Layer 3: Internal module imports
use crate::broker::config::{BrokerConfig, InboxVariant};
use crate::broker::error::BrokerError;
use crate::broker::guard;
use crate::broker::registry::{Registry, SubscriberRecord};
use crate::broker::worker;
use crate::message::Message;
use crate::subscriber::SubscriberDescriptor;
use crate::util::{ModuleHandle, StopToken};

#[cfg(feature = "transport")]
use crate::broker::transport::{self, TransportEndpoint};

enum Strategy {
    InMemory,
    #[cfg(feature = "transport")]
    Transport(Arc<TransportEndpoint>),
}

struct Inner {
    config: BrokerConfig,
    registry: Mutex<Registry>,
    strategy: Strategy,
}

/// The message broker (spec §4.2).
///
/// Reference-counted like every other handle in this crate: clone it to
/// play the role of `Broker_IncRef`, drop the last clone to play the role
/// of the final `Broker_DecRef` (spec §4.2, P6). All methods take `&self`
/// and are safe to call from any thread, including concurrently with
/// each other.
#[derive(Clone)]
pub struct Broker {
    inner: Arc<Inner>,
}

impl Broker {
    /// Create a new broker (spec §4.2 `New`).
    pub fn new(config: BrokerConfig) -> Result<Self, BrokerError> {
        config.validate().map_err(BrokerError::InvalidArgument)?;

        let strategy = match config.inbox_variant {
            InboxVariant::InMemory => Strategy::InMemory,
            #[allow(unreachable_patterns)]
            InboxVariant::Transport => {
                #[cfg(feature = "transport")]
                {
                    Strategy::Transport(Arc::new(TransportEndpoint::new()?))
                }
                #[cfg(not(feature = "transport"))]
                {
                    return Err(BrokerError::TransportInitFailed(
                        "the \"transport\" feature is not enabled".to_string(),
                    ));
                }
            }
        };

        info!(inbox_variant = ?config.inbox_variant, "broker created");
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                registry: Mutex::new(Registry::new()),
                strategy,
            }),
        })
    }

    /// Number of live handles to this broker (spec §4.2 P6 test helper).
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.registry.lock().len()
    }

    /// Attach a subscriber (spec §4.2 `Attach`).
    ///
    /// All-or-nothing: if the worker thread fails to start, or (for the
    /// transport variant) the subscribe socket fails to connect, no
    /// record is left behind and the registry is unchanged.
    #[instrument(skip(self, descriptor), fields(module_handle = %descriptor.module_handle))]
    pub fn attach(&self, descriptor: SubscriberDescriptor) -> Result<(), BrokerError> {
        let mut registry = self.inner.registry.lock();
        if registry.contains(descriptor.module_handle) {
            return Err(BrokerError::InvalidArgument(format!(
                "module {} is already attached",
                descriptor.module_handle
            )));
        }

        let stop_token = StopToken::new();
        let record = match &self.inner.strategy {
            Strategy::InMemory => {
                let (inbox, handle, state) = worker::spawn(
                    descriptor.module_handle,
                    Arc::clone(&descriptor.subscriber),
                    self.inner.config.high_water_mark,
                )?;
                SubscriberRecord::new(
                    descriptor.module_handle,
                    descriptor.subscriber.clone(),
                    inbox,
                    stop_token,
                    state,
                    handle,
                )
            }
            #[cfg(feature = "transport")]
            Strategy::Transport(endpoint) => {
                let (inbox, handle, state) = transport::spawn(
                    descriptor.module_handle,
                    Arc::clone(&descriptor.subscriber),
                    Arc::clone(endpoint),
                    stop_token,
                )?;
                SubscriberRecord::new(
                    descriptor.module_handle,
                    descriptor.subscriber.clone(),
                    inbox,
                    stop_token,
                    state,
                    handle,
                )
            }
        };

        registry.attach(record);
        drop(registry);

        if self.inner.config.attach_start_callback_enabled {
            descriptor.subscriber.start();
        }
        Ok(())
    }

    /// Detach a subscriber (spec §4.2 `Detach`).
    ///
    /// Locates the record by handle identity, removes it from the
    /// registry (so no further `Publish` call can target it), signals
    /// its worker to stop, joins the thread, and drains any residual
    /// messages. Safe to call concurrently with `Publish` (spec §4.2).
    #[instrument(skip(self))]
    pub fn detach(&self, module_handle: ModuleHandle) -> Result<(), BrokerError> {
        if guard::currently_delivering() == Some(module_handle) {
            return Err(BrokerError::SelfDetachFromReceive(module_handle));
        }

        let record = {
            let mut registry = self.inner.registry.lock();
            registry.remove(module_handle)?
        };
        record.stop_and_join();
        Ok(())
    }

    /// Publish a message to every attached subscriber except `source`
    /// (spec §4.2 `Publish`, P2, P4).
    ///
    /// The publisher retains ownership of `message` regardless of
    /// outcome. A per-subscriber enqueue failure is logged and excluded
    /// from the count of successful deliveries, but does not abort
    /// delivery to the remaining subscribers (spec §4.2: isolated,
    /// best-effort).
    #[instrument(skip(self, message), fields(source = ?source))]
    pub fn publish(&self, source: Option<ModuleHandle>, message: &Message) -> Result<(), BrokerError> {
        match &self.inner.strategy {
            Strategy::InMemory => self.publish_in_memory(source, message),
            #[cfg(feature = "transport")]
            Strategy::Transport(endpoint) => endpoint.publish(source, message),
        }
    }

    fn publish_in_memory(
        &self,
        source: Option<ModuleHandle>,
        message: &Message,
    ) -> Result<(), BrokerError> {
        let registry = self.inner.registry.lock();
        let mut attempted = 0usize;
        let mut failed = 0usize;
        for record in registry.iter() {
            if Some(record.module_handle) == source {
                continue;
            }
            attempted += 1;
            if let Err(e) = record.inbox.enqueue(message.clone()) {
                warn!(module_handle = %record.module_handle, error = %e, "publish enqueue failed");
                failed += 1;
            }
        }
        drop(registry);

        if failed > 0 {
            Err(BrokerError::PartialFailure { attempted, failed })
        } else {
            Ok(())
        }
    }
}
