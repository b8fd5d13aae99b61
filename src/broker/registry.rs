//! Attached-subscriber registry (spec §4.2).
//!
//! Grounded on `examples/original_source/core/src/broadcast_broker.c`'s
//! `modules` list (a flat, lock-guarded collection searched linearly by
//! handle identity) rather than the teacher's `DashMap`-backed
//! `ActorRegistry`: the spec requires stable insertion order and
//! identity-equality lookup by an opaque handle, which a concurrent hash
//! map cannot provide without giving up one or the other.

// Layer 1: Standard library imports
use std::mem;
use std::sync::Arc;
use std::thread::JoinHandle;

// Layer 2: Third-party crate imports
use tracing::warn;

// Layer 3: Internal module imports
use crate::broker::error::BrokerError;
use crate::broker::inbox::Inbox;
use crate::broker::worker::WorkerStateHandle;
use crate::subscriber::Subscriber;
use crate::util::{ModuleHandle, StopToken};

/// Everything the broker keeps per attached subscriber (spec §4.2).
pub struct SubscriberRecord {
    pub module_handle: ModuleHandle,
    pub subscriber: Arc<dyn Subscriber>,
    pub inbox: Arc<dyn Inbox>,
    pub stop_token: StopToken,
    pub worker_state: WorkerStateHandle,
    worker_handle: Option<JoinHandle<()>>,
}

impl SubscriberRecord {
    pub fn new(
        module_handle: ModuleHandle,
        subscriber: Arc<dyn Subscriber>,
        inbox: Arc<dyn Inbox>,
        stop_token: StopToken,
        worker_state: WorkerStateHandle,
        worker_handle: JoinHandle<()>,
    ) -> Self {
        Self {
            module_handle,
            subscriber,
            inbox,
            stop_token,
            worker_state,
            worker_handle: Some(worker_handle),
        }
    }

    /// Signal the worker to stop and block until it exits. Consumes the
    /// record's thread handle; safe to call at most once (`Broker::detach`
    /// removes the record from the registry before calling this, so
    /// there is no way to reach it twice).
    pub fn stop_and_join(mut self) {
        self.inbox.post_stop(self.stop_token);
        if let Some(handle) = self.worker_handle.take() {
            let _ = handle.join();
        }
        self.inbox.drain_residual();
    }
}

/// The ordered, lock-guarded collection of attached subscribers (spec
/// §4.2). Iteration order is insertion order; lookup is by
/// [`ModuleHandle`] bitwise equality, never by any derived hash.
#[derive(Default)]
pub struct Registry {
    records: Vec<SubscriberRecord>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn attach(&mut self, record: SubscriberRecord) {
        self.records.push(record);
    }

    /// Remove and return the record for `handle`, or `NotFound` (spec
    /// §4.2 `Detach` step 1).
    pub fn remove(&mut self, handle: ModuleHandle) -> Result<SubscriberRecord, BrokerError> {
        let index = self
            .records
            .iter()
            .position(|r| r.module_handle == handle)
            .ok_or(BrokerError::NotFound(handle))?;
        Ok(self.records.remove(index))
    }

    pub fn contains(&self, handle: ModuleHandle) -> bool {
        self.records.iter().any(|r| r.module_handle == handle)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubscriberRecord> {
        self.records.iter()
    }
}

impl Drop for Registry {
    /// Stop and join every still-attached subscriber's worker thread
    /// (spec §4.5: destroying a broker with subscribers attached SHOULD
    /// log a warning but still free the broker's own resources).
    ///
    /// Without this, dropping the last `Broker` handle would drop
    /// `records` field-by-field, abandoning each `worker_handle` un-joined
    /// — the delivery thread would stay parked on its condvar forever.
    fn drop(&mut self) {
        let records = mem::take(&mut self.records);
        if !records.is_empty() {
            warn!(
                count = records.len(),
                "broker dropped with subscribers still attached; stopping their workers"
            );
        }
        for record in records {
            record.stop_and_join();
        }
    }
}
