//! In-memory `Inbox` and the `DeliveryWorker` state machine (spec §4.3
//! variant A, §4.4).
//!
//! Grounded on `examples/original_source/core/src/broadcast_broker.c`'s
//! `module_worker` loop (lock, drain-or-wait, unlock-and-deliver) and on
//! the teacher's [`ActorLifecycle`](crate::broker) state-enum style —
//! translated from the teacher's async/tokio mechanics to the blocking
//! `std::thread` + `parking_lot` mechanics the spec requires.

// Layer 1: Standard library imports
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

// Layer 2: Third-party crate imports
use parking_lot::{Condvar, Mutex};
use tracing::{error, warn};

// Layer 3: Internal module imports
use crate::broker::error::BrokerError;
use crate::broker::guard;
use crate::broker::inbox::Inbox;
use crate::message::Message;
use crate::subscriber::Subscriber;
use crate::util::{ModuleHandle, StopToken};

/// `DeliveryWorker` lifecycle (spec §4.4).
///
/// ```text
/// Starting -> Running -> Stopping -> Exited
/// ```
///
/// `Starting` is observable only for the brief window between
/// `thread::spawn` returning and the worker thread acquiring the inbox
/// lock for the first time; `attach` waits for `Running` before invoking
/// `Subscriber::start` (spec §9, Open Question 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Thread spawned, has not yet acquired the inbox lock.
    Starting,
    /// Delivering messages (or blocked waiting for one).
    Running,
    /// Stop token observed; draining residual messages without
    /// delivering them.
    Stopping,
    /// Loop returned; the thread is about to terminate.
    Exited,
}

impl From<WorkerState> for u8 {
    fn from(state: WorkerState) -> Self {
        match state {
            WorkerState::Starting => 0,
            WorkerState::Running => 1,
            WorkerState::Stopping => 2,
            WorkerState::Exited => 3,
        }
    }
}

impl From<u8> for WorkerState {
    fn from(value: u8) -> Self {
        match value {
            0 => WorkerState::Starting,
            1 => WorkerState::Running,
            2 => WorkerState::Stopping,
            _ => WorkerState::Exited,
        }
    }
}

/// Shared, lock-free handle onto a worker's current [`WorkerState`].
#[derive(Debug, Clone)]
pub struct WorkerStateHandle(Arc<AtomicU8>);

impl WorkerStateHandle {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WorkerState::Starting.into())))
    }

    pub fn get(&self) -> WorkerState {
        self.0.load(Ordering::Acquire).into()
    }

    pub(crate) fn set(&self, state: WorkerState) {
        self.0.store(state.into(), Ordering::Release);
    }
}

enum InboxItem {
    Deliver(Message),
    Stop(StopToken),
}

struct Shared {
    queue: Mutex<VecDeque<InboxItem>>,
    condvar: Condvar,
    ready: Mutex<bool>,
    ready_condvar: Condvar,
    /// Queue length at which `enqueue` logs a warning (spec §3, Open
    /// Question 3). `0` disables the warning.
    high_water_mark: usize,
    /// Set once the high-water mark has been crossed, so the warning
    /// fires on the upward crossing only, not on every enqueue past it.
    high_water_mark_hit: AtomicBool,
}

/// In-process queue feeding one subscriber's [`DeliveryWorker`] (spec §4.3
/// variant A).
///
/// Enqueueing never fails in this variant: a `Mutex<VecDeque<_>>` grows
/// until the allocator itself gives up, which Rust treats as an abort
/// rather than a recoverable error. The `Result` return exists so callers
/// can treat both inbox variants uniformly.
pub struct InMemoryInbox {
    shared: Arc<Shared>,
}

impl Inbox for InMemoryInbox {
    /// Enqueue a message for delivery, waking the worker if it is
    /// blocked waiting (spec §4.3.A).
    fn enqueue(&self, message: Message) -> Result<(), BrokerError> {
        let mut queue = self.shared.queue.lock();
        queue.push_back(InboxItem::Deliver(message));
        let len = queue.len();
        drop(queue);
        self.shared.condvar.notify_one();

        let high_water_mark = self.shared.high_water_mark;
        if high_water_mark > 0 {
            if len > high_water_mark {
                if !self
                    .shared
                    .high_water_mark_hit
                    .swap(true, Ordering::Relaxed)
                {
                    warn!(
                        queue_len = len,
                        high_water_mark, "in-memory inbox queue exceeded high-water mark"
                    );
                }
            } else {
                self.shared
                    .high_water_mark_hit
                    .store(false, Ordering::Relaxed);
            }
        }
        Ok(())
    }

    /// Post the stop sentinel, waking the worker so it observes it
    /// promptly (spec §4.2 step 2).
    ///
    /// Posted through the same mutex every `enqueue` uses, so a message
    /// enqueued before this call is always delivered before the worker
    /// sees the stop token — there is no race between a publish in
    /// flight and a concurrent detach.
    fn post_stop(&self, token: StopToken) {
        let mut queue = self.shared.queue.lock();
        queue.push_back(InboxItem::Stop(token));
        self.shared.condvar.notify_one();
    }

    /// Remove and drop any messages still queued. Called by `detach`
    /// after `join` returns as a defense-in-depth measure — the worker
    /// itself already drains on the way to `Exited`, so under normal
    /// operation this finds nothing (spec §4.2 step 5).
    fn drain_residual(&self) {
        self.shared.queue.lock().clear();
    }
}

/// Spawn a [`DeliveryWorker`] thread backed by an [`InMemoryInbox`].
///
/// Returns the inbox handle (for `Publish`/`Detach` to post into) and the
/// thread's `JoinHandle` plus its queryable [`WorkerStateHandle`]. Blocks
/// the calling thread briefly until the worker has acquired the inbox
/// lock for the first time and transitioned to `Running` (spec §9, Open
/// Question 1) — this keeps `attach`'s `start()` callback ordering
/// deterministic without coupling it to the worker's internal loop
/// structure.
///
/// `high_water_mark` configures the observability-only queue-length
/// warning (spec §3, Open Question 3); `0` disables it.
pub fn spawn(
    module_handle: ModuleHandle,
    subscriber: Arc<dyn Subscriber>,
    high_water_mark: usize,
) -> Result<(Arc<InMemoryInbox>, JoinHandle<()>, WorkerStateHandle), BrokerError> {
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::new()),
        condvar: Condvar::new(),
        ready: Mutex::new(false),
        ready_condvar: Condvar::new(),
        high_water_mark,
        high_water_mark_hit: AtomicBool::new(false),
    });
    let inbox = Arc::new(InMemoryInbox {
        shared: Arc::clone(&shared),
    });
    let state = WorkerStateHandle::new();

    let thread_shared = Arc::clone(&shared);
    let thread_state = state.clone();
    let handle = thread::Builder::new()
        .name(format!("broker-worker-{module_handle}"))
        .spawn(move || run(thread_shared, thread_state, module_handle, subscriber))
        .map_err(|e| BrokerError::WorkerStartFailed(e.to_string()))?;

    let mut ready = shared.ready.lock();
    while !*ready {
        shared.ready_condvar.wait(&mut ready);
    }

    Ok((inbox, handle, state))
}

fn run(
    shared: Arc<Shared>,
    state: WorkerStateHandle,
    module_handle: ModuleHandle,
    subscriber: Arc<dyn Subscriber>,
) {
    let mut queue = shared.queue.lock();
    state.set(WorkerState::Running);
    *shared.ready.lock() = true;
    shared.ready_condvar.notify_all();

    loop {
        match queue.pop_front() {
            Some(InboxItem::Deliver(message)) => {
                drop(queue);
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| {
                    guard::deliver(module_handle, || subscriber.receive(&message))
                })) {
                    error!(?panic, "subscriber receive() panicked");
                }
                queue = shared.queue.lock();
            }
            Some(InboxItem::Stop(_)) => {
                state.set(WorkerState::Stopping);
                break;
            }
            None => {
                shared.condvar.wait(&mut queue);
            }
        }
    }

    // Drain without delivering: messages enqueued in the narrow window
    // between the stop token being posted and this point are discarded
    // rather than delivered (spec §4.4: no `receive` calls survive past
    // `Stopping`).
    let residual = queue.len();
    if residual > 0 {
        warn!(residual, "dropping residual messages on worker shutdown");
    }
    queue.clear();
    drop(queue);

    state.set(WorkerState::Exited);
}
