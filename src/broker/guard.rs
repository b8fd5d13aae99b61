//! Thread-local bookkeeping used to reject a subscriber detaching itself
//! synchronously from within its own `receive` callback (spec §9, Open
//! Question 2).
//!
//! `receive` runs on the subscriber's own `DeliveryWorker` thread;
//! `Broker::detach` has to `join` that same thread, so a self-detach
//! call made from inside `receive` would deadlock. Both
//! [`crate::broker::worker`] and [`crate::broker::transport`] wrap every
//! `receive` call with [`deliver`]; [`Broker::detach`](crate::broker::Broker::detach)
//! checks [`currently_delivering`] before doing anything else.

// Layer 1: Standard library imports
use std::cell::Cell;

// Layer 3: Internal module imports
use crate::util::ModuleHandle;

thread_local! {
    static DELIVERING: Cell<Option<ModuleHandle>> = const { Cell::new(None) };
}

/// Run `f` (a single `receive` call) with `handle` marked as "currently
/// delivering" on this thread for its duration.
pub(crate) fn deliver<R>(handle: ModuleHandle, f: impl FnOnce() -> R) -> R {
    let previous = DELIVERING.with(|cell| cell.replace(Some(handle)));
    let result = f();
    DELIVERING.with(|cell| cell.set(previous));
    result
}

/// The subscriber, if any, whose `receive` is on the call stack of the
/// current thread right now.
pub(crate) fn currently_delivering() -> Option<ModuleHandle> {
    DELIVERING.with(|cell| cell.get())
}
