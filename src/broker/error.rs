//! Broker error types with context (spec §6.4).
//!
//! This module defines every failure mode the broker's public API can
//! return. Variant names match the spec's normative error-code list so
//! tests can assert on them directly.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use thiserror::Error;

// Layer 3: Internal module imports
use crate::util::ModuleHandle;

/// Broker-level failure modes (spec §6.4).
///
/// # Design Principles
///
/// - **Contextual**: each variant carries enough information to act on.
/// - **Structured**: built with `thiserror`, no string-only errors.
///
/// # Example
///
/// ```rust
/// use broker_core::broker::BrokerError;
///
/// let error = BrokerError::NotFound;
/// assert!(error.to_string().contains("not found"));
/// ```
#[derive(Debug, Error)]
pub enum BrokerError {
    /// A caller-supplied argument was invalid (null descriptor, empty
    /// payload where one is required, and similar).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Resource allocation failed. Kept for API-surface parity with the
    /// spec's normative error taxonomy (spec §6.4); unreachable under
    /// Rust's allocator-aborts-on-OOM model.
    #[error("allocation failed")]
    AllocationFailed,

    /// `Detach` (or an internal lookup) was given a `ModuleHandle` that
    /// is not currently attached.
    #[error("subscriber not found: {0}")]
    NotFound(ModuleHandle),

    /// `Publish` delivered to at least one subscriber but failed to
    /// enqueue to at least one other; the publisher retains ownership
    /// of the original message either way (spec §4.2).
    #[error("publish partially failed: {failed} of {attempted} subscriber(s) did not receive it")]
    PartialFailure {
        /// Number of subscribers the broker attempted to enqueue to.
        attempted: usize,
        /// Number of those enqueues that failed.
        failed: usize,
    },

    /// A `DeliveryWorker` thread could not be spawned.
    #[error("worker start failed: {0}")]
    WorkerStartFailed(String),

    /// The transport inbox variant failed to initialize (socket
    /// creation or bind).
    #[error("transport init failed: {0}")]
    TransportInitFailed(String),

    /// The transport inbox variant failed to attach a subscriber
    /// (connect or subscribe).
    #[error("transport attach failed: {0}")]
    TransportAttachFailed(String),

    /// A subscriber attempted to `Detach` itself synchronously from
    /// within its own `receive` callback (spec §9, Open Question 2).
    /// This is always a programming error in the subscriber, never a
    /// transient condition: `receive` runs on the same worker thread
    /// `Detach` would have to `join`, so doing so deadlocks.
    #[error("subscriber {0} attempted to detach itself from within receive()")]
    SelfDetachFromReceive(ModuleHandle),
}
