// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use uuid::Uuid;

// Layer 3: Internal module imports
// (none)

/// Opaque module identity, compared only by bitwise equality (spec §5).
///
/// Mirrors the C gateway's `MODULE_HANDLE` (a bare `void*`): the broker never
/// dereferences it, only compares it. A module obtains one value and reuses
/// it for every call (`Attach`, `Publish`'s `source_handle`, `Detach`); two
/// different modules must never share a value.
///
/// # Example
///
/// ```rust
/// use broker_core::util::ModuleHandle;
///
/// let a = ModuleHandle::new();
/// let b = ModuleHandle::new();
/// assert_ne!(a, b);
/// assert_eq!(a, a);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle(Uuid);

impl ModuleHandle {
    /// Generate a new, globally-unique module handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an externally-supplied identity.
    ///
    /// Used at the FFI/vtable boundary (spec §6.2) where the caller already
    /// has an opaque pointer and only needs it treated as identity.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ModuleHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ModuleHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique per-`SubscriberRecord` stop sentinel (spec §3, §4.3).
///
/// Delivered into a subscriber's own inbox (either as a queue entry or as a
/// transport datagram equal to [`StopToken::as_bytes`]) to signal its
/// [`DeliveryWorker`](crate::broker::worker) to exit. 128 bits of randomness
/// make collision with a real payload's serialized bytes practically
/// impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StopToken(Uuid);

impl StopToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Canonical 16-byte wire form, used as the transport variant's sentinel
    /// datagram (spec §4.3.B).
    pub fn as_bytes(&self) -> [u8; 16] {
        *self.0.as_bytes()
    }
}

impl Default for StopToken {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for StopToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
