//! Small identity types shared across the broker core.
//!
//! - [`ModuleHandle`]: opaque subscriber identity (spec §5).
//! - [`StopToken`]: per-subscriber worker shutdown sentinel (spec §3, §4.3).

pub mod ids;

pub use ids::{ModuleHandle, StopToken};
