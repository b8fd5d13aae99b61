//! Broker configuration with sensible defaults (spec §6.3).

// Layer 1: Standard library
// (none)

// Layer 2: Third-party
use serde::{Deserialize, Serialize};

// Layer 3: Internal
// (none)

/// Default inbox strategy: in-process queue, no transport dependency.
pub const DEFAULT_INBOX_VARIANT: InboxVariant = InboxVariant::InMemory;

/// Default `start()` callback behavior: fire it (spec §6.3).
pub const DEFAULT_ATTACH_START_CALLBACK_ENABLED: bool = true;

/// Default high-water mark for the in-memory inbox queue (spec §3, Open
/// Question 3): an observability threshold, not an enforced bound — the
/// in-memory variant never blocks or drops on enqueue. `0` disables the
/// warning entirely.
pub const DEFAULT_HIGH_WATER_MARK: usize = 10_000;

/// Which `Inbox`/worker implementation `Broker::attach` spawns for each
/// subscriber (spec §4.3).
///
/// Both variants are wire-compatible in the sense that they deliver the
/// same [`Message`](crate::message::Message) content to `receive` — they
/// differ only in the mechanism moving bytes from `Publish` to the
/// subscriber's worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InboxVariant {
    /// A `Mutex`-guarded queue plus condition variable, entirely
    /// in-process (spec §4.3 variant A).
    InMemory,
    /// A broker-owned `inproc://` publish endpoint with one subscribe
    /// endpoint per subscriber (spec §4.3 variant B). Requires the
    /// `transport` feature.
    Transport,
}

impl Default for InboxVariant {
    fn default() -> Self {
        DEFAULT_INBOX_VARIANT
    }
}

/// Broker-wide configuration (spec §6.3).
///
/// # Examples
///
/// ```rust
/// use broker_core::broker::BrokerConfig;
///
/// let config = BrokerConfig::default();
/// assert!(config.attach_start_callback_enabled);
///
/// let config = BrokerConfig::builder()
///     .with_attach_start_callback_enabled(false)
///     .build()
///     .unwrap();
/// assert!(!config.attach_start_callback_enabled);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Which inbox/worker strategy `attach` uses for new subscribers.
    pub inbox_variant: InboxVariant,

    /// Whether `Subscriber::start` is invoked once after `attach`
    /// succeeds (spec §6.2, §6.3).
    pub attach_start_callback_enabled: bool,

    /// Queue length at which the in-memory inbox logs a warning about
    /// unbounded growth (spec §3, Open Question 3). Purely observational:
    /// the queue keeps growing past this point rather than applying any
    /// backpressure, since the spec mandates non-blocking, best-effort
    /// delivery. `0` disables the warning. Ignored by the `Transport`
    /// variant, which has no broker-owned queue to measure.
    pub high_water_mark: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            inbox_variant: DEFAULT_INBOX_VARIANT,
            attach_start_callback_enabled: DEFAULT_ATTACH_START_CALLBACK_ENABLED,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
        }
    }
}

impl BrokerConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> BrokerConfigBuilder {
        BrokerConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        #[cfg(not(feature = "transport"))]
        if self.inbox_variant == InboxVariant::Transport {
            return Err(
                "inbox_variant = Transport requires the \"transport\" feature".to_string(),
            );
        }
        Ok(())
    }
}

/// Fluent builder for [`BrokerConfig`].
#[derive(Debug, Default)]
pub struct BrokerConfigBuilder {
    config: BrokerConfig,
}

impl BrokerConfigBuilder {
    /// Select the inbox/worker strategy.
    pub fn with_inbox_variant(mut self, variant: InboxVariant) -> Self {
        self.config.inbox_variant = variant;
        self
    }

    /// Enable or disable the post-attach `start()` callback.
    pub fn with_attach_start_callback_enabled(mut self, enabled: bool) -> Self {
        self.config.attach_start_callback_enabled = enabled;
        self
    }

    /// Set the in-memory inbox's high-water-mark warning threshold. `0`
    /// disables the warning.
    pub fn with_high_water_mark(mut self, high_water_mark: usize) -> Self {
        self.config.high_water_mark = high_water_mark;
        self
    }

    /// Validate and produce the final [`BrokerConfig`].
    pub fn build(self) -> Result<BrokerConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
