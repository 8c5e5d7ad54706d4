//! Configuration for the sync engine.

use std::time::Duration;

/// Configuration for engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Interval of the periodic fallback drain while connected.
    ///
    /// The drain normally runs right after a mutation or a reconnect;
    /// the timer catches apply paths that fail without flipping the
    /// connection state.
    pub drain_interval: Duration,
    /// Maximum realtime events applied per pump pass.
    pub pump_batch: usize,
}

impl EngineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            drain_interval: Duration::from_secs(15),
            pump_batch: 256,
        }
    }

    /// Sets the fallback drain interval.
    #[must_use]
    pub fn with_drain_interval(mut self, interval: Duration) -> Self {
        self.drain_interval = interval;
        self
    }

    /// Sets the event pump batch limit.
    #[must_use]
    pub fn with_pump_batch(mut self, batch: usize) -> Self {
        self.pump_batch = batch;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
