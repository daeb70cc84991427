//! Timing and limit configuration for sessions.

use std::time::Duration;

use crate::error::{Error, Result};

/// Session timing and limit configuration.
///
/// Fixed at connection creation. The probe interval is kept strictly below
/// the liveness deadline (9/10 of it when derived) so a ping is always on
/// the wire before the peer's deadline can expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Deadline for a single write to the transport.
    ///
    /// Default: 10 seconds
    pub write_wait: Duration,

    /// Liveness deadline on the accept side, refreshed by received pongs.
    ///
    /// Default: 60 seconds
    pub pong_wait: Duration,

    /// Interval between keepalive probes. Must stay below `pong_wait`.
    ///
    /// Default: 9/10 of `pong_wait` (54 seconds)
    pub ping_period: Duration,

    /// Maximum message size advertised to the transport, which enforces it
    /// before bytes reach the session layer.
    ///
    /// Default: 512 bytes
    pub max_message_size: usize,

    /// Capacity of the inbound and outbound channels. The default of one
    /// slot keeps backpressure tight: an undrained consumer stalls the read
    /// pump after a single buffered message.
    ///
    /// Default: 1
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            write_wait: Duration::from_secs(10),
            pong_wait,
            ping_period: pong_wait * 9 / 10,
            max_message_size: 512,
            channel_capacity: 1,
        }
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-write deadline.
    #[must_use]
    pub const fn with_write_wait(mut self, wait: Duration) -> Self {
        self.write_wait = wait;
        self
    }

    /// Set the liveness deadline and derive a matching probe interval
    /// (9/10 of the deadline).
    #[must_use]
    pub fn with_pong_wait(mut self, wait: Duration) -> Self {
        self.pong_wait = wait;
        self.ping_period = wait * 9 / 10;
        self
    }

    /// Set the probe interval directly. Must stay below `pong_wait`.
    #[must_use]
    pub const fn with_ping_period(mut self, period: Duration) -> Self {
        self.ping_period = period;
        self
    }

    /// Set the maximum message size advertised to the transport.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    /// Set the inbound/outbound channel capacity.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Validate the relationships between the timing fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if any duration is zero, the channel
    /// capacity is zero, or `ping_period` is not strictly below `pong_wait`.
    pub fn validate(&self) -> Result<()> {
        if self.write_wait.is_zero() {
            return Err(Error::InvalidConfig("write_wait must be non-zero".into()));
        }
        if self.pong_wait.is_zero() {
            return Err(Error::InvalidConfig("pong_wait must be non-zero".into()));
        }
        if self.ping_period.is_zero() {
            return Err(Error::InvalidConfig("ping_period must be non-zero".into()));
        }
        if self.ping_period >= self.pong_wait {
            return Err(Error::InvalidConfig(format!(
                "ping_period ({:?}) must be strictly below pong_wait ({:?})",
                self.ping_period, self.pong_wait
            )));
        }
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel_capacity must be non-zero".into(),
            ));
        }
        Ok(())
    }
}
