//! Simulation clock and tick-to-timestamp mapping.
//!
//! The clock is the single source of truth for simulated time. It tracks
//! the current tick and maps any tick to a display [`Timestamp`]: the start
//! instant plus `tick * minutes_per_tick` minutes.
//!
//! # Design Principles
//!
//! - The tick number is the source of truth. Timestamps are derived, never
//!   stored independently.
//! - The mapping is monotonically non-decreasing but need not be injective;
//!   same-tick events are ordered by event kind, not by timestamp.
//! - Tick advancement uses checked arithmetic. Timestamp derivation
//!   saturates at the largest representable instant instead of failing.

use chrono::{DateTime, TimeDelta, Utc};
use contest_types::Timestamp;

use crate::config::ClockConfig;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration (e.g. zero minutes per tick).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Simulation clock tracking the current tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimClock {
    /// Current tick number (0-indexed).
    tick: u64,

    /// Instant that tick 0 maps to.
    start: DateTime<Utc>,

    /// Logical minutes per tick.
    minutes_per_tick: u32,
}

impl SimClock {
    /// Create a clock from configuration.
    ///
    /// `fallback_start` is used when the configuration does not pin a start
    /// instant; callers normally pass the process start time.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `minutes_per_tick` is 0.
    pub fn new(config: &ClockConfig, fallback_start: DateTime<Utc>) -> Result<Self, ClockError> {
        Self::from_parts(
            0,
            config.start_time.unwrap_or(fallback_start),
            config.minutes_per_tick,
        )
    }

    /// Create a clock from explicit parameters (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `minutes_per_tick` is 0.
    pub fn from_parts(
        tick: u64,
        start: DateTime<Utc>,
        minutes_per_tick: u32,
    ) -> Result<Self, ClockError> {
        if minutes_per_tick == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "minutes_per_tick must be at least 1".to_owned(),
            });
        }
        Ok(Self {
            tick,
            start,
            minutes_per_tick,
        })
    }

    /// Advance the clock by one tick. Returns the new tick number.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the tick counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.tick)
    }

    /// Return the current tick number.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Return the instant tick 0 maps to.
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Return the configured minutes per tick.
    pub const fn minutes_per_tick(&self) -> u32 {
        self.minutes_per_tick
    }

    /// Display timestamp for the current tick.
    pub fn now(&self) -> Timestamp {
        self.timestamp_for_tick(self.tick)
    }

    /// Map an arbitrary tick to its display timestamp.
    ///
    /// Saturates at [`DateTime::<Utc>::MAX_UTC`] for ticks beyond the
    /// representable range, which keeps the mapping monotonic.
    pub fn timestamp_for_tick(&self, tick: u64) -> Timestamp {
        let minutes = tick.saturating_mul(u64::from(self.minutes_per_tick));
        let instant = i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .and_then(|offset| self.start.checked_add_signed(offset))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Timestamp(instant)
    }
}
