//! Settings domain types and validation.
//!
//! This module contains the configuration types consumed by the concrete
//! target sources. These are pure domain types with no infrastructure
//! dependencies, so they can be loaded from any serde format.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default maximum number of targets a pool hands out at once.
pub const DEFAULT_POOL_MAX_SIZE: usize = 8;

/// Default maximum number of idle targets a pool keeps around.
pub const DEFAULT_POOL_MAX_IDLE: usize = 8;

/// Upper bound accepted for `max_size`.
const MAX_POOL_SIZE: usize = 10_000;

/// Pool settings structure.
///
/// Missing fields fall back to [`PoolSettings::with_defaults`] when
/// deserialized.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of targets borrowed at the same time (1-10,000).
    pub max_size: usize,

    /// Maximum number of released targets kept for reuse.
    /// Targets released beyond this are destroyed.
    pub max_idle: usize,

    /// Number of targets created up front by `warm_up`.
    pub min_idle: usize,

    /// How long an acquisition may wait for a free slot, in milliseconds.
    /// `None` fails immediately when the pool is exhausted.
    pub max_wait_ms: Option<u64>,

    /// Validate idle targets before handing them out.
    pub test_on_borrow: bool,

    /// Validate targets when they are released.
    pub test_on_return: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl PoolSettings {
    /// Create settings with sensible defaults.
    #[must_use]
    pub const fn with_defaults() -> Self {
        Self {
            max_size: DEFAULT_POOL_MAX_SIZE,
            max_idle: DEFAULT_POOL_MAX_IDLE,
            min_idle: 0,
            max_wait_ms: None,
            test_on_borrow: false,
            test_on_return: false,
        }
    }

    /// Settings for a pool of `max_size` targets, all of which may stay idle.
    #[must_use]
    pub const fn bounded(max_size: usize) -> Self {
        Self {
            max_size,
            max_idle: max_size,
            ..Self::with_defaults()
        }
    }

    /// Set how long acquisitions may wait for a free slot.
    #[must_use]
    pub const fn with_max_wait_ms(mut self, max_wait_ms: u64) -> Self {
        self.max_wait_ms = Some(max_wait_ms);
        self
    }

    /// Set the number of targets created by `warm_up`.
    #[must_use]
    pub const fn with_min_idle(mut self, min_idle: usize) -> Self {
        self.min_idle = min_idle;
        self
    }

    /// Enable validation on borrow and on return.
    #[must_use]
    pub const fn with_validation(mut self, on_borrow: bool, on_return: bool) -> Self {
        self.test_on_borrow = on_borrow;
        self.test_on_return = on_return;
        self
    }

    /// Get the effective wait budget, if any.
    #[must_use]
    pub const fn effective_max_wait(&self) -> Option<Duration> {
        match self.max_wait_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }

    /// Merge a partial update into these settings.
    pub fn merge(&mut self, other: &PoolSettingsUpdate) {
        if let Some(max_size) = other.max_size {
            self.max_size = max_size;
        }
        if let Some(max_idle) = other.max_idle {
            self.max_idle = max_idle;
        }
        if let Some(min_idle) = other.min_idle {
            self.min_idle = min_idle;
        }
        if let Some(ref max_wait_ms) = other.max_wait_ms {
            self.max_wait_ms = *max_wait_ms;
        }
        if let Some(on_borrow) = other.test_on_borrow {
            self.test_on_borrow = on_borrow;
        }
        if let Some(on_return) = other.test_on_return {
            self.test_on_return = on_return;
        }
    }
}

/// Partial pool settings update.
///
/// `max_wait_ms` is `Option<Option<u64>>`:
/// - `None` = don't change this field
/// - `Some(None)` = fail fast when exhausted
/// - `Some(Some(ms))` = wait up to `ms`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PoolSettingsUpdate {
    pub max_size: Option<usize>,
    pub max_idle: Option<usize>,
    pub min_idle: Option<usize>,
    pub max_wait_ms: Option<Option<u64>>,
    pub test_on_borrow: Option<bool>,
    pub test_on_return: Option<bool>,
}

/// Pool settings validation error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PoolSettingsError {
    #[error("Pool max size must be between 1 and 10,000, got {0}")]
    InvalidMaxSize(usize),

    #[error("Pool max idle ({max_idle}) cannot exceed max size ({max_size})")]
    MaxIdleExceedsMaxSize { max_idle: usize, max_size: usize },

    #[error("Pool min idle ({min_idle}) cannot exceed max idle ({max_idle})")]
    MinIdleExceedsMaxIdle { min_idle: usize, max_idle: usize },
}

/// Validate pool settings values.
pub fn validate_pool_settings(settings: &PoolSettings) -> Result<(), PoolSettingsError> {
    if !(1..=MAX_POOL_SIZE).contains(&settings.max_size) {
        return Err(PoolSettingsError::InvalidMaxSize(settings.max_size));
    }

    if settings.max_idle > settings.max_size {
        return Err(PoolSettingsError::MaxIdleExceedsMaxSize {
            max_idle: settings.max_idle,
            max_size: settings.max_size,
        });
    }

    if settings.min_idle > settings.max_idle {
        return Err(PoolSettingsError::MinIdleExceedsMaxIdle {
            min_idle: settings.min_idle,
            max_idle: settings.max_idle,
        });
    }

    Ok(())
}

/// Refresh settings for sources that periodically rebuild their target.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RefreshSettings {
    /// Minimum time between two automatic refreshes, in milliseconds.
    /// `None` disables automatic refresh.
    pub refresh_check_delay_ms: Option<u64>,
}

impl RefreshSettings {
    /// Refresh at most once per `delay_ms`.
    #[must_use]
    pub const fn every_ms(delay_ms: u64) -> Self {
        Self {
            refresh_check_delay_ms: Some(delay_ms),
        }
    }

    /// Get the effective refresh delay, if automatic refresh is enabled.
    #[must_use]
    pub const fn effective_delay(&self) -> Option<Duration> {
        match self.refresh_check_delay_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }
}
