//! Port definitions (trait abstractions) for target sources.
//!
//! Ports define the interfaces that dispatchers expect from whatever
//! supplies their targets. They contain no implementation details.
//!
//! # Design Rules
//!
//! - "No target" is `Ok(None)`, never an error
//! - Failures are reported to the caller, never retried inside a port
//! - Error payloads are plain strings so adapters stay decoupled from
//!   whatever produced the failure

pub mod target_factory;
pub mod target_source;

use thiserror::Error;

pub use target_factory::TargetFactory;
pub use target_source::TargetSource;

use crate::settings::PoolSettingsError;

/// Resolution errors raised while acquiring a target.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Every target the source may hand out is currently borrowed.
    #[error("Target source exhausted: all {max_size} targets are in use")]
    Exhausted { max_size: usize },

    /// Waiting for a target to become available took too long.
    #[error("Timed out after {waited_ms}ms waiting for a target")]
    Timeout { waited_ms: u64 },

    /// The factory failed to produce a target.
    #[error("Failed to create target: {0}")]
    Creation(#[from] FactoryError),

    /// The source is in a state where it cannot produce a target.
    #[error("Target source in invalid state: {0}")]
    InvalidState(String),

    /// The source was closed and no longer hands out targets.
    #[error("Target source is closed")]
    Closed,
}

/// Errors raised while releasing a previously acquired target.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The target was not obtained from this source, or was already released.
    #[error("Target was not acquired from this source: {0}")]
    Foreign(String),

    /// A type-erased source received a value of another type.
    #[error("Cannot release target: expected {expected}")]
    TypeMismatch { expected: &'static str },

    /// Disposing of the target failed.
    #[error("Failed to dispose of target: {0}")]
    Disposal(#[from] FactoryError),
}

/// Errors raised by a [`TargetFactory`].
#[derive(Debug, Error)]
pub enum FactoryError {
    /// The factory could not build a new target.
    #[error("Create failed: {0}")]
    Create(String),

    /// The factory could not tear down a target.
    #[error("Destroy failed: {0}")]
    Destroy(String),

    /// Any other failure bubbling up from user code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Umbrella error for callers that want a single error type.
///
/// Adapters should map this to their own error types (HTTP status codes,
/// CLI exit codes, RPC statuses).
#[derive(Debug, Error)]
pub enum TargetSourceError {
    /// Acquiring a target failed.
    #[error(transparent)]
    Acquire(#[from] AcquireError),

    /// Releasing a target failed.
    #[error(transparent)]
    Release(#[from] ReleaseError),

    /// The source was configured with invalid settings.
    #[error(transparent)]
    Settings(#[from] PoolSettingsError),
}
