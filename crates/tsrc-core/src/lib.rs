//! Core domain types and port definitions for target sources.
//!
//! A target source hands out the object an invocation is ultimately
//! delegated to. Dispatchers acquire a target right before a call and
//! release it afterwards, which lets a source pool, swap or lazily build
//! its targets without the caller knowing.
//!
//! This crate holds the [`TargetSource`] contract, the [`TargetFactory`]
//! port used by sources that build their own targets, the
//! [`TargetInvoker`] that drives the acquire/call/release sequence, and
//! the settings shared by the concrete sources in `tsrc-runtime`.
#![deny(unused_crate_dependencies)]

#[cfg(any(test, feature = "test-utils"))]
pub mod conformance;
pub mod domain;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{PoolStats, TargetType, ThreadLocalStats};
pub use ports::{
    AcquireError, FactoryError, ReleaseError, TargetFactory, TargetSource, TargetSourceError,
};
pub use services::{InvocationError, TargetInvoker};
pub use settings::{
    DEFAULT_POOL_MAX_IDLE, DEFAULT_POOL_MAX_SIZE, PoolSettings, PoolSettingsError,
    PoolSettingsUpdate, RefreshSettings, validate_pool_settings,
};

// Silence unused dev-dependency warnings for crates only used by some test modules
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tokio_test as _;
