//! Contract checks for [`TargetSource`] implementations.
//!
//! Every check drives a source through a short scenario and reports the
//! first broken rule as a [`ConformanceViolation`]. Implementations run
//! these from their own test suites (enable the `test-utils` feature).

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

use crate::ports::{AcquireError, ReleaseError, TargetSource};

/// A broken [`TargetSource`] rule.
#[derive(Debug, Error)]
pub enum ConformanceViolation {
    #[error("Acquisition failed unexpectedly: {0}")]
    Acquire(#[from] AcquireError),

    #[error("Release failed unexpectedly: {0}")]
    Release(#[from] ReleaseError),

    #[error("Source is not static")]
    NotStatic,

    #[error("Source is static but the check requires a dynamic source")]
    NotDynamic,

    #[error("Static source returned a different target on acquisition {round}")]
    StaticTargetChanged { round: usize },

    #[error("Source reported no target on acquisition {round}")]
    MissingTarget { round: usize },

    #[error("Acquired a target that is not a {declared}")]
    TypeMismatch { declared: &'static str },

    #[error("Source handed out more than {capacity} targets at once")]
    CapacityExceeded { capacity: usize },

    #[error("Releasing a foreign target was accepted")]
    ForeignReleaseAccepted,
}

/// Check that a static source returns the same target `rounds` times.
pub async fn check_static_consistency<S>(
    source: &S,
    rounds: usize,
) -> Result<(), ConformanceViolation>
where
    S: TargetSource,
{
    if !source.is_static() {
        return Err(ConformanceViolation::NotStatic);
    }

    let first = source.acquire().await?;
    for round in 1..rounds.max(2) {
        let next = source.acquire().await?;
        let same = match (&first, &next) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if !same {
            return Err(ConformanceViolation::StaticTargetChanged { round });
        }
    }
    Ok(())
}

/// Check that every target acquired over `rounds` matches the declared type.
///
/// Sources that declare no type pass trivially.
pub async fn check_type_soundness<S>(source: &S, rounds: usize) -> Result<(), ConformanceViolation>
where
    S: TargetSource,
    S::Target: Sized,
{
    check_declared_type(source, rounds, |target| target as &dyn Any).await
}

/// [`check_type_soundness`] for type-erased sources.
pub async fn check_erased_type_soundness<S>(
    source: &S,
    rounds: usize,
) -> Result<(), ConformanceViolation>
where
    S: TargetSource<Target = dyn Any + Send + Sync>,
{
    check_declared_type(source, rounds, |target| target as &dyn Any).await
}

async fn check_declared_type<S>(
    source: &S,
    rounds: usize,
    view: fn(&S::Target) -> &dyn Any,
) -> Result<(), ConformanceViolation>
where
    S: TargetSource,
{
    let Some(declared) = source.target_type() else {
        return Ok(());
    };

    for _ in 0..rounds {
        let Some(target) = source.acquire().await? else {
            continue;
        };
        let matches = declared.is_type_of(view(&*target));
        if !source.is_static() {
            source.release(target).await?;
        }
        if !matches {
            return Err(ConformanceViolation::TypeMismatch {
                declared: declared.name(),
            });
        }
    }
    Ok(())
}

/// Check that a bounded dynamic source recycles released targets.
///
/// Acquires `capacity` targets, expects the next acquisition to fail,
/// releases one, expects the next acquisition to succeed, then releases
/// everything it still holds.
pub async fn check_release_recycles<S>(
    source: &S,
    capacity: usize,
) -> Result<(), ConformanceViolation>
where
    S: TargetSource,
{
    if source.is_static() {
        return Err(ConformanceViolation::NotDynamic);
    }

    let mut held = Vec::with_capacity(capacity);
    for round in 0..capacity {
        let target = source
            .acquire()
            .await?
            .ok_or(ConformanceViolation::MissingTarget { round })?;
        held.push(target);
    }

    if let Ok(extra) = source.acquire().await {
        if let Some(extra) = extra {
            source.release(extra).await?;
        }
        for target in held {
            source.release(target).await?;
        }
        return Err(ConformanceViolation::CapacityExceeded { capacity });
    }

    if let Some(target) = held.pop() {
        source.release(target).await?;
    }
    let again = source
        .acquire()
        .await?
        .ok_or(ConformanceViolation::MissingTarget { round: capacity })?;
    held.push(again);

    for target in held {
        source.release(target).await?;
    }
    Ok(())
}

/// Check that releasing `foreign` fails and leaves the source usable.
pub async fn check_foreign_release_rejected<S>(
    source: &S,
    foreign: Arc<S::Target>,
) -> Result<(), ConformanceViolation>
where
    S: TargetSource,
{
    if source.release(foreign).await.is_ok() {
        return Err(ConformanceViolation::ForeignReleaseAccepted);
    }

    for _ in 0..2 {
        if let Some(target) = source.acquire().await? {
            source.release(target).await?;
        }
    }
    Ok(())
}

/// Check that a source yielding no target does so without failing.
pub async fn check_absent_target<S>(source: &S) -> Result<(), ConformanceViolation>
where
    S: TargetSource,
{
    for round in 0..2 {
        if let Some(target) = source.acquire().await? {
            if !source.is_static() {
                source.release(target).await?;
            }
            return Err(ConformanceViolation::MissingTarget { round });
        }
    }
    Ok(())
}
