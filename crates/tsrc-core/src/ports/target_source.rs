//! Target source trait definition.
//!
//! A target source is used to obtain the current target of an invocation.
//! Dispatchers never hold on to a target longer than one call unless the
//! source is static.

use async_trait::async_trait;
use std::sync::Arc;

use super::{AcquireError, ReleaseError};
use crate::domain::TargetType;

/// Source of the objects invocations are delegated to.
///
/// A static source always returns the same target, so a dispatcher may
/// acquire once, cache the result and never call [`release`]. Dynamic
/// sources can pool, swap or lazily create their targets; every
/// successful acquisition that yields a target must then be paired with
/// exactly one release of that same `Arc`.
///
/// # Design Rules
///
/// - `Ok(None)` means "no target for this call", not a failure
/// - [`is_static`] is constant for the lifetime of an instance
/// - Every target handed out has the type reported by [`target_type`]
///
/// # Example
///
/// ```ignore
/// let target = source.acquire().await?;
/// let result = match &target {
///     Some(t) => t.handle(request),
///     None => fallback(request),
/// };
/// if !source.is_static() {
///     if let Some(t) = target {
///         source.release(t).await?;
///     }
/// }
/// ```
///
/// [`release`]: TargetSource::release
/// [`is_static`]: TargetSource::is_static
/// [`target_type`]: TargetSource::target_type
#[async_trait]
pub trait TargetSource: Send + Sync {
    /// Type of the targets handed out. May be a trait object.
    type Target: ?Sized + Send + Sync + 'static;

    /// The type of the targets returned by [`acquire`](Self::acquire).
    ///
    /// Returns `None` when no fixed type can be reported.
    fn target_type(&self) -> Option<TargetType>;

    /// Whether every acquisition returns the same object.
    fn is_static(&self) -> bool;

    /// Obtain a target right before an invocation.
    async fn acquire(&self) -> Result<Option<Arc<Self::Target>>, AcquireError>;

    /// Give back a target obtained from [`acquire`](Self::acquire).
    ///
    /// Returns `Err(ReleaseError::Foreign)` if the target did not come
    /// from this source.
    async fn release(&self, target: Arc<Self::Target>) -> Result<(), ReleaseError>;
}

#[async_trait]
impl<S> TargetSource for Arc<S>
where
    S: TargetSource + ?Sized,
{
    type Target = S::Target;

    fn target_type(&self) -> Option<TargetType> {
        (**self).target_type()
    }

    fn is_static(&self) -> bool {
        (**self).is_static()
    }

    async fn acquire(&self) -> Result<Option<Arc<Self::Target>>, AcquireError> {
        (**self).acquire().await
    }

    async fn release(&self, target: Arc<Self::Target>) -> Result<(), ReleaseError> {
        (**self).release(target).await
    }
}
