//! Type-erasing adapter over any source with a sized target.
//!
//! Lets heterogeneous sources live behind a single
//! `dyn TargetSource<Target = dyn Any + Send + Sync>` while still
//! reporting the concrete type they hand out.

use async_trait::async_trait;
use std::any::Any;
use std::sync::Arc;
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, ReleaseError, TargetSource};

/// Shared, type-erased target.
pub type AnyTarget = Arc<dyn Any + Send + Sync>;

/// Exposes the targets of `S` as [`AnyTarget`].
///
/// Releases are downcast back to the concrete type before being handed to
/// the inner source; anything else is rejected with
/// [`ReleaseError::TypeMismatch`].
pub struct ErasedTargetSource<S> {
    inner: S,
}

/// Erase the target type of `source`.
pub const fn erase<S>(source: S) -> ErasedTargetSource<S>
where
    S: TargetSource,
    S::Target: Sized,
{
    ErasedTargetSource { inner: source }
}

impl<S> ErasedTargetSource<S> {
    /// The wrapped source.
    pub const fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the source.
    pub fn into_inner(self) -> S {
        self.inner
    }
}

#[async_trait]
impl<S> TargetSource for ErasedTargetSource<S>
where
    S: TargetSource,
    S::Target: Sized,
{
    type Target = dyn Any + Send + Sync;

    fn target_type(&self) -> Option<TargetType> {
        self.inner.target_type()
    }

    fn is_static(&self) -> bool {
        self.inner.is_static()
    }

    async fn acquire(&self) -> Result<Option<AnyTarget>, AcquireError> {
        let target = self.inner.acquire().await?;
        Ok(target.map(|t| t as AnyTarget))
    }

    async fn release(&self, target: AnyTarget) -> Result<(), ReleaseError> {
        match target.downcast::<S::Target>() {
            Ok(target) => self.inner.release(target).await,
            Err(_) => Err(ReleaseError::TypeMismatch {
                expected: std::any::type_name::<S::Target>(),
            }),
        }
    }
}
