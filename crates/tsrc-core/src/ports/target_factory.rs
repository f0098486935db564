//! Target factory trait definition.
//!
//! This port is implemented by whatever knows how to build a target:
//! a connection opener, a client builder, a test double. Sources that
//! create their own targets (prototype, pool, lazy, thread-bound,
//! refreshable) delegate to it.

use async_trait::async_trait;
use std::sync::Arc;

use super::FactoryError;

/// Builds, checks and tears down targets of type `T`.
#[async_trait]
pub trait TargetFactory<T>: Send + Sync
where
    T: ?Sized + Send + Sync + 'static,
{
    /// Build a brand new target.
    async fn create(&self) -> Result<Arc<T>, FactoryError>;

    /// Check whether an existing target is still usable.
    ///
    /// Pools call this on borrow and on return when configured to.
    async fn validate(&self, _target: &T) -> bool {
        true
    }

    /// Tear down a target that will never be handed out again.
    async fn destroy(&self, _target: Arc<T>) -> Result<(), FactoryError> {
        Ok(())
    }
}

#[async_trait]
impl<T, F> TargetFactory<T> for Arc<F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T> + ?Sized,
{
    async fn create(&self) -> Result<Arc<T>, FactoryError> {
        (**self).create().await
    }

    async fn validate(&self, target: &T) -> bool {
        (**self).validate(target).await
    }

    async fn destroy(&self, target: Arc<T>) -> Result<(), FactoryError> {
        (**self).destroy(target).await
    }
}
