//! Closure-backed [`TargetFactory`].

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tsrc_core::ports::{FactoryError, TargetFactory};

/// Factory that builds targets by calling a closure.
///
/// Validation always succeeds and destruction simply drops the target.
pub struct FnTargetFactory<T, F> {
    create: F,
    _target: PhantomData<fn() -> T>,
}

impl<T, F> FnTargetFactory<T, F>
where
    F: Fn() -> anyhow::Result<T> + Send + Sync,
{
    /// Wrap a closure.
    pub const fn new(create: F) -> Self {
        Self {
            create,
            _target: PhantomData,
        }
    }
}

#[async_trait]
impl<T, F> TargetFactory<T> for FnTargetFactory<T, F>
where
    T: Send + Sync + 'static,
    F: Fn() -> anyhow::Result<T> + Send + Sync,
{
    async fn create(&self) -> Result<Arc<T>, FactoryError> {
        (self.create)().map(Arc::new).map_err(FactoryError::from)
    }
}
