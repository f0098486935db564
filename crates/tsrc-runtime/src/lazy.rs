//! Source that creates its target on first use.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::debug;
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, ReleaseError, TargetFactory, TargetSource};

use crate::outstanding::Outstanding;

/// Defers building the target until the first acquisition.
///
/// Reports itself dynamic so dispatchers keep calling
/// [`acquire`](TargetSource::acquire) instead of caching an eager
/// result. Concurrent first acquisitions share a single creation; a
/// failed creation is retried by the next acquisition.
pub struct LazyInitTargetSource<T: ?Sized, F> {
    factory: F,
    target: OnceCell<Arc<T>>,
    outstanding: Mutex<Outstanding<T>>,
}

impl<T, F> LazyInitTargetSource<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T>,
{
    /// Create a source backed by `factory`. Nothing is built yet.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            target: OnceCell::new(),
            outstanding: Mutex::new(Outstanding::new()),
        }
    }

    /// Whether the target has been created.
    pub fn is_initialized(&self) -> bool {
        self.target.initialized()
    }
}

#[async_trait]
impl<T, F> TargetSource for LazyInitTargetSource<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T>,
{
    type Target = T;

    fn target_type(&self) -> Option<TargetType> {
        Some(TargetType::of::<T>())
    }

    fn is_static(&self) -> bool {
        false
    }

    async fn acquire(&self) -> Result<Option<Arc<T>>, AcquireError> {
        let target = self
            .target
            .get_or_try_init(|| async {
                debug!(
                    target_type = std::any::type_name::<T>(),
                    "Lazily initializing target"
                );
                self.factory.create().await
            })
            .await?;

        let target = Arc::clone(target);
        self.outstanding.lock().await.insert(&target);
        Ok(Some(target))
    }

    async fn release(&self, target: Arc<T>) -> Result<(), ReleaseError> {
        if self.outstanding.lock().await.remove(&target) {
            Ok(())
        } else {
            Err(ReleaseError::Foreign(
                "target was not acquired from this lazy source".to_string(),
            ))
        }
    }
}
