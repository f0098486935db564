//! Source creating a new target for every acquisition.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, ReleaseError, TargetFactory, TargetSource};

use crate::outstanding::Outstanding;

/// Builds a fresh target per acquisition and destroys it on release.
pub struct PrototypeTargetSource<T: ?Sized, F> {
    factory: F,
    outstanding: Mutex<Outstanding<T>>,
}

impl<T, F> PrototypeTargetSource<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T>,
{
    /// Create a source backed by `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            outstanding: Mutex::new(Outstanding::new()),
        }
    }

    /// The backing factory.
    pub const fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of targets created and not yet released.
    pub async fn outstanding(&self) -> usize {
        self.outstanding.lock().await.len()
    }
}

#[async_trait]
impl<T, F> TargetSource for PrototypeTargetSource<T, F>
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
        let target = self.factory.create().await?;
        self.outstanding.lock().await.insert(&target);
        debug!(
            target_type = std::any::type_name::<T>(),
            "Created prototype target"
        );
        Ok(Some(target))
    }

    async fn release(&self, target: Arc<T>) -> Result<(), ReleaseError> {
        if !self.outstanding.lock().await.remove(&target) {
            return Err(ReleaseError::Foreign(
                "target was not created by this prototype source".to_string(),
            ));
        }
        self.factory.destroy(target).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTargetFactory;

    #[tokio::test]
    async fn test_new_target_each_time() {
        let source = PrototypeTargetSource::new(FnTargetFactory::new(|| Ok(Vec::<u8>::new())));

        let a = source.acquire().await.unwrap().unwrap();
        let b = source.acquire().await.unwrap().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(source.outstanding().await, 2);

        source.release(a).await.unwrap();
        source.release(b).await.unwrap();
        assert_eq!(source.outstanding().await, 0);
    }

    #[tokio::test]
    async fn test_double_release_is_rejected() {
        let source = PrototypeTargetSource::new(FnTargetFactory::new(|| Ok(7_u64)));
        let target = source.acquire().await.unwrap().unwrap();

        source.release(Arc::clone(&target)).await.unwrap();
        let err = source.release(target).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Foreign(_)));
    }

    #[tokio::test]
    async fn test_factory_failure_is_a_resolution_error() {
        let source = PrototypeTargetSource::new(FnTargetFactory::new(|| -> anyhow::Result<u8> {
            anyhow::bail!("quota exceeded")
        }));

        let err = source.acquire().await.unwrap_err();
        assert!(matches!(err, AcquireError::Creation(_)));
        assert_eq!(source.outstanding().await, 0);
    }
}
