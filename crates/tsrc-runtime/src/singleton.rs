//! Static source holding exactly one target.

use async_trait::async_trait;
use std::sync::Arc;
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, ReleaseError, TargetSource};

/// Always hands out the same target.
///
/// This is the default for dispatchers wrapping a plain object. Releases
/// are accepted and ignored.
pub struct SingletonTargetSource<T: ?Sized> {
    target: Arc<T>,
}

impl<T: ?Sized + Send + Sync + 'static> SingletonTargetSource<T> {
    /// Wrap a shared target.
    pub const fn new(target: Arc<T>) -> Self {
        Self { target }
    }

    /// The wrapped target.
    pub const fn target(&self) -> &Arc<T> {
        &self.target
    }
}

impl<T: Send + Sync + 'static> SingletonTargetSource<T> {
    /// Wrap an owned value.
    pub fn from_value(value: T) -> Self {
        Self::new(Arc::new(value))
    }
}

#[async_trait]
impl<T: ?Sized + Send + Sync + 'static> TargetSource for SingletonTargetSource<T> {
    type Target = T;

    fn target_type(&self) -> Option<TargetType> {
        Some(TargetType::of::<T>())
    }

    fn is_static(&self) -> bool {
        true
    }

    async fn acquire(&self) -> Result<Option<Arc<T>>, AcquireError> {
        Ok(Some(Arc::clone(&self.target)))
    }

    async fn release(&self, _target: Arc<T>) -> Result<(), ReleaseError> {
        Ok(())
    }
}

impl<T: ?Sized> std::fmt::Debug for SingletonTargetSource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonTargetSource")
            .field("target_type", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}
