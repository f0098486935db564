//! Source whose target can be replaced while dispatchers keep running.

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, ReleaseError, TargetSource};

use crate::outstanding::Outstanding;

/// Hands out whichever target is current.
///
/// [`swap`](Self::swap) replaces the target atomically: acquisitions made
/// after it returns see the new target, while targets acquired earlier
/// stay valid and can still be released.
pub struct HotSwappableTargetSource<T: ?Sized> {
    current: RwLock<Arc<T>>,
    outstanding: Mutex<Outstanding<T>>,
    swaps: AtomicU64,
}

impl<T: ?Sized + Send + Sync + 'static> HotSwappableTargetSource<T> {
    /// Start with `initial` as the current target.
    pub fn new(initial: Arc<T>) -> Self {
        Self {
            current: RwLock::new(initial),
            outstanding: Mutex::new(Outstanding::new()),
            swaps: AtomicU64::new(0),
        }
    }

    /// Replace the current target, returning the previous one.
    pub async fn swap(&self, new_target: Arc<T>) -> Arc<T> {
        let old = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, new_target)
        };
        let swaps = self.swaps.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(swaps, "Swapped hot target");
        old
    }

    /// The target acquisitions currently receive.
    pub async fn current(&self) -> Arc<T> {
        Arc::clone(&*self.current.read().await)
    }

    /// How many times the target has been swapped.
    pub fn swap_count(&self) -> u64 {
        self.swaps.load(Ordering::SeqCst)
    }

    /// Number of acquisitions not yet released.
    pub async fn outstanding(&self) -> usize {
        self.outstanding.lock().await.len()
    }
}

#[async_trait]
impl<T: ?Sized + Send + Sync + 'static> TargetSource for HotSwappableTargetSource<T> {
    type Target = T;

    fn target_type(&self) -> Option<TargetType> {
        Some(TargetType::of::<T>())
    }

    fn is_static(&self) -> bool {
        false
    }

    async fn acquire(&self) -> Result<Option<Arc<T>>, AcquireError> {
        let target = self.current().await;
        self.outstanding.lock().await.insert(&target);
        Ok(Some(target))
    }

    async fn release(&self, target: Arc<T>) -> Result<(), ReleaseError> {
        if self.outstanding.lock().await.remove(&target) {
            Ok(())
        } else {
            Err(ReleaseError::Foreign(
                "target was not acquired from this hot-swappable source".to_string(),
            ))
        }
    }
}
