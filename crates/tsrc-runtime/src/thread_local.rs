//! Source binding one target to each OS thread.
//!
//! Useful for targets that are cheap to keep around but must not be
//! shared between threads at the same time. The binding follows the OS
//! thread that runs `acquire`, not the async task.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::ThreadId;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use tsrc_core::ports::{AcquireError, ReleaseError, TargetFactory, TargetSource};
use tsrc_core::{TargetType, ThreadLocalStats};

use crate::outstanding::{Outstanding, target_key};

/// Lazily creates one target per thread and hands it out on that thread.
pub struct ThreadLocalTargetSource<T: ?Sized, F> {
    factory: F,
    bound: Mutex<HashMap<ThreadId, Arc<T>>>,
    outstanding: Mutex<Outstanding<T>>,
    invocations: AtomicU64,
    hits: AtomicU64,
}

impl<T, F> ThreadLocalTargetSource<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T>,
{
    /// Create a source backed by `factory`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            bound: Mutex::new(HashMap::new()),
            outstanding: Mutex::new(Outstanding::new()),
            invocations: AtomicU64::new(0),
            hits: AtomicU64::new(0),
        }
    }

    /// Usage counters.
    pub async fn stats(&self) -> ThreadLocalStats {
        ThreadLocalStats {
            invocations: self.invocations.load(Ordering::SeqCst),
            hits: self.hits.load(Ordering::SeqCst),
            objects: self.bound.lock().await.len(),
        }
    }

    /// Unbind and destroy every target.
    ///
    /// Threads acquiring afterwards get freshly created targets. Returns
    /// the number of targets destroyed.
    pub async fn destroy(&self) -> usize {
        let targets: Vec<Arc<T>> = self.bound.lock().await.drain().map(|(_, t)| t).collect();
        let count = targets.len();
        for target in targets {
            if let Err(e) = self.factory.destroy(target).await {
                warn!(error = %e, "Failed to destroy thread-bound target");
            }
        }
        debug!(destroyed = count, "Destroyed thread-bound targets");
        count
    }
}

#[async_trait]
impl<T, F> TargetSource for ThreadLocalTargetSource<T, F>
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
        self.invocations.fetch_add(1, Ordering::SeqCst);
        let thread = std::thread::current().id();

        let existing = self.bound.lock().await.get(&thread).cloned();
        let target = if let Some(target) = existing {
            self.hits.fetch_add(1, Ordering::SeqCst);
            target
        } else {
            // Created without holding the map, so other threads keep hitting
            let created = self.factory.create().await?;
            let target = Arc::clone(
                self.bound
                    .lock()
                    .await
                    .entry(thread)
                    .or_insert_with(|| Arc::clone(&created)),
            );
            if target_key(&target) == target_key(&created) {
                debug!(?thread, "Bound new target to thread");
            } else if let Err(e) = self.factory.destroy(created).await {
                warn!(error = %e, "Failed to destroy surplus thread-bound target");
            }
            target
        };

        self.outstanding.lock().await.insert(&target);
        Ok(Some(target))
    }

    async fn release(&self, target: Arc<T>) -> Result<(), ReleaseError> {
        if self.outstanding.lock().await.remove(&target) {
            Ok(())
        } else {
            Err(ReleaseError::Foreign(
                "target was not acquired from this thread-local source".to_string(),
            ))
        }
    }
}
