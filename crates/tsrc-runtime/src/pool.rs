//! Bounded pool of reusable targets.
//!
//! Capacity is enforced with a semaphore: every borrowed target holds one
//! permit until it is released. Released targets are parked (LIFO) for
//! reuse up to `max_idle`; the rest are destroyed through the factory.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::{debug, warn};
use tsrc_core::ports::{AcquireError, ReleaseError, TargetFactory, TargetSource};
use tsrc_core::settings::{PoolSettings, PoolSettingsError, validate_pool_settings};
use tsrc_core::{PoolStats, TargetType};

use crate::outstanding::target_key;

/// A borrowed target and the slot it occupies.
struct Lease<T: ?Sized> {
    target: Arc<T>,
    permit: OwnedSemaphorePermit,
}

struct PoolState<T: ?Sized> {
    idle: VecDeque<Arc<T>>,
    borrowed: HashMap<usize, Lease<T>>,
    closed: bool,
}

/// Target source lending targets from a bounded pool.
///
/// When every slot is borrowed, acquisition waits up to
/// `PoolSettings::max_wait_ms` and then fails with
/// [`AcquireError::Timeout`], or fails immediately with
/// [`AcquireError::Exhausted`] when no wait is configured.
pub struct PoolingTargetSource<T: ?Sized, F> {
    factory: F,
    settings: PoolSettings,
    permits: Arc<Semaphore>,
    state: Mutex<PoolState<T>>,
}

impl<T, F> PoolingTargetSource<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T>,
{
    /// Create an empty pool. Targets are created on demand.
    pub fn new(factory: F, settings: PoolSettings) -> Result<Self, PoolSettingsError> {
        validate_pool_settings(&settings)?;
        debug!(
            max_size = settings.max_size,
            max_idle = settings.max_idle,
            max_wait_ms = ?settings.max_wait_ms,
            "Creating target pool"
        );

        Ok(Self {
            factory,
            permits: Arc::new(Semaphore::new(settings.max_size)),
            settings,
            state: Mutex::new(PoolState {
                idle: VecDeque::new(),
                borrowed: HashMap::new(),
                closed: false,
            }),
        })
    }

    /// The settings this pool was built with.
    pub const fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    /// Current pool usage.
    pub async fn stats(&self) -> PoolStats {
        let state = self.state.lock().await;
        PoolStats {
            max_size: self.settings.max_size,
            active: state.borrowed.len(),
            idle: state.idle.len(),
        }
    }

    /// Create idle targets until `min_idle` is reached.
    ///
    /// Each creation holds a slot while it runs, so warm-up never grows the
    /// pool past `max_size` targets in total, counting acquisitions still
    /// creating theirs, nor parks more than `max_idle`. Returns the number
    /// of targets created.
    pub async fn warm_up(&self) -> Result<usize, AcquireError> {
        let mut created = 0;
        loop {
            {
                let state = self.state.lock().await;
                if state.closed {
                    return Err(AcquireError::Closed);
                }
                if state.idle.len() >= self.settings.min_idle {
                    break;
                }
            }

            let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
                break;
            };
            let target = self.factory.create().await?;

            let leftover = {
                let mut state = self.state.lock().await;
                // Every held slot may still turn into a target
                let in_use = self.settings.max_size - self.permits.available_permits();
                let fits = state.idle.len() < self.settings.max_idle
                    && state.idle.len() + in_use <= self.settings.max_size;
                if !state.closed && fits {
                    state.idle.push_back(target);
                    None
                } else {
                    Some((target, state.closed))
                }
            };
            drop(permit);

            if let Some((target, closed)) = leftover {
                self.destroy_quietly(target).await;
                if closed {
                    return Err(AcquireError::Closed);
                }
                break;
            }
            created += 1;
        }

        debug!(created, "Warmed up target pool");
        Ok(created)
    }

    /// Close the pool and destroy every idle target.
    ///
    /// Later acquisitions fail with [`AcquireError::Closed`]. Targets still
    /// borrowed can be released and are destroyed on release. Returns the
    /// number of idle targets destroyed.
    pub async fn close(&self) -> usize {
        let idle: Vec<Arc<T>> = {
            let mut state = self.state.lock().await;
            state.closed = true;
            state.idle.drain(..).collect()
        };
        self.permits.close();

        let count = idle.len();
        for target in idle {
            self.destroy_quietly(target).await;
        }
        debug!(destroyed = count, "Closed target pool");
        count
    }

    async fn reserve_slot(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        let Some(max_wait) = self.settings.effective_max_wait() else {
            return Arc::clone(&self.permits)
                .try_acquire_owned()
                .map_err(|err| match err {
                    TryAcquireError::Closed => AcquireError::Closed,
                    TryAcquireError::NoPermits => AcquireError::Exhausted {
                        max_size: self.settings.max_size,
                    },
                });
        };

        match tokio::time::timeout(max_wait, Arc::clone(&self.permits).acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(AcquireError::Closed),
            Err(_) => Err(AcquireError::Timeout {
                waited_ms: self.settings.max_wait_ms.unwrap_or_default(),
            }),
        }
    }

    async fn take_idle_or_create(&self) -> Result<Arc<T>, AcquireError> {
        loop {
            let candidate = self.state.lock().await.idle.pop_back();
            let Some(target) = candidate else {
                break;
            };
            if !self.settings.test_on_borrow || self.factory.validate(&*target).await {
                return Ok(target);
            }
            debug!("Discarding idle target that failed validation");
            self.destroy_quietly(target).await;
        }

        let target = self.factory.create().await?;
        debug!(
            target_type = std::any::type_name::<T>(),
            "Created pooled target"
        );
        Ok(target)
    }

    async fn destroy_quietly(&self, target: Arc<T>) {
        if let Err(e) = self.factory.destroy(target).await {
            warn!(error = %e, "Failed to destroy pooled target");
        }
    }
}

#[async_trait]
impl<T, F> TargetSource for PoolingTargetSource<T, F>
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
        let permit = self.reserve_slot().await?;
        let target = self.take_idle_or_create().await?;

        let mut state = self.state.lock().await;
        if state.closed {
            drop(state);
            self.destroy_quietly(target).await;
            return Err(AcquireError::Closed);
        }
        let key = target_key(&target);
        if state.borrowed.contains_key(&key) {
            // Still in use by its current borrower: neither track nor destroy it
            drop(state);
            drop(permit);
            warn!("Factory returned a target that is already borrowed");
            return Err(AcquireError::InvalidState(
                "factory returned a target that is already borrowed".to_string(),
            ));
        }
        state.borrowed.insert(
            key,
            Lease {
                target: Arc::clone(&target),
                permit,
            },
        );
        Ok(Some(target))
    }

    async fn release(&self, target: Arc<T>) -> Result<(), ReleaseError> {
        let lease = self.state.lock().await.borrowed.remove(&target_key(&target));
        let Some(lease) = lease else {
            return Err(ReleaseError::Foreign(
                "target is not borrowed from this pool".to_string(),
            ));
        };
        debug_assert!(Arc::ptr_eq(&lease.target, &target));

        let reusable = !self.settings.test_on_return || self.factory.validate(&*target).await;

        // The slot is freed only once the target is parked or destroyed, so a
        // waiting acquirer finds it idle.
        let outcome = {
            let mut state = self.state.lock().await;
            if reusable && !state.closed && state.idle.len() < self.settings.max_idle {
                state.idle.push_back(target);
                None
            } else {
                Some(target)
            }
        };

        let result = match outcome {
            None => Ok(()),
            Some(target) => {
                drop(lease.target);
                self.factory
                    .destroy(target)
                    .await
                    .map_err(ReleaseError::Disposal)
            }
        };
        drop(lease.permit);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FnTargetFactory;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tsrc_core::ports::FactoryError;

    /// Hands out the same shared target on every creation.
    struct Caching {
        shared: Arc<u32>,
    }

    #[async_trait]
    impl TargetFactory<u32> for Caching {
        async fn create(&self) -> Result<Arc<u32>, FactoryError> {
            Ok(Arc::clone(&self.shared))
        }
    }

    /// The first creation waits for `gate`; later ones complete at once.
    #[derive(Default)]
    struct Gated {
        gate: Notify,
        created: AtomicUsize,
    }

    #[async_trait]
    impl TargetFactory<usize> for Gated {
        async fn create(&self) -> Result<Arc<usize>, FactoryError> {
            let n = self.created.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                self.gate.notified().await;
            }
            Ok(Arc::new(n))
        }
    }

    fn counter_pool(
        settings: PoolSettings,
    ) -> PoolingTargetSource<usize, FnTargetFactory<usize, impl Fn() -> anyhow::Result<usize> + Send + Sync>>
    {
        let next = AtomicUsize::new(0);
        PoolingTargetSource::new(
            FnTargetFactory::new(move || Ok(next.fetch_add(1, Ordering::SeqCst))),
            settings,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_capacity_one_scenario() {
        let pool = counter_pool(PoolSettings::bounded(1));

        let first = pool.acquire().await.unwrap().unwrap();
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, AcquireError::Exhausted { max_size: 1 }));

        pool.release(Arc::clone(&first)).await.unwrap();
        let again = pool.acquire().await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &again));

        pool.release(again).await.unwrap();
    }

    #[tokio::test]
    async fn test_stats_track_borrow_and_return() {
        let pool = counter_pool(PoolSettings::bounded(3));
        let a = pool.acquire().await.unwrap().unwrap();
        let b = pool.acquire().await.unwrap().unwrap();

        assert_eq!(
            pool.stats().await,
            PoolStats {
                max_size: 3,
                active: 2,
                idle: 0
            }
        );

        pool.release(a).await.unwrap();
        pool.release(b).await.unwrap();
        assert_eq!(
            pool.stats().await,
            PoolStats {
                max_size: 3,
                active: 0,
                idle: 2
            }
        );
    }

    #[tokio::test]
    async fn test_foreign_release_leaves_pool_intact() {
        let pool = counter_pool(PoolSettings::bounded(1));
        let held = pool.acquire().await.unwrap().unwrap();

        let err = pool.release(Arc::new(99)).await.unwrap_err();
        assert!(matches!(err, ReleaseError::Foreign(_)));
        assert_eq!(pool.stats().await.active, 1);

        pool.release(held).await.unwrap();
        assert!(pool.acquire().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_excess_idle_targets_are_destroyed() {
        let settings = PoolSettings {
            max_size: 2,
            max_idle: 1,
            ..PoolSettings::with_defaults()
        };
        let pool = counter_pool(settings);
        let a = pool.acquire().await.unwrap().unwrap();
        let b = pool.acquire().await.unwrap().unwrap();

        pool.release(a).await.unwrap();
        pool.release(b).await.unwrap();
        assert_eq!(pool.stats().await.idle, 1);
    }

    #[tokio::test]
    async fn test_waiting_acquisition_times_out() {
        let pool = counter_pool(PoolSettings::bounded(1).with_max_wait_ms(20));
        let _held = pool.acquire().await.unwrap().unwrap();

        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, AcquireError::Timeout { waited_ms: 20 }));
    }

    #[tokio::test]
    async fn test_warm_up_respects_min_idle() {
        let pool = counter_pool(PoolSettings::bounded(4).with_min_idle(3));
        assert_eq!(pool.warm_up().await.unwrap(), 3);
        assert_eq!(pool.warm_up().await.unwrap(), 0);
        assert_eq!(pool.stats().await.idle, 3);
    }

    #[tokio::test]
    async fn test_close_rejects_new_acquisitions() {
        let pool = counter_pool(PoolSettings::bounded(2));
        let held = pool.acquire().await.unwrap().unwrap();
        let parked = pool.acquire().await.unwrap().unwrap();
        pool.release(parked).await.unwrap();

        assert_eq!(pool.close().await, 1);
        assert!(matches!(
            pool.acquire().await.unwrap_err(),
            AcquireError::Closed
        ));

        pool.release(held).await.unwrap();
        assert_eq!(pool.stats().await.idle, 0);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let result = PoolingTargetSource::<u8, _>::new(
            FnTargetFactory::new(|| Ok(0_u8)),
            PoolSettings::bounded(0),
        );
        assert!(matches!(result, Err(PoolSettingsError::InvalidMaxSize(0))));
    }

    #[tokio::test]
    async fn test_factory_returning_borrowed_target_is_rejected() {
        let pool = PoolingTargetSource::new(
            Caching {
                shared: Arc::new(7),
            },
            PoolSettings::bounded(2),
        )
        .unwrap();

        let first = pool.acquire().await.unwrap().unwrap();
        let err = pool.acquire().await.unwrap_err();
        assert!(matches!(err, AcquireError::InvalidState(_)));
        assert_eq!(pool.stats().await.active, 1);

        // The rejected acquisition gave its slot back and the borrower still owns the target
        pool.release(first).await.unwrap();
        let again = pool.acquire().await.unwrap().unwrap();
        assert_eq!(*again, 7);
        pool.release(again).await.unwrap();
        assert_eq!(
            pool.stats().await,
            PoolStats {
                max_size: 2,
                active: 0,
                idle: 1
            }
        );
    }

    #[tokio::test]
    async fn test_warm_up_counts_acquisitions_still_creating() {
        let factory = Arc::new(Gated::default());
        let pool = Arc::new(
            PoolingTargetSource::new(
                Arc::clone(&factory),
                PoolSettings::bounded(2).with_min_idle(2),
            )
            .unwrap(),
        );

        let borrower = {
            let pool = Arc::clone(&pool);
            tokio::spawn(async move { pool.acquire().await })
        };
        while factory.created.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        assert_eq!(pool.warm_up().await.unwrap(), 1);

        factory.gate.notify_one();
        let borrowed = borrower.await.unwrap().unwrap().unwrap();
        let stats = pool.stats().await;
        assert_eq!(stats.active + stats.idle, 2);
        pool.release(borrowed).await.unwrap();
    }

    #[tokio::test]
    async fn test_warm_up_with_borrowed_targets_stays_within_capacity() {
        let pool = counter_pool(PoolSettings::bounded(2).with_min_idle(2));
        let held = pool.acquire().await.unwrap().unwrap();

        assert_eq!(pool.warm_up().await.unwrap(), 1);
        assert_eq!(
            pool.stats().await,
            PoolStats {
                max_size: 2,
                active: 1,
                idle: 1
            }
        );
        pool.release(held).await.unwrap();
    }
}
