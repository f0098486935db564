//! Source that periodically replaces its target with a fresh one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, warn};
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, FactoryError, ReleaseError, TargetFactory, TargetSource};
use tsrc_core::settings::RefreshSettings;

use crate::outstanding::{Outstanding, target_key};

struct RefreshState<T: ?Sized> {
    target: Arc<T>,
    refresh_count: u64,
    last_refresh: DateTime<Utc>,
}

/// Rebuilds its target through the factory once the refresh check delay
/// has elapsed.
///
/// The check runs at acquisition time; there is no background task.
/// A target replaced by a refresh is destroyed through the factory once
/// every acquisition of it has been released.
pub struct RefreshableTargetSource<T: ?Sized, F> {
    factory: F,
    settings: RefreshSettings,
    state: RwLock<RefreshState<T>>,
    last_check: Mutex<Instant>,
    outstanding: Mutex<Outstanding<T>>,
}

impl<T, F> RefreshableTargetSource<T, F>
where
    T: ?Sized + Send + Sync + 'static,
    F: TargetFactory<T>,
{
    /// Create the source and its first target.
    pub async fn new(factory: F, settings: RefreshSettings) -> Result<Self, FactoryError> {
        let target = factory.create().await?;
        debug!(
            refresh_check_delay_ms = ?settings.refresh_check_delay_ms,
            "Created refreshable target source"
        );

        Ok(Self {
            factory,
            settings,
            state: RwLock::new(RefreshState {
                target,
                refresh_count: 1,
                last_refresh: Utc::now(),
            }),
            last_check: Mutex::new(Instant::now()),
            outstanding: Mutex::new(Outstanding::new()),
        })
    }

    /// Replace the target with a freshly created one.
    ///
    /// The replaced target is destroyed right away when nothing holds it,
    /// otherwise on its last release.
    pub async fn refresh(&self) -> Result<(), FactoryError> {
        let fresh = self.factory.create().await?;

        let unused = {
            let mut state = self.state.write().await;
            let replaced = std::mem::replace(&mut state.target, fresh);
            state.refresh_count += 1;
            state.last_refresh = Utc::now();
            debug!(refresh_count = state.refresh_count, "Refreshed target");

            let held = self.outstanding.lock().await.contains(&replaced);
            (!held).then_some(replaced)
        };

        if let Some(replaced) = unused {
            if let Err(e) = self.factory.destroy(replaced).await {
                warn!(error = %e, "Failed to destroy replaced target");
            }
        }
        Ok(())
    }

    /// Number of targets created so far, the initial one included.
    pub async fn refresh_count(&self) -> u64 {
        self.state.read().await.refresh_count
    }

    /// When the current target was created.
    pub async fn last_refresh(&self) -> DateTime<Utc> {
        self.state.read().await.last_refresh
    }

    /// Whether the refresh check delay has elapsed since the last check.
    ///
    /// Restarts the delay when it has.
    async fn refresh_due(&self) -> bool {
        let Some(delay) = self.settings.effective_delay() else {
            return false;
        };

        let mut last_check = self.last_check.lock().await;
        let now = Instant::now();
        if now.duration_since(*last_check) < delay {
            return false;
        }
        *last_check = now;
        true
    }
}

#[async_trait]
impl<T, F> TargetSource for RefreshableTargetSource<T, F>
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
        if self.refresh_due().await {
            self.refresh().await?;
        }

        // Tracked before the read lock is dropped so a refresh sees it held
        let state = self.state.read().await;
        let target = Arc::clone(&state.target);
        self.outstanding.lock().await.insert(&target);
        drop(state);
        Ok(Some(target))
    }

    async fn release(&self, target: Arc<T>) -> Result<(), ReleaseError> {
        let retired = {
            let state = self.state.read().await;
            let mut outstanding = self.outstanding.lock().await;
            if !outstanding.remove(&target) {
                return Err(ReleaseError::Foreign(
                    "target was not acquired from this refreshable source".to_string(),
                ));
            }
            target_key(&state.target) != target_key(&target) && !outstanding.contains(&target)
        };

        if retired {
            debug!("Destroying replaced target after its last release");
            self.factory.destroy(target).await?;
        }
        Ok(())
    }
}
