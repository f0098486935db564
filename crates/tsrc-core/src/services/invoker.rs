//! Acquire/call/release driver for target sources.
//!
//! `TargetInvoker` is the caller side of the [`TargetSource`] contract:
//! it decides when a target must be released and makes sure it happens on
//! every exit path of the call.

use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::ports::{AcquireError, ReleaseError, TargetSource};

/// Errors surfaced by [`TargetInvoker::invoke`].
#[derive(Debug, Error)]
pub enum InvocationError<E> {
    /// No target could be acquired; the call was never made.
    #[error("Failed to acquire target: {0}")]
    Acquire(#[source] AcquireError),

    /// The call itself failed.
    ///
    /// `release` carries the error of the release that followed, if that
    /// failed too. It never replaces the call error.
    #[error("Invocation failed: {source}")]
    Call {
        source: E,
        release: Option<ReleaseError>,
    },

    /// The call succeeded but the target could not be released.
    #[error("Failed to release target: {0}")]
    Release(#[source] ReleaseError),
}

impl<E> InvocationError<E> {
    /// The call error, if the call was made and failed.
    pub const fn call_error(&self) -> Option<&E> {
        match self {
            Self::Call { source, .. } => Some(source),
            _ => None,
        }
    }

    /// The release error, whether or not the call itself succeeded.
    pub const fn release_error(&self) -> Option<&ReleaseError> {
        match self {
            Self::Call { release, .. } => release.as_ref(),
            Self::Release(err) => Some(err),
            Self::Acquire(_) => None,
        }
    }
}

/// Holds an acquired target until the invocation releases it.
///
/// Dropped while still armed (the invocation future was cancelled), it
/// releases the target on a task spawned on the current runtime.
struct ReleaseGuard<S: TargetSource + 'static> {
    source: Arc<S>,
    target: Option<Arc<S::Target>>,
}

impl<S: TargetSource + 'static> ReleaseGuard<S> {
    const fn new(source: Arc<S>, target: Option<Arc<S::Target>>) -> Self {
        Self { source, target }
    }

    fn disarm(&mut self) -> Option<Arc<S::Target>> {
        self.target.take()
    }
}

impl<S: TargetSource + 'static> Drop for ReleaseGuard<S> {
    fn drop(&mut self) {
        let Some(target) = self.target.take() else {
            return;
        };

        match Handle::try_current() {
            Ok(handle) => {
                let source = Arc::clone(&self.source);
                debug!("Invocation cancelled, releasing target in the background");
                handle.spawn(async move {
                    if let Err(e) = source.release(target).await {
                        warn!(error = %e, "Failed to release target of cancelled invocation");
                    }
                });
            }
            Err(_) => {
                warn!("Invocation dropped outside a Tokio runtime, target was not released");
            }
        }
    }
}

/// Runs calls against the targets of a [`TargetSource`].
///
/// Staticity is read once at construction. Static sources are acquired
/// on the first call and the target is reused forever, without release.
/// Dynamic sources are acquired before and released after every call,
/// including when the call returns an error, panics, or the invocation
/// future is dropped before completing.
pub struct TargetInvoker<S: TargetSource> {
    source: Arc<S>,
    is_static: bool,
    cached: OnceCell<Option<Arc<S::Target>>>,
}

impl<S: TargetSource + 'static> TargetInvoker<S> {
    /// Wrap a source.
    pub fn new(source: S) -> Self {
        let is_static = source.is_static();
        debug!(
            is_static,
            target_type = ?source.target_type(),
            "Creating target invoker"
        );
        Self {
            source: Arc::new(source),
            is_static,
            cached: OnceCell::new(),
        }
    }

    /// The wrapped source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Whether the wrapped source reported itself static.
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Run `call` with a target obtained from the source.
    ///
    /// `call` receives `None` when the source has no target for this
    /// invocation. A target is released only if one was acquired and the
    /// source is dynamic.
    pub async fn invoke<F, Fut, R, E>(&self, call: F) -> Result<R, InvocationError<E>>
    where
        F: FnOnce(Option<Arc<S::Target>>) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        if self.is_static {
            let target = self
                .cached
                .get_or_try_init(|| self.source.acquire())
                .await
                .map_err(InvocationError::Acquire)?
                .clone();
            return call(target)
                .await
                .map_err(|source| InvocationError::Call {
                    source,
                    release: None,
                });
        }

        let target = self
            .source
            .acquire()
            .await
            .map_err(InvocationError::Acquire)?;

        let mut guard = ReleaseGuard::new(Arc::clone(&self.source), target.clone());
        let outcome = AssertUnwindSafe(call(target)).catch_unwind().await;

        let released = match guard.disarm() {
            Some(target) => self.source.release(target).await,
            None => Ok(()),
        };
        if let Err(ref err) = released {
            warn!(error = %err, "Failed to release target after invocation");
        }

        match outcome {
            Err(panic) => std::panic::resume_unwind(panic),
            Ok(Ok(value)) => released.map(|()| value).map_err(InvocationError::Release),
            Ok(Err(source)) => Err(InvocationError::Call {
                source,
                release: released.err(),
            }),
        }
    }
}
