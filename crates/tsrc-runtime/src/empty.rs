//! Source that never yields a target.
//!
//! Used when the dispatcher's interception logic answers every call on
//! its own and there is nothing to delegate to.

use async_trait::async_trait;
use std::marker::PhantomData;
use std::sync::Arc;
use tsrc_core::TargetType;
use tsrc_core::ports::{AcquireError, ReleaseError, TargetSource};

/// Always acquires `None`.
///
/// The declared type is optional and purely informational. A static
/// empty source accepts releases as no-ops; a dynamic one rejects them,
/// since it never handed anything out.
pub struct EmptyTargetSource<T: ?Sized> {
    target_type: Option<TargetType>,
    is_static: bool,
    _target: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> EmptyTargetSource<T> {
    /// Static empty source with no declared type.
    pub const fn untyped() -> Self {
        Self {
            target_type: None,
            is_static: true,
            _target: PhantomData,
        }
    }

    /// Static empty source declaring `T` as its target type.
    pub fn typed() -> Self {
        Self {
            target_type: Some(TargetType::of::<T>()),
            ..Self::untyped()
        }
    }

    /// Static empty source declaring an explicit target type.
    pub fn for_type(target_type: TargetType) -> Self {
        Self {
            target_type: Some(target_type),
            ..Self::untyped()
        }
    }

    /// Set whether the source reports itself static.
    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for EmptyTargetSource<T> {
    fn default() -> Self {
        Self::untyped()
    }
}

#[async_trait]
impl<T: ?Sized + Send + Sync + 'static> TargetSource for EmptyTargetSource<T> {
    type Target = T;

    fn target_type(&self) -> Option<TargetType> {
        self.target_type
    }

    fn is_static(&self) -> bool {
        self.is_static
    }

    async fn acquire(&self) -> Result<Option<Arc<T>>, AcquireError> {
        Ok(None)
    }

    async fn release(&self, _target: Arc<T>) -> Result<(), ReleaseError> {
        if self.is_static {
            return Ok(());
        }
        Err(ReleaseError::Foreign(
            "empty target source never hands out targets".to_string(),
        ))
    }
}
