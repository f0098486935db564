//! Runs the target source contract checks against every source.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio_test::assert_ok;
use tsrc_core::conformance::{
    ConformanceViolation, check_absent_target, check_erased_type_soundness,
    check_foreign_release_rejected, check_release_recycles, check_static_consistency,
    check_type_soundness,
};
use tsrc_core::{PoolSettings, RefreshSettings, TargetSource, TargetType};
use tsrc_runtime::{
    AnyTarget, EmptyTargetSource, FnTargetFactory, HotSwappableTargetSource, LazyInitTargetSource,
    PoolingTargetSource, PrototypeTargetSource, RefreshableTargetSource, SingletonTargetSource,
    ThreadLocalTargetSource, erase,
};

#[derive(Debug)]
struct Session {
    id: u32,
}

fn sessions() -> FnTargetFactory<Session, impl Fn() -> anyhow::Result<Session> + Send + Sync> {
    let next = AtomicU32::new(1);
    FnTargetFactory::new(move || {
        Ok(Session {
            id: next.fetch_add(1, Ordering::SeqCst),
        })
    })
}

fn stranger() -> Arc<Session> {
    Arc::new(Session { id: 0 })
}

#[tokio::test]
async fn test_singleton_conformance() {
    let source = SingletonTargetSource::from_value(Session { id: 7 });
    assert_ok!(check_static_consistency(&source, 5).await);
    assert_ok!(check_type_soundness(&source, 3).await);
}

#[tokio::test]
async fn test_empty_conformance() {
    let untyped = EmptyTargetSource::<Session>::untyped();
    assert_ok!(check_absent_target(&untyped).await);
    assert_ok!(check_static_consistency(&untyped, 3).await);

    let dynamic = EmptyTargetSource::<Session>::typed().with_static(false);
    assert_ok!(check_absent_target(&dynamic).await);
    assert_ok!(check_foreign_release_rejected(&dynamic, stranger()).await);
}

#[tokio::test]
async fn test_prototype_conformance() {
    let source = PrototypeTargetSource::new(sessions());
    assert_ok!(check_type_soundness(&source, 3).await);
    assert_ok!(check_foreign_release_rejected(&source, stranger()).await);
    assert!(matches!(
        check_static_consistency(&source, 2).await,
        Err(ConformanceViolation::NotStatic)
    ));
}

#[tokio::test]
async fn test_pool_conformance() {
    for capacity in [1, 2, 5] {
        let source = PoolingTargetSource::new(sessions(), PoolSettings::bounded(capacity)).unwrap();
        assert_ok!(check_release_recycles(&source, capacity).await);
        assert_ok!(check_type_soundness(&source, 3).await);
        assert_ok!(check_foreign_release_rejected(&source, stranger()).await);
        assert_eq!(source.stats().await.active, 0);
    }
}

#[tokio::test]
async fn test_pool_capacity_check_catches_undersized_claim() {
    let source = PoolingTargetSource::new(sessions(), PoolSettings::bounded(3)).unwrap();
    assert!(matches!(
        check_release_recycles(&source, 2).await,
        Err(ConformanceViolation::CapacityExceeded { capacity: 2 })
    ));
    assert_eq!(source.stats().await.active, 0);
}

#[tokio::test]
async fn test_hot_swap_conformance() {
    let source = HotSwappableTargetSource::new(Arc::new(Session { id: 1 }));
    assert_ok!(check_type_soundness(&source, 3).await);
    assert_ok!(check_foreign_release_rejected(&source, stranger()).await);

    source.swap(Arc::new(Session { id: 2 })).await;
    assert_ok!(check_foreign_release_rejected(&source, stranger()).await);
    assert_eq!(source.outstanding().await, 0);
}

#[tokio::test]
async fn test_thread_local_conformance() {
    let source = ThreadLocalTargetSource::new(sessions());
    assert_ok!(check_type_soundness(&source, 3).await);
    assert_ok!(check_foreign_release_rejected(&source, stranger()).await);
}

#[tokio::test]
async fn test_lazy_conformance() {
    let source = LazyInitTargetSource::new(sessions());
    assert_ok!(check_foreign_release_rejected(&source, stranger()).await);
    assert_ok!(check_type_soundness(&source, 3).await);
}

#[tokio::test]
async fn test_refreshable_conformance() {
    let source = RefreshableTargetSource::new(sessions(), RefreshSettings::every_ms(0))
        .await
        .unwrap();
    assert_ok!(check_type_soundness(&source, 3).await);
    assert_ok!(check_foreign_release_rejected(&source, stranger()).await);
}

#[tokio::test]
async fn test_erased_conformance() {
    let pool = PoolingTargetSource::new(sessions(), PoolSettings::bounded(2)).unwrap();
    let source = erase(pool);

    assert_eq!(source.target_type(), Some(TargetType::of::<Session>()));
    assert_ok!(check_erased_type_soundness(&source, 3).await);
    assert_ok!(check_release_recycles(&source, 2).await);
    let foreign: AnyTarget = stranger();
    assert_ok!(check_foreign_release_rejected(&source, foreign).await);

    let target = source.acquire().await.unwrap().unwrap();
    assert!(target.downcast_ref::<Session>().is_some_and(|s| s.id > 0));
    source.release(target).await.unwrap();
}
