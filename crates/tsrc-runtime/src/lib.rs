//! Concrete target sources.
//!
//! Every source here implements [`tsrc_core::TargetSource`]. Sources that
//! build their own targets take a [`tsrc_core::TargetFactory`];
//! [`FnTargetFactory`] adapts a plain closure.
//!
//! | Source | Static | Targets |
//! |--------|--------|---------|
//! | [`SingletonTargetSource`] | yes | one shared object |
//! | [`EmptyTargetSource`] | configurable | none |
//! | [`PrototypeTargetSource`] | no | new object per acquisition |
//! | [`PoolingTargetSource`] | no | bounded, recycled set |
//! | [`HotSwappableTargetSource`] | no | current object, replaceable |
//! | [`ThreadLocalTargetSource`] | no | one object per OS thread |
//! | [`LazyInitTargetSource`] | no | one object, built on first use |
//! | [`RefreshableTargetSource`] | no | one object, rebuilt periodically |
#![deny(unsafe_code)]

mod empty;
mod erased;
mod factory;
mod hot_swap;
mod lazy;
mod outstanding;
mod pool;
mod prototype;
mod refreshable;
mod singleton;
mod thread_local;

pub use empty::EmptyTargetSource;
pub use erased::{AnyTarget, ErasedTargetSource, erase};
pub use factory::FnTargetFactory;
pub use hot_swap::HotSwappableTargetSource;
pub use lazy::LazyInitTargetSource;
pub use pool::PoolingTargetSource;
pub use prototype::PrototypeTargetSource;
pub use refreshable::RefreshableTargetSource;
pub use singleton::SingletonTargetSource;
pub use thread_local::ThreadLocalTargetSource;
