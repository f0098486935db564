//! Services built on top of the ports.

mod invoker;

pub use invoker::{InvocationError, TargetInvoker};
