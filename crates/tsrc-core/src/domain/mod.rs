//! Domain types shared by every target source.
//!
//! These are plain data types with no infrastructure dependencies.

mod stats;
mod target_type;

pub use stats::{PoolStats, ThreadLocalStats};
pub use target_type::TargetType;
