//! Tier-level orchestration: scheduling, distribution, analysis.
mod analyzer;
mod distributed;
mod protocol;
mod scheduler;
mod summary;

pub use analyzer::*;
pub use distributed::*;
pub use protocol::*;
pub use scheduler::*;
pub use summary::*;
