//! Storage of solved tiers.
mod database;
mod disk;
mod memory;
mod records;
mod store;

pub use database::*;
pub use disk::*;
pub use memory::*;
pub use records::*;
pub use store::*;
