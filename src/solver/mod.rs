//! The solver facade and its options.
mod options;
mod solver;

pub use options::*;
pub use solver::*;
