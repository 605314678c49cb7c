//! The tier graph: discovery, cycle detection, dependency counting.
mod graph;
mod node;
mod reverse;

pub use graph::*;
pub use node::*;
pub use reverse::*;
