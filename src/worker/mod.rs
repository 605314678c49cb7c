//! Per-tier solving.
mod budget;
mod checks;
mod frontier;
mod immediate;
mod induction;
mod iteration;
mod reverse;
mod worker;

pub use budget::*;
pub use checks::*;
pub use frontier::*;
pub use immediate::*;
pub use induction::*;
pub use iteration::*;
pub use reverse::*;
pub use worker::*;
