//! The game interface the solver works against.
mod api;
mod position;
mod value;

pub use api::*;
pub use position::*;
pub use value::*;
