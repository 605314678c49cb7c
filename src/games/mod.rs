//! Reference games.
mod explicit;
mod tictactoe;

pub use explicit::*;
pub use tictactoe::*;
