//! Rules trait for game implementations.
//!
//! Games implement `Rules` to define:
//! - Candidate moves for each engine state
//! - End conditions
//!
//! The engine executes moves and checks requires but never decides when a
//! simulation is over.

pub mod engine;

pub use engine::{MoveChoice, Outcome, Rules};
