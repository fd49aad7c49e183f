//! # rust-tbs
//!
//! A rule-driven state-machine engine for turn-based simulations.
//!
//! ## Design Principles
//!
//! 1. **Data-Driven**: Entities, stats and moves are described in data and a
//!    small prefix scripting language. Nothing game-specific is hardcoded.
//!
//! 2. **Keywords Over Grammar**: The language has no fixed operators. Every
//!    operator is a registered keyword naming a native function and the
//!    slots its arguments come from.
//!
//! 3. **Configuration Over Convention**: Games declare their stat, list and
//!    string categories up front via `Catalog`; undeclared names are errors.
//!
//! ## Architecture
//!
//! - **Compile Once**: Scripts compile at load time into an expression tree
//!   shared as `Arc<Script>`.
//!
//! - **Persistent Data Structures**: O(1) cloning via `im-rs` for revert
//!   frames, what-if queries and tree search.
//!
//! - **Deterministic**: Ordered maps and a seeded ChaCha RNG mean equal
//!   inputs replay identically.
//!
//! ## Modules
//!
//! - `script`: Tokenizer, keyword registry, compiler and built-ins
//! - `core`: Entities, values, selectors, state, RNG, configuration
//! - `map`: Coordinates, bounds and occupancy
//! - `engine`: Stat resolution, moves, time, delays and revert
//! - `rules`: `Rules` trait for search callers

pub mod core;
pub mod engine;
pub mod error;
pub mod map;
pub mod rules;
pub mod script;

// Re-export commonly used types
pub use crate::core::{
    ActionRecord, Bindings, Callback, Captured, Catalog, EngineConfig, EngineState, Entity,
    EntityDef, GameRng, GameRngState, Item, ListCategory, Selector, Value,
};

pub use crate::engine::{Engine, MoveCheck, Scope, StatOp};

pub use crate::error::{CompileError, ConfigError, EngineError, Result, SelectorKind, SyntaxErrorKind};

pub use crate::map::{Bounds, Coord};

pub use crate::rules::{MoveChoice, Outcome, Rules};

pub use crate::script::{Keyword, KeywordDef, KeywordRegistry, Literal, Script, Slot};
