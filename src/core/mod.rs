//! Core engine types: entities, values, selectors, state, RNG, configuration.
//!
//! This module contains the game-agnostic building blocks. Games configure
//! them via `EngineConfig` and `Catalog` rather than modifying the core.

pub mod action;
pub mod config;
pub mod entity;
pub mod rng;
pub mod selector;
pub mod state;
pub mod value;

pub use action::ActionRecord;
pub use config::{Catalog, Category, EngineConfig, EntityDef, ListCategory, Schema};
pub use entity::{Entity, Item, EFFECT, GROUP, REQUIRE};
pub use rng::{GameRng, GameRngState};
pub use selector::Selector;
pub use state::{Bindings, Callback, Captured, Delay, EngineState};
pub use value::Value;
