//! The rule/state engine.
//!
//! ## Overview
//!
//! An [`Engine`] owns the entity table, map occupancy, delay queue, clock,
//! RNG and action log (together an [`EngineState`]), plus a bounded history
//! of past states for reverting. Scripts run against it through a
//! [`Scope`], which carries the caster/target/move bindings and temporary
//! storage of one evaluation.
//!
//! Operations are split by concern:
//! - `stats`: inherited stat resolution
//! - `moves`: require checks, effect execution and mutators
//! - `time`: the clock, tick rule and delay scheduler
//! - `revert`: history frames
//!
//! ## Cloning
//!
//! Engine state uses persistent collections, so [`Engine::copy`] is O(1).
//! Speculative queries run on copies and never touch the live engine.
//!
//! ```
//! use rust_tbs::{Bindings, Catalog, Engine, EngineConfig, Entity, Value};
//!
//! let config = EngineConfig::new().with_catalog(Catalog::new().with_stat("HP"));
//! let mut engine = Engine::with_config(config).unwrap();
//! engine.insert(Entity::new("orc").with_stat("HP", 3)).unwrap();
//!
//! let hp = engine.evaluate("orc.HP + 1", Bindings::new()).unwrap();
//! assert_eq!(hp, Value::Int(4));
//! ```

pub mod moves;
pub mod revert;
pub mod scope;
pub mod stats;
pub mod time;

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use im::Vector;
use rustc_hash::FxHasher;
use tracing::debug;

pub use moves::{MoveCheck, StatOp};
pub use scope::Scope;

use crate::core::{
    ActionRecord, Bindings, EngineConfig, EngineState, Entity, EntityDef, Schema, Selector, Value,
};
use crate::error::{EngineError, Result, SelectorKind};
use crate::map::Coord;
use crate::script::{KeywordRegistry, Script};

/// A rule engine instance.
#[derive(Clone, Debug)]
pub struct Engine {
    registry: Arc<KeywordRegistry>,
    config: Arc<EngineConfig>,
    schema: Arc<Schema>,
    state: EngineState,
    /// Revert frames, oldest first.
    history: Vector<EngineState>,
    /// Compiled scripts by source text.
    cache: im::HashMap<String, Arc<Script>>,
}

impl Engine {
    /// Create an engine over a frozen keyword registry.
    pub fn new(config: EngineConfig, registry: Arc<KeywordRegistry>) -> Result<Self> {
        let schema = Schema::build(&config.catalog)?;
        debug!(
            target: "engine",
            "Creating engine: {} keywords, revert depth {}",
            registry.len(),
            config.revert_depth
        );
        Ok(Self {
            registry,
            state: EngineState::new(config.seed),
            config: Arc::new(config),
            schema: Arc::new(schema),
            history: Vector::new(),
            cache: im::HashMap::new(),
        })
    }

    /// Create an engine using the built-in keyword set.
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        Self::new(config, Arc::new(KeywordRegistry::with_builtins()))
    }

    // === Accessors ===

    #[must_use]
    pub fn registry(&self) -> &Arc<KeywordRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Current clock value.
    #[must_use]
    pub fn time(&self) -> i64 {
        self.state.time
    }

    /// Executed moves, oldest first.
    #[must_use]
    pub fn log(&self) -> &Vector<ActionRecord> {
        &self.state.log
    }

    /// Number of pending delays.
    #[must_use]
    pub fn pending_delays(&self) -> usize {
        self.state.delays.len()
    }

    // === Entities ===

    /// Look up an entity by name.
    pub fn get_entity(&self, name: &str) -> Result<&Entity> {
        self.state
            .entities
            .get(name)
            .ok_or_else(|| EngineError::undefined(SelectorKind::Entity, name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.state.entities.contains_key(name)
    }

    /// All entities, ordered by name.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.state.entities.values()
    }

    /// Add an entity, placing it on the map if it has a location.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        if self.contains(entity.name()) {
            return Err(EngineError::DuplicateEntity(entity.name().to_string()));
        }
        self.schema.validate(&entity)?;
        if let Some(location) = entity.location() {
            self.check_bounds(location)?;
            self.state.occupancy.place(entity.name(), location);
        }
        debug!(target: "engine", "Inserted entity '{}'", entity.name());
        self.state
            .entities
            .insert(entity.name().to_string(), entity);
        Ok(())
    }

    /// Compile and insert an entity definition.
    ///
    /// A script that fails to compile keeps the entity out of the engine.
    pub fn load(&mut self, def: EntityDef) -> Result<()> {
        let entity = def.into_entity(|raw| self.compile(raw))?;
        self.insert(entity)
    }

    /// Load several definitions in order, stopping at the first error.
    pub fn load_all(&mut self, defs: impl IntoIterator<Item = EntityDef>) -> Result<()> {
        defs.into_iter().try_for_each(|def| self.load(def))
    }

    pub(crate) fn entity_mut(&mut self, name: &str) -> Result<&mut Entity> {
        self.state
            .entities
            .get_mut(name)
            .ok_or_else(|| EngineError::undefined(SelectorKind::Entity, name))
    }

    pub(crate) fn check_bounds(&self, coord: Coord) -> Result<()> {
        if self.config.in_bounds(coord) {
            Ok(())
        } else {
            Err(EngineError::undefined(SelectorKind::Map, coord.to_string()))
        }
    }

    // === Selection ===

    /// Resolve a selector to entity names.
    ///
    /// Missing entities and out-of-bounds locations are errors; an empty
    /// location selects nothing.
    pub fn select(&self, selector: &Selector) -> Result<Vec<String>> {
        let mut names = Vec::new();
        self.select_into(selector, &mut names)?;
        Ok(names)
    }

    fn select_into(&self, selector: &Selector, out: &mut Vec<String>) -> Result<()> {
        match selector {
            Selector::Empty => {}
            Selector::Entity(name) => {
                self.get_entity(name)?;
                out.push(name.clone());
            }
            Selector::At(coord) => {
                self.check_bounds(*coord)?;
                out.extend(self.state.occupancy.at(*coord).cloned());
            }
            Selector::Many(items) => {
                for item in items {
                    self.select_into(item, out)?;
                }
            }
        }
        Ok(())
    }

    // === Scripts ===

    /// Compile a script, reusing the cached copy for known source text.
    pub fn compile(&mut self, raw: &str) -> Result<Arc<Script>> {
        if let Some(script) = self.cache.get(raw) {
            return Ok(Arc::clone(script));
        }
        let script = Arc::new(Script::compile(raw, &self.registry)?);
        self.cache.insert(raw.to_string(), Arc::clone(&script));
        Ok(script)
    }

    /// Compile (cached) and run an ad-hoc script.
    pub fn evaluate(&mut self, source: &str, bindings: Bindings) -> Result<Value> {
        let script = self.compile(source)?;
        let mut scope = Scope::new(self, bindings);
        let value = scope.run(&script)?;
        scope.resolve(value)
    }

    /// Roll an integer in `lo..=hi` from the engine RNG.
    pub fn random(&mut self, lo: i64, hi: i64) -> Result<i64> {
        self.state
            .rng
            .gen_range_inclusive(lo, hi)
            .ok_or(EngineError::Arithmetic("empty random range"))
    }

    // === Speculation ===

    /// A full copy of this engine, history included.
    #[must_use]
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Run `f` against a copy; the live engine is never touched.
    pub fn what_if<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Engine) -> R,
    {
        let mut copy = self.copy();
        f(&mut copy)
    }

    /// Deterministic hash of the current state.
    ///
    /// Equal states hash equal across runs; history and cache are excluded.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.state.hash(&mut hasher);
        hasher.finish()
    }
}
