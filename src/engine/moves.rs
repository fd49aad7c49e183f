//! Moves and mutators.
//!
//! ## Move execution
//!
//! A move is an entity whose (inherited) `require` list gates it and whose
//! (inherited) `effect` list mutates state. One invocation goes
//! `PENDING -> REQUIRE_CHECK -> EFFECT_EXEC | REJECTED`:
//!
//! - [`Engine::test_move`] runs the requires in order and stops at the first
//!   falsy one, returning it as the cause.
//! - [`Engine::control_move`] takes selectors for all three roles and runs
//!   every combination of the cross product; each passing combination runs
//!   its effects and is logged.
//!
//! ## Mutators
//!
//! Every `control_*` mutator returns `Ok(false)` for an immutable entity
//! instead of raising. Templates are expected to be hit by broad selectors.

use std::sync::Arc;

use tracing::debug;

use super::{Engine, Scope};
use crate::core::{ActionRecord, Bindings, Entity, Item, Selector, EFFECT, GROUP, REQUIRE};
use crate::error::{EngineError, Result, SelectorKind};
use crate::map::Coord;
use crate::script::Script;

/// Default owner list for recruits.
pub const UNITS: &str = "units";

/// Outcome of a require check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveCheck {
    Passed,
    /// The first require that evaluated falsy.
    Failed(Arc<Script>),
}

impl MoveCheck {
    #[must_use]
    pub fn passed(&self) -> bool {
        matches!(self, MoveCheck::Passed)
    }

    /// The failing require, if any.
    #[must_use]
    pub fn cause(&self) -> Option<&Script> {
        match self {
            MoveCheck::Passed => None,
            MoveCheck::Failed(script) => Some(script),
        }
    }
}

/// How [`Engine::control_stat`] changes a stat.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatOp {
    Set(i64),
    Add(i64),
    Sub(i64),
}

impl Scope<'_> {
    /// Run the bound move's requires.
    pub(crate) fn check_requires(&mut self) -> Result<MoveCheck> {
        let mover = self.mover()?;
        for script in self.engine().inherited_scripts(&mover, REQUIRE)? {
            if !self.check(&script)? {
                return Ok(MoveCheck::Failed(script));
            }
        }
        Ok(MoveCheck::Passed)
    }

    /// Run the bound move's effects, discarding their values.
    pub(crate) fn run_effects(&mut self) -> Result<()> {
        let mover = self.mover()?;
        for script in self.engine().inherited_scripts(&mover, EFFECT)? {
            self.run(&script)?;
        }
        Ok(())
    }

    /// Requires, then effects when they pass.
    pub(crate) fn perform(&mut self) -> Result<MoveCheck> {
        let check = self.check_requires()?;
        if check.passed() {
            self.run_effects()?;
        }
        Ok(check)
    }

    fn mover(&self) -> Result<String> {
        self.bindings()
            .mover
            .clone()
            .ok_or_else(|| EngineError::undefined(SelectorKind::Entity, "move"))
    }
}

impl Engine {
    /// Check whether `caster` may use `mover` on `target`.
    pub fn test_move(&mut self, caster: &str, target: &str, mover: &str) -> Result<MoveCheck> {
        for name in [caster, target, mover] {
            self.get_entity(name)?;
        }
        Scope::new(self, Bindings::of(caster, target, mover)).check_requires()
    }

    /// Run a move for every (caster, target, move) combination.
    ///
    /// Returns true if at least one combination passed its requires.
    pub fn control_move(
        &mut self,
        casters: &Selector,
        targets: &Selector,
        moves: &Selector,
    ) -> Result<bool> {
        let casters = self.select(casters)?;
        let targets = self.select(targets)?;
        let moves = self.select(moves)?;

        let mut any = false;
        for caster in &casters {
            for target in &targets {
                for mover in &moves {
                    let check = Scope::new(self, Bindings::of(caster, target, mover)).perform()?;
                    match check {
                        MoveCheck::Passed => {
                            debug!(target: "engine", "{caster} used '{mover}' on {target}");
                            let record = ActionRecord::new(self.time(), caster, target, mover);
                            self.state.log.push_back(record);
                            any = true;
                        }
                        MoveCheck::Failed(cause) => {
                            debug!(
                                target: "engine",
                                "{caster} cannot use '{mover}' on {target}: `{}`",
                                cause.raw()
                            );
                        }
                    }
                }
            }
        }
        Ok(any)
    }

    /// The named entity for mutation, or `None` when it is immutable.
    fn mutable(&mut self, name: &str) -> Result<Option<&mut Entity>> {
        let entity = self.entity_mut(name)?;
        Ok((!entity.is_immutable()).then_some(entity))
    }

    fn require_kind(&self, name: &str, ok: bool) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(EngineError::undefined(SelectorKind::Stat, name))
        }
    }

    /// Change an entity's own value of a numeric stat.
    pub fn control_stat(&mut self, entity: &str, stat: &str, op: StatOp) -> Result<bool> {
        self.require_kind(stat, self.schema.is_stat(stat))?;
        let Some(target) = self.mutable(entity)? else {
            return Ok(false);
        };
        let current = target.stat(stat).unwrap_or(0);
        let next = match op {
            StatOp::Set(value) => Some(value),
            StatOp::Add(delta) => current.checked_add(delta),
            StatOp::Sub(delta) => current.checked_sub(delta),
        }
        .ok_or(EngineError::Arithmetic("integer overflow"))?;
        target.set_stat(stat, next);
        Ok(true)
    }

    /// Set an entity's own value of a string category.
    pub fn control_string(&mut self, entity: &str, name: &str, value: impl Into<String>) -> Result<bool> {
        self.require_kind(name, self.schema.is_string(name))?;
        let Some(target) = self.mutable(entity)? else {
            return Ok(false);
        };
        target.set_string(name, value.into());
        Ok(true)
    }

    /// Append to an entity's own list.
    pub fn control_list_add(&mut self, entity: &str, list: &str, item: impl Into<Item>) -> Result<bool> {
        self.require_kind(list, self.schema.is_list(list))?;
        let Some(target) = self.mutable(entity)? else {
            return Ok(false);
        };
        target.push_item(list, item.into());
        Ok(true)
    }

    /// Remove the first matching entry of an entity's own list.
    ///
    /// Returns false when nothing matched. An entity never leaves its own
    /// `group`.
    pub fn control_list_remove(&mut self, entity: &str, list: &str, item: impl Into<Item>) -> Result<bool> {
        self.require_kind(list, self.schema.is_list(list))?;
        let item = item.into();
        let Some(target) = self.mutable(entity)? else {
            return Ok(false);
        };
        if list == GROUP && item.as_name() == Some(entity) {
            return Ok(false);
        }
        Ok(target.remove_item(list, &item))
    }

    /// Move an entity on the map; `None` takes it off the map.
    pub fn control_travel(&mut self, entity: &str, location: Option<Coord>) -> Result<bool> {
        if self.mutable(entity)?.is_none() {
            return Ok(false);
        }
        if let Some(coord) = location {
            self.check_bounds(coord)?;
        }
        match location {
            Some(coord) => self.state.occupancy.place(entity, coord),
            None => self.state.occupancy.remove(entity),
        };
        self.entity_mut(entity)?.set_location(location);
        debug!(target: "engine", "{entity} travelled to {location:?}");
        Ok(true)
    }

    /// Clone `template` into a fresh entity.
    ///
    /// The clone is named `{template}_{n}` from the template's recruit
    /// counter, is mutable, and optionally goes on the map and into
    /// `owner`'s `list` (default `units`). Returns the new name, or `None`
    /// if the owner is immutable.
    pub fn control_recruit(
        &mut self,
        template: &str,
        location: Option<Coord>,
        owner: Option<&str>,
        list: Option<&str>,
    ) -> Result<Option<String>> {
        self.get_entity(template)?;
        let list = list.unwrap_or(UNITS);
        if let Some(owner) = owner {
            self.require_kind(list, self.schema.is_list(list))?;
            if self.get_entity(owner)?.is_immutable() {
                return Ok(None);
            }
        }
        if let Some(coord) = location {
            self.check_bounds(coord)?;
        }

        let name = loop {
            let n = self.entity_mut(template)?.bump_recruited();
            let candidate = format!("{template}_{n}");
            if !self.contains(&candidate) {
                break candidate;
            }
        };

        let mut recruit = self.get_entity(template)?.clone_as(name.clone());
        recruit.set_location(location);
        if let Some(coord) = location {
            self.state.occupancy.place(&name, coord);
        }
        self.state.entities.insert(name.clone(), recruit);
        if let Some(owner) = owner {
            self.entity_mut(owner)?.push_item(list, Item::Name(name.clone()));
        }

        debug!(target: "engine", "Recruited '{name}' from '{template}'");
        Ok(Some(name))
    }

    /// Remove an entity from the engine and the map.
    pub fn control_delete(&mut self, entity: &str) -> Result<bool> {
        if self.mutable(entity)?.is_none() {
            return Ok(false);
        }
        self.state.entities.remove(entity);
        self.state.occupancy.remove(entity);
        debug!(target: "engine", "Deleted '{entity}'");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Catalog, EngineConfig};
    use crate::map::Bounds;

    fn engine() -> Engine {
        let catalog = Catalog::new()
            .with_stat("HP")
            .with_list("units")
            .with_string("title");
        let config = EngineConfig::new()
            .with_catalog(catalog)
            .with_bounds(Bounds::grid(5, 5));
        Engine::with_config(config).unwrap()
    }

    #[test]
    fn test_control_stat_ops() {
        let mut engine = engine();
        engine.insert(Entity::new("a").with_stat("HP", 3)).unwrap();

        assert_eq!(engine.control_stat("a", "HP", StatOp::Add(2)), Ok(true));
        assert_eq!(engine.control_stat("a", "HP", StatOp::Sub(1)), Ok(true));
        assert_eq!(engine.get_entity("a").unwrap().stat("HP"), Some(4));
        assert_eq!(engine.control_stat("a", "HP", StatOp::Set(9)), Ok(true));
        assert_eq!(engine.get_entity("a").unwrap().stat("HP"), Some(9));
        assert_eq!(
            engine.control_stat("a", "HP", StatOp::Add(i64::MAX)),
            Err(EngineError::Arithmetic("integer overflow"))
        );
    }

    #[test]
    fn test_immutable_rejects_everything() {
        let mut engine = engine();
        engine
            .insert(Entity::new("t").with_stat("HP", 1).immutable())
            .unwrap();

        assert_eq!(engine.control_stat("t", "HP", StatOp::Add(1)), Ok(false));
        assert_eq!(engine.control_string("t", "title", "x"), Ok(false));
        assert_eq!(engine.control_list_add("t", "units", "x"), Ok(false));
        assert_eq!(engine.control_list_remove("t", "units", "x"), Ok(false));
        assert_eq!(engine.control_travel("t", Some(Coord::flat(1, 1))), Ok(false));
        assert_eq!(engine.control_delete("t"), Ok(false));

        let template = engine.get_entity("t").unwrap();
        assert_eq!(template.stat("HP"), Some(1));
        assert!(template.list("units").is_empty());
        assert_eq!(template.location(), None);
    }

    #[test]
    fn test_wrong_category_is_undefined_stat() {
        let mut engine = engine();
        engine.insert(Entity::new("a")).unwrap();
        assert_eq!(
            engine
                .control_stat("a", "title", StatOp::Set(1))
                .unwrap_err()
                .selector_kind(),
            Some(SelectorKind::Stat)
        );
    }

    #[test]
    fn test_travel() {
        let mut engine = engine();
        engine.insert(Entity::new("a")).unwrap();

        assert_eq!(engine.control_travel("a", Some(Coord::flat(2, 3))), Ok(true));
        assert_eq!(engine.get_entity("a").unwrap().location(), Some(Coord::flat(2, 3)));
        assert_eq!(engine.select(&Selector::At(Coord::flat(2, 3))).unwrap(), vec!["a"]);

        assert_eq!(
            engine
                .control_travel("a", Some(Coord::flat(9, 9)))
                .unwrap_err()
                .selector_kind(),
            Some(SelectorKind::Map)
        );
        assert_eq!(engine.get_entity("a").unwrap().location(), Some(Coord::flat(2, 3)));

        assert_eq!(engine.control_travel("a", None), Ok(true));
        assert_eq!(engine.get_entity("a").unwrap().location(), None);
        assert!(engine.select(&Selector::At(Coord::flat(2, 3))).unwrap().is_empty());
    }

    #[test]
    fn test_recruit() {
        let mut engine = engine();
        engine
            .insert(Entity::new("soldier").with_stat("HP", 5).immutable())
            .unwrap();
        engine.insert(Entity::new("player")).unwrap();

        let first = engine
            .control_recruit("soldier", Some(Coord::flat(0, 0)), Some("player"), None)
            .unwrap();
        assert_eq!(first.as_deref(), Some("soldier_1"));

        let recruit = engine.get_entity("soldier_1").unwrap();
        assert!(!recruit.is_immutable());
        assert_eq!(recruit.stat("HP"), Some(5));
        assert_eq!(recruit.group(), &[Item::from("soldier_1")]);
        assert_eq!(recruit.location(), Some(Coord::flat(0, 0)));
        assert_eq!(engine.get_entity("player").unwrap().list("units"), &[Item::from("soldier_1")]);
        assert_eq!(engine.get_entity("soldier").unwrap().recruited(), 1);

        let second = engine.control_recruit("soldier", None, None, None).unwrap();
        assert_eq!(second.as_deref(), Some("soldier_2"));
    }

    #[test]
    fn test_recruit_immutable_owner() {
        let mut engine = engine();
        engine.insert(Entity::new("soldier")).unwrap();
        engine.insert(Entity::new("statue").immutable()).unwrap();

        assert_eq!(
            engine.control_recruit("soldier", None, Some("statue"), None),
            Ok(None)
        );
        assert!(!engine.contains("soldier_1"));
    }

    #[test]
    fn test_delete() {
        let mut engine = engine();
        engine
            .insert(Entity::new("a").with_location(Coord::flat(1, 1)))
            .unwrap();
        assert_eq!(engine.control_delete("a"), Ok(true));
        assert!(!engine.contains("a"));
        assert!(engine.select(&Selector::At(Coord::flat(1, 1))).unwrap().is_empty());
        assert!(engine.control_delete("a").is_err());
    }
}
