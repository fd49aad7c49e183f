//! Engine configuration types.
//!
//! Games configure the engine at startup by providing:
//! - `Catalog`: Declares which names are stats, list categories and strings
//! - `EngineConfig`: Revert depth, tick rule, RNG seed, map bounds, catalog
//! - `EntityDef`: Serializable entity definitions fed to `Engine::load`
//!
//! The engine never hardcodes stat names - games declare them. The only
//! built-in categories are the lists `group`, `require` and `effect`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, Item, EFFECT, GROUP, REQUIRE};
use crate::error::ConfigError;
use crate::map::{Bounds, Coord};
use crate::script::Script;

/// A declared list category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListCategory {
    pub name: String,

    /// Inheriting list ("rlist"): stat resolution also walks every entity
    /// named in it.
    #[serde(default)]
    pub inherit: bool,
}

/// Category declarations.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Catalog {
    pub stats: Vec<String>,
    pub lists: Vec<ListCategory>,
    pub strings: Vec<String>,
}

impl Catalog {
    /// Create an empty catalog (built-in lists only).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a numeric stat.
    #[must_use]
    pub fn with_stat(mut self, name: impl Into<String>) -> Self {
        self.stats.push(name.into());
        self
    }

    /// Declare a plain list category.
    #[must_use]
    pub fn with_list(mut self, name: impl Into<String>) -> Self {
        self.lists.push(ListCategory {
            name: name.into(),
            inherit: false,
        });
        self
    }

    /// Declare an inheriting list category.
    #[must_use]
    pub fn with_rlist(mut self, name: impl Into<String>) -> Self {
        self.lists.push(ListCategory {
            name: name.into(),
            inherit: true,
        });
        self
    }

    /// Declare a string category.
    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>) -> Self {
        self.strings.push(name.into());
        self
    }
}

/// What kind of value a category name holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Stat,
    List { inherit: bool },
    String,
}

/// Validated index over a [`Catalog`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Schema {
    kinds: FxHashMap<String, Category>,
    /// Inheriting lists, in declaration order.
    rlists: Vec<String>,
}

impl Schema {
    /// Index a catalog, rejecting names declared more than once.
    pub fn build(catalog: &Catalog) -> Result<Self, ConfigError> {
        let mut schema = Self {
            kinds: FxHashMap::default(),
            rlists: Vec::new(),
        };
        for builtin in [GROUP, REQUIRE, EFFECT] {
            schema.declare(builtin, Category::List { inherit: false })?;
        }

        for name in &catalog.stats {
            schema.declare(name, Category::Stat)?;
        }
        for list in &catalog.lists {
            schema.declare(&list.name, Category::List { inherit: list.inherit })?;
            if list.inherit {
                schema.rlists.push(list.name.clone());
            }
        }
        for name in &catalog.strings {
            schema.declare(name, Category::String)?;
        }
        Ok(schema)
    }

    fn declare(&mut self, name: &str, category: Category) -> Result<(), ConfigError> {
        if self.kinds.insert(name.to_string(), category).is_some() {
            return Err(ConfigError::DuplicateCategory(name.to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn kind(&self, name: &str) -> Option<Category> {
        self.kinds.get(name).copied()
    }

    #[must_use]
    pub fn is_stat(&self, name: &str) -> bool {
        self.kind(name) == Some(Category::Stat)
    }

    #[must_use]
    pub fn is_list(&self, name: &str) -> bool {
        matches!(self.kind(name), Some(Category::List { .. }))
    }

    #[must_use]
    pub fn is_string(&self, name: &str) -> bool {
        self.kind(name) == Some(Category::String)
    }

    /// Inheriting list categories, in declaration order.
    #[must_use]
    pub fn rlists(&self) -> &[String] {
        &self.rlists
    }

    /// Check that an entity only uses declared categories of the right kind.
    pub fn validate(&self, entity: &Entity) -> Result<(), ConfigError> {
        let undeclared = |category: &str| ConfigError::UndeclaredCategory {
            entity: entity.name().to_string(),
            category: category.to_string(),
        };
        if let Some(name) = entity.stat_names().find(|name| !self.is_stat(name)) {
            return Err(undeclared(name));
        }
        if let Some(name) = entity.list_names().find(|name| !self.is_list(name)) {
            return Err(undeclared(name));
        }
        if let Some(name) = entity.string_names().find(|name| !self.is_string(name)) {
            return Err(undeclared(name));
        }
        Ok(())
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Revert frames kept; 0 disables reverting.
    pub revert_depth: usize,

    /// Name of the entity run as a move on every tick, if it exists.
    pub tick_rule: String,

    /// RNG seed.
    pub seed: u64,

    /// Valid map locations. `None` accepts any location.
    pub bounds: Option<Bounds>,

    pub catalog: Catalog,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            revert_depth: 0,
            tick_rule: "tick".to_string(),
            seed: 0,
            bounds: None,
            catalog: Catalog::default(),
        }
    }
}

impl EngineConfig {
    /// Create a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_revert_depth(mut self, depth: usize) -> Self {
        self.revert_depth = depth;
        self
    }

    #[must_use]
    pub fn with_tick_rule(mut self, name: impl Into<String>) -> Self {
        self.tick_rule = name.into();
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = Some(bounds);
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Is `coord` a valid map location?
    #[must_use]
    pub fn in_bounds(&self, coord: Coord) -> bool {
        self.bounds.map_or(true, |bounds| bounds.contains(coord))
    }
}

/// Serializable entity definition, as produced by a configuration loader.
///
/// Scripts are source text; `Engine::load` compiles them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityDef {
    pub name: String,
    pub immutable: bool,
    pub location: Option<Coord>,
    pub group: Vec<String>,
    pub stats: BTreeMap<String, i64>,
    pub lists: BTreeMap<String, Vec<String>>,
    pub strings: BTreeMap<String, String>,
    pub require: Vec<String>,
    pub effect: Vec<String>,
}

impl EntityDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build the entity, compiling scripts with `compile`.
    ///
    /// The first compile error aborts the build.
    pub fn into_entity<F, E>(self, mut compile: F) -> Result<Entity, E>
    where
        F: FnMut(&str) -> Result<Arc<Script>, E>,
    {
        let mut entity = Entity::new(self.name);
        for group in self.group {
            entity = entity.with_group(group);
        }
        for (name, value) in self.stats {
            entity = entity.with_stat(name, value);
        }
        for (name, items) in self.lists {
            entity = entity.with_list(name, items);
        }
        for (name, value) in self.strings {
            entity = entity.with_string(name, value);
        }
        for raw in &self.require {
            entity = entity.with_list(REQUIRE, [Item::Script(compile(raw)?)]);
        }
        for raw in &self.effect {
            entity = entity.with_list(EFFECT, [Item::Script(compile(raw)?)]);
        }
        if let Some(location) = self.location {
            entity = entity.with_location(location);
        }
        if self.immutable {
            entity = entity.immutable();
        }
        Ok(entity)
    }
}
