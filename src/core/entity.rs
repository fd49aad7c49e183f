//! Entities: named records of stats, lists and strings.
//!
//! Every entity is its own first group member. Entity `knight` always has
//! `knight` in its `group` list, so "self plus groups" is one uniform
//! traversal during stat resolution.
//!
//! ## Usage
//!
//! ```
//! use rust_tbs::core::{Entity, Item};
//!
//! let knight = Entity::new("knight")
//!     .with_stat("HP", 3)
//!     .with_group("infantry");
//!
//! assert_eq!(knight.stat("HP"), Some(3));
//! assert_eq!(knight.group(), &[Item::from("knight"), Item::from("infantry")]);
//! ```
//!
//! Entities are mutated only through the engine's `control_*` operations;
//! the mutators here are crate-private.

use std::hash::{Hash, Hasher};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::value::Value;
use crate::error::{EngineError, Result};
use crate::map::Coord;
use crate::script::Script;

/// Name of the built-in group list.
pub const GROUP: &str = "group";
/// Name of the built-in require list.
pub const REQUIRE: &str = "require";
/// Name of the built-in effect list.
pub const EFFECT: &str = "effect";

/// One entry of an entity list.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Item {
    /// A string or an entity name; context decides which.
    Name(String),
    /// A compiled script (entries of `require` and `effect`).
    Script(Arc<Script>),
}

impl Item {
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Item::Name(name) => Some(name),
            Item::Script(_) => None,
        }
    }

    #[must_use]
    pub fn as_script(&self) -> Option<&Arc<Script>> {
        match self {
            Item::Script(script) => Some(script),
            Item::Name(_) => None,
        }
    }
}

impl From<&str> for Item {
    fn from(name: &str) -> Self {
        Item::Name(name.to_string())
    }
}

impl From<String> for Item {
    fn from(name: String) -> Self {
        Item::Name(name)
    }
}

impl From<Arc<Script>> for Item {
    fn from(script: Arc<Script>) -> Self {
        Item::Script(script)
    }
}

impl From<Item> for Value {
    fn from(item: Item) -> Self {
        match item {
            Item::Name(name) => Value::Str(name),
            Item::Script(script) => Value::Script(script),
        }
    }
}

impl TryFrom<Value> for Item {
    type Error = EngineError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Str(name) | Value::Ref(name) => Ok(Item::Name(name)),
            Value::Int(n) => Ok(Item::Name(n.to_string())),
            Value::Script(script) => Ok(Item::Script(script)),
            other => Err(EngineError::type_error("list item", other)),
        }
    }
}

/// A named game object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    name: String,
    location: Option<Coord>,
    immutable: bool,
    stats: FxHashMap<String, i64>,
    lists: FxHashMap<String, Vec<Item>>,
    strings: FxHashMap<String, String>,
    /// Clones recruited from this entity so far.
    recruited: u32,
}

impl Entity {
    /// Create an entity whose group list holds only itself.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut lists = FxHashMap::default();
        lists.insert(GROUP.to_string(), vec![Item::Name(name.clone())]);
        Self {
            name,
            location: None,
            immutable: false,
            stats: FxHashMap::default(),
            lists,
            strings: FxHashMap::default(),
            recruited: 0,
        }
    }

    // === Builders ===

    #[must_use]
    pub fn with_stat(mut self, name: impl Into<String>, value: i64) -> Self {
        self.stats.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_string(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.strings.insert(name.into(), value.into());
        self
    }

    /// Append entries to a list category.
    #[must_use]
    pub fn with_list<I, T>(mut self, name: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Item>,
    {
        self.lists
            .entry(name.into())
            .or_default()
            .extend(items.into_iter().map(Into::into));
        self
    }

    /// Add a group this entity inherits from.
    #[must_use]
    pub fn with_group(self, group: impl Into<String>) -> Self {
        self.with_list(GROUP, [group.into()])
    }

    #[must_use]
    pub fn with_require(self, script: Arc<Script>) -> Self {
        self.with_list(REQUIRE, [script])
    }

    #[must_use]
    pub fn with_effect(self, script: Arc<Script>) -> Self {
        self.with_list(EFFECT, [script])
    }

    #[must_use]
    pub fn with_location(mut self, location: Coord) -> Self {
        self.location = Some(location);
        self
    }

    /// Mark as an immutable template.
    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.immutable = true;
        self
    }

    // === Accessors ===

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn location(&self) -> Option<Coord> {
        self.location
    }

    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Own value of a stat, without inheritance.
    #[must_use]
    pub fn stat(&self, name: &str) -> Option<i64> {
        self.stats.get(name).copied()
    }

    /// Own entries of a list, without inheritance. Empty when absent.
    #[must_use]
    pub fn list(&self, name: &str) -> &[Item] {
        self.lists.get(name).map_or(&[], Vec::as_slice)
    }

    /// Own value of a string category, without inheritance.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn group(&self) -> &[Item] {
        self.list(GROUP)
    }

    #[must_use]
    pub fn recruited(&self) -> u32 {
        self.recruited
    }

    pub fn stat_names(&self) -> impl Iterator<Item = &str> {
        self.stats.keys().map(String::as_str)
    }

    pub fn list_names(&self) -> impl Iterator<Item = &str> {
        self.lists.keys().map(String::as_str)
    }

    pub fn string_names(&self) -> impl Iterator<Item = &str> {
        self.strings.keys().map(String::as_str)
    }

    // === Mutation (engine only) ===

    pub(crate) fn set_stat(&mut self, name: &str, value: i64) {
        self.stats.insert(name.to_string(), value);
    }

    pub(crate) fn set_string(&mut self, name: &str, value: String) {
        self.strings.insert(name.to_string(), value);
    }

    pub(crate) fn push_item(&mut self, list: &str, item: Item) {
        self.lists.entry(list.to_string()).or_default().push(item);
    }

    /// Remove the first matching entry. Returns true if one was removed.
    pub(crate) fn remove_item(&mut self, list: &str, item: &Item) -> bool {
        let Some(entries) = self.lists.get_mut(list) else {
            return false;
        };
        match entries.iter().position(|entry| entry == item) {
            Some(index) => {
                entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_location(&mut self, location: Option<Coord>) {
        self.location = location;
    }

    /// Advance the recruit counter, returning its new value.
    pub(crate) fn bump_recruited(&mut self) -> u32 {
        self.recruited += 1;
        self.recruited
    }

    /// A mutable copy named `name`, whose self-entry in `group` is replaced.
    pub(crate) fn clone_as(&self, name: String) -> Self {
        let mut clone = self.clone();
        clone.immutable = false;
        clone.recruited = 0;
        clone.location = None;
        if let Some(group) = clone.lists.get_mut(GROUP) {
            for entry in group.iter_mut() {
                if entry.as_name() == Some(self.name.as_str()) {
                    *entry = Item::Name(name.clone());
                }
            }
        }
        clone.name = name;
        clone
    }
}

impl Hash for Entity {
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        self.name.hash(hasher);
        self.location.hash(hasher);
        self.immutable.hash(hasher);
        self.recruited.hash(hasher);

        // Sorted order for determinism
        let mut stats: Vec<_> = self.stats.iter().collect();
        stats.sort_by_key(|(k, _)| *k);
        stats.hash(hasher);

        let mut lists: Vec<_> = self.lists.iter().collect();
        lists.sort_by_key(|(k, _)| *k);
        lists.hash(hasher);

        let mut strings: Vec<_> = self.strings.iter().collect();
        strings.sort_by_key(|(k, _)| *k);
        strings.hash(hasher);
    }
}
