//! Entity selectors.
//!
//! Operations that take "an entity" accept several shapes: one entity name,
//! a map location (everything standing there), a list of selectors, or
//! nothing at all (`false`/`none`). A `Selector` is the closed form of those
//! shapes; the engine resolves it to entity names with
//! [`Engine::select`](crate::Engine::select).

use super::value::Value;
use crate::error::{EngineError, Result};
use crate::map::Coord;

/// Which entities an operation applies to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Selector {
    /// Selects nothing.
    #[default]
    Empty,
    Entity(String),
    /// Every entity at a map location.
    At(Coord),
    Many(Vec<Selector>),
}

impl Selector {
    /// Combine selectors.
    pub fn many<T: Into<Selector>>(items: impl IntoIterator<Item = T>) -> Self {
        Selector::Many(items.into_iter().map(Into::into).collect())
    }
}

impl From<&str> for Selector {
    fn from(name: &str) -> Self {
        Selector::Entity(name.to_string())
    }
}

impl From<String> for Selector {
    fn from(name: String) -> Self {
        Selector::Entity(name)
    }
}

impl From<&String> for Selector {
    fn from(name: &String) -> Self {
        Selector::Entity(name.clone())
    }
}

impl From<Coord> for Selector {
    fn from(coord: Coord) -> Self {
        Selector::At(coord)
    }
}

impl TryFrom<Value> for Selector {
    type Error = EngineError;

    /// Convert an already resolved value.
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::None | Value::Bool(false) => Ok(Selector::Empty),
            Value::Ref(name) | Value::Str(name) => Ok(Selector::Entity(name)),
            Value::List(items) => items
                .into_iter()
                .map(Selector::try_from)
                .collect::<Result<_>>()
                .map(Selector::Many),
            Value::Tuple(items) => coord_from(&items)
                .map(Selector::At)
                .ok_or_else(|| EngineError::type_error("selector", Value::Tuple(items))),
            other => Err(EngineError::type_error("selector", other)),
        }
    }
}

/// Two or three integers as a location.
pub fn coord_from(items: &[Value]) -> Option<Coord> {
    let ints: Option<Vec<i64>> = items
        .iter()
        .map(|item| match item {
            Value::Int(n) => Some(*n),
            _ => None,
        })
        .collect();
    match ints?.as_slice() {
        [x, y] => Some(Coord::flat(*x, *y)),
        [x, y, z] => Some(Coord::new(*x, *y, *z)),
        _ => None,
    }
}
