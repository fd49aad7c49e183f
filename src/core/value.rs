//! Runtime values produced by evaluating scripts.
//!
//! ## Names and references
//!
//! A bare identifier evaluates to `Value::Ref(name)`. It is only looked up
//! when used where an entity is expected, so `x in [a b]` compares names while
//! `a HP += 1` mutates the entity `a`. `Ref` and `Str` holding the same text
//! compare equal under [`Value::same`].
//!
//! ## Tuples
//!
//! A keyword-less nested group evaluates to a tuple. Tuples come in two
//! shapes: **paths** (`(target HP)`, a name followed by stat names) and
//! **coordinates** (two or three integers).

use std::fmt;
use std::sync::Arc;

use crate::error::{EngineError, Result};
use crate::script::{Literal, Script};

/// A dynamically typed script value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Value {
    #[default]
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Unresolved entity reference.
    Ref(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Script(Arc<Script>),
}

impl Value {
    /// Truthiness used by requires and logical operators.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Str(s) => !s.is_empty(),
            Value::Ref(_) | Value::Script(_) => true,
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
        }
    }

    /// Integer view. Booleans count as 0/1.
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(EngineError::type_error("integer", other)),
        }
    }

    /// Name view for references and strings.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Value::Ref(name) | Value::Str(name) => Some(name),
            _ => None,
        }
    }

    /// Equality treating `Ref` and `Str` with the same text as the same name.
    #[must_use]
    pub fn same(&self, other: &Value) -> bool {
        match (self.as_name(), other.as_name()) {
            (Some(a), Some(b)) => a == b,
            _ => match (self, other) {
                (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same(y))
                }
                (Value::Bool(_), Value::Int(_)) | (Value::Int(_), Value::Bool(_)) => {
                    self.as_int().ok() == other.as_int().ok()
                }
                _ => self == other,
            },
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Str(_) => "string",
            Value::Ref(_) => "reference",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Script(_) => "script",
        }
    }
}

/// Path shape of tuple elements.
pub(crate) fn is_path(items: &[Value]) -> bool {
    match items {
        [Value::Ref(_), rest @ ..] if !rest.is_empty() => {
            rest.iter().all(|item| item.as_name().is_some())
        }
        _ => false,
    }
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::None => Value::None,
            Literal::Bool(b) => Value::Bool(b),
            Literal::Int(n) => Value::Int(n),
            Literal::Str(s) => Value::Str(s),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Str(s) | Value::Ref(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str("]")
            }
            Value::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    item.fmt(f)?;
                }
                f.write_str(")")
            }
            Value::Script(script) => write!(f, "{{{}}}", script.raw()),
        }
    }
}
