//! Keyword descriptors and the registry the compiler resolves them from.
//!
//! A keyword is an operator name with a calling convention: which tokens
//! around it fill which parameters of a native function. Slots are signed
//! offsets from the keyword: `$1` is the token right after it, `-$1` the
//! token right before it, `-$2` the one before that.
//!
//! The registry is built once at startup (built-ins plus user entries) and
//! then shared read-only behind an `Arc` by every engine that uses it.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use super::builtins;
use super::expr::Literal;
use crate::core::Value;
use crate::engine::Scope;
use crate::error::{Result, SyntaxErrorKind};

/// Signed position of an argument relative to its keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slot(i32);

impl Slot {
    /// The nth token after the keyword (`$n`).
    #[must_use]
    pub const fn after(n: u16) -> Self {
        Self(n as i32)
    }

    /// The nth token before the keyword (`-$n`).
    #[must_use]
    pub const fn before(n: u16) -> Self {
        Self(-(n as i32))
    }

    /// Slot of token `index` in a group whose keyword sits at `keyword`.
    #[must_use]
    pub fn between(index: usize, keyword: usize) -> Self {
        Self(index as i32 - keyword as i32)
    }

    #[must_use]
    pub const fn offset(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "-${}", -self.0)
        } else {
            write!(f, "${}", self.0)
        }
    }
}

impl FromStr for Slot {
    type Err = SyntaxErrorKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || SyntaxErrorKind::InvalidSlot(s.to_string());
        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let n: u16 = rest
            .strip_prefix('$')
            .and_then(|digits| digits.parse().ok())
            .filter(|n| *n > 0)
            .ok_or_else(invalid)?;
        Ok(if negative { Slot::before(n) } else { Slot::after(n) })
    }
}

/// A registered keyword and its calling convention.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Keyword {
    pub name: String,
    /// Native function the call dispatches to.
    pub target: String,
    pub positional: Vec<Slot>,
    pub defaults: FxHashMap<Slot, Literal>,
    pub kwargs: Vec<(String, Slot)>,
    /// Collect unclaimed slots into a trailing argument list.
    pub variadic: bool,
    /// Slots whose tokens are taken as string literals, never resolved.
    pub literal_slots: Vec<Slot>,
}

impl Keyword {
    /// Create a keyword with no parameters.
    pub fn new(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            positional: Vec::new(),
            defaults: FxHashMap::default(),
            kwargs: Vec::new(),
            variadic: false,
            literal_slots: Vec::new(),
        }
    }

    /// Set the positional parameters (builder pattern).
    #[must_use]
    pub fn args(mut self, slots: impl IntoIterator<Item = Slot>) -> Self {
        self.positional = slots.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_default(mut self, slot: Slot, value: Literal) -> Self {
        self.defaults.insert(slot, value);
        self
    }

    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, slot: Slot) -> Self {
        self.kwargs.push((name.into(), slot));
        self
    }

    #[must_use]
    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    #[must_use]
    pub fn literal(mut self, slot: Slot) -> Self {
        self.literal_slots.push(slot);
        self
    }

    #[must_use]
    pub fn is_literal(&self, slot: Slot) -> bool {
        self.literal_slots.contains(&slot)
    }

    #[must_use]
    pub fn default_for(&self, slot: Slot) -> Option<&Literal> {
        self.defaults.get(&slot)
    }
}

/// Serializable keyword definition with text slots (`"$1"`, `"-$2"`).
///
/// This is what a configuration loader hands to the registry.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct KeywordDef {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub defaults: Vec<(String, Literal)>,
    #[serde(default)]
    pub kwargs: Vec<(String, String)>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub literal: Vec<String>,
}

impl TryFrom<KeywordDef> for Keyword {
    type Error = SyntaxErrorKind;

    fn try_from(def: KeywordDef) -> std::result::Result<Self, Self::Error> {
        let mut keyword = Keyword::new(def.name, def.target);
        keyword.positional = def
            .args
            .iter()
            .map(|s| s.parse())
            .collect::<std::result::Result<_, _>>()?;
        for (slot, value) in def.defaults {
            keyword.defaults.insert(slot.parse()?, value);
        }
        for (name, slot) in def.kwargs {
            keyword.kwargs.push((name, slot.parse()?));
        }
        keyword.variadic = def.variadic;
        keyword.literal_slots = def
            .literal
            .iter()
            .map(|s| s.parse())
            .collect::<std::result::Result<_, _>>()?;
        Ok(keyword)
    }
}

/// Arguments handed to a native function.
#[derive(Clone, Debug, Default)]
pub struct CallArgs {
    pub positional: SmallVec<[Value; 4]>,
    pub variadic: Vec<Value>,
    pub kwargs: SmallVec<[(String, Value); 2]>,
}

impl CallArgs {
    /// Take positional argument `index`, leaving `none` in its place.
    pub fn take(&mut self, index: usize) -> Value {
        self.positional
            .get_mut(index)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    /// Take a keyword argument, `none` when absent.
    pub fn kwarg(&mut self, name: &str) -> Value {
        self.kwargs
            .iter_mut()
            .find(|(key, _)| key == name)
            .map(|(_, value)| std::mem::take(value))
            .unwrap_or_default()
    }

    /// Positional and variadic arguments, in order.
    pub fn take_all(&mut self) -> Vec<Value> {
        let mut all: Vec<Value> = self.positional.drain(..).collect();
        all.append(&mut self.variadic);
        all
    }
}

/// A function a keyword can dispatch to.
pub type NativeFn = Arc<dyn Fn(&mut Scope<'_>, CallArgs) -> Result<Value> + Send + Sync>;

/// Keyword table plus the native functions keywords dispatch to.
#[derive(Clone, Default)]
pub struct KeywordRegistry {
    keywords: FxHashMap<String, Keyword>,
    functions: FxHashMap<String, NativeFn>,
}

impl fmt::Debug for KeywordRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.keywords.keys().collect();
        names.sort();
        f.debug_struct("KeywordRegistry")
            .field("keywords", &names)
            .field("functions", &self.functions.len())
            .finish()
    }
}

impl KeywordRegistry {
    /// Create an empty registry (no keywords at all).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in keyword set.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::install(&mut registry);
        registry
    }

    /// Register a keyword, replacing any previous one with the same name.
    pub fn register(&mut self, keyword: Keyword) {
        debug!(target: "script", "Registering keyword '{}' -> {}", keyword.name, keyword.target);
        self.keywords.insert(keyword.name.clone(), keyword);
    }

    /// Register a keyword from its serializable definition.
    pub fn register_def(&mut self, def: KeywordDef) -> std::result::Result<(), SyntaxErrorKind> {
        let keyword = Keyword::try_from(def)?;
        self.register(keyword);
        Ok(())
    }

    /// Register a native function under `name`.
    pub fn register_function<F>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&mut Scope<'_>, CallArgs) -> Result<Value> + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), Arc::new(function));
    }

    #[must_use]
    pub fn keyword(&self, name: &str) -> Option<&Keyword> {
        self.keywords.get(name)
    }

    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.keywords.contains_key(word)
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&NativeFn> {
        self.functions.get(name)
    }

    /// Number of registered keywords.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
