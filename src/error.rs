//! Error types.
//!
//! Three families, matching where they can occur:
//!
//! - [`CompileError`]: raised while turning script text into an expression
//!   tree. Always carries the raw source so loaders can report it.
//! - [`EngineError`]: raised while evaluating scripts or calling engine
//!   operations. Undefined selectors are typed by [`SelectorKind`].
//! - [`ConfigError`]: inconsistent configuration or entity definitions.
//!
//! Require failures and writes to immutable entities are *not* errors; they
//! are reported through return values.

use thiserror::Error;

/// Result alias used by engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// The specific reason a script failed to compile.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SyntaxErrorKind {
    #[error("script is empty")]
    Empty,

    #[error("empty token at byte {0}")]
    EmptyToken(usize),

    #[error("unbalanced bracket '{0}'")]
    UnbalancedBracket(char),

    #[error("mismatched bracket: expected '{expected}', found '{found}'")]
    MismatchedBracket { expected: char, found: char },

    #[error("unterminated string literal")]
    UnterminatedString,

    #[error("more than one keyword in one call: {0:?}")]
    TooManyKeywords(Vec<String>),

    #[error("no keyword in top-level call")]
    NoKeyword,

    #[error("keyword '{keyword}' is missing argument {slot}")]
    MissingArgument { keyword: String, slot: String },

    #[error("keyword '{keyword}' has unused arguments at {slots:?}")]
    UnusedArguments { keyword: String, slots: Vec<String> },

    #[error("invalid slot '{0}' (expected $n or -$n)")]
    InvalidSlot(String),
}

/// A script that could not be compiled.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error in `{raw}`: {kind}")]
pub struct CompileError {
    /// The offending source text.
    pub raw: String,
    pub kind: SyntaxErrorKind,
}

impl CompileError {
    pub fn new(raw: impl Into<String>, kind: SyntaxErrorKind) -> Self {
        Self {
            raw: raw.into(),
            kind,
        }
    }
}

/// What kind of thing a selector failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SelectorKind {
    Entity,
    Stat,
    Map,
    /// Distance metrics, raised by pathing collaborators.
    Metric,
}

impl std::fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SelectorKind::Entity => "entity",
            SelectorKind::Stat => "stat",
            SelectorKind::Map => "map location",
            SelectorKind::Metric => "metric",
        };
        f.write_str(name)
    }
}

/// Inconsistent configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("category '{0}' is declared more than once")]
    DuplicateCategory(String),

    #[error("entity '{entity}' uses undeclared category '{category}'")]
    UndeclaredCategory { entity: String, category: String },
}

/// Errors raised while evaluating scripts or running engine operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("undefined {kind}: '{name}'")]
    Undefined { kind: SelectorKind, name: String },

    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    #[error("type error: expected {expected}, found {found}")]
    Type { expected: &'static str, found: String },

    #[error("arithmetic error: {0}")]
    Arithmetic(&'static str),

    #[error("group cycle: {}", path.join(" -> "))]
    GroupCycle { path: Vec<String> },

    #[error("entity '{0}' already exists")]
    DuplicateEntity(String),
}

impl EngineError {
    /// Shorthand for an undefined-selector error.
    pub fn undefined(kind: SelectorKind, name: impl Into<String>) -> Self {
        Self::Undefined {
            kind,
            name: name.into(),
        }
    }

    /// Shorthand for a type error.
    pub fn type_error(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        Self::Type {
            expected,
            found: format!("{found:?}"),
        }
    }

    /// The selector kind, if this is an undefined-selector error.
    #[must_use]
    pub fn selector_kind(&self) -> Option<SelectorKind> {
        match self {
            Self::Undefined { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
