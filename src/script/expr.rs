//! Compiled expression tree.
//!
//! The compiler reduces every call group to one of these nodes. The tree is
//! evaluated directly by [`Scope`](crate::engine::Scope); its `Display` form
//! is the human-readable translation stored on each [`Script`](super::Script).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A constant value known at compile time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("none"),
            Literal::Bool(b) => write!(f, "{b}"),
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Str(s) => write_quoted(f, s),
        }
    }
}

/// Names bound by the execution environment rather than looked up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Binding {
    Caster,
    Target,
    Move,
}

impl Binding {
    /// Match a reserved identifier (full name or one-letter alias).
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        match word {
            "caster" | "c" => Some(Binding::Caster),
            "target" | "t" => Some(Binding::Target),
            "move" | "m" => Some(Binding::Move),
            _ => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Binding::Caster => "caster",
            Binding::Target => "target",
            Binding::Move => "move",
        }
    }
}

/// A resolved keyword call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Call {
    /// Name of the native function to dispatch to.
    pub target: String,
    pub args: Vec<Expr>,
    /// Leftover arguments swept up by a variadic keyword.
    pub variadic: Vec<Expr>,
    pub kwargs: Vec<(String, Expr)>,
}

/// An expression node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Literal(Literal),
    Var(Binding),
    /// Bare identifier; looked up as an entity when used in entity position.
    Ref(String),
    List(Vec<Expr>),
    /// Keyword-less nested group: a path like `(target HP)` or a coordinate.
    Tuple(Vec<Expr>),
    Call(Call),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(lit) => lit.fmt(f),
            Expr::Var(binding) => f.write_str(binding.name()),
            Expr::Ref(name) => write!(f, "@{name}"),
            Expr::List(items) => {
                f.write_str("[")?;
                write_joined(f, items)?;
                f.write_str("]")
            }
            Expr::Tuple(items) => {
                f.write_str("(")?;
                write_joined(f, items)?;
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
            Expr::Call(call) => {
                write!(f, "{}(", call.target)?;
                let mut first = true;
                for arg in call.args.iter().chain(&call.variadic) {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    arg.fmt(f)?;
                }
                for (name, value) in &call.kwargs {
                    if !first {
                        f.write_str(", ")?;
                    }
                    first = false;
                    write!(f, "{name}={value}")?;
                }
                f.write_str(")")
            }
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Expr]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}
