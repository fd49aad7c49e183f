//! The scripting language: tokenizer, keyword registry, compiler.
//!
//! ## Pipeline
//!
//! ```text
//! "target HP -= 1"
//!     -> tokenize  [target, HP, -=, 1]
//!     -> compile   Call(stat_sub, [Var(target), "HP", 1])
//!     -> Script    { raw, translated: "stat_sub(target, \"HP\", 1)", code }
//! ```
//!
//! Scripts are compiled once and shared as `Arc<Script>`; evaluation walks
//! the expression tree directly (see [`crate::engine::Scope`]).

pub mod builtins;
pub mod compiler;
pub mod expr;
pub mod keyword;
pub mod tokenizer;

use std::fmt;
use std::hash::{Hash, Hasher};

use tracing::trace;

pub use compiler::Compiler;
pub use expr::{Binding, Call, Expr, Literal};
pub use keyword::{CallArgs, Keyword, KeywordDef, KeywordRegistry, NativeFn, Slot};
pub use tokenizer::{tokenize, Token};

use crate::error::CompileError;

/// An immutable compiled script.
///
/// Two scripts are equal iff their raw source text is equal.
#[derive(Clone, Debug)]
pub struct Script {
    raw: String,
    translated: String,
    code: Expr,
}

impl Script {
    /// Compile `raw` against `registry`.
    pub fn compile(raw: impl Into<String>, registry: &KeywordRegistry) -> Result<Self, CompileError> {
        let raw = raw.into();
        let code = Compiler::new(registry).compile(&raw)?;
        let translated = code.to_string();
        trace!(target: "script", "Compiled `{}` -> {}", raw, translated);
        Ok(Self {
            raw,
            translated,
            code,
        })
    }

    /// Original source text.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Human-readable compiled form.
    #[must_use]
    pub fn translated(&self) -> &str {
        &self.translated
    }

    #[must_use]
    pub fn code(&self) -> &Expr {
        &self.code
    }
}

impl PartialEq for Script {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Script {}

impl Hash for Script {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_equality_by_raw() {
        let registry = KeywordRegistry::with_builtins();
        let a = Script::compile("1 + 2", &registry).unwrap();
        let b = Script::compile("1 + 2", &registry).unwrap();
        let c = Script::compile("(1 + 2)", &registry).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.translated(), c.translated());
    }

    #[test]
    fn test_script_reports_raw_on_error() {
        let registry = KeywordRegistry::with_builtins();
        let err = Script::compile("1 + + 2", &registry).unwrap_err();
        assert_eq!(err.raw, "1 + + 2");
    }

    #[test]
    fn test_user_keyword() {
        let mut registry = KeywordRegistry::with_builtins();
        registry.register(
            Keyword::new("heal", "stat_add")
                .args([Slot::after(1), Slot::after(2), Slot::after(3)])
                .literal(Slot::after(2))
                .with_default(Slot::after(3), Literal::Int(1)),
        );
        let script = Script::compile("heal target HP", &registry).unwrap();
        assert_eq!(script.translated(), "stat_add(target, \"HP\", 1)");
    }
}
