//! Execution environment of one script evaluation.
//!
//! A `Scope` is what native functions receive: the engine handle, the
//! caster/target/move bindings, and the temporary `storage` written by `let`
//! and read by `var`. Requires and effects of one move combination share a
//! scope, so a value stored by a require is visible to the effects.
//!
//! Script arguments reach native functions already evaluated but not
//! resolved; each function picks the view it needs ([`Scope::int`],
//! [`Scope::select`], [`Scope::entity_name`] ...).

use std::collections::BTreeMap;

use tracing::trace;

use super::Engine;
use crate::core::value::is_path;
use crate::core::{Bindings, Captured, Selector, Value};
use crate::error::{EngineError, Result, SelectorKind};
use crate::script::{Binding, CallArgs, Expr, Script};

/// Per-evaluation environment.
pub struct Scope<'e> {
    engine: &'e mut Engine,
    bindings: Bindings,
    storage: BTreeMap<String, Value>,
}

impl<'e> Scope<'e> {
    /// A scope with empty storage.
    pub fn new(engine: &'e mut Engine, bindings: Bindings) -> Self {
        Self {
            engine,
            bindings,
            storage: BTreeMap::new(),
        }
    }

    /// A scope restoring a captured environment.
    pub fn restore(engine: &'e mut Engine, captured: Captured) -> Self {
        Self {
            engine,
            bindings: captured.bindings,
            storage: captured.storage,
        }
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        self.engine
    }

    #[must_use]
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Snapshot of bindings and storage, for delays.
    #[must_use]
    pub fn captured(&self) -> Captured {
        Captured {
            bindings: self.bindings.clone(),
            storage: self.storage.clone(),
        }
    }

    // === Storage ===

    pub fn store(&mut self, name: impl Into<String>, value: Value) {
        self.storage.insert(name.into(), value);
    }

    /// A stored variable, `none` when unset.
    #[must_use]
    pub fn stored(&self, name: &str) -> Value {
        self.storage.get(name).cloned().unwrap_or_default()
    }

    // === Evaluation ===

    /// Evaluate a script's expression.
    pub fn run(&mut self, script: &Script) -> Result<Value> {
        trace!(target: "script", "Running `{}`", script.raw());
        self.eval(script.code())
    }

    /// Evaluate a script as a require.
    pub fn check(&mut self, script: &Script) -> Result<bool> {
        let value = self.run(script)?;
        Ok(self.resolve(value)?.truthy())
    }

    pub fn eval(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(Value::from(literal.clone())),
            Expr::Var(binding) => Ok(self
                .binding(*binding)
                .map_or(Value::None, |name| Value::Ref(name.to_string()))),
            Expr::Ref(name) => Ok(Value::Ref(name.clone())),
            Expr::List(items) => Ok(Value::List(self.eval_all(items)?)),
            Expr::Tuple(items) => Ok(Value::Tuple(self.eval_all(items)?)),
            Expr::Call(call) => {
                let mut args = CallArgs::default();
                for arg in &call.args {
                    let value = self.eval(arg)?;
                    args.positional.push(value);
                }
                args.variadic = self.eval_all(&call.variadic)?;
                for (name, arg) in &call.kwargs {
                    let value = self.eval(arg)?;
                    args.kwargs.push((name.clone(), value));
                }

                let function = self
                    .engine
                    .registry()
                    .function(&call.target)
                    .cloned()
                    .ok_or_else(|| EngineError::UnknownFunction(call.target.clone()))?;
                function(self, args)
            }
        }
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> Result<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr)).collect()
    }

    fn binding(&self, binding: Binding) -> Option<&str> {
        match binding {
            Binding::Caster => self.bindings.caster.as_deref(),
            Binding::Target => self.bindings.target.as_deref(),
            Binding::Move => self.bindings.mover.as_deref(),
        }
    }

    // === Resolution ===

    /// Resolve paths: `(e a b)` is stat `b` of the entity named by stat `a`
    /// of `e`. Lists and tuples resolve element-wise.
    pub fn resolve(&self, value: Value) -> Result<Value> {
        match value {
            Value::Tuple(items) if is_path(&items) => self.follow(items),
            Value::Tuple(items) => items
                .into_iter()
                .map(|item| self.resolve(item))
                .collect::<Result<_>>()
                .map(Value::Tuple),
            Value::List(items) => items
                .into_iter()
                .map(|item| self.resolve(item))
                .collect::<Result<_>>()
                .map(Value::List),
            other => Ok(other),
        }
    }

    fn follow(&self, items: Vec<Value>) -> Result<Value> {
        let mut items = items.into_iter();
        let mut current = items.next().unwrap_or_default();
        for stat in items {
            let entity = current
                .as_name()
                .ok_or_else(|| EngineError::type_error("entity", &current))?;
            let stat = stat
                .as_name()
                .ok_or_else(|| EngineError::type_error("stat name", &stat))?;
            current = self.engine.get_stat(entity, stat)?;
        }
        Ok(current)
    }

    /// Resolve to an integer.
    pub fn int(&self, value: Value) -> Result<i64> {
        self.resolve(value)?.as_int()
    }

    /// Resolve to a boolean.
    pub fn truthy(&self, value: Value) -> Result<bool> {
        Ok(self.resolve(value)?.truthy())
    }

    /// Resolve to a selector.
    pub fn selector(&self, value: Value) -> Result<Selector> {
        Selector::try_from(self.resolve(value)?)
    }

    /// Resolve to entity names.
    pub fn select(&self, value: Value) -> Result<Vec<String>> {
        let selector = self.selector(value)?;
        self.engine.select(&selector)
    }

    /// Resolve to the name of one existing entity.
    pub fn entity_name(&self, value: Value) -> Result<String> {
        let value = self.resolve(value)?;
        let name = value
            .as_name()
            .ok_or_else(|| EngineError::type_error("entity", &value))?;
        if !self.engine.contains(name) {
            return Err(EngineError::undefined(SelectorKind::Entity, name));
        }
        Ok(name.to_string())
    }

    /// Like [`entity_name`](Self::entity_name), but `none`/`false` mean no
    /// entity.
    pub fn optional_entity(&self, value: Value) -> Result<Option<String>> {
        match value {
            Value::None | Value::Bool(false) => Ok(None),
            other => self.entity_name(other).map(Some),
        }
    }

    /// Resolve to text. Names, strings and integers all qualify.
    pub fn text(&self, value: Value) -> Result<String> {
        match self.resolve(value)? {
            Value::Str(s) | Value::Ref(s) => Ok(s),
            Value::Int(n) => Ok(n.to_string()),
            other => Err(EngineError::type_error("string", other)),
        }
    }
}

impl std::fmt::Debug for Scope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("bindings", &self.bindings)
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}
