//! Inherited stat resolution.
//!
//! ## Traversal
//!
//! `get_stat(e, name)` visits, depth-first:
//! 1. `e` itself
//! 2. each group of `e` (except `e`'s own entry), recursively
//! 3. each entity named in each inheriting list (rlist) of `e`, recursively
//!
//! and combines the visited values by category:
//!
//! | Category | Result |
//! |----------|--------|
//! | stat     | sum |
//! | list     | concatenation, in visit order |
//! | string   | first non-empty value, else `""` |
//!
//! `group` itself is not inherited: it returns the entity's own list.
//!
//! Cycles are detected on the current path, so diamond-shaped inheritance is
//! legal (a shared ancestor contributes once per path) while `a -> b -> a`
//! is an error.

use std::ops::ControlFlow;
use std::sync::Arc;

use super::Engine;
use crate::core::{Category, Entity, Item, Value, GROUP};
use crate::error::{EngineError, Result, SelectorKind};
use crate::script::Script;

impl Engine {
    /// Resolve `name` on `entity`, aggregating over groups and rlists.
    pub fn get_stat(&self, entity: &str, name: &str) -> Result<Value> {
        if name == GROUP {
            let items = self.get_entity(entity)?.group().iter().cloned();
            return Ok(Value::List(items.map(Value::from).collect()));
        }

        match self.schema.kind(name) {
            Some(Category::Stat) => self.stat_total(entity, name).map(Value::Int),
            Some(Category::List { .. }) => Ok(Value::List(
                self.inherited_list(entity, name)?
                    .into_iter()
                    .map(Value::from)
                    .collect(),
            )),
            Some(Category::String) => self.inherited_string(entity, name).map(Value::Str),
            None => Err(EngineError::undefined(SelectorKind::Stat, name)),
        }
    }

    /// Summed numeric stat.
    pub fn stat_total(&self, entity: &str, name: &str) -> Result<i64> {
        let mut total = 0i64;
        self.walk(entity, &mut Vec::new(), &mut |visited| {
            if let Some(value) = visited.stat(name) {
                total = total
                    .checked_add(value)
                    .ok_or(EngineError::Arithmetic("integer overflow"))?;
            }
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(total)
    }

    /// Concatenated list entries in traversal order.
    pub fn inherited_list(&self, entity: &str, name: &str) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        self.walk(entity, &mut Vec::new(), &mut |visited| {
            items.extend(visited.list(name).iter().cloned());
            Ok(ControlFlow::Continue(()))
        })?;
        Ok(items)
    }

    /// First non-empty string value in traversal order.
    pub fn inherited_string(&self, entity: &str, name: &str) -> Result<String> {
        let mut found = String::new();
        self.walk(entity, &mut Vec::new(), &mut |visited| {
            match visited.string(name).filter(|s| !s.is_empty()) {
                Some(value) => {
                    found = value.to_string();
                    Ok(ControlFlow::Break(()))
                }
                None => Ok(ControlFlow::Continue(())),
            }
        })?;
        Ok(found)
    }

    /// Inherited scripts of a `require`/`effect` style list.
    pub(crate) fn inherited_scripts(&self, entity: &str, list: &str) -> Result<Vec<Arc<Script>>> {
        Ok(self
            .inherited_list(entity, list)?
            .iter()
            .filter_map(Item::as_script)
            .cloned()
            .collect())
    }

    fn walk<F>(&self, name: &str, path: &mut Vec<String>, visit: &mut F) -> Result<ControlFlow<()>>
    where
        F: FnMut(&Entity) -> Result<ControlFlow<()>>,
    {
        if path.iter().any(|ancestor| ancestor == name) {
            let mut cycle = path.clone();
            cycle.push(name.to_string());
            return Err(EngineError::GroupCycle { path: cycle });
        }
        let entity = self.get_entity(name)?;
        if visit(entity)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }

        path.push(name.to_string());
        let groups = entity
            .group()
            .iter()
            .filter_map(Item::as_name)
            .filter(|group| *group != name);
        let inherited = self
            .schema
            .rlists()
            .iter()
            .flat_map(|rlist| entity.list(rlist).iter().filter_map(Item::as_name));

        for next in groups.chain(inherited) {
            if self.walk(next, path, visit)?.is_break() {
                path.pop();
                return Ok(ControlFlow::Break(()));
            }
        }
        path.pop();
        Ok(ControlFlow::Continue(()))
    }
}
