//! The built-in keyword set.
//!
//! | Keyword | Target | Slots |
//! |---------|--------|-------|
//! | `+ - * / %` | `add sub mul div rem` | `-$1 $1` (`-` defaults `-$1` to 0) |
//! | `== != < <= > >=` | `eq ne lt le gt ge` | `-$1 $1` |
//! | `and or` / `not` | `and or` / `not` | `-$1 $1` / `$1` |
//! | `max min` | `max min` | `$1`, variadic |
//! | `if` | `if` | `$1 $2 $3` (`$3` defaults to none) |
//! | `let` / `var` | `assign` / `stored` | `$1 $2` / `$1`, name literal |
//! | `get` | `stat` | `$1 $2`, stat literal |
//! | `entity exists count location at delete` | same | `$1` |
//! | `in` | `contains` | `-$1 $1` |
//! | `time` | `time` | none |
//! | `test` / `perform` | `test_move` / `control_move` | `$1 $2 $3` |
//! | `random` | `random` | `$1 $2` |
//! | `+= -= =` | `stat_add stat_sub stat_set` | `-$2 -$1 $1`, stat literal |
//! | `:=` | `string_set` | `-$2 -$1 $1`, name literal |
//! | `append` / `remove` | `list_add` / `list_remove` | `-$2 -$1 $1`, list literal |
//! | `travel` | `travel` | `-$1 $1` |
//! | `recruit` | `recruit` | `$1`, kwargs `location owner list` |
//! | `delay` | `delay` | `$1 $2` |
//! | `advance` | `control_time` | `$1` (defaults to 1) |
//!
//! Arguments are evaluated left to right before the function runs, so `if`
//! selects a value and `and`/`or` do not short-circuit.

use super::expr::Literal;
use super::keyword::{CallArgs, Keyword, KeywordRegistry, Slot};
use crate::core::selector::coord_from;
use crate::core::{Callback, Item, Selector, Value};
use crate::engine::{Engine, Scope, StatOp};
use crate::error::{EngineError, Result, SelectorKind};
use crate::map::Coord;

const L1: Slot = Slot::before(1);
const L2: Slot = Slot::before(2);
const R1: Slot = Slot::after(1);
const R2: Slot = Slot::after(2);
const R3: Slot = Slot::after(3);
const R4: Slot = Slot::after(4);

/// Register every built-in keyword and native function.
pub fn install(registry: &mut KeywordRegistry) {
    install_keywords(registry);
    install_operators(registry);
    install_queries(registry);
    install_mutators(registry);
    install_control(registry);
}

fn install_keywords(registry: &mut KeywordRegistry) {
    let infix = |name: &str, target: &str| Keyword::new(name, target).args([L1, R1]);
    let unary = |name: &str, target: &str| Keyword::new(name, target).args([R1]);
    let assignment = |name: &str, target: &str| Keyword::new(name, target).args([L2, L1, R1]).literal(L1);

    for (name, target) in [
        ("+", "add"),
        ("*", "mul"),
        ("/", "div"),
        ("%", "rem"),
        ("==", "eq"),
        ("!=", "ne"),
        ("<", "lt"),
        ("<=", "le"),
        (">", "gt"),
        (">=", "ge"),
        ("and", "and"),
        ("or", "or"),
        ("in", "contains"),
        ("travel", "travel"),
    ] {
        registry.register(infix(name, target));
    }
    registry.register(infix("-", "sub").with_default(L1, Literal::Int(0)));

    for name in ["not", "entity", "exists", "count", "location", "at", "delete"] {
        registry.register(unary(name, name));
    }
    registry.register(unary("max", "max").variadic());
    registry.register(unary("min", "min").variadic());
    registry.register(unary("var", "stored").literal(R1));

    registry.register(
        Keyword::new("if", "if")
            .args([R1, R2, R3])
            .with_default(R3, Literal::None),
    );
    registry.register(Keyword::new("let", "assign").args([R1, R2]).literal(R1));
    registry.register(Keyword::new("get", "stat").args([R1, R2]).literal(R2));
    registry.register(Keyword::new("time", "time"));
    registry.register(Keyword::new("test", "test_move").args([R1, R2, R3]));
    registry.register(Keyword::new("perform", "control_move").args([R1, R2, R3]));
    registry.register(Keyword::new("random", "random").args([R1, R2]));
    registry.register(Keyword::new("delay", "delay").args([R1, R2]));
    registry.register(
        Keyword::new("advance", "control_time")
            .args([R1])
            .with_default(R1, Literal::Int(1)),
    );
    registry.register(
        Keyword::new("recruit", "recruit")
            .args([R1])
            .kwarg("location", R2)
            .kwarg("owner", R3)
            .kwarg("list", R4)
            .literal(R4),
    );

    for (name, target) in [
        ("+=", "stat_add"),
        ("-=", "stat_sub"),
        ("=", "stat_set"),
        (":=", "string_set"),
        ("append", "list_add"),
        ("remove", "list_remove"),
    ] {
        registry.register(assignment(name, target));
    }
}

// === Operators ===

fn install_operators(registry: &mut KeywordRegistry) {
    registry.register_function("add", |scope, args| arithmetic(scope, args, i64::checked_add));
    registry.register_function("sub", |scope, args| arithmetic(scope, args, i64::checked_sub));
    registry.register_function("mul", |scope, args| arithmetic(scope, args, i64::checked_mul));
    registry.register_function("div", |scope, mut args| {
        let (a, b) = ints(scope, &mut args)?;
        if b == 0 {
            return Err(EngineError::Arithmetic("division by zero"));
        }
        a.checked_div(b)
            .map(Value::Int)
            .ok_or(EngineError::Arithmetic("integer overflow"))
    });
    registry.register_function("rem", |scope, mut args| {
        let (a, b) = ints(scope, &mut args)?;
        if b == 0 {
            return Err(EngineError::Arithmetic("division by zero"));
        }
        a.checked_rem(b)
            .map(Value::Int)
            .ok_or(EngineError::Arithmetic("integer overflow"))
    });

    registry.register_function("eq", |scope, mut args| {
        let a = scope.resolve(args.take(0))?;
        let b = scope.resolve(args.take(1))?;
        Ok(Value::Bool(a.same(&b)))
    });
    registry.register_function("ne", |scope, mut args| {
        let a = scope.resolve(args.take(0))?;
        let b = scope.resolve(args.take(1))?;
        Ok(Value::Bool(!a.same(&b)))
    });
    registry.register_function("lt", |scope, args| compare(scope, args, |a, b| a < b));
    registry.register_function("le", |scope, args| compare(scope, args, |a, b| a <= b));
    registry.register_function("gt", |scope, args| compare(scope, args, |a, b| a > b));
    registry.register_function("ge", |scope, args| compare(scope, args, |a, b| a >= b));

    // Both operands are already evaluated, side effects included.
    registry.register_function("and", |scope, mut args| {
        let a = scope.truthy(args.take(0))?;
        let b = scope.truthy(args.take(1))?;
        Ok(Value::Bool(a && b))
    });
    // Same as `and`: no short-circuit.
    registry.register_function("or", |scope, mut args| {
        let a = scope.truthy(args.take(0))?;
        let b = scope.truthy(args.take(1))?;
        Ok(Value::Bool(a || b))
    });
    registry.register_function("not", |scope, mut args| {
        Ok(Value::Bool(!scope.truthy(args.take(0))?))
    });

    registry.register_function("max", |scope, args| extremum(scope, args, true));
    registry.register_function("min", |scope, args| extremum(scope, args, false));

    // Picks a value. Both branches have already run.
    registry.register_function("if", |scope, mut args| {
        let branch = if scope.truthy(args.take(0))? { 1 } else { 2 };
        Ok(args.take(branch))
    });
    registry.register_function("assign", |scope, mut args| {
        let name = scope.text(args.take(0))?;
        let value = scope.resolve(args.take(1))?;
        scope.store(name, value);
        Ok(Value::Bool(true))
    });
    registry.register_function("stored", |scope, mut args| {
        let name = scope.text(args.take(0))?;
        Ok(scope.stored(&name))
    });
}

fn ints(scope: &Scope<'_>, args: &mut CallArgs) -> Result<(i64, i64)> {
    Ok((scope.int(args.take(0))?, scope.int(args.take(1))?))
}

fn arithmetic(scope: &mut Scope<'_>, mut args: CallArgs, op: fn(i64, i64) -> Option<i64>) -> Result<Value> {
    let (a, b) = ints(scope, &mut args)?;
    op(a, b)
        .map(Value::Int)
        .ok_or(EngineError::Arithmetic("integer overflow"))
}

fn compare(scope: &mut Scope<'_>, mut args: CallArgs, op: fn(i64, i64) -> bool) -> Result<Value> {
    let (a, b) = ints(scope, &mut args)?;
    Ok(Value::Bool(op(a, b)))
}

fn extremum(scope: &mut Scope<'_>, mut args: CallArgs, largest: bool) -> Result<Value> {
    let values = args
        .take_all()
        .into_iter()
        .map(|value| scope.int(value))
        .collect::<Result<Vec<_>>>()?;
    let pick = if largest {
        values.into_iter().max()
    } else {
        values.into_iter().min()
    };
    Ok(pick.map_or(Value::None, Value::Int))
}

// === Queries ===

fn install_queries(registry: &mut KeywordRegistry) {
    registry.register_function("stat", |scope, mut args| {
        let entity = scope.entity_name(args.take(0))?;
        let name = scope.text(args.take(1))?;
        scope.engine().get_stat(&entity, &name)
    });
    registry.register_function("entity", |scope, mut args| {
        scope.entity_name(args.take(0)).map(Value::Ref)
    });
    registry.register_function("exists", |scope, mut args| {
        let value = scope.resolve(args.take(0))?;
        Ok(Value::Bool(
            value.as_name().is_some_and(|name| scope.engine().contains(name)),
        ))
    });
    registry.register_function("contains", |scope, mut args| {
        let needle = scope.resolve(args.take(0))?;
        match scope.resolve(args.take(1))? {
            Value::List(items) | Value::Tuple(items) => {
                Ok(Value::Bool(items.iter().any(|item| item.same(&needle))))
            }
            other => Err(EngineError::type_error("list", other)),
        }
    });
    registry.register_function("count", |scope, mut args| {
        let count = match scope.resolve(args.take(0))? {
            Value::List(items) => items.len(),
            Value::None => 0,
            other => scope.select(other)?.len(),
        };
        Ok(Value::Int(i64::try_from(count).unwrap_or(i64::MAX)))
    });
    registry.register_function("time", |scope, _| Ok(Value::Int(scope.engine().time())));
    registry.register_function("location", |scope, mut args| {
        let entity = scope.entity_name(args.take(0))?;
        let location = scope.engine().get_entity(&entity)?.location();
        Ok(location.map_or(Value::None, |c| {
            Value::Tuple(vec![Value::Int(c.x), Value::Int(c.y), Value::Int(c.z)])
        }))
    });
    registry.register_function("at", |scope, mut args| {
        let coord = location(scope, args.take(0))?
            .ok_or_else(|| EngineError::type_error("location", Value::None))?;
        let names = scope.engine().select(&Selector::At(coord))?;
        Ok(Value::List(names.into_iter().map(Value::Ref).collect()))
    });
    registry.register_function("test_move", |scope, mut args| {
        let caster = scope.entity_name(args.take(0))?;
        let target = scope.entity_name(args.take(1))?;
        let mover = scope.entity_name(args.take(2))?;
        let check = scope.engine_mut().test_move(&caster, &target, &mover)?;
        Ok(Value::Bool(check.passed()))
    });
    registry.register_function("random", |scope, mut args| {
        let (lo, hi) = ints(scope, &mut args)?;
        scope.engine_mut().random(lo, hi).map(Value::Int)
    });
}

/// A location argument: `none`/`false` for no location, else a coordinate.
fn location(scope: &Scope<'_>, value: Value) -> Result<Option<Coord>> {
    match scope.resolve(value)? {
        Value::None | Value::Bool(false) => Ok(None),
        Value::Tuple(items) | Value::List(items) => coord_from(&items)
            .map(Some)
            .ok_or_else(|| EngineError::type_error("location", Value::Tuple(items))),
        other => Err(EngineError::type_error("location", other)),
    }
}

// === Mutators ===

fn install_mutators(registry: &mut KeywordRegistry) {
    registry.register_function("stat_add", |scope, args| {
        stat_op(scope, args, StatOp::Add)
    });
    registry.register_function("stat_sub", |scope, args| {
        stat_op(scope, args, StatOp::Sub)
    });
    registry.register_function("stat_set", |scope, args| {
        stat_op(scope, args, StatOp::Set)
    });
    registry.register_function("string_set", |scope, mut args| {
        let names = scope.select(args.take(0))?;
        let category = scope.text(args.take(1))?;
        let value = scope.text(args.take(2))?;
        each(scope, names, |engine, name| {
            engine.control_string(name, &category, value.clone())
        })
    });
    registry.register_function("list_add", |scope, mut args| {
        let names = scope.select(args.take(0))?;
        let list = scope.text(args.take(1))?;
        let item = Item::try_from(scope.resolve(args.take(2))?)?;
        each(scope, names, |engine, name| {
            engine.control_list_add(name, &list, item.clone())
        })
    });
    registry.register_function("list_remove", |scope, mut args| {
        let names = scope.select(args.take(0))?;
        let list = scope.text(args.take(1))?;
        let item = Item::try_from(scope.resolve(args.take(2))?)?;
        each(scope, names, |engine, name| {
            engine.control_list_remove(name, &list, item.clone())
        })
    });
    registry.register_function("travel", |scope, mut args| {
        let names = scope.select(args.take(0))?;
        let destination = location(scope, args.take(1))?;
        each(scope, names, |engine, name| engine.control_travel(name, destination))
    });
    registry.register_function("delete", |scope, mut args| {
        let names = scope.select(args.take(0))?;
        each(scope, names, |engine, name| engine.control_delete(name))
    });
    registry.register_function("recruit", |scope, mut args| {
        let template = scope.entity_name(args.take(0))?;
        let at = location(scope, args.kwarg("location"))?;
        let owner = scope.optional_entity(args.kwarg("owner"))?;
        let list = match args.kwarg("list") {
            Value::None => None,
            other => Some(scope.text(other)?),
        };
        let recruited =
            scope
                .engine_mut()
                .control_recruit(&template, at, owner.as_deref(), list.as_deref())?;
        Ok(recruited.map_or(Value::None, Value::Ref))
    });
}

fn stat_op(scope: &mut Scope<'_>, mut args: CallArgs, op: fn(i64) -> StatOp) -> Result<Value> {
    let names = scope.select(args.take(0))?;
    let stat = scope.text(args.take(1))?;
    let amount = scope.int(args.take(2))?;
    each(scope, names, |engine, name| engine.control_stat(name, &stat, op(amount)))
}

/// Apply a mutator to every selected entity; true if any changed.
fn each<F>(scope: &mut Scope<'_>, names: Vec<String>, mut apply: F) -> Result<Value>
where
    F: FnMut(&mut Engine, &str) -> Result<bool>,
{
    let mut changed = false;
    for name in &names {
        changed |= apply(scope.engine_mut(), name)?;
    }
    Ok(Value::Bool(changed))
}

// === Control ===

fn install_control(registry: &mut KeywordRegistry) {
    registry.register_function("control_move", |scope, mut args| {
        let casters = scope.selector(args.take(0))?;
        let targets = scope.selector(args.take(1))?;
        let moves = scope.selector(args.take(2))?;
        scope
            .engine_mut()
            .control_move(&casters, &targets, &moves)
            .map(Value::Bool)
    });
    registry.register_function("delay", |scope, mut args| {
        let ticks = scope.int(args.take(0))?;
        let callback = match scope.resolve(args.take(1))? {
            Value::Str(source) => Callback::Script(scope.engine_mut().compile(&source)?),
            Value::Script(script) => Callback::Script(script),
            Value::Ref(name) => {
                if !scope.engine().contains(&name) {
                    return Err(EngineError::undefined(SelectorKind::Entity, name));
                }
                Callback::Entity(name)
            }
            other => return Err(EngineError::type_error("callback", other)),
        };
        let captured = scope.captured();
        scope.engine_mut().control_delay(callback, ticks, captured);
        Ok(Value::Bool(true))
    });
    registry.register_function("control_time", |scope, mut args| {
        let steps = scope.int(args.take(0))?;
        scope.engine_mut().control_time(steps)?;
        Ok(Value::Bool(true))
    });
}

#[cfg(test)]
mod tests {
    use crate::core::{Bindings, Catalog, EngineConfig, Entity, Value};
    use crate::engine::Engine;
    use crate::error::EngineError;
    use crate::map::{Bounds, Coord};

    fn engine() -> Engine {
        let catalog = Catalog::new()
            .with_stat("HP")
            .with_list("units")
            .with_list("tags")
            .with_string("title");
        let config = EngineConfig::new()
            .with_catalog(catalog)
            .with_bounds(Bounds::grid(8, 8))
            .with_seed(7);
        let mut engine = Engine::with_config(config).unwrap();
        engine.insert(Entity::new("hero").with_stat("HP", 10)).unwrap();
        engine.insert(Entity::new("orc").with_stat("HP", 4)).unwrap();
        engine
    }

    fn eval(engine: &mut Engine, source: &str) -> Value {
        engine
            .evaluate(source, Bindings::of("hero", "orc", "hero"))
            .unwrap()
    }

    #[test]
    fn test_arithmetic() {
        let mut engine = engine();
        assert_eq!(eval(&mut engine, "(1 + 2) * 3"), Value::Int(9));
        assert_eq!(eval(&mut engine, "7 / 2"), Value::Int(3));
        assert_eq!(eval(&mut engine, "7 % 3"), Value::Int(1));
        assert_eq!(eval(&mut engine, "-4"), Value::Int(-4));
        assert_eq!(eval(&mut engine, "target.HP - 1"), Value::Int(3));
        assert_eq!(eval(&mut engine, "max 3 9 (2 + 8)"), Value::Int(10));
        assert_eq!(eval(&mut engine, "min 3 9 2"), Value::Int(2));
        assert_eq!(
            engine.evaluate("1 / 0", Bindings::new()),
            Err(EngineError::Arithmetic("division by zero"))
        );
    }

    #[test]
    fn test_comparison_and_logic() {
        let mut engine = engine();
        assert_eq!(eval(&mut engine, "caster.HP > target.HP"), Value::Bool(true));
        assert_eq!(eval(&mut engine, "(1 < 2) and (2 <= 1)"), Value::Bool(false));
        assert_eq!(eval(&mut engine, "(1 < 2) or (2 <= 1)"), Value::Bool(true));
        assert_eq!(eval(&mut engine, "not (1 == 1)"), Value::Bool(false));
        assert_eq!(eval(&mut engine, "caster == hero"), Value::Bool(true));
        assert_eq!(eval(&mut engine, "caster != orc"), Value::Bool(true));
    }

    #[test]
    fn test_if_and_storage() {
        let mut engine = engine();
        assert_eq!(eval(&mut engine, "if (1 > 2) 5 6"), Value::Int(6));
        assert_eq!(eval(&mut engine, "if false 5"), Value::None);
        assert_eq!(eval(&mut engine, "if (let x 3) (var x) 0"), Value::Int(3));
        assert_eq!(eval(&mut engine, "var unset"), Value::None);
    }

    #[test]
    fn test_branches_run_eagerly() {
        let mut engine = engine();
        eval(&mut engine, "if true (orc HP -= 1) (hero HP -= 1)");
        assert_eq!(engine.stat_total("orc", "HP"), Ok(3));
        assert_eq!(engine.stat_total("hero", "HP"), Ok(9));

        assert_eq!(eval(&mut engine, "false and (orc HP -= 1)"), Value::Bool(false));
        assert_eq!(eval(&mut engine, "true or (orc HP -= 1)"), Value::Bool(true));
        assert_eq!(engine.stat_total("orc", "HP"), Ok(1));
    }

    #[test]
    fn test_queries() {
        let mut engine = engine();
        assert_eq!(eval(&mut engine, "get orc HP"), Value::Int(4));
        assert_eq!(eval(&mut engine, "exists orc"), Value::Bool(true));
        assert_eq!(eval(&mut engine, "exists ghost"), Value::Bool(false));
        assert_eq!(eval(&mut engine, "orc in [hero orc]"), Value::Bool(true));
        assert_eq!(eval(&mut engine, "count [hero orc]"), Value::Int(2));
        assert_eq!(eval(&mut engine, "time"), Value::Int(0));
        assert_eq!(eval(&mut engine, "location hero"), Value::None);
        assert!(engine.evaluate("entity ghost", Bindings::new()).is_err());
    }

    #[test]
    fn test_mutators() {
        let mut engine = engine();
        assert_eq!(eval(&mut engine, "target HP -= 3"), Value::Bool(true));
        assert_eq!(eval(&mut engine, "[hero orc] HP += 1"), Value::Bool(true));
        assert_eq!(engine.stat_total("orc", "HP"), Ok(2));
        assert_eq!(engine.stat_total("hero", "HP"), Ok(11));

        eval(&mut engine, "hero title := Sir");
        assert_eq!(engine.inherited_string("hero", "title"), Ok("Sir".into()));

        eval(&mut engine, "hero tags append brave");
        assert_eq!(eval(&mut engine, "brave in hero.tags"), Value::Bool(true));
        eval(&mut engine, "hero tags remove brave");
        assert_eq!(eval(&mut engine, "brave in hero.tags"), Value::Bool(false));
    }

    #[test]
    fn test_travel_and_at() {
        let mut engine = engine();
        eval(&mut engine, "hero travel (2 3)");
        assert_eq!(
            engine.get_entity("hero").unwrap().location(),
            Some(Coord::flat(2, 3))
        );
        assert_eq!(
            eval(&mut engine, "location hero"),
            Value::Tuple(vec![Value::Int(2), Value::Int(3), Value::Int(0)])
        );
        assert_eq!(
            eval(&mut engine, "at (2 3)"),
            Value::List(vec![Value::Ref("hero".into())])
        );
        assert_eq!(eval(&mut engine, "count (2 3)"), Value::Int(1));
    }

    #[test]
    fn test_recruit_and_delete() {
        let mut engine = engine();
        let name = eval(&mut engine, "recruit orc (1 1) caster");
        assert_eq!(name, Value::Ref("orc_1".into()));
        assert_eq!(eval(&mut engine, "orc_1 in hero.units"), Value::Bool(true));

        assert_eq!(eval(&mut engine, "delete orc_1"), Value::Bool(true));
        assert!(!engine.contains("orc_1"));
    }

    #[test]
    fn test_random_is_seeded() {
        let mut a = engine();
        let mut b = engine();
        for _ in 0..5 {
            let roll = eval(&mut a, "random 1 6");
            assert_eq!(roll, eval(&mut b, "random 1 6"));
            let n = roll.as_int().unwrap();
            assert!((1..=6).contains(&n));
        }
    }

    #[test]
    fn test_delay_and_advance() {
        let mut engine = engine();
        eval(&mut engine, "delay 2 {target HP += 10}");
        assert_eq!(engine.pending_delays(), 1);

        eval(&mut engine, "advance");
        assert_eq!(engine.stat_total("orc", "HP"), Ok(4));
        eval(&mut engine, "advance 1");
        assert_eq!(engine.stat_total("orc", "HP"), Ok(14));
        assert_eq!(engine.time(), 2);
    }
}
