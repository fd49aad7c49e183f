//! Stat resolution integration tests.
//!
//! These tests verify inherited stats, lists and strings through groups and
//! inheriting lists, with entities loaded from JSON definitions.

use rust_tbs::{
    Bindings, Catalog, Engine, EngineConfig, EngineError, EntityDef, Item, SelectorKind, Value,
};

fn engine() -> Engine {
    let catalog = Catalog::new()
        .with_stat("attack")
        .with_list("tags")
        .with_rlist("gear")
        .with_string("title");
    Engine::with_config(EngineConfig::new().with_catalog(catalog)).unwrap()
}

fn load(engine: &mut Engine, json: &str) {
    let defs: Vec<EntityDef> = serde_json::from_str(json).unwrap();
    engine.load_all(defs).unwrap();
}

// =============================================================================
// Numeric Stats
// =============================================================================

/// Test that group stats add up rather than override.
#[test]
fn test_group_stats_are_cumulative() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[
            {"name": "infantry", "stats": {"attack": 2}},
            {"name": "veteran", "stats": {"attack": 3}},
            {"name": "soldier", "stats": {"attack": 0}, "group": ["infantry"]},
            {"name": "sergeant", "stats": {"attack": 0}, "group": ["infantry", "veteran"]}
        ]"#,
    );

    assert_eq!(engine.get_stat("soldier", "attack"), Ok(Value::Int(2)));
    assert_eq!(engine.get_stat("sergeant", "attack"), Ok(Value::Int(5)));
}

/// Test that scripts see inherited values through paths.
#[test]
fn test_path_resolution_in_scripts() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[
            {"name": "sword", "stats": {"attack": 4}},
            {"name": "hero", "stats": {"attack": 1}, "lists": {"gear": ["sword"]}}
        ]"#,
    );

    let bindings = Bindings::new().with_caster("hero");
    assert_eq!(engine.evaluate("caster.attack + 0", bindings.clone()), Ok(Value::Int(5)));
    assert_eq!(engine.evaluate("get caster attack", bindings), Ok(Value::Int(5)));
}

// =============================================================================
// Lists and Strings
// =============================================================================

/// Test that own entries come first, then groups, then inheriting lists.
#[test]
fn test_list_aggregation_order() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[
            {"name": "base", "lists": {"tags": ["from-group"]}},
            {"name": "ring", "lists": {"tags": ["from-gear"]}},
            {"name": "hero", "group": ["base"], "lists": {"tags": ["own"], "gear": ["ring"]}}
        ]"#,
    );

    assert_eq!(
        engine.inherited_list("hero", "tags"),
        Ok(vec![
            Item::from("own"),
            Item::from("from-group"),
            Item::from("from-gear"),
        ])
    );
}

/// Test that the first non-empty string wins and a miss is empty.
#[test]
fn test_string_resolution() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[
            {"name": "noble", "strings": {"title": "Lord"}},
            {"name": "knight", "strings": {"title": "Sir"}},
            {"name": "heir", "strings": {"title": ""}, "group": ["noble", "knight"]},
            {"name": "peasant"}
        ]"#,
    );

    assert_eq!(engine.get_stat("heir", "title"), Ok(Value::Str("Lord".into())));
    assert_eq!(engine.get_stat("peasant", "title"), Ok(Value::Str(String::new())));
}

/// Test that an entity cannot take itself out of its own group.
#[test]
fn test_group_keeps_self() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[
            {"name": "infantry", "stats": {"attack": 3}},
            {"name": "orc", "stats": {"attack": 2}, "group": ["infantry"]}
        ]"#,
    );

    assert_eq!(
        engine.evaluate("orc group remove orc", Bindings::new()),
        Ok(Value::Bool(false))
    );
    let group: Vec<&str> = engine
        .get_entity("orc")
        .unwrap()
        .group()
        .iter()
        .filter_map(Item::as_name)
        .collect();
    assert!(group.contains(&"orc"));
    assert_eq!(engine.get_stat("orc", "attack"), Ok(Value::Int(5)));

    assert_eq!(
        engine.evaluate("orc group remove infantry", Bindings::new()),
        Ok(Value::Bool(true))
    );
    assert_eq!(engine.get_stat("orc", "attack"), Ok(Value::Int(2)));
}

// =============================================================================
// Errors
// =============================================================================

/// Test that undeclared stats and missing group members are typed errors.
#[test]
fn test_undefined_selectors() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[{"name": "orphan", "group": ["ghost"]}]"#,
    );

    let err = engine.get_stat("orphan", "mana").unwrap_err();
    assert_eq!(err.selector_kind(), Some(SelectorKind::Stat));

    let err = engine.get_stat("orphan", "attack").unwrap_err();
    assert_eq!(
        err,
        EngineError::Undefined {
            kind: SelectorKind::Entity,
            name: "ghost".into()
        }
    );
}

/// Test that a group cycle is an error instead of unbounded recursion.
#[test]
fn test_group_cycle_is_error() {
    let mut engine = engine();
    load(
        &mut engine,
        r#"[
            {"name": "a", "group": ["b"]},
            {"name": "b", "group": ["c"]},
            {"name": "c", "group": ["a"]}
        ]"#,
    );

    assert!(matches!(
        engine.get_stat("a", "attack"),
        Err(EngineError::GroupCycle { ref path }) if path.len() == 4
    ));
}

/// Test that an undeclared category in a definition is rejected.
#[test]
fn test_load_rejects_undeclared_category() {
    let mut engine = engine();
    let defs: Vec<EntityDef> =
        serde_json::from_str(r#"[{"name": "odd", "stats": {"luck": 1}}]"#).unwrap();
    assert!(matches!(engine.load_all(defs), Err(EngineError::Config(_))));
    assert!(!engine.contains("odd"));
}
