//! Move execution integration tests.
//!
//! These tests verify require checks, effect execution, selector cross
//! products, the action log and immutability.

use rust_tbs::{
    Bindings, Catalog, Coord, Engine, EngineConfig, EntityDef, Item, MoveCheck, Selector, StatOp,
    Value,
};

fn engine() -> Engine {
    let catalog = Catalog::new()
        .with_stat("HP")
        .with_list("units")
        .with_string("title");
    let mut engine = Engine::with_config(EngineConfig::new().with_catalog(catalog)).unwrap();
    let defs: Vec<EntityDef> = serde_json::from_str(
        r#"[
            {"name": "knight", "stats": {"HP": 5}},
            {"name": "orc", "stats": {"HP": 3}},
            {"name": "goblin", "stats": {"HP": 1}},
            {
                "name": "strike",
                "require": ["target.HP > 0"],
                "effect": ["target HP -= 1"]
            }
        ]"#,
    )
    .unwrap();
    engine.load_all(defs).unwrap();
    engine
}

fn hp(engine: &Engine, name: &str) -> i64 {
    engine.stat_total(name, "HP").unwrap()
}

// =============================================================================
// Requires and Effects
// =============================================================================

/// Test the basic move: require passes, effect runs.
#[test]
fn test_move_execution() {
    let mut engine = engine();
    let done = engine
        .control_move(&"knight".into(), &"orc".into(), &"strike".into())
        .unwrap();

    assert!(done);
    assert_eq!(hp(&engine, "orc"), 2);
    assert_eq!(engine.log().len(), 1);
    assert_eq!(engine.log()[0].to_string(), "[t=0] knight -> orc (strike)");
}

/// Test that a failing require is reported, not raised.
#[test]
fn test_failed_require_reports_cause() {
    let mut engine = engine();
    engine.control_stat("orc", "HP", StatOp::Set(0)).unwrap();

    let check = engine.test_move("knight", "orc", "strike").unwrap();
    assert!(!check.passed());
    assert_eq!(check.cause().map(|script| script.raw()), Some("target.HP > 0"));
    assert_eq!(
        engine.test_move("knight", "knight", "strike").unwrap(),
        MoveCheck::Passed
    );

    let done = engine
        .control_move(&"knight".into(), &"orc".into(), &"strike".into())
        .unwrap();
    assert!(!done);
    assert!(engine.log().is_empty());
}

/// Test that every caster/target combination runs.
#[test]
fn test_cross_product() {
    let mut engine = engine();
    let casters = Selector::many(["knight", "goblin"]);
    let targets = Selector::many(["orc", "knight"]);

    engine
        .control_move(&casters, &targets, &"strike".into())
        .unwrap();

    assert_eq!(hp(&engine, "orc"), 1);
    assert_eq!(hp(&engine, "knight"), 3);
    assert_eq!(engine.log().len(), 4);
}

/// Test that requires and effects of one combination share storage.
#[test]
fn test_storage_shared_with_effects() {
    let mut engine = engine();
    let mut def = EntityDef::new("smash");
    def.require.push("let dmg (caster.HP - 2)".into());
    def.effect.push("target HP -= (var dmg)".into());
    engine.load(def).unwrap();

    engine
        .control_move(&"knight".into(), &"orc".into(), &"smash".into())
        .unwrap();
    assert_eq!(hp(&engine, "orc"), 0);
}

/// Test that moves inherit requires and effects through groups.
#[test]
fn test_inherited_effects() {
    let mut engine = engine();
    let mut def = EntityDef::new("double_strike");
    def.group.push("strike".into());
    def.effect.push("target HP -= 1".into());
    engine.load(def).unwrap();

    engine
        .control_move(&"knight".into(), &"orc".into(), &"double_strike".into())
        .unwrap();
    assert_eq!(hp(&engine, "orc"), 1);
}

/// Test that scripts can perform other moves.
#[test]
fn test_nested_perform() {
    let mut engine = engine();
    let mut def = EntityDef::new("command");
    def.effect.push("perform target [orc goblin] strike".into());
    engine.load(def).unwrap();

    engine
        .control_move(&"knight".into(), &"knight".into(), &"command".into())
        .unwrap();
    assert_eq!(hp(&engine, "orc"), 2);
    assert_eq!(hp(&engine, "goblin"), 0);
    assert_eq!(engine.log().len(), 3);
}

/// Test that moves can target everything at a location.
#[test]
fn test_location_selector() {
    let mut engine = engine();
    engine.control_travel("orc", Some(Coord::flat(1, 0))).unwrap();
    engine.control_travel("goblin", Some(Coord::flat(1, 0))).unwrap();

    engine
        .control_move(&"knight".into(), &Coord::flat(1, 0).into(), &"strike".into())
        .unwrap();
    assert_eq!(hp(&engine, "orc"), 2);
    assert_eq!(hp(&engine, "goblin"), 0);
}

// =============================================================================
// Immutability
// =============================================================================

/// Test that immutable entities reject every mutation and stay unchanged.
#[test]
fn test_immutable_entity_unchanged() {
    let mut engine = engine();
    let def: EntityDef = serde_json::from_str(
        r#"{"name": "statue", "immutable": true, "stats": {"HP": 9}, "lists": {"units": ["x"]}}"#,
    )
    .unwrap();
    engine.load(def).unwrap();

    assert_eq!(engine.control_stat("statue", "HP", StatOp::Sub(1)), Ok(false));
    assert_eq!(engine.control_list_remove("statue", "units", "x"), Ok(false));
    assert_eq!(engine.control_string("statue", "title", "Gone"), Ok(false));
    assert_eq!(engine.control_delete("statue"), Ok(false));

    let done = engine
        .control_move(&"knight".into(), &"statue".into(), &"strike".into())
        .unwrap();
    assert!(done);

    let statue = engine.get_entity("statue").unwrap();
    assert_eq!(statue.stat("HP"), Some(9));
    assert_eq!(statue.list("units"), &[Item::from("x")]);
}

// =============================================================================
// Recruiting
// =============================================================================

/// Test recruiting from a script into the caster's units.
#[test]
fn test_recruit_from_script() {
    let mut engine = engine();
    let bindings = Bindings::new().with_caster("knight");

    let first = engine
        .evaluate("recruit goblin (2 2) caster", bindings.clone())
        .unwrap();
    let second = engine.evaluate("recruit goblin none caster", bindings).unwrap();

    assert_eq!(first, Value::Ref("goblin_1".into()));
    assert_eq!(second, Value::Ref("goblin_2".into()));
    assert_eq!(
        engine.get_entity("knight").unwrap().list("units"),
        &[Item::from("goblin_1"), Item::from("goblin_2")]
    );
    assert_eq!(hp(&engine, "goblin_1"), 1);
    assert_eq!(
        engine.select(&Coord::flat(2, 2).into()).unwrap(),
        vec!["goblin_1".to_string()]
    );
}
