//! Behaviour tests for condition registration and evaluation.

use camino::Utf8Path;
use instill_common::rules::{Condition, RulesEngine};
use instill_common::variables::Variables;
use instill_common::xml::parse_file;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[derive(Default)]
struct RulesWorld {
    rules: RulesEngine,
    variables: Variables,
}

#[fixture]
fn world() -> RulesWorld {
    let mut world = RulesWorld::default();
    world.variables.set("MODE", "server");
    world
}

#[given("a condition \"{id}\" that is {value}")]
fn given_flag(world: &mut RulesWorld, id: String, value: String) {
    world.variables.set(id.clone(), value);
    world
        .rules
        .add_condition(id.clone(), Condition::variable(id, "true"));
}

#[given("an empty \"{kind}\" condition named \"{id}\"")]
fn given_empty_composite(world: &mut RulesWorld, kind: String, id: String) {
    let condition = match kind.as_str() {
        "and" => Condition::And(Vec::new()),
        "or" => Condition::Or(Vec::new()),
        _ => Condition::Xor(Vec::new()),
    };
    world.rules.add_condition(id, condition);
}

#[given("a \"xor\" condition \"{id}\" over \"{left}\" and \"{right}\"")]
fn given_xor(world: &mut RulesWorld, id: String, left: String, right: String) {
    let condition = Condition::Xor(vec![Condition::reference(left), Condition::reference(right)]);
    world.rules.add_condition(id, condition);
}

#[when("the variable \"{name}\" is set to \"{value}\"")]
fn when_variable_set(world: &mut RulesWorld, name: String, value: String) {
    world.variables.set(name, value);
}

#[when("the conditions in \"{path}\" are loaded")]
fn when_conditions_loaded(world: &mut RulesWorld, path: String) {
    let document = parse_file(Utf8Path::new(&path)).expect("fixture parses");
    world.rules.analyze_xml(&document).expect("conditions load");
}

#[then("the expression \"{expression}\" is true")]
fn then_true(world: &mut RulesWorld, expression: String) {
    assert!(
        world.rules.is_true(&expression, &world.variables),
        "{expression} should hold"
    );
}

#[then("the expression \"{expression}\" is false")]
fn then_false(world: &mut RulesWorld, expression: String) {
    assert!(
        !world.rules.is_true(&expression, &world.variables),
        "{expression} should not hold"
    );
}

#[then("the panel \"{panel}\" is hidden")]
fn then_panel_hidden(world: &mut RulesWorld, panel: String) {
    assert!(!world.rules.can_show_panel(&panel, &world.variables));
}

#[then("the pack \"{pack}\" can be installed")]
fn then_pack_installable(world: &mut RulesWorld, pack: String) {
    assert!(world.rules.can_install_pack(Some(&pack), &world.variables));
}

#[scenario(
    path = "tests/features/rules.feature",
    name = "Double negation preserves the result"
)]
fn scenario_double_negation(world: RulesWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/rules.feature", name = "An empty conjunction holds")]
fn scenario_empty_conjunction(world: RulesWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/rules.feature", name = "An empty disjunction fails")]
fn scenario_empty_disjunction(world: RulesWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rules.feature",
    name = "Exclusive or of two operands is inequality"
)]
fn scenario_xor(world: RulesWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rules.feature",
    name = "Shorthand operators combine referenced conditions"
)]
fn scenario_shorthand(world: RulesWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rules.feature",
    name = "Unknown references are unsatisfied"
)]
fn scenario_unknown_references(world: RulesWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rules.feature",
    name = "Variables change the outcome of registered conditions"
)]
fn scenario_variables_change_outcome(world: RulesWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/rules.feature",
    name = "Conditions and guards are read from a document"
)]
fn scenario_conditions_from_document(world: RulesWorld) {
    let _ = world;
}
