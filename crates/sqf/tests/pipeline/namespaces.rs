//! Namespaces: persistence, case-insensitivity, the variable operators.

use super::{eval, runtime};
use sqf_vm::Value;

#[test]
fn globals_land_in_the_mission_namespace() {
    let (mut runtime, _) = runtime();
    runtime.eval("score = 7;").unwrap();
    assert_eq!(
        runtime.vm().mission_namespace().borrow().get("score"),
        Some(Value::Scalar(7.0))
    );
}

#[test]
fn locals_never_land_in_a_namespace() {
    let (mut runtime, _) = runtime();
    let values = runtime.eval("_x = 4; _x + 1;").unwrap();
    assert_eq!(values, [Value::Scalar(5.0)]);
    assert!(!runtime.vm().mission_namespace().borrow().contains("_x"));
    assert!(!runtime.vm().ui_namespace().borrow().contains("_x"));
}

#[test]
fn globals_persist_across_scripts() {
    let (mut runtime, _) = runtime();
    runtime.eval("counter = 1;").unwrap();
    let values = runtime.eval("counter + 1;").unwrap();
    assert_eq!(values, [Value::Scalar(2.0)]);
}

#[test]
fn locals_do_not_persist_across_scripts() {
    let (mut runtime, _) = runtime();
    runtime.eval("_local = 1;").unwrap();
    let values = runtime.eval("isNil \"_local\";").unwrap();
    assert_eq!(values, [Value::Boolean(true)]);
}

#[test]
fn resolution_is_case_insensitive() {
    let (mut runtime, _) = runtime();
    runtime.eval("MyGlobal = 5;").unwrap();
    let values = runtime.eval("MYGLOBAL + myglobal;").unwrap();
    assert_eq!(values, [Value::Scalar(10.0)]);
}

#[test]
fn set_and_get_variable() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval("missionNamespace setVariable [\"depot\", 3]; missionNamespace getVariable \"depot\";")
        .unwrap();
    assert_eq!(values, [Value::Scalar(3.0)]);
}

#[test]
fn get_variable_with_default() {
    let values = eval("missionNamespace getVariable [\"absent\", 9];");
    assert_eq!(values, [Value::Scalar(9.0)]);
}

#[test]
fn namespaces_are_distinct() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval(
            "uiNamespace setVariable [\"shared\", 1]; \
             profileNamespace getVariable [\"shared\", 0];",
        )
        .unwrap();
    assert_eq!(values, [Value::Scalar(0.0)]);
    assert_eq!(
        runtime.vm().ui_namespace().borrow().get("shared"),
        Some(Value::Scalar(1.0))
    );
}

#[test]
fn set_variable_is_case_insensitive() {
    let values = eval(
        "missionNamespace setVariable [\"Depot\", 2]; missionNamespace getVariable \"DEPOT\";",
    );
    assert_eq!(values, [Value::Scalar(2.0)]);
}

#[test]
fn all_variables_lists_names() {
    let values = eval(
        "missionNamespace setVariable [\"a\", 1]; \
         missionNamespace setVariable [\"b\", 2]; \
         count allVariables missionNamespace;",
    );
    assert_eq!(values, [Value::Scalar(2.0)]);
}

#[test]
fn namespace_values_compare_by_identity() {
    let values = eval("missionNamespace == missionNamespace;");
    assert_eq!(values, [Value::Boolean(true)]);
    let values = eval("missionNamespace == uiNamespace;");
    assert_eq!(values, [Value::Boolean(false)]);
}

#[test]
fn parsing_namespace_is_reachable() {
    let values = eval(
        "parsingNamespace setVariable [\"fromScript\", 4]; \
         parsingNamespace getVariable \"fromScript\";",
    );
    assert_eq!(values, [Value::Scalar(4.0)]);
}
