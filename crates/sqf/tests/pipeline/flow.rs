//! Control flow: if/then/else, while/do, call, code values, lazy booleans.

use super::{assert_stack_eq, eval, runtime};
use sqf_vm::{ExecuteOutcome, Value};

#[test]
fn if_then_taken() {
    assert_stack_eq("if true then {42};", &[42.0]);
}

#[test]
fn if_then_not_taken_yields_nothing() {
    assert_eq!(eval("if false then {42};"), [Value::Nothing]);
}

#[test]
fn if_then_else() {
    assert_stack_eq("if false then {1} else {2};", &[2.0]);
    assert_stack_eq("if true then {1} else {2};", &[1.0]);
}

#[test]
fn then_with_branch_array() {
    assert_stack_eq("if false then [{1}, {2}];", &[2.0]);
}

#[test]
fn condition_may_be_an_expression() {
    assert_stack_eq("if (2 > 1) then {5} else {6};", &[5.0]);
}

#[test]
fn while_do_loops() {
    assert_stack_eq(
        "_i = 0; _sum = 0; while {_i < 5} do {_sum = _sum + _i; _i = _i + 1}; _sum;",
        &[10.0],
    );
}

#[test]
fn while_with_false_condition_never_runs() {
    assert_stack_eq("_x = 1; while {false} do {_x = 99}; _x;", &[1.0]);
}

#[test]
fn unary_call_returns_block_value() {
    assert_stack_eq("call {3 + 4};", &[7.0]);
}

#[test]
fn call_sees_caller_locals() {
    assert_stack_eq("_x = 10; call {_x + 1};", &[11.0]);
}

#[test]
fn call_assignment_inside_block_updates_outer_local() {
    assert_stack_eq("_x = 1; call {_x = 2}; _x;", &[2.0]);
}

#[test]
fn binary_call_binds_this() {
    assert_stack_eq("[2, 3] call {(_this select 0) + (_this select 1)};", &[5.0]);
}

#[test]
fn code_is_a_first_class_value() {
    assert_stack_eq("_f = {_this * 2}; 21 call _f;", &[42.0]);
}

#[test]
fn empty_call_yields_nothing() {
    assert_eq!(eval("call {};"), [Value::Nothing]);
}

#[test]
fn lazy_and_short_circuits() {
    // The right block would fail on a type error if evaluated
    assert_eq!(
        eval("false && {1 / 0 > 0};"),
        [Value::Boolean(false)]
    );
    assert_eq!(eval("true && {2 > 1};"), [Value::Boolean(true)]);
}

#[test]
fn lazy_or_short_circuits() {
    assert_eq!(eval("true || {false};"), [Value::Boolean(true)]);
    assert_eq!(eval("false || {true};"), [Value::Boolean(true)]);
}

#[test]
fn not_negates() {
    assert_eq!(eval("!true;"), [Value::Boolean(false)]);
    assert_eq!(eval("not false;"), [Value::Boolean(true)]);
}

#[test]
fn private_declares_in_current_frame() {
    assert_eq!(eval("private \"_x\"; isNil \"_x\";"), [Value::Boolean(true)]);
}

#[test]
fn private_assignment_shadows_outer() {
    assert_stack_eq(
        "_x = 1; call {private _x = 2; _x}; ",
        &[2.0],
    );
}

#[test]
fn sleep_suspends_and_resumes() {
    let (mut runtime, _) = runtime();
    let code = runtime
        .parse_source("<t>", "sleep 0.01; 5;")
        .unwrap();
    assert_eq!(runtime.execute_scheduled(&code), ExecuteOutcome::Suspended);
    std::thread::sleep(std::time::Duration::from_millis(25));
    assert_eq!(runtime.resume(), ExecuteOutcome::Completed);
    assert_eq!(runtime.vm().result_values(), &[Value::Scalar(5.0)]);
}
