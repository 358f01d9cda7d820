//! Array construction, access and shared mutation.

use super::{assert_stack_eq, eval, eval_with_diagnostics, runtime};
use sqf_core::DiagnosticCode;
use sqf_vm::Value;

#[test]
fn literal_preserves_source_order() {
    let values = eval("[1, 2, 3];");
    let array = values[0].as_array().unwrap();
    assert_eq!(
        &*array.borrow(),
        &[Value::Scalar(1.0), Value::Scalar(2.0), Value::Scalar(3.0)]
    );
}

#[test]
fn empty_and_nested_literals() {
    let values = eval("[[], [1]];");
    let outer = values[0].as_array().unwrap();
    assert_eq!(outer.borrow().len(), 2);
    assert_eq!(outer.borrow()[0].as_array().unwrap().borrow().len(), 0);
}

#[test]
fn elements_may_be_expressions() {
    let values = eval("[1 + 1, 2 * 3];");
    let array = values[0].as_array().unwrap();
    assert_eq!(
        &*array.borrow(),
        &[Value::Scalar(2.0), Value::Scalar(6.0)]
    );
}

#[test]
fn select_indexes() {
    assert_stack_eq("[10, 20, 30] select 1;", &[20.0]);
}

#[test]
fn select_by_boolean() {
    assert_stack_eq("[10, 20] select true;", &[20.0]);
    assert_stack_eq("[10, 20] select false;", &[10.0]);
}

#[test]
fn count_array_and_string() {
    assert_stack_eq("count [1, 2, 3];", &[3.0]);
    assert_stack_eq("count \"abcd\";", &[4.0]);
}

#[test]
fn push_back_returns_index_and_mutates_shared() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval("_a = [1]; _b = _a; _b pushBack 2; count _a;")
        .unwrap();
    assert_eq!(values, [Value::Scalar(2.0)]);
}

#[test]
fn push_back_index() {
    assert_stack_eq("[9, 9] pushBack 0;", &[2.0]);
}

#[test]
fn set_grows_with_nothing() {
    let values = eval("_a = [1]; _a set [3, 5]; _a;");
    let array = values[0].as_array().unwrap();
    assert_eq!(
        &*array.borrow(),
        &[
            Value::Scalar(1.0),
            Value::Nothing,
            Value::Nothing,
            Value::Scalar(5.0)
        ]
    );
}

#[test]
fn resize_truncates_and_pads() {
    assert_stack_eq("_a = [1, 2, 3]; _a resize 2; count _a;", &[2.0]);
    assert_stack_eq("_a = [1]; _a resize 3; count _a;", &[3.0]);
}

#[test]
fn find_and_in() {
    assert_stack_eq("[5, 6, 7] find 6;", &[1.0]);
    assert_stack_eq("[5, 6, 7] find 9;", &[-1.0]);
    assert_eq!(eval("6 in [5, 6];"), [Value::Boolean(true)]);
    assert_eq!(eval("9 in [5, 6];"), [Value::Boolean(false)]);
}

#[test]
fn reverse_mutates_in_place() {
    let values = eval("_a = [1, 2, 3]; reverse _a; _a select 0;");
    assert_eq!(values, [Value::Scalar(3.0)]);
}

#[test]
fn concatenation_builds_a_fresh_array() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval("_a = [1]; _b = _a + [2]; _b pushBack 3; count _a;")
        .unwrap();
    assert_eq!(values, [Value::Scalar(1.0)]);
}

#[test]
fn subtraction_removes_elements() {
    let values = eval("[1, 2, 3, 2] - [2];");
    let array = values[0].as_array().unwrap();
    assert_eq!(
        &*array.borrow(),
        &[Value::Scalar(1.0), Value::Scalar(3.0)]
    );
}

#[test]
fn select_index_equals_size_warns_and_returns_nothing() {
    let (values, diagnostics) = eval_with_diagnostics("[1, 2] select 2;");
    assert_eq!(values, [Value::Nothing]);
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::IndexEqualsRange));
}

#[test]
fn stringification_renders_nested() {
    assert_eq!(
        eval("str [1, \"a\", [true]];"),
        [Value::string("[1, \"a\", [true]]")]
    );
}
