//! Arithmetic, comparison and precedence.

use super::{assert_stack_eq, eval};
use sqf_vm::Value;

#[test]
fn precedence_multiplication_first() {
    assert_stack_eq("1 + 2 * 3;", &[7.0]);
}

#[test]
fn parentheses_win() {
    assert_stack_eq("(1 + 2) * 3;", &[9.0]);
}

#[test]
fn left_associativity() {
    assert_stack_eq("8 - 3 - 1;", &[4.0]);
    assert_stack_eq("16 / 4 / 2;", &[2.0]);
}

#[test]
fn power_binds_tightest() {
    assert_stack_eq("2 * 3 ^ 2;", &[18.0]);
}

#[test]
fn unary_minus() {
    assert_stack_eq("- 4 + 10;", &[6.0]);
}

#[test]
fn modulo_forms() {
    assert_stack_eq("7 % 3;", &[1.0]);
    assert_stack_eq("7 mod 3;", &[1.0]);
}

#[test]
fn min_max() {
    assert_stack_eq("3 min 7;", &[3.0]);
    assert_stack_eq("3 max 7;", &[7.0]);
}

#[test]
fn unary_functions() {
    assert_stack_eq("abs - 5;", &[5.0]);
    assert_stack_eq("sqrt 16;", &[4.0]);
    assert_stack_eq("floor 1.9;", &[1.0]);
    assert_stack_eq("ceil 1.1;", &[2.0]);
    assert_stack_eq("round 1.5;", &[2.0]);
}

#[test]
fn trigonometry_in_degrees() {
    let values = eval("sin 90;");
    assert!((values[0].as_scalar().unwrap() - 1.0).abs() < 1e-9);
    let values = eval("cos 0;");
    assert!((values[0].as_scalar().unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn division_by_zero_follows_ieee() {
    let values = eval("1 / 0;");
    assert_eq!(values[0].as_scalar(), Some(f64::INFINITY));
}

#[test]
fn comparisons_produce_booleans() {
    assert_eq!(eval("1 < 2;"), [Value::Boolean(true)]);
    assert_eq!(eval("2 <= 1;"), [Value::Boolean(false)]);
    assert_eq!(eval("3 == 3;"), [Value::Boolean(true)]);
    assert_eq!(eval("3 != 3;"), [Value::Boolean(false)]);
}

#[test]
fn string_equality_ignores_case() {
    assert_eq!(eval("\"Foo\" == \"foo\";"), [Value::Boolean(true)]);
    assert_eq!(eval("\"foo\" == \"bar\";"), [Value::Boolean(false)]);
}

#[test]
fn string_concatenation() {
    assert_eq!(eval("\"ab\" + \"cd\";"), [Value::string("abcd")]);
}

#[test]
fn scientific_and_hex_literals() {
    assert_stack_eq("1e3;", &[1000.0]);
    assert_stack_eq("0x10;", &[16.0]);
    assert_stack_eq("$10;", &[16.0]);
}

#[test]
fn nular_pi() {
    let values = eval("pi;");
    assert!((values[0].as_scalar().unwrap() - std::f64::consts::PI).abs() < 1e-12);
}
