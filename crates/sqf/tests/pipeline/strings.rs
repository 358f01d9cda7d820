//! String operators and stringification.

use super::{eval, eval_with_diagnostics};
use sqf_core::DiagnosticCode;
use sqf_vm::Value;

#[test]
fn str_renders_scalars_without_trailing_zeroes() {
    assert_eq!(eval("str 7;"), [Value::string("7")]);
    assert_eq!(eval("str 1.5;"), [Value::string("1.5")]);
}

#[test]
fn str_quotes_strings_and_doubles_inner_quotes() {
    assert_eq!(eval("str \"hi\";"), [Value::string("\"hi\"")]);
    assert_eq!(
        eval("str \"say \"\"hi\"\"\";"),
        [Value::string("\"say \"\"hi\"\"\"")]
    );
}

#[test]
fn str_renders_booleans_and_arrays() {
    assert_eq!(eval("str true;"), [Value::string("true")]);
    assert_eq!(eval("str [1, 2];"), [Value::string("[1, 2]")]);
}

#[test]
fn case_conversion() {
    assert_eq!(eval("toUpper \"abc\";"), [Value::string("ABC")]);
    assert_eq!(eval("toLower \"AbC\";"), [Value::string("abc")]);
}

#[test]
fn format_substitutes_positional_arguments() {
    assert_eq!(
        eval("format [\"%1 + %2 = %3\", 1, 2, 3];"),
        [Value::string("1 + 2 = 3")]
    );
}

#[test]
fn format_inserts_strings_bare() {
    assert_eq!(
        eval("format [\"hello %1\", \"world\"];"),
        [Value::string("hello world")]
    );
}

#[test]
fn format_leaves_unmatched_placeholders_empty() {
    assert_eq!(eval("format [\"a%9b\"];"), [Value::string("ab")]);
}

#[test]
fn type_name_of_values() {
    assert_eq!(eval("typeName 1;"), [Value::string("SCALAR")]);
    assert_eq!(eval("typeName \"s\";"), [Value::string("STRING")]);
    assert_eq!(eval("typeName [];"), [Value::string("ARRAY")]);
    assert_eq!(eval("typeName {};"), [Value::string("CODE")]);
    assert_eq!(eval("typeName true;"), [Value::string("BOOL")]);
}

#[test]
fn diag_log_reports_an_info_message() {
    let (_, diagnostics) = eval_with_diagnostics("diag_log \"checkpoint\";");
    let info = diagnostics
        .iter()
        .find(|d| d.code() == DiagnosticCode::InfoMessage)
        .expect("info diagnostic");
    assert_eq!(info.message(), "\"checkpoint\"");
}

#[test]
fn comment_discards_its_operand() {
    assert_eq!(eval("comment \"docs\"; 4;"), [Value::Scalar(4.0)]);
}
