//! The preprocessor driving real evaluation, includes and diagnostics.

use super::{assert_stack_eq, eval, runtime_with_files};
use sqf::ScriptError;
use sqf_core::DiagnosticCode;
use sqf_vm::Value;

#[test]
fn macro_expansion_is_textual() {
    // Precedence applies after expansion
    assert_stack_eq("#define FOO 1+2\nFOO * 3;", &[9.0]);
}

#[test]
fn function_macro_with_parenthesized_body() {
    assert_stack_eq("#define SQ(x) (x)*(x)\nSQ(1+1);", &[4.0]);
}

#[test]
fn stringify_produces_a_string_literal() {
    assert_eq!(
        eval("#define STR(x) #x\nSTR(hello);"),
        [Value::string("hello")]
    );
}

#[test]
fn token_paste_builds_identifiers() {
    assert_stack_eq(
        "#define VAR(n) value##n\nVAR(1) = 5; VAR(1) + 1;",
        &[6.0],
    );
}

#[test]
fn conditional_compilation_selects_code() {
    assert_stack_eq("#define HARD\n#ifdef HARD\n3;\n#else\n7;\n#endif\n", &[3.0]);
    assert_stack_eq("#ifdef HARD\n3;\n#else\n7;\n#endif\n", &[7.0]);
}

#[test]
fn include_provides_definitions() {
    let (mut runtime, _) = runtime_with_files(&[
        ("init.sqf", "#include \"common.hpp\"\nLIMIT + 1;"),
        ("common.hpp", "#define LIMIT 9"),
    ]);
    let code = runtime.parse_file("init.sqf").unwrap();
    runtime.execute(&code);
    assert_eq!(runtime.vm().result_values(), &[Value::Scalar(10.0)]);
}

#[test]
fn include_cycle_fails_with_one_diagnostic() {
    let (mut runtime, sink) = runtime_with_files(&[
        ("a.h", "#include \"b.h\"\n1;"),
        ("b.h", "#include \"a.h\"\n2;"),
    ]);
    match runtime.parse_file("a.h") {
        Err(ScriptError::Preprocess(_)) => {}
        other => panic!("expected preprocess failure, got {:?}", other.map(|_| ())),
    }
    assert_eq!(sink.count_of(DiagnosticCode::RecursiveInclude), 1);
}

#[test]
fn missing_include_fails_the_run() {
    let (mut runtime, sink) = runtime_with_files(&[("main.sqf", "#include \"gone.hpp\"\n1;")]);
    assert!(runtime.parse_file("main.sqf").is_err());
    assert_eq!(sink.count_of(DiagnosticCode::IncludeFailed), 1);
}

#[test]
fn comments_are_stripped_before_parsing() {
    assert_stack_eq("1 + /* inline */ 2; // trailing\n", &[3.0]);
}

#[test]
fn line_continuations_fold() {
    assert_stack_eq("#define SUM 1 + \\\n2\nSUM;", &[3.0]);
}

#[test]
fn undirected_source_round_trips() {
    // No directives: the pipeline only strips comments and folds
    // continuations, so plain source behaves identically
    assert_stack_eq("_a = 2; _a * 2;", &[4.0]);
}

#[test]
fn macros_survive_within_one_translation_unit_only() {
    let (mut runtime, _) = runtime_with_files(&[]);
    runtime.eval("#define TEMP 1\nTEMP;").unwrap();
    // A fresh preprocessor run has no TEMP macro; the bare word becomes a
    // variable lookup yielding nothing
    let values = runtime.eval("isNil \"TEMP\";").unwrap();
    assert_eq!(values, [Value::Boolean(true)]);
}

#[test]
fn parse_diagnostics_point_into_the_included_file() {
    let (mut runtime, _) = runtime_with_files(&[
        ("init.sqf", "#include \"ops.hpp\"\n1;"),
        ("ops.hpp", "2 frobnicate 3;"),
    ]);
    let diagnostics = match runtime.parse_file("init.sqf") {
        Err(ScriptError::Parse(diagnostics)) => diagnostics,
        other => panic!("expected parse failure, got {:?}", other.map(|_| ())),
    };
    let location = diagnostics[0].location().expect("location attached");
    assert_eq!(location.path(), "ops.hpp");
    assert_eq!(location.line(), 1);
}

#[test]
fn parse_diagnostics_in_macro_output_point_at_the_invocation() {
    let (mut runtime, _) = runtime_with_files(&[(
        "init.sqf",
        "#define BAD() 1 frobnicate 2\n\nBAD();",
    )]);
    let diagnostics = match runtime.parse_file("init.sqf") {
        Err(ScriptError::Parse(diagnostics)) => diagnostics,
        other => panic!("expected parse failure, got {:?}", other.map(|_| ())),
    };
    let location = diagnostics[0].location().expect("location attached");
    assert_eq!(location.path(), "init.sqf");
    assert_eq!(location.line(), 3);
}
