//! Error propagation: statement aborts, fatal unwinds, runtime diagnostics.

use super::{eval_with_diagnostics, runtime};
use sqf_core::{DiagnosticCode, Severity};
use sqf_vm::{ExecuteOutcome, Value};

#[test]
fn unknown_operator_aborts_only_its_statement() {
    let (mut runtime, sink) = runtime();
    let values = runtime
        .eval_assembly(
            "push SCALAR 1;\npush SCALAR 2;\ncallBinary frobnicate;\nendStatement;\npush SCALAR 9;",
        )
        .unwrap();
    assert_eq!(sink.count_of(DiagnosticCode::UnknownBinaryOperator), 1);
    assert_eq!(values, [Value::Scalar(9.0)]);
}

#[test]
fn unknown_nular_and_unary_report_their_codes() {
    let (mut runtime, sink) = runtime();
    runtime.eval_assembly("callNular ghost;").unwrap();
    runtime
        .eval_assembly("push SCALAR 1;\ncallUnary spectre;")
        .unwrap();
    assert_eq!(sink.count_of(DiagnosticCode::UnknownNularOperator), 1);
    assert_eq!(sink.count_of(DiagnosticCode::UnknownUnaryOperator), 1);
}

#[test]
fn type_mismatch_reports_and_continues() {
    let (values, diagnostics) = eval_with_diagnostics("1 + true; 5;");
    assert_eq!(values, [Value::Scalar(5.0)]);
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::TypeMismatch));
}

#[test]
fn negative_index_reports() {
    let (_, diagnostics) = eval_with_diagnostics("[1, 2] select -1;");
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::NegativeIndex));
}

#[test]
fn index_out_of_range_reports() {
    let (_, diagnostics) = eval_with_diagnostics("[1, 2] select 5;");
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::IndexOutOfRange));
}

#[test]
fn negative_resize_reports() {
    let (_, diagnostics) = eval_with_diagnostics("_a = [1]; _a resize -2;");
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::NegativeSize));
}

#[test]
fn set_with_wrong_pair_size_reports() {
    let (_, diagnostics) = eval_with_diagnostics("_a = [1]; _a set [0];");
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::ExpectedArraySizeMismatch));
}

#[test]
fn stringifying_a_cyclic_array_reports_recursion() {
    let (_, diagnostics) = eval_with_diagnostics("_a = [1]; _a pushBack _a; str _a;");
    assert!(diagnostics
        .iter()
        .any(|d| d.code() == DiagnosticCode::ArrayRecursion));
}

#[test]
fn instruction_cap_halts_the_machine() {
    let (mut runtime, sink) = runtime();
    runtime.vm_mut().set_max_instructions(Some(500));
    let code = runtime
        .parse_source("<t>", "while {true} do {};")
        .unwrap();
    assert_eq!(runtime.execute(&code), ExecuteOutcome::Halted);
    assert!(runtime.vm().is_halted());
    assert_eq!(runtime.vm().scope_depth(), 0);
    assert_eq!(
        sink.count_of(DiagnosticCode::MaximumInstructionCountReached),
        1
    );
    assert_eq!(sink.count_of(DiagnosticCode::Stacktrace), 1);
}

#[test]
fn fatal_diagnostics_carry_fatal_severity() {
    let (mut runtime, sink) = runtime();
    runtime.vm_mut().set_max_instructions(Some(10));
    let code = runtime
        .parse_source("<t>", "while {true} do {};")
        .unwrap();
    runtime.execute(&code);
    let diagnostics = sink.take();
    assert!(diagnostics
        .iter()
        .any(|d| d.severity() == Severity::Fatal));
}

#[test]
fn suspension_outside_scheduled_frame_reports() {
    let (mut runtime, sink) = runtime();
    let code = runtime.parse_source("<t>", "sleep 1; 2;").unwrap();
    // An unscheduled root frame cannot yield
    assert_eq!(runtime.execute(&code), ExecuteOutcome::Completed);
    assert_eq!(
        sink.count_of(DiagnosticCode::SuspensionInUnscheduledEnvironment),
        1
    );
    assert_eq!(runtime.vm().result_values(), &[Value::Scalar(2.0)]);
}

#[test]
fn error_diagnostics_carry_locations() {
    let (_, diagnostics) = eval_with_diagnostics("[1] select 9;");
    let failure = diagnostics
        .iter()
        .find(|d| d.code() == DiagnosticCode::IndexOutOfRange)
        .expect("index diagnostic");
    let location = failure.location().expect("location attached");
    assert_eq!(location.path(), "<eval>");
    assert_eq!(location.line(), 1);
}

#[test]
fn shutdown_request_unwinds() {
    let (mut runtime, _) = runtime();
    runtime
        .vm_mut()
        .registry_mut()
        .register_nular("pullThePlug", |vm| {
            vm.request_shutdown();
            Ok(())
        });
    let code = runtime
        .parse_source("<t>", "pullThePlug; 1;")
        .unwrap();
    assert_eq!(runtime.execute(&code), ExecuteOutcome::Shutdown);
    assert_eq!(runtime.vm().scope_depth(), 0);
}
