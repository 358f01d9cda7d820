//! The assembly surface: direct instruction programs and round-tripping.

use super::{runtime, runtime_with_files};
use sqf_vm::Value;

#[test]
fn push_push_call_binary() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval_assembly("push SCALAR 1;\npush SCALAR 2;\ncallBinary +;")
        .unwrap();
    assert_eq!(values, [Value::Scalar(3.0)]);
}

#[test]
fn variables_through_assembly() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval_assembly(
            "push SCALAR 4;\nassignToLocal _x;\nendStatement;\n\
             getVariable _x;\npush SCALAR 1;\ncallBinary +;",
        )
        .unwrap();
    assert_eq!(values, [Value::Scalar(5.0)]);
}

#[test]
fn make_array_in_assembly() {
    let (mut runtime, _) = runtime();
    let values = runtime
        .eval_assembly("push SCALAR 1;\npush SCALAR 2;\nmakeArray 2;")
        .unwrap();
    let array = values[0].as_array().unwrap();
    assert_eq!(
        &*array.borrow(),
        &[Value::Scalar(1.0), Value::Scalar(2.0)]
    );
}

#[test]
fn nular_operator_in_assembly() {
    let (mut runtime, _) = runtime();
    let values = runtime.eval_assembly("callNular true;").unwrap();
    assert_eq!(values, [Value::Boolean(true)]);
}

#[test]
fn parsed_sqf_serializes_and_reparses_identically() {
    let (mut runtime, _) = runtime();
    let code = runtime
        .parse_source("<t>", "_x = 4; _x + 1;")
        .unwrap();
    let assembly = code.to_assembly();
    let reparsed = runtime.parse_assembly_source("<t>", &assembly).unwrap();
    let original: Vec<_> = code.instructions().iter().map(|i| (**i).clone()).collect();
    let round_tripped: Vec<_> = reparsed
        .instructions()
        .iter()
        .map(|i| (**i).clone())
        .collect();
    assert_eq!(original, round_tripped);

    let values_direct = {
        runtime.execute(&code);
        runtime.vm().result_values().to_vec()
    };
    let values_round_tripped = {
        runtime.execute(&reparsed);
        runtime.vm().result_values().to_vec()
    };
    assert_eq!(values_direct, values_round_tripped);
}

#[test]
fn assembly_goes_through_the_preprocessor_too() {
    let (mut runtime, _) = runtime_with_files(&[]);
    let values = runtime
        .eval_assembly("#define N 41\npush SCALAR N;\npush SCALAR 1;\ncallBinary +;")
        .unwrap();
    assert_eq!(values, [Value::Scalar(42.0)]);
}
