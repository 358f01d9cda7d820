//! Control-flow operators.
//!
//! `if … then …`, `… else …`, `while … do …`, unary and binary `call`, and
//! `sleep`. Code blocks run in a fresh frame on the machine's call stack;
//! the block's last statement value is the operator's result. Runaway
//! `while` loops are bounded by the machine's instruction cap.

use std::time::Duration;

use sqf_vm::{run_code, run_code_with, OperatorRegistry, RuntimeError, Value, Vm};

fn if_op(vm: &mut Vm) -> Result<(), RuntimeError> {
    let condition = vm.pop_boolean()?;
    vm.push_value(Value::Boolean(condition));
    Ok(())
}

fn then(vm: &mut Vm) -> Result<(), RuntimeError> {
    let branches = vm.pop_value()?;
    let condition = vm.pop_boolean()?;
    match branches {
        Value::Code(code) => {
            let result = if condition {
                run_code(vm, &code, "then")?
            } else {
                Value::Nothing
            };
            vm.push_value(result);
            Ok(())
        }
        Value::Array(pair) => {
            let branch = {
                let pair = pair.borrow();
                if pair.len() != 2 {
                    return Err(RuntimeError::ArraySizeMismatch {
                        expected: 2,
                        got: pair.len(),
                    });
                }
                let chosen = if condition { &pair[0] } else { &pair[1] };
                chosen.as_code().ok_or_else(|| RuntimeError::TypeMismatch {
                    expected: "CODE",
                    got: chosen.type_name(),
                })?
            };
            let result = run_code(vm, &branch, "then")?;
            vm.push_value(result);
            Ok(())
        }
        other => Err(RuntimeError::TypeMismatch {
            expected: "CODE",
            got: other.type_name(),
        }),
    }
}

fn else_op(vm: &mut Vm) -> Result<(), RuntimeError> {
    let alternative = vm.pop_value()?;
    let consequent = vm.pop_value()?;
    for value in [&consequent, &alternative] {
        if value.as_code().is_none() {
            return Err(RuntimeError::TypeMismatch {
                expected: "CODE",
                got: value.type_name(),
            });
        }
    }
    vm.push_value(Value::array(vec![consequent, alternative]));
    Ok(())
}

fn while_op(vm: &mut Vm) -> Result<(), RuntimeError> {
    let condition = vm.pop_code()?;
    vm.push_value(Value::Code(condition));
    Ok(())
}

fn do_op(vm: &mut Vm) -> Result<(), RuntimeError> {
    let body = vm.pop_code()?;
    let condition = vm.pop_code()?;
    loop {
        let keep_going = run_code(vm, &condition, "while")?;
        let keep_going = keep_going
            .as_bool()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                expected: "BOOL",
                got: keep_going.type_name(),
            })?;
        if !keep_going {
            break;
        }
        run_code(vm, &body, "do")?;
    }
    vm.push_value(Value::Nothing);
    Ok(())
}

fn call_unary(vm: &mut Vm) -> Result<(), RuntimeError> {
    let code = vm.pop_code()?;
    let result = run_code(vm, &code, "call")?;
    vm.push_value(result);
    Ok(())
}

fn call_binary(vm: &mut Vm) -> Result<(), RuntimeError> {
    let code = vm.pop_code()?;
    let arguments = vm.pop_value()?;
    let result = run_code_with(
        vm,
        &code,
        "call",
        vec![("_this".to_string(), arguments)],
    )?;
    vm.push_value(result);
    Ok(())
}

fn sleep(vm: &mut Vm) -> Result<(), RuntimeError> {
    let seconds = vm.pop_scalar()?;
    let seconds = if seconds.is_finite() && seconds > 0.0 {
        seconds
    } else {
        0.0
    };
    vm.suspend(Duration::from_secs_f64(seconds))?;
    vm.push_value(Value::Nothing);
    Ok(())
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_unary("if", if_op);
    registry.register_binary("then", 4, then);
    registry.register_binary("else", 5, else_op);
    registry.register_unary("while", while_op);
    registry.register_binary("do", 4, do_op);
    registry.register_unary("call", call_unary);
    registry.register_binary("call", 4, call_binary);
    registry.register_unary("sleep", sleep);
}
