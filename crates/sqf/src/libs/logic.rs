//! Boolean operators.
//!
//! Binary: `&& and || or`, each accepting a boolean or a code block on the
//! right for lazy evaluation. Unary: `! not`. Nular: `true false`.

use sqf_vm::{run_code, OperatorRegistry, RuntimeError, Value, Vm};

/// Resolve the right operand of a lazy boolean operator: a plain boolean or
/// a code block evaluated only when needed.
fn right_operand(vm: &mut Vm, operand: Value) -> Result<bool, RuntimeError> {
    match operand {
        Value::Boolean(value) => Ok(value),
        Value::Code(code) => {
            let result = run_code(vm, &code, "lazy")?;
            result.as_bool().ok_or_else(|| RuntimeError::TypeMismatch {
                expected: "BOOL",
                got: result.type_name(),
            })
        }
        other => Err(RuntimeError::TypeMismatch {
            expected: "BOOL",
            got: other.type_name(),
        }),
    }
}

fn and(vm: &mut Vm) -> Result<(), RuntimeError> {
    let right = vm.pop_value()?;
    let left = vm.pop_boolean()?;
    let result = if left { right_operand(vm, right)? } else { false };
    vm.push_value(Value::Boolean(result));
    Ok(())
}

fn or(vm: &mut Vm) -> Result<(), RuntimeError> {
    let right = vm.pop_value()?;
    let left = vm.pop_boolean()?;
    let result = if left { true } else { right_operand(vm, right)? };
    vm.push_value(Value::Boolean(result));
    Ok(())
}

fn not(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_boolean()?;
    vm.push_value(Value::Boolean(!operand));
    Ok(())
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_binary("&&", 2, and);
    registry.register_binary("and", 2, and);
    registry.register_binary("||", 1, or);
    registry.register_binary("or", 1, or);
    registry.register_unary("!", not);
    registry.register_unary("not", not);

    registry.register_nular("true", |vm: &mut Vm| {
        vm.push_value(Value::Boolean(true));
        Ok(())
    });
    registry.register_nular("false", |vm: &mut Vm| {
        vm.push_value(Value::Boolean(false));
        Ok(())
    });
}
