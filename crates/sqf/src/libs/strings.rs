//! String operators.
//!
//! Unary: `str toUpper toLower format typeName`. `str` renders any value in
//! its display form; a self-containing array is rejected with the array
//! recursion diagnostic rather than recursing forever. `format` takes
//! `[template, args…]` and substitutes `%1`…`%9` (strings are inserted
//! bare, without quotes).

use sqf_vm::{OperatorRegistry, RuntimeError, Value, Vm};

fn str_op(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_value()?;
    if operand.is_cyclic() {
        return Err(RuntimeError::ArrayRecursion);
    }
    vm.push_value(Value::string(operand.as_string()));
    Ok(())
}

fn to_upper(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_string()?;
    vm.push_value(Value::string(operand.to_uppercase()));
    Ok(())
}

fn to_lower(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_string()?;
    vm.push_value(Value::string(operand.to_lowercase()));
    Ok(())
}

/// Bare rendering for `format`: string contents without quotes, everything
/// else in display form.
fn bare(value: &Value) -> String {
    match value {
        Value::String(s) => s.to_string(),
        other => other.as_string(),
    }
}

fn format_op(vm: &mut Vm) -> Result<(), RuntimeError> {
    let parts = vm.pop_array()?;
    let parts = parts.borrow();
    let Some(template) = parts.first() else {
        return Err(RuntimeError::MinimumArraySizeMismatch {
            expected: 1,
            got: 0,
        });
    };
    let template = template
        .as_str()
        .ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "STRING",
            got: template.type_name(),
        })?
        .to_string();

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            if let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                chars.next();
                match parts.get(d as usize) {
                    Some(argument) => out.push_str(&bare(argument)),
                    None => {}
                }
                continue;
            }
        }
        out.push(c);
    }
    drop(parts);
    vm.push_value(Value::string(out));
    Ok(())
}

fn type_name(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_value()?;
    vm.push_value(Value::string(operand.type_name()));
    Ok(())
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_unary("str", str_op);
    registry.register_unary("toUpper", to_upper);
    registry.register_unary("toLower", to_lower);
    registry.register_unary("format", format_op);
    registry.register_unary("typeName", type_name);
}
