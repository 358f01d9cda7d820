//! Array operators.
//!
//! Binary: `select pushBack set resize find in`. Unary: `count reverse`.
//! The engine never copies arrays; `pushBack`, `set`, `resize` and
//! `reverse` mutate the shared storage in place, visible through every
//! holder. Index and size faults report under the historical codes.

use sqf_core::DiagnosticCode;
use sqf_vm::{OperatorRegistry, RuntimeError, Value, Vm};

use super::arith::values_equal;

fn select(vm: &mut Vm) -> Result<(), RuntimeError> {
    let right = vm.pop_value()?;
    let array = vm.pop_array()?;
    let index = match right {
        Value::Scalar(v) => {
            if v < 0.0 {
                return Err(RuntimeError::NegativeIndex(v));
            }
            v.round() as usize
        }
        // Booleans select between the first two elements
        Value::Boolean(v) => usize::from(v),
        other => {
            return Err(RuntimeError::TypeMismatch {
                expected: "SCALAR",
                got: other.type_name(),
            });
        }
    };
    let elements = array.borrow();
    if index == elements.len() {
        vm.report(
            DiagnosticCode::IndexEqualsRange,
            vm.current_location(),
            format!("index {} equals array size", index),
        );
        drop(elements);
        vm.push_value(Value::Nothing);
        return Ok(());
    }
    if index > elements.len() {
        return Err(RuntimeError::IndexOutOfRange {
            index,
            range: elements.len(),
        });
    }
    let value = elements[index].clone();
    drop(elements);
    vm.push_value(value);
    Ok(())
}

fn push_back(vm: &mut Vm) -> Result<(), RuntimeError> {
    let value = vm.pop_value()?;
    let array = vm.pop_array()?;
    let index = {
        let mut elements = array.borrow_mut();
        elements.push(value);
        elements.len() - 1
    };
    vm.push_value(Value::Scalar(index as f64));
    Ok(())
}

fn set(vm: &mut Vm) -> Result<(), RuntimeError> {
    let pair = vm.pop_array()?;
    let array = vm.pop_array()?;
    let (index, value) = {
        let pair = pair.borrow();
        if pair.len() != 2 {
            return Err(RuntimeError::ArraySizeMismatch {
                expected: 2,
                got: pair.len(),
            });
        }
        let index = pair[0]
            .as_scalar()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                expected: "SCALAR",
                got: pair[0].type_name(),
            })?;
        (index, pair[1].clone())
    };
    if index < 0.0 {
        return Err(RuntimeError::NegativeIndex(index));
    }
    let index = index.round() as usize;
    let mut elements = array.borrow_mut();
    if index >= elements.len() {
        elements.resize(index + 1, Value::Nothing);
    }
    elements[index] = value;
    drop(elements);
    vm.push_value(Value::Nothing);
    Ok(())
}

fn resize(vm: &mut Vm) -> Result<(), RuntimeError> {
    let size = vm.pop_scalar()?;
    let array = vm.pop_array()?;
    if size < 0.0 {
        return Err(RuntimeError::NegativeSize(size));
    }
    array.borrow_mut().resize(size.round() as usize, Value::Nothing);
    vm.push_value(Value::Nothing);
    Ok(())
}

fn find(vm: &mut Vm) -> Result<(), RuntimeError> {
    let needle = vm.pop_value()?;
    let array = vm.pop_array()?;
    let position = array
        .borrow()
        .iter()
        .position(|element| values_equal(element, &needle) == Some(true));
    vm.push_value(Value::Scalar(
        position.map(|p| p as f64).unwrap_or(-1.0),
    ));
    Ok(())
}

fn contained_in(vm: &mut Vm) -> Result<(), RuntimeError> {
    let haystack = vm.pop_array()?;
    let needle = vm.pop_value()?;
    let found = haystack
        .borrow()
        .iter()
        .any(|element| values_equal(element, &needle) == Some(true));
    vm.push_value(Value::Boolean(found));
    Ok(())
}

fn count(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_value()?;
    let length = match &operand {
        Value::Array(array) => array.borrow().len(),
        Value::String(s) => s.chars().count(),
        other => {
            return Err(RuntimeError::TypeMismatch {
                expected: "ARRAY",
                got: other.type_name(),
            });
        }
    };
    vm.push_value(Value::Scalar(length as f64));
    Ok(())
}

fn reverse(vm: &mut Vm) -> Result<(), RuntimeError> {
    let array = vm.pop_array()?;
    array.borrow_mut().reverse();
    vm.push_value(Value::Nothing);
    Ok(())
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_binary("select", 4, select);
    registry.register_binary("pushBack", 4, push_back);
    registry.register_binary("set", 4, set);
    registry.register_binary("resize", 4, resize);
    registry.register_binary("find", 4, find);
    registry.register_binary("in", 4, contained_in);
    registry.register_unary("count", count);
    registry.register_unary("reverse", reverse);
}
