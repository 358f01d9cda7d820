//! Arithmetic and comparison operators.
//!
//! Binary: `+ - * / % mod ^ min max atan2` and the comparisons
//! `== != < <= > >=`. Unary: `- abs sqrt sin cos tan exp ln log floor ceil
//! round`. Nular: `pi`. Trigonometry works in degrees. Scalars are IEEE-754
//! doubles, so division by zero follows IEEE semantics.
//!
//! `+` also concatenates strings and arrays (producing a fresh array);
//! `-` on arrays removes every element equal to one of the right side's.

use sqf_vm::{OperatorRegistry, RuntimeError, Value, Vm};

fn binary_scalar(
    registry: &mut OperatorRegistry,
    name: &str,
    precedence: u8,
    f: fn(f64, f64) -> f64,
) {
    registry.register_binary(name, precedence, move |vm: &mut Vm| {
        let right = vm.pop_scalar()?;
        let left = vm.pop_scalar()?;
        vm.push_value(Value::Scalar(f(left, right)));
        Ok(())
    });
}

fn unary_scalar(registry: &mut OperatorRegistry, name: &str, f: fn(f64) -> f64) {
    registry.register_unary(name, move |vm: &mut Vm| {
        let operand = vm.pop_scalar()?;
        vm.push_value(Value::Scalar(f(operand)));
        Ok(())
    });
}

fn binary_ordering(
    registry: &mut OperatorRegistry,
    name: &str,
    f: fn(f64, f64) -> bool,
) {
    registry.register_binary(name, 3, move |vm: &mut Vm| {
        let right = vm.pop_scalar()?;
        let left = vm.pop_scalar()?;
        vm.push_value(Value::Boolean(f(left, right)));
        Ok(())
    });
}

/// Equality as the language defines it: scalars by value, strings without
/// case, shared types by identity. `None` when the types cannot be compared.
pub(crate) fn values_equal(left: &Value, right: &Value) -> Option<bool> {
    match (left, right) {
        (Value::Scalar(a), Value::Scalar(b)) => Some(a == b),
        (Value::String(a), Value::String(b)) => Some(a.eq_ignore_ascii_case(b)),
        (Value::Boolean(a), Value::Boolean(b)) => Some(a == b),
        (Value::Array(_), Value::Array(_))
        | (Value::Code(_), Value::Code(_))
        | (Value::Namespace(_), Value::Namespace(_))
        | (Value::Object(_), Value::Object(_)) => Some(left == right),
        _ => None,
    }
}

fn equality(vm: &mut Vm, negate: bool) -> Result<(), RuntimeError> {
    let right = vm.pop_value()?;
    let left = vm.pop_value()?;
    match values_equal(&left, &right) {
        Some(equal) => {
            vm.push_value(Value::Boolean(equal != negate));
            Ok(())
        }
        None => Err(RuntimeError::TypeMismatch {
            expected: left.type_name(),
            got: right.type_name(),
        }),
    }
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_binary("+", 6, |vm: &mut Vm| {
        let right = vm.pop_value()?;
        let left = vm.pop_value()?;
        let result = match (&left, &right) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a + b),
            (Value::String(a), Value::String(b)) => Value::string(format!("{}{}", a, b)),
            (Value::Array(a), Value::Array(b)) => {
                let mut combined = a.borrow().clone();
                combined.extend(b.borrow().iter().cloned());
                Value::array(combined)
            }
            _ => {
                return Err(RuntimeError::TypeMismatch {
                    expected: left.type_name(),
                    got: right.type_name(),
                });
            }
        };
        vm.push_value(result);
        Ok(())
    });

    registry.register_binary("-", 6, |vm: &mut Vm| {
        let right = vm.pop_value()?;
        let left = vm.pop_value()?;
        let result = match (&left, &right) {
            (Value::Scalar(a), Value::Scalar(b)) => Value::Scalar(a - b),
            (Value::Array(a), Value::Array(b)) => {
                let right_elements = b.borrow();
                let remaining: Vec<Value> = a
                    .borrow()
                    .iter()
                    .filter(|element| {
                        !right_elements
                            .iter()
                            .any(|removed| values_equal(element, removed) == Some(true))
                    })
                    .cloned()
                    .collect();
                Value::array(remaining)
            }
            _ => {
                return Err(RuntimeError::TypeMismatch {
                    expected: left.type_name(),
                    got: right.type_name(),
                });
            }
        };
        vm.push_value(result);
        Ok(())
    });

    binary_scalar(registry, "*", 7, |a, b| a * b);
    binary_scalar(registry, "/", 7, |a, b| a / b);
    binary_scalar(registry, "%", 7, |a, b| a % b);
    binary_scalar(registry, "mod", 7, |a, b| a % b);
    binary_scalar(registry, "atan2", 7, |a, b| a.atan2(b).to_degrees());
    binary_scalar(registry, "^", 8, |a, b| a.powf(b));
    binary_scalar(registry, "min", 6, f64::min);
    binary_scalar(registry, "max", 6, f64::max);

    binary_ordering(registry, "<", |a, b| a < b);
    binary_ordering(registry, "<=", |a, b| a <= b);
    binary_ordering(registry, ">", |a, b| a > b);
    binary_ordering(registry, ">=", |a, b| a >= b);
    registry.register_binary("==", 3, |vm: &mut Vm| equality(vm, false));
    registry.register_binary("!=", 3, |vm: &mut Vm| equality(vm, true));

    unary_scalar(registry, "-", |v| -v);
    unary_scalar(registry, "abs", f64::abs);
    unary_scalar(registry, "sqrt", f64::sqrt);
    unary_scalar(registry, "sin", |v| v.to_radians().sin());
    unary_scalar(registry, "cos", |v| v.to_radians().cos());
    unary_scalar(registry, "tan", |v| v.to_radians().tan());
    unary_scalar(registry, "exp", f64::exp);
    unary_scalar(registry, "ln", f64::ln);
    unary_scalar(registry, "log", f64::log10);
    unary_scalar(registry, "floor", f64::floor);
    unary_scalar(registry, "ceil", f64::ceil);
    unary_scalar(registry, "round", f64::round);

    registry.register_nular("pi", |vm: &mut Vm| {
        vm.push_value(Value::Scalar(std::f64::consts::PI));
        Ok(())
    });
}
