//! Namespace and variable operators.
//!
//! Nular: `missionNamespace uiNamespace profileNamespace parsingNamespace
//! nil`. Binary: `setVariable getVariable`. Unary: `allVariables private
//! isNil`.

use sqf_core::DiagnosticCode;
use sqf_vm::{run_code, NamespaceRef, OperatorRegistry, RuntimeError, Value, Vm};

fn pop_namespace(vm: &mut Vm) -> Result<NamespaceRef, RuntimeError> {
    let value = vm.pop_value()?;
    value
        .as_namespace()
        .ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "NAMESPACE",
            got: value.type_name(),
        })
}

fn set_variable(vm: &mut Vm) -> Result<(), RuntimeError> {
    let pair = vm.pop_array()?;
    let namespace = pop_namespace(vm)?;
    let (name, value) = {
        let pair = pair.borrow();
        if pair.len() != 2 {
            return Err(RuntimeError::ArraySizeMismatch {
                expected: 2,
                got: pair.len(),
            });
        }
        let name = pair[0]
            .as_str()
            .ok_or_else(|| RuntimeError::TypeMismatch {
                expected: "STRING",
                got: pair[0].type_name(),
            })?
            .to_string();
        (name, pair[1].clone())
    };
    namespace.borrow_mut().set(&name, value);
    vm.push_value(Value::Nothing);
    Ok(())
}

fn get_variable(vm: &mut Vm) -> Result<(), RuntimeError> {
    let query = vm.pop_value()?;
    let namespace = pop_namespace(vm)?;
    let result = match query {
        Value::String(name) => namespace.borrow().get(&name).unwrap_or(Value::Nothing),
        Value::Array(pair) => {
            let pair = pair.borrow();
            if pair.len() != 2 {
                return Err(RuntimeError::ArraySizeMismatch {
                    expected: 2,
                    got: pair.len(),
                });
            }
            let name = pair[0].as_str().ok_or_else(|| RuntimeError::TypeMismatch {
                expected: "STRING",
                got: pair[0].type_name(),
            })?;
            namespace
                .borrow()
                .get(name)
                .unwrap_or_else(|| pair[1].clone())
        }
        other => {
            return Err(RuntimeError::TypeMismatch {
                expected: "STRING",
                got: other.type_name(),
            });
        }
    };
    vm.push_value(result);
    Ok(())
}

fn all_variables(vm: &mut Vm) -> Result<(), RuntimeError> {
    let namespace = pop_namespace(vm)?;
    let names: Vec<Value> = namespace
        .borrow()
        .names()
        .map(|name| Value::string(name.clone()))
        .collect();
    vm.push_value(Value::array(names));
    Ok(())
}

/// Declare locals in the current frame, binding nothing.
fn private(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_value()?;
    let mut declare = |name: &str| -> Result<(), RuntimeError> {
        if !name.starts_with('_') {
            return Err(RuntimeError::Diagnostic {
                code: DiagnosticCode::MissingUnderscoreOnPrivateVariable,
                message: format!("private variable '{}' must start with '_'", name),
            });
        }
        if let Some(scope) = vm.top_scope_mut() {
            if !scope.has_local(name) {
                scope.set_local(name, Value::Nothing);
            }
        }
        Ok(())
    };
    match &operand {
        Value::String(name) => declare(name)?,
        Value::Array(names) => {
            for name in names.borrow().iter() {
                let name = name.as_str().ok_or_else(|| RuntimeError::TypeMismatch {
                    expected: "STRING",
                    got: name.type_name(),
                })?;
                declare(name)?;
            }
        }
        other => {
            return Err(RuntimeError::TypeMismatch {
                expected: "STRING",
                got: other.type_name(),
            });
        }
    }
    vm.push_value(Value::Nothing);
    Ok(())
}

fn is_nil(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_value()?;
    let nil = match operand {
        Value::String(name) => vm
            .lookup_variable(&name)
            .map(|v| v.is_nothing())
            .unwrap_or(true),
        Value::Code(code) => run_code(vm, &code, "isNil")?.is_nothing(),
        other => {
            return Err(RuntimeError::TypeMismatch {
                expected: "STRING",
                got: other.type_name(),
            });
        }
    };
    vm.push_value(Value::Boolean(nil));
    Ok(())
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_nular("missionNamespace", |vm: &mut Vm| {
        let ns = vm.mission_namespace();
        vm.push_value(Value::Namespace(ns));
        Ok(())
    });
    registry.register_nular("uiNamespace", |vm: &mut Vm| {
        let ns = vm.ui_namespace();
        vm.push_value(Value::Namespace(ns));
        Ok(())
    });
    registry.register_nular("profileNamespace", |vm: &mut Vm| {
        let ns = vm.profile_namespace();
        vm.push_value(Value::Namespace(ns));
        Ok(())
    });
    registry.register_nular("parsingNamespace", |vm: &mut Vm| {
        let ns = vm.parsing_namespace();
        vm.push_value(Value::Namespace(ns));
        Ok(())
    });
    registry.register_nular("nil", |vm: &mut Vm| {
        vm.push_value(Value::Nothing);
        Ok(())
    });

    registry.register_binary("setVariable", 4, set_variable);
    registry.register_binary("getVariable", 4, get_variable);
    registry.register_unary("allVariables", all_variables);
    registry.register_unary("private", private);
    registry.register_unary("isNil", is_nil);
}
