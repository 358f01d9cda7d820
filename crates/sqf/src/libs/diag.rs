//! Diagnostic operators.
//!
//! Unary: `diag_log hint comment`. The first two render their operand and
//! hand it to the diagnostic sink as an info message; presentation is the
//! host's business.

use sqf_core::DiagnosticCode;
use sqf_vm::{OperatorRegistry, RuntimeError, Value, Vm};

fn log_info(vm: &mut Vm) -> Result<(), RuntimeError> {
    let operand = vm.pop_value()?;
    if operand.is_cyclic() {
        return Err(RuntimeError::ArrayRecursion);
    }
    vm.report(
        DiagnosticCode::InfoMessage,
        vm.current_location(),
        operand.as_string(),
    );
    vm.push_value(Value::Nothing);
    Ok(())
}

fn comment(vm: &mut Vm) -> Result<(), RuntimeError> {
    vm.pop_value()?;
    vm.push_value(Value::Nothing);
    Ok(())
}

pub fn install(registry: &mut OperatorRegistry) {
    registry.register_unary("diag_log", log_info);
    registry.register_unary("hint", log_info);
    registry.register_unary("comment", comment);
}
