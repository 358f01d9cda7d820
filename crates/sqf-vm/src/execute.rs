//! The interpreter loop.
//!
//! [`execute`] drives the machine while a call stack is present: the top
//! frame's queue is drained instruction by instruction, empty frames pop
//! with their last work value propagating to the caller, and the loop exits
//! on completion, suspension, shutdown, break mode or a fatal unwind.
//! [`run_code`] is the nested entry point operator callbacks use to
//! evaluate a code value to a single result.

use sqf_core::{DiagnosticCode, Severity, SourceLocation};

use crate::debug::Debugger;
use crate::error::RuntimeError;
use crate::instruction::{CodeBlock, Instruction};
use crate::machine::Vm;
use crate::registry::Arity;
use crate::scope::Scope;
use crate::value::Value;

/// Why the engine returned control to the host.
#[derive(Clone, PartialEq, Debug)]
pub enum ExecuteOutcome {
    /// The call stack drained completely.
    Completed,
    /// An operator requested suspension; call `execute` again after the
    /// deadline.
    Suspended,
    /// A breakpoint matched; the debugger holds the machine.
    Paused(SourceLocation),
    /// The host requested shutdown; frames were unwound without cleanup.
    Shutdown,
    /// A fatal diagnostic unwound the machine.
    Halted,
}

/// Run until the call stack drains or execution is interrupted.
pub fn execute(vm: &mut Vm, mut debugger: Option<&mut dyn Debugger>) -> ExecuteOutcome {
    loop {
        if vm.is_halted() {
            return ExecuteOutcome::Halted;
        }
        if vm.shutdown_requested() {
            vm.unwind_all();
            vm.clear_results();
            vm.clear_shutdown();
            return ExecuteOutcome::Shutdown;
        }
        if vm.suspension_pending() {
            if vm.is_suspended() {
                return ExecuteOutcome::Suspended;
            }
            vm.clear_suspension();
        }

        let Some(top) = vm.top_scope() else {
            if let Some(dbg) = debugger.as_deref_mut() {
                if !dbg.stop(vm) {
                    return ExecuteOutcome::Paused(SourceLocation::native());
                }
            }
            return ExecuteOutcome::Completed;
        };
        if !top.has_instructions() {
            vm.pop_scope();
            continue;
        }

        if let Some(dbg) = debugger.as_deref_mut() {
            dbg.check(vm);
            let next = vm.top_scope().and_then(|s| s.peek_location()).cloned();
            if let Some(location) = next {
                // A pause sticks to its line until execution leaves it, so
                // resuming does not re-trigger instruction by instruction
                let resumed_here = vm.break_resume.as_ref().is_some_and(|paused| {
                    paused.path() == location.path() && paused.line() == location.line()
                });
                if !resumed_here {
                    vm.break_resume = None;
                    if dbg.has_breakpoint(&location) {
                        vm.break_resume = Some(location.clone());
                        return ExecuteOutcome::Paused(location);
                    }
                }
            }
        }

        if let Err(err) = step(vm) {
            let location = vm.current_location();
            if err.is_fatal() {
                if let Some(dbg) = debugger.as_deref_mut() {
                    dbg.error(vm, location.as_ref(), &err.to_string());
                }
                fatal_unwind(vm, &err, location);
                return ExecuteOutcome::Halted;
            }
            handle_statement_error(vm, &err, location.clone());
            if let Some(dbg) = debugger.as_deref_mut() {
                dbg.error(vm, location.as_ref(), &err.to_string());
            }
        }
    }
}

/// Evaluate a code block to a single value inside the current machine.
///
/// A fresh unscheduled frame bound to the current namespace is pushed and
/// driven until it pops; the block's last statement value (or nothing) is
/// returned. Statement-level errors inside the block are reported and skip
/// to the next statement, exactly as at the top level; fatal errors
/// propagate to the caller.
pub fn run_code(vm: &mut Vm, code: &CodeBlock, name: &str) -> Result<Value, RuntimeError> {
    run_code_with(vm, code, name, Vec::new())
}

/// Like [`run_code`], with locals bound in the fresh frame before it runs
/// (`_this` for argument-passing calls).
pub fn run_code_with(
    vm: &mut Vm,
    code: &CodeBlock,
    name: &str,
    locals: Vec<(String, Value)>,
) -> Result<Value, RuntimeError> {
    let base_depth = vm.scope_depth();
    let mut scope = Scope::new(name, vm.current_namespace());
    for (local, value) in locals {
        scope.set_local(&local, value);
    }
    scope.enqueue_code(code);
    vm.push_scope(scope);

    while vm.scope_depth() > base_depth {
        let has_instructions = vm
            .top_scope()
            .map(|s| s.has_instructions())
            .unwrap_or(false);
        if !has_instructions {
            vm.pop_scope();
            continue;
        }
        if let Err(err) = step(vm) {
            if err.is_fatal() {
                return Err(err);
            }
            let location = vm.current_location();
            handle_statement_error(vm, &err, location);
        }
    }
    // The popped frame's result landed on the caller's work stack
    vm.pop_value()
}

/// Dequeue and dispatch one instruction from the top frame.
fn step(vm: &mut Vm) -> Result<(), RuntimeError> {
    let instruction = {
        let Some(scope) = vm.top_scope_mut() else {
            return Ok(());
        };
        let Some(instruction) = scope.dequeue() else {
            return Ok(());
        };
        scope.set_current(instruction.location().clone());
        instruction
    };
    vm.count_instruction()?;
    let location = instruction.location().clone();
    dispatch(vm, &instruction, &location)
}

fn dispatch(
    vm: &mut Vm,
    instruction: &Instruction,
    location: &SourceLocation,
) -> Result<(), RuntimeError> {
    match instruction {
        Instruction::Push(value) => {
            vm.push_value(value.clone());
            Ok(())
        }
        Instruction::CallNular(name) => {
            let callback = vm
                .find_callback(name, Arity::Nular)
                .ok_or_else(|| RuntimeError::UnknownNularOperator(name.clone()))?;
            callback(vm)
        }
        Instruction::CallUnary(name) => {
            let callback = vm
                .find_callback(name, Arity::Unary)
                .ok_or_else(|| RuntimeError::UnknownUnaryOperator(name.clone()))?;
            callback(vm)
        }
        Instruction::CallBinary(name) => {
            let callback = vm
                .find_callback(name, Arity::Binary)
                .ok_or_else(|| RuntimeError::UnknownBinaryOperator(name.clone()))?;
            callback(vm)
        }
        Instruction::AssignTo(name) => {
            let value = vm.pop_value()?;
            vm.assign_variable(name, value);
            Ok(())
        }
        Instruction::AssignToLocal(name) => {
            let value = vm.pop_value()?;
            if let Some(scope) = vm.top_scope_mut() {
                scope.set_local(name, value);
            }
            Ok(())
        }
        Instruction::GetVariable(name) => {
            match vm.lookup_variable(name) {
                Some(value) => vm.push_value(value),
                None => {
                    if vm.reports_nil_returns() && vm.diagnostics_enabled(Severity::Verbose) {
                        vm.report(
                            DiagnosticCode::ReturningNil,
                            Some(location.clone()),
                            format!("variable '{}' not set, returning nil", name),
                        );
                    }
                    vm.push_value(Value::Nothing);
                }
            }
            Ok(())
        }
        Instruction::MakeArray(count) => {
            let mut elements = Vec::with_capacity(*count);
            for _ in 0..*count {
                elements.push(vm.pop_value()?);
            }
            elements.reverse();
            vm.push_value(Value::array(elements));
            Ok(())
        }
        Instruction::EndStatement => {
            if let Some(scope) = vm.top_scope_mut() {
                scope.work_clear();
            }
            Ok(())
        }
        // Marker for non-local control flow; higher-level operators give it
        // meaning
        Instruction::ScopeMark(_) => Ok(()),
    }
}

/// Report a statement-level error and resynchronize the top frame.
/// Warning-or-milder codes are reported without altering control flow.
fn handle_statement_error(vm: &mut Vm, err: &RuntimeError, location: Option<SourceLocation>) {
    vm.report(err.code(), location, err.to_string());
    if err.code().severity() >= Severity::Warning {
        return;
    }
    if let Some(scope) = vm.top_scope_mut() {
        scope.work_clear();
        if scope.aborts_on_error() {
            scope.clear_instructions();
        } else {
            scope.skip_to_next_statement();
        }
    }
}

/// Report the fatal diagnostic plus a stack trace, then unwind everything
/// and halt the machine.
fn fatal_unwind(vm: &mut Vm, err: &RuntimeError, location: Option<SourceLocation>) {
    vm.report(err.code(), location.clone(), err.to_string());
    let mut trace = String::from("stack trace:");
    for (level, scope) in vm.scopes().iter().enumerate().rev() {
        trace.push_str(&format!("\n  {}: {}", level, scope.name()));
        if let Some(current) = scope.current() {
            trace.push_str(&format!(" at {}", current));
        }
    }
    vm.report(DiagnosticCode::Stacktrace, location, trace);
    vm.unwind_all();
    vm.clear_results();
    vm.set_halted();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use sqf_core::{CollectingSink, Located};

    use crate::namespace::fold_name;

    fn machine() -> (Vm, Rc<CollectingSink>) {
        let sink = Rc::new(CollectingSink::new());
        (Vm::new(sink.clone()), sink)
    }

    fn located(instruction: Instruction) -> Located<Instruction> {
        Located::new(instruction, SourceLocation::new("test.sqf", 1, 0))
    }

    fn block(instructions: Vec<Instruction>) -> CodeBlock {
        CodeBlock::new(instructions.into_iter().map(located).collect())
    }

    fn register_add(vm: &mut Vm) {
        vm.registry_mut().register_binary("+", 6, |vm| {
            let right = vm.pop_scalar()?;
            let left = vm.pop_scalar()?;
            vm.push_value(Value::Scalar(left + right));
            Ok(())
        });
    }

    #[test]
    fn push_call_binary_leaves_result() {
        let (mut vm, _) = machine();
        register_add(&mut vm);
        let code = block(vec![
            Instruction::Push(Value::Scalar(1.0)),
            Instruction::Push(Value::Scalar(2.0)),
            Instruction::CallBinary("+".to_string()),
        ]);
        vm.push_root(&code, false);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Completed);
        assert_eq!(vm.result_values(), &[Value::Scalar(3.0)]);
    }

    #[test]
    fn assign_local_then_get() {
        let (mut vm, _) = machine();
        register_add(&mut vm);
        let code = block(vec![
            Instruction::Push(Value::Scalar(4.0)),
            Instruction::AssignToLocal("_x".to_string()),
            Instruction::EndStatement,
            Instruction::GetVariable("_x".to_string()),
            Instruction::Push(Value::Scalar(1.0)),
            Instruction::CallBinary("+".to_string()),
        ]);
        vm.push_root(&code, false);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Completed);
        assert_eq!(vm.result_values(), &[Value::Scalar(5.0)]);
        assert!(!vm.mission_namespace().borrow().contains("_x"));
    }

    #[test]
    fn make_array_preserves_source_order() {
        let (mut vm, _) = machine();
        let code = block(vec![
            Instruction::Push(Value::Scalar(1.0)),
            Instruction::Push(Value::Scalar(2.0)),
            Instruction::Push(Value::Scalar(3.0)),
            Instruction::MakeArray(3),
        ]);
        vm.push_root(&code, false);
        execute(&mut vm, None);
        let results = vm.result_values();
        assert_eq!(results.len(), 1);
        let array = results[0].as_array().unwrap();
        assert_eq!(
            &*array.borrow(),
            &[Value::Scalar(1.0), Value::Scalar(2.0), Value::Scalar(3.0)]
        );
    }

    #[test]
    fn end_statement_clears_work() {
        let (mut vm, _) = machine();
        let code = block(vec![
            Instruction::Push(Value::Scalar(1.0)),
            Instruction::EndStatement,
            Instruction::Push(Value::Scalar(2.0)),
        ]);
        vm.push_root(&code, false);
        execute(&mut vm, None);
        assert_eq!(vm.result_values(), &[Value::Scalar(2.0)]);
    }

    #[test]
    fn get_missing_variable_pushes_nothing() {
        let (mut vm, _) = machine();
        let code = block(vec![Instruction::GetVariable("_missing".to_string())]);
        vm.push_root(&code, false);
        execute(&mut vm, None);
        assert_eq!(vm.result_values(), &[Value::Nothing]);
    }

    #[test]
    fn missing_variable_verbose_diagnostic_when_enabled() {
        let (mut vm, sink) = machine();
        vm.set_report_nil_returns(true);
        let code = block(vec![Instruction::GetVariable("ghost".to_string())]);
        vm.push_root(&code, false);
        execute(&mut vm, None);
        assert_eq!(sink.count_of(DiagnosticCode::ReturningNil), 1);
    }

    #[test]
    fn unknown_operator_aborts_statement_and_continues() {
        let (mut vm, sink) = machine();
        let code = block(vec![
            Instruction::Push(Value::Scalar(1.0)),
            Instruction::Push(Value::Scalar(2.0)),
            Instruction::CallBinary("frobnicate".to_string()),
            Instruction::EndStatement,
            Instruction::Push(Value::Scalar(9.0)),
        ]);
        vm.push_root(&code, false);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Completed);
        assert_eq!(sink.count_of(DiagnosticCode::UnknownBinaryOperator), 1);
        // The statement after the failure still ran
        assert_eq!(vm.result_values(), &[Value::Scalar(9.0)]);
    }

    #[test]
    fn abort_on_error_frame_drops_remaining_statements() {
        let (mut vm, _) = machine();
        let mut scope = Scope::new("strict", vm.mission_namespace()).abort_on_error();
        let code = block(vec![
            Instruction::CallNular("nope".to_string()),
            Instruction::EndStatement,
            Instruction::Push(Value::Scalar(1.0)),
        ]);
        scope.enqueue_code(&code);
        vm.push_scope(scope);
        execute(&mut vm, None);
        assert_eq!(vm.result_values(), &[] as &[Value]);
    }

    #[test]
    fn instruction_cap_halts_fatally() {
        let (mut vm, sink) = machine();
        vm.set_max_instructions(Some(4));
        let code = block(vec![
            Instruction::Push(Value::Scalar(1.0)),
            Instruction::Push(Value::Scalar(2.0)),
            Instruction::Push(Value::Scalar(3.0)),
            Instruction::Push(Value::Scalar(4.0)),
            Instruction::Push(Value::Scalar(5.0)),
        ]);
        vm.push_root(&code, false);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Halted);
        assert!(vm.is_halted());
        assert_eq!(vm.scope_depth(), 0);
        assert_eq!(
            sink.count_of(DiagnosticCode::MaximumInstructionCountReached),
            1
        );
        assert_eq!(sink.count_of(DiagnosticCode::Stacktrace), 1);
    }

    #[test]
    fn shutdown_unwinds_between_instructions() {
        let (mut vm, _) = machine();
        vm.registry_mut().register_nular("shutMeDown", |vm| {
            vm.request_shutdown();
            Ok(())
        });
        let code = block(vec![
            Instruction::CallNular("shutMeDown".to_string()),
            Instruction::Push(Value::Scalar(1.0)),
        ]);
        vm.push_root(&code, false);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Shutdown);
        assert_eq!(vm.scope_depth(), 0);
    }

    #[test]
    fn suspension_returns_control() {
        let (mut vm, _) = machine();
        vm.registry_mut().register_nular("yield", |vm| {
            vm.suspend(std::time::Duration::from_millis(20))
        });
        let code = block(vec![
            Instruction::CallNular("yield".to_string()),
            Instruction::Push(Value::Scalar(1.0)),
        ]);
        vm.push_root(&code, true);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Suspended);
        // Deadline passes; the machine resumes where it left off
        std::thread::sleep(std::time::Duration::from_millis(30));
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Completed);
        assert_eq!(vm.result_values(), &[Value::Scalar(1.0)]);
    }

    #[test]
    fn suspension_in_unscheduled_frame_is_an_error() {
        let (mut vm, sink) = machine();
        vm.registry_mut().register_nular("yield", |vm| {
            vm.suspend(std::time::Duration::from_millis(1))
        });
        let code = block(vec![Instruction::CallNular("yield".to_string())]);
        vm.push_root(&code, false);
        assert_eq!(execute(&mut vm, None), ExecuteOutcome::Completed);
        assert_eq!(
            sink.count_of(DiagnosticCode::SuspensionInUnscheduledEnvironment),
            1
        );
    }

    #[test]
    fn run_code_returns_last_statement_value() {
        let (mut vm, _) = machine();
        register_add(&mut vm);
        vm.push_scope(Scope::new("caller", vm.mission_namespace()));
        let code = block(vec![
            Instruction::Push(Value::Scalar(2.0)),
            Instruction::Push(Value::Scalar(3.0)),
            Instruction::CallBinary("+".to_string()),
        ]);
        let result = run_code(&mut vm, &code, "inline").unwrap();
        assert_eq!(result, Value::Scalar(5.0));
        assert_eq!(vm.scope_depth(), 1);
    }

    #[test]
    fn run_code_empty_block_yields_nothing() {
        let (mut vm, _) = machine();
        vm.push_scope(Scope::new("caller", vm.mission_namespace()));
        let result = run_code(&mut vm, &block(vec![]), "inline").unwrap();
        assert_eq!(result, Value::Nothing);
    }

    #[test]
    fn case_insensitive_resolution_across_set_and_get() {
        let (mut vm, _) = machine();
        let code = block(vec![
            Instruction::Push(Value::Scalar(8.0)),
            Instruction::AssignTo("MyGlobal".to_string()),
            Instruction::EndStatement,
            Instruction::GetVariable("MYGLOBAL".to_string()),
        ]);
        vm.push_root(&code, false);
        execute(&mut vm, None);
        assert_eq!(vm.result_values(), &[Value::Scalar(8.0)]);
        assert!(vm
            .mission_namespace()
            .borrow()
            .contains(&fold_name("myglobal")));
    }

    #[test]
    fn nested_scope_result_propagates() {
        let (mut vm, _) = machine();
        vm.push_scope(Scope::new("outer", vm.mission_namespace()));
        let mut inner = Scope::new("inner", vm.mission_namespace());
        inner.enqueue_code(&block(vec![Instruction::Push(Value::Scalar(6.0))]));
        vm.push_scope(inner);
        execute(&mut vm, None);
        // Outer frame had no instructions, so it popped too; its work stack
        // carried the propagated value
        assert_eq!(vm.result_values(), &[Value::Scalar(6.0)]);
    }
}
