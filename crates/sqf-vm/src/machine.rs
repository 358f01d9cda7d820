use std::rc::Rc;
use std::time::{Duration, Instant};

use sqf_core::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity, SourceLocation};

use crate::error::RuntimeError;
use crate::instruction::CodeBlock;
use crate::namespace::{Namespace, NamespaceRef};
use crate::registry::{Arity, OperatorCallback, OperatorRegistry};
use crate::scope::Scope;
use crate::value::{ArrayRef, Value};

/// The virtual machine.
///
/// Owns the call stack, the four persistent namespaces, the operator
/// registry and the engine configuration. One instance drives one script
/// context at a time; namespaces outlive individual scripts.
pub struct Vm {
    call_stack: Vec<Scope>,
    mission: NamespaceRef,
    ui: NamespaceRef,
    profile: NamespaceRef,
    parsing: NamespaceRef,
    registry: OperatorRegistry,
    sink: Rc<dyn DiagnosticSink>,
    max_instructions: Option<u64>,
    executed: u64,
    suspended_until: Option<Instant>,
    halted: bool,
    shutdown_requested: bool,
    report_nil_returns: bool,
    pub(crate) break_resume: Option<SourceLocation>,
    last_work: Vec<Value>,
}

impl Vm {
    pub fn new(sink: Rc<dyn DiagnosticSink>) -> Self {
        Self {
            call_stack: Vec::new(),
            mission: Namespace::shared("missionNamespace"),
            ui: Namespace::shared("uiNamespace"),
            profile: Namespace::shared("profileNamespace"),
            parsing: Namespace::shared("parsingNamespace"),
            registry: OperatorRegistry::new(),
            sink,
            max_instructions: None,
            executed: 0,
            suspended_until: None,
            halted: false,
            shutdown_requested: false,
            report_nil_returns: false,
            break_resume: None,
            last_work: Vec::new(),
        }
    }

    // ------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------

    /// Cap the total number of executed instructions; exceeding it halts the
    /// machine fatally.
    pub fn set_max_instructions(&mut self, cap: Option<u64>) {
        self.max_instructions = cap;
    }

    pub fn max_instructions(&self) -> Option<u64> {
        self.max_instructions
    }

    /// Report a verbose diagnostic whenever variable lookup returns nothing.
    pub fn set_report_nil_returns(&mut self, enabled: bool) {
        self.report_nil_returns = enabled;
    }

    pub fn reports_nil_returns(&self) -> bool {
        self.report_nil_returns
    }

    // ------------------------------------------------------------------
    // Namespaces
    // ------------------------------------------------------------------

    pub fn mission_namespace(&self) -> NamespaceRef {
        Rc::clone(&self.mission)
    }

    pub fn ui_namespace(&self) -> NamespaceRef {
        Rc::clone(&self.ui)
    }

    pub fn profile_namespace(&self) -> NamespaceRef {
        Rc::clone(&self.profile)
    }

    pub fn parsing_namespace(&self) -> NamespaceRef {
        Rc::clone(&self.parsing)
    }

    /// Look a namespace up by its display name.
    pub fn namespace_by_name(&self, name: &str) -> Option<NamespaceRef> {
        match name {
            "missionNamespace" => Some(self.mission_namespace()),
            "uiNamespace" => Some(self.ui_namespace()),
            "profileNamespace" => Some(self.profile_namespace()),
            "parsingNamespace" => Some(self.parsing_namespace()),
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Operator registry
    // ------------------------------------------------------------------

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    /// Clone the callback out of the registry so it can be invoked with the
    /// machine borrowed mutably.
    pub(crate) fn find_callback(&self, name: &str, arity: Arity) -> Option<OperatorCallback> {
        self.registry.lookup(name, arity).map(|e| e.callback())
    }

    // ------------------------------------------------------------------
    // Call stack
    // ------------------------------------------------------------------

    pub fn push_scope(&mut self, scope: Scope) {
        self.call_stack.push(scope);
    }

    /// Pop the top frame. The popped frame's last work value (or nothing)
    /// propagates to the caller's work stack; the final frame's whole work
    /// stack is retained for host inspection.
    pub fn pop_scope(&mut self) -> Option<Scope> {
        let mut scope = self.call_stack.pop()?;
        if self.call_stack.is_empty() {
            self.last_work = scope.take_work();
        } else {
            let result = scope.work_pop().unwrap_or(Value::Nothing);
            if let Some(parent) = self.call_stack.last_mut() {
                parent.work_push(result);
            }
        }
        Some(scope)
    }

    pub fn scope_depth(&self) -> usize {
        self.call_stack.len()
    }

    pub fn top_scope(&self) -> Option<&Scope> {
        self.call_stack.last()
    }

    pub fn top_scope_mut(&mut self) -> Option<&mut Scope> {
        self.call_stack.last_mut()
    }

    /// Frames bottom to top, for stack traces and the debugger.
    pub fn scopes(&self) -> &[Scope] {
        &self.call_stack
    }

    /// Push a root frame bound to the mission namespace and queue a code
    /// block into it.
    pub fn push_root(&mut self, code: &CodeBlock, scheduled: bool) {
        let mut scope = Scope::new("root", self.mission_namespace());
        if scheduled {
            scope = scope.scheduled();
        }
        scope.enqueue_code(code);
        self.push_scope(scope);
    }

    /// The namespace the current frame resolves unqualified globals
    /// against; the mission namespace when no frame is live.
    pub fn current_namespace(&self) -> NamespaceRef {
        self.top_scope()
            .map(|s| s.namespace())
            .unwrap_or_else(|| self.mission_namespace())
    }

    /// Location of the instruction currently executing.
    pub fn current_location(&self) -> Option<SourceLocation> {
        self.top_scope().and_then(|s| s.current().cloned())
    }

    // ------------------------------------------------------------------
    // Variable resolution
    // ------------------------------------------------------------------

    /// Walk frames top-down; names not starting with `_` fall through to
    /// the top frame's bound namespace.
    pub fn lookup_variable(&self, name: &str) -> Option<Value> {
        for scope in self.call_stack.iter().rev() {
            if let Some(value) = scope.get_local(name) {
                return Some(value);
            }
        }
        if name.starts_with('_') {
            return None;
        }
        self.current_namespace().borrow().get(name)
    }

    /// Mutate the innermost frame holding the name; on miss, bind `_`-names
    /// in the top frame and others in the bound namespace.
    pub fn assign_variable(&mut self, name: &str, value: Value) {
        for scope in self.call_stack.iter_mut().rev() {
            if scope.has_local(name) {
                scope.set_local(name, value);
                return;
            }
        }
        if name.starts_with('_') {
            if let Some(top) = self.call_stack.last_mut() {
                top.set_local(name, value);
            }
        } else {
            self.current_namespace().borrow_mut().set(name, value);
        }
    }

    // ------------------------------------------------------------------
    // Work stack access for operator callbacks
    // ------------------------------------------------------------------

    pub fn push_value(&mut self, value: Value) {
        if let Some(scope) = self.top_scope_mut() {
            scope.work_push(value);
        }
    }

    pub fn pop_value(&mut self) -> Result<Value, RuntimeError> {
        self.top_scope_mut()
            .and_then(|s| s.work_pop())
            .ok_or(RuntimeError::WorkStackUnderflow)
    }

    pub fn pop_scalar(&mut self) -> Result<f64, RuntimeError> {
        let value = self.pop_value()?;
        value.as_scalar().ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "SCALAR",
            got: value.type_name(),
        })
    }

    pub fn pop_boolean(&mut self) -> Result<bool, RuntimeError> {
        let value = self.pop_value()?;
        value.as_bool().ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "BOOL",
            got: value.type_name(),
        })
    }

    pub fn pop_string(&mut self) -> Result<Rc<str>, RuntimeError> {
        let value = self.pop_value()?;
        match value {
            Value::String(s) => Ok(s),
            other => Err(RuntimeError::TypeMismatch {
                expected: "STRING",
                got: other.type_name(),
            }),
        }
    }

    pub fn pop_array(&mut self) -> Result<ArrayRef, RuntimeError> {
        let value = self.pop_value()?;
        value.as_array().ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "ARRAY",
            got: value.type_name(),
        })
    }

    pub fn pop_code(&mut self) -> Result<Rc<CodeBlock>, RuntimeError> {
        let value = self.pop_value()?;
        value.as_code().ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "CODE",
            got: value.type_name(),
        })
    }

    /// Work-stack values left behind by the last fully popped frame.
    pub fn result_values(&self) -> &[Value] {
        &self.last_work
    }

    pub fn clear_results(&mut self) {
        self.last_work.clear();
    }

    // ------------------------------------------------------------------
    // Suspension, shutdown, halt
    // ------------------------------------------------------------------

    /// Request suspension for `duration`. Legal only in scheduled frames.
    pub fn suspend(&mut self, duration: Duration) -> Result<(), RuntimeError> {
        let scheduled = self.top_scope().map(|s| s.is_scheduled()).unwrap_or(false);
        if !scheduled {
            return Err(RuntimeError::SuspensionInUnscheduledEnvironment);
        }
        self.suspended_until = Some(Instant::now() + duration);
        Ok(())
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_until
            .map(|deadline| Instant::now() < deadline)
            .unwrap_or(false)
    }

    pub(crate) fn suspension_pending(&self) -> bool {
        self.suspended_until.is_some()
    }

    pub(crate) fn clear_suspension(&mut self) {
        self.suspended_until = None;
    }

    /// Ask the engine to unwind at the next instruction boundary.
    pub fn request_shutdown(&mut self) {
        self.shutdown_requested = true;
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown_requested
    }

    pub(crate) fn clear_shutdown(&mut self) {
        self.shutdown_requested = false;
    }

    pub(crate) fn unwind_all(&mut self) {
        while self.pop_scope().is_some() {}
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn set_halted(&mut self) {
        self.halted = true;
    }

    // ------------------------------------------------------------------
    // Instruction accounting
    // ------------------------------------------------------------------

    /// Count one instruction; errors when the configured cap is exceeded.
    pub(crate) fn count_instruction(&mut self) -> Result<(), RuntimeError> {
        self.executed += 1;
        match self.max_instructions {
            Some(cap) if self.executed > cap => Err(RuntimeError::MaximumInstructionCountReached),
            _ => Ok(()),
        }
    }

    pub fn executed_instructions(&self) -> u64 {
        self.executed
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    pub fn sink(&self) -> &dyn DiagnosticSink {
        self.sink.as_ref()
    }

    pub fn report(
        &self,
        code: DiagnosticCode,
        location: Option<SourceLocation>,
        message: impl Into<String>,
    ) {
        self.sink.report(Diagnostic::new(code, location, message));
    }

    pub(crate) fn diagnostics_enabled(&self, severity: Severity) -> bool {
        self.sink.is_enabled(severity)
    }
}
