//! Debugger surface for the SQF virtual machine.
//!
//! Models the JSON protocol a debugging front-end speaks (status updates,
//! call-stack dumps, variable queries, breakpoint management) and provides
//! [`QueueDebugger`], an implementation of the VM's attach interface driven
//! by in-memory request and response queues. Transports (sockets, pipes) are
//! a host concern: they pump JSON into [`QueueDebugger::push_request_json`]
//! and drain [`QueueDebugger::pop_response_json`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use sqf_core::SourceLocation;
use sqf_vm::{BreakpointSet, Debugger, Vm};

/// Machine status as reported to the front-end.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MachineStatus {
    Na,
    Halt,
    Running,
    Done,
}

/// One visible variable binding.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct VariableValue {
    pub name: String,
    /// Rendered value; absent when the query missed.
    pub value: Option<String>,
}

/// One call-stack frame as shown to the front-end.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct FrameInfo {
    pub lvl: usize,
    pub scopename: String,
    pub namespace: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub variables: Vec<VariableValue>,
}

/// Where a variable query resolves: a frame depth (0 is the top frame,
/// negative values walk outward) or a namespace by name.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableScope {
    Frame(i64),
    Namespace(String),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct VariableQuery {
    pub name: String,
    pub scope: VariableScope,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct BreakpointSpec {
    pub file: String,
    pub line: u32,
}

/// Commands the front-end sends.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "kebab-case")]
pub enum Request {
    GetCallstack,
    GetVariable(Vec<VariableQuery>),
    SetBreakpoint(BreakpointSpec),
    RemoveBreakpoint(BreakpointSpec),
    Control { status: ControlCommand },
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlCommand {
    Run,
    Shutdown,
}

/// Messages sent back to the front-end.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(tag = "mode", content = "data", rename_all = "lowercase")]
pub enum Response {
    Status(MachineStatus),
    Message(String),
    Callstack(Vec<FrameInfo>),
    Variables(Vec<VariableValue>),
}

/// Attach-interface implementation over in-memory queues.
///
/// The engine pumps `check` between instructions; every queued request is
/// answered onto the response queue against the live machine state. The
/// type is a cheap cloneable handle, so the host keeps one clone for
/// pushing requests and draining responses while the machine owns another.
#[derive(Clone, Default)]
pub struct QueueDebugger {
    inner: Rc<Shared>,
}

#[derive(Default)]
struct Shared {
    incoming: RefCell<VecDeque<Request>>,
    outgoing: RefCell<VecDeque<Response>>,
    breakpoints: RefCell<BreakpointSet>,
}

impl QueueDebugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_request(&self, request: Request) {
        self.inner.incoming.borrow_mut().push_back(request);
    }

    pub fn push_request_json(&self, json: &str) -> Result<(), serde_json::Error> {
        let request = serde_json::from_str(json)?;
        self.push_request(request);
        Ok(())
    }

    pub fn pop_response(&self) -> Option<Response> {
        self.inner.outgoing.borrow_mut().pop_front()
    }

    pub fn pop_response_json(&self) -> Option<String> {
        self.pop_response()
            .map(|r| serde_json::to_string(&r).expect("responses serialize"))
    }

    pub fn add_breakpoint(&self, file: impl Into<String>, line: u32) {
        self.inner.breakpoints.borrow_mut().add(file, line);
    }

    pub fn remove_breakpoint(&self, file: &str, line: u32) {
        self.inner.breakpoints.borrow_mut().remove(file, line);
    }

    fn respond(&self, response: Response) {
        self.inner.outgoing.borrow_mut().push_back(response);
    }

    fn callstack_snapshot(vm: &Vm) -> Vec<FrameInfo> {
        vm.scopes()
            .iter()
            .enumerate()
            .map(|(lvl, scope)| {
                let current = scope.current();
                FrameInfo {
                    lvl,
                    scopename: scope.name().to_string(),
                    namespace: scope.namespace().borrow().name().to_string(),
                    file: current.map(|l| l.path().to_string()),
                    line: current.map(|l| l.line()),
                    column: current.map(|l| l.col()),
                    variables: scope
                        .locals_snapshot()
                        .into_iter()
                        .map(|(name, value)| VariableValue {
                            name,
                            value: Some(value.as_string()),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    fn query_variables(vm: &Vm, queries: &[VariableQuery]) -> Vec<VariableValue> {
        queries
            .iter()
            .map(|query| {
                let value = match &query.scope {
                    VariableScope::Frame(depth) => {
                        let scopes = vm.scopes();
                        let index = scopes.len() as i64 - 1 + depth;
                        if index < 0 {
                            None
                        } else {
                            scopes
                                .get(index as usize)
                                .and_then(|s| s.get_local(&query.name))
                        }
                    }
                    VariableScope::Namespace(name) => vm
                        .namespace_by_name(name)
                        .and_then(|ns| ns.borrow().get(&query.name)),
                };
                VariableValue {
                    name: query.name.clone(),
                    value: value.map(|v| v.as_string()),
                }
            })
            .collect()
    }
}

impl Debugger for QueueDebugger {
    fn check(&mut self, vm: &mut Vm) {
        loop {
            let request = self.inner.incoming.borrow_mut().pop_front();
            let Some(request) = request else { break };
            match request {
                Request::GetCallstack => {
                    self.respond(Response::Callstack(Self::callstack_snapshot(vm)));
                }
                Request::GetVariable(queries) => {
                    self.respond(Response::Variables(Self::query_variables(vm, &queries)));
                }
                Request::SetBreakpoint(spec) => {
                    self.add_breakpoint(spec.file, spec.line);
                }
                Request::RemoveBreakpoint(spec) => {
                    self.remove_breakpoint(&spec.file, spec.line);
                }
                Request::Control { status } => match status {
                    ControlCommand::Run => {}
                    ControlCommand::Shutdown => vm.request_shutdown(),
                },
            }
        }
    }

    fn error(&mut self, _vm: &mut Vm, _location: Option<&SourceLocation>, message: &str) {
        self.respond(Response::Status(MachineStatus::Halt));
        self.respond(Response::Message(message.to_string()));
    }

    fn stop(&mut self, _vm: &mut Vm) -> bool {
        self.respond(Response::Status(MachineStatus::Done));
        true
    }

    fn has_breakpoint(&self, location: &SourceLocation) -> bool {
        self.inner.breakpoints.borrow().matches(location)
    }
}
