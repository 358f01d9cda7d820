//! The debugger attach interface driven through the queue implementation.

use super::runtime;
use sqf_debugger::{
    MachineStatus, QueueDebugger, Request, Response, VariableQuery, VariableScope,
};
use sqf_vm::{ExecuteOutcome, Value};

#[test]
fn breakpoint_pauses_and_resumes() {
    let (mut runtime, _) = runtime();
    let debugger = QueueDebugger::new();
    debugger.add_breakpoint("<t>", 2);
    runtime.attach_debugger(Box::new(debugger));

    let code = runtime
        .parse_source("<t>", "_x = 1;\n_y = 2;\n_x + _y;")
        .unwrap();
    match runtime.execute(&code) {
        ExecuteOutcome::Paused(location) => {
            assert_eq!(location.path(), "<t>");
            assert_eq!(location.line(), 2);
        }
        other => panic!("expected a pause, got {:?}", other),
    }

    assert_eq!(runtime.resume(), ExecuteOutcome::Completed);
    assert_eq!(runtime.vm().result_values(), &[Value::Scalar(3.0)]);
}

#[test]
fn breakpoint_requests_over_the_wire() {
    let (mut runtime, _) = runtime();
    let debugger = QueueDebugger::new();
    debugger
        .push_request_json(r#"{"mode":"set-breakpoint","data":{"file":"<t>","line":2}}"#)
        .unwrap();
    runtime.attach_debugger(Box::new(debugger));

    let code = runtime
        .parse_source("<t>", "_x = 1;\n_y = 2;\n_x + _y;")
        .unwrap();
    // The first check() installs the breakpoint before line 1 executes
    match runtime.execute(&code) {
        ExecuteOutcome::Paused(location) => assert_eq!(location.line(), 2),
        other => panic!("expected a pause, got {:?}", other),
    }
}

#[test]
fn callstack_and_variable_queries_while_paused() {
    let (mut runtime, _) = runtime();
    let debugger = QueueDebugger::new();
    let handle = debugger.clone();
    debugger.add_breakpoint("<t>", 2);
    runtime.attach_debugger(Box::new(debugger));

    let code = runtime.parse_source("<t>", "_x = 41;\n_x + 1;").unwrap();
    assert!(matches!(runtime.execute(&code), ExecuteOutcome::Paused(_)));

    // While paused, the host queues requests; the next resume answers them
    // before the first instruction runs
    handle.push_request(Request::GetCallstack);
    handle.push_request(Request::GetVariable(vec![VariableQuery {
        name: "_x".to_string(),
        scope: VariableScope::Frame(0),
    }]));
    assert_eq!(runtime.resume(), ExecuteOutcome::Completed);
    assert_eq!(runtime.vm().result_values(), &[Value::Scalar(42.0)]);

    let mut callstack = None;
    let mut variables = None;
    let mut done = false;
    while let Some(response) = handle.pop_response() {
        match response {
            Response::Callstack(frames) => callstack = Some(frames),
            Response::Variables(values) => variables = Some(values),
            Response::Status(MachineStatus::Done) => done = true,
            _ => {}
        }
    }

    let callstack = callstack.expect("callstack answered");
    assert_eq!(callstack.len(), 1);
    assert_eq!(callstack[0].scopename, "root");
    assert_eq!(callstack[0].namespace, "missionNamespace");
    assert_eq!(callstack[0].file.as_deref(), Some("<t>"));

    let variables = variables.expect("variables answered");
    assert_eq!(variables[0].name, "_x");
    assert_eq!(variables[0].value.as_deref(), Some("41"));

    assert!(done, "stop() reported completion");
}

#[test]
fn shutdown_control_command() {
    let (mut runtime, _) = runtime();
    let debugger = QueueDebugger::new();
    let handle = debugger.clone();
    debugger.add_breakpoint("<t>", 2);
    runtime.attach_debugger(Box::new(debugger));

    let code = runtime
        .parse_source("<t>", "_x = 1;\n_y = 2;\n_x + _y;")
        .unwrap();
    assert!(matches!(runtime.execute(&code), ExecuteOutcome::Paused(_)));

    handle.push_request(Request::Control {
        status: sqf_debugger::ControlCommand::Shutdown,
    });
    assert_eq!(runtime.resume(), ExecuteOutcome::Shutdown);
    assert_eq!(runtime.vm().scope_depth(), 0);
}

#[test]
fn errors_reach_the_debugger() {
    let (mut runtime, _) = runtime();
    let debugger = QueueDebugger::new();
    let handle = debugger.clone();
    runtime.attach_debugger(Box::new(debugger));

    let code = runtime
        .parse_assembly_source("<t>", "callNular ghost;")
        .unwrap();
    runtime.execute(&code);

    let mut halted = false;
    let mut message = None;
    while let Some(response) = handle.pop_response() {
        match response {
            Response::Status(MachineStatus::Halt) => halted = true,
            Response::Message(text) => message = Some(text),
            _ => {}
        }
    }
    assert!(halted);
    assert!(message.unwrap().contains("ghost"));
}
