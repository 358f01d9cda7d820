use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use sqf_core::{Located, SourceLocation};

use crate::instruction::{CodeBlock, Instruction};
use crate::namespace::{fold_name, NamespaceRef};
use crate::value::Value;

/// One call frame.
///
/// A scope carries its own instruction queue and a statement-local work
/// stack. Unqualified globals resolve against the bound namespace.
#[derive(Clone, Debug)]
pub struct Scope {
    name: String,
    namespace: NamespaceRef,
    locals: HashMap<String, Value>,
    instructions: VecDeque<Located<Instruction>>,
    work: Vec<Value>,
    current: Option<SourceLocation>,
    scheduled: bool,
    abort_on_error: bool,
}

impl Scope {
    pub fn new(name: impl Into<String>, namespace: NamespaceRef) -> Self {
        Self {
            name: name.into(),
            namespace,
            locals: HashMap::new(),
            instructions: VecDeque::new(),
            work: Vec::new(),
            current: None,
            scheduled: false,
            abort_on_error: false,
        }
    }

    /// Permit suspension inside this frame.
    pub fn scheduled(mut self) -> Self {
        self.scheduled = true;
        self
    }

    /// Make error-level diagnostics abort the whole frame instead of just
    /// the current statement.
    pub fn abort_on_error(mut self) -> Self {
        self.abort_on_error = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> NamespaceRef {
        Rc::clone(&self.namespace)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    pub fn aborts_on_error(&self) -> bool {
        self.abort_on_error
    }

    // ------------------------------------------------------------------
    // Instruction queue
    // ------------------------------------------------------------------

    /// Append a code block's instructions to the pending queue.
    pub fn enqueue_code(&mut self, code: &CodeBlock) {
        self.instructions.extend(code.instructions().iter().cloned());
    }

    pub fn enqueue(&mut self, instruction: Located<Instruction>) {
        self.instructions.push_back(instruction);
    }

    pub fn dequeue(&mut self) -> Option<Located<Instruction>> {
        self.instructions.pop_front()
    }

    /// Location of the next pending instruction.
    pub fn peek_location(&self) -> Option<&SourceLocation> {
        self.instructions.front().map(|i| i.location())
    }

    pub fn has_instructions(&self) -> bool {
        !self.instructions.is_empty()
    }

    /// Drop pending instructions up to and including the next statement
    /// boundary; used when a statement aborts on error.
    pub fn skip_to_next_statement(&mut self) {
        while let Some(instruction) = self.instructions.pop_front() {
            if matches!(*instruction, Instruction::EndStatement) {
                break;
            }
        }
    }

    /// Drop everything still pending in this frame.
    pub fn clear_instructions(&mut self) {
        self.instructions.clear();
    }

    // ------------------------------------------------------------------
    // Locals
    // ------------------------------------------------------------------

    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.locals.get(&fold_name(name)).cloned()
    }

    pub fn set_local(&mut self, name: &str, value: Value) {
        self.locals.insert(fold_name(name), value);
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.locals.contains_key(&fold_name(name))
    }

    pub fn locals_snapshot(&self) -> HashMap<String, Value> {
        self.locals.clone()
    }

    // ------------------------------------------------------------------
    // Work stack
    // ------------------------------------------------------------------

    pub fn work_push(&mut self, value: Value) {
        self.work.push(value);
    }

    pub fn work_pop(&mut self) -> Option<Value> {
        self.work.pop()
    }

    pub fn work(&self) -> &[Value] {
        &self.work
    }

    pub fn work_clear(&mut self) {
        self.work.clear();
    }

    pub fn take_work(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.work)
    }

    // ------------------------------------------------------------------
    // Diagnostics cursor
    // ------------------------------------------------------------------

    pub fn current(&self) -> Option<&SourceLocation> {
        self.current.as_ref()
    }

    pub fn set_current(&mut self, location: SourceLocation) {
        self.current = Some(location);
    }
}
