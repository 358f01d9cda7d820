use std::fmt;

use sqf_core::Located;

use crate::value::Value;

/// One machine instruction.
///
/// The set is closed; everything else the language does is expressed through
/// operators. Instructions are immutable once built and carry their source
/// location through [`Located`].
#[derive(Clone, PartialEq, Debug)]
pub enum Instruction {
    /// Push a literal value onto the work stack.
    Push(Value),
    /// Invoke a zero-argument operator by name.
    CallNular(String),
    /// Pop one operand, invoke a unary operator.
    CallUnary(String),
    /// Pop two operands (right then left), invoke a binary operator.
    CallBinary(String),
    /// Pop a value and assign through the lookup rules.
    AssignTo(String),
    /// Pop a value and bind it in the top frame unconditionally.
    AssignToLocal(String),
    /// Resolve a variable and push it (nothing when absent).
    GetVariable(String),
    /// Pop `n` values and assemble an array preserving source order.
    MakeArray(usize),
    /// Statement boundary; the work stack is discarded.
    EndStatement,
    /// Marker for non-local control flow; a no-op in the basic engine.
    ScopeMark(String),
}

impl fmt::Display for Instruction {
    /// The assembly surface form, one instruction per line, without the
    /// trailing semicolon.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(value) => match value {
                Value::Nothing => write!(f, "push NOTHING"),
                Value::Boolean(v) => write!(f, "push BOOL {}", v),
                Value::Scalar(v) => write!(f, "push SCALAR {}", v),
                Value::String(_) => write!(f, "push STRING {}", value),
                other => write!(f, "push {} {}", other.type_name(), other),
            },
            Instruction::CallNular(name) => write!(f, "callNular {}", name),
            Instruction::CallUnary(name) => write!(f, "callUnary {}", name),
            Instruction::CallBinary(name) => write!(f, "callBinary {}", name),
            Instruction::AssignTo(name) => write!(f, "assignTo {}", name),
            Instruction::AssignToLocal(name) => write!(f, "assignToLocal {}", name),
            Instruction::GetVariable(name) => write!(f, "getVariable {}", name),
            Instruction::MakeArray(n) => write!(f, "makeArray {}", n),
            Instruction::EndStatement => write!(f, "endStatement"),
            Instruction::ScopeMark(name) => write!(f, "scopeMark {}", name),
        }
    }
}

/// A shareable, immutable instruction sequence with per-instruction source
/// locations and, when it came from source text, the text itself.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct CodeBlock {
    instructions: Vec<Located<Instruction>>,
    source: Option<String>,
}

impl CodeBlock {
    pub fn new(instructions: Vec<Located<Instruction>>) -> Self {
        Self {
            instructions,
            source: None,
        }
    }

    pub fn with_source(instructions: Vec<Located<Instruction>>, source: impl Into<String>) -> Self {
        Self {
            instructions,
            source: Some(source.into()),
        }
    }

    pub fn instructions(&self) -> &[Located<Instruction>] {
        &self.instructions
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Serialize to the assembly surface, one instruction per line.
    pub fn to_assembly(&self) -> String {
        let mut out = String::new();
        for instruction in &self.instructions {
            out.push_str(&instruction.to_string());
            out.push_str(";\n");
        }
        out
    }
}

impl fmt::Display for CodeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{{{}}}", source),
            None => write!(f, "{{...}}"),
        }
    }
}
