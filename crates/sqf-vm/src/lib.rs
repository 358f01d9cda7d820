//! SQF virtual machine.
//!
//! The machine executes a closed set of linear instructions over a two-stack
//! model: a call stack of scopes, each with its own instruction queue and
//! statement-local work stack, and four persistent namespaces. Operators are
//! resolved by name and arity through a registry the host populates; the
//! engine itself knows nothing about individual commands.
//!
//! # Architecture
//!
//! - [`Value`]: tagged runtime values; arrays, code and namespaces are
//!   reference-shared
//! - [`Instruction`] / [`CodeBlock`]: the instruction set and its container
//! - [`Scope`] and namespaces: variable storage and the call stack
//! - [`OperatorRegistry`]: `(name, arity)` to callback, with precedence
//!   metadata for the parser
//! - [`execute`]: the interpreter loop
//! - [`Debugger`]: optional attach interface consulted between instructions

mod debug;
mod error;
mod execute;
mod instruction;
mod machine;
mod namespace;
mod registry;
mod scope;
mod value;

pub use debug::{BreakpointSet, Debugger};
pub use error::RuntimeError;
pub use execute::{execute, run_code, run_code_with, ExecuteOutcome};
pub use instruction::{CodeBlock, Instruction};
pub use machine::Vm;
pub use namespace::{fold_name, Namespace, NamespaceRef};
pub use registry::{Arity, OperatorCallback, OperatorEntry, OperatorRegistry};
pub use scope::Scope;
pub use value::{ArrayRef, ObjectHandle, Value};
