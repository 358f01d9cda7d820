//! Parser front-ends for the SQF virtual machine.
//!
//! Two grammars produce the same linear instruction form:
//! - [`parse_sqf`]: the high-level expression grammar, with operator
//!   precedence taken from the machine's registry
//! - [`parse_assembly`]: one instruction per line, round-trip exact with
//!   [`sqf_vm::CodeBlock::to_assembly`]
//!
//! Both take the preprocessor's position map so every instruction points at
//! its original file, line and column; both return either a code block or
//! the diagnostics that halted the translation unit.

mod assembly;
mod lexer;
mod sqf;

pub use assembly::parse_assembly;
pub use lexer::{Lexer, Token, TokenKind};
pub use sqf::parse_sqf;
