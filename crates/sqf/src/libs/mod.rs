//! The built-in operator library.
//!
//! Each module registers one concern's commands into the operator registry.
//! Binary precedence: `||` 1, `&&` 2, comparisons 3, general commands 4,
//! `else` 5, additive 6, multiplicative 7, `^` 8.

pub mod arith;
pub mod arrays;
pub mod diag;
pub mod flow;
pub mod logic;
pub mod strings;
pub mod variables;

use sqf_vm::OperatorRegistry;

/// Register the whole library.
pub fn install(registry: &mut OperatorRegistry) {
    arith::install(registry);
    arrays::install(registry);
    diag::install(registry);
    flow::install(registry);
    logic::install(registry);
    strings::install(registry);
    variables::install(registry);
}
