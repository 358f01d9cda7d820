use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::machine::Vm;
use crate::namespace::fold_name;

/// Operand count of an operator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Arity {
    Nular,
    Unary,
    Binary,
}

/// An operator implementation. Callbacks pop their own operands from the
/// top frame's work stack and push their result (or nothing). They may also
/// push and pop call frames, raise errors, or request suspension.
pub type OperatorCallback = Rc<dyn Fn(&mut Vm) -> Result<(), RuntimeError>>;

/// A registered operator.
#[derive(Clone)]
pub struct OperatorEntry {
    name: String,
    arity: Arity,
    precedence: u8,
    callback: OperatorCallback,
}

impl OperatorEntry {
    /// The name as registered (original casing, for presentation).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    /// Parser metadata; meaningful for binary operators only.
    pub fn precedence(&self) -> u8 {
        self.precedence
    }

    pub fn callback(&self) -> OperatorCallback {
        Rc::clone(&self.callback)
    }
}

impl std::fmt::Debug for OperatorEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorEntry")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("precedence", &self.precedence)
            .finish()
    }
}

/// Flat table of operators keyed by case-folded `(name, arity)`.
///
/// Precedence (1..=10, binary only) is data for the parser; execution
/// dispatches purely by name and arity.
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    entries: HashMap<(String, Arity), OperatorEntry>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_nular<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&mut Vm) -> Result<(), RuntimeError> + 'static,
    {
        self.insert(name, Arity::Nular, 0, Rc::new(callback));
    }

    pub fn register_unary<F>(&mut self, name: &str, callback: F)
    where
        F: Fn(&mut Vm) -> Result<(), RuntimeError> + 'static,
    {
        self.insert(name, Arity::Unary, 0, Rc::new(callback));
    }

    pub fn register_binary<F>(&mut self, name: &str, precedence: u8, callback: F)
    where
        F: Fn(&mut Vm) -> Result<(), RuntimeError> + 'static,
    {
        debug_assert!((1..=10).contains(&precedence));
        self.insert(name, Arity::Binary, precedence, Rc::new(callback));
    }

    fn insert(&mut self, name: &str, arity: Arity, precedence: u8, callback: OperatorCallback) {
        self.entries.insert(
            (fold_name(name), arity),
            OperatorEntry {
                name: name.to_string(),
                arity,
                precedence,
                callback,
            },
        );
    }

    pub fn lookup(&self, name: &str, arity: Arity) -> Option<&OperatorEntry> {
        self.entries.get(&(fold_name(name), arity))
    }

    pub fn has(&self, name: &str, arity: Arity) -> bool {
        self.lookup(name, arity).is_some()
    }

    /// Precedence of a binary operator, if registered.
    pub fn precedence_of(&self, name: &str) -> Option<u8> {
        self.lookup(name, Arity::Binary).map(|e| e.precedence())
    }

    pub fn names(&self, arity: Arity) -> impl Iterator<Item = &str> {
        self.entries
            .values()
            .filter(move |e| e.arity() == arity)
            .map(|e| e.name())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
