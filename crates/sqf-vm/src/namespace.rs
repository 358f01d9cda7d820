use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// Shared handle to a namespace.
pub type NamespaceRef = Rc<RefCell<Namespace>>;

/// Case-fold a variable name. Name resolution is case-insensitive across
/// the entire engine.
pub fn fold_name(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// A named global variable map.
///
/// Four instances live for the whole life of a VM: `missionNamespace`,
/// `uiNamespace`, `profileNamespace` and `parsingNamespace` (the last is
/// scratch space for the preprocessor and parsers).
#[derive(Clone, Debug, Default)]
pub struct Namespace {
    name: String,
    variables: HashMap<String, Value>,
}

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: HashMap::new(),
        }
    }

    pub fn shared(name: impl Into<String>) -> NamespaceRef {
        Rc::new(RefCell::new(Self::new(name)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.variables.get(&fold_name(name)).cloned()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.variables.insert(fold_name(name), value);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(&fold_name(name))
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(&fold_name(name))
    }

    pub fn clear(&mut self) {
        self.variables.clear();
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Folded variable names, unordered.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.variables.keys()
    }

    /// Snapshot of all bindings, for inspection surfaces.
    pub fn snapshot(&self) -> HashMap<String, Value> {
        self.variables.clone()
    }
}
