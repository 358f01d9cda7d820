use std::collections::HashMap;

use sqf_core::SourceLocation;

/// A preprocessor macro definition.
///
/// Macro names are case-sensitive (C preprocessor convention), unlike
/// variable names elsewhere in the engine.
#[derive(Clone, PartialEq, Debug)]
pub struct Macro {
    name: String,
    params: Option<Vec<String>>,
    body: String,
    location: SourceLocation,
}

impl Macro {
    /// Object-like macro.
    pub fn object(name: impl Into<String>, body: impl Into<String>, location: SourceLocation) -> Self {
        Self {
            name: name.into(),
            params: None,
            body: body.into(),
            location,
        }
    }

    /// Function-like macro with named parameters.
    pub fn function(
        name: impl Into<String>,
        params: Vec<String>,
        body: impl Into<String>,
        location: SourceLocation,
    ) -> Self {
        Self {
            name: name.into(),
            params: Some(params),
            body: body.into(),
            location,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `None` for object-like macros.
    pub fn params(&self) -> Option<&[String]> {
        self.params.as_deref()
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Definition site.
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }
}

/// The set of currently defined macros.
#[derive(Clone, Default, Debug)]
pub struct MacroTable {
    map: HashMap<String, Macro>,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define or replace. Returns the previous definition if one existed.
    pub fn define(&mut self, m: Macro) -> Option<Macro> {
        self.map.insert(m.name.clone(), m)
    }

    /// Remove a definition. Silent when absent.
    pub fn undefine(&mut self, name: &str) -> Option<Macro> {
        self.map.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.map.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
