use std::collections::HashSet;

use sqf_core::SourceLocation;

use crate::machine::Vm;

/// Breakpoints keyed by `(file, line)`.
#[derive(Clone, Default, Debug)]
pub struct BreakpointSet {
    points: HashSet<(String, u32)>,
}

impl BreakpointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: impl Into<String>, line: u32) {
        self.points.insert((file.into(), line));
    }

    pub fn remove(&mut self, file: &str, line: u32) {
        self.points.remove(&(file.to_string(), line));
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn matches(&self, location: &SourceLocation) -> bool {
        self.points
            .contains(&(location.path().to_string(), location.line()))
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.points.iter().map(|(file, line)| (file.as_str(), *line))
    }
}

/// Optional attach interface the engine honours when a debugger is bound.
///
/// The engine calls `check` between instructions, `error` whenever an
/// error-level or fatal diagnostic surfaces, and `stop` before reporting a
/// completed run. Implementations may inspect the call stack, variables in
/// any frame or namespace, and manage breakpoints.
pub trait Debugger {
    /// Non-blocking command pump, called between instructions.
    fn check(&mut self, vm: &mut Vm);

    /// An error surfaced at `location`.
    fn error(&mut self, vm: &mut Vm, location: Option<&SourceLocation>, message: &str);

    /// Asked before the engine reports completion. Returning `false` keeps
    /// the machine paused under debugger control.
    fn stop(&mut self, vm: &mut Vm) -> bool;

    /// Whether a breakpoint matches the next instruction's location.
    fn has_breakpoint(&self, location: &SourceLocation) -> bool;
}
