//! SQF scripting runtime.
//!
//! Wires the pipeline together: source text goes through the preprocessor,
//! one of the two parsers turns the expanded text into a code block, and the
//! virtual machine executes it against persistent namespaces with the
//! built-in operator library installed.
//!
//! ```no_run
//! use std::rc::Rc;
//! use sqf_core::{CollectingSink, MemoryResolver};
//! use sqf::Runtime;
//!
//! let sink = Rc::new(CollectingSink::new());
//! let mut runtime = Runtime::new(Box::new(MemoryResolver::new()), sink);
//! let values = runtime.eval("1 + 2 * 3;").unwrap();
//! assert_eq!(values[0].as_scalar(), Some(7.0));
//! ```

pub mod libs;

use std::rc::Rc;

use thiserror::Error;

use sqf_parser::{parse_assembly, parse_sqf};
use sqf_preprocessor::Preprocessor;
use sqf_vm::execute;

// Commonly used pieces of the lower crates, re-exported for hosts
pub use sqf_core::{
    CollectingSink, Diagnostic, DiagnosticCode, DiagnosticSink, FileIoError, FileResolver,
    IncludeForm, MemoryResolver, PhysicalResolver, Severity, SourceLocation, WriterSink,
};
pub use sqf_debugger::QueueDebugger;
pub use sqf_preprocessor::{Macro, Preprocessed, PositionMap, PreprocessError};
pub use sqf_vm::{
    Arity, CodeBlock, Debugger, ExecuteOutcome, Instruction, OperatorRegistry, RuntimeError,
    Value, Vm,
};

/// Why a script could not reach execution.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error("parsing failed with {} diagnostic(s)", .0.len())]
    Parse(Vec<Diagnostic>),
}

/// One evaluation host: a VM with the operator library installed, a file
/// resolver for includes, and an optional attached debugger. A runtime
/// drives one script context at a time; namespaces persist across scripts.
pub struct Runtime {
    vm: Vm,
    resolver: Box<dyn FileResolver>,
    debugger: Option<Box<dyn Debugger>>,
    predefines: Vec<Macro>,
}

impl Runtime {
    pub fn new(resolver: Box<dyn FileResolver>, sink: Rc<dyn DiagnosticSink>) -> Self {
        let mut vm = Vm::new(sink);
        libs::install(vm.registry_mut());
        Self {
            vm,
            resolver,
            debugger: None,
            predefines: Vec::new(),
        }
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    /// Define a macro before every preprocessor run.
    pub fn predefine(&mut self, m: Macro) {
        self.predefines.push(m);
    }

    pub fn attach_debugger(&mut self, debugger: Box<dyn Debugger>) {
        self.debugger = Some(debugger);
    }

    pub fn detach_debugger(&mut self) -> Option<Box<dyn Debugger>> {
        self.debugger.take()
    }

    pub fn debugger(&self) -> Option<&dyn Debugger> {
        self.debugger.as_deref()
    }

    fn preprocessor(&self) -> Preprocessor<'_> {
        let mut pre = Preprocessor::new(self.resolver.as_ref(), self.vm.sink());
        for m in &self.predefines {
            pre.define(m.clone());
        }
        pre
    }

    /// Report parse diagnostics to the sink as well as returning them.
    fn fail_parse(&self, diagnostics: Vec<Diagnostic>) -> ScriptError {
        for diagnostic in &diagnostics {
            self.vm.sink().report(diagnostic.clone());
        }
        ScriptError::Parse(diagnostics)
    }

    /// Preprocess and parse a file reachable through the resolver.
    pub fn parse_file(&mut self, logical: &str) -> Result<CodeBlock, ScriptError> {
        let expanded = self.preprocessor().preprocess(logical)?;
        parse_sqf(
            &expanded.text,
            Some(&expanded.map),
            logical,
            self.vm.registry(),
        )
        .map_err(|d| self.fail_parse(d))
    }

    /// Preprocess and parse source text the host already holds.
    pub fn parse_source(&mut self, name: &str, source: &str) -> Result<CodeBlock, ScriptError> {
        let expanded = self.preprocessor().preprocess_content(name, source)?;
        parse_sqf(&expanded.text, Some(&expanded.map), name, self.vm.registry())
            .map_err(|d| self.fail_parse(d))
    }

    /// Preprocess and parse assembly-form source text.
    pub fn parse_assembly_source(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<CodeBlock, ScriptError> {
        let expanded = self.preprocessor().preprocess_content(name, source)?;
        parse_assembly(&expanded.text, Some(&expanded.map), name).map_err(|d| self.fail_parse(d))
    }

    /// Run a code block in a fresh unscheduled root frame.
    pub fn execute(&mut self, code: &CodeBlock) -> ExecuteOutcome {
        self.execute_root(code, false)
    }

    /// Run a code block in a scheduled root frame (suspension permitted).
    pub fn execute_scheduled(&mut self, code: &CodeBlock) -> ExecuteOutcome {
        self.execute_root(code, true)
    }

    fn execute_root(&mut self, code: &CodeBlock, scheduled: bool) -> ExecuteOutcome {
        self.vm.clear_results();
        self.vm.push_root(code, scheduled);
        self.resume()
    }

    /// Re-enter the engine after a suspension or a debugger pause.
    pub fn resume(&mut self) -> ExecuteOutcome {
        match self.debugger.as_mut() {
            Some(dbg) => execute(&mut self.vm, Some(dbg.as_mut())),
            None => execute(&mut self.vm, None),
        }
    }

    /// Full pipeline for one source string; returns the work-stack values
    /// the script left behind.
    pub fn eval(&mut self, source: &str) -> Result<Vec<Value>, ScriptError> {
        let code = self.parse_source("<eval>", source)?;
        self.execute(&code);
        Ok(self.vm.result_values().to_vec())
    }

    /// Like [`Runtime::eval`] for assembly-form source.
    pub fn eval_assembly(&mut self, source: &str) -> Result<Vec<Value>, ScriptError> {
        let code = self.parse_assembly_source("<eval>", source)?;
        self.execute(&code);
        Ok(self.vm.result_values().to_vec())
    }
}
