//! End-to-end pipeline tests: source text through the preprocessor, parser
//! and virtual machine.

mod arithmetic;
mod arrays;
mod assembly;
mod debugging;
mod errors;
mod flow;
mod namespaces;
mod preprocessing;
mod strings;

use std::rc::Rc;

use sqf::Runtime;
use sqf_core::{CollectingSink, Diagnostic, MemoryResolver};
use sqf_vm::Value;

pub fn runtime() -> (Runtime, Rc<CollectingSink>) {
    runtime_with_files(&[])
}

pub fn runtime_with_files(files: &[(&str, &str)]) -> (Runtime, Rc<CollectingSink>) {
    let mut resolver = MemoryResolver::new();
    for (name, content) in files {
        resolver.insert(*name, *content);
    }
    let sink = Rc::new(CollectingSink::new());
    (Runtime::new(Box::new(resolver), sink.clone()), sink)
}

pub fn eval(source: &str) -> Vec<Value> {
    let (mut runtime, _) = runtime();
    runtime.eval(source).expect("script compiles")
}

pub fn eval_with_diagnostics(source: &str) -> (Vec<Value>, Vec<Diagnostic>) {
    let (mut runtime, sink) = runtime();
    let values = runtime.eval(source).expect("script compiles");
    (values, sink.take())
}

pub fn eval_scalars(source: &str) -> Vec<f64> {
    eval(source)
        .iter()
        .map(|v| v.as_scalar().expect("scalar result"))
        .collect()
}

pub fn assert_stack_eq(source: &str, expected: &[f64]) {
    assert_eq!(eval_scalars(source), expected, "source: {}", source);
}
