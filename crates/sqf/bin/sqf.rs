//! SQF command-line interpreter.
//!
//! Usage:
//!   sqf <file.sqf>     Evaluate a file (includes resolve beside it)
//!   sqf -e <code>      Evaluate a string
//!   sqf                Read from stdin

use std::{
    env, io,
    io::Read,
    process::ExitCode,
    rc::Rc,
};

use sqf::Runtime;
use sqf_core::{PhysicalResolver, WriterSink};

const USAGE: &str = "\
Usage: sqf [OPTIONS] [FILE]

Arguments:
  [FILE]  SQF source file to evaluate

Options:
  -e <CODE>   Evaluate CODE string
  -a <FILE>   Evaluate FILE as assembly
  -h, --help  Print this help message

If no arguments are given, reads from stdin.";

fn read_stdin() -> Result<String, io::Error> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

enum Action {
    EvalFile(String),
    EvalAssemblyFile(String),
    EvalSource(String),
    Help,
}

fn parse_args() -> Result<Action, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    match args.as_slice() {
        [] => Ok(Action::EvalSource(
            read_stdin().map_err(|e| format!("error reading stdin: {e}"))?,
        )),
        [arg] if arg == "-" => Ok(Action::EvalSource(
            read_stdin().map_err(|e| format!("error reading stdin: {e}"))?,
        )),
        [arg] if arg == "-h" || arg == "--help" => Ok(Action::Help),
        [flag, code] if flag == "-e" => Ok(Action::EvalSource(code.clone())),
        [flag, file] if flag == "-a" => Ok(Action::EvalAssemblyFile(file.clone())),
        [file] => Ok(Action::EvalFile(file.clone())),
        _ => Err(USAGE.into()),
    }
}

fn runtime() -> Runtime {
    let mut resolver = PhysicalResolver::new();
    resolver.add_quoted_path(".");
    Runtime::new(Box::new(resolver), Rc::new(WriterSink::new(io::stderr())))
}

fn run(runtime: &mut Runtime, action: Action) -> Result<(), String> {
    let code = match &action {
        Action::EvalFile(file) => runtime.parse_file(file),
        Action::EvalAssemblyFile(file) => {
            let source = std::fs::read_to_string(file)
                .map_err(|e| format!("error reading {file}: {e}"))?;
            runtime.parse_assembly_source(file, &source)
        }
        Action::EvalSource(source) => runtime.parse_source("<stdin>", source),
        Action::Help => unreachable!("handled by main"),
    }
    .map_err(|e| e.to_string())?;

    runtime.execute(&code);
    for value in runtime.vm().result_values() {
        println!("{value}");
    }
    Ok(())
}

fn main() -> ExitCode {
    match parse_args() {
        Ok(Action::Help) => {
            println!("{USAGE}");
            ExitCode::SUCCESS
        }
        Ok(action) => {
            let mut runtime = runtime();
            match run(&mut runtime, action) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    eprintln!("{e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
