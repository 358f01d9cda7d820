//! Core types for the SQF toolchain.
//!
//! This crate provides foundational types used throughout the preprocessor,
//! parsers and virtual machine:
//! - Source locations and located nodes
//! - Diagnostics, severities and the stable numeric code table
//! - The diagnostic sink interface
//! - The file resolution contract used by `#include`

pub mod codes;
pub mod diagnostic;
pub mod fileio;
pub mod location;

// Re-export commonly used types at crate root
pub use codes::DiagnosticCode;
pub use diagnostic::{CollectingSink, Diagnostic, DiagnosticSink, Severity, WriterSink};
pub use fileio::{FileIoError, FileResolver, IncludeForm, MemoryResolver, PhysicalResolver};
pub use location::{Located, SourceLocation};
