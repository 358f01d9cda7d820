use std::cell::RefCell;
use std::io::Write;

use crate::codes::DiagnosticCode;
use crate::location::SourceLocation;

/// Severity level of a diagnostic.
///
/// `Fatal` and `Error` alter control flow in the engine; the rest never do.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
    Info,
    Verbose,
    Trace,
}

impl Severity {
    /// Short bracketed tag used by line-oriented presentation.
    pub fn tag(self) -> &'static str {
        match self {
            Severity::Fatal => "[FAT]",
            Severity::Error => "[ERR]",
            Severity::Warning => "[WRN]",
            Severity::Info => "[INF]",
            Severity::Verbose => "[VBS]",
            Severity::Trace => "[TRC]",
        }
    }
}

/// A structured diagnostic message.
#[derive(Clone, PartialEq, Debug)]
pub struct Diagnostic {
    severity: Severity,
    code: DiagnosticCode,
    location: Option<SourceLocation>,
    message: String,
}

impl Diagnostic {
    /// Build a diagnostic with a custom message. The severity is fixed by
    /// the code.
    pub fn new(
        code: DiagnosticCode,
        location: Option<SourceLocation>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: code.severity(),
            code,
            location,
            message: message.into(),
        }
    }

    /// Build a diagnostic carrying the code's default message.
    pub fn of(code: DiagnosticCode, location: Option<SourceLocation>) -> Self {
        let message = code.message();
        Self::new(code, location, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> DiagnosticCode {
        self.code
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.severity.tag(), self.code.code())?;
        if let Some(loc) = &self.location {
            write!(f, " {}", loc)?;
        }
        write!(f, " {}", self.message)
    }
}

/// Receiver for diagnostics.
///
/// Core crates never write to process-wide output; everything flows through
/// a sink the host supplies.
pub trait DiagnosticSink {
    fn report(&self, diagnostic: Diagnostic);

    /// Whether a severity level is worth producing at all. Producers may use
    /// this to skip expensive formatting for disabled levels.
    fn is_enabled(&self, _severity: Severity) -> bool {
        true
    }
}

/// Sink that stores diagnostics in memory. Used by tests and by hosts that
/// present diagnostics themselves.
#[derive(Default)]
pub struct CollectingSink {
    entries: RefCell<Vec<Diagnostic>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All diagnostics reported so far.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.entries.borrow().clone()
    }

    /// Remove and return all stored diagnostics.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.entries.borrow_mut())
    }

    pub fn count_of(&self, code: DiagnosticCode) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|d| d.code() == code)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|d| d.severity() <= Severity::Error)
    }
}

impl DiagnosticSink for CollectingSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.entries.borrow_mut().push(diagnostic);
    }
}

/// Sink that renders diagnostics line by line to a writer.
pub struct WriterSink<W: Write> {
    writer: RefCell<W>,
    enabled: [bool; 6],
}

impl<W: Write> WriterSink<W> {
    /// All levels except verbose and trace enabled.
    pub fn new(writer: W) -> Self {
        Self {
            writer: RefCell::new(writer),
            enabled: [true, true, true, true, false, false],
        }
    }

    pub fn set_enabled(&mut self, severity: Severity, enabled: bool) {
        self.enabled[severity as usize] = enabled;
    }
}

impl<W: Write> DiagnosticSink for WriterSink<W> {
    fn report(&self, diagnostic: Diagnostic) {
        if !self.is_enabled(diagnostic.severity()) {
            return;
        }
        let mut writer = self.writer.borrow_mut();
        let _ = writeln!(writer, "{}", diagnostic);
    }

    fn is_enabled(&self, severity: Severity) -> bool {
        self.enabled[severity as usize]
    }
}
