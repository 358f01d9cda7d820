use thiserror::Error;

use sqf_core::{DiagnosticCode, Severity};

/// Errors raised while executing instructions or inside operator callbacks.
///
/// Every variant maps to a stable diagnostic code; whether it aborts the
/// current statement or the whole machine follows from that code's severity.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RuntimeError {
    #[error("unknown nular operator '{0}'")]
    UnknownNularOperator(String),
    #[error("unknown unary operator '{0}'")]
    UnknownUnaryOperator(String),
    #[error("unknown binary operator '{0}'")]
    UnknownBinaryOperator(String),
    #[error("wrong operand type: expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
    #[error("work stack underflow")]
    WorkStackUnderflow,
    #[error("array size mismatch: expected {expected}, got {got}")]
    ArraySizeMismatch { expected: usize, got: usize },
    #[error("array of at least {expected} elements required, got {got}")]
    MinimumArraySizeMismatch { expected: usize, got: usize },
    #[error("index {index} out of range 0..{range}")]
    IndexOutOfRange { index: usize, range: usize },
    #[error("negative index {0}")]
    NegativeIndex(f64),
    #[error("negative size {0}")]
    NegativeSize(f64),
    #[error("array contains itself")]
    ArrayRecursion,
    #[error("suspension is not available in an unscheduled environment")]
    SuspensionInUnscheduledEnvironment,
    #[error("suspension is disabled")]
    SuspensionDisabled,
    #[error("maximum instruction count reached")]
    MaximumInstructionCountReached,
    /// Escape hatch for operators that report under a specific code.
    #[error("{message}")]
    Diagnostic {
        code: DiagnosticCode,
        message: String,
    },
}

impl RuntimeError {
    /// The diagnostic code this error reports under.
    pub fn code(&self) -> DiagnosticCode {
        match self {
            RuntimeError::UnknownNularOperator(_) => DiagnosticCode::UnknownNularOperator,
            RuntimeError::UnknownUnaryOperator(_) => DiagnosticCode::UnknownUnaryOperator,
            RuntimeError::UnknownBinaryOperator(_) => DiagnosticCode::UnknownBinaryOperator,
            RuntimeError::TypeMismatch { .. } => DiagnosticCode::TypeMismatch,
            RuntimeError::WorkStackUnderflow => DiagnosticCode::WorkStackUnderflow,
            RuntimeError::ArraySizeMismatch { .. } => DiagnosticCode::ExpectedArraySizeMismatch,
            RuntimeError::MinimumArraySizeMismatch { .. } => {
                DiagnosticCode::ExpectedMinimumArraySizeMismatch
            }
            RuntimeError::IndexOutOfRange { .. } => DiagnosticCode::IndexOutOfRange,
            RuntimeError::NegativeIndex(_) => DiagnosticCode::NegativeIndex,
            RuntimeError::NegativeSize(_) => DiagnosticCode::NegativeSize,
            RuntimeError::ArrayRecursion => DiagnosticCode::ArrayRecursion,
            RuntimeError::SuspensionInUnscheduledEnvironment => {
                DiagnosticCode::SuspensionInUnscheduledEnvironment
            }
            RuntimeError::SuspensionDisabled => DiagnosticCode::SuspensionDisabled,
            RuntimeError::MaximumInstructionCountReached => {
                DiagnosticCode::MaximumInstructionCountReached
            }
            RuntimeError::Diagnostic { code, .. } => *code,
        }
    }

    /// Fatal errors unwind the whole call stack and halt the machine.
    pub fn is_fatal(&self) -> bool {
        self.code().severity() == Severity::Fatal
    }
}
