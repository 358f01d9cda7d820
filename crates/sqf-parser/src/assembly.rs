use sqf_core::{Diagnostic, DiagnosticCode, Located};
use sqf_preprocessor::PositionMap;
use sqf_vm::{CodeBlock, Instruction, Value};

use crate::lexer::{Lexer, Token, TokenKind};

/// Parse the assembly surface: one instruction per line, terminated by `;`.
///
/// The textual form is exactly what [`CodeBlock::to_assembly`] emits, so
/// serialization round-trips over the literal-bearing instruction set.
pub fn parse_assembly(
    text: &str,
    map: Option<&PositionMap>,
    path: &str,
) -> Result<CodeBlock, Vec<Diagnostic>> {
    let tokens = Lexer::new(text, map, path)
        .tokenize()
        .map_err(|d| vec![d])?;
    let mut parser = AssemblyParser { tokens, pos: 0 };
    parser.parse().map_err(|d| vec![d])
}

struct AssemblyParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl AssemblyParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn error(&self, code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        let location = self
            .peek()
            .or_else(|| self.tokens.last())
            .map(|t| t.location.clone());
        Diagnostic::new(code, location, message)
    }

    fn parse(&mut self) -> Result<CodeBlock, Diagnostic> {
        let mut instructions = Vec::new();
        while let Some(token) = self.advance() {
            if matches!(token.kind, TokenKind::Semicolon) {
                continue;
            }
            let TokenKind::Word(name) = &token.kind else {
                return Err(self.error(
                    DiagnosticCode::NoViableAlternativeInstructions,
                    format!("expected an instruction name, got {:?}", token.kind),
                ));
            };
            let location = token.location.clone();
            let instruction = match name.to_ascii_lowercase().as_str() {
                "push" => self.parse_push()?,
                "callnular" => Instruction::CallNular(self.operator_name()?),
                "callunary" => Instruction::CallUnary(self.operator_name()?),
                "callbinary" => Instruction::CallBinary(self.operator_name()?),
                "assignto" => Instruction::AssignTo(self.variable_name()?),
                "assigntolocal" => Instruction::AssignToLocal(self.variable_name()?),
                "getvariable" => Instruction::GetVariable(self.variable_name()?),
                "makearray" => Instruction::MakeArray(self.array_size()?),
                "endstatement" => Instruction::EndStatement,
                "scopemark" => Instruction::ScopeMark(self.variable_name()?),
                other => {
                    return Err(self.error(
                        DiagnosticCode::NoViableAlternativeInstructions,
                        format!("unknown instruction '{}'", other),
                    ));
                }
            };
            match self.advance().map(|t| t.kind) {
                Some(TokenKind::Semicolon) => {}
                _ => {
                    return Err(self.error(
                        DiagnosticCode::ExpectedSemicolon,
                        "instructions end with ';'",
                    ));
                }
            }
            instructions.push(Located::new(instruction, location));
        }
        Ok(CodeBlock::new(instructions))
    }

    fn parse_push(&mut self) -> Result<Instruction, Diagnostic> {
        let type_name = match self.advance().map(|t| t.kind) {
            Some(TokenKind::Word(w)) => w.to_ascii_uppercase(),
            _ => {
                return Err(self.error(
                    DiagnosticCode::ExpectedTypeName,
                    "push takes a type name (SCALAR, STRING, BOOL, NOTHING)",
                ));
            }
        };
        let value = match type_name.as_str() {
            "NOTHING" => Value::Nothing,
            "SCALAR" => match self.advance().map(|t| t.kind) {
                Some(TokenKind::Number(n)) => Value::Scalar(n),
                // A negated literal arrives as two tokens
                Some(TokenKind::Symbol(s)) if s == "-" => match self.advance().map(|t| t.kind) {
                    Some(TokenKind::Number(n)) => Value::Scalar(-n),
                    _ => {
                        return Err(self.error(
                            DiagnosticCode::NoViableAlternativeArg,
                            "expected a number after '-'",
                        ));
                    }
                },
                _ => {
                    return Err(self.error(
                        DiagnosticCode::NoViableAlternativeArg,
                        "expected a number literal",
                    ));
                }
            },
            "STRING" => match self.advance().map(|t| t.kind) {
                Some(TokenKind::String(s)) => Value::string(s),
                _ => {
                    return Err(self.error(
                        DiagnosticCode::NoViableAlternativeArg,
                        "expected a string literal",
                    ));
                }
            },
            "BOOL" => match self.advance().map(|t| t.kind) {
                Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("true") => Value::Boolean(true),
                Some(TokenKind::Word(w)) if w.eq_ignore_ascii_case("false") => {
                    Value::Boolean(false)
                }
                _ => {
                    return Err(self.error(
                        DiagnosticCode::NoViableAlternativeArg,
                        "expected true or false",
                    ));
                }
            },
            other => {
                return Err(self.error(
                    DiagnosticCode::ExpectedTypeName,
                    format!("unknown literal type '{}'", other),
                ));
            }
        };
        Ok(Instruction::Push(value))
    }

    /// Operator names may be words (`select`) or punctuation (`+`, `==`).
    fn operator_name(&mut self) -> Result<String, Diagnostic> {
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Word(w)) => Ok(w),
            Some(TokenKind::Symbol(s)) => Ok(s),
            _ => Err(self.error(
                DiagnosticCode::NoViableAlternativeArg,
                "expected an operator name",
            )),
        }
    }

    fn variable_name(&mut self) -> Result<String, Diagnostic> {
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Word(w)) => Ok(w),
            _ => Err(self.error(
                DiagnosticCode::ExpectedVariableName,
                "expected a variable name",
            )),
        }
    }

    fn array_size(&mut self) -> Result<usize, Diagnostic> {
        match self.advance().map(|t| t.kind) {
            Some(TokenKind::Number(n)) => {
                if n < 0.0 || n.fract() != 0.0 {
                    return Err(self.error(
                        DiagnosticCode::NumberOutOfRange,
                        format!("array size must be a non-negative integer, got {}", n),
                    ));
                }
                Ok(n as usize)
            }
            _ => Err(self.error(
                DiagnosticCode::ExpectedInteger,
                "expected an element count",
            )),
        }
    }
}
