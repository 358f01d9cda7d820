use sqf_core::{Diagnostic, DiagnosticCode, Located, SourceLocation};
use sqf_preprocessor::PositionMap;
use sqf_vm::{Arity, CodeBlock, Instruction, OperatorRegistry, Value};

use crate::lexer::{Lexer, Token, TokenKind};

/// Parse high-level SQF source into a code block.
///
/// Statements are separated by `;`; the boundary instruction is emitted
/// BETWEEN statements so the final statement's value survives on the work
/// stack. Binary precedence comes from the registry; unary operators bind
/// tighter than any binary. Parse errors halt the translation unit.
pub fn parse_sqf(
    text: &str,
    map: Option<&PositionMap>,
    path: &str,
    registry: &OperatorRegistry,
) -> Result<CodeBlock, Vec<Diagnostic>> {
    let tokens = Lexer::new(text, map, path)
        .tokenize()
        .map_err(|d| vec![d])?;
    let mut parser = SqfParser {
        tokens,
        pos: 0,
        registry,
        chars: text.chars().collect(),
    };
    let instructions = parser.parse_statements(false).map_err(|d| vec![d])?;
    if let Some(stray) = parser.peek() {
        return Err(vec![Diagnostic::new(
            DiagnosticCode::ExpectedSqf,
            Some(stray.location.clone()),
            "unparsed input after last statement",
        )]);
    }
    Ok(CodeBlock::with_source(instructions, text.trim()))
}

struct SqfParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    registry: &'a OperatorRegistry,
    chars: Vec<char>,
}

type Emit = Vec<Located<Instruction>>;

impl<'a> SqfParser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self, ahead: usize) -> Option<&TokenKind> {
        self.tokens.get(self.pos + ahead).map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn here(&self) -> SourceLocation {
        self.peek()
            .map(|t| t.location.clone())
            .or_else(|| self.tokens.last().map(|t| t.location.clone()))
            .unwrap_or_else(SourceLocation::native)
    }

    fn error(&self, code: DiagnosticCode, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, Some(self.here()), message)
    }

    /// Parse statements until EOF (or a closing brace when `in_block`).
    /// The brace itself is left for the caller.
    fn parse_statements(&mut self, in_block: bool) -> Result<Emit, Diagnostic> {
        let mut out = Emit::new();
        let mut emitted_any = false;
        loop {
            while matches!(self.peek_kind(0), Some(TokenKind::Semicolon)) {
                self.advance();
            }
            match self.peek_kind(0) {
                None => {
                    if in_block {
                        return Err(self.error(
                            DiagnosticCode::EndOfFile,
                            "end of file inside a code block",
                        ));
                    }
                    break;
                }
                Some(TokenKind::RBrace) if in_block => break,
                _ => {}
            }

            if emitted_any {
                out.push(Located::new(Instruction::EndStatement, self.here()));
            }
            self.parse_statement(&mut out)?;
            emitted_any = true;

            match self.peek_kind(0) {
                Some(TokenKind::Semicolon) => {
                    self.advance();
                }
                Some(TokenKind::RBrace) if in_block => {}
                None => {}
                Some(_) => {
                    return Err(self.error(
                        DiagnosticCode::ExpectedStatementTerminator,
                        "expected ';' between statements",
                    ));
                }
            }
        }
        Ok(out)
    }

    fn parse_statement(&mut self, out: &mut Emit) -> Result<(), Diagnostic> {
        if let Some(TokenKind::Word(word)) = self.peek_kind(0) {
            // `private name = expr`
            if word.eq_ignore_ascii_case("private") {
                if let (Some(TokenKind::Word(name)), Some(TokenKind::Assign)) =
                    (self.peek_kind(1), self.peek_kind(2))
                {
                    let name = name.clone();
                    self.advance();
                    let name_token = self.advance().expect("name token peeked");
                    if !name.starts_with('_') {
                        return Err(Diagnostic::new(
                            DiagnosticCode::MissingUnderscoreOnPrivateVariable,
                            Some(name_token.location),
                            format!("private variable '{}' must start with '_'", name),
                        ));
                    }
                    self.advance();
                    self.parse_expression(1, out)?;
                    out.push(Located::new(
                        Instruction::AssignToLocal(name),
                        name_token.location,
                    ));
                    return Ok(());
                }
            }
            // `name = expr`
            if matches!(self.peek_kind(1), Some(TokenKind::Assign)) {
                let name = word.clone();
                let name_token = self.advance().expect("word token peeked");
                self.advance();
                self.parse_expression(1, out)?;
                out.push(Located::new(Instruction::AssignTo(name), name_token.location));
                return Ok(());
            }
        }
        self.parse_expression(1, out)
    }

    fn parse_expression(&mut self, min_precedence: u8, out: &mut Emit) -> Result<(), Diagnostic> {
        self.parse_unary(out)?;
        loop {
            let Some(token) = self.peek() else { break };
            let name = match &token.kind {
                TokenKind::Word(w) if self.registry.has(w, Arity::Binary) => w.clone(),
                TokenKind::Symbol(s) if self.registry.has(s, Arity::Binary) => s.clone(),
                _ => break,
            };
            let precedence = self.registry.precedence_of(&name).unwrap_or(4);
            if precedence < min_precedence {
                break;
            }
            let operator = self.advance().expect("operator token peeked");
            if self.peek().is_none() {
                return Err(Diagnostic::new(
                    DiagnosticCode::MissingRightArgument,
                    Some(operator.location),
                    format!("binary operator '{}' is missing its right argument", name),
                ));
            }
            self.parse_expression(precedence + 1, out)?;
            out.push(Located::new(Instruction::CallBinary(name), operator.location));
        }
        Ok(())
    }

    fn parse_unary(&mut self, out: &mut Emit) -> Result<(), Diagnostic> {
        let Some(token) = self.peek() else {
            return Err(self.error(DiagnosticCode::EndOfFile, "expected an expression"));
        };
        let unary_name = match &token.kind {
            TokenKind::Word(w) if self.registry.has(w, Arity::Unary) => {
                // A word that is both an operator and followed by an operand
                // is an invocation; otherwise fall through to primary
                if self.starts_expression(1) {
                    Some(w.clone())
                } else if self.registry.has(w, Arity::Nular) {
                    None
                } else {
                    let location = token.location.clone();
                    return Err(Diagnostic::new(
                        DiagnosticCode::MissingRightArgument,
                        Some(location),
                        format!("unary operator '{}' is missing its argument", w),
                    ));
                }
            }
            TokenKind::Symbol(s) if self.registry.has(s, Arity::Unary) => Some(s.clone()),
            _ => None,
        };
        match unary_name {
            Some(name) => {
                let operator = self.advance().expect("operator token peeked");
                self.parse_unary(out)?;
                out.push(Located::new(Instruction::CallUnary(name), operator.location));
                Ok(())
            }
            None => self.parse_primary(out),
        }
    }

    /// Whether the token at `ahead` can begin an expression.
    fn starts_expression(&self, ahead: usize) -> bool {
        match self.peek_kind(ahead) {
            Some(TokenKind::Number(_))
            | Some(TokenKind::String(_))
            | Some(TokenKind::LParen)
            | Some(TokenKind::LBracket)
            | Some(TokenKind::LBrace) => true,
            Some(TokenKind::Word(w)) => !self.registry.has(w, Arity::Binary),
            Some(TokenKind::Symbol(s)) => self.registry.has(s, Arity::Unary),
            _ => false,
        }
    }

    fn parse_primary(&mut self, out: &mut Emit) -> Result<(), Diagnostic> {
        let Some(token) = self.advance() else {
            return Err(self.error(DiagnosticCode::EndOfFile, "expected an expression"));
        };
        let location = token.location.clone();
        match token.kind {
            TokenKind::Number(value) => {
                out.push(Located::new(
                    Instruction::Push(Value::Scalar(value)),
                    location,
                ));
                Ok(())
            }
            TokenKind::String(value) => {
                out.push(Located::new(
                    Instruction::Push(Value::string(value)),
                    location,
                ));
                Ok(())
            }
            TokenKind::LParen => {
                self.parse_expression(1, out)?;
                match self.peek_kind(0) {
                    Some(TokenKind::RParen) => {
                        self.advance();
                        Ok(())
                    }
                    _ => Err(Diagnostic::new(
                        DiagnosticCode::MissingRoundClosingBracket,
                        Some(location),
                        "missing ')'",
                    )),
                }
            }
            TokenKind::LBracket => {
                let mut count = 0usize;
                if !matches!(self.peek_kind(0), Some(TokenKind::RBracket)) {
                    loop {
                        self.parse_expression(1, out)?;
                        count += 1;
                        match self.peek_kind(0) {
                            Some(TokenKind::Comma) => {
                                self.advance();
                            }
                            _ => break,
                        }
                    }
                }
                match self.peek_kind(0) {
                    Some(TokenKind::RBracket) => {
                        self.advance();
                        out.push(Located::new(Instruction::MakeArray(count), location));
                        Ok(())
                    }
                    _ => Err(Diagnostic::new(
                        DiagnosticCode::MissingSquareClosingBracket,
                        Some(location),
                        "missing ']'",
                    )),
                }
            }
            TokenKind::LBrace => {
                let open_offset = token.offset;
                let inner = self.parse_statements(true)?;
                match self.advance() {
                    Some(Token {
                        kind: TokenKind::RBrace,
                        offset: close_offset,
                        ..
                    }) => {
                        let source: String = self.chars[open_offset + 1..close_offset]
                            .iter()
                            .collect();
                        let block = CodeBlock::with_source(inner, source.trim());
                        out.push(Located::new(Instruction::Push(Value::code(block)), location));
                        Ok(())
                    }
                    _ => Err(Diagnostic::new(
                        DiagnosticCode::MissingCurlyClosingBracket,
                        Some(location),
                        "missing '}'",
                    )),
                }
            }
            TokenKind::Word(word) => {
                if self.registry.has(&word, Arity::Nular) {
                    out.push(Located::new(Instruction::CallNular(word), location));
                } else {
                    out.push(Located::new(Instruction::GetVariable(word), location));
                }
                Ok(())
            }
            other => Err(Diagnostic::new(
                DiagnosticCode::NoViableAlternativePrimaryExpression,
                Some(location),
                format!("no viable expression at {:?}", other),
            )),
        }
    }
}
