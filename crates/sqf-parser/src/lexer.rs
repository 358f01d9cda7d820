use std::sync::Arc;

use sqf_core::{Diagnostic, DiagnosticCode, SourceLocation};
use sqf_preprocessor::PositionMap;

/// Token categories shared by both grammars.
#[derive(Clone, PartialEq, Debug)]
pub enum TokenKind {
    Number(f64),
    /// Decoded string contents (quote doubling already resolved).
    String(String),
    /// Identifier-shaped word: variable, operator name, keyword.
    Word(String),
    /// Punctuation operator such as `+`, `==`, `&&`.
    Symbol(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Semicolon,
    Assign,
}

/// A token with its origin and its char offset in the scanned text.
#[derive(Clone, PartialEq, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub location: SourceLocation,
    pub offset: usize,
}

/// Tokenizer over preprocessed text.
///
/// Locations resolve through the position map when one is supplied (the
/// normal pipeline), otherwise they are computed from the text itself
/// against the given path.
pub struct Lexer<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    col: u32,
    map: Option<&'a PositionMap>,
    path: Arc<str>,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &str, map: Option<&'a PositionMap>, path: impl Into<Arc<str>>) -> Self {
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line: 1,
            col: 0,
            map: map.filter(|m| !m.is_empty()),
            path: path.into(),
        }
    }

    /// The characters being scanned, for source-text extraction.
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    fn location(&self) -> SourceLocation {
        if let Some(map) = self.map {
            if let Some(location) = map.resolve(self.pos as u32) {
                return location;
            }
        }
        SourceLocation::new(Arc::clone(&self.path), self.line, self.col)
    }

    fn peek(&self, k: usize) -> Option<char> {
        self.chars.get(self.pos + k).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = *self.chars.get(self.pos)?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Diagnostic> {
        let mut tokens = Vec::new();
        loop {
            while matches!(self.peek(0), Some(c) if c.is_whitespace()) {
                self.bump();
            }
            let location = self.location();
            let offset = self.pos;
            let Some(c) = self.peek(0) else { break };

            let kind = if c.is_ascii_digit()
                || (c == '.' && matches!(self.peek(1), Some(d) if d.is_ascii_digit()))
                || c == '$'
            {
                self.lex_number(&location)?
            } else if c.is_ascii_alphabetic() || c == '_' {
                self.lex_word()
            } else if c == '"' || c == '\'' {
                self.lex_string(c, &location)?
            } else {
                self.bump();
                match c {
                    '(' => TokenKind::LParen,
                    ')' => TokenKind::RParen,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    ',' => TokenKind::Comma,
                    ';' => TokenKind::Semicolon,
                    '=' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::Symbol("==".to_string())
                    }
                    '=' => TokenKind::Assign,
                    '!' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::Symbol("!=".to_string())
                    }
                    '<' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::Symbol("<=".to_string())
                    }
                    '>' if self.peek(0) == Some('=') => {
                        self.bump();
                        TokenKind::Symbol(">=".to_string())
                    }
                    '&' if self.peek(0) == Some('&') => {
                        self.bump();
                        TokenKind::Symbol("&&".to_string())
                    }
                    '|' if self.peek(0) == Some('|') => {
                        self.bump();
                        TokenKind::Symbol("||".to_string())
                    }
                    other => TokenKind::Symbol(other.to_string()),
                }
            };
            tokens.push(Token {
                kind,
                location,
                offset,
            });
        }
        Ok(tokens)
    }

    fn lex_word(&mut self) -> TokenKind {
        let mut word = String::new();
        while let Some(c) = self.peek(0) {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        TokenKind::Word(word)
    }

    fn lex_number(&mut self, location: &SourceLocation) -> Result<TokenKind, Diagnostic> {
        let mut text = String::new();
        let empty_number = || {
            Diagnostic::new(
                DiagnosticCode::EmptyNumber,
                Some(location.clone()),
                "number literal has no digits",
            )
        };

        // `$ABC` and `0xABC` hexadecimal forms
        if self.peek(0) == Some('$')
            || (self.peek(0) == Some('0') && matches!(self.peek(1), Some('x') | Some('X')))
        {
            if self.peek(0) == Some('$') {
                self.bump();
            } else {
                self.bump();
                self.bump();
            }
            while let Some(c) = self.peek(0) {
                if c.is_ascii_hexdigit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
            if text.is_empty() {
                return Err(empty_number());
            }
            let value = u64::from_str_radix(&text, 16).map_err(|_| empty_number())?;
            return Ok(TokenKind::Number(value as f64));
        }

        while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
            text.push(self.bump().unwrap());
        }
        if self.peek(0) == Some('.') && matches!(self.peek(1), Some(c) if c.is_ascii_digit()) {
            text.push(self.bump().unwrap());
            while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
                text.push(self.bump().unwrap());
            }
        }
        if matches!(self.peek(0), Some('e') | Some('E')) {
            let sign_offset = if matches!(self.peek(1), Some('+') | Some('-')) {
                1
            } else {
                0
            };
            if matches!(self.peek(1 + sign_offset), Some(c) if c.is_ascii_digit()) {
                text.push(self.bump().unwrap());
                if sign_offset == 1 {
                    text.push(self.bump().unwrap());
                }
                while matches!(self.peek(0), Some(c) if c.is_ascii_digit()) {
                    text.push(self.bump().unwrap());
                }
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| empty_number())
    }

    fn lex_string(&mut self, quote: char, location: &SourceLocation) -> Result<TokenKind, Diagnostic> {
        self.bump();
        let mut content = String::new();
        loop {
            match self.bump() {
                None => {
                    return Err(Diagnostic::new(
                        DiagnosticCode::EndOfFile,
                        Some(location.clone()),
                        "unterminated string literal",
                    ));
                }
                Some(c) if c == quote => {
                    // Doubled quote is an escaped quote
                    if self.peek(0) == Some(quote) {
                        self.bump();
                        content.push(quote);
                    } else {
                        return Ok(TokenKind::String(content));
                    }
                }
                Some(c) => content.push(c),
            }
        }
    }
}
