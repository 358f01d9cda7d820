use std::sync::Arc;

use sqf_core::SourceLocation;

/// Stateful character reader over one file.
///
/// `next` yields logical characters: `//` and `/* */` comments are skipped
/// (newlines inside block comments are preserved so line counts survive),
/// backslash-newline continuations are folded, and a string-literal mode
/// suppresses comment recognition between double quotes. `\r` is dropped at
/// construction. Lines are 1-based, columns 0-based.
pub struct FileReader {
    path: Arc<str>,
    chars: Vec<char>,
    off: usize,
    line: u32,
    col: u32,
    last_col: u32,
    in_string: bool,
    in_block_comment: bool,
}

impl FileReader {
    pub fn new(path: impl Into<Arc<str>>, content: &str) -> Self {
        Self {
            path: path.into(),
            chars: content.chars().filter(|&c| c != '\r').collect(),
            off: 0,
            line: 1,
            col: 0,
            last_col: 0,
            in_string: false,
            in_block_comment: false,
        }
    }

    /// Raw lookahead; does not skip comments or continuations.
    pub fn peek(&self, k: usize) -> Option<char> {
        self.chars.get(self.off + k).copied()
    }

    /// Location of the next character to be read.
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(Arc::clone(&self.path), self.line, self.col)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn in_string(&self) -> bool {
        self.in_string
    }

    /// Consume one raw character, tracking line and column.
    fn advance(&mut self) -> Option<char> {
        let c = *self.chars.get(self.off)?;
        self.off += 1;
        if c == '\n' {
            self.line += 1;
            self.last_col = self.col;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    /// Consume one logical character.
    pub fn next(&mut self) -> Option<char> {
        let mut c = self.advance()?;
        if !self.in_string && (c == '/' || self.in_block_comment) {
            if c == '\n' {
                return Some(c);
            }
            if self.in_block_comment && c == '*' && self.peek(0) == Some('/') {
                self.advance();
                self.in_block_comment = false;
                return self.next();
            } else if self.peek(0) == Some('*') || self.in_block_comment {
                if !self.in_block_comment {
                    self.advance();
                    self.in_block_comment = true;
                }
                loop {
                    match self.advance() {
                        None => return None,
                        Some('\n') => {
                            c = '\n';
                            break;
                        }
                        Some('*') if self.peek(0) == Some('/') => {
                            self.advance();
                            self.in_block_comment = false;
                            return self.next();
                        }
                        Some(_) => {}
                    }
                }
            } else if self.peek(0) == Some('/') {
                loop {
                    match self.advance() {
                        None => return None,
                        Some('\n') => {
                            c = '\n';
                            break;
                        }
                        Some(_) => {}
                    }
                }
            }
        }
        if c == '\\' && self.peek(0) == Some('\n') {
            self.advance();
            return self.next();
        }
        if c == '"' {
            self.in_string = !self.in_string;
        }
        Some(c)
    }

    /// Undo a single character step. Column restoration across a newline is
    /// only tracked one line deep; callers must not undo twice in a row.
    pub fn move_back(&mut self) {
        if self.off == 0 {
            return;
        }
        self.off -= 1;
        if self.chars[self.off] == '\n' {
            self.line -= 1;
            self.col = self.last_col;
        } else {
            self.col = self.col.saturating_sub(1);
        }
    }

    /// Maximal `[A-Za-z0-9_]+` run starting at the cursor. Empty when the
    /// cursor is not on a word character.
    pub fn get_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(c) = self.next() {
            if c.is_ascii_alphanumeric() || c == '_' {
                word.push(c);
            } else {
                self.move_back();
                break;
            }
        }
        word
    }

    /// Read to the end of the line. With `join_continuations`, characters
    /// come through `next` (comments stripped, continuations folded);
    /// without, the raw text is consumed and returned as-is, which is what
    /// line-dropping wants.
    pub fn get_line(&mut self, join_continuations: bool) -> String {
        let mut out = String::new();
        if join_continuations {
            while let Some(c) = self.next() {
                if c == '\n' {
                    break;
                }
                out.push(c);
            }
        } else {
            while let Some(c) = self.advance() {
                if c == '\n' {
                    break;
                }
                out.push(c);
            }
        }
        out
    }
}
