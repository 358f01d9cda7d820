use std::collections::HashSet;

use smallvec::SmallVec;
use thiserror::Error;

use sqf_core::{
    Diagnostic, DiagnosticCode, DiagnosticSink, FileResolver, IncludeForm, SourceLocation,
};

use crate::macros::{Macro, MacroTable};
use crate::position_map::PositionMap;
use crate::reader::FileReader;

/// Argument lists are almost always short.
type RawArgs = SmallVec<[String; 4]>;

/// Preprocessing failures that abort the run. All detail has already been
/// reported through the sink when one of these is returned.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed to include '{path}'")]
    IncludeFailed { path: String },
    #[error("recursive include of '{path}'")]
    RecursiveInclude { path: String },
}

/// The expanded output plus the offset-to-origin map.
#[derive(Clone, Debug)]
pub struct Preprocessed {
    pub text: String,
    pub map: PositionMap,
}

/// One `#ifdef`/`#ifndef` frame.
struct ConditionFrame {
    /// Whether this branch currently emits (parent permitting).
    active: bool,
    /// Whether any branch of this frame has been taken.
    taken: bool,
    /// Whether the enclosing state allowed emission when the frame opened.
    parent_allow: bool,
    else_seen: bool,
    location: SourceLocation,
}

/// Accumulates output text while recording the origin of every character.
struct Emitter {
    text: String,
    map: PositionMap,
    /// Origin the next character must have to continue the open segment.
    expect: Option<SourceLocation>,
}

impl Emitter {
    fn new() -> Self {
        Self {
            text: String::new(),
            map: PositionMap::new(),
            expect: None,
        }
    }

    fn emit(&mut self, c: char, origin: &SourceLocation) {
        let continues = self.expect.as_ref() == Some(origin);
        if !continues {
            self.map
                .push_segment(self.text.len() as u32, origin.clone(), false);
        }
        self.text.push(c);
        // Unpinned segments advance column by column, so a line break always
        // opens a new segment
        self.expect = if c == '\n' {
            None
        } else {
            Some(origin.with_col_offset(1))
        };
    }

    /// Emit macro-derived text; every character maps to the invocation site.
    fn emit_pinned(&mut self, text: &str, invocation: &SourceLocation) {
        if text.is_empty() {
            return;
        }
        self.map
            .push_segment(self.text.len() as u32, invocation.clone(), true);
        self.text.push_str(text);
        self.expect = None;
    }
}

/// The preprocessor. One instance runs one root file; macros defined by the
/// host before the run (or left behind by it) stay in the table.
pub struct Preprocessor<'a> {
    resolver: &'a dyn FileResolver,
    sink: &'a dyn DiagnosticSink,
    macros: MacroTable,
    include_stack: Vec<String>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(resolver: &'a dyn FileResolver, sink: &'a dyn DiagnosticSink) -> Self {
        Self {
            resolver,
            sink,
            macros: MacroTable::new(),
            include_stack: Vec::new(),
        }
    }

    /// Predefine a macro before the run.
    pub fn define(&mut self, m: Macro) {
        self.macros.define(m);
    }

    pub fn macros(&self) -> &MacroTable {
        &self.macros
    }

    /// Expand a root logical path into a single string with position map.
    pub fn preprocess(&mut self, logical: &str) -> Result<Preprocessed, PreprocessError> {
        let physical = match self.resolver.resolve(None, IncludeForm::Quoted, logical) {
            Ok(p) => p,
            Err(err) => {
                self.report(
                    DiagnosticCode::IncludeFailed,
                    None,
                    format!("failed to open '{}': {}", logical, err),
                );
                return Err(PreprocessError::IncludeFailed {
                    path: logical.to_string(),
                });
            }
        };
        let content = match self.resolver.read(&physical) {
            Ok(c) => c,
            Err(err) => {
                self.report(
                    DiagnosticCode::IncludeFailed,
                    None,
                    format!("failed to read '{}': {}", physical, err),
                );
                return Err(PreprocessError::IncludeFailed { path: physical });
            }
        };

        self.preprocess_content(&physical, &content)
    }

    /// Expand source the host already holds; includes still resolve through
    /// the resolver, with `name` as the including file.
    pub fn preprocess_content(
        &mut self,
        name: &str,
        content: &str,
    ) -> Result<Preprocessed, PreprocessError> {
        let mut out = Emitter::new();
        self.include_stack.push(name.to_string());
        let result = self.process_file(name, content, &mut out);
        self.include_stack.pop();
        result?;

        Ok(Preprocessed {
            text: out.text,
            map: out.map,
        })
    }

    fn report(
        &self,
        code: DiagnosticCode,
        location: Option<SourceLocation>,
        message: impl Into<String>,
    ) {
        self.sink.report(Diagnostic::new(code, location, message));
    }

    // ------------------------------------------------------------------
    // File scanning
    // ------------------------------------------------------------------

    fn process_file(
        &mut self,
        path: &str,
        content: &str,
        out: &mut Emitter,
    ) -> Result<(), PreprocessError> {
        let mut reader = FileReader::new(path, content);
        let mut conditions: Vec<ConditionFrame> = Vec::new();
        let mut line_has_content = false;

        loop {
            let allow = conditions.iter().all(|f| f.active);
            let loc = reader.location();
            let Some(c) = reader.next() else { break };
            match c {
                '\n' => {
                    line_has_content = false;
                    if allow {
                        out.emit('\n', &loc);
                    }
                }
                '#' if !line_has_content => {
                    self.handle_directive(&loc, &mut reader, &mut conditions, out)?;
                    line_has_content = false;
                }
                '"' => {
                    line_has_content = true;
                    if allow {
                        out.emit('"', &loc);
                    }
                    loop {
                        let string_loc = reader.location();
                        match reader.next() {
                            None => break,
                            Some(sc) => {
                                if allow {
                                    out.emit(sc, &string_loc);
                                }
                                if sc == '"' {
                                    break;
                                }
                            }
                        }
                    }
                }
                c if c.is_ascii_alphanumeric() || c == '_' => {
                    line_has_content = true;
                    if allow {
                        reader.move_back();
                        let word_loc = reader.location();
                        let word = reader.get_word();
                        self.emit_word(&word, &word_loc, &mut reader, out);
                    }
                }
                c => {
                    if !c.is_whitespace() {
                        line_has_content = true;
                    }
                    if allow {
                        out.emit(c, &loc);
                    }
                }
            }
        }

        for frame in conditions.drain(..) {
            self.report(
                DiagnosticCode::MissingEndif,
                Some(frame.location),
                "missing #endif before end of file",
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Directives
    // ------------------------------------------------------------------

    fn handle_directive(
        &mut self,
        directive_loc: &SourceLocation,
        reader: &mut FileReader,
        conditions: &mut Vec<ConditionFrame>,
        out: &mut Emitter,
    ) -> Result<(), PreprocessError> {
        let allow = conditions.iter().all(|f| f.active);
        let word = reader.get_word();
        match word.as_str() {
            "define" => {
                if allow {
                    self.directive_define(reader);
                } else {
                    reader.get_line(true);
                }
            }
            "undef" => {
                if allow {
                    skip_inline_ws(reader);
                    let name = reader.get_word();
                    reader.get_line(true);
                    self.macros.undefine(&name);
                } else {
                    reader.get_line(true);
                }
            }
            "include" => {
                if allow {
                    self.directive_include(directive_loc, reader, out)?;
                } else {
                    reader.get_line(true);
                }
            }
            "ifdef" | "ifndef" => {
                let negate = word == "ifndef";
                skip_inline_ws(reader);
                let name_loc = reader.location();
                let name = reader.get_word();
                reader.get_line(true);
                if name.is_empty() {
                    let code = if negate {
                        DiagnosticCode::UnexpectedIfndef
                    } else {
                        DiagnosticCode::UnexpectedIfdef
                    };
                    self.report(code, Some(name_loc), format!("#{} without a macro name", word));
                    // Push an inactive frame anyway so the matching #endif
                    // does not misfire.
                    conditions.push(ConditionFrame {
                        active: false,
                        taken: true,
                        parent_allow: allow,
                        else_seen: false,
                        location: directive_loc.clone(),
                    });
                } else {
                    let defined = self.macros.contains(&name);
                    let active = allow && (defined != negate);
                    conditions.push(ConditionFrame {
                        active,
                        taken: active,
                        parent_allow: allow,
                        else_seen: false,
                        location: directive_loc.clone(),
                    });
                }
            }
            "else" => {
                reader.get_line(true);
                match conditions.last_mut() {
                    None => self.report(
                        DiagnosticCode::UnexpectedElse,
                        Some(directive_loc.clone()),
                        "#else outside of a conditional block",
                    ),
                    Some(frame) if frame.else_seen => self.report(
                        DiagnosticCode::UnexpectedElse,
                        Some(directive_loc.clone()),
                        "second #else in the same conditional block",
                    ),
                    Some(frame) => {
                        frame.else_seen = true;
                        frame.active = frame.parent_allow && !frame.taken;
                        frame.taken = true;
                    }
                }
            }
            "endif" => {
                reader.get_line(true);
                if conditions.pop().is_none() {
                    self.report(
                        DiagnosticCode::UnexpectedEndif,
                        Some(directive_loc.clone()),
                        "#endif outside of a conditional block",
                    );
                }
            }
            unknown => {
                if allow {
                    self.report(
                        DiagnosticCode::UnknownInstruction,
                        Some(directive_loc.clone()),
                        format!("unknown preprocessor instruction '#{}'", unknown),
                    );
                }
                reader.get_line(false);
            }
        }
        Ok(())
    }

    fn directive_define(&mut self, reader: &mut FileReader) {
        skip_inline_ws(reader);
        let name_loc = reader.location();
        let name = reader.get_word();
        if name.is_empty() {
            reader.get_line(true);
            return;
        }
        // A parameter list only counts when the '(' is flush with the name
        let params = if reader.peek(0) == Some('(') {
            reader.next();
            let mut params = Vec::new();
            let mut current = String::new();
            loop {
                match reader.next() {
                    None => break,
                    Some(')') => {
                        let trimmed = current.trim();
                        if !trimmed.is_empty() || !params.is_empty() {
                            params.push(trimmed.to_string());
                        }
                        break;
                    }
                    Some(',') => {
                        params.push(current.trim().to_string());
                        current.clear();
                    }
                    Some(c) => current.push(c),
                }
            }
            Some(params)
        } else {
            None
        };
        let body = reader.get_line(true).trim().to_string();
        let replaced = match params {
            Some(params) => self
                .macros
                .define(Macro::function(&name, params, body, name_loc.clone())),
            None => self.macros.define(Macro::object(&name, body, name_loc.clone())),
        };
        if replaced.is_some() {
            self.report(
                DiagnosticCode::MacroDefinedTwice,
                Some(name_loc),
                format!("macro '{}' defined twice", name),
            );
        }
    }

    fn directive_include(
        &mut self,
        directive_loc: &SourceLocation,
        reader: &mut FileReader,
        out: &mut Emitter,
    ) -> Result<(), PreprocessError> {
        let rest = reader.get_line(true);
        let trimmed = rest.trim();
        let (form, close) = match trimmed.chars().next() {
            Some('"') => (IncludeForm::Quoted, '"'),
            Some('<') => (IncludeForm::Angle, '>'),
            _ => {
                self.report(
                    DiagnosticCode::IncludeFailed,
                    Some(directive_loc.clone()),
                    format!("malformed #include line '{}'", trimmed),
                );
                return Ok(());
            }
        };
        let inner = &trimmed[1..];
        let Some(end) = inner.find(close) else {
            self.report(
                DiagnosticCode::IncludeFailed,
                Some(directive_loc.clone()),
                format!("unterminated #include path '{}'", trimmed),
            );
            return Ok(());
        };
        let logical = &inner[..end];
        let trailing = inner[end + 1..].trim();

        let included_from = self.include_stack.last().map(String::as_str);
        let physical = match self.resolver.resolve(included_from, form, logical) {
            Ok(p) => p,
            Err(err) => {
                self.report(
                    DiagnosticCode::IncludeFailed,
                    Some(directive_loc.clone()),
                    format!("failed to include '{}': {}", logical, err),
                );
                return Err(PreprocessError::IncludeFailed {
                    path: logical.to_string(),
                });
            }
        };
        if self.include_stack.contains(&physical) {
            let mut chain = self.include_stack.join(" -> ");
            chain.push_str(" -> ");
            chain.push_str(&physical);
            self.report(
                DiagnosticCode::RecursiveInclude,
                Some(directive_loc.clone()),
                format!("recursive include: {}", chain),
            );
            return Err(PreprocessError::RecursiveInclude { path: physical });
        }
        let content = match self.resolver.read(&physical) {
            Ok(c) => c,
            Err(err) => {
                self.report(
                    DiagnosticCode::IncludeFailed,
                    Some(directive_loc.clone()),
                    format!("failed to read '{}': {}", physical, err),
                );
                return Err(PreprocessError::IncludeFailed { path: physical });
            }
        };

        self.include_stack.push(physical.clone());
        let result = self.process_file(&physical, &content, out);
        self.include_stack.pop();
        result?;

        // The directive's own line terminator was consumed with the path;
        // restore separation when the included text does not end a line.
        if !out.text.ends_with('\n') {
            out.emit_pinned("\n", directive_loc);
        }

        if !trailing.is_empty() {
            self.report(
                DiagnosticCode::UnexpectedDataAfterInclude,
                Some(directive_loc.clone()),
                format!("unexpected data after #include: '{}'", trailing),
            );
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Macro expansion
    // ------------------------------------------------------------------

    /// Handle one word read from the file scanner: expand it if it names a
    /// macro, otherwise pass it through.
    fn emit_word(
        &mut self,
        word: &str,
        word_loc: &SourceLocation,
        reader: &mut FileReader,
        out: &mut Emitter,
    ) {
        let function_like = match self.macros.get(word) {
            Some(m) => m.is_function_like(),
            None => {
                for (i, c) in word.chars().enumerate() {
                    out.emit(c, &word_loc.with_col_offset(i as u32));
                }
                return;
            }
        };
        let mut active = HashSet::new();
        if function_like {
            // The invocation form requires '(' after optional whitespace
            let mut k = 0;
            while matches!(reader.peek(k), Some(' ') | Some('\t')) {
                k += 1;
            }
            if reader.peek(k) != Some('(') {
                for (i, c) in word.chars().enumerate() {
                    out.emit(c, &word_loc.with_col_offset(i as u32));
                }
                return;
            }
            for _ in 0..=k {
                reader.next();
            }
            let raw_args = capture_args_from_reader(reader);
            if let Some(expansion) = self.expand_function(word, &raw_args, word_loc, &mut active) {
                out.emit_pinned(&expansion, word_loc);
            }
        } else {
            let expansion = self.expand_object(word, word_loc, &mut active);
            out.emit_pinned(&expansion, word_loc);
        }
    }

    /// Expand an object-like macro: splice the body, then re-scan.
    fn expand_object(
        &mut self,
        name: &str,
        invocation: &SourceLocation,
        active: &mut HashSet<String>,
    ) -> String {
        let Some(m) = self.macros.get(name).cloned() else {
            return name.to_string();
        };
        active.insert(name.to_string());
        let substituted = self.substitute_body(&m, &[], &[], invocation, active);
        let result = self.expand_text(&substituted, invocation, active);
        active.remove(name);
        result
    }

    /// Expand a function-like macro invocation. `None` when the argument
    /// count does not match (the expansion is aborted).
    fn expand_function(
        &mut self,
        name: &str,
        raw_args: &[String],
        invocation: &SourceLocation,
        active: &mut HashSet<String>,
    ) -> Option<String> {
        let Some(m) = self.macros.get(name).cloned() else {
            return Some(name.to_string());
        };
        let params = m.params().unwrap_or(&[]);
        // `M()` parses as one empty argument; a zero-parameter macro accepts it
        let raw_args: &[String] =
            if params.is_empty() && raw_args.len() == 1 && raw_args[0].is_empty() {
                &[]
            } else {
                raw_args
            };
        if params.len() != raw_args.len() {
            self.report(
                DiagnosticCode::ArgCountMismatch,
                Some(invocation.clone()),
                format!(
                    "macro '{}' expects {} argument(s), got {}",
                    name,
                    params.len(),
                    raw_args.len()
                ),
            );
            return None;
        }
        active.insert(name.to_string());
        let expanded_args: Vec<String> = raw_args
            .iter()
            .map(|arg| self.expand_text(arg, invocation, active))
            .collect();
        let substituted = self.substitute_body(&m, raw_args, &expanded_args, invocation, active);
        let result = self.expand_text(&substituted, invocation, active);
        active.remove(name);
        Some(result)
    }

    /// Re-scan text for further macro expansion. Words in the active set are
    /// left literally (no recursive self-expansion).
    fn expand_text(
        &mut self,
        text: &str,
        invocation: &SourceLocation,
        active: &mut HashSet<String>,
    ) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut out = String::new();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c == '"' {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    i += 1;
                    if chars[i - 1] == '"' {
                        break;
                    }
                }
                continue;
            }
            if c.is_ascii_alphanumeric() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                let known = self
                    .macros
                    .get(&word)
                    .map(|m| m.is_function_like())
                    .filter(|_| !active.contains(&word));
                match known {
                    Some(true) => {
                        let mut j = i;
                        while j < chars.len() && (chars[j] == ' ' || chars[j] == '\t') {
                            j += 1;
                        }
                        if j < chars.len() && chars[j] == '(' {
                            let (raw_args, after) = capture_args_from_chars(&chars, j + 1);
                            i = after;
                            if let Some(expansion) =
                                self.expand_function(&word, &raw_args, invocation, active)
                            {
                                out.push_str(&expansion);
                            }
                        } else {
                            out.push_str(&word);
                        }
                    }
                    Some(false) => {
                        let expansion = self.expand_object(&word, invocation, active);
                        out.push_str(&expansion);
                    }
                    None => out.push_str(&word),
                }
                continue;
            }
            out.push(c);
            i += 1;
        }
        out
    }

    /// Substitute parameters, `#` stringification and `##` pasting into a
    /// macro body. The result still needs a re-scan pass.
    fn substitute_body(
        &mut self,
        m: &Macro,
        raw_args: &[String],
        expanded_args: &[String],
        invocation: &SourceLocation,
        active: &mut HashSet<String>,
    ) -> String {
        let params = m.params().unwrap_or(&[]);
        let param_index = |w: &str| params.iter().position(|p| p == w);
        let chars: Vec<char> = m.body().chars().collect();
        let mut out = String::new();
        let mut i = 0;
        let mut paste_pending = false;
        while i < chars.len() {
            let c = chars[i];
            if c == '"' {
                out.push(c);
                i += 1;
                while i < chars.len() {
                    out.push(chars[i]);
                    i += 1;
                    if chars[i - 1] == '"' {
                        break;
                    }
                }
                paste_pending = false;
                continue;
            }
            if c == '#' {
                if i + 1 < chars.len() && chars[i + 1] == '#' {
                    // Token paste: drop surrounding whitespace and take the
                    // neighbours literally (no expansion across the seam)
                    while out.ends_with(' ') || out.ends_with('\t') {
                        out.pop();
                    }
                    i += 2;
                    while i < chars.len() && (chars[i] == ' ' || chars[i] == '\t') {
                        i += 1;
                    }
                    paste_pending = true;
                    continue;
                }
                // Stringification
                i += 1;
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                if word.is_empty() {
                    out.push('#');
                    continue;
                }
                if let Some(idx) = param_index(&word) {
                    out.push_str(&quote_text(&raw_args[idx]));
                } else if let Some(other) = self.macros.get(&word).cloned() {
                    if other.is_function_like() {
                        self.report(
                            DiagnosticCode::MacroNotFound,
                            Some(invocation.clone()),
                            format!("cannot stringify function-like macro '{}'", word),
                        );
                        out.push('#');
                        out.push_str(&word);
                    } else if active.contains(&word) {
                        // Self-referential stringification stays literal
                        out.push_str(&quote_text(&word));
                    } else {
                        let expansion = self.expand_object(&word, invocation, active);
                        out.push_str(&quote_text(&expansion));
                    }
                } else {
                    self.report(
                        DiagnosticCode::MacroNotFound,
                        Some(invocation.clone()),
                        format!("macro '{}' not found", word),
                    );
                    out.push('#');
                    out.push_str(&word);
                }
                paste_pending = false;
                continue;
            }
            if c.is_ascii_alphanumeric() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                // A parameter adjacent to ## pastes its raw argument text
                let mut j = i;
                while j < chars.len() && (chars[j] == ' ' || chars[j] == '\t') {
                    j += 1;
                }
                let paste_next = j + 1 < chars.len() && chars[j] == '#' && chars[j + 1] == '#';
                match param_index(&word) {
                    Some(idx) if paste_pending || paste_next => out.push_str(&raw_args[idx]),
                    Some(idx) => out.push_str(&expanded_args[idx]),
                    None => out.push_str(&word),
                }
                paste_pending = false;
                continue;
            }
            out.push(c);
            if !c.is_whitespace() {
                paste_pending = false;
            }
            i += 1;
        }
        out
    }
}

/// Skip spaces and tabs at the cursor.
fn skip_inline_ws(reader: &mut FileReader) {
    while matches!(reader.peek(0), Some(' ') | Some('\t')) {
        reader.next();
    }
}

/// Embed text in double quotes, escaping `"` and `\`.
fn quote_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Capture a comma-separated argument list from the reader; the cursor sits
/// just past the opening parenthesis. Nesting of `()`, `[]`, `{}` and string
/// literals guard the separators.
fn capture_args_from_reader(reader: &mut FileReader) -> RawArgs {
    let mut args = RawArgs::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    loop {
        let Some(c) = reader.next() else { break };
        if in_string {
            current.push(c);
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' if depth == 0 => break,
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    args.push(current.trim().to_string());
    args
}

/// Same capture over an in-memory character slice, used while re-scanning
/// already substituted text. Returns the arguments and the index just past
/// the closing parenthesis.
fn capture_args_from_chars(chars: &[char], start: usize) -> (RawArgs, usize) {
    let mut args = RawArgs::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        i += 1;
        if in_string {
            current.push(c);
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                current.push(c);
            }
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' if depth == 0 => break,
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    args.push(current.trim().to_string());
    (args, i)
}
