use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// A position in an original source file.
///
/// Lines are 1-based; columns are 0-based, matching the historical tooling
/// this toolchain interoperates with. The path is shared so locations can be
/// attached to every instruction without duplicating the string.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct SourceLocation {
    path: Arc<str>,
    line: u32,
    col: u32,
}

impl SourceLocation {
    pub fn new(path: impl Into<Arc<str>>, line: u32, col: u32) -> Self {
        Self {
            path: path.into(),
            line,
            col,
        }
    }

    /// Location for values produced by the host rather than parsed source.
    pub fn native() -> Self {
        Self::new("<native>", 0, 0)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn shared_path(&self) -> Arc<str> {
        Arc::clone(&self.path)
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn col(&self) -> u32 {
        self.col
    }

    /// The same location shifted right within its line.
    pub fn with_col_offset(&self, delta: u32) -> Self {
        Self {
            path: Arc::clone(&self.path),
            line: self.line,
            col: self.col + delta,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}|L{}|C{}]", self.path, self.line, self.col)
    }
}

/// A node with an associated source location.
#[derive(Clone, PartialEq, Debug)]
pub struct Located<T> {
    node: T,
    location: SourceLocation,
}

impl<T> Located<T> {
    pub fn new(node: T, location: SourceLocation) -> Self {
        Self { node, location }
    }

    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    pub fn into_inner(self) -> T {
        self.node
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Located<U> {
        Located {
            node: f(self.node),
            location: self.location,
        }
    }
}

impl<T> Deref for Located<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.node
    }
}
