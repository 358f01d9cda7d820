use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Which include syntax was used.
///
/// Quoted includes search relative to the including file before the search
/// paths; angle includes search only the system paths.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IncludeForm {
    Quoted,
    Angle,
}

/// File resolution errors.
#[derive(Debug, Error)]
pub enum FileIoError {
    #[error("could not resolve include path '{0}'")]
    NotFound(String),
    #[error("failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Maps logical include paths to physical paths and contents.
///
/// The preprocessor's only door to the filesystem; hosts substitute their
/// own implementation to serve includes from archives or memory.
pub trait FileResolver {
    /// Resolve a logical path against the file it is included from.
    /// Returns the physical path used for cycle detection and diagnostics.
    fn resolve(
        &self,
        included_from: Option<&str>,
        form: IncludeForm,
        logical: &str,
    ) -> Result<String, FileIoError>;

    /// Read the contents of a previously resolved physical path.
    fn read(&self, physical: &str) -> Result<String, FileIoError>;
}

/// Resolver over the real filesystem with distinct search-path sets for the
/// two include forms.
#[derive(Default)]
pub struct PhysicalResolver {
    quoted_paths: Vec<PathBuf>,
    angle_paths: Vec<PathBuf>,
}

impl PhysicalResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_quoted_path(&mut self, path: impl Into<PathBuf>) {
        self.quoted_paths.push(path.into());
    }

    pub fn add_angle_path(&mut self, path: impl Into<PathBuf>) {
        self.angle_paths.push(path.into());
    }

    fn try_candidate(candidate: &Path) -> Option<String> {
        if candidate.is_file() {
            Some(candidate.to_string_lossy().into_owned())
        } else {
            None
        }
    }
}

impl FileResolver for PhysicalResolver {
    fn resolve(
        &self,
        included_from: Option<&str>,
        form: IncludeForm,
        logical: &str,
    ) -> Result<String, FileIoError> {
        if form == IncludeForm::Quoted {
            // Relative to the including file first
            if let Some(from) = included_from {
                if let Some(dir) = Path::new(from).parent() {
                    if let Some(found) = Self::try_candidate(&dir.join(logical)) {
                        return Ok(found);
                    }
                }
            }
            for base in &self.quoted_paths {
                if let Some(found) = Self::try_candidate(&base.join(logical)) {
                    return Ok(found);
                }
            }
        }
        for base in &self.angle_paths {
            if let Some(found) = Self::try_candidate(&base.join(logical)) {
                return Ok(found);
            }
        }
        // A bare path that exists as-is is accepted for either form
        if let Some(found) = Self::try_candidate(Path::new(logical)) {
            return Ok(found);
        }
        Err(FileIoError::NotFound(logical.to_string()))
    }

    fn read(&self, physical: &str) -> Result<String, FileIoError> {
        fs::read_to_string(physical).map_err(|source| FileIoError::Read {
            path: physical.to_string(),
            source,
        })
    }
}

/// Map-backed resolver for tests and embedded hosts.
#[derive(Default)]
pub struct MemoryResolver {
    files: HashMap<String, String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, logical: impl Into<String>, content: impl Into<String>) {
        self.files.insert(logical.into(), content.into());
    }

    pub fn with_file(mut self, logical: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(logical, content);
        self
    }
}

impl FileResolver for MemoryResolver {
    fn resolve(
        &self,
        _included_from: Option<&str>,
        _form: IncludeForm,
        logical: &str,
    ) -> Result<String, FileIoError> {
        if self.files.contains_key(logical) {
            Ok(logical.to_string())
        } else {
            Err(FileIoError::NotFound(logical.to_string()))
        }
    }

    fn read(&self, physical: &str) -> Result<String, FileIoError> {
        self.files
            .get(physical)
            .cloned()
            .ok_or_else(|| FileIoError::NotFound(physical.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_resolver_round_trip() {
        let resolver = MemoryResolver::new().with_file("a.hpp", "#define A 1");
        let physical = resolver
            .resolve(None, IncludeForm::Quoted, "a.hpp")
            .unwrap();
        assert_eq!(physical, "a.hpp");
        assert_eq!(resolver.read(&physical).unwrap(), "#define A 1");
    }

    #[test]
    fn memory_resolver_missing() {
        let resolver = MemoryResolver::new();
        assert!(matches!(
            resolver.resolve(None, IncludeForm::Angle, "nope.hpp"),
            Err(FileIoError::NotFound(_))
        ));
    }

    #[test]
    fn memory_resolver_ignores_include_origin() {
        let resolver = MemoryResolver::new().with_file("shared.hpp", "x");
        let physical = resolver
            .resolve(Some("deep/nested.sqf"), IncludeForm::Quoted, "shared.hpp")
            .unwrap();
        assert_eq!(physical, "shared.hpp");
    }
}
