//! C-style preprocessor for SQF source.
//!
//! Consumes a root file through a [`sqf_core::FileResolver`], honours
//! `#define`/`#undef`/`#include`/`#ifdef`/`#ifndef`/`#else`/`#endif`, expands
//! object-like and function-like macros (with stringification and token
//! pasting), folds comments and line continuations, and emits a single
//! expanded string together with a map from every output offset back to its
//! original file, line and column.

mod macros;
mod position_map;
mod preprocess;
mod reader;

pub use macros::{Macro, MacroTable};
pub use position_map::PositionMap;
pub use preprocess::{Preprocessed, PreprocessError, Preprocessor};
pub use reader::FileReader;
