#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # yang-parser
//!
//! Turns YANG source text into [`yang_ir::RawStatement`] trees.
//!
//! The parser only understands the generic statement grammar (keyword,
//! optional argument, `;` or a braced block); it knows nothing about what a
//! keyword means. Quoting, escapes, `+` concatenation and comments are
//! handled by the lexer. [`DirectorySourceProvider`] plugs the parser into
//! the reactor's source provider seam.

/// Byte-level lexer
pub mod lexer;
/// Statement grammar on top of the lexer
pub mod parser;
/// Filesystem-backed source provider
pub mod provider;

pub use parser::{StatementParser, parse_file, parse_str};
pub use provider::DirectorySourceProvider;

use thiserror::Error;

/// Errors that can occur when parsing YANG text
#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error in {source_name} at line {line}, col {column}: {message}")]
    Parse {
        source_name: String,
        line: usize,
        column: usize,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a parse error at a location
    pub fn parse(
        source_name: impl Into<String>,
        line: usize,
        column: usize,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            line,
            column,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
