//! Positions and source references for statements and diagnostics
#![allow(clippy::must_use_candidate)] // Constructor helpers are clear at call sites without #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent setters are designed for chaining.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source position of a statement keyword
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: usize,

    /// Column number (1-indexed)
    pub column: usize,

    /// Byte offset from start of file
    pub offset: usize,

    /// Length of the statement in bytes
    pub length: usize,
}

/// Where a statement or diagnostic came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Source file path or identifier
    pub source: String,

    /// Position within the source
    pub position: Position,

    /// Additional context (e.g. the statement keyword and argument)
    pub context: Option<String>,
}

impl Position {
    /// Create a new position
    #[must_use]
    pub fn new(line: usize, column: usize, offset: usize, length: usize) -> Self {
        Self {
            line,
            column,
            offset,
            length,
        }
    }

    /// Position with only line and column known
    #[must_use]
    pub fn at(line: usize, column: usize) -> Self {
        Self::new(line, column, 0, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl SourceInfo {
    /// Create new source info
    #[must_use]
    pub fn new(source: impl Into<String>, position: Position) -> Self {
        Self {
            source: source.into(),
            position,
            context: None,
        }
    }

    /// Add context
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.position)?;
        if let Some(context) = &self.context {
            write!(f, " ({context})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_creation() {
        let pos = Position::new(10, 20, 100, 50);
        assert_eq!(pos.line, 10);
        assert_eq!(pos.column, 20);
        assert_eq!(pos.offset, 100);
        assert_eq!(pos.length, 50);
    }

    #[test]
    fn test_position_default() {
        let pos = Position::default();
        assert_eq!(pos.line, 0);
        assert_eq!(pos.column, 0);
    }

    #[test]
    fn test_source_info_display() {
        let info = SourceInfo::new("a.yang", Position::at(3, 5));
        assert_eq!(info.to_string(), "a.yang:3:5");

        let info = info.with_context("leaf x");
        assert_eq!(info.to_string(), "a.yang:3:5 (leaf x)");
    }
}
