#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # yang-ir
//!
//! Raw statement tree for YANG sources.
//!
//! A parser turns source text into a [`RawStatement`] forest: keyword, optional
//! argument, ordered substatements and the position each statement was read
//! from. Nothing in this crate resolves anything; the tree is plain data that
//! the reactor wraps into build contexts. The crate also carries the source
//! identity types ([`SourceIdentifier`], [`Revision`]), the [`SourceProvider`]
//! seam used to fetch missing imports, and a compact binary codec for caching
//! parsed trees between builds.

/// Binary pre-order encoding of statement trees.
pub mod codec;
/// Parsed source documents.
pub mod document;
/// Module names and revisions.
pub mod identifier;
/// Source positions attached to statements.
pub mod metadata;
/// Source provider seam for on-demand imports.
pub mod provider;
/// The raw statement tree itself.
pub mod statement;
/// Cursor-based traversal helpers for statement trees.
pub mod traversal;

/// Parsed document paired with its origin.
pub use document::{SourceDocument, SourceKind};
/// Source identity types.
pub use identifier::{Revision, SourceIdentifier};
/// Position and source metadata.
pub use metadata::{Position, SourceInfo};
/// Provider interface plus the in-memory implementation.
pub use provider::{MemorySourceProvider, SourceProvider};
/// Raw statement primitives.
pub use statement::{Keyword, RawStatement};
/// Statement cursor.
pub use traversal::Cursor;

use thiserror::Error;

/// Errors that can occur when working with raw statement trees
#[derive(Error, Debug)]
pub enum Error {
    #[error("Statement not found at path: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Invalid revision '{value}': {reason}")]
    InvalidRevision { value: String, reason: String },

    #[error("Codec error at byte {offset}: {message}")]
    Codec { offset: usize, message: String },

    #[error("Source not found: {identifier}")]
    SourceNotFound { identifier: String },

    #[error("Source provider failed for {identifier}: {message}")]
    Provider { identifier: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a node-not-found error with path context.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build a codec error at the given byte offset.
    pub fn codec(offset: usize, message: impl Into<String>) -> Self {
        Self::Codec {
            offset,
            message: message.into(),
        }
    }

    /// Build a source-not-found error for the requested identifier.
    pub fn source_not_found(identifier: &SourceIdentifier) -> Self {
        Self::SourceNotFound {
            identifier: identifier.to_string(),
        }
    }

    /// Build a provider failure for the requested identifier.
    pub fn provider(identifier: &SourceIdentifier, message: impl Into<String>) -> Self {
        Self::Provider {
            identifier: identifier.to_string(),
            message: message.into(),
        }
    }
}

/// Crate-local result type for IR operations.
pub type Result<T> = std::result::Result<T, Error>;
