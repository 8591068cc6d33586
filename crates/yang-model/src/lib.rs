#![deny(rust_2018_idioms)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # yang-model
//!
//! The read-only output of a reactor build.
//!
//! An [`EffectiveModel`] holds one [`ModuleEntry`] per compiled module, each
//! with an effective statement tree in which groupings are expanded,
//! augmentations applied, types resolved and inherited properties computed.
//! Everything here is immutable and `Send + Sync`; builds share equal
//! substructures through the [`StatementInterner`].

/// Parsed statement arguments.
pub mod argument;
/// Value interning for effective statements.
pub mod interner;
/// Model container and query API.
pub mod model;
/// Qualified names and schema paths.
pub mod qname;
/// Declared and effective statements.
pub mod statement;
/// Resolved type definitions.
pub mod types;

pub use argument::{Argument, IfFeatureExpr, Status};
pub use interner::StatementInterner;
pub use model::{DeclaredModel, EffectiveModel, ModuleEntry};
pub use qname::{QName, QNameModule, SchemaPath};
pub use statement::{
    DeclaredStatement, EffectiveProperties, EffectiveStatement, SCHEMA_NODE_KEYWORDS,
    StatementOrigin,
};
pub use types::{BitMember, BuiltinType, EnumMember, Restriction, TypeDefinition};

use thiserror::Error;

/// Errors raised by model queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Unknown module: {name}")]
    UnknownModule { name: String },

    #[error("Schema node not found: {path}")]
    NodeNotFound { path: String },
}

impl Error {
    /// Build an invalid-path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for model queries.
pub type Result<T> = std::result::Result<T, Error>;
