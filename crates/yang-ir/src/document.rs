//! Parsed source documents

use crate::identifier::{Revision, SourceIdentifier};
use crate::statement::RawStatement;
use serde::{Deserialize, Serialize};

/// Whether a document declares a module or a submodule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Module,
    Submodule,
}

/// A parsed source: the root statement and the name it was loaded from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// File path or other origin label used in diagnostics
    pub name: String,

    /// Root statement (`module` or `submodule`)
    pub root: RawStatement,
}

impl SourceDocument {
    /// Create a document
    #[must_use]
    pub fn new(name: impl Into<String>, root: RawStatement) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Kind of the root statement, if it is a module or submodule
    #[must_use]
    pub fn kind(&self) -> Option<SourceKind> {
        if self.root.keyword.is("module") {
            Some(SourceKind::Module)
        } else if self.root.keyword.is("submodule") {
            Some(SourceKind::Submodule)
        } else {
            None
        }
    }

    /// Identifier read straight from the raw tree: root argument plus the
    /// newest `revision` substatement.
    ///
    /// Used to index library sources before any reactor work runs; the
    /// reactor computes the authoritative identifier itself.
    #[must_use]
    pub fn identifier(&self) -> Option<SourceIdentifier> {
        self.kind()?;
        let name = self.root.argument()?;
        let revision = self
            .root
            .find_substatements("revision")
            .into_iter()
            .filter_map(|r| r.argument().and_then(|a| Revision::parse(a).ok()))
            .max();
        Some(SourceIdentifier {
            name: name.to_string(),
            revision,
        })
    }
}
