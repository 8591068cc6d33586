//! Source provider seam
//!
//! The reactor asks a [`SourceProvider`] for every import or include that
//! neither the requested sources nor the library sources satisfy. Caching and
//! retry policy belong to the provider.

use crate::document::SourceDocument;
use crate::identifier::SourceIdentifier;
use crate::{Error, Result};
use tracing::trace;

/// Supplies parsed sources by identifier
pub trait SourceProvider: Send + Sync {
    /// Fetch the source for `identifier`.
    ///
    /// A request without a revision should return the newest revision known
    /// to the provider.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceNotFound`] when no matching source exists, or
    /// any error raised while loading it.
    fn fetch(&self, identifier: &SourceIdentifier) -> Result<SourceDocument>;
}

/// Provider over documents already held in memory
#[derive(Debug, Default, Clone)]
pub struct MemorySourceProvider {
    documents: Vec<SourceDocument>,
}

impl MemorySourceProvider {
    /// Create an empty provider
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document
    pub fn add(&mut self, document: SourceDocument) -> &mut Self {
        self.documents.push(document);
        self
    }

    /// Number of registered documents
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether no documents are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl FromIterator<SourceDocument> for MemorySourceProvider {
    fn from_iter<T: IntoIterator<Item = SourceDocument>>(iter: T) -> Self {
        Self {
            documents: iter.into_iter().collect(),
        }
    }
}

impl SourceProvider for MemorySourceProvider {
    fn fetch(&self, identifier: &SourceIdentifier) -> Result<SourceDocument> {
        trace!("Memory provider lookup: {}", identifier);
        self.documents
            .iter()
            .filter_map(|doc| doc.identifier().map(|id| (id, doc)))
            .filter(|(id, _)| id.satisfies(identifier))
            .max_by(|(a, _), (b, _)| a.revision.cmp(&b.revision))
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| Error::source_not_found(identifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Revision;
    use crate::statement::RawStatement;

    fn module(name: &str, revision: &str) -> SourceDocument {
        SourceDocument::new(
            format!("{name}@{revision}.yang"),
            RawStatement::with_argument("module", name)
                .with_substatement(RawStatement::with_argument("revision", revision)),
        )
    }

    #[test]
    fn test_fetch_latest_when_unversioned() {
        let provider: MemorySourceProvider = vec![
            module("a", "2020-01-01"),
            module("a", "2022-01-01"),
            module("b", "2021-01-01"),
        ]
        .into_iter()
        .collect();

        let doc = provider.fetch(&SourceIdentifier::new("a")).unwrap();
        assert_eq!(doc.name, "a@2022-01-01.yang");
    }

    #[test]
    fn test_fetch_exact_revision() {
        let mut provider = MemorySourceProvider::new();
        provider.add(module("a", "2020-01-01")).add(module("a", "2022-01-01"));

        let wanted = SourceIdentifier::with_revision("a", Revision::parse("2020-01-01").unwrap());
        let doc = provider.fetch(&wanted).unwrap();
        assert_eq!(doc.name, "a@2020-01-01.yang");
        assert_eq!(provider.len(), 2);
    }

    #[test]
    fn test_fetch_missing() {
        let provider = MemorySourceProvider::new();
        let result = provider.fetch(&SourceIdentifier::new("missing"));
        match result {
            Err(Error::SourceNotFound { identifier }) => assert_eq!(identifier, "missing"),
            other => panic!("Expected SourceNotFound, got {other:?}"),
        }
    }
}
