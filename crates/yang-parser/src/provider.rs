//! Directory-backed source provider
//!
//! Looks for `name@revision.yang` and `name.yang` under a list of search
//! paths. Parsed files are cached by path, so repeated requests for a shared
//! import parse the file once.

use crate::parser::parse_file;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use yang_ir::{Revision, SourceDocument, SourceIdentifier, SourceProvider};

/// Source provider reading `.yang` files from search paths
pub struct DirectorySourceProvider {
    search_paths: Vec<PathBuf>,
    cache: DashMap<PathBuf, SourceDocument>,
}

impl DirectorySourceProvider {
    /// Create a provider with the given search paths, searched in order
    #[must_use]
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        Self {
            search_paths,
            cache: DashMap::new(),
        }
    }

    /// Search paths in lookup order
    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Number of cached parsed files
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn load(&self, path: &Path) -> yang_ir::Result<SourceDocument> {
        if let Some(cached) = self.cache.get(path) {
            debug!("Cache hit for source: {}", path.display());
            return Ok(cached.clone());
        }

        trace!("Cache miss for source: {}", path.display());
        let document = parse_file(path).map_err(|e| yang_ir::Error::Provider {
            identifier: path.display().to_string(),
            message: e.to_string(),
        })?;
        self.cache.insert(path.to_path_buf(), document.clone());
        Ok(document)
    }

    /// Candidate files for `name` in one directory, with the revision
    /// encoded in the file name, if any
    fn candidates(dir: &Path, name: &str) -> Vec<(Option<Revision>, PathBuf)> {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return Vec::new();
        };

        entries
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "yang"))
            .filter_map(|path| {
                let stem = path.file_stem()?.to_str()?;
                let id = SourceIdentifier::parse(stem).ok()?;
                (id.name == name).then_some((id.revision, path))
            })
            .collect()
    }
}

impl SourceProvider for DirectorySourceProvider {
    fn fetch(&self, identifier: &SourceIdentifier) -> yang_ir::Result<SourceDocument> {
        for dir in &self.search_paths {
            if let Some(revision) = &identifier.revision {
                let exact = dir.join(format!("{}@{revision}.yang", identifier.name));
                if exact.exists() {
                    trace!("Found source file: {}", exact.display());
                    return self.load(&exact);
                }
            }

            let mut found = Vec::new();
            for (_, path) in Self::candidates(dir, &identifier.name) {
                let document = self.load(&path)?;
                if let Some(id) = document.identifier() {
                    if id.satisfies(identifier) {
                        found.push((id.revision, document));
                    }
                }
            }
            if let Some((_, document)) = found.into_iter().max_by(|a, b| a.0.cmp(&b.0)) {
                debug!("Resolved {} to {}", identifier, document.name);
                return Ok(document);
            }
        }

        Err(yang_ir::Error::source_not_found(identifier))
    }
}
