//! Source resolution and import linkage
//!
//! Pre-linkage callbacks record what each source is (name, revision,
//! namespace, prefix) and what it needs (imports, includes). Once
//! pre-linkage settles, missing sources are pulled from the library set or
//! the [`SourceProvider`](yang_ir::SourceProvider), and the import graph is
//! ordered with Kahn's algorithm. The resulting linkage index orders the
//! modules of the output and breaks ties between augments.

use crate::arena::{CtxId, Idx, SourceId};
use crate::config::ImportResolutionMode;
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use crate::namespace::{Namespace, NsKey, NsValue};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};
use yang_ir::{Revision, SourceIdentifier, SourceKind};
use yang_model::{QName, QNameModule};

/// Module name → module root context
pub static MODULE: Namespace = Namespace::global("module");
/// Submodule name → submodule root context
pub static SUBMODULE: Namespace = Namespace::global("submodule");
/// Namespace URI → module root context
pub static NAMESPACE_TO_MODULE: Namespace = Namespace::global("namespace-to-module");
/// Prefix → module name, per source
pub static IMPORT_PREFIX: Namespace = Namespace::source_local("import-prefix");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    Import,
    Include,
}

/// A source another source needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub kind: RequirementKind,
    pub identifier: SourceIdentifier,
    pub requester: CtxId,
}

/// Linkage state of one compiled source
#[derive(Debug, Clone)]
pub(crate) struct SourceEntry {
    pub(crate) document: String,
    pub(crate) identifier: SourceIdentifier,
    pub(crate) kind: SourceKind,
    pub(crate) library: bool,
    pub(crate) root: CtxId,
    pub(crate) namespace: Option<String>,
    pub(crate) module: Option<QNameModule>,
    pub(crate) prefix: Option<String>,
    /// Root of the owning module, for submodules
    pub(crate) owner: Option<CtxId>,
    pub(crate) requirements: Vec<Requirement>,
    pub(crate) linkage_index: Option<usize>,
}

impl SourceEntry {
    pub(crate) fn new(document: String, name: String, kind: SourceKind, library: bool, root: CtxId) -> Self {
        Self {
            document,
            identifier: SourceIdentifier::new(name),
            kind,
            library,
            root,
            namespace: None,
            module: None,
            prefix: None,
            owner: None,
            requirements: Vec::new(),
            linkage_index: None,
        }
    }
}

/// Order sources so that every source follows the sources it requires.
///
/// `edges` are `(dependency, dependent)` index pairs. Sources that become
/// ready together are taken in identifier order. A cycle is an
/// [`ReactorError::ImportCycle`] in strict mode; in lenient mode the
/// smallest remaining source is forced next.
///
/// # Errors
///
/// Returns [`ReactorError::ImportCycle`] listing the cycle in strict mode.
pub fn link_order(
    nodes: &[SourceIdentifier],
    edges: &[(usize, usize)],
    mode: ImportResolutionMode,
) -> Result<Vec<usize>> {
    let mut dependents: IndexMap<usize, Vec<usize>> = (0..nodes.len()).map(|i| (i, Vec::new())).collect();
    let mut in_degree: Vec<usize> = vec![0; nodes.len()];
    for &(dependency, dependent) in edges {
        if dependency == dependent {
            continue;
        }
        dependents.entry(dependency).or_default().push(dependent);
        in_degree[dependent] += 1;
    }

    let mut ready: BTreeSet<(&SourceIdentifier, usize)> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, d)| **d == 0)
        .map(|(i, _)| (&nodes[i], i))
        .collect();
    let mut placed = vec![false; nodes.len()];
    let mut order = Vec::with_capacity(nodes.len());

    while order.len() < nodes.len() {
        let Some((_, next)) = ready.pop_first() else {
            let remaining: Vec<usize> = (0..nodes.len()).filter(|i| !placed[*i]).collect();
            if mode == ImportResolutionMode::Strict {
                let cycle = trace_cycle_path(&remaining, edges);
                return Err(ReactorError::ImportCycle {
                    cycle: cycle.iter().map(|i| nodes[*i].to_string()).collect(),
                });
            }
            let forced = remaining
                .into_iter()
                .min_by(|a, b| nodes[*a].cmp(&nodes[*b]))
                .ok_or_else(|| ReactorError::invariant("empty import cycle"))?;
            debug!(source = %nodes[forced], "breaking import cycle");
            in_degree[forced] = 0;
            ready.insert((&nodes[forced], forced));
            continue;
        };
        if placed[next] {
            continue;
        }
        placed[next] = true;
        order.push(next);
        for &dependent in dependents.get(&next).into_iter().flatten() {
            if placed[dependent] {
                continue;
            }
            in_degree[dependent] = in_degree[dependent].saturating_sub(1);
            if in_degree[dependent] == 0 {
                ready.insert((&nodes[dependent], dependent));
            }
        }
    }
    Ok(order)
}

/// One concrete cycle among `remaining`, following requirement direction,
/// e.g. `[a, b, a]` for "a imports b imports a"
fn trace_cycle_path(remaining: &[usize], edges: &[(usize, usize)]) -> Vec<usize> {
    let members: HashSet<usize> = remaining.iter().copied().collect();
    let Some(&start) = remaining.first() else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(next) = edges
            .iter()
            .filter(|(dependency, dependent)| *dependent == current && members.contains(dependency))
            .map(|(dependency, _)| *dependency)
            .min()
        else {
            break;
        };
        if let Some(pos) = path.iter().position(|n| *n == next) {
            path.push(next);
            return path.split_off(pos);
        }
        path.push(next);
        current = next;
    }
    path
}

impl BuildContext {
    // -- recording, called from pre-linkage and linkage callbacks ---------

    /// Note a revision of the source of `ctx`; the newest one wins
    pub fn note_source_revision(&mut self, ctx: CtxId, revision: Revision) {
        let source = &mut self.sources[self.contexts[ctx].source];
        if source.identifier.revision.is_none_or(|r| r < revision) {
            source.identifier.revision = Some(revision);
        }
    }

    pub fn set_source_namespace(&mut self, ctx: CtxId, namespace: impl Into<String>) {
        let source = self.contexts[ctx].source;
        self.sources[source].namespace = Some(namespace.into());
    }

    pub fn set_source_prefix(&mut self, ctx: CtxId, prefix: impl Into<String>) {
        let source = self.contexts[ctx].source;
        self.sources[source].prefix = Some(prefix.into());
    }

    /// Set the module identifiers of the source of `ctx` belong to
    pub fn set_source_module(&mut self, ctx: CtxId, module: QNameModule) {
        let source = self.contexts[ctx].source;
        self.sources[source].module = Some(module);
    }

    /// Attach a submodule to its owning module
    pub fn set_source_owner(&mut self, ctx: CtxId, owner_root: CtxId) {
        let source = self.contexts[ctx].source;
        let module = self.sources[self.contexts[owner_root].source].module.clone();
        let entry = &mut self.sources[source];
        entry.owner = Some(owner_root);
        entry.module = module;
    }

    pub fn add_requirement(&mut self, ctx: CtxId, kind: RequirementKind, identifier: SourceIdentifier) {
        let source = self.contexts[ctx].source;
        self.sources[source].requirements.push(Requirement {
            kind,
            identifier,
            requester: ctx,
        });
    }

    // -- queries ----------------------------------------------------------

    #[must_use]
    pub fn source_identifier(&self, ctx: CtxId) -> &SourceIdentifier {
        &self.sources[self.contexts[ctx].source].identifier
    }

    #[must_use]
    pub fn source_kind(&self, ctx: CtxId) -> SourceKind {
        self.sources[self.contexts[ctx].source].kind
    }

    #[must_use]
    pub fn source_namespace(&self, ctx: CtxId) -> Option<&str> {
        self.sources[self.contexts[ctx].source].namespace.as_deref()
    }

    #[must_use]
    pub fn source_prefix(&self, ctx: CtxId) -> Option<&str> {
        self.sources[self.contexts[ctx].source].prefix.as_deref()
    }

    /// Owning module root of the submodule `ctx` belongs to
    #[must_use]
    pub fn source_owner(&self, ctx: CtxId) -> Option<CtxId> {
        self.sources[self.contexts[ctx].source].owner
    }

    /// Position of the source of `ctx` in linkage order
    #[must_use]
    pub fn linkage_index(&self, ctx: CtxId) -> Option<usize> {
        self.sources[self.contexts[ctx].source].linkage_index
    }

    /// Module name bound to `prefix` in the source of `ctx`
    #[must_use]
    pub fn module_name_for_prefix(&self, ctx: CtxId, prefix: &str) -> Option<String> {
        self.get(ctx, &IMPORT_PREFIX, &NsKey::name(prefix))
            .and_then(|v| v.as_text().map(str::to_string))
    }

    /// Module bound to `prefix` in the source of `ctx`
    #[must_use]
    pub fn resolve_prefix(&self, ctx: CtxId, prefix: &str) -> Option<QNameModule> {
        let name = self.module_name_for_prefix(ctx, prefix)?;
        let root = self.get(ctx, &MODULE, &NsKey::Name(name))?.as_ctx()?;
        self.sources[self.contexts[root].source].module.clone()
    }

    /// Resolve `prefix:name` or `name` as written at `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::InvalidStatement`] for an unknown prefix or
    /// a source without a module.
    pub fn resolve_identifier(&self, ctx: CtxId, text: &str) -> Result<QName> {
        let (module, local) = match text.split_once(':') {
            Some((prefix, local)) => (
                self.resolve_prefix(ctx, prefix).ok_or_else(|| {
                    self.statement_error(ctx, format!("unknown prefix '{prefix}' in '{text}'"))
                })?,
                local,
            ),
            None => (
                self.lexical_module(ctx).ok_or_else(|| {
                    self.statement_error(ctx, format!("no module bound while resolving '{text}'"))
                })?,
                text,
            ),
        };
        if local.is_empty() {
            return Err(self.statement_error(ctx, format!("malformed identifier '{text}'")));
        }
        Ok(module.qname(local))
    }

    // -- resolution -------------------------------------------------------

    fn find_source(&self, requested: &SourceIdentifier) -> Option<SourceId> {
        self.sources
            .iter_enumerated()
            .find(|(_, s)| s.identifier.satisfies(requested))
            .map(|(id, _)| id)
    }

    /// Pull every required source that is not part of the build yet.
    ///
    /// Library sources are tried first (exact revision, else the newest),
    /// then the source provider. Returns whether anything was added.
    ///
    /// # Errors
    ///
    /// [`ReactorError::MissingSource`] naming requester and requirement,
    /// or [`ReactorError::SourceFetch`] when the provider fails otherwise.
    pub(crate) fn pull_required_sources(&mut self) -> Result<bool> {
        let requirements: Vec<(String, Requirement)> = self
            .sources
            .iter()
            .flat_map(|s| s.requirements.iter().map(|r| (s.identifier.to_string(), r.clone())))
            .collect();

        let mut added = false;
        for (requester, requirement) in requirements {
            if self.find_source(&requirement.identifier).is_some() {
                continue;
            }
            let document = match self.take_library_source(&requirement.identifier) {
                Some(document) => document,
                None => match &self.provider {
                    Some(provider) => match provider.fetch(&requirement.identifier) {
                        Ok(document) => document,
                        Err(yang_ir::Error::SourceNotFound { .. }) => {
                            return Err(ReactorError::MissingSource {
                                requester,
                                required: requirement.identifier.to_string(),
                            });
                        }
                        Err(e) => {
                            return Err(ReactorError::SourceFetch {
                                identifier: requirement.identifier.to_string(),
                                message: e.to_string(),
                            });
                        }
                    },
                    None => {
                        return Err(ReactorError::MissingSource {
                            requester,
                            required: requirement.identifier.to_string(),
                        });
                    }
                },
            };
            info!(source = %document.name, required_by = %requester, "pulling required source");
            self.add_source_tree(&document, true)?;
            added = true;
        }
        Ok(added)
    }

    fn take_library_source(&mut self, requested: &SourceIdentifier) -> Option<yang_ir::SourceDocument> {
        let candidates: Vec<(usize, Option<SourceIdentifier>)> = self
            .library
            .iter()
            .enumerate()
            .map(|(i, d)| (i, d.identifier()))
            .filter(|(_, id)| id.as_ref().is_some_and(|id| id.name == requested.name))
            .collect();
        let exact = candidates
            .iter()
            .find(|(_, id)| id.as_ref().is_some_and(|id| id.satisfies(requested)));
        let chosen = exact
            .or_else(|| candidates.iter().max_by(|a, b| a.1.cmp(&b.1)))
            .map(|(i, _)| *i)?;
        Some(self.library.swap_remove(chosen))
    }

    /// Order all sources and record their linkage index.
    ///
    /// # Errors
    ///
    /// [`ReactorError::ImportCycle`] in strict mode.
    pub(crate) fn compute_linkage_order(&mut self) -> Result<()> {
        let nodes: Vec<SourceIdentifier> = self.sources.iter().map(|s| s.identifier.clone()).collect();
        let mut edges = Vec::new();
        for (dependent, source) in self.sources.iter_enumerated() {
            for requirement in &source.requirements {
                if let Some(dependency) = self.find_source(&requirement.identifier) {
                    edges.push((dependency.index(), dependent.index()));
                }
            }
        }

        let order = link_order(&nodes, &edges, self.config.import_resolution)?;
        let ids: Vec<SourceId> = self.sources.indices().collect();
        for (position, index) in order.iter().enumerate() {
            self.sources[ids[*index]].linkage_index = Some(position);
        }
        debug!(
            order = ?order.iter().map(|i| nodes[*i].to_string()).collect::<Vec<_>>(),
            "linkage order"
        );
        Ok(())
    }

    /// Sources in linkage order
    pub(crate) fn linked_sources(&self) -> Vec<SourceId> {
        let mut ids: Vec<SourceId> = self.sources.indices().collect();
        ids.sort_by_key(|id| self.sources[*id].linkage_index.unwrap_or(usize::MAX));
        ids
    }

    /// Register a module root under its name and namespace
    ///
    /// # Errors
    ///
    /// [`ReactorError::Conflict`] when the name or namespace is taken.
    pub fn declare_module(&mut self, root: CtxId, name: &str) -> Result<()> {
        self.put(root, &MODULE, NsKey::name(name), NsValue::Ctx(root))
    }
}
