//! Declared and effective model assembly
//!
//! Runs after the last phase. Statements are built bottom-up through their
//! supports' factories, so every factory sees finished children. Copies
//! share the declared statement of their prototype.

use crate::arena::{CtxId, SourceId};
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use yang_ir::SourceKind;
use yang_model::{
    DeclaredModel, DeclaredStatement, EffectiveModel, EffectiveStatement, ModuleEntry,
    StatementInterner, StatementOrigin,
};

/// Submodule statements that stay with the submodule
const SUBMODULE_HEADER: &[&str] = &[
    "yang-version",
    "belongs-to",
    "import",
    "include",
    "revision",
    "organization",
    "contact",
    "description",
    "reference",
];

type DeclaredMap = HashMap<CtxId, Arc<DeclaredStatement>>;

impl BuildContext {
    /// Declared statement of `ctx` with the given, already built children
    #[must_use]
    pub fn default_declared(&self, ctx: CtxId, substatements: Vec<Arc<DeclaredStatement>>) -> DeclaredStatement {
        let entry = &self.contexts[ctx];
        DeclaredStatement {
            keyword: entry.keyword.clone(),
            raw_argument: entry.raw_argument.clone(),
            argument: entry.argument.clone(),
            substatements,
            source: self.source_info(ctx),
        }
    }

    /// Effective statement carrying the argument and inferred properties
    /// of `ctx`
    #[must_use]
    pub fn default_effective(
        &self,
        ctx: CtxId,
        declared: Option<Arc<DeclaredStatement>>,
        substatements: Vec<Arc<EffectiveStatement>>,
    ) -> EffectiveStatement {
        let entry = &self.contexts[ctx];
        let mut properties = entry.properties.clone();
        properties.origin = entry.origin;
        EffectiveStatement {
            keyword: entry.keyword.clone(),
            argument: entry.argument.clone(),
            declared,
            substatements,
            properties,
        }
    }

    /// Declared statements of every source, keyed by context
    fn declared_statements(&self) -> DeclaredMap {
        let mut built = DeclaredMap::new();
        for source in self.sources.iter() {
            let mut stack = vec![(source.root, false)];
            while let Some((ctx, visited)) = stack.pop() {
                let declared_children = self.declared_children(ctx);
                if visited {
                    let substatements = declared_children
                        .into_iter()
                        .filter_map(|c| built.get(&c).cloned())
                        .collect();
                    let support = Arc::clone(&self.contexts[ctx].support);
                    built.insert(ctx, Arc::new(support.create_declared(self, ctx, substatements)));
                } else {
                    stack.push((ctx, true));
                    stack.extend(declared_children.into_iter().rev().map(|c| (c, false)));
                }
            }
        }
        built
    }

    /// Declared children of `ctx`, looking through implicit wrappers
    fn declared_children(&self, ctx: CtxId) -> Vec<CtxId> {
        let mut out = Vec::new();
        let mut pending: Vec<CtxId> = self.contexts[ctx].children.iter().rev().copied().collect();
        while let Some(child) = pending.pop() {
            match self.contexts[child].origin {
                StatementOrigin::Declared => out.push(child),
                StatementOrigin::Implicit => {
                    pending.extend(self.contexts[child].children.iter().rev().copied());
                }
                _ => {}
            }
        }
        out
    }

    pub(crate) fn assemble_declared_model(&self) -> Result<DeclaredModel> {
        let built = self.declared_statements();
        let mut sources = Vec::with_capacity(self.sources.len());
        for id in self.linked_sources() {
            let source = &self.sources[id];
            let root = built.get(&source.root).cloned().ok_or_else(|| {
                ReactorError::invariant(format!("no declared root for {}", source.identifier))
            })?;
            sources.push((source.identifier.clone(), root));
        }
        Ok(DeclaredModel::new(sources))
    }

    fn of_kind(&self, order: &[SourceId], kind: SourceKind) -> Vec<SourceId> {
        order.iter().copied().filter(|id| self.sources[*id].kind == kind).collect()
    }

    /// Build the effective model of every compiled module.
    ///
    /// Submodules are built first; their top-level statements are merged
    /// into the module that owns them.
    pub(crate) fn assemble_effective_model(&mut self, interner: &StatementInterner) -> Result<EffectiveModel> {
        let declared = self.declared_statements();
        let order = self.linked_sources();

        let mut contributed: HashMap<CtxId, Vec<Arc<EffectiveStatement>>> = HashMap::new();
        for id in self.of_kind(&order, SourceKind::Submodule) {
            let source = &self.sources[id];
            let (root, owner) = (source.root, source.owner);
            let Some(owner) = owner else {
                return Err(ReactorError::invariant(format!(
                    "submodule {} has no owning module",
                    source.identifier
                )));
            };
            if let Some(effective) = self.build_effective_tree(root, interner, &declared, Vec::new())? {
                contributed.entry(owner).or_default().extend(
                    effective
                        .substatements
                        .iter()
                        .filter(|s| !SUBMODULE_HEADER.iter().any(|k| s.is(k)))
                        .cloned(),
                );
            }
        }

        let mut modules = Vec::new();
        for id in self.of_kind(&order, SourceKind::Module) {
            let root = self.sources[id].root;
            let extra = contributed.remove(&root).unwrap_or_default();
            let effective = self
                .build_effective_tree(root, interner, &declared, extra)?
                .ok_or_else(|| ReactorError::invariant(format!("module {} has no effective form", self.describe(root))))?;

            let source = &self.sources[id];
            let module = source.module.clone().ok_or_else(|| {
                ReactorError::invariant(format!("module {} has no namespace", source.identifier))
            })?;
            let submodules = self
                .sources
                .iter()
                .filter(|s| s.kind == SourceKind::Submodule && s.owner == Some(root))
                .map(|s| s.identifier.clone())
                .collect();
            modules.push(ModuleEntry {
                name: source.identifier.name.clone(),
                revision: source.identifier.revision,
                module,
                prefix: source.prefix.clone().unwrap_or_default(),
                effective,
                declared: declared.get(&root).cloned().ok_or_else(|| {
                    ReactorError::invariant(format!("no declared root for {}", source.identifier))
                })?,
                submodules,
            });
        }

        let model = EffectiveModel::new(modules);
        self.stats.effective_statements = model.statement_count();
        debug!(
            modules = model.modules().len(),
            statements = self.stats.effective_statements,
            interned = interner.len(),
            "effective model assembled"
        );
        Ok(model)
    }

    fn in_effective_model(&self, ctx: CtxId) -> bool {
        let entry = &self.contexts[ctx];
        !entry.inactive() && self.is_effectively_supported(ctx) && entry.support.in_effective_model()
    }

    /// Post-order build of the effective tree under `root`; `extra` is
    /// appended to the root's children
    fn build_effective_tree(
        &mut self,
        root: CtxId,
        interner: &StatementInterner,
        declared: &DeclaredMap,
        mut extra: Vec<Arc<EffectiveStatement>>,
    ) -> Result<Option<Arc<EffectiveStatement>>> {
        if !self.in_effective_model(root) {
            return Ok(None);
        }
        let mut built: HashMap<CtxId, Arc<EffectiveStatement>> = HashMap::new();
        let mut stack = vec![(root, false)];
        while let Some((ctx, visited)) = stack.pop() {
            if !visited {
                stack.push((ctx, true));
                let children: Vec<CtxId> = self.contexts[ctx]
                    .children
                    .iter()
                    .copied()
                    .filter(|c| self.in_effective_model(*c))
                    .collect();
                stack.extend(children.into_iter().rev().map(|c| (c, false)));
                continue;
            }

            let mut substatements: Vec<Arc<EffectiveStatement>> = self.contexts[ctx]
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            if ctx == root {
                substatements.append(&mut extra);
            }
            let entry = &self.contexts[ctx];
            let declared = declared.get(&entry.prototype.unwrap_or(ctx)).cloned();
            let support = Arc::clone(&entry.support);
            let statement = support.create_effective(self, ctx, declared, substatements)?;

            *self
                .stats
                .factory_invocations
                .entry(statement.keyword.to_string())
                .or_default() += 1;
            let statement = if self.config.intern_effective && support.internable() {
                interner.intern(statement)
            } else {
                Arc::new(statement)
            };
            built.insert(ctx, statement);
        }
        Ok(built.remove(&root))
    }
}
