//! Statement contexts and the build tree
//!
//! Every statement of every source in a build is wrapped in a
//! [`StmtContext`] stored in one arena and addressed by [`CtxId`]. Parent
//! and child links are handles, so the tree can grow while the reactor
//! holds a mutable borrow of the whole build: `uses` and `augment` insert
//! copies, `rpc` materializes implicit `input`/`output`, `refine` replaces
//! single-valued children.
//!
//! [`BuildContext`] is the build's single owner. Statement supports get
//! `&mut BuildContext` in their phase callbacks and query or extend the
//! tree through the methods below.

use crate::action::InferenceAction;
use crate::arena::{ActionId, CtxId, IndexVec, SourceId};
use crate::config::{ReactorConfig, UnknownStatementPolicy};
use crate::error::{ReactorError, Result};
use crate::linkage::SourceEntry;
use crate::namespace::NamespaceStorage;
use crate::phase::ModelProcessingPhase;
use crate::report::BuildStats;
use crate::support::{CopyPolicy, StatementSupport, StatementSupportBundle, UnrecognizedSupport};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::warn;
use yang_ir::{Keyword, Position, RawStatement, SourceDocument, SourceInfo, SourceProvider};
use yang_model::{Argument, EffectiveProperties, QNameModule, StatementOrigin};

/// One statement occurrence in the build tree
pub(crate) struct StmtContext {
    pub(crate) keyword: Keyword,
    pub(crate) raw_argument: Option<String>,
    pub(crate) position: Position,
    /// Source the statement was written in; copies keep their prototype's
    pub(crate) source: SourceId,
    pub(crate) parent: Option<CtxId>,
    pub(crate) children: Vec<CtxId>,
    pub(crate) support: Arc<dyn StatementSupport>,
    /// Prefixed keywords get their support in statement definition
    pub(crate) support_resolved: bool,
    /// Unprefixed keyword missing from the bundle
    pub(crate) unknown_keyword: bool,
    pub(crate) argument: Argument,
    pub(crate) argument_parsed: bool,
    pub(crate) started: Option<ModelProcessingPhase>,
    pub(crate) completed: Option<ModelProcessingPhase>,
    pub(crate) storage: NamespaceStorage,
    pub(crate) origin: StatementOrigin,
    /// Declared statement this one was copied from
    pub(crate) prototype: Option<CtxId>,
    /// Module identifiers of this subtree belong to, when it differs from
    /// the parent's
    pub(crate) node_module: Option<QNameModule>,
    /// `uses`/`augment` statements that produced this copy, outermost last
    pub(crate) introduced_by: Vec<CtxId>,
    /// Pre-order index within the declaring source
    pub(crate) preorder: usize,
    pub(crate) supported: bool,
    pub(crate) failed: bool,
    pub(crate) discarded: bool,
    pub(crate) pending: Vec<ActionId>,
    pub(crate) properties: EffectiveProperties,
}

impl StmtContext {
    /// Failed or discarded contexts take no further part in the build
    pub(crate) fn inactive(&self) -> bool {
        self.failed || self.discarded
    }

    pub(crate) fn reached(&self, phase: ModelProcessingPhase) -> bool {
        self.inactive() || self.completed.is_some_and(|c| c >= phase)
    }
}

/// Mutable state of one build
pub struct BuildContext {
    pub(crate) bundle: Arc<StatementSupportBundle>,
    pub(crate) config: Arc<ReactorConfig>,
    pub(crate) contexts: IndexVec<CtxId, StmtContext>,
    pub(crate) sources: IndexVec<SourceId, SourceEntry>,
    pub(crate) global: NamespaceStorage,
    pub(crate) actions: IndexVec<ActionId, InferenceAction>,
    pub(crate) ready: BTreeSet<ActionId>,
    pub(crate) namespace_watchers: HashMap<&'static str, Vec<ActionId>>,
    pub(crate) phase_watchers: HashMap<CtxId, Vec<ActionId>>,
    pub(crate) phase: Option<ModelProcessingPhase>,
    /// Phase of the callback currently running
    pub(crate) hook_phase: ModelProcessingPhase,
    pub(crate) pending_schema_mutations: usize,
    pub(crate) errors: Vec<ReactorError>,
    pub(crate) warnings: Vec<String>,
    pub(crate) stats: BuildStats,
    /// Sources handed to the build, wrapped when the build starts
    pub(crate) pending_sources: Vec<SourceDocument>,
    pub(crate) library: Vec<SourceDocument>,
    pub(crate) provider: Option<Arc<dyn SourceProvider>>,
    unrecognized: Arc<dyn StatementSupport>,
}

impl BuildContext {
    pub(crate) fn new(bundle: Arc<StatementSupportBundle>, config: Arc<ReactorConfig>) -> Self {
        Self {
            bundle,
            config,
            contexts: IndexVec::new(),
            sources: IndexVec::new(),
            global: NamespaceStorage::new(),
            actions: IndexVec::new(),
            ready: BTreeSet::new(),
            namespace_watchers: HashMap::new(),
            phase_watchers: HashMap::new(),
            phase: None,
            hook_phase: ModelProcessingPhase::Init,
            pending_schema_mutations: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: BuildStats::default(),
            pending_sources: Vec::new(),
            library: Vec::new(),
            provider: None,
            unrecognized: Arc::new(UnrecognizedSupport),
        }
    }

    /// Wrap a parsed source and all its statements into contexts
    pub(crate) fn add_source_tree(&mut self, document: &SourceDocument, library: bool) -> Result<SourceId> {
        let Some(kind) = document.kind() else {
            return Err(ReactorError::invalid(
                SourceInfo::new(&document.name, document.root.position),
                format!(
                    "source root must be 'module' or 'submodule', found '{}'",
                    document.root.keyword
                ),
            ));
        };
        let root = self.contexts.next_idx();
        let source_id = self.sources.push(SourceEntry::new(
            document.name.clone(),
            document.root.argument().unwrap_or(document.name.as_str()).to_string(),
            kind,
            library,
            root,
        ));

        let mut preorder = 0;
        let mut stack: Vec<(&RawStatement, Option<CtxId>)> = vec![(&document.root, None)];
        while let Some((statement, parent)) = stack.pop() {
            let ctx = self.push_declared(statement, source_id, parent, preorder);
            preorder += 1;
            if let Some(parent) = parent {
                self.contexts[parent].children.push(ctx);
            }
            for child in statement.substatements.iter().rev() {
                stack.push((child, Some(ctx)));
            }
        }
        self.stats.sources += 1;
        Ok(source_id)
    }

    fn push_declared(
        &mut self,
        statement: &RawStatement,
        source: SourceId,
        parent: Option<CtxId>,
        preorder: usize,
    ) -> CtxId {
        let (support, support_resolved, unknown_keyword) = self.initial_support(&statement.keyword);
        if unknown_keyword && self.config.unknown_statements == UnknownStatementPolicy::Opaque {
            warn!(
                keyword = %statement.keyword,
                source = %self.sources[source].document,
                line = statement.position.line,
                "keeping unknown statement as opaque"
            );
            self.warnings.push(format!(
                "unknown statement '{}' at {}:{} kept as opaque",
                statement.keyword, self.sources[source].document, statement.position
            ));
        }
        self.contexts.push(StmtContext {
            keyword: statement.keyword.clone(),
            raw_argument: statement.argument.clone(),
            position: statement.position,
            source,
            parent,
            children: Vec::with_capacity(statement.substatements.len()),
            support,
            support_resolved,
            unknown_keyword,
            argument: Argument::None,
            argument_parsed: false,
            started: None,
            completed: None,
            storage: NamespaceStorage::new(),
            origin: StatementOrigin::Declared,
            prototype: None,
            node_module: None,
            introduced_by: Vec::new(),
            preorder,
            supported: true,
            failed: false,
            discarded: false,
            pending: Vec::new(),
            properties: EffectiveProperties::default(),
        })
    }

    fn initial_support(&self, keyword: &Keyword) -> (Arc<dyn StatementSupport>, bool, bool) {
        if keyword.is_prefixed() {
            return (Arc::clone(&self.unrecognized), false, false);
        }
        match self.bundle.lookup(&keyword.name) {
            Some(support) => (Arc::clone(support), true, false),
            None => (Arc::clone(&self.unrecognized), true, true),
        }
    }

    /// Bind the support of a prefixed keyword once import prefixes are known
    pub(crate) fn resolve_extension_support(&mut self, ctx: CtxId) -> Result<()> {
        let keyword = self.contexts[ctx].keyword.clone();
        let prefix = keyword.prefix.as_deref().unwrap_or_default();
        let Some(module_name) = self.module_name_for_prefix(ctx, prefix) else {
            return Err(ReactorError::invalid(
                self.source_info(ctx),
                format!("unknown prefix '{prefix}' in keyword '{keyword}'"),
            ));
        };
        let key = format!("{module_name}:{}", keyword.name);
        let support = self
            .bundle
            .lookup(&key)
            .or_else(|| self.bundle.extension_fallback())
            .map_or_else(|| Arc::clone(&self.unrecognized), Arc::clone);
        let entry = &mut self.contexts[ctx];
        entry.support = support;
        entry.support_resolved = true;
        Ok(())
    }

    // -- queries ---------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &ReactorConfig {
        &self.config
    }

    /// Phase the build is currently in
    #[must_use]
    pub fn current_phase(&self) -> Option<ModelProcessingPhase> {
        self.phase
    }

    #[must_use]
    pub fn keyword(&self, ctx: CtxId) -> &Keyword {
        &self.contexts[ctx].keyword
    }

    #[must_use]
    pub fn raw_argument(&self, ctx: CtxId) -> Option<&str> {
        self.contexts[ctx].raw_argument.as_deref()
    }

    /// Parsed argument; [`Argument::None`] until parsed
    #[must_use]
    pub fn argument(&self, ctx: CtxId) -> &Argument {
        &self.contexts[ctx].argument
    }

    #[must_use]
    pub fn support(&self, ctx: CtxId) -> &Arc<dyn StatementSupport> {
        &self.contexts[ctx].support
    }

    #[must_use]
    pub fn parent(&self, ctx: CtxId) -> Option<CtxId> {
        self.contexts[ctx].parent
    }

    /// Current children, declared and inferred, in order
    #[must_use]
    pub fn children(&self, ctx: CtxId) -> &[CtxId] {
        &self.contexts[ctx].children
    }

    /// First child with the given unprefixed keyword
    #[must_use]
    pub fn child_with_keyword(&self, ctx: CtxId, keyword: &str) -> Option<CtxId> {
        self.children(ctx)
            .iter()
            .copied()
            .find(|c| self.contexts[*c].keyword.is(keyword))
    }

    #[must_use]
    pub fn children_with_keyword(&self, ctx: CtxId, keyword: &str) -> Vec<CtxId> {
        self.children(ctx)
            .iter()
            .copied()
            .filter(|c| self.contexts[*c].keyword.is(keyword))
            .collect()
    }

    /// Raw argument of the first child with the given keyword
    #[must_use]
    pub fn child_argument(&self, ctx: CtxId, keyword: &str) -> Option<&str> {
        self.child_with_keyword(ctx, keyword)
            .and_then(|c| self.raw_argument(c))
    }

    #[must_use]
    pub fn origin(&self, ctx: CtxId) -> StatementOrigin {
        self.contexts[ctx].origin
    }

    #[must_use]
    pub fn is_declared(&self, ctx: CtxId) -> bool {
        self.contexts[ctx].origin == StatementOrigin::Declared
    }

    /// Whether the keyword was found in the bundle
    #[must_use]
    pub fn is_known_keyword(&self, ctx: CtxId) -> bool {
        !self.contexts[ctx].unknown_keyword
    }

    #[must_use]
    pub fn prototype(&self, ctx: CtxId) -> Option<CtxId> {
        self.contexts[ctx].prototype
    }

    /// `uses`/`augment` statements that introduced this copy
    #[must_use]
    pub fn introduced_by(&self, ctx: CtxId) -> &[CtxId] {
        &self.contexts[ctx].introduced_by
    }

    #[must_use]
    pub fn completed_phase(&self, ctx: CtxId) -> Option<ModelProcessingPhase> {
        self.contexts[ctx].completed
    }

    #[must_use]
    pub fn properties(&self, ctx: CtxId) -> &EffectiveProperties {
        &self.contexts[ctx].properties
    }

    pub fn properties_mut(&mut self, ctx: CtxId) -> &mut EffectiveProperties {
        &mut self.contexts[ctx].properties
    }

    /// Exclude `ctx` from the effective model (`if-feature` evaluated false)
    pub fn set_unsupported(&mut self, ctx: CtxId) {
        self.contexts[ctx].supported = false;
    }

    #[must_use]
    pub fn is_supported(&self, ctx: CtxId) -> bool {
        self.contexts[ctx].supported
    }

    /// Whether `ctx` is in the effective model: supported itself, and not
    /// introduced by an unsupported `uses` or `augment`
    #[must_use]
    pub fn is_effectively_supported(&self, ctx: CtxId) -> bool {
        let entry = &self.contexts[ctx];
        entry.supported && entry.introduced_by.iter().all(|c| self.contexts[*c].supported)
    }

    /// Parent in the tree the statement was written in.
    ///
    /// Differs from [`BuildContext::parent`] for copies, whose lexical scope
    /// stays at their prototype's place.
    #[must_use]
    pub fn lexical_parent(&self, ctx: CtxId) -> Option<CtxId> {
        match self.contexts[ctx].prototype {
            Some(prototype) => self.contexts[prototype].parent,
            None => self.contexts[ctx].parent,
        }
    }

    /// Ancestors from the parent up to the root
    #[must_use]
    pub fn ancestors(&self, ctx: CtxId) -> Vec<CtxId> {
        let mut out = Vec::new();
        let mut current = self.contexts[ctx].parent;
        while let Some(c) = current {
            out.push(c);
            current = self.contexts[c].parent;
        }
        out
    }

    /// Whether an ancestor has the given unprefixed keyword
    #[must_use]
    pub fn has_ancestor(&self, ctx: CtxId, keyword: &str) -> bool {
        self.ancestors(ctx)
            .into_iter()
            .any(|a| self.contexts[a].keyword.is(keyword))
    }

    /// Root of the tree `ctx` is currently attached to
    #[must_use]
    pub fn root_of(&self, ctx: CtxId) -> CtxId {
        let mut current = ctx;
        while let Some(parent) = self.contexts[current].parent {
            current = parent;
        }
        current
    }

    /// Root of the source `ctx` was written in
    #[must_use]
    pub fn source_root(&self, ctx: CtxId) -> CtxId {
        self.sources[self.contexts[ctx].source].root
    }

    #[must_use]
    pub fn source_name(&self, ctx: CtxId) -> &str {
        &self.sources[self.contexts[ctx].source].document
    }

    /// Module that identifiers of `ctx` belong to.
    ///
    /// Copies take the module of their `uses` or `augment`; everything else
    /// the module of its source.
    #[must_use]
    pub fn module_of(&self, ctx: CtxId) -> Option<QNameModule> {
        let mut current = ctx;
        loop {
            let entry = &self.contexts[current];
            if let Some(module) = &entry.node_module {
                return Some(module.clone());
            }
            match entry.parent {
                Some(parent) => current = parent,
                None => return self.sources[entry.source].module.clone(),
            }
        }
    }

    /// Module of the source `ctx` was written in; unprefixed references
    /// resolve here
    #[must_use]
    pub fn lexical_module(&self, ctx: CtxId) -> Option<QNameModule> {
        self.sources[self.contexts[ctx].source].module.clone()
    }

    /// `keyword argument`, for messages
    #[must_use]
    pub fn describe(&self, ctx: CtxId) -> String {
        let entry = &self.contexts[ctx];
        match &entry.raw_argument {
            Some(argument) => format!("{} {}", entry.keyword, argument),
            None => entry.keyword.to_string(),
        }
    }

    #[must_use]
    pub fn source_info(&self, ctx: CtxId) -> SourceInfo {
        let entry = &self.contexts[ctx];
        SourceInfo::new(&self.sources[entry.source].document, entry.position)
    }

    /// Global declaration order: linkage index of the source, then
    /// pre-order index within it. Copies report their prototype's place.
    #[must_use]
    pub fn declaration_order(&self, ctx: CtxId) -> (usize, usize) {
        let entry = &self.contexts[ctx];
        let linkage = self.sources[entry.source].linkage_index.unwrap_or(usize::MAX);
        (linkage, entry.preorder)
    }

    /// Invalid-statement error located at `ctx`
    pub fn statement_error(&self, ctx: CtxId, message: impl Into<String>) -> ReactorError {
        ReactorError::invalid(self.source_info(ctx), message)
    }

    /// Number of contexts created so far
    #[must_use]
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    // -- tree mutation ---------------------------------------------------

    /// Deep-copy `original` for placement under `parent`.
    ///
    /// The copy is not yet linked into `parent`'s children; use
    /// [`BuildContext::insert_children`]. Descendants with
    /// [`CopyPolicy::Ignore`] and discarded descendants are skipped. The
    /// copies start unprocessed and catch up through the phases on the next
    /// scan pass.
    pub fn copy_subtree(
        &mut self,
        original: CtxId,
        parent: CtxId,
        origin: StatementOrigin,
        module: Option<QNameModule>,
        introducer: CtxId,
    ) -> CtxId {
        let root = self.push_copy(original, parent, origin, introducer);
        self.contexts[root].node_module = module;

        let mut stack = vec![(original, root)];
        while let Some((from, to)) = stack.pop() {
            let children = self.contexts[from].children.clone();
            for child in children {
                let entry = &self.contexts[child];
                if entry.discarded || entry.support.copy_policy() == CopyPolicy::Ignore {
                    continue;
                }
                let copy = self.push_copy(child, to, origin, introducer);
                self.contexts[to].children.push(copy);
                stack.push((child, copy));
            }
        }
        root
    }

    fn push_copy(
        &mut self,
        original: CtxId,
        parent: CtxId,
        origin: StatementOrigin,
        introducer: CtxId,
    ) -> CtxId {
        let entry = &self.contexts[original];
        let mut introduced_by = entry.introduced_by.clone();
        introduced_by.push(introducer);
        let copy = StmtContext {
            keyword: entry.keyword.clone(),
            raw_argument: entry.raw_argument.clone(),
            position: entry.position,
            source: entry.source,
            parent: Some(parent),
            children: Vec::with_capacity(entry.children.len()),
            support: Arc::clone(&entry.support),
            support_resolved: entry.support_resolved,
            unknown_keyword: entry.unknown_keyword,
            argument: Argument::None,
            argument_parsed: false,
            started: None,
            completed: None,
            storage: NamespaceStorage::new(),
            origin,
            prototype: Some(entry.prototype.unwrap_or(original)),
            node_module: None,
            introduced_by,
            preorder: entry.preorder,
            supported: true,
            failed: false,
            discarded: false,
            pending: Vec::new(),
            properties: EffectiveProperties::default(),
        };
        self.stats.copies += 1;
        self.contexts.push(copy)
    }

    /// Create an implicit child (e.g. `input` of an `rpc`) appended to
    /// `parent`
    pub fn add_implicit_child(&mut self, parent: CtxId, keyword: &str) -> CtxId {
        let (support, support_resolved, unknown_keyword) = self.initial_support(&Keyword::new(keyword));
        let entry = &self.contexts[parent];
        let child = StmtContext {
            keyword: Keyword::new(keyword),
            raw_argument: None,
            position: entry.position,
            source: entry.source,
            parent: Some(parent),
            children: Vec::new(),
            support,
            support_resolved,
            unknown_keyword,
            argument: Argument::None,
            argument_parsed: false,
            started: None,
            completed: None,
            storage: NamespaceStorage::new(),
            origin: StatementOrigin::Implicit,
            prototype: None,
            node_module: None,
            introduced_by: entry.introduced_by.clone(),
            preorder: entry.preorder,
            supported: true,
            failed: false,
            discarded: false,
            pending: Vec::new(),
            properties: EffectiveProperties::default(),
        };
        let child = self.contexts.push(child);
        self.contexts[parent].children.push(child);
        child
    }

    /// Re-parent `ctx` under a new implicit statement that takes its place
    /// and its argument, e.g. the `case` around a choice shorthand.
    ///
    /// The wrapper belongs to the same source, module and introducing
    /// `uses`/`augment` as `ctx`.
    pub fn wrap_in_implicit(&mut self, ctx: CtxId, keyword: &str) -> Option<CtxId> {
        let parent = self.contexts[ctx].parent?;
        let index = self.position_in_parent(ctx)?;
        let wrapper = self.add_implicit_child(parent, keyword);
        let siblings = &mut self.contexts[parent].children;
        siblings.pop();
        siblings[index] = wrapper;

        let entry = &self.contexts[ctx];
        let (raw_argument, position, source) = (entry.raw_argument.clone(), entry.position, entry.source);
        let (node_module, introduced_by, preorder) =
            (entry.node_module.clone(), entry.introduced_by.clone(), entry.preorder);
        let wrapped = &mut self.contexts[wrapper];
        wrapped.raw_argument = raw_argument;
        wrapped.position = position;
        wrapped.source = source;
        wrapped.node_module = node_module;
        wrapped.introduced_by = introduced_by;
        wrapped.preorder = preorder;
        wrapped.children.push(ctx);
        self.contexts[ctx].parent = Some(wrapper);
        Some(wrapper)
    }

    /// Link `children` into `parent` starting at `index`
    pub fn insert_children(&mut self, parent: CtxId, index: usize, children: &[CtxId]) {
        let list = &mut self.contexts[parent].children;
        let index = index.min(list.len());
        list.splice(index..index, children.iter().copied());
    }

    /// Index of `ctx` among its parent's children
    #[must_use]
    pub fn position_in_parent(&self, ctx: CtxId) -> Option<usize> {
        let parent = self.contexts[ctx].parent?;
        self.contexts[parent].children.iter().position(|c| *c == ctx)
    }

    /// Unlink `ctx` from its parent and retire its subtree
    pub fn discard(&mut self, ctx: CtxId) {
        if let Some(parent) = self.contexts[ctx].parent {
            self.contexts[parent].children.retain(|c| *c != ctx);
        }
        for id in self.subtree(ctx) {
            self.contexts[id].discarded = true;
            self.drop_actions(id);
        }
    }

    /// Mark a subtree failed after a collected statement error
    pub(crate) fn fail_subtree(&mut self, ctx: CtxId) {
        for id in self.subtree(ctx) {
            self.contexts[id].failed = true;
            self.drop_actions(id);
        }
    }

    /// `ctx` and all its descendants, pre-order
    #[must_use]
    pub fn subtree(&self, ctx: CtxId) -> Vec<CtxId> {
        let mut out = Vec::new();
        let mut stack = vec![ctx];
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.contexts[id].children.iter().rev().copied());
        }
        out
    }

    /// Whether `ctx` is `ancestor` or below it
    #[must_use]
    pub fn is_within(&self, ctx: CtxId, ancestor: CtxId) -> bool {
        let mut current = Some(ctx);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.contexts[c].parent;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::support::StatementSupportBundle;

    fn build_with(root: RawStatement) -> (BuildContext, CtxId) {
        let bundle = StatementSupportBundle::builder("empty").build().unwrap();
        let mut build = BuildContext::new(Arc::new(bundle), Arc::new(ReactorConfig::default()));
        let source = build
            .add_source_tree(&SourceDocument::new("t.yang", root), false)
            .unwrap();
        let root = build.sources[source].root;
        (build, root)
    }

    fn sample() -> RawStatement {
        RawStatement::with_argument("module", "t")
            .with_substatement(
                RawStatement::with_argument("grouping", "g")
                    .with_substatement(RawStatement::with_argument("leaf", "x")),
            )
            .with_substatement(RawStatement::with_argument("container", "c"))
    }

    #[test]
    fn test_source_tree_is_preorder() {
        let (build, root) = build_with(sample());
        assert_eq!(build.context_count(), 4);
        let grouping = build.children(root)[0];
        let leaf = build.children(grouping)[0];
        let container = build.children(root)[1];
        assert!(grouping < leaf && leaf < container);
        assert_eq!(build.describe(leaf), "leaf x");
        assert_eq!(build.contexts[container].preorder, 3);
        assert!(!build.is_known_keyword(leaf));
        assert!(build.has_ancestor(leaf, "grouping"));
        assert_eq!(build.root_of(leaf), root);
    }

    #[test]
    fn test_copy_keeps_lexical_scope() {
        let (mut build, root) = build_with(sample());
        let grouping = build.children(root)[0];
        let leaf = build.children(grouping)[0];
        let container = build.children(root)[1];

        let copy = build.copy_subtree(leaf, container, StatementOrigin::Uses, None, container);
        build.insert_children(container, 0, &[copy]);

        assert_eq!(build.parent(copy), Some(container));
        assert_eq!(build.lexical_parent(copy), Some(grouping));
        assert_eq!(build.prototype(copy), Some(leaf));
        assert_eq!(build.origin(copy), StatementOrigin::Uses);
        assert_eq!(build.position_in_parent(copy), Some(0));
        assert!(build.is_within(copy, root));
        assert_eq!(build.stats.copies, 1);

        let again = build.copy_subtree(copy, root, StatementOrigin::Augment, None, container);
        assert_eq!(build.prototype(again), Some(leaf));
        assert_eq!(build.introduced_by(again), &[container, container]);
    }

    #[test]
    fn test_wrap_takes_place_and_name() {
        let (mut build, root) = build_with(sample());
        let container = build.children(root)[1];

        let wrapper = build.wrap_in_implicit(container, "case").unwrap();
        assert_eq!(build.children(root)[1], wrapper);
        assert_eq!(build.children(root).len(), 2);
        assert_eq!(build.children(wrapper), &[container]);
        assert_eq!(build.parent(container), Some(wrapper));
        assert_eq!(build.raw_argument(wrapper), Some("c"));
        assert_eq!(build.origin(wrapper), StatementOrigin::Implicit);
        assert_eq!(build.declaration_order(wrapper), build.declaration_order(container));
        assert!(build.wrap_in_implicit(root, "case").is_none());
    }

    #[test]
    fn test_discard_unlinks_subtree() {
        let (mut build, root) = build_with(sample());
        let grouping = build.children(root)[0];
        let leaf = build.children(grouping)[0];
        build.discard(grouping);
        assert_eq!(build.children(root).len(), 1);
        assert!(build.contexts[leaf].discarded);
        assert!(build.contexts[leaf].reached(ModelProcessingPhase::EffectiveModel));
    }

    #[test]
    fn test_rejects_non_module_root() {
        let bundle = StatementSupportBundle::builder("empty").build().unwrap();
        let mut build = BuildContext::new(Arc::new(bundle), Arc::new(ReactorConfig::default()));
        let result = build.add_source_tree(
            &SourceDocument::new("x.yang", RawStatement::with_argument("container", "c")),
            false,
        );
        assert!(matches!(result, Err(ReactorError::InvalidStatement { .. })));
    }
}
