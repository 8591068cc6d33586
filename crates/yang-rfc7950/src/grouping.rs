//! `grouping`, `uses` and `refine`
//!
//! A `uses` waits until its grouping is fully declared, so nested `uses`
//! inside the grouping are already expanded, then copies the grouping's
//! schema nodes next to itself. The copies carry the module of the `uses`
//! and catch up through the phases on their own. `refine` and the
//! `augment` statements of the `uses` are applied to the fresh copies
//! before anything else sees them.

use crate::args::{self, ArgumentKind};
use crate::namespaces::GROUPING;
use crate::schema::{DATA_DEF, wrap_shorthand_cases};
use tracing::debug;
use yang_model::{Argument, QNameModule, SCHEMA_NODE_KEYWORDS, StatementOrigin};
use yang_reactor::{
    BuildContext, CopyPolicy, CtxId, ModelProcessingPhase, NsKey, NsValue, ReactorError, Result,
    StatementSupport, SubstatementValidator,
};

/// Properties a `refine` replaces rather than adds to
const REPLACED_BY_REFINE: &[&str] = &[
    "description",
    "reference",
    "config",
    "mandatory",
    "presence",
    "min-elements",
    "max-elements",
    "default",
];

/// Whether `ctx` is a schema node statement
pub(crate) fn is_schema_node(build: &BuildContext, ctx: CtxId) -> bool {
    let keyword = build.keyword(ctx);
    !keyword.is_prefixed() && SCHEMA_NODE_KEYWORDS.iter().any(|k| keyword.is(k))
}

/// Find a descendant schema node by a `/`-separated path of names,
/// starting among `roots`
pub(crate) fn find_descendant(build: &BuildContext, roots: &[CtxId], path: &str) -> Option<CtxId> {
    let mut candidates = roots.to_vec();
    let mut found = None;
    for step in path.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        let name = args::local_name(step);
        let node = candidates.iter().copied().find(|c| {
            is_schema_node(build, *c)
                && build
                    .raw_argument(*c)
                    .map_or_else(|| build.keyword(*c).is(name), |a| args::local_name(a) == name)
        })?;
        candidates = build.children(node).to_vec();
        found = Some(node);
    }
    found
}

/// Copy the schema node children of `from` under `target` and link the
/// copies at `index`
pub(crate) fn copy_schema_children(
    build: &mut BuildContext,
    from: CtxId,
    target: CtxId,
    index: usize,
    origin: StatementOrigin,
    module: Option<&QNameModule>,
    introducer: CtxId,
) -> Vec<CtxId> {
    let originals: Vec<CtxId> = build
        .children(from)
        .iter()
        .copied()
        .filter(|c| is_schema_node(build, *c))
        .collect();
    let copies: Vec<CtxId> = originals
        .into_iter()
        .map(|original| build.copy_subtree(original, target, origin, module.cloned(), introducer))
        .collect();
    build.insert_children(target, index, &copies);
    wrap_shorthand_cases(build, target);
    copies
}

fn unresolved(build: &BuildContext, ctx: CtxId, target: String) -> ReactorError {
    ReactorError::UnresolvedReference {
        referrer: build.describe(ctx),
        target,
        source_info: build.source_info(ctx),
        phase: ModelProcessingPhase::FullDeclaration,
    }
}

pub struct GroupingSupport {
    validator: SubstatementValidator,
}

impl GroupingSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("grouping")
                .optional_of(&["status", "description", "reference"])
                .any_of(&["typedef", "grouping", "action", "notification"])
                .any_of(DATA_DEF),
        }
    }
}

impl Default for GroupingSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for GroupingSupport {
    fn keyword(&self) -> &str {
        "grouping"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::Identifier.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(name) = build.argument(ctx).as_qname().cloned() else {
            return Err(ReactorError::invariant("grouping without parsed name"));
        };
        let Some(parent) = build.parent(ctx) else {
            return Err(ReactorError::invariant("grouping without parent"));
        };
        build.put(parent, &GROUPING, NsKey::QName(name), NsValue::Ctx(ctx))
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }
}

pub struct UsesSupport {
    validator: SubstatementValidator,
}

impl UsesSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("uses")
                .optional_of(&["when", "status", "description", "reference"])
                .any_of(&["if-feature", "refine", "augment"]),
        }
    }

    fn expand(build: &mut BuildContext, uses: CtxId, grouping: CtxId) -> Result<()> {
        let Some(parent) = build.parent(uses) else {
            return Err(ReactorError::invariant("uses without parent"));
        };
        let module = build.module_of(uses);
        let index = build.position_in_parent(uses).map_or(usize::MAX, |i| i + 1);
        let copies = copy_schema_children(
            build,
            grouping,
            parent,
            index,
            StatementOrigin::Uses,
            module.as_ref(),
            uses,
        );

        for refine in build.children_with_keyword(uses, "refine") {
            Self::refine(build, uses, refine, &copies)?;
        }
        for augment in build.children_with_keyword(uses, "augment") {
            let path = args::required(build, augment)?.to_string();
            let target = find_descendant(build, &copies, &path)
                .ok_or_else(|| unresolved(build, augment, format!("augment target {path}")))?;
            copy_schema_children(
                build,
                augment,
                target,
                usize::MAX,
                StatementOrigin::Augment,
                module.as_ref(),
                augment,
            );
        }
        debug!(uses = %build.describe(uses), copies = copies.len(), "grouping expanded");
        Ok(())
    }

    fn refine(build: &mut BuildContext, uses: CtxId, refine: CtxId, copies: &[CtxId]) -> Result<()> {
        let path = args::required(build, refine)?.to_string();
        let target = find_descendant(build, copies, &path)
            .ok_or_else(|| unresolved(build, refine, format!("refine target {path}")))?;

        let children: Vec<CtxId> = build
            .children(refine)
            .iter()
            .copied()
            .filter(|c| build.is_declared(*c))
            .collect();
        for child in children {
            let replaced = REPLACED_BY_REFINE
                .iter()
                .find(|k| build.keyword(child).is(k))
                .copied();
            if let Some(keyword) = replaced {
                for existing in build.children_with_keyword(target, keyword) {
                    build.discard(existing);
                }
            }
            let copy = build.copy_subtree(child, target, StatementOrigin::Refine, None, uses);
            build.insert_children(target, usize::MAX, &[copy]);
        }
        Ok(())
    }
}

impl Default for UsesSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for UsesSupport {
    fn keyword(&self) -> &str {
        "uses"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::IdentifierRef.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let raw = args::required(build, ctx)?.to_string();
        let name = build.resolve_identifier(ctx, &raw)?;
        let augments = build.children_with_keyword(ctx, "augment");
        let description = build.describe(ctx);

        let mut action = build
            .new_action(ctx, description)
            .requires_ctx(
                ctx,
                &GROUPING,
                NsKey::QName(name),
                ModelProcessingPhase::FullDeclaration,
            )
            .target(format!("grouping {raw}"));
        for augment in augments {
            action = action.requires_phase(augment, ModelProcessingPhase::FullDeclaration);
        }
        action.apply(move |build, values| {
            let grouping = values
                .first()
                .and_then(NsValue::as_ctx)
                .ok_or_else(|| ReactorError::invariant("grouping lookup returned no context"))?;
            Self::expand(build, ctx, grouping)
        });
        Ok(())
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }

    fn in_effective_model(&self) -> bool {
        false
    }
}

pub struct RefineSupport {
    validator: SubstatementValidator,
}

impl RefineSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("refine")
                .optional_of(&[
                    "description",
                    "reference",
                    "config",
                    "mandatory",
                    "presence",
                    "min-elements",
                    "max-elements",
                ])
                .any_of(&["if-feature", "must", "default"]),
        }
    }
}

impl Default for RefineSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for RefineSupport {
    fn keyword(&self) -> &str {
        "refine"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        let path = args::required(build, ctx)?;
        if path.starts_with('/') {
            return Err(build.statement_error(ctx, format!("refine target '{path}' must be a descendant path")));
        }
        ArgumentKind::SchemaNodeId.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }

    fn in_effective_model(&self) -> bool {
        false
    }
}
