//! `module`, `submodule` and the statements that link sources

use crate::args;
use crate::namespaces::module_key;
use tracing::debug;
use yang_ir::{Revision, SourceIdentifier};
use yang_model::{Argument, QNameModule};
use yang_reactor::{
    BuildContext, CtxId, IMPORT_PREFIX, MODULE, ModelProcessingPhase, NAMESPACE_TO_MODULE, NsKey,
    NsValue, RequirementKind, Result, SUBMODULE, StatementSupport, SubstatementValidator,
};

/// Definitions allowed in the body of a module or submodule
pub(crate) const BODY: &[&str] = &[
    "extension",
    "feature",
    "identity",
    "typedef",
    "grouping",
    "container",
    "leaf",
    "leaf-list",
    "list",
    "choice",
    "anydata",
    "anyxml",
    "uses",
    "augment",
    "rpc",
    "notification",
];

fn header(keyword: &str) -> SubstatementValidator {
    SubstatementValidator::new(keyword)
        .optional_of(&["yang-version", "organization", "contact", "description", "reference"])
        .any_of(&["import", "include", "revision"])
        .any_of(BODY)
}

fn module_name(build: &BuildContext, ctx: CtxId) -> Result<String> {
    let name = args::required(build, ctx)?;
    args::check_identifier(build, ctx, name)?;
    Ok(name.to_string())
}

/// Record every `revision` of the source; the newest names it
fn note_revisions(build: &mut BuildContext, ctx: CtxId) -> Result<()> {
    for revision in build.children_with_keyword(ctx, "revision") {
        let text = args::required(build, revision)?;
        let parsed = Revision::parse(text).map_err(|e| build.statement_error(revision, e.to_string()))?;
        build.note_source_revision(ctx, parsed);
    }
    Ok(())
}

/// `revision-date` of a linking statement, if any
fn requested_source(build: &BuildContext, ctx: CtxId, name: &str) -> Result<SourceIdentifier> {
    match build.child_with_keyword(ctx, "revision-date") {
        Some(date) => {
            let text = args::required(build, date)?;
            let revision = Revision::parse(text).map_err(|e| build.statement_error(date, e.to_string()))?;
            Ok(SourceIdentifier::with_revision(name, revision))
        }
        None => Ok(SourceIdentifier::new(name)),
    }
}

pub struct ModuleSupport {
    validator: SubstatementValidator,
}

impl ModuleSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: header("module").mandatory("namespace").mandatory("prefix"),
        }
    }
}

impl Default for ModuleSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for ModuleSupport {
    fn keyword(&self) -> &str {
        "module"
    }

    fn argument_phase(&self) -> ModelProcessingPhase {
        ModelProcessingPhase::SourcePreLinkage
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        module_name(build, ctx).map(Argument::Text)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = module_name(build, ctx)?;
        build.declare_module(ctx, &name)?;

        let namespace = build
            .child_argument(ctx, "namespace")
            .ok_or_else(|| build.statement_error(ctx, format!("module '{name}' has no namespace")))?
            .to_string();
        let prefix = build
            .child_argument(ctx, "prefix")
            .ok_or_else(|| build.statement_error(ctx, format!("module '{name}' has no prefix")))?
            .to_string();
        build.set_source_namespace(ctx, namespace);
        build.set_source_prefix(ctx, prefix.clone());
        build.put(ctx, &IMPORT_PREFIX, NsKey::name(prefix), NsValue::Text(name))?;
        note_revisions(build, ctx)
    }

    fn on_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let namespace = build
            .source_namespace(ctx)
            .ok_or_else(|| build.statement_error(ctx, "module without namespace"))?;
        let module = QNameModule::new(namespace, build.source_identifier(ctx).revision);
        debug!(module = %build.source_identifier(ctx), namespace = %module, "module bound");
        build.put(ctx, &NAMESPACE_TO_MODULE, module_key(&module), NsValue::Ctx(ctx))?;
        build.set_source_module(ctx, module);
        Ok(())
    }
}

pub struct SubmoduleSupport {
    validator: SubstatementValidator,
}

impl SubmoduleSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: header("submodule").mandatory("belongs-to"),
        }
    }
}

impl Default for SubmoduleSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for SubmoduleSupport {
    fn keyword(&self) -> &str {
        "submodule"
    }

    fn argument_phase(&self) -> ModelProcessingPhase {
        ModelProcessingPhase::SourcePreLinkage
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        module_name(build, ctx).map(Argument::Text)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = module_name(build, ctx)?;
        build.put(ctx, &SUBMODULE, NsKey::name(name), NsValue::Ctx(ctx))?;
        note_revisions(build, ctx)
    }
}

#[derive(Debug)]
pub struct ImportSupport {
    validator: SubstatementValidator,
}

impl ImportSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("import")
                .mandatory("prefix")
                .optional_of(&["revision-date", "description", "reference"]),
        }
    }
}

impl Default for ImportSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for ImportSupport {
    fn keyword(&self) -> &str {
        "import"
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = module_name(build, ctx)?;
        let prefix = build
            .child_argument(ctx, "prefix")
            .ok_or_else(|| build.statement_error(ctx, format!("import of '{name}' has no prefix")))?
            .to_string();
        let requested = requested_source(build, ctx, &name)?;
        build.add_requirement(ctx, RequirementKind::Import, requested);
        build.put(ctx, &IMPORT_PREFIX, NsKey::name(prefix), NsValue::Text(name))
    }
}

#[derive(Debug)]
pub struct IncludeSupport {
    validator: SubstatementValidator,
}

impl IncludeSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("include")
                .optional_of(&["revision-date", "description", "reference"]),
        }
    }
}

impl Default for IncludeSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for IncludeSupport {
    fn keyword(&self) -> &str {
        "include"
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = module_name(build, ctx)?;
        let requested = requested_source(build, ctx, &name)?;
        build.add_requirement(ctx, RequirementKind::Include, requested);
        Ok(())
    }
}

/// `belongs-to`: binds the submodule's prefix and attaches it to its
/// module once that module is linked
#[derive(Debug)]
pub struct BelongsToSupport {
    validator: SubstatementValidator,
}

impl BelongsToSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("belongs-to").mandatory("prefix"),
        }
    }
}

impl Default for BelongsToSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for BelongsToSupport {
    fn keyword(&self) -> &str {
        "belongs-to"
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = module_name(build, ctx)?;
        let prefix = build
            .child_argument(ctx, "prefix")
            .ok_or_else(|| build.statement_error(ctx, format!("belongs-to '{name}' has no prefix")))?
            .to_string();
        build.set_source_prefix(ctx, prefix.clone());
        build.put(ctx, &IMPORT_PREFIX, NsKey::name(prefix), NsValue::Text(name))
    }

    fn on_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = module_name(build, ctx)?;
        let submodule = build.source_root(ctx);
        build
            .new_action(ctx, format!("belongs-to {name}"))
            .requires_ctx(
                ctx,
                &MODULE,
                NsKey::name(name.as_str()),
                ModelProcessingPhase::SourceLinkage,
            )
            .target(format!("module {name}"))
            .apply(move |build, values| {
                let owner = values
                    .first()
                    .and_then(NsValue::as_ctx)
                    .ok_or_else(|| yang_reactor::ReactorError::invariant("belongs-to resolved without module"))?;
                build.set_source_owner(submodule, owner);
                Ok(())
            });
        Ok(())
    }
}
