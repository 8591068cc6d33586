//! Small statement bundle shared by the reactor integration tests
//!
//! `thing` statements define names in a tree-scoped namespace, `ref`
//! statements wait for them, `clone` copies them and `trace` records every
//! callback it receives.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use yang_ir::{RawStatement, SourceDocument, SourceIdentifier};
use yang_model::{Argument, QNameModule, StatementOrigin};
use yang_reactor::{
    BuildContext, CtxId, IMPORT_PREFIX, ModelProcessingPhase, Namespace, NsKey, NsValue, ReactorError,
    RequirementKind, Result, StatementSupport, StatementSupportBundle, SubstatementValidator,
};

/// Routes `tracing` output through the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub static THING: Namespace = Namespace::tree_scoped("thing");

pub type TraceLog = Arc<Mutex<Vec<(ModelProcessingPhase, String)>>>;

pub struct ModuleSupport {
    validator: SubstatementValidator,
}

impl ModuleSupport {
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("module")
                .mandatory("namespace")
                .mandatory("prefix")
                .any_of(&["import", "thing", "ref", "clone", "trace", "description"]),
        }
    }
}

impl StatementSupport for ModuleSupport {
    fn keyword(&self) -> &str {
        "module"
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = build.raw_argument(ctx).unwrap_or_default().to_string();
        build.declare_module(ctx, &name)?;
        if let Some(namespace) = build.child_argument(ctx, "namespace").map(str::to_string) {
            build.set_source_namespace(ctx, namespace);
        }
        if let Some(prefix) = build.child_argument(ctx, "prefix").map(str::to_string) {
            build.set_source_prefix(ctx, prefix.as_str());
            build.put(ctx, &IMPORT_PREFIX, NsKey::name(prefix), NsValue::Text(name))?;
        }
        Ok(())
    }

    fn on_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let namespace = build.source_namespace(ctx).unwrap_or("urn:unknown").to_string();
        build.set_source_module(ctx, QNameModule::new(&namespace, None));
        Ok(())
    }
}

pub struct ImportSupport;

impl StatementSupport for ImportSupport {
    fn keyword(&self) -> &str {
        "import"
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = build.raw_argument(ctx).unwrap_or_default().to_string();
        build.add_requirement(ctx, RequirementKind::Import, SourceIdentifier::new(name.as_str()));
        if let Some(prefix) = build.child_argument(ctx, "prefix").map(str::to_string) {
            build.put(ctx, &IMPORT_PREFIX, NsKey::name(prefix), NsValue::Text(name))?;
        }
        Ok(())
    }
}

pub struct ThingSupport;

impl StatementSupport for ThingSupport {
    fn keyword(&self) -> &str {
        "thing"
    }

    fn internable(&self) -> bool {
        true
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(parent) = build.parent(ctx) else {
            return Ok(());
        };
        let name = build.raw_argument(ctx).unwrap_or_default().to_string();
        build.put(parent, &THING, NsKey::name(name), NsValue::Ctx(ctx))
    }
}

pub struct RefSupport;

impl StatementSupport for RefSupport {
    fn keyword(&self) -> &str {
        "ref"
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let target = build.raw_argument(ctx).unwrap_or_default().to_string();
        build
            .new_action(ctx, format!("ref {target}"))
            .requires_ctx(ctx, &THING, NsKey::name(target), ModelProcessingPhase::FullDeclaration)
            .apply(move |build, values| {
                let found = values[0]
                    .as_ctx()
                    .ok_or_else(|| ReactorError::invariant("thing is not a context"))?;
                let description = build.describe(found);
                build.properties_mut(ctx).default_value = Some(description);
                Ok(())
            });
        Ok(())
    }
}

/// `clone x;` places a copy of thing `x` right after itself
pub struct CloneSupport;

impl StatementSupport for CloneSupport {
    fn keyword(&self) -> &str {
        "clone"
    }

    fn in_effective_model(&self) -> bool {
        false
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let target = build.raw_argument(ctx).unwrap_or_default().to_string();
        build
            .new_action(ctx, format!("clone {target}"))
            .requires_ctx(ctx, &THING, NsKey::name(target), ModelProcessingPhase::FullDeclaration)
            .apply(move |build, values| {
                let found = values[0]
                    .as_ctx()
                    .ok_or_else(|| ReactorError::invariant("thing is not a context"))?;
                let parent = build
                    .parent(ctx)
                    .ok_or_else(|| ReactorError::invariant("clone without parent"))?;
                let module = build.module_of(ctx);
                let copy = build.copy_subtree(found, parent, StatementOrigin::Uses, module, ctx);
                let index = build.position_in_parent(ctx).map_or(0, |i| i + 1);
                build.insert_children(parent, index, &[copy]);
                Ok(())
            });
        Ok(())
    }
}

pub struct TraceSupport {
    pub log: TraceLog,
}

impl TraceSupport {
    fn record(&self, build: &BuildContext, ctx: CtxId, phase: ModelProcessingPhase) {
        let argument = build.raw_argument(ctx).unwrap_or_default().to_string();
        self.log.lock().unwrap().push((phase, argument));
    }
}

impl StatementSupport for TraceSupport {
    fn keyword(&self) -> &str {
        "trace"
    }

    fn on_statement_added(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.record(build, ctx, ModelProcessingPhase::Init);
        Ok(())
    }

    fn on_pre_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.record(build, ctx, ModelProcessingPhase::SourcePreLinkage);
        Ok(())
    }

    fn on_linkage_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.record(build, ctx, ModelProcessingPhase::SourceLinkage);
        Ok(())
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.record(build, ctx, ModelProcessingPhase::StatementDefinition);
        Ok(())
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.record(build, ctx, ModelProcessingPhase::FullDeclaration);
        Ok(())
    }

    fn on_effective_model(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.record(build, ctx, ModelProcessingPhase::EffectiveModel);
        Ok(())
    }
}

/// Extension statement `ext:marker` with an upper-cased argument
pub struct MarkerSupport;

impl StatementSupport for MarkerSupport {
    fn keyword(&self) -> &str {
        "ext:marker"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        Ok(Argument::Text(build.raw_argument(ctx).unwrap_or_default().to_uppercase()))
    }
}

pub struct TextSupport(pub &'static str);

impl StatementSupport for TextSupport {
    fn keyword(&self) -> &str {
        self.0
    }
}

pub fn bundle_with_log(log: TraceLog) -> Arc<StatementSupportBundle> {
    let bundle = StatementSupportBundle::builder("toy")
        .add(ModuleSupport::new())
        .add(ImportSupport)
        .add(ThingSupport)
        .add(RefSupport)
        .add(CloneSupport)
        .add(TraceSupport { log })
        .add(TextSupport("namespace"))
        .add(TextSupport("prefix"))
        .add(TextSupport("description"))
        .build()
        .unwrap();
    Arc::new(bundle)
}

pub fn toy_bundle() -> Arc<StatementSupportBundle> {
    bundle_with_log(TraceLog::default())
}

pub fn module(name: &str) -> RawStatement {
    RawStatement::with_argument("module", name)
        .with_substatement(RawStatement::with_argument("namespace", format!("urn:test:{name}")))
        .with_substatement(RawStatement::with_argument("prefix", name))
}

pub fn import(name: &str) -> RawStatement {
    RawStatement::with_argument("import", name).with_substatement(RawStatement::with_argument("prefix", name))
}

pub fn thing(name: &str) -> RawStatement {
    RawStatement::with_argument("thing", name)
}

pub fn reference(name: &str) -> RawStatement {
    RawStatement::with_argument("ref", name)
}

pub fn document(root: RawStatement) -> SourceDocument {
    let name = format!("{}.yang", root.argument().unwrap_or("unnamed"));
    SourceDocument::new(name, root)
}
