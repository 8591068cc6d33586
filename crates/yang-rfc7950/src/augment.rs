//! Top-level `augment`
//!
//! Applied in the effective-model phase, once the target path exists in
//! the schema tree. Targets may themselves come from `uses` expansion or
//! from other augments. Nodes added by several augments to one target are
//! ordered by the declaration order of the augments.

use crate::args::{self, ArgumentKind};
use crate::grouping::copy_schema_children;
use crate::namespaces::{self, SCHEMA_TREE};
use crate::schema::DATA_DEF;
use tracing::debug;
use yang_model::{Argument, StatementOrigin};
use yang_reactor::{
    BuildContext, CopyPolicy, CtxId, NsKey, NsValue, ReactorError, Result, StatementSupport,
    SubstatementValidator,
};

pub struct AugmentSupport {
    validator: SubstatementValidator,
}

impl AugmentSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("augment")
                .optional_of(&["when", "status", "description", "reference"])
                .any_of(&["if-feature", "case", "action", "notification"])
                .any_of(DATA_DEF),
        }
    }

    fn apply(build: &mut BuildContext, augment: CtxId, target: CtxId) -> Result<()> {
        if !build.support(target).is_augment_target() {
            return Err(build.statement_error(
                augment,
                format!("{} cannot be augmented", build.describe(target)),
            ));
        }
        let order = build.declaration_order(augment);
        let index = build
            .children(target)
            .iter()
            .position(|c| {
                build.origin(*c) != StatementOrigin::Declared
                    && build
                        .introduced_by(*c)
                        .last()
                        .is_some_and(|by| build.keyword(*by).is("augment") && build.declaration_order(*by) > order)
            })
            .unwrap_or(usize::MAX);
        let module = build.module_of(augment);
        let copies = copy_schema_children(
            build,
            augment,
            target,
            index,
            StatementOrigin::Augment,
            module.as_ref(),
            augment,
        );
        debug!(
            augment = %build.describe(augment),
            target = %build.describe(target),
            nodes = copies.len(),
            "augment applied"
        );
        Ok(())
    }
}

impl Default for AugmentSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for AugmentSupport {
    fn keyword(&self) -> &str {
        "augment"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::SchemaNodeId.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_effective_model(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        // augments below `uses` are applied by the expansion
        if build.parent(ctx).and_then(|p| build.parent(p)).is_some() {
            return Ok(());
        }
        let raw = args::required(build, ctx)?.to_string();
        let Some(path) = build.argument(ctx).as_schema_path().cloned() else {
            return Err(ReactorError::invariant("augment without parsed path"));
        };
        if !path.absolute {
            return Err(build.statement_error(ctx, format!("augment target '{raw}' must be absolute")));
        }
        let module = path
            .steps
            .first()
            .and_then(|first| namespaces::module_name(build, ctx, &first.module))
            .unwrap_or_else(|| raw.clone());
        let description = build.describe(ctx);

        build
            .new_action(ctx, description)
            .requires_value(ctx, &SCHEMA_TREE, NsKey::Path(path))
            .target(format!("augment target {raw} in module {module}"))
            .mutates_schema_tree()
            .apply(move |build, values| {
                let target = values
                    .first()
                    .and_then(NsValue::as_ctx)
                    .ok_or_else(|| ReactorError::invariant("schema tree lookup returned no context"))?;
                Self::apply(build, ctx, target)
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
