//! `feature` and `if-feature`

use crate::args::{self, ArgumentKind};
use crate::namespaces::{self, FEATURE};
use tracing::debug;
use yang_model::{Argument, IfFeatureExpr};
use yang_reactor::{
    BuildContext, CtxId, NsKey, NsValue, ReactorError, Result, StatementSupport, SubstatementValidator,
};

pub struct FeatureSupport {
    validator: SubstatementValidator,
}

impl FeatureSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("feature")
                .any("if-feature")
                .optional_of(&["status", "description", "reference"]),
        }
    }
}

impl Default for FeatureSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for FeatureSupport {
    fn keyword(&self) -> &str {
        "feature"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::Identifier.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(name) = build.argument(ctx).as_qname().cloned() else {
            return Err(ReactorError::invariant("feature without parsed name"));
        };
        build.put(ctx, &FEATURE, NsKey::QName(name), NsValue::Ctx(ctx))
    }
}

/// `if-feature`: the expression is checked against the declared features
/// and evaluated with the configured feature set. A false expression
/// removes the parent from the effective model.
#[derive(Debug, Default)]
pub struct IfFeatureSupport;

impl IfFeatureSupport {
    fn expression(build: &BuildContext, ctx: CtxId) -> Result<IfFeatureExpr> {
        let text = args::required(build, ctx)?;
        IfFeatureExpr::parse(text, |name| {
            build.resolve_identifier(ctx, name).map_err(|e| e.to_string())
        })
        .map_err(|message| build.statement_error(ctx, message))
    }
}

impl StatementSupport for IfFeatureSupport {
    fn keyword(&self) -> &str {
        "if-feature"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        Self::expression(build, ctx).map(Argument::IfFeature)
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let expression = Self::expression(build, ctx)?;
        let description = build.describe(ctx);
        let mut action = build.new_action(ctx, description);
        for feature in expression.features() {
            action = action
                .requires_value(ctx, &FEATURE, NsKey::QName(feature.clone()))
                .target(format!("feature {}", feature.local_name()));
        }
        action.apply(|_, _| Ok(()));
        Ok(())
    }

    fn on_effective_model(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(parent) = build.parent(ctx) else {
            return Ok(());
        };
        // a feature's own condition does not switch the feature off
        if build.keyword(parent).is("feature") {
            return Ok(());
        }
        let expression = Self::expression(build, ctx)?;
        let supported = expression.evaluate(&|feature: &yang_model::QName| {
            let module = namespaces::module_name(build, ctx, &feature.module).unwrap_or_default();
            build.config().is_feature_supported(&module, feature.local_name())
        });
        if !supported {
            debug!(statement = %build.describe(parent), "disabled by if-feature");
            build.set_unsupported(parent);
        }
        Ok(())
    }

    fn internable(&self) -> bool {
        true
    }
}
