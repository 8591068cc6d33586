//! `identity` and `base`

use crate::args::{self, ArgumentKind};
use crate::namespaces::IDENTITY;
use yang_model::Argument;
use yang_reactor::{
    BuildContext, CtxId, ModelProcessingPhase, NsKey, NsValue, ReactorError, Result, StatementSupport,
    SubstatementValidator,
};

pub struct IdentitySupport {
    validator: SubstatementValidator,
}

impl IdentitySupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("identity")
                .any_of(&["if-feature", "base"])
                .optional_of(&["status", "description", "reference"]),
        }
    }
}

impl Default for IdentitySupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for IdentitySupport {
    fn keyword(&self) -> &str {
        "identity"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::Identifier.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(name) = build.argument(ctx).as_qname().cloned() else {
            return Err(ReactorError::invariant("identity without parsed name"));
        };
        build.put(ctx, &IDENTITY, NsKey::QName(name), NsValue::Ctx(ctx))
    }
}

/// `base` of an identity waits for the base identity to be fully declared,
/// so identities deriving from each other form a dependency cycle.
/// `base` of an `identityref` type is read by the type.
#[derive(Debug, Default)]
pub struct BaseSupport;

impl StatementSupport for BaseSupport {
    fn keyword(&self) -> &str {
        "base"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::IdentifierRef.parse(build, ctx)
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(identity) = build.parent(ctx).filter(|p| build.keyword(*p).is("identity")) else {
            return Ok(());
        };
        let raw = args::required(build, ctx)?.to_string();
        let base = build.resolve_identifier(ctx, &raw)?;
        let description = build.describe(ctx);
        build
            .new_action(ctx, description)
            .requires_ctx(
                ctx,
                &IDENTITY,
                NsKey::QName(base.clone()),
                ModelProcessingPhase::FullDeclaration,
            )
            .target(format!("identity {raw}"))
            .apply(move |build, _| {
                build.properties_mut(identity).identity_bases.push(base);
                Ok(())
            });
        Ok(())
    }

    fn internable(&self) -> bool {
        true
    }
}
