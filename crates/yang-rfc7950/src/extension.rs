//! `extension` definitions and their instances

use crate::args::ArgumentKind;
use crate::namespaces::EXTENSION;
use yang_model::Argument;
use yang_reactor::{
    BuildContext, CtxId, NsKey, NsValue, ReactorError, Result, StatementSupport, SubstatementValidator,
};

pub struct ExtensionSupport {
    validator: SubstatementValidator,
}

impl ExtensionSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("extension")
                .optional_of(&["argument", "status", "description", "reference"]),
        }
    }
}

impl Default for ExtensionSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for ExtensionSupport {
    fn keyword(&self) -> &str {
        "extension"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::Identifier.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(name) = build.argument(ctx).as_qname().cloned() else {
            return Err(ReactorError::invariant("extension without parsed name"));
        };
        build.put(ctx, &EXTENSION, NsKey::QName(name), NsValue::Ctx(ctx))
    }
}

/// Instance of an extension no dedicated support handles.
///
/// Kept with its text argument; the extension it names must be defined by
/// the module its prefix is bound to.
#[derive(Debug, Default)]
pub struct ExtensionInstanceSupport;

impl StatementSupport for ExtensionInstanceSupport {
    fn keyword(&self) -> &str {
        "extension-instance"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        match build.raw_argument(ctx) {
            Some(_) => ArgumentKind::Text.parse(build, ctx),
            None => Ok(Argument::None),
        }
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let keyword = build.keyword(ctx).to_string();
        let name = build.resolve_identifier(ctx, &keyword)?;
        build
            .new_action(ctx, format!("extension instance {keyword}"))
            .requires_value(ctx, &EXTENSION, NsKey::QName(name))
            .target(format!("extension {keyword}"))
            .apply(|_, _| Ok(()));
        Ok(())
    }
}
