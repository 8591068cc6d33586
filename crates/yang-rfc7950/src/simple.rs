//! Statements that only carry an argument
//!
//! Descriptions, flags, restrictions and the like have no phase behaviour
//! of their own; their parents read them. One table-driven support covers
//! all of them.

use crate::args::ArgumentKind;
use yang_model::Argument;
use yang_reactor::{BuildContext, CtxId, Result, StatementSupport, SubstatementValidator};

/// Support described by its argument kind and allowed substatements
#[derive(Debug)]
pub struct SimpleSupport {
    keyword: &'static str,
    argument: ArgumentKind,
    validator: SubstatementValidator,
}

impl SimpleSupport {
    /// Support for a statement without substatements
    #[must_use]
    pub fn new(keyword: &'static str, argument: ArgumentKind) -> Self {
        Self {
            keyword,
            argument,
            validator: SubstatementValidator::new(keyword),
        }
    }

    #[must_use]
    pub fn with_validator(mut self, validator: SubstatementValidator) -> Self {
        self.validator = validator;
        self
    }
}

impl StatementSupport for SimpleSupport {
    fn keyword(&self) -> &str {
        self.keyword
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        self.argument.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn internable(&self) -> bool {
        true
    }
}

const DOCUMENTATION: &[&str] = &["description", "reference"];
const ERROR_INFO: &[&str] = &["error-message", "error-app-tag", "description", "reference"];

fn documented(keyword: &str) -> SubstatementValidator {
    SubstatementValidator::new(keyword).optional_of(DOCUMENTATION)
}

/// Every statement handled by [`SimpleSupport`]
#[must_use]
pub fn simple_supports() -> Vec<SimpleSupport> {
    use ArgumentKind as A;
    vec![
        SimpleSupport::new("yang-version", A::Text),
        SimpleSupport::new("namespace", A::Text),
        SimpleSupport::new("prefix", A::Text),
        SimpleSupport::new("organization", A::Text),
        SimpleSupport::new("contact", A::Text),
        SimpleSupport::new("description", A::Text),
        SimpleSupport::new("reference", A::Text),
        SimpleSupport::new("revision", A::Revision).with_validator(documented("revision")),
        SimpleSupport::new("revision-date", A::Revision),
        SimpleSupport::new("units", A::Text),
        SimpleSupport::new("default", A::Text),
        SimpleSupport::new("config", A::Boolean),
        SimpleSupport::new("mandatory", A::Boolean),
        SimpleSupport::new("presence", A::Text),
        SimpleSupport::new("min-elements", A::Unsigned),
        SimpleSupport::new("max-elements", A::MaxElements),
        SimpleSupport::new("ordered-by", A::Text),
        SimpleSupport::new("status", A::Status),
        SimpleSupport::new("key", A::Keys),
        SimpleSupport::new("unique", A::Text),
        SimpleSupport::new("must", A::Text)
            .with_validator(SubstatementValidator::new("must").optional_of(ERROR_INFO)),
        SimpleSupport::new("when", A::Text).with_validator(documented("when")),
        SimpleSupport::new("error-message", A::Text),
        SimpleSupport::new("error-app-tag", A::Text),
        SimpleSupport::new("range", A::Text)
            .with_validator(SubstatementValidator::new("range").optional_of(ERROR_INFO)),
        SimpleSupport::new("length", A::Text)
            .with_validator(SubstatementValidator::new("length").optional_of(ERROR_INFO)),
        SimpleSupport::new("pattern", A::Text).with_validator(
            SubstatementValidator::new("pattern")
                .optional("modifier")
                .optional_of(ERROR_INFO),
        ),
        SimpleSupport::new("modifier", A::Text),
        SimpleSupport::new("fraction-digits", A::Unsigned),
        SimpleSupport::new("path", A::Text),
        SimpleSupport::new("require-instance", A::Boolean),
        SimpleSupport::new("enum", A::Text).with_validator(
            SubstatementValidator::new("enum")
                .any("if-feature")
                .optional_of(&["value", "status", "description", "reference"]),
        ),
        SimpleSupport::new("value", A::Text),
        SimpleSupport::new("bit", A::Text).with_validator(
            SubstatementValidator::new("bit")
                .any("if-feature")
                .optional_of(&["position", "status", "description", "reference"]),
        ),
        SimpleSupport::new("position", A::Unsigned),
        SimpleSupport::new("argument", A::Text)
            .with_validator(SubstatementValidator::new("argument").optional("yin-element")),
        SimpleSupport::new("yin-element", A::Boolean),
    ]
}
