//! Argument parsing shared by the statement supports

use regex::Regex;
use std::sync::LazyLock;
use yang_ir::Revision;
use yang_model::{Argument, BuiltinType, QName, SchemaPath, Status};
use yang_reactor::{BuildContext, CtxId, Result};

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$")
        .unwrap_or_else(|e| unreachable!("identifier pattern is valid: {e}"))
});

/// How a statement's raw argument is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// The statement takes no argument
    None,
    Text,
    /// New identifier, qualified with the module of the statement
    Identifier,
    /// Reference to an identifier, `prefix:name` or `name`
    IdentifierRef,
    /// Schema node identifier, absolute or descendant
    SchemaNodeId,
    Boolean,
    Unsigned,
    /// Non-negative integer or `unbounded`
    MaxElements,
    Status,
    Revision,
    /// Space separated key leaf names
    Keys,
}

impl ArgumentKind {
    /// Parse the argument of `ctx`.
    ///
    /// # Errors
    ///
    /// Returns a statement error for a missing or malformed argument.
    pub fn parse(self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        if self == Self::None {
            return Ok(Argument::None);
        }
        let raw = required(build, ctx)?;
        match self {
            Self::None => Ok(Argument::None),
            Self::Text => Ok(Argument::Text(raw.to_string())),
            Self::Identifier => identifier(build, ctx, raw).map(Argument::QName),
            Self::IdentifierRef => build.resolve_identifier(ctx, raw).map(Argument::QName),
            Self::SchemaNodeId => schema_nodeid(build, ctx, raw).map(Argument::SchemaPath),
            Self::Boolean => match raw {
                "true" => Ok(Argument::Boolean(true)),
                "false" => Ok(Argument::Boolean(false)),
                other => Err(build.statement_error(ctx, format!("invalid boolean '{other}'"))),
            },
            Self::Unsigned => raw
                .parse::<u64>()
                .map(Argument::Unsigned)
                .map_err(|_| build.statement_error(ctx, format!("invalid non-negative integer '{raw}'"))),
            Self::MaxElements => {
                if raw == "unbounded" {
                    Ok(Argument::Unbounded)
                } else {
                    raw.parse::<u64>()
                        .ok()
                        .filter(|n| *n > 0)
                        .map(Argument::Unsigned)
                        .ok_or_else(|| build.statement_error(ctx, format!("invalid max-elements '{raw}'")))
                }
            }
            Self::Status => Status::parse(raw)
                .map(Argument::Status)
                .ok_or_else(|| build.statement_error(ctx, format!("invalid status '{raw}'"))),
            Self::Revision => Revision::parse(raw)
                .map(Argument::Revision)
                .map_err(|e| build.statement_error(ctx, e.to_string())),
            Self::Keys => {
                let keys = raw
                    .split_whitespace()
                    .map(|name| identifier(build, ctx, name))
                    .collect::<Result<Vec<_>>>()?;
                if keys.is_empty() {
                    return Err(build.statement_error(ctx, "empty key"));
                }
                Ok(Argument::Keys(keys))
            }
        }
    }
}

/// Raw argument of `ctx`, which must be present
///
/// # Errors
///
/// Returns a statement error when the argument is missing.
pub fn required(build: &BuildContext, ctx: CtxId) -> Result<&str> {
    build
        .raw_argument(ctx)
        .ok_or_else(|| build.statement_error(ctx, format!("'{}' requires an argument", build.keyword(ctx))))
}

/// Qualify a newly defined `name` with the module of `ctx`.
///
/// # Errors
///
/// Returns a statement error for an invalid identifier or when no module
/// is bound yet.
pub fn identifier(build: &BuildContext, ctx: CtxId, name: &str) -> Result<QName> {
    let local = local_name(name);
    check_identifier(build, ctx, local)?;
    let module = build
        .module_of(ctx)
        .ok_or_else(|| build.statement_error(ctx, format!("no module bound while defining '{name}'")))?;
    Ok(module.qname(local))
}

/// # Errors
///
/// Returns a statement error unless `name` is a YANG identifier.
pub fn check_identifier(build: &BuildContext, ctx: CtxId, name: &str) -> Result<()> {
    if IDENTIFIER.is_match(name) {
        Ok(())
    } else {
        Err(build.statement_error(ctx, format!("invalid identifier '{name}'")))
    }
}

/// Resolve a type name, built-in names first
///
/// # Errors
///
/// Returns a statement error for unknown prefixes.
pub fn type_name(build: &BuildContext, ctx: CtxId, text: &str) -> Result<QName> {
    match BuiltinType::from_name(text) {
        Some(builtin) => Ok(builtin.qname()),
        None => build.resolve_identifier(ctx, text),
    }
}

/// Parse `/a:b/a:c` or `b/c`, resolving prefixes as written at `ctx`.
///
/// # Errors
///
/// Returns a statement error for empty steps or unknown prefixes.
pub fn schema_nodeid(build: &BuildContext, ctx: CtxId, text: &str) -> Result<SchemaPath> {
    let absolute = text.starts_with('/');
    let body = text.trim_start_matches('/');
    let mut steps = Vec::new();
    for step in body.split('/') {
        let step = step.trim();
        if step.is_empty() {
            return Err(build.statement_error(ctx, format!("empty step in schema node identifier '{text}'")));
        }
        steps.push(build.resolve_identifier(ctx, step)?);
    }
    Ok(if absolute {
        SchemaPath::absolute(steps)
    } else {
        SchemaPath::relative(steps)
    })
}

/// Local part of `prefix:name`
#[must_use]
pub fn local_name(text: &str) -> &str {
    text.rsplit_once(':').map_or(text, |(_, local)| local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("a:b"), "b");
        assert_eq!(local_name("b"), "b");
    }

    #[test]
    fn test_identifier_pattern() {
        assert!(IDENTIFIER.is_match("if-name_2.x"));
        assert!(!IDENTIFIER.is_match("2bad"));
        assert!(!IDENTIFIER.is_match(""));
    }
}
