//! `typedef` and `type`
//!
//! Every `type` statement resolves to a [`TypeDefinition`] in the
//! full-declaration phase: built-in names directly, other names once the
//! referenced `typedef` has itself been fully declared. The result is kept
//! in the properties of the `type` context; a `typedef` parent gets a
//! derivation step named after it. Typedefs that refer to each other
//! never become ready and are reported as a dependency cycle.

use crate::args::{self, ArgumentKind};
use crate::namespaces::{IDENTITY, TYPEDEF};
use std::sync::Arc;
use yang_model::{Argument, BitMember, BuiltinType, EnumMember, QName, Restriction, TypeDefinition};
use yang_reactor::{
    BuildContext, CopyPolicy, CtxId, ModelProcessingPhase, NsKey, NsValue, ReactorError, Result,
    StatementSupport, SubstatementValidator,
};

const RESTRICTIONS: &[&str] = &["range", "length", "pattern", "fraction-digits"];

pub struct TypedefSupport {
    validator: SubstatementValidator,
}

impl TypedefSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("typedef")
                .mandatory("type")
                .optional_of(&["units", "default", "status", "description", "reference"]),
        }
    }
}

impl Default for TypedefSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for TypedefSupport {
    fn keyword(&self) -> &str {
        "typedef"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        ArgumentKind::Identifier.parse(build, ctx)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let Some(name) = build.argument(ctx).as_qname().cloned() else {
            return Err(ReactorError::invariant("typedef without parsed name"));
        };
        if BuiltinType::from_name(name.local_name()).is_some() {
            return Err(build.statement_error(
                ctx,
                format!("typedef '{}' shadows a built-in type", name.local_name()),
            ));
        }
        let Some(parent) = build.parent(ctx) else {
            return Err(ReactorError::invariant("typedef without parent"));
        };
        build.put(parent, &TYPEDEF, NsKey::QName(name), NsValue::Ctx(ctx))
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Ignore
    }
}

pub struct TypeSupport {
    validator: SubstatementValidator,
}

impl TypeSupport {
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: SubstatementValidator::new("type")
                .optional_of(&["fraction-digits", "range", "length", "path", "require-instance"])
                .any_of(&["pattern", "enum", "bit", "base", "type"]),
        }
    }
}

impl Default for TypeSupport {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementSupport for TypeSupport {
    fn keyword(&self) -> &str {
        "type"
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        let raw = args::required(build, ctx)?;
        args::type_name(build, ctx, raw).map(Argument::QName)
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_full_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        // resolved from the raw text: copies may not have parsed yet
        let raw = args::required(build, ctx)?.to_string();
        let name = args::type_name(build, ctx, &raw)?;
        let description = build.describe(ctx);

        if let Some(builtin) = BuiltinType::from_name(&raw) {
            let members = build.children_with_keyword(ctx, "type");
            let bases = identity_bases(build, ctx)?;
            let mut action = build.new_action(ctx, description);
            for member in members {
                action = action.requires_phase(member, ModelProcessingPhase::FullDeclaration);
            }
            for base in bases {
                let target = format!("identity {}", base.local_name());
                action = action
                    .requires_value(ctx, &IDENTITY, NsKey::QName(base))
                    .target(target);
            }
            action.apply(move |build, _| {
                let definition = restricted(build, ctx, TypeDefinition::builtin(builtin), true)?;
                store(build, ctx, Arc::new(definition))
            });
        } else {
            build
                .new_action(ctx, description)
                .requires_ctx(
                    ctx,
                    &TYPEDEF,
                    NsKey::QName(name.clone()),
                    ModelProcessingPhase::FullDeclaration,
                )
                .target(format!("typedef {raw}"))
                .apply(move |build, values| {
                    let typedef = values
                        .first()
                        .and_then(NsValue::as_ctx)
                        .ok_or_else(|| ReactorError::invariant("typedef lookup returned no context"))?;
                    let parent = build.properties(typedef).type_definition.clone().ok_or_else(|| {
                        ReactorError::invariant(format!("{} resolved without a type", build.describe(typedef)))
                    })?;
                    let definition = if has_restrictions(build, ctx) {
                        let derived = TypeDefinition::derive(name, &parent);
                        Arc::new(restricted(build, ctx, derived, false)?)
                    } else {
                        parent
                    };
                    store(build, ctx, definition)
                });
        }
        Ok(())
    }

    fn internable(&self) -> bool {
        true
    }
}

fn has_restrictions(build: &BuildContext, ctx: CtxId) -> bool {
    build.children(ctx).iter().any(|c| {
        let keyword = build.keyword(*c);
        !keyword.is_prefixed() && !keyword.is("type")
    })
}

/// Resolved `base` names of `ctx`
fn identity_bases(build: &BuildContext, ctx: CtxId) -> Result<Vec<QName>> {
    build
        .children_with_keyword(ctx, "base")
        .into_iter()
        .map(|base| {
            let raw = args::required(build, base)?;
            build.resolve_identifier(base, raw)
        })
        .collect()
}

/// Apply the restriction substatements of `ctx` to `definition`
fn restricted(build: &BuildContext, ctx: CtxId, mut definition: TypeDefinition, builtin: bool) -> Result<TypeDefinition> {
    for child in build.children(ctx).iter().copied() {
        let keyword = build.keyword(child);
        if let Some(restriction) = RESTRICTIONS.iter().find(|k| keyword.is(k)) {
            definition.restrictions.push(Restriction {
                keyword: (*restriction).to_string(),
                argument: args::required(build, child)?.to_string(),
            });
        }
    }
    if let Some(path) = build.child_argument(ctx, "path") {
        definition.leafref_path = Some(path.to_string());
    }
    if let Some(required) = build.child_argument(ctx, "require-instance") {
        definition.require_instance = Some(required == "true");
    }

    let enums = build.children_with_keyword(ctx, "enum");
    if !enums.is_empty() {
        definition.enums = enum_members(build, &enums)?;
    }
    let bits = build.children_with_keyword(ctx, "bit");
    if !bits.is_empty() {
        definition.bits = bit_members(build, &bits)?;
    }
    let bases = identity_bases(build, ctx)?;
    if !bases.is_empty() {
        definition.identity_bases = bases;
    }

    let members = build.children_with_keyword(ctx, "type");
    if !members.is_empty() {
        definition.union_members = members
            .into_iter()
            .map(|m| {
                build.properties(m).type_definition.clone().ok_or_else(|| {
                    ReactorError::invariant(format!("union member {} unresolved", build.describe(m)))
                })
            })
            .collect::<Result<_>>()?;
    }

    if builtin {
        let missing = match definition.base {
            BuiltinType::Enumeration if definition.enums.is_empty() => Some("enum"),
            BuiltinType::Bits if definition.bits.is_empty() => Some("bit"),
            BuiltinType::LeafRef if definition.leafref_path.is_none() => Some("path"),
            BuiltinType::IdentityRef if definition.identity_bases.is_empty() => Some("base"),
            BuiltinType::Union if definition.union_members.is_empty() => Some("type"),
            BuiltinType::Decimal64 if !definition.restrictions.iter().any(|r| r.keyword == "fraction-digits") => {
                Some("fraction-digits")
            }
            _ => None,
        };
        if let Some(missing) = missing {
            return Err(build.statement_error(
                ctx,
                format!("type {} requires '{missing}'", definition.base.name()),
            ));
        }
    }
    Ok(definition)
}

fn enum_members(build: &BuildContext, enums: &[CtxId]) -> Result<Vec<EnumMember>> {
    let mut members = Vec::with_capacity(enums.len());
    let mut next: i64 = 0;
    for &member in enums {
        let name = args::required(build, member)?.to_string();
        let value = match build.child_argument(member, "value") {
            Some(text) => text
                .parse::<i64>()
                .map_err(|_| build.statement_error(member, format!("invalid enum value '{text}'")))?,
            None => next,
        };
        if members.iter().any(|m: &EnumMember| m.name == name || m.value == value) {
            return Err(build.statement_error(member, format!("duplicate enum '{name}' = {value}")));
        }
        next = value.saturating_add(1);
        members.push(EnumMember { name, value });
    }
    Ok(members)
}

fn bit_members(build: &BuildContext, bits: &[CtxId]) -> Result<Vec<BitMember>> {
    let mut members = Vec::with_capacity(bits.len());
    let mut next: u32 = 0;
    for &bit in bits {
        let name = args::required(build, bit)?.to_string();
        let position = match build.child_argument(bit, "position") {
            Some(text) => text
                .parse::<u32>()
                .map_err(|_| build.statement_error(bit, format!("invalid bit position '{text}'")))?,
            None => next,
        };
        if members.iter().any(|m: &BitMember| m.name == name || m.position == position) {
            return Err(build.statement_error(bit, format!("duplicate bit '{name}' at {position}")));
        }
        next = position.saturating_add(1);
        members.push(BitMember { name, position });
    }
    Ok(members)
}

/// Keep the definition on the `type` context; a `typedef` parent gets its
/// own derivation step
fn store(build: &mut BuildContext, ctx: CtxId, definition: Arc<TypeDefinition>) -> Result<()> {
    build.properties_mut(ctx).type_definition = Some(Arc::clone(&definition));
    let Some(parent) = build.parent(ctx) else {
        return Ok(());
    };
    if !build.keyword(parent).is("typedef") {
        return Ok(());
    }
    let Some(name) = build.argument(parent).as_qname().cloned() else {
        return Err(ReactorError::invariant("typedef without parsed name"));
    };
    let mut derived = TypeDefinition::derive(name, &definition);
    derived.units = build.child_argument(parent, "units").map(str::to_string);
    derived.default_value = build.child_argument(parent, "default").map(str::to_string);
    build.properties_mut(parent).type_definition = Some(Arc::new(derived));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_validator() {
        let support = TypeSupport::new();
        let validator = support.validator().map(|v| v.cardinality("enum").map(|c| c.max));
        assert_eq!(validator, Some(Some(None)));
    }

    #[test]
    fn test_typedef_not_copied() {
        assert_eq!(TypedefSupport::new().copy_policy(), CopyPolicy::Ignore);
    }
}
