//! Leafref target resolution

use crate::namespaces::SCHEMA_TREE;
use yang_model::{BuiltinType, SchemaPath, TypeDefinition};
use yang_reactor::{BuildContext, CtxId, NsKey, Result};

/// Register the lookup of the node a leafref `leaf` points to.
///
/// The target is searched in the schema tree during the effective-model
/// phase, so nodes added by augments count. A target that never appears is
/// an unresolved reference.
///
/// # Errors
///
/// Returns a statement error for a malformed path.
pub fn resolve_target(build: &mut BuildContext, leaf: CtxId, definition: &TypeDefinition) -> Result<()> {
    if definition.base != BuiltinType::LeafRef {
        return Ok(());
    }
    let Some(path) = definition.leafref_path.clone() else {
        return Err(build.statement_error(leaf, "leafref type without path"));
    };
    let target = target_path(build, leaf, &path)?;
    build
        .new_action(leaf, format!("leafref {path}"))
        .requires_value(leaf, &SCHEMA_TREE, NsKey::Path(target.clone()))
        .target(format!("leafref target {path}"))
        .apply(move |build, _| {
            build.properties_mut(leaf).leafref_target = Some(target);
            Ok(())
        });
    Ok(())
}

/// Absolute schema path named by a leafref `path`, predicates dropped
fn target_path(build: &BuildContext, leaf: CtxId, path: &str) -> Result<SchemaPath> {
    let cleaned = strip_predicates(path);
    let cleaned = cleaned.trim();
    if let Some(absolute) = cleaned.strip_prefix('/') {
        let steps = absolute
            .split('/')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|step| build.resolve_identifier(leaf, step))
            .collect::<Result<Vec<_>>>()?;
        return Ok(SchemaPath::absolute(steps));
    }

    let mut steps = build
        .properties(leaf)
        .schema_path
        .as_ref()
        .map(|p| p.steps.clone())
        .ok_or_else(|| build.statement_error(leaf, "leafref outside the schema tree"))?;
    for step in cleaned.split('/').map(str::trim).filter(|s| !s.is_empty()) {
        if step == ".." {
            if steps.pop().is_none() {
                return Err(build.statement_error(leaf, format!("leafref path '{path}' leaves the schema tree")));
            }
        } else if step.contains(':') {
            steps.push(build.resolve_identifier(leaf, step)?);
        } else {
            let module = build
                .module_of(leaf)
                .ok_or_else(|| build.statement_error(leaf, "no module bound"))?;
            steps.push(module.qname(step));
        }
    }
    Ok(SchemaPath::absolute(steps))
}

fn strip_predicates(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut depth = 0usize;
    for c in path.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_predicates() {
        assert_eq!(
            strip_predicates("/if:interfaces/if:interface[if:name = current()/../ifname]/if:mtu"),
            "/if:interfaces/if:interface/if:mtu"
        );
        assert_eq!(strip_predicates("../name"), "../name");
    }
}
