//! Schema node statements
//!
//! Data nodes, choices and cases, operations and notifications. Each node
//! registers itself with its schema parent in statement definition, so
//! absolute paths can be resolved through [`SCHEMA_TREE`]. In the
//! effective-model phase the node computes its inherited properties:
//! schema path, `config`, `status`, mandatory-ness, defaults and list keys.
//!
//! [`SCHEMA_TREE`]: crate::namespaces::SCHEMA_TREE

use crate::args::{self, ArgumentKind};
use crate::leafref;
use crate::namespaces::{CHILD_SCHEMA_NODE, schema_anchor};
use yang_model::{Argument, SchemaPath, Status};
use yang_reactor::{
    BuildContext, CtxId, ModelProcessingPhase, NsKey, NsValue, ReactorError, Result, StatementSupport,
    SubstatementValidator,
};

/// Data definition statements
pub(crate) const DATA_DEF: &[&str] = &[
    "container",
    "leaf",
    "leaf-list",
    "list",
    "choice",
    "anydata",
    "anyxml",
    "uses",
];

/// Choice children that stand for a case of their own
const SHORTHAND_CASES: &[&str] = &[
    "container",
    "leaf",
    "leaf-list",
    "list",
    "anydata",
    "anyxml",
    "choice",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Container,
    Leaf,
    LeafList,
    List,
    Choice,
    Case,
    AnyData,
    AnyXml,
    Rpc,
    Action,
    Input,
    Output,
    Notification,
}

impl NodeKind {
    fn keyword(self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Leaf => "leaf",
            Self::LeafList => "leaf-list",
            Self::List => "list",
            Self::Choice => "choice",
            Self::Case => "case",
            Self::AnyData => "anydata",
            Self::AnyXml => "anyxml",
            Self::Rpc => "rpc",
            Self::Action => "action",
            Self::Input => "input",
            Self::Output => "output",
            Self::Notification => "notification",
        }
    }

    /// Operations and notifications carry no configuration
    fn outside_config(self) -> bool {
        matches!(
            self,
            Self::Rpc | Self::Action | Self::Input | Self::Output | Self::Notification
        )
    }

    fn validator(self) -> SubstatementValidator {
        let v = SubstatementValidator::new(self.keyword());
        match self {
            Self::Container => v
                .optional_of(&["when", "presence", "config", "status", "description", "reference"])
                .any_of(&["if-feature", "must", "typedef", "grouping", "action", "notification"])
                .any_of(DATA_DEF),
            Self::Leaf => v
                .mandatory("type")
                .optional_of(&[
                    "when",
                    "units",
                    "default",
                    "config",
                    "mandatory",
                    "status",
                    "description",
                    "reference",
                ])
                .any_of(&["if-feature", "must"]),
            Self::LeafList => v
                .mandatory("type")
                .optional_of(&[
                    "when",
                    "units",
                    "config",
                    "min-elements",
                    "max-elements",
                    "ordered-by",
                    "status",
                    "description",
                    "reference",
                ])
                .any_of(&["if-feature", "must", "default"]),
            Self::List => v
                .optional_of(&[
                    "when",
                    "key",
                    "config",
                    "min-elements",
                    "max-elements",
                    "ordered-by",
                    "status",
                    "description",
                    "reference",
                ])
                .any_of(&[
                    "if-feature",
                    "must",
                    "unique",
                    "typedef",
                    "grouping",
                    "action",
                    "notification",
                ])
                .any_of(DATA_DEF),
            Self::Choice => v
                .optional_of(&[
                    "when",
                    "default",
                    "config",
                    "mandatory",
                    "status",
                    "description",
                    "reference",
                ])
                .any_of(&["if-feature", "case"])
                .any_of(SHORTHAND_CASES),
            Self::Case => v
                .optional_of(&["when", "status", "description", "reference"])
                .any("if-feature")
                .any_of(DATA_DEF),
            Self::AnyData | Self::AnyXml => v
                .optional_of(&["when", "config", "mandatory", "status", "description", "reference"])
                .any_of(&["if-feature", "must"]),
            Self::Rpc | Self::Action => v
                .optional_of(&["input", "output", "status", "description", "reference"])
                .any_of(&["if-feature", "typedef", "grouping"]),
            Self::Input | Self::Output => v.any_of(&["must", "typedef", "grouping"]).any_of(DATA_DEF),
            Self::Notification => v
                .optional_of(&["status", "description", "reference"])
                .any_of(&["if-feature", "must", "typedef", "grouping"])
                .any_of(DATA_DEF),
        }
    }
}

/// Support for one schema node keyword
pub struct SchemaNodeSupport {
    kind: NodeKind,
    validator: SubstatementValidator,
}

impl SchemaNodeSupport {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            validator: kind.validator(),
        }
    }

    fn node_name(&self, build: &BuildContext, ctx: CtxId) -> Result<yang_model::QName> {
        build
            .argument(ctx)
            .as_qname()
            .cloned()
            .ok_or_else(|| ReactorError::invariant(format!("{} has no parsed name", build.describe(ctx))))
    }

    fn infer_properties(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        let name = self.node_name(build, ctx)?;
        let parent = build.parent(ctx);
        let schema_path = parent
            .and_then(|p| parent_schema_path(build, p))
            .map(|path| path.child(name));

        let status = match build.child_with_keyword(ctx, "status") {
            Some(child) => {
                let text = args::required(build, child)?;
                Status::parse(text).ok_or_else(|| build.statement_error(child, format!("invalid status '{text}'")))?
            }
            None => parent.map_or(Status::Current, |p| build.properties(p).status),
        };
        let config = self.effective_config(build, ctx)?;
        let mandatory = match self.kind {
            NodeKind::Leaf | NodeKind::Choice | NodeKind::AnyData | NodeKind::AnyXml => {
                build.child_argument(ctx, "mandatory") == Some("true")
            }
            NodeKind::List | NodeKind::LeafList => build
                .child_argument(ctx, "min-elements")
                .and_then(|m| m.parse::<u64>().ok())
                .is_some_and(|m| m > 0),
            _ => false,
        };
        let default_value = match self.kind {
            NodeKind::Leaf | NodeKind::LeafList | NodeKind::Choice => {
                build.child_argument(ctx, "default").map(str::to_string)
            }
            _ => None,
        };
        let keys = match (self.kind, build.child_with_keyword(ctx, "key")) {
            (NodeKind::List, Some(key)) => self.list_keys(build, ctx, key)?,
            _ => Vec::new(),
        };

        let properties = build.properties_mut(ctx);
        properties.schema_path = schema_path;
        properties.status = status;
        properties.config = config;
        properties.mandatory = mandatory;
        properties.default_value = default_value;
        properties.keys = keys;
        Ok(())
    }

    fn effective_config(&self, build: &BuildContext, ctx: CtxId) -> Result<Option<bool>> {
        let outside = self.kind.outside_config()
            || build.ancestors(ctx).into_iter().any(|a| {
                ["grouping", "rpc", "action", "input", "output", "notification"]
                    .iter()
                    .any(|k| build.keyword(a).is(k))
            });
        if outside {
            return Ok(None);
        }
        let inherited = build
            .parent(ctx)
            .and_then(|p| build.properties(p).config)
            .unwrap_or(true);
        let explicit = match build.child_with_keyword(ctx, "config") {
            Some(child) => match args::required(build, child)? {
                "true" => Some(true),
                "false" => Some(false),
                other => return Err(build.statement_error(child, format!("invalid boolean '{other}'"))),
            },
            None => None,
        };
        if explicit == Some(true) && !inherited {
            return Err(build.statement_error(ctx, "config true node under a config false parent"));
        }
        Ok(Some(explicit.unwrap_or(inherited)))
    }

    fn list_keys(&self, build: &BuildContext, ctx: CtxId, key: CtxId) -> Result<Vec<yang_model::QName>> {
        let Argument::Keys(keys) = ArgumentKind::Keys.parse(build, key)? else {
            return Ok(Vec::new());
        };
        let keys: Vec<_> = keys
            .into_iter()
            .map(|k| self.node_name(build, ctx).map(|own| own.module.qname(k.local_name())))
            .collect::<Result<_>>()?;
        let leaves: Vec<&str> = build
            .children_with_keyword(ctx, "leaf")
            .into_iter()
            .filter_map(|leaf| build.raw_argument(leaf))
            .collect();
        if let Some(missing) = keys.iter().find(|k| !leaves.contains(&k.local_name())) {
            return Err(build.statement_error(
                key,
                format!("key '{}' is not a leaf of {}", missing.local_name(), build.describe(ctx)),
            ));
        }
        Ok(keys)
    }

    /// Take over the resolved type once the `type` child is fully declared
    fn adopt_type(&self, build: &mut BuildContext, ctx: CtxId) {
        let Some(type_ctx) = build.child_with_keyword(ctx, "type") else {
            return;
        };
        let kind = self.kind;
        build
            .new_action(ctx, format!("type of {}", build.describe(ctx)))
            .requires_phase(type_ctx, ModelProcessingPhase::FullDeclaration)
            .apply(move |build, _| {
                let definition = build.properties(type_ctx).type_definition.clone();
                let in_schema_tree = schema_anchor(build, ctx).is_some();
                let properties = build.properties_mut(ctx);
                if kind == NodeKind::Leaf && properties.default_value.is_none() {
                    properties.default_value = definition
                        .as_ref()
                        .and_then(|d| d.effective_default())
                        .map(str::to_string);
                }
                properties.type_definition.clone_from(&definition);
                if in_schema_tree {
                    if let Some(definition) = definition {
                        leafref::resolve_target(build, ctx, &definition)?;
                    }
                }
                Ok(())
            });
    }
}

/// Schema path children of `parent` extend; module roots start a new one
fn parent_schema_path(build: &BuildContext, parent: CtxId) -> Option<SchemaPath> {
    if build.parent(parent).is_none() {
        return Some(SchemaPath::absolute(Vec::new()));
    }
    build.properties(parent).schema_path.clone()
}

/// Give every shorthand child of a `choice` its implicit `case`.
///
/// The case takes the child's name, so it is part of schema node
/// identifiers: `/c/ch/x/x` names container `x` of choice `ch`.
pub(crate) fn wrap_shorthand_cases(build: &mut BuildContext, choice: CtxId) {
    if !build.keyword(choice).is("choice") {
        return;
    }
    let shorthand: Vec<CtxId> = build
        .children(choice)
        .iter()
        .copied()
        .filter(|c| {
            let keyword = build.keyword(*c);
            !keyword.is_prefixed() && SHORTHAND_CASES.iter().any(|k| keyword.is(k))
        })
        .collect();
    for child in shorthand {
        build.wrap_in_implicit(child, "case");
    }
}

/// Supports of every schema node keyword
#[must_use]
pub fn schema_node_supports() -> Vec<SchemaNodeSupport> {
    [
        NodeKind::Container,
        NodeKind::Leaf,
        NodeKind::LeafList,
        NodeKind::List,
        NodeKind::Choice,
        NodeKind::Case,
        NodeKind::AnyData,
        NodeKind::AnyXml,
        NodeKind::Rpc,
        NodeKind::Action,
        NodeKind::Input,
        NodeKind::Output,
        NodeKind::Notification,
    ]
    .into_iter()
    .map(SchemaNodeSupport::new)
    .collect()
}

impl StatementSupport for SchemaNodeSupport {
    fn keyword(&self) -> &str {
        self.kind.keyword()
    }

    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        match self.kind {
            NodeKind::Input | NodeKind::Output => build
                .module_of(ctx)
                .map(|m| Argument::QName(m.qname(self.kind.keyword())))
                .ok_or_else(|| build.statement_error(ctx, "no module bound")),
            _ => ArgumentKind::Identifier.parse(build, ctx),
        }
    }

    fn validator(&self) -> Option<&SubstatementValidator> {
        Some(&self.validator)
    }

    fn on_statement_added(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        if self.kind == NodeKind::Choice {
            wrap_shorthand_cases(build, ctx);
        }
        if matches!(self.kind, NodeKind::Rpc | NodeKind::Action) {
            for keyword in ["input", "output"] {
                if build.child_with_keyword(ctx, keyword).is_none() {
                    build.add_implicit_child(ctx, keyword);
                }
            }
        }
        Ok(())
    }

    fn on_statement_definition_declared(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        if let Some(anchor) = schema_anchor(build, ctx) {
            let name = self.node_name(build, ctx)?;
            build.put(anchor, &CHILD_SCHEMA_NODE, NsKey::QName(name), NsValue::Ctx(ctx))?;
        }
        Ok(())
    }

    fn on_effective_model(&self, build: &mut BuildContext, ctx: CtxId) -> Result<()> {
        self.infer_properties(build, ctx)?;
        if matches!(self.kind, NodeKind::Leaf | NodeKind::LeafList) {
            self.adopt_type(build, ctx);
        }
        Ok(())
    }

    fn is_augment_target(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Container
                | NodeKind::List
                | NodeKind::Choice
                | NodeKind::Case
                | NodeKind::Input
                | NodeKind::Output
                | NodeKind::Notification
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_has_a_support() {
        let supports = schema_node_supports();
        assert_eq!(supports.len(), 13);
        assert!(supports.iter().any(|s| s.keyword() == "leaf-list"));
    }

    #[test]
    fn test_augment_targets() {
        let targets: Vec<&str> = schema_node_supports()
            .iter()
            .filter(|s| s.is_augment_target())
            .map(|s| s.kind.keyword())
            .collect();
        assert!(targets.contains(&"container"));
        assert!(!targets.contains(&"leaf"));
    }

    #[test]
    fn test_leaf_requires_type() {
        let leaf = NodeKind::Leaf.validator();
        assert_eq!(leaf.cardinality("type").map(|c| c.min), Some(1));
    }
}
