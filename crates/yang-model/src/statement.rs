//! Declared and effective statements

use crate::argument::{Argument, Status};
use crate::qname::{QName, SchemaPath};
use crate::types::TypeDefinition;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use yang_ir::{Keyword, SourceInfo};

/// Keywords whose statements are schema tree nodes
pub const SCHEMA_NODE_KEYWORDS: &[&str] = &[
    "container",
    "leaf",
    "leaf-list",
    "list",
    "choice",
    "case",
    "anydata",
    "anyxml",
    "rpc",
    "action",
    "input",
    "output",
    "notification",
];

/// How a statement came to be in the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StatementOrigin {
    /// Written in the source at this place
    #[default]
    Declared,
    /// Copied from a grouping by `uses`
    Uses,
    /// Copied into its parent by `augment`
    Augment,
    /// Placed by a `refine` override
    Refine,
    /// Materialized by the reactor (e.g. implicit `input`)
    Implicit,
}

/// A statement as written, with its parsed argument
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclaredStatement {
    pub keyword: Keyword,
    pub raw_argument: Option<String>,
    pub argument: Argument,
    pub substatements: Vec<Arc<DeclaredStatement>>,
    pub source: SourceInfo,
}

impl DeclaredStatement {
    /// First substatement with the given unprefixed keyword
    #[must_use]
    pub fn find_first(&self, keyword: &str) -> Option<&Arc<DeclaredStatement>> {
        self.substatements.iter().find(|s| s.keyword.is(keyword))
    }
}

/// Properties computed during inference
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EffectiveProperties {
    pub origin: StatementOrigin,
    /// `config` value, `None` where config does not apply
    pub config: Option<bool>,
    pub status: Status,
    pub mandatory: bool,
    /// Default value, falling back to the type's default for leaves
    pub default_value: Option<String>,
    pub type_definition: Option<Arc<TypeDefinition>>,
    /// List keys
    pub keys: Vec<QName>,
    /// Resolved `base` statements of an identity or identityref
    pub identity_bases: Vec<QName>,
    /// Absolute path of a leafref's target node
    pub leafref_target: Option<SchemaPath>,
    /// Absolute schema path of a schema node
    pub schema_path: Option<SchemaPath>,
}

/// Fully resolved statement
///
/// Equality and hashing ignore the declared counterpart, so that equal
/// effective substructures from different places can be shared.
#[derive(Debug, Clone)]
pub struct EffectiveStatement {
    pub keyword: Keyword,
    pub argument: Argument,
    pub declared: Option<Arc<DeclaredStatement>>,
    pub substatements: Vec<Arc<EffectiveStatement>>,
    pub properties: EffectiveProperties,
}

impl PartialEq for EffectiveStatement {
    fn eq(&self, other: &Self) -> bool {
        self.keyword == other.keyword
            && self.argument == other.argument
            && self.properties == other.properties
            && self.substatements == other.substatements
    }
}

impl Eq for EffectiveStatement {}

impl Hash for EffectiveStatement {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.keyword.hash(state);
        self.argument.hash(state);
        self.properties.hash(state);
        self.substatements.hash(state);
    }
}

impl EffectiveStatement {
    /// Check for an unprefixed keyword
    #[must_use]
    pub fn is(&self, keyword: &str) -> bool {
        self.keyword.is(keyword)
    }

    /// Qualified name argument, for identifiers
    #[must_use]
    pub fn qname(&self) -> Option<&QName> {
        self.argument.as_qname()
    }

    /// Whether this statement is a schema tree node
    #[must_use]
    pub fn is_schema_node(&self) -> bool {
        self.keyword.prefix.is_none() && SCHEMA_NODE_KEYWORDS.contains(&self.keyword.name.as_str())
    }

    /// First substatement with the given unprefixed keyword
    #[must_use]
    pub fn find_first(&self, keyword: &str) -> Option<&Arc<EffectiveStatement>> {
        self.substatements.iter().find(|s| s.is(keyword))
    }

    /// All substatements with the given unprefixed keyword
    pub fn find_all<'a>(&'a self, keyword: &str) -> impl Iterator<Item = &'a Arc<EffectiveStatement>> {
        self.substatements.iter().filter(move |s| s.is(keyword))
    }

    /// Argument text of the first substatement with the given keyword
    #[must_use]
    pub fn first_text(&self, keyword: &str) -> Option<&str> {
        self.find_first(keyword).and_then(|s| s.argument.as_text())
    }

    /// Schema tree children in order
    pub fn schema_children(&self) -> impl Iterator<Item = &Arc<EffectiveStatement>> {
        self.substatements.iter().filter(|s| s.is_schema_node())
    }

    /// Schema tree child with the given name
    #[must_use]
    pub fn find_schema_child(&self, name: &QName) -> Option<&Arc<EffectiveStatement>> {
        self.schema_children().find(|s| s.qname() == Some(name))
    }

    /// Data tree child with the given name, looking through `choice` and
    /// `case`
    #[must_use]
    pub fn find_data_child(&self, name: &QName) -> Option<&Arc<EffectiveStatement>> {
        let mut pending: Vec<&EffectiveStatement> = vec![self];
        while let Some(parent) = pending.pop() {
            for child in parent.schema_children() {
                if child.is("choice") || child.is("case") {
                    pending.push(child);
                } else if child.qname() == Some(name) {
                    return Some(child);
                }
            }
        }
        None
    }

    /// Number of statements in this subtree
    #[must_use]
    pub fn statement_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(stmt) = stack.pop() {
            count += 1;
            stack.extend(stmt.substatements.iter().map(|s| &**s));
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qname::QNameModule;
    use yang_ir::Position;

    fn node(keyword: &str, name: &str, children: Vec<EffectiveStatement>) -> EffectiveStatement {
        EffectiveStatement {
            keyword: Keyword::new(keyword),
            argument: Argument::QName(QNameModule::new("urn:t", None).qname(name)),
            declared: None,
            substatements: children.into_iter().map(Arc::new).collect(),
            properties: EffectiveProperties::default(),
        }
    }

    #[test]
    fn test_equality_ignores_declared() {
        let mut a = node("leaf", "x", vec![]);
        let b = node("leaf", "x", vec![]);
        a.declared = Some(Arc::new(DeclaredStatement {
            keyword: Keyword::new("leaf"),
            raw_argument: Some("x".to_string()),
            argument: Argument::Text("x".to_string()),
            substatements: Vec::new(),
            source: SourceInfo::new("t.yang", Position::at(1, 1)),
        }));
        assert_eq!(a, b);

        let c = node("leaf", "y", vec![]);
        assert_ne!(a, c);
    }

    #[test]
    fn test_find_data_child_through_choice() {
        let case = node("case", "k", vec![node("leaf", "inner", vec![])]);
        let choice = node("choice", "ch", vec![case]);
        let container = node("container", "c", vec![choice, node("leaf", "x", vec![])]);

        let module = QNameModule::new("urn:t", None);
        assert!(container.find_data_child(&module.qname("inner")).is_some());
        assert!(container.find_schema_child(&module.qname("inner")).is_none());
        assert!(container.find_schema_child(&module.qname("ch")).is_some());
        assert_eq!(container.statement_count(), 5);
    }
}
