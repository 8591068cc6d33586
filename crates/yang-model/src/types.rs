//! Resolved type definitions
//!
//! A [`TypeDefinition`] is the result of following a `type` statement
//! through any chain of `typedef`s down to a built-in type, merging
//! restrictions, defaults and units along the way.

use crate::qname::{QName, QNameModule};
use std::sync::{Arc, LazyLock};

/// Namespace of the YANG built-in types
pub const YANG_NAMESPACE: &str = "urn:ietf:params:xml:ns:yang:1";

static YANG_MODULE: LazyLock<QNameModule> = LazyLock::new(|| QNameModule::new(YANG_NAMESPACE, None));

/// The built-in types of YANG 1.1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinType {
    Binary,
    Bits,
    Boolean,
    Decimal64,
    Empty,
    Enumeration,
    IdentityRef,
    InstanceIdentifier,
    Int8,
    Int16,
    Int32,
    Int64,
    LeafRef,
    String,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Union,
}

const BUILTINS: &[(&str, BuiltinType)] = &[
    ("binary", BuiltinType::Binary),
    ("bits", BuiltinType::Bits),
    ("boolean", BuiltinType::Boolean),
    ("decimal64", BuiltinType::Decimal64),
    ("empty", BuiltinType::Empty),
    ("enumeration", BuiltinType::Enumeration),
    ("identityref", BuiltinType::IdentityRef),
    ("instance-identifier", BuiltinType::InstanceIdentifier),
    ("int8", BuiltinType::Int8),
    ("int16", BuiltinType::Int16),
    ("int32", BuiltinType::Int32),
    ("int64", BuiltinType::Int64),
    ("leafref", BuiltinType::LeafRef),
    ("string", BuiltinType::String),
    ("uint8", BuiltinType::Uint8),
    ("uint16", BuiltinType::Uint16),
    ("uint32", BuiltinType::Uint32),
    ("uint64", BuiltinType::Uint64),
    ("union", BuiltinType::Union),
];

impl BuiltinType {
    /// Look up a built-in type by its YANG name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        BUILTINS.iter().find(|(n, _)| *n == name).map(|(_, t)| *t)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        BUILTINS
            .iter()
            .find(|(_, t)| *t == self)
            .map_or("unknown", |(n, _)| n)
    }

    /// Qualified name in the YANG namespace
    #[must_use]
    pub fn qname(self) -> QName {
        YANG_MODULE.qname(self.name())
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Uint8
                | Self::Uint16
                | Self::Uint32
                | Self::Uint64
        )
    }
}

/// A restriction substatement (`range`, `length`, `pattern`, ...) as written
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Restriction {
    pub keyword: String,
    pub argument: String,
}

/// One `enum` of an enumeration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumMember {
    pub name: String,
    pub value: i64,
}

/// One `bit` of a bits type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitMember {
    pub name: String,
    pub position: u32,
}

/// Fully resolved type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDefinition {
    /// Name of the typedef, or of the built-in type
    pub name: QName,
    pub base: BuiltinType,
    /// Definition this one derives from, `None` for built-ins
    pub derived_from: Option<Arc<TypeDefinition>>,
    pub units: Option<String>,
    pub default_value: Option<String>,
    /// Restrictions added at this derivation step
    pub restrictions: Vec<Restriction>,
    pub enums: Vec<EnumMember>,
    pub bits: Vec<BitMember>,
    pub union_members: Vec<Arc<TypeDefinition>>,
    pub leafref_path: Option<String>,
    pub require_instance: Option<bool>,
    pub identity_bases: Vec<QName>,
}

impl TypeDefinition {
    /// Definition of a built-in type with no restrictions
    #[must_use]
    pub fn builtin(base: BuiltinType) -> Self {
        Self {
            name: base.qname(),
            base,
            derived_from: None,
            units: None,
            default_value: None,
            restrictions: Vec::new(),
            enums: Vec::new(),
            bits: Vec::new(),
            union_members: Vec::new(),
            leafref_path: None,
            require_instance: None,
            identity_bases: Vec::new(),
        }
    }

    /// New derivation step on top of `parent`, inheriting its members
    #[must_use]
    pub fn derive(name: QName, parent: &Arc<TypeDefinition>) -> Self {
        Self {
            name,
            base: parent.base,
            derived_from: Some(Arc::clone(parent)),
            units: None,
            default_value: None,
            restrictions: Vec::new(),
            enums: parent.enums.clone(),
            bits: parent.bits.clone(),
            union_members: parent.union_members.clone(),
            leafref_path: parent.leafref_path.clone(),
            require_instance: parent.require_instance,
            identity_bases: parent.identity_bases.clone(),
        }
    }

    #[must_use]
    pub fn is_builtin(&self) -> bool {
        self.derived_from.is_none()
    }

    /// Names from this definition down to the built-in type
    #[must_use]
    pub fn derivation_chain(&self) -> Vec<&QName> {
        let mut chain = vec![&self.name];
        let mut current = self.derived_from.as_deref();
        while let Some(def) = current {
            chain.push(&def.name);
            current = def.derived_from.as_deref();
        }
        chain
    }

    /// Default from this definition or the nearest ancestor that has one
    #[must_use]
    pub fn effective_default(&self) -> Option<&str> {
        self.default_value.as_deref().or_else(|| {
            self.derived_from
                .as_deref()
                .and_then(TypeDefinition::effective_default)
        })
    }

    /// Units from this definition or the nearest ancestor that has them
    #[must_use]
    pub fn effective_units(&self) -> Option<&str> {
        self.units.as_deref().or_else(|| {
            self.derived_from
                .as_deref()
                .and_then(TypeDefinition::effective_units)
        })
    }

    /// All restrictions along the chain, outermost last
    #[must_use]
    pub fn all_restrictions(&self) -> Vec<&Restriction> {
        let mut steps = vec![self];
        let mut current = self.derived_from.as_deref();
        while let Some(def) = current {
            steps.push(def);
            current = def.derived_from.as_deref();
        }
        steps
            .into_iter()
            .rev()
            .flat_map(|def| def.restrictions.iter())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(BuiltinType::from_name("uint8"), Some(BuiltinType::Uint8));
        assert_eq!(BuiltinType::from_name("my-type"), None);
        assert_eq!(BuiltinType::LeafRef.name(), "leafref");
        assert!(BuiltinType::Int64.is_integer());
        assert!(!BuiltinType::String.is_integer());
    }

    #[test]
    fn test_derivation_chain_and_inheritance() {
        let string = Arc::new(TypeDefinition::builtin(BuiltinType::String));
        let module = QNameModule::new("urn:t", None);

        let mut name = TypeDefinition::derive(module.qname("name"), &string);
        name.default_value = Some("anon".to_string());
        name.units = Some("chars".to_string());
        name.restrictions.push(Restriction {
            keyword: "length".to_string(),
            argument: "1..64".to_string(),
        });
        let name = Arc::new(name);

        let mut short = TypeDefinition::derive(module.qname("short-name"), &name);
        short.restrictions.push(Restriction {
            keyword: "length".to_string(),
            argument: "1..8".to_string(),
        });

        let chain: Vec<_> = short.derivation_chain().iter().map(|q| q.local_name()).collect();
        assert_eq!(chain, vec!["short-name", "name", "string"]);
        assert_eq!(short.base, BuiltinType::String);
        assert_eq!(short.effective_default(), Some("anon"));
        assert_eq!(short.effective_units(), Some("chars"));
        let lengths: Vec<_> = short.all_restrictions().iter().map(|r| r.argument.as_str()).collect();
        assert_eq!(lengths, vec!["1..64", "1..8"]);
        assert!(!short.is_builtin());
    }
}
