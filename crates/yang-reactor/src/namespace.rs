//! Namespace storage
//!
//! A namespace is a named lookup table for one kind of identifier
//! (groupings, typedefs, modules by name, ...). Each namespace is described
//! by a `'static` [`Namespace`] whose [`NamespaceBehaviour`] decides where
//! values are stored and how lookups search for them.
//!
//! Writes are single-assignment: putting an equal value again is a no-op,
//! putting a different value under an existing key is a
//! [`ReactorError::Conflict`]. Every insertion wakes the inference actions
//! waiting on that namespace or on a namespace derived from it.

use crate::arena::CtxId;
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use indexmap::IndexMap;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;
use yang_ir::SourceIdentifier;
use yang_model::{QName, QNameModule, SchemaPath};

/// Computes a derived value from the build state
pub type DeriveFn = fn(&BuildContext, CtxId, &NsKey) -> Option<NsValue>;

/// Where a namespace keeps its values and how lookups find them
#[derive(Clone, Copy)]
pub enum NamespaceBehaviour {
    /// One table for the whole build
    Global,
    /// One table per source, held by the source root
    SourceLocal,
    /// One table per statement, no inheritance
    StatementLocal,
    /// Lookups walk the lexical ancestors, then the global table.
    /// Values put at a source root are also visible globally.
    TreeScoped,
    /// Computed on demand; writes to `from` wake waiters
    Derived {
        from: &'static Namespace,
        derive: DeriveFn,
    },
}

impl fmt::Debug for NamespaceBehaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("Global"),
            Self::SourceLocal => f.write_str("SourceLocal"),
            Self::StatementLocal => f.write_str("StatementLocal"),
            Self::TreeScoped => f.write_str("TreeScoped"),
            Self::Derived { from, .. } => write!(f, "Derived({})", from.name),
        }
    }
}

/// Static descriptor of a namespace
#[derive(Debug)]
pub struct Namespace {
    pub name: &'static str,
    pub behaviour: NamespaceBehaviour,
}

impl Namespace {
    #[must_use]
    pub const fn global(name: &'static str) -> Self {
        Self {
            name,
            behaviour: NamespaceBehaviour::Global,
        }
    }

    #[must_use]
    pub const fn source_local(name: &'static str) -> Self {
        Self {
            name,
            behaviour: NamespaceBehaviour::SourceLocal,
        }
    }

    #[must_use]
    pub const fn statement_local(name: &'static str) -> Self {
        Self {
            name,
            behaviour: NamespaceBehaviour::StatementLocal,
        }
    }

    #[must_use]
    pub const fn tree_scoped(name: &'static str) -> Self {
        Self {
            name,
            behaviour: NamespaceBehaviour::TreeScoped,
        }
    }

    #[must_use]
    pub const fn derived(name: &'static str, from: &'static Namespace, derive: DeriveFn) -> Self {
        Self {
            name,
            behaviour: NamespaceBehaviour::Derived { from, derive },
        }
    }

    /// Name of the stored namespace whose writes can change lookups here
    #[must_use]
    pub fn watch_name(&self) -> &'static str {
        match self.behaviour {
            NamespaceBehaviour::Derived { from, .. } => from.watch_name(),
            _ => self.name,
        }
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Namespace {}

/// Namespace key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NsKey {
    QName(QName),
    Name(String),
    Source(SourceIdentifier),
    Path(SchemaPath),
}

impl NsKey {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }
}

impl fmt::Display for NsKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QName(q) => write!(f, "{q}"),
            Self::Name(n) => f.write_str(n),
            Self::Source(s) => write!(f, "{s}"),
            Self::Path(p) => write!(f, "{p}"),
        }
    }
}

/// Namespace value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NsValue {
    Ctx(CtxId),
    Module(QNameModule),
    Text(String),
}

impl NsValue {
    #[must_use]
    pub fn as_ctx(&self) -> Option<CtxId> {
        match self {
            Self::Ctx(ctx) => Some(*ctx),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Result of a single-assignment write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    Inserted,
    Unchanged,
    /// The key already holds this different value
    Conflict(NsValue),
}

/// Key/value tables of one owner, one per namespace, in insertion order
#[derive(Debug, Default, Clone)]
pub struct NamespaceStorage {
    tables: HashMap<&'static str, IndexMap<NsKey, NsValue>>,
}

impl NamespaceStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, namespace: &'static str, key: NsKey, value: NsValue) -> PutOutcome {
        let table = self.tables.entry(namespace).or_default();
        match table.get(&key) {
            Some(existing) if *existing == value => PutOutcome::Unchanged,
            Some(existing) => PutOutcome::Conflict(existing.clone()),
            None => {
                table.insert(key, value);
                PutOutcome::Inserted
            }
        }
    }

    #[must_use]
    pub fn get(&self, namespace: &str, key: &NsKey) -> Option<&NsValue> {
        self.tables.get(namespace).and_then(|t| t.get(key))
    }

    /// Entries of one namespace in insertion order
    pub fn entries<'a>(&'a self, namespace: &str) -> impl Iterator<Item = (&'a NsKey, &'a NsValue)> + 'a {
        self.tables.get(namespace).into_iter().flat_map(IndexMap::iter)
    }

    #[must_use]
    pub fn len(&self, namespace: &str) -> usize {
        self.tables.get(namespace).map_or(0, IndexMap::len)
    }
}

impl BuildContext {
    /// Store `value` under `key`, anchored at `anchor`.
    ///
    /// # Errors
    ///
    /// [`ReactorError::Conflict`] when the key already holds a different
    /// value; [`ReactorError::InvariantViolation`] when writing a derived
    /// namespace.
    pub fn put(
        &mut self,
        anchor: CtxId,
        namespace: &'static Namespace,
        key: NsKey,
        value: NsValue,
    ) -> Result<()> {
        let outcome = match namespace.behaviour {
            NamespaceBehaviour::Global => self.global.put(namespace.name, key.clone(), value.clone()),
            NamespaceBehaviour::SourceLocal => {
                let root = self.source_root(anchor);
                self.contexts[root]
                    .storage
                    .put(namespace.name, key.clone(), value.clone())
            }
            NamespaceBehaviour::StatementLocal => {
                self.contexts[anchor]
                    .storage
                    .put(namespace.name, key.clone(), value.clone())
            }
            NamespaceBehaviour::TreeScoped => {
                let local = self.contexts[anchor]
                    .storage
                    .put(namespace.name, key.clone(), value.clone());
                if local == PutOutcome::Inserted && self.contexts[anchor].parent.is_none() {
                    match self.global.put(namespace.name, key.clone(), value.clone()) {
                        PutOutcome::Conflict(existing) => PutOutcome::Conflict(existing),
                        _ => local,
                    }
                } else {
                    local
                }
            }
            NamespaceBehaviour::Derived { .. } => {
                return Err(ReactorError::invariant(format!(
                    "write to derived namespace {}",
                    namespace.name
                )));
            }
        };

        match outcome {
            PutOutcome::Inserted => {
                trace!(namespace = namespace.name, %key, "namespace put");
                self.wake_namespace(namespace.name);
                Ok(())
            }
            PutOutcome::Unchanged => Ok(()),
            PutOutcome::Conflict(existing) => Err(ReactorError::Conflict {
                namespace: namespace.name.to_string(),
                key: key.to_string(),
                existing: self.describe_value(&existing),
                attempted: self.describe_value(&value),
                source_info: match value {
                    NsValue::Ctx(ctx) => self.source_info(ctx),
                    _ => self.source_info(anchor),
                },
            }),
        }
    }

    /// Look up `key` as seen from `anchor`. Never blocks.
    #[must_use]
    pub fn get(&self, anchor: CtxId, namespace: &'static Namespace, key: &NsKey) -> Option<NsValue> {
        match namespace.behaviour {
            NamespaceBehaviour::Global => self.global.get(namespace.name, key).cloned(),
            NamespaceBehaviour::SourceLocal => self.contexts[self.source_root(anchor)]
                .storage
                .get(namespace.name, key)
                .cloned(),
            NamespaceBehaviour::StatementLocal => {
                self.contexts[anchor].storage.get(namespace.name, key).cloned()
            }
            NamespaceBehaviour::TreeScoped => {
                let mut current = Some(anchor);
                while let Some(ctx) = current {
                    if let Some(value) = self.contexts[ctx].storage.get(namespace.name, key) {
                        return Some(value.clone());
                    }
                    current = self.lexical_parent(ctx);
                }
                self.global.get(namespace.name, key).cloned()
            }
            NamespaceBehaviour::Derived { derive, .. } => derive(self, anchor, key),
        }
    }

    /// Stored entries visible at `anchor`, in insertion order.
    ///
    /// Tree-scoped namespaces report only the anchor's own entries and
    /// derived namespaces report nothing.
    #[must_use]
    pub fn entries(&self, anchor: CtxId, namespace: &'static Namespace) -> Vec<(NsKey, NsValue)> {
        let storage = match namespace.behaviour {
            NamespaceBehaviour::Global => &self.global,
            NamespaceBehaviour::SourceLocal => &self.contexts[self.source_root(anchor)].storage,
            NamespaceBehaviour::StatementLocal | NamespaceBehaviour::TreeScoped => {
                &self.contexts[anchor].storage
            }
            NamespaceBehaviour::Derived { .. } => return Vec::new(),
        };
        storage
            .entries(namespace.name)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn describe_value(&self, value: &NsValue) -> String {
        match value {
            NsValue::Ctx(ctx) => format!("{} at {}", self.describe(*ctx), self.source_info(*ctx)),
            NsValue::Module(module) => module.to_string(),
            NsValue::Text(text) => format!("'{text}'"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_assignment() {
        let mut storage = NamespaceStorage::new();
        assert_eq!(
            storage.put("ns", NsKey::name("a"), NsValue::Text("1".into())),
            PutOutcome::Inserted
        );
        assert_eq!(
            storage.put("ns", NsKey::name("a"), NsValue::Text("1".into())),
            PutOutcome::Unchanged
        );
        assert_eq!(
            storage.put("ns", NsKey::name("a"), NsValue::Text("2".into())),
            PutOutcome::Conflict(NsValue::Text("1".into()))
        );
        assert_eq!(
            storage.get("ns", &NsKey::name("a")),
            Some(&NsValue::Text("1".into()))
        );
    }

    #[test]
    fn test_entries_keep_insertion_order() {
        let mut storage = NamespaceStorage::new();
        for name in ["zeta", "alpha", "mid"] {
            storage.put("ns", NsKey::name(name), NsValue::Text(name.into()));
        }
        let keys: Vec<String> = storage.entries("ns").map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        assert_eq!(storage.len("ns"), 3);
        assert_eq!(storage.len("other"), 0);
    }

    fn nothing(_: &BuildContext, _: CtxId, _: &NsKey) -> Option<NsValue> {
        None
    }

    static STORED: Namespace = Namespace::statement_local("stored");
    static VIEW: Namespace = Namespace::derived("view", &STORED, nothing);

    #[test]
    fn test_derived_watch_name() {
        assert_eq!(VIEW.watch_name(), "stored");
        assert_eq!(STORED.watch_name(), "stored");
        assert_eq!(format!("{:?}", VIEW.behaviour), "Derived(stored)");
    }
}
