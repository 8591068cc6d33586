//! The effective model and its query API

use crate::qname::{QName, QNameModule};
use crate::statement::{DeclaredStatement, EffectiveStatement};
use crate::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, trace};
use yang_ir::{Revision, SourceIdentifier};

/// One compiled module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleEntry {
    pub name: String,
    pub revision: Option<Revision>,
    pub module: QNameModule,
    pub prefix: String,
    /// Effective `module` statement; includes nodes contributed by submodules
    pub effective: Arc<EffectiveStatement>,
    pub declared: Arc<DeclaredStatement>,
    /// Submodules included by this module
    pub submodules: Vec<SourceIdentifier>,
}

impl ModuleEntry {
    #[must_use]
    pub fn identifier(&self) -> SourceIdentifier {
        SourceIdentifier {
            name: self.name.clone(),
            revision: self.revision,
        }
    }

    /// Top-level statement with the given keyword and local name
    #[must_use]
    pub fn find_top_level(&self, keyword: &str, local_name: &str) -> Option<&Arc<EffectiveStatement>> {
        self.effective
            .find_all(keyword)
            .find(|s| s.qname().is_some_and(|q| q.local_name() == local_name))
    }
}

/// Read-only result of a reactor build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveModel {
    modules: Vec<ModuleEntry>,
    derived_identities: BTreeMap<QName, Vec<QName>>,
}

impl EffectiveModel {
    /// Assemble a model and index identity derivations
    #[must_use]
    pub fn new(modules: Vec<ModuleEntry>) -> Self {
        let mut derived_identities: BTreeMap<QName, Vec<QName>> = BTreeMap::new();
        for entry in &modules {
            for identity in entry.effective.find_all("identity") {
                let Some(name) = identity.qname() else {
                    continue;
                };
                for base in &identity.properties.identity_bases {
                    derived_identities
                        .entry(base.clone())
                        .or_default()
                        .push(name.clone());
                }
            }
        }
        for derived in derived_identities.values_mut() {
            derived.sort();
        }
        debug!(
            modules = modules.len(),
            identity_bases = derived_identities.len(),
            "effective model indexed"
        );

        Self {
            modules,
            derived_identities,
        }
    }

    /// Modules in linkage order
    #[must_use]
    pub fn modules(&self) -> &[ModuleEntry] {
        &self.modules
    }

    /// Find a module by name; without a revision the newest one wins
    #[must_use]
    pub fn find_module(&self, name: &str, revision: Option<&Revision>) -> Option<&ModuleEntry> {
        let mut candidates = self.modules.iter().filter(|m| m.name == name);
        match revision {
            Some(rev) => candidates.find(|m| m.revision.as_ref() == Some(rev)),
            None => candidates.max_by(|a, b| a.revision.cmp(&b.revision)),
        }
    }

    #[must_use]
    pub fn find_module_by_namespace(&self, module: &QNameModule) -> Option<&ModuleEntry> {
        self.modules.iter().find(|m| &m.module == module)
    }

    /// Walk schema node names from the module root.
    ///
    /// `choice` and `case` may be named explicitly, including the implicit
    /// case of a choice shorthand, or skipped.
    #[must_use]
    pub fn find_schema_node(&self, path: &[QName]) -> Option<&Arc<EffectiveStatement>> {
        let first = path.first()?;
        let module = self.find_module_by_namespace(&first.module)?;
        let mut current = &module.effective;
        for step in path {
            current = current
                .find_schema_child(step)
                .or_else(|| current.find_data_child(step))?;
        }
        Some(current)
    }

    /// Resolve a textual path such as `/mod:container/leaf`.
    ///
    /// Prefixes are module names. A step without a prefix belongs to the
    /// module of the previous step.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for malformed paths,
    /// [`Error::UnknownModule`] for unknown module names and
    /// [`Error::NodeNotFound`] when no node matches.
    pub fn find_path(&self, path: &str) -> Result<&Arc<EffectiveStatement>> {
        let Some(rest) = path.strip_prefix('/') else {
            return Err(Error::invalid_path(path, "path must be absolute"));
        };

        let mut steps = Vec::new();
        let mut module: Option<QNameModule> = None;
        for segment in rest.split('/') {
            let (prefix, local) = match segment.split_once(':') {
                Some((prefix, local)) => (Some(prefix), local),
                None => (None, segment),
            };
            if local.is_empty() {
                return Err(Error::invalid_path(path, "empty step"));
            }
            if let Some(prefix) = prefix {
                let entry = self
                    .find_module(prefix, None)
                    .ok_or_else(|| Error::UnknownModule {
                        name: prefix.to_string(),
                    })?;
                module = Some(entry.module.clone());
            }
            let Some(current) = &module else {
                return Err(Error::invalid_path(path, "first step needs a module prefix"));
            };
            steps.push(current.qname(local));
        }

        self.find_schema_node(&steps).ok_or_else(|| {
            trace!(path, "no schema node");
            Error::NodeNotFound {
                path: path.to_string(),
            }
        })
    }

    /// Identities that name `base` directly as a base
    #[must_use]
    pub fn derived_identities(&self, base: &QName) -> &[QName] {
        self.derived_identities.get(base).map_or(&[], Vec::as_slice)
    }

    /// Total number of effective statements across all modules
    #[must_use]
    pub fn statement_count(&self) -> usize {
        self.modules
            .iter()
            .map(|m| m.effective.statement_count())
            .sum()
    }
}

/// Declared view of every compiled source, modules and submodules alike
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredModel {
    sources: Vec<(SourceIdentifier, Arc<DeclaredStatement>)>,
}

impl DeclaredModel {
    #[must_use]
    pub fn new(sources: Vec<(SourceIdentifier, Arc<DeclaredStatement>)>) -> Self {
        Self { sources }
    }

    /// Sources in linkage order
    #[must_use]
    pub fn sources(&self) -> &[(SourceIdentifier, Arc<DeclaredStatement>)] {
        &self.sources
    }

    /// Root statement of the named source
    #[must_use]
    pub fn find_source(&self, name: &str) -> Option<&Arc<DeclaredStatement>> {
        self.sources
            .iter()
            .find(|(id, _)| id.name == name)
            .map(|(_, root)| root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::Argument;
    use crate::statement::EffectiveProperties;
    use yang_ir::{Keyword, Position, SourceInfo};

    fn stmt(keyword: &str, argument: Argument, children: Vec<EffectiveStatement>) -> EffectiveStatement {
        EffectiveStatement {
            keyword: Keyword::new(keyword),
            argument,
            declared: None,
            substatements: children.into_iter().map(Arc::new).collect(),
            properties: EffectiveProperties::default(),
        }
    }

    fn entry(name: &str, revision: Option<&str>, children: Vec<EffectiveStatement>) -> ModuleEntry {
        let revision = revision.map(|r| Revision::parse(r).unwrap());
        let module = QNameModule::new(&format!("urn:{name}"), revision);
        ModuleEntry {
            name: name.to_string(),
            revision,
            module: module.clone(),
            prefix: name.to_string(),
            effective: Arc::new(stmt("module", Argument::Text(name.to_string()), children)),
            declared: Arc::new(DeclaredStatement {
                keyword: Keyword::new("module"),
                raw_argument: Some(name.to_string()),
                argument: Argument::Text(name.to_string()),
                substatements: Vec::new(),
                source: SourceInfo::new(format!("{name}.yang"), Position::at(1, 1)),
            }),
            submodules: Vec::new(),
        }
    }

    fn qn(module: &str, local: &str) -> QName {
        QNameModule::new(&format!("urn:{module}"), None).qname(local)
    }

    fn sample() -> EffectiveModel {
        let leaf = stmt("leaf", Argument::QName(qn("a", "x")), vec![]);
        let container = stmt("container", Argument::QName(qn("a", "c")), vec![leaf]);

        let mut derived = stmt("identity", Argument::QName(qn("a", "eth")), vec![]);
        derived.properties.identity_bases = vec![qn("a", "iface-type")];
        let base = stmt("identity", Argument::QName(qn("a", "iface-type")), vec![]);

        EffectiveModel::new(vec![
            entry("a", None, vec![container, base, derived]),
            entry("b", Some("2020-01-01"), vec![]),
            entry("b", Some("2022-01-01"), vec![]),
        ])
    }

    #[test]
    fn test_find_module_latest() {
        let model = sample();
        let b = model.find_module("b", None).unwrap();
        assert_eq!(b.revision.unwrap().to_string(), "2022-01-01");

        let old = Revision::parse("2020-01-01").unwrap();
        assert!(model.find_module("b", Some(&old)).is_some());
        assert!(model.find_module("zzz", None).is_none());
    }

    #[test]
    fn test_find_path() -> anyhow::Result<()> {
        let model = sample();
        let leaf = model.find_path("/a:c/x")?;
        assert!(leaf.is("leaf"));

        assert!(matches!(
            model.find_path("/a:c/missing"),
            Err(Error::NodeNotFound { .. })
        ));
        assert!(matches!(
            model.find_path("/nope:c"),
            Err(Error::UnknownModule { .. })
        ));
        assert!(matches!(model.find_path("c/x"), Err(Error::InvalidPath { .. })));
        assert!(matches!(model.find_path("/c"), Err(Error::InvalidPath { .. })));
        Ok(())
    }

    #[test]
    fn test_derived_identities() {
        let model = sample();
        let derived = model.derived_identities(&qn("a", "iface-type"));
        assert_eq!(derived, &[qn("a", "eth")]);
        assert!(model.derived_identities(&qn("a", "eth")).is_empty());
    }
}
