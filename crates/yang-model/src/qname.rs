//! Qualified names

use std::fmt;
use std::sync::Arc;
use yang_ir::Revision;

/// Namespace and revision of the module an identifier belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QNameModule {
    pub namespace: Arc<str>,
    pub revision: Option<Revision>,
}

impl QNameModule {
    #[must_use]
    pub fn new(namespace: &str, revision: Option<Revision>) -> Self {
        Self {
            namespace: Arc::from(namespace),
            revision,
        }
    }

    /// Qualify a local name with this module
    #[must_use]
    pub fn qname(&self, local_name: &str) -> QName {
        QName {
            module: self.clone(),
            local_name: Arc::from(local_name),
        }
    }
}

impl fmt::Display for QNameModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "{}?revision={rev}", self.namespace),
            None => f.write_str(&self.namespace),
        }
    }
}

/// Identifier qualified by its defining module
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    pub module: QNameModule,
    pub local_name: Arc<str>,
}

impl QName {
    #[must_use]
    pub fn new(module: QNameModule, local_name: &str) -> Self {
        module.qname(local_name)
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}){}", self.module, self.local_name)
    }
}

/// Sequence of schema node names, absolute or relative to a context node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaPath {
    pub absolute: bool,
    pub steps: Vec<QName>,
}

impl SchemaPath {
    #[must_use]
    pub fn absolute(steps: Vec<QName>) -> Self {
        Self {
            absolute: true,
            steps,
        }
    }

    #[must_use]
    pub fn relative(steps: Vec<QName>) -> Self {
        Self {
            absolute: false,
            steps,
        }
    }

    /// Path extended by one step
    #[must_use]
    pub fn child(&self, step: QName) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self {
            absolute: self.absolute,
            steps,
        }
    }

    #[must_use]
    pub fn last(&self) -> Option<&QName> {
        self.steps.last()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if self.absolute || i > 0 {
                f.write_str("/")?;
            }
            f.write_str(step.local_name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qname_display() {
        let module = QNameModule::new("urn:a", Some(Revision::parse("2020-01-01").unwrap()));
        assert_eq!(module.qname("x").to_string(), "(urn:a?revision=2020-01-01)x");
        assert_eq!(QNameModule::new("urn:b", None).qname("y").to_string(), "(urn:b)y");
    }

    #[test]
    fn test_schema_path_display() {
        let module = QNameModule::new("urn:a", None);
        let path = SchemaPath::absolute(vec![module.qname("c"), module.qname("x")]);
        assert_eq!(path.to_string(), "/c/x");
        assert_eq!(path.last().map(QName::local_name), Some("x"));

        let rel = SchemaPath::relative(vec![module.qname("y")]).child(module.qname("z"));
        assert_eq!(rel.to_string(), "y/z");
    }

    #[test]
    fn test_qname_ordering_by_module_then_name() {
        let a = QNameModule::new("urn:a", None);
        let b = QNameModule::new("urn:b", None);
        let mut names = vec![b.qname("a"), a.qname("z"), a.qname("b")];
        names.sort();
        assert_eq!(names[0], a.qname("b"));
        assert_eq!(names[2], b.qname("a"));
    }
}
