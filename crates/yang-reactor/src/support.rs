//! Statement supports and bundles
//!
//! A [`StatementSupport`] carries everything the reactor knows about one
//! keyword: how its argument is parsed, which substatements it allows, what
//! it does in each phase, and how its declared and effective statements are
//! built. The reactor itself hard-codes no keyword; a
//! [`StatementSupportBundle`] decides which keywords a build understands.

use crate::arena::CtxId;
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use crate::phase::ModelProcessingPhase;
use crate::validator::SubstatementValidator;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use yang_model::{Argument, DeclaredStatement, EffectiveStatement};

/// Whether a statement follows its parent into a `uses` or `augment` copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPolicy {
    Copy,
    /// Consumed or purely lexical at the original place
    Ignore,
}

/// Behaviour of one statement keyword
pub trait StatementSupport: Send + Sync {
    /// Keyword this support is registered under; `module:name` for
    /// extension statements
    fn keyword(&self) -> &str;

    /// Phase in which the argument is parsed
    fn argument_phase(&self) -> ModelProcessingPhase {
        ModelProcessingPhase::StatementDefinition
    }

    /// Parse the raw argument of `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::InvalidStatement`] for malformed arguments.
    fn parse_argument(&self, build: &BuildContext, ctx: CtxId) -> Result<Argument> {
        Ok(build
            .raw_argument(ctx)
            .map_or(Argument::None, |a| Argument::Text(a.to_string())))
    }

    /// Allowed substatements, checked in statement definition
    fn validator(&self) -> Option<&SubstatementValidator> {
        None
    }

    /// Context created; substatement contexts exist, nothing is parsed
    ///
    /// # Errors
    ///
    /// Any statement error fails this context.
    fn on_statement_added(&self, _build: &mut BuildContext, _ctx: CtxId) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any statement error fails this context.
    fn on_pre_linkage_declared(&self, _build: &mut BuildContext, _ctx: CtxId) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any statement error fails this context.
    fn on_linkage_declared(&self, _build: &mut BuildContext, _ctx: CtxId) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any statement error fails this context.
    fn on_statement_definition_declared(&self, _build: &mut BuildContext, _ctx: CtxId) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any statement error fails this context.
    fn on_full_definition_declared(&self, _build: &mut BuildContext, _ctx: CtxId) -> Result<()> {
        Ok(())
    }

    /// # Errors
    ///
    /// Any statement error fails this context.
    fn on_effective_model(&self, _build: &mut BuildContext, _ctx: CtxId) -> Result<()> {
        Ok(())
    }

    fn copy_policy(&self) -> CopyPolicy {
        CopyPolicy::Copy
    }

    /// Whether the statement appears in the effective tree at all
    fn in_effective_model(&self) -> bool {
        true
    }

    /// Whether equal effective statements may be shared
    fn internable(&self) -> bool {
        false
    }

    /// Whether augments may add children here. Such contexts finish the
    /// effective-model phase only after every pending augment is applied.
    fn is_augment_target(&self) -> bool {
        false
    }

    fn create_declared(
        &self,
        build: &BuildContext,
        ctx: CtxId,
        substatements: Vec<Arc<DeclaredStatement>>,
    ) -> DeclaredStatement {
        build.default_declared(ctx, substatements)
    }

    /// Build the effective statement from already built children.
    ///
    /// # Errors
    ///
    /// Returns a statement error when the effective form is invalid.
    fn create_effective(
        &self,
        build: &BuildContext,
        ctx: CtxId,
        declared: Option<Arc<DeclaredStatement>>,
        substatements: Vec<Arc<EffectiveStatement>>,
    ) -> Result<EffectiveStatement> {
        Ok(build.default_effective(ctx, declared, substatements))
    }
}

/// Support for statements the bundle does not know
///
/// They are kept as opaque statements with a text argument.
#[derive(Debug, Default)]
pub struct UnrecognizedSupport;

impl StatementSupport for UnrecognizedSupport {
    fn keyword(&self) -> &str {
        "unrecognized"
    }
}

/// Immutable, named set of statement supports
///
/// Bundles layer: a bundle built with [`StatementSupportBundle::derive`]
/// answers from its own supports first and falls back to its parent.
pub struct StatementSupportBundle {
    name: String,
    parent: Option<Arc<StatementSupportBundle>>,
    supports: IndexMap<String, Arc<dyn StatementSupport>>,
    extension_fallback: Option<Arc<dyn StatementSupport>>,
}

impl fmt::Debug for StatementSupportBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatementSupportBundle")
            .field("name", &self.name)
            .field("keywords", &self.supports.keys().collect::<Vec<_>>())
            .field("parent", &self.parent.as_ref().map(|p| p.name.as_str()))
            .finish_non_exhaustive()
    }
}

impl StatementSupportBundle {
    pub fn builder(name: impl Into<String>) -> BundleBuilder {
        BundleBuilder {
            name: name.into(),
            parent: None,
            supports: IndexMap::new(),
            duplicates: Vec::new(),
            extension_fallback: None,
        }
    }

    /// Start a bundle layered on `parent`
    pub fn derive(parent: Arc<StatementSupportBundle>, name: impl Into<String>) -> BundleBuilder {
        let mut builder = Self::builder(name);
        builder.parent = Some(parent);
        builder
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Support registered for `keyword`, here or in a parent bundle
    #[must_use]
    pub fn lookup(&self, keyword: &str) -> Option<&Arc<dyn StatementSupport>> {
        self.supports
            .get(keyword)
            .or_else(|| self.parent.as_deref().and_then(|p| p.lookup(keyword)))
    }

    /// Support for instances of model-defined extensions without a
    /// dedicated support
    #[must_use]
    pub fn extension_fallback(&self) -> Option<&Arc<dyn StatementSupport>> {
        self.extension_fallback
            .as_ref()
            .or_else(|| self.parent.as_deref().and_then(Self::extension_fallback))
    }

    /// Keywords in registration order, own keywords first
    #[must_use]
    pub fn keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = self.supports.keys().map(String::as_str).collect();
        if let Some(parent) = &self.parent {
            for keyword in parent.keywords() {
                if !self.supports.contains_key(keyword) {
                    keywords.push(keyword);
                }
            }
        }
        keywords
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder for [`StatementSupportBundle`]
#[must_use]
pub struct BundleBuilder {
    name: String,
    parent: Option<Arc<StatementSupportBundle>>,
    supports: IndexMap<String, Arc<dyn StatementSupport>>,
    duplicates: Vec<String>,
    extension_fallback: Option<Arc<dyn StatementSupport>>,
}

impl BundleBuilder {
    pub fn add<S: StatementSupport + 'static>(self, support: S) -> Self {
        self.add_shared(Arc::new(support))
    }

    pub fn add_shared(mut self, support: Arc<dyn StatementSupport>) -> Self {
        let keyword = support.keyword().to_string();
        if self.supports.insert(keyword.clone(), support).is_some() {
            self.duplicates.push(keyword);
        }
        self
    }

    pub fn extension_fallback<S: StatementSupport + 'static>(mut self, support: S) -> Self {
        self.extension_fallback = Some(Arc::new(support));
        self
    }

    /// # Errors
    ///
    /// Returns [`ReactorError::Config`] if a keyword was registered twice.
    /// Overriding a parent bundle's keyword is allowed.
    pub fn build(self) -> Result<StatementSupportBundle> {
        if let Some(keyword) = self.duplicates.first() {
            return Err(ReactorError::Config(format!(
                "duplicate statement support for '{keyword}' in bundle '{}'",
                self.name
            )));
        }
        Ok(StatementSupportBundle {
            name: self.name,
            parent: self.parent,
            supports: self.supports,
            extension_fallback: self.extension_fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, ModelProcessingPhase);

    impl StatementSupport for Named {
        fn keyword(&self) -> &str {
            self.0
        }

        fn argument_phase(&self) -> ModelProcessingPhase {
            self.1
        }
    }

    #[test]
    fn test_lookup_through_parent() {
        let base = StatementSupportBundle::builder("base")
            .add(Named("leaf", ModelProcessingPhase::StatementDefinition))
            .add(Named("import", ModelProcessingPhase::SourcePreLinkage))
            .build()
            .unwrap();
        let vendor = StatementSupportBundle::derive(Arc::new(base), "vendor")
            .add(Named("acme:tag", ModelProcessingPhase::StatementDefinition))
            .add(Named("leaf", ModelProcessingPhase::FullDeclaration))
            .build()
            .unwrap();

        assert_eq!(vendor.name(), "vendor");
        assert!(vendor.lookup("acme:tag").is_some());
        assert_eq!(
            vendor.lookup("import").unwrap().argument_phase(),
            ModelProcessingPhase::SourcePreLinkage
        );
        assert_eq!(
            vendor.lookup("leaf").unwrap().argument_phase(),
            ModelProcessingPhase::FullDeclaration
        );
        assert!(vendor.lookup("container").is_none());
        assert_eq!(vendor.keywords(), vec!["acme:tag", "leaf", "import"]);
        assert_eq!(vendor.len(), 3);
    }

    #[test]
    fn test_duplicate_keyword_rejected() {
        let result = StatementSupportBundle::builder("dup")
            .add(Named("leaf", ModelProcessingPhase::StatementDefinition))
            .add(Named("leaf", ModelProcessingPhase::StatementDefinition))
            .build();
        assert!(matches!(result, Err(ReactorError::Config(msg)) if msg.contains("'leaf'")));
    }

    #[test]
    fn test_extension_fallback_inherited() {
        let base = StatementSupportBundle::builder("base")
            .extension_fallback(UnrecognizedSupport)
            .build()
            .unwrap();
        let derived = StatementSupportBundle::derive(Arc::new(base), "d").build().unwrap();
        assert!(derived.extension_fallback().is_some());
        assert!(derived.is_empty());
    }
}
