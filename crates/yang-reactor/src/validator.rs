//! Substatement cardinality checks

use crate::arena::CtxId;
use crate::context::BuildContext;
use crate::error::{ReactorError, Result};
use indexmap::IndexMap;

/// Allowed number of occurrences of one substatement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cardinality {
    pub min: u32,
    pub max: Option<u32>,
}

impl Cardinality {
    pub const OPTIONAL: Self = Self {
        min: 0,
        max: Some(1),
    };
    pub const MANDATORY: Self = Self {
        min: 1,
        max: Some(1),
    };
    pub const ANY: Self = Self { min: 0, max: None };
    pub const AT_LEAST_ONE: Self = Self { min: 1, max: None };
}

/// Substatements a keyword accepts, with their cardinalities.
///
/// Only declared, unprefixed, known substatements are counted; extension
/// instances and opaque statements are always allowed.
#[derive(Debug, Clone)]
pub struct SubstatementValidator {
    keyword: String,
    rules: IndexMap<String, Cardinality>,
}

impl SubstatementValidator {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            rules: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, keyword: &str, cardinality: Cardinality) -> Self {
        self.rules.insert(keyword.to_string(), cardinality);
        self
    }

    #[must_use]
    pub fn optional(self, keyword: &str) -> Self {
        self.with(keyword, Cardinality::OPTIONAL)
    }

    #[must_use]
    pub fn mandatory(self, keyword: &str) -> Self {
        self.with(keyword, Cardinality::MANDATORY)
    }

    #[must_use]
    pub fn any(self, keyword: &str) -> Self {
        self.with(keyword, Cardinality::ANY)
    }

    /// Allow each of `keywords` any number of times
    #[must_use]
    pub fn any_of(mut self, keywords: &[&str]) -> Self {
        for keyword in keywords {
            self.rules.insert((*keyword).to_string(), Cardinality::ANY);
        }
        self
    }

    /// Allow each of `keywords` at most once
    #[must_use]
    pub fn optional_of(mut self, keywords: &[&str]) -> Self {
        for keyword in keywords {
            self.rules.insert((*keyword).to_string(), Cardinality::OPTIONAL);
        }
        self
    }

    #[must_use]
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    #[must_use]
    pub fn cardinality(&self, keyword: &str) -> Option<Cardinality> {
        self.rules.get(keyword).copied()
    }

    /// Check the declared substatements of `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::InvalidStatement`] for the first disallowed,
    /// missing or repeated substatement.
    pub fn validate(&self, build: &BuildContext, ctx: CtxId) -> Result<()> {
        let mut counts: IndexMap<&str, (u32, CtxId)> = IndexMap::new();
        for &child in build.children(ctx) {
            if !build.is_declared(child) || !build.is_known_keyword(child) {
                continue;
            }
            let keyword = build.keyword(child);
            if keyword.is_prefixed() {
                continue;
            }
            let Some(rule) = self.rules.get(keyword.name.as_str()) else {
                return Err(ReactorError::invalid(
                    build.source_info(child),
                    format!("'{}' is not allowed in {}", keyword.name, build.describe(ctx)),
                ));
            };
            let entry = counts.entry(keyword.name.as_str()).or_insert((0, child));
            entry.0 += 1;
            if rule.max.is_some_and(|max| entry.0 > max) {
                return Err(ReactorError::invalid(
                    build.source_info(child),
                    format!(
                        "'{}' may appear at most {} times in {}",
                        keyword.name,
                        rule.max.unwrap_or_default(),
                        build.describe(ctx)
                    ),
                ));
            }
        }

        for (keyword, rule) in &self.rules {
            let seen = counts.get(keyword.as_str()).map_or(0, |(n, _)| *n);
            if seen < rule.min {
                return Err(ReactorError::invalid(
                    build.source_info(ctx),
                    format!("missing mandatory '{keyword}' in {}", build.describe(ctx)),
                ));
            }
        }
        Ok(())
    }
}
