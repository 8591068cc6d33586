//! Processing phases

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered stages of the global resolution lockstep.
///
/// Every context passes through every phase in order. No context starts
/// phase `P + 1` before all contexts of the build have completed `P`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum ModelProcessingPhase {
    /// Context created, substatement contexts exist but nothing is parsed
    Init,
    /// Source names, revisions and import requirements are known
    SourcePreLinkage,
    /// Module namespaces and import prefixes are bound
    SourceLinkage,
    /// Arguments parsed, definitions registered in their namespaces
    StatementDefinition,
    /// Groupings expanded, types resolved
    FullDeclaration,
    /// Augments applied, effective properties computed
    EffectiveModel,
}

impl ModelProcessingPhase {
    pub const ALL: [Self; 6] = [
        Self::Init,
        Self::SourcePreLinkage,
        Self::SourceLinkage,
        Self::StatementDefinition,
        Self::FullDeclaration,
        Self::EffectiveModel,
    ];

    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self as usize + 1).copied()
    }

    #[must_use]
    pub fn previous(self) -> Option<Self> {
        (self as usize).checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Phases strictly after `self`, up to and including `last`
    pub fn range_to(self, last: Self) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |p| *p > self && *p <= last)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::SourcePreLinkage => "source-pre-linkage",
            Self::SourceLinkage => "source-linkage",
            Self::StatementDefinition => "statement-definition",
            Self::FullDeclaration => "full-declaration",
            Self::EffectiveModel => "effective-model",
        }
    }
}

impl fmt::Display for ModelProcessingPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order() {
        assert!(ModelProcessingPhase::Init < ModelProcessingPhase::SourcePreLinkage);
        assert!(ModelProcessingPhase::FullDeclaration < ModelProcessingPhase::EffectiveModel);
        assert_eq!(
            ModelProcessingPhase::SourceLinkage.next(),
            Some(ModelProcessingPhase::StatementDefinition)
        );
        assert_eq!(ModelProcessingPhase::EffectiveModel.next(), None);
        assert_eq!(ModelProcessingPhase::Init.previous(), None);
        assert_eq!(
            ModelProcessingPhase::SourcePreLinkage.previous(),
            Some(ModelProcessingPhase::Init)
        );
    }

    #[test]
    fn test_range_to() {
        let phases: Vec<_> = ModelProcessingPhase::SourcePreLinkage
            .range_to(ModelProcessingPhase::FullDeclaration)
            .collect();
        assert_eq!(
            phases,
            vec![
                ModelProcessingPhase::SourceLinkage,
                ModelProcessingPhase::StatementDefinition,
                ModelProcessingPhase::FullDeclaration,
            ]
        );
        assert_eq!(ModelProcessingPhase::EffectiveModel.to_string(), "effective-model");
    }
}
