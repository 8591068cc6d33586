//! Build statistics and reports

use crate::error::{ReactorError, Result};
use crate::phase::ModelProcessingPhase;
use serde::Serialize;
use std::collections::BTreeMap;
use yang_model::EffectiveModel;

/// Counters collected during one build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Sources compiled, pulled library sources included
    pub sources: usize,
    /// Library and provider sources pulled in to satisfy imports
    pub pulled_sources: usize,
    pub contexts: usize,
    /// Contexts created by `uses`, `augment` and `refine`
    pub copies: usize,
    pub actions_registered: usize,
    pub actions_applied: usize,
    /// Scan passes over all phases
    pub scan_passes: usize,
    /// Phases completed by the whole build, in order
    pub completed_phases: Vec<ModelProcessingPhase>,
    /// Effective factory calls per keyword
    pub factory_invocations: BTreeMap<String, usize>,
    pub effective_statements: usize,
}

impl BuildStats {
    /// Number of effective statements built for `keyword`
    #[must_use]
    pub fn factory_invocations_for(&self, keyword: &str) -> usize {
        self.factory_invocations.get(keyword).copied().unwrap_or(0)
    }
}

/// Outcome of a build with diagnostics
#[derive(Debug)]
pub struct BuildReport {
    pub model: Option<EffectiveModel>,
    /// The error that ended the build, if any
    pub error: Option<ReactorError>,
    /// Non-fatal findings, e.g. statements kept as opaque
    pub warnings: Vec<String>,
    pub stats: BuildStats,
}

impl BuildReport {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.model.is_some()
    }

    /// Individual errors, with fail-slow aggregates expanded
    #[must_use]
    pub fn errors(&self) -> Vec<&ReactorError> {
        self.error.as_ref().map(ReactorError::flatten).unwrap_or_default()
    }

    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// # Errors
    ///
    /// Returns the error that ended the build.
    pub fn into_result(self) -> Result<EffectiveModel> {
        match (self.model, self.error) {
            (_, Some(error)) => Err(error),
            (Some(model), None) => Ok(model),
            (None, None) => Err(ReactorError::invariant("build finished without a model")),
        }
    }
}
