//! Reactor errors

use crate::phase::ModelProcessingPhase;
use thiserror::Error;
use yang_ir::SourceInfo;

/// Errors raised while building a model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReactorError {
    #[error("Missing source {required}, required by {requester}")]
    MissingSource { requester: String, required: String },

    #[error("Import cycle: {}", cycle.join(" -> "))]
    ImportCycle { cycle: Vec<String> },

    #[error("Invalid statement at {source_info}: {message}")]
    InvalidStatement {
        source_info: SourceInfo,
        message: String,
    },

    #[error("Unresolved reference from {referrer} to {target} at {source_info} (phase {phase})")]
    UnresolvedReference {
        referrer: String,
        target: String,
        source_info: SourceInfo,
        phase: ModelProcessingPhase,
    },

    #[error(
        "Conflicting definition of {key} in namespace {namespace} at {source_info}: {attempted} clashes with {existing}"
    )]
    Conflict {
        namespace: String,
        key: String,
        existing: String,
        attempted: String,
        source_info: SourceInfo,
    },

    #[error("Dependency cycle between {}", members.join(", "))]
    DependencyCycle { members: Vec<String> },

    #[error("Reactor invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Build cancelled before phase {phase}")]
    Cancelled { phase: ModelProcessingPhase },

    #[error("Build timed out after {elapsed_ms} ms before phase {phase}")]
    TimedOut {
        phase: ModelProcessingPhase,
        elapsed_ms: u64,
    },

    #[error("Phase {phase} failed with {} errors", errors.len())]
    PhaseFailed {
        phase: ModelProcessingPhase,
        errors: Vec<ReactorError>,
    },

    #[error("Failed to fetch source {identifier}: {message}")]
    SourceFetch { identifier: String, message: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReactorError {
    /// Build an invalid-statement error
    pub fn invalid(source_info: SourceInfo, message: impl Into<String>) -> Self {
        Self::InvalidStatement {
            source_info,
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Errors attached to a single statement.
    ///
    /// These are collected in fail-slow mode; everything else aborts the
    /// build at once.
    #[must_use]
    pub fn is_statement_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidStatement { .. }
                | Self::UnresolvedReference { .. }
                | Self::Conflict { .. }
                | Self::DependencyCycle { .. }
        )
    }

    /// This error, or the errors it aggregates
    #[must_use]
    pub fn flatten(&self) -> Vec<&ReactorError> {
        match self {
            Self::PhaseFailed { errors, .. } => errors.iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

/// Crate-local result type
pub type Result<T> = std::result::Result<T, ReactorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use yang_ir::Position;

    #[test]
    fn test_statement_errors() {
        let err = ReactorError::invalid(SourceInfo::new("a.yang", Position::at(3, 5)), "bad");
        assert!(err.is_statement_error());
        assert_eq!(err.to_string(), "Invalid statement at a.yang:3:5: bad");
        assert!(!ReactorError::invariant("oops").is_statement_error());
    }

    #[test]
    fn test_flatten_phase_failed() {
        let inner = ReactorError::DependencyCycle {
            members: vec!["grouping g1".to_string(), "grouping g2".to_string()],
        };
        let err = ReactorError::PhaseFailed {
            phase: ModelProcessingPhase::FullDeclaration,
            errors: vec![inner.clone(), ReactorError::invariant("x")],
        };
        assert_eq!(err.flatten().len(), 2);
        assert_eq!(err.flatten()[0], &inner);
        assert_eq!(
            inner.to_string(),
            "Dependency cycle between grouping g1, grouping g2"
        );
    }
}
