//! Reactor configuration
//!
//! Configuration is plain data shared by every build of a reactor. It can
//! be constructed in code or loaded from JSON or YAML.

use crate::error::{ReactorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// What to do with the first statement error of a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Abort on the first statement error
    FailFast,
    /// Collect the statement errors of a phase and abort at its end
    #[default]
    FailSlow,
}

/// Treatment of keywords not present in the support bundle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownStatementPolicy {
    /// Keep them as opaque unrecognized statements
    #[default]
    Opaque,
    /// Fail the statement
    Reject,
}

/// Handling of import cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImportResolutionMode {
    /// Any import cycle fails the build
    #[default]
    Strict,
    /// Cycle members are linked in name order
    Lenient,
}

/// Build-wide reactor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ReactorConfig {
    pub failure_mode: FailureMode,
    pub unknown_statements: UnknownStatementPolicy,
    pub import_resolution: ImportResolutionMode,
    /// Supported features as `module:feature`; `None` supports all
    pub supported_features: Option<BTreeSet<String>>,
    /// Share equal effective statements through the interner
    pub intern_effective: bool,
    pub build_timeout_ms: Option<u64>,
}

impl Default for ReactorConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::default(),
            unknown_statements: UnknownStatementPolicy::default(),
            import_resolution: ImportResolutionMode::default(),
            supported_features: None,
            intern_effective: true,
            build_timeout_ms: None,
        }
    }
}

impl ReactorConfig {
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            failure_mode: FailureMode::FailFast,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_unknown_statements(mut self, policy: UnknownStatementPolicy) -> Self {
        self.unknown_statements = policy;
        self
    }

    #[must_use]
    pub fn with_import_resolution(mut self, mode: ImportResolutionMode) -> Self {
        self.import_resolution = mode;
        self
    }

    /// Restrict the supported features to the given `module:feature` names
    #[must_use]
    pub fn with_supported_features<I, S>(mut self, features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.supported_features = Some(features.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.build_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn build_timeout(&self) -> Option<Duration> {
        self.build_timeout_ms.map(Duration::from_millis)
    }

    /// Whether `module:feature` is supported
    #[must_use]
    pub fn is_feature_supported(&self, module: &str, feature: &str) -> bool {
        self.supported_features
            .as_ref()
            .is_none_or(|set| set.contains(&format!("{module}:{feature}")))
    }

    /// Load from a JSON or YAML file, chosen by extension
    ///
    /// # Errors
    ///
    /// Returns [`ReactorError::Config`] if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!("Loading reactor configuration from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| ReactorError::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::load_from_yaml(&content),
            Some("json") => Self::load_from_json(&content),
            _ => Err(ReactorError::Config(format!(
                "unsupported configuration format: {}",
                path.display()
            ))),
        }
    }

    /// # Errors
    ///
    /// Returns [`ReactorError::Config`] on malformed input.
    pub fn load_from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| ReactorError::Config(format!("JSON parse error: {e}")))
    }

    /// # Errors
    ///
    /// Returns [`ReactorError::Config`] on malformed input.
    pub fn load_from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| ReactorError::Config(format!("YAML parse error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ReactorConfig::default();
        assert_eq!(config.failure_mode, FailureMode::FailSlow);
        assert_eq!(config.unknown_statements, UnknownStatementPolicy::Opaque);
        assert_eq!(config.import_resolution, ImportResolutionMode::Strict);
        assert!(config.intern_effective);
        assert!(config.is_feature_supported("any", "thing"));
    }

    #[test]
    fn test_load_from_json() {
        let config = ReactorConfig::load_from_json(
            r#"{"failure-mode": "fail-fast", "supported-features": ["a:x"]}"#,
        )
        .unwrap();
        assert_eq!(config.failure_mode, FailureMode::FailFast);
        assert!(config.is_feature_supported("a", "x"));
        assert!(!config.is_feature_supported("a", "y"));
        assert!(config.intern_effective);
    }

    #[test]
    fn test_load_from_yaml() {
        let yaml = "unknown-statements: reject\nimport-resolution: lenient\nbuild-timeout-ms: 250\n";
        let config = ReactorConfig::load_from_yaml(yaml).unwrap();
        assert_eq!(config.unknown_statements, UnknownStatementPolicy::Reject);
        assert_eq!(config.import_resolution, ImportResolutionMode::Lenient);
        assert_eq!(config.build_timeout(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"intern-effective": false}}"#).unwrap();
        let config = ReactorConfig::load_from_file(file.path()).unwrap();
        assert!(!config.intern_effective);

        let other = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        assert!(matches!(
            ReactorConfig::load_from_file(other.path()),
            Err(ReactorError::Config(_))
        ));
    }

    #[test]
    fn test_rejects_bad_value() {
        assert!(ReactorConfig::load_from_json(r#"{"failure-mode": "sometimes"}"#).is_err());
    }
}
