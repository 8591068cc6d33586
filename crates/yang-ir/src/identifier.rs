//! Module names and revision dates

use crate::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const REVISION_FORMAT: &str = "%Y-%m-%d";

/// A `YYYY-MM-DD` revision date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Revision(NaiveDate);

impl Revision {
    /// Parse a revision date.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRevision`] when the text is not a valid
    /// `YYYY-MM-DD` date.
    pub fn parse(text: &str) -> Result<Self> {
        NaiveDate::parse_from_str(text.trim(), REVISION_FORMAT)
            .map(Self)
            .map_err(|e| Error::InvalidRevision {
                value: text.to_string(),
                reason: e.to_string(),
            })
    }

    /// Underlying calendar date
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for Revision {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Revision {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Revision> for String {
    fn from(revision: Revision) -> Self {
        revision.to_string()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(REVISION_FORMAT))
    }
}

/// Name and optional revision of a module or submodule
///
/// Ordering is by name, then revision with "no revision" sorting first. The
/// linkage resolver relies on this for its tie-break.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceIdentifier {
    /// Module or submodule name
    pub name: String,

    /// Revision date, when the source declares one
    pub revision: Option<Revision>,
}

impl SourceIdentifier {
    /// Identifier without a revision
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: None,
        }
    }

    /// Identifier with a specific revision
    #[must_use]
    pub fn with_revision(name: impl Into<String>, revision: Revision) -> Self {
        Self {
            name: name.into(),
            revision: Some(revision),
        }
    }

    /// Parse `name` or `name@YYYY-MM-DD`, the form used in file names.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRevision`] for a malformed revision suffix.
    pub fn parse(text: &str) -> Result<Self> {
        match text.split_once('@') {
            Some((name, revision)) => Ok(Self::with_revision(name, Revision::parse(revision)?)),
            None => Ok(Self::new(text)),
        }
    }

    /// Whether `self` satisfies a request for `requested`.
    ///
    /// A request without a revision accepts any revision of the same name.
    #[must_use]
    pub fn satisfies(&self, requested: &SourceIdentifier) -> bool {
        self.name == requested.name
            && (requested.revision.is_none() || self.revision == requested.revision)
    }
}

impl fmt::Display for SourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(revision) => write!(f, "{}@{revision}", self.name),
            None => f.write_str(&self.name),
        }
    }
}
