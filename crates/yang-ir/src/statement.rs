//! Raw statement tree produced by the parser

use crate::metadata::Position;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Statement keyword, optionally qualified by a module prefix
///
/// Core keywords (`container`, `leaf`, ...) carry no prefix. Extension
/// instances are written `prefix:name` and keep the prefix until the reactor
/// binds it to a module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Keyword {
    /// Module prefix for extension keywords
    pub prefix: Option<String>,

    /// Local keyword name
    pub name: String,
}

impl Keyword {
    /// Unprefixed keyword
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            name: name.into(),
        }
    }

    /// Keyword qualified by a module prefix
    #[must_use]
    pub fn prefixed(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
            name: name.into(),
        }
    }

    /// Split `prefix:name` text into a keyword
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.split_once(':') {
            Some((prefix, name)) => Self::prefixed(prefix, name),
            None => Self::new(text),
        }
    }

    /// Whether this keyword is an extension instance
    #[must_use]
    pub fn is_prefixed(&self) -> bool {
        self.prefix.is_some()
    }

    /// Check for an unprefixed keyword with the given name
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.prefix.is_none() && self.name == name
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.prefix {
            Some(prefix) => write!(f, "{prefix}:{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

impl From<&str> for Keyword {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

/// One statement as written in a source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawStatement {
    /// Statement keyword
    pub keyword: Keyword,

    /// Argument string after quoting and concatenation were applied
    pub argument: Option<String>,

    /// Substatements in source order
    pub substatements: Vec<RawStatement>,

    /// Position of the keyword
    pub position: Position,
}

impl RawStatement {
    /// Create a statement with no argument
    #[must_use]
    pub fn new(keyword: impl Into<Keyword>) -> Self {
        Self {
            keyword: keyword.into(),
            argument: None,
            substatements: Vec::new(),
            position: Position::default(),
        }
    }

    /// Create a statement with an argument
    #[must_use]
    pub fn with_argument(keyword: impl Into<Keyword>, argument: impl Into<String>) -> Self {
        Self {
            argument: Some(argument.into()),
            ..Self::new(keyword)
        }
    }

    /// Set the position
    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    /// Append a substatement, builder style
    #[must_use]
    pub fn with_substatement(mut self, child: RawStatement) -> Self {
        self.substatements.push(child);
        self
    }

    /// Append a substatement
    pub fn add_substatement(&mut self, child: RawStatement) -> &mut Self {
        self.substatements.push(child);
        self
    }

    /// Argument text, if any
    #[must_use]
    pub fn argument(&self) -> Option<&str> {
        self.argument.as_deref()
    }

    /// First unprefixed substatement with the given keyword
    #[must_use]
    pub fn find_substatement(&self, keyword: &str) -> Option<&RawStatement> {
        self.substatements.iter().find(|s| s.keyword.is(keyword))
    }

    /// All unprefixed substatements with the given keyword
    #[must_use]
    pub fn find_substatements(&self, keyword: &str) -> Vec<&RawStatement> {
        self.substatements
            .iter()
            .filter(|s| s.keyword.is(keyword))
            .collect()
    }

    /// Number of statements in this subtree, including self
    #[must_use]
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(stmt) = stack.pop() {
            count += 1;
            stack.extend(stmt.substatements.iter());
        }
        count
    }

    /// Depth of this subtree; a statement without children has depth 1
    #[must_use]
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1usize)];
        while let Some((stmt, depth)) = stack.pop() {
            max = max.max(depth);
            stack.extend(stmt.substatements.iter().map(|c| (c, depth + 1)));
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_parse() {
        let kw = Keyword::parse("ext:annotation");
        assert_eq!(kw.prefix.as_deref(), Some("ext"));
        assert_eq!(kw.name, "annotation");
        assert!(kw.is_prefixed());
        assert_eq!(kw.to_string(), "ext:annotation");

        let kw = Keyword::parse("container");
        assert!(kw.is("container"));
        assert!(!kw.is_prefixed());
    }

    #[test]
    fn test_prefixed_keyword_is_not_core() {
        let kw = Keyword::prefixed("x", "leaf");
        assert!(!kw.is("leaf"));
    }

    #[test]
    fn test_statement_builder() {
        let stmt = RawStatement::with_argument("container", "c")
            .with_substatement(RawStatement::with_argument("leaf", "x"))
            .with_substatement(RawStatement::with_argument("leaf", "y"))
            .with_substatement(RawStatement::with_argument("description", "d"));

        assert_eq!(stmt.argument(), Some("c"));
        assert_eq!(stmt.find_substatements("leaf").len(), 2);
        assert_eq!(
            stmt.find_substatement("description").and_then(RawStatement::argument),
            Some("d")
        );
        assert!(stmt.find_substatement("list").is_none());
    }

    #[test]
    fn test_node_count_and_depth() {
        let mut root = RawStatement::with_argument("module", "m");
        let mut container = RawStatement::with_argument("container", "c");
        container.add_substatement(RawStatement::with_argument("leaf", "x"));
        root.add_substatement(container);
        root.add_substatement(RawStatement::with_argument("namespace", "urn:m"));

        assert_eq!(root.node_count(), 4);
        assert_eq!(root.depth(), 3);
    }

    #[test]
    fn test_statement_serde() {
        let stmt = RawStatement::with_argument("leaf", "x").at(Position::at(2, 3));
        let json = serde_json::to_string(&stmt).unwrap();
        let back: RawStatement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stmt);
    }
}
