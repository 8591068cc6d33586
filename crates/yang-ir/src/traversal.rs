//! Cursor navigation over raw statement trees

use crate::statement::RawStatement;
use crate::{Error, Result};

/// A cursor for navigating a raw statement tree
pub struct Cursor<'a> {
    /// Current statement
    statement: &'a RawStatement,

    /// Path to current statement (for error reporting)
    path: Vec<String>,
}

fn label(statement: &RawStatement) -> String {
    match statement.argument() {
        Some(arg) => format!("{} {arg}", statement.keyword),
        None => statement.keyword.to_string(),
    }
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the given statement
    #[must_use]
    pub fn new(statement: &'a RawStatement) -> Self {
        Self {
            statement,
            path: vec![label(statement)],
        }
    }

    /// Get the current statement
    #[must_use]
    pub fn statement(&self) -> &'a RawStatement {
        self.statement
    }

    /// Get the current path
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    fn descend(&self, statement: &'a RawStatement) -> Cursor<'a> {
        let mut path = self.path.clone();
        path.push(label(statement));
        Cursor { statement, path }
    }

    /// Navigate to the first substatement with the given keyword.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] when no such substatement exists.
    pub fn child(&self, keyword: &str) -> Result<Cursor<'a>> {
        self.statement
            .substatements
            .iter()
            .find(|s| s.keyword.to_string() == keyword)
            .map(|s| self.descend(s))
            .ok_or_else(|| Error::node_not_found(format!("{}/{keyword}", self.path.join("/"))))
    }

    /// Navigate to the substatement with the given keyword and argument.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] when no such substatement exists.
    pub fn child_named(&self, keyword: &str, argument: &str) -> Result<Cursor<'a>> {
        self.statement
            .substatements
            .iter()
            .find(|s| s.keyword.to_string() == keyword && s.argument() == Some(argument))
            .map(|s| self.descend(s))
            .ok_or_else(|| {
                Error::node_not_found(format!("{}/{keyword} {argument}", self.path.join("/")))
            })
    }

    /// Navigate to a substatement by index.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] when the index is out of range.
    pub fn child_at(&self, index: usize) -> Result<Cursor<'a>> {
        self.statement
            .substatements
            .get(index)
            .map(|s| self.descend(s))
            .ok_or_else(|| Error::node_not_found(format!("{}[{index}]", self.path.join("/"))))
    }

    /// Get all substatements with the given keyword
    #[must_use]
    pub fn children(&self, keyword: &str) -> Vec<Cursor<'a>> {
        self.statement
            .substatements
            .iter()
            .filter(|s| s.keyword.to_string() == keyword)
            .map(|s| self.descend(s))
            .collect()
    }

    /// Navigate using a path such as `container=c/leaf=x` or `leaf[1]`.
    ///
    /// Each segment is `keyword` (first match), `keyword[index]` or
    /// `keyword=argument`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPath`] for malformed segments and
    /// [`Error::NodeNotFound`] when a segment does not match.
    pub fn navigate(&self, path: &str) -> Result<Cursor<'a>> {
        let mut cursor = Cursor {
            statement: self.statement,
            path: self.path.clone(),
        };

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            cursor = if let Some((keyword, argument)) = segment.split_once('=') {
                cursor.child_named(keyword, argument)?
            } else if let Some(open_bracket) = segment.find('[') {
                let keyword = &segment[..open_bracket];
                let close_bracket = segment
                    .find(']')
                    .ok_or_else(|| Error::invalid_path(segment, "unclosed bracket"))?;
                let index: usize = segment[open_bracket + 1..close_bracket]
                    .parse()
                    .map_err(|_| Error::invalid_path(segment, "invalid index"))?;
                let matching = cursor.children(keyword);
                let len = matching.len();
                matching.into_iter().nth(index).ok_or_else(|| {
                    Error::node_not_found(format!(
                        "{}/{segment} (only {len} present)",
                        cursor.path.join("/")
                    ))
                })?
            } else {
                cursor.child(segment)?
            };
        }

        Ok(cursor)
    }
}
