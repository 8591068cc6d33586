//! Statement grammar
//!
//! ```text
//! statement = keyword [argument] (";" / "{" *statement "}")
//! ```
//!
//! The parser keeps open statements on an explicit stack, so nesting depth is
//! not limited by the call stack.

use crate::lexer::{Lexer, Token, TokenKind};
use crate::{Error, Result};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, trace};
use yang_ir::{Keyword, Position, RawStatement, SourceDocument};

static KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][A-Za-z0-9_.\-]*:)?[A-Za-z_][A-Za-z0-9_.\-]*$")
        .unwrap_or_else(|e| unreachable!("keyword pattern is valid: {e}"))
});

/// Parser for one source text
pub struct StatementParser<'a> {
    lexer: Lexer<'a>,
    source_name: String,
}

/// Open statement waiting for its closing brace
struct Open {
    statement: RawStatement,
}

impl<'a> StatementParser<'a> {
    /// Create a parser over `text`
    pub fn new(text: &'a str, source_name: impl Into<String>) -> Self {
        let source_name = source_name.into();
        Self {
            lexer: Lexer::new(text, source_name.clone()),
            source_name,
        }
    }

    fn error_at(&self, token: &Token, message: impl Into<String>) -> Error {
        Error::parse(&self.source_name, token.line, token.column, message)
    }

    fn error_at_end(&self, message: impl Into<String>) -> Error {
        let (line, column) = self.lexer.line_column();
        Error::parse(&self.source_name, line, column, message)
    }

    fn next(&mut self) -> Result<Option<Token>> {
        self.lexer.next_token().transpose()
    }

    fn expect(&mut self, what: &str) -> Result<Token> {
        self.next()?
            .ok_or_else(|| self.error_at_end(format!("unexpected end of input, expected {what}")))
    }

    /// Parse exactly one top-level statement.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] on any grammar violation, including trailing
    /// content after the top-level statement.
    pub fn parse(mut self) -> Result<RawStatement> {
        let mut stack: Vec<Open> = Vec::new();

        loop {
            let token = self.expect("statement")?;
            let keyword = match &token.kind {
                TokenKind::Word(word) => {
                    if !KEYWORD.is_match(word) {
                        return Err(self.error_at(&token, format!("invalid keyword '{word}'")));
                    }
                    Keyword::parse(word)
                }
                TokenKind::RightBrace if !stack.is_empty() => {
                    let Some(open) = stack.pop() else {
                        return Err(self.error_at(&token, "unbalanced '}'"));
                    };
                    let mut finished = open.statement;
                    finished.position.length = self.lexer.offset() - finished.position.offset;
                    if let Some(root) = Self::attach(&mut stack, finished) {
                        return self.finish(root);
                    }
                    continue;
                }
                TokenKind::Quoted(_) => {
                    return Err(self.error_at(&token, "keyword must not be quoted"));
                }
                other => {
                    return Err(self.error_at(&token, format!("expected keyword, found {other:?}")));
                }
            };

            let mut statement = RawStatement::new(keyword).at(Position::new(
                token.line,
                token.column,
                token.offset,
                0,
            ));

            let mut next = self.expect("';' or '{'")?;
            if let TokenKind::Word(text) | TokenKind::Quoted(text) = &next.kind {
                statement.argument = Some(text.clone());
                next = self.expect("';' or '{'")?;
            }

            match &next.kind {
                TokenKind::Semicolon => {
                    statement.position.length = self.lexer.offset() - statement.position.offset;
                    if let Some(root) = Self::attach(&mut stack, statement) {
                        return self.finish(root);
                    }
                }
                TokenKind::LeftBrace => {
                    trace!("Open {} at {}", statement.keyword, statement.position);
                    stack.push(Open { statement });
                }
                other => {
                    return Err(self.error_at(&next, format!("expected ';' or '{{', found {other:?}")));
                }
            }
        }
    }

    /// Attach a finished statement to its parent; returns the root when the
    /// stack is empty.
    fn attach(stack: &mut [Open], finished: RawStatement) -> Option<RawStatement> {
        match stack.last_mut() {
            Some(parent) => {
                parent.statement.substatements.push(finished);
                None
            }
            None => Some(finished),
        }
    }

    fn finish(mut self, root: RawStatement) -> Result<RawStatement> {
        if let Some(token) = self.next()? {
            return Err(self.error_at(&token, "unexpected content after top-level statement"));
        }
        Ok(root)
    }
}

/// Parse source text into a document.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed input.
pub fn parse_str(source_name: &str, text: &str) -> Result<SourceDocument> {
    let root = StatementParser::new(text, source_name).parse()?;
    debug!(
        "Parsed {} ({} statements)",
        source_name,
        root.node_count()
    );
    Ok(SourceDocument::new(source_name, root))
}

/// Read and parse a file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and [`Error::Parse`]
/// for malformed content.
pub fn parse_file(path: &Path) -> Result<SourceDocument> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&path.display().to_string(), &text)
}
