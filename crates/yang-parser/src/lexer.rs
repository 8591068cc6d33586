//! YANG lexical syntax
//!
//! Produces keyword/argument words, quoted strings and the three structural
//! tokens. Comments are skipped, double-quoted strings are unescaped and
//! re-indented, and quoted strings joined with `+` arrive as one token.

use crate::{Error, Result};

/// Kind of token produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Unquoted string (keywords and bare arguments)
    Word(String),
    /// Quoted string after unescaping and concatenation
    Quoted(String),
    /// `;`
    Semicolon,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
}

/// A token and the position where it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

const TAB_WIDTH: usize = 8;

/// Lexer over a source text
pub struct Lexer<'a> {
    text: &'a str,
    data: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    source_name: String,
}

impl<'a> Lexer<'a> {
    /// Create a lexer for `text`; `source_name` is used in errors
    pub fn new(text: &'a str, source_name: impl Into<String>) -> Self {
        Self {
            text,
            data: text.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            source_name: source_name.into(),
        }
    }

    /// Current byte offset
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Current line and column (1-indexed)
    #[must_use]
    pub fn line_column(&self) -> (usize, usize) {
        (self.line, self.column)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> Error {
        Error::parse(&self.source_name, line, column, message)
    }

    fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.data.get(self.pos + ahead).copied()
    }

    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.peek()?;
        self.pos += 1;
        match byte {
            b'\n' => {
                self.line += 1;
                self.column = 1;
            }
            b'\t' => self.column += TAB_WIDTH - (self.column - 1) % TAB_WIDTH,
            // UTF-8 continuation bytes do not start a new column
            b if b & 0xC0 == 0x80 => {}
            _ => self.column += 1,
        }
        Some(byte)
    }

    /// Skip whitespace and comments
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(b' ' | b'\t' | b'\r' | b'\n'), _) => {
                    self.next_byte();
                }
                (Some(b'/'), Some(b'/')) => {
                    while let Some(byte) = self.next_byte() {
                        if byte == b'\n' {
                            break;
                        }
                    }
                }
                (Some(b'/'), Some(b'*')) => {
                    let (line, column) = self.line_column();
                    self.next_byte();
                    self.next_byte();
                    loop {
                        match (self.peek(), self.peek_at(1)) {
                            (Some(b'*'), Some(b'/')) => {
                                self.next_byte();
                                self.next_byte();
                                break;
                            }
                            (Some(_), _) => {
                                self.next_byte();
                            }
                            (None, _) => {
                                return Err(self.error(line, column, "unterminated block comment"));
                            }
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Produce the next token, or `None` at end of input
    pub fn next_token(&mut self) -> Option<Result<Token>> {
        if let Err(e) = self.skip_trivia() {
            return Some(Err(e));
        }

        let (line, column) = self.line_column();
        let offset = self.pos;
        let kind = match self.peek()? {
            b';' => {
                self.next_byte();
                Ok(TokenKind::Semicolon)
            }
            b'{' => {
                self.next_byte();
                Ok(TokenKind::LeftBrace)
            }
            b'}' => {
                self.next_byte();
                Ok(TokenKind::RightBrace)
            }
            b'"' | b'\'' => self.read_concatenation().map(TokenKind::Quoted),
            _ => Ok(TokenKind::Word(self.read_word())),
        };

        Some(kind.map(|kind| Token {
            kind,
            line,
            column,
            offset,
        }))
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while let Some(byte) = self.peek() {
            let ends = match byte {
                b' ' | b'\t' | b'\r' | b'\n' | b';' | b'{' | b'}' | b'"' | b'\'' => true,
                b'/' => matches!(self.peek_at(1), Some(b'/' | b'*')),
                _ => false,
            };
            if ends {
                break;
            }
            self.next_byte();
        }
        self.text[start..self.pos].to_string()
    }

    /// Quoted string plus any `+ "..."` continuations
    fn read_concatenation(&mut self) -> Result<String> {
        let mut value = self.read_quoted()?;
        loop {
            self.skip_trivia()?;
            if self.peek() != Some(b'+') {
                return Ok(value);
            }
            let (line, column) = self.line_column();
            self.next_byte();
            self.skip_trivia()?;
            match self.peek() {
                Some(b'"' | b'\'') => value.push_str(&self.read_quoted()?),
                _ => return Err(self.error(line, column, "expected quoted string after '+'")),
            }
        }
    }

    fn read_quoted(&mut self) -> Result<String> {
        let (line, column) = self.line_column();
        let Some(quote) = self.next_byte() else {
            return Err(self.error(line, column, "expected quoted string"));
        };

        let mut out: Vec<u8> = Vec::new();
        loop {
            let Some(byte) = self.next_byte() else {
                return Err(self.error(line, column, "unterminated quoted string"));
            };
            if byte == quote {
                break;
            }
            if quote == b'\'' {
                out.push(byte);
                continue;
            }
            match byte {
                b'\\' => {
                    let escaped = self.next_byte();
                    match escaped {
                        Some(b'n') => out.push(b'\n'),
                        Some(b't') => out.push(b'\t'),
                        Some(b'"') => out.push(b'"'),
                        Some(b'\\') => out.push(b'\\'),
                        Some(other) => {
                            out.push(b'\\');
                            out.push(other);
                        }
                        None => return Err(self.error(line, column, "unterminated quoted string")),
                    }
                }
                b'\n' => {
                    while matches!(out.last(), Some(b' ' | b'\t')) {
                        out.pop();
                    }
                    out.push(b'\n');
                    // Strip indentation up to the column after the opening quote.
                    while matches!(self.peek(), Some(b' ' | b'\t')) && self.column <= column {
                        self.next_byte();
                    }
                }
                other => out.push(other),
            }
        }

        String::from_utf8(out).map_err(|e| self.error(line, column, e.to_string()))
    }
}
