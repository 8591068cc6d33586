//! Binary statement tree encoding
//!
//! Layout: the 4-byte magic `YSTB`, one version byte, then one record per
//! statement in depth-first pre-order:
//!
//! ```text
//! flags:u8  [prefix:str]  name:str  [argument:str]
//! line:varint  column:varint  offset:varint  length:varint
//! child_count:varint
//! ```
//!
//! Strings are a LEB128 length followed by UTF-8 bytes. Both directions use
//! an explicit stack, so the depth of a tree is bounded by memory only.

use crate::metadata::Position;
use crate::statement::{Keyword, RawStatement};
use crate::{Error, Result};
use std::io::{Read, Write};
use tracing::trace;

const MAGIC: &[u8; 4] = b"YSTB";
const VERSION: u8 = 1;

const FLAG_PREFIX: u8 = 0b01;
const FLAG_ARGUMENT: u8 = 0b10;

/// Encode a statement tree into a byte vector
#[must_use]
pub fn encode(root: &RawStatement) -> Vec<u8> {
    let mut out = Vec::with_capacity(64);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);

    let mut stack = vec![root];
    let mut records = 0usize;
    while let Some(statement) = stack.pop() {
        write_record(&mut out, statement);
        records += 1;
        stack.extend(statement.substatements.iter().rev());
    }

    trace!("Encoded {} statements into {} bytes", records, out.len());
    out
}

/// Decode a statement tree previously produced by [`encode`].
///
/// # Errors
///
/// Returns [`Error::Codec`] for a bad header, truncated input, invalid UTF-8
/// or trailing bytes.
pub fn decode(bytes: &[u8]) -> Result<RawStatement> {
    let mut reader = ByteReader::new(bytes);
    reader.expect_header()?;

    let (root, children) = reader.read_record()?;
    let mut stack = vec![Frame {
        statement: root,
        remaining: children,
    }];

    loop {
        let top = stack.len() - 1;
        if stack[top].remaining > 0 {
            stack[top].remaining -= 1;
            let (statement, remaining) = reader.read_record()?;
            stack.push(Frame {
                statement,
                remaining,
            });
            continue;
        }

        let Some(done) = stack.pop() else {
            return Err(Error::codec(reader.offset, "empty decode stack"));
        };
        match stack.last_mut() {
            Some(parent) => parent.statement.substatements.push(done.statement),
            None => {
                reader.expect_end()?;
                return Ok(done.statement);
            }
        }
    }
}

/// Encode `root` into a writer.
///
/// # Errors
///
/// Propagates I/O failures of the writer.
pub fn write_to<W: Write>(writer: &mut W, root: &RawStatement) -> Result<()> {
    writer.write_all(&encode(root))?;
    Ok(())
}

/// Read a full encoded tree from a reader.
///
/// # Errors
///
/// Propagates I/O failures and any [`decode`] error.
pub fn read_from<R: Read>(reader: &mut R) -> Result<RawStatement> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    decode(&bytes)
}

struct Frame {
    statement: RawStatement,
    remaining: usize,
}

fn write_record(out: &mut Vec<u8>, statement: &RawStatement) {
    let mut flags = 0u8;
    if statement.keyword.prefix.is_some() {
        flags |= FLAG_PREFIX;
    }
    if statement.argument.is_some() {
        flags |= FLAG_ARGUMENT;
    }
    out.push(flags);

    if let Some(prefix) = &statement.keyword.prefix {
        write_str(out, prefix);
    }
    write_str(out, &statement.keyword.name);
    if let Some(argument) = &statement.argument {
        write_str(out, argument);
    }

    let pos = &statement.position;
    for value in [pos.line, pos.column, pos.offset, pos.length] {
        write_varint(out, value as u64);
    }
    write_varint(out, statement.substatements.len() as u64);
}

fn write_str(out: &mut Vec<u8>, value: &str) {
    write_varint(out, value.len() as u64);
    out.extend_from_slice(value.as_bytes());
}

fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

/// Cursor over the encoded bytes
struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::codec(self.offset, "unexpected end of input"));
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    fn byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn expect_header(&mut self) -> Result<()> {
        if self.take(MAGIC.len())? != MAGIC {
            return Err(Error::codec(0, "bad magic"));
        }
        let version = self.byte()?;
        if version != VERSION {
            return Err(Error::codec(
                self.offset - 1,
                format!("unsupported version {version}"),
            ));
        }
        Ok(())
    }

    fn expect_end(&self) -> Result<()> {
        if self.remaining() == 0 {
            Ok(())
        } else {
            Err(Error::codec(
                self.offset,
                format!("{} trailing bytes", self.remaining()),
            ))
        }
    }

    fn varint(&mut self) -> Result<u64> {
        let start = self.offset;
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.byte()?;
            if shift >= 64 {
                return Err(Error::codec(start, "varint overflow"));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn usize(&mut self) -> Result<usize> {
        let start = self.offset;
        let value = self.varint()?;
        usize::try_from(value).map_err(|_| Error::codec(start, "value exceeds usize"))
    }

    fn string(&mut self) -> Result<String> {
        let start = self.offset;
        let len = self.usize()?;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| Error::codec(start, e.to_string()))
    }

    fn read_record(&mut self) -> Result<(RawStatement, usize)> {
        let start = self.offset;
        let flags = self.byte()?;
        if flags & !(FLAG_PREFIX | FLAG_ARGUMENT) != 0 {
            return Err(Error::codec(start, format!("unknown flags {flags:#04x}")));
        }

        let prefix = if flags & FLAG_PREFIX == 0 {
            None
        } else {
            Some(self.string()?)
        };
        let name = self.string()?;
        let argument = if flags & FLAG_ARGUMENT == 0 {
            None
        } else {
            Some(self.string()?)
        };

        let position = Position::new(self.usize()?, self.usize()?, self.usize()?, self.usize()?);
        let children = self.usize()?;
        // Every child needs at least two bytes, which bounds the allocation.
        let capacity = children.min(self.remaining() / 2);

        let statement = RawStatement {
            keyword: Keyword { prefix, name },
            argument,
            substatements: Vec::with_capacity(capacity),
            position,
        };
        Ok((statement, children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, line: usize) -> RawStatement {
        RawStatement::with_argument("leaf", name)
            .at(Position::new(line, 5, line * 40, 20))
            .with_substatement(RawStatement::with_argument("type", "string"))
    }

    #[test]
    fn test_round_trip_small_tree() {
        let root = RawStatement::with_argument("module", "m")
            .with_substatement(RawStatement::with_argument("namespace", "urn:m"))
            .with_substatement(RawStatement::with_argument("ext:marker", "on"))
            .with_substatement(RawStatement::new("ext:flag"))
            .with_substatement(leaf("x", 4));

        let bytes = encode(&root);
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(decode(&bytes).unwrap(), root);
    }

    #[test]
    fn test_round_trip_deep_tree() {
        let mut current = leaf("bottom", 1000);
        for level in 0..200 {
            current = RawStatement::with_argument("container", format!("c{level}"))
                .at(Position::new(level + 1, 1, level, 1))
                .with_substatement(current);
        }

        assert!(current.depth() >= 50);
        let decoded = decode(&encode(&current)).unwrap();
        assert_eq!(decoded.depth(), current.depth());
        assert_eq!(decoded, current);
    }

    #[test]
    fn test_round_trip_wide_tree() {
        let mut root = RawStatement::with_argument("module", "wide");
        for i in 0..120 {
            let mut container = RawStatement::with_argument("container", format!("c{i}"));
            for j in 0..45 {
                container.add_substatement(leaf(&format!("l{j}"), i * 100 + j));
            }
            root.add_substatement(container);
        }

        assert!(root.node_count() >= 10_000);
        let decoded = decode(&encode(&root)).unwrap();
        assert_eq!(decoded.node_count(), root.node_count());
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_reader_writer() {
        let root = leaf("x", 1);
        let mut buffer = Vec::new();
        write_to(&mut buffer, &root).unwrap();
        let decoded = read_from(&mut buffer.as_slice()).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn test_bad_magic() {
        let result = decode(b"NOPE\x01");
        assert!(matches!(result, Err(Error::Codec { offset: 0, .. })));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = encode(&leaf("x", 1));
        bytes[4] = 9;
        assert!(matches!(decode(&bytes), Err(Error::Codec { .. })));
    }

    #[test]
    fn test_truncated_input() {
        let bytes = encode(&leaf("x", 1));
        let result = decode(&bytes[..bytes.len() - 3]);
        match result {
            Err(Error::Codec { message, .. }) => assert!(message.contains("unexpected end")),
            other => panic!("Expected codec error, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_bytes() {
        let mut bytes = encode(&leaf("x", 1));
        bytes.push(0);
        match decode(&bytes) {
            Err(Error::Codec { message, .. }) => assert!(message.contains("trailing")),
            other => panic!("Expected codec error, got {other:?}"),
        }
    }
}
