//! Single-pass recursive-descent reader: produces [`Node`]s in an [`Arena`]
//! while destructively unescaping strings in place.

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::limit::LimitTracker;
use crate::node::{Kind, Locator, Node, NodeId, ParentKind, Payload};

// Strings NUL-terminate themselves at the closing quote during unescape
// (see `scan_string_raw`). Numbers do not get an equivalent terminator
// written by their surrounding container: the byte following a number's
// digits is its delimiter, and JSON permits whitespace there (`[1 , 2]`), so
// overwriting it would defeat `skip_ws`. Numbers are tracked by an explicit
// `(start, end)` range instead and never consulted via NUL-scanning.

const WHITESPACE: [u8; 5] = [b' ', b'\t', b'\x0c', b'\n', b'\r'];

/// Cursor over the mutable input buffer, tracking both the read and write
/// heads used by the in-place string unescape.
pub(crate) struct Scanner<'a> {
    buf: &'a mut [u8],
    pos: usize,
    depth: LimitTracker,
}

/// Parse `buf` into `arena`, returning the root node id.
///
/// `buf` is mutated in place: string payloads are unescaped and NUL
/// terminated as a side effect of scanning.
pub(crate) fn scan(buf: &mut [u8], arena: &mut Arena) -> Result<NodeId> {
    let mut scanner = Scanner {
        buf,
        pos: 0,
        depth: LimitTracker::default(),
    };
    scanner.skip_ws();
    let root = scanner.parse_value(arena)?;
    Ok(root)
}

impl<'a> Scanner<'a> {
    fn skip_ws(&mut self) {
        while let Some(b) = self.peek() {
            if WHITESPACE.contains(&b) {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn err(&self, message: impl Into<String>) -> Error {
        Error::Syntax {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn expect(&mut self, want: u8) -> Result<()> {
        match self.bump() {
            Some(b) if b == want => Ok(()),
            Some(b) => Err(self.err(format!(
                "expected '{}', found '{}'",
                want as char, b as char
            ))),
            None => Err(self.err(format!("expected '{}', found end of input", want as char))),
        }
    }

    fn parse_value(&mut self, arena: &mut Arena) -> Result<NodeId> {
        self.skip_ws();
        match self.peek() {
            Some(b'{') => self.parse_object(arena),
            Some(b'[') => self.parse_array(arena),
            Some(b'"') => self.parse_string(arena),
            Some(b'-') | Some(b'+') | Some(b'0'..=b'9') => self.parse_number(arena),
            Some(b't') => self.parse_literal(arena, "true", Kind::True),
            Some(b'f') => self.parse_literal(arena, "false", Kind::False),
            Some(b'n') => self.parse_literal(arena, "null", Kind::Null),
            Some(other) => Err(self.err(format!("unexpected byte '{}'", other as char))),
            None => Err(self.err("unexpected end of input")),
        }
    }

    fn parse_object(&mut self, arena: &mut Arena) -> Result<NodeId> {
        self.depth.consume();
        if self.depth.limited() {
            self.depth.release();
            return Err(Error::StackOverflow {
                limit: self.depth.limit,
            });
        }
        self.expect(b'{')?;
        let node_id = arena.alloc(Node::new(Kind::Object));
        self.skip_ws();
        let mut tail: Option<NodeId> = None;
        if self.peek() == Some(b'}') {
            self.bump();
        } else {
            loop {
                self.skip_ws();
                if self.peek() != Some(b'"') {
                    self.depth.release();
                    return Err(self.err("expected string key"));
                }
                let (key_start_byte, key_end_byte) = self.scan_string_raw()?;
                self.skip_ws();
                self.expect(b':').map_err(|e| {
                    self.depth.release();
                    e
                })?;
                let child_id = self.parse_value(arena)?;
                {
                    let child = arena.get_mut(child_id);
                    child.parent_kind = ParentKind::Object;
                    child.locator = Locator::Key(key_start_byte, key_end_byte);
                    child.next_sibling = None;
                }
                append_child(arena, &mut tail, child_id);
                self.skip_ws();
                match self.bump() {
                    Some(b',') => continue,
                    Some(b'}') => break,
                    Some(other) => {
                        self.depth.release();
                        return Err(self.err(format!(
                            "expected ',' or '}}', found '{}'",
                            other as char
                        )));
                    }
                    None => {
                        self.depth.release();
                        return Err(self.err("unterminated object"));
                    }
                }
            }
        }
        arena.get_mut(node_id).payload = Payload::Collection(tail);
        self.depth.release();
        Ok(node_id)
    }

    fn parse_array(&mut self, arena: &mut Arena) -> Result<NodeId> {
        self.depth.consume();
        if self.depth.limited() {
            self.depth.release();
            return Err(Error::StackOverflow {
                limit: self.depth.limit,
            });
        }
        self.expect(b'[')?;
        let node_id = arena.alloc(Node::new(Kind::Array));
        self.skip_ws();
        let mut tail: Option<NodeId> = None;
        let mut index: u32 = 0;
        if self.peek() == Some(b']') {
            self.bump();
        } else {
            loop {
                let child_id = self.parse_value(arena)?;
                index += 1;
                {
                    let child = arena.get_mut(child_id);
                    child.parent_kind = ParentKind::Array;
                    child.locator = Locator::Index(index);
                    child.next_sibling = None;
                }
                append_child(arena, &mut tail, child_id);
                self.skip_ws();
                match self.bump() {
                    Some(b',') => continue,
                    Some(b']') => break,
                    Some(other) => {
                        self.depth.release();
                        return Err(
                            self.err(format!("expected ',' or ']', found '{}'", other as char))
                        );
                    }
                    None => {
                        self.depth.release();
                        return Err(self.err("unterminated array"));
                    }
                }
            }
        }
        arena.get_mut(node_id).payload = Payload::Collection(tail);
        self.depth.release();
        Ok(node_id)
    }

    fn parse_string(&mut self, arena: &mut Arena) -> Result<NodeId> {
        let (start, end) = self.scan_string_raw()?;
        let node_id = arena.alloc(Node::new(Kind::String));
        arena.get_mut(node_id).payload = Payload::Raw(start, end);
        Ok(node_id)
    }

    /// Unescape the string literal at the cursor in place and return its
    /// `(start, end)` byte range, without allocating a node. Used both for
    /// string values (via [`Scanner::parse_string`]) and for object keys,
    /// which are addresses rather than tokens and must not inflate the
    /// token count returned by [`crate::arena::Arena::len`].
    fn scan_string_raw(&mut self) -> Result<(u32, u32)> {
        self.expect(b'"')?;
        let start = self.pos;
        let mut read = self.pos;
        let mut write = self.pos;
        loop {
            let b = match self.buf.get(read).copied() {
                Some(b) => b,
                None => return Err(self.err("unterminated string")),
            };
            match b {
                b'"' => {
                    self.buf[write] = 0;
                    read += 1;
                    self.pos = read;
                    return Ok((start as u32, write as u32));
                }
                b'\\' => {
                    read += 1;
                    let esc = match self.buf.get(read).copied() {
                        Some(b) => b,
                        None => return Err(self.err("unterminated escape")),
                    };
                    let out = match esc {
                        b'n' => b'\n',
                        b'r' => b'\r',
                        b't' => b'\t',
                        b'f' => b'\x0c',
                        b'b' => b'\x08',
                        b'"' => b'"',
                        b'\\' => b'\\',
                        b'/' => b'/',
                        b'u' => {
                            if read + 4 >= self.buf.len() {
                                return Err(self.err("truncated \\u escape"));
                            }
                            let hex = &self.buf[read + 1..read + 5];
                            let value = parse_hex4(hex).ok_or_else(|| {
                                Error::Syntax {
                                    offset: read,
                                    message: "invalid \\u escape".to_string(),
                                }
                            })?;
                            let high = (value >> 8) as u8;
                            let low = (value & 0xff) as u8;
                            self.buf[write] = high;
                            write += 1;
                            self.buf[write] = low;
                            write += 1;
                            read += 5;
                            continue;
                        }
                        _ => {
                            return Err(Error::Syntax {
                                offset: read,
                                message: format!("invalid escape '\\{}'", esc as char),
                            })
                        }
                    };
                    self.buf[write] = out;
                    write += 1;
                    read += 1;
                }
                0 => return Err(self.err("unterminated string")),
                _ => {
                    if write != read {
                        self.buf[write] = b;
                    }
                    write += 1;
                    read += 1;
                }
            }
        }
    }

    fn parse_number(&mut self, arena: &mut Arena) -> Result<NodeId> {
        let start = self.pos;
        let mut is_float = false;
        if matches!(self.peek(), Some(b'-') | Some(b'+')) {
            self.bump();
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.bump();
        }
        if self.peek() == Some(b'.') {
            is_float = true;
            self.bump();
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some(b'-') | Some(b'+')) {
                self.bump();
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.bump();
            }
        }
        if self.pos == start {
            return Err(self.err("invalid number"));
        }
        let kind = if is_float { Kind::Float } else { Kind::Int };
        let node_id = arena.alloc(Node::new(kind));
        arena.get_mut(node_id).payload = Payload::Raw(start as u32, self.pos as u32);
        Ok(node_id)
    }

    fn parse_literal(&mut self, arena: &mut Arena, text: &str, kind: Kind) -> Result<NodeId> {
        let start = self.pos;
        for expected in text.bytes() {
            match self.bump() {
                Some(b) if b == expected => {}
                _ => return Err(self.err(format!("invalid literal, expected '{text}'"))),
            }
        }
        let node_id = arena.alloc(Node::new(kind));
        arena.get_mut(node_id).payload = Payload::Raw(start as u32, self.pos as u32);
        Ok(node_id)
    }
}

fn parse_hex4(bytes: &[u8]) -> Option<u16> {
    let s = std::str::from_utf8(bytes).ok()?;
    u16::from_str_radix(s, 16).ok()
}

/// Append `child` to the circular sibling ring whose current tail is `*tail`.
fn append_child(arena: &mut Arena, tail: &mut Option<NodeId>, child: NodeId) {
    match *tail {
        None => {
            arena.get_mut(child).next_sibling = Some(child);
        }
        Some(old_tail) => {
            let head = arena.get(old_tail).next_sibling.unwrap();
            arena.get_mut(child).next_sibling = Some(head);
            arena.get_mut(old_tail).next_sibling = Some(child);
        }
    }
    *tail = Some(child);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn it_classifies_numbers_by_presence_of_dot_or_exponent() {
        let mut doc = Document::parse("[1,1.5,1e3,-2,+3]").unwrap();
        assert_eq!(doc.type_of(Some("/1")).unwrap(), Some(crate::navigator::TypeTag::Int));
        assert_eq!(doc.type_of(Some("/2")).unwrap(), Some(crate::navigator::TypeTag::Float));
        assert_eq!(doc.type_of(Some("/3")).unwrap(), Some(crate::navigator::TypeTag::Float));
        assert_eq!(doc.type_of(Some("/4")).unwrap(), Some(crate::navigator::TypeTag::Int));
        assert_eq!(doc.type_of(Some("/5")).unwrap(), Some(crate::navigator::TypeTag::Int));
    }

    #[test]
    fn it_unescapes_common_control_sequences_in_place() {
        let mut doc = Document::parse(r#"["a\nb\tc\"d"]"#).unwrap();
        let value = doc.fetch(Some("/1"), crate::value::JsonValue::Null).unwrap();
        assert_eq!(value, crate::value::JsonValue::String("a\nb\tc\"d".to_string()));
    }

    #[test]
    fn it_emits_two_raw_bytes_for_a_unicode_escape() {
        // Documented current behavior: \uXXXX writes the high and low byte of
        // the code point directly rather than encoding it as UTF-8.
        let source = "{\"a\":\"\\u00e9\"}";
        let mut doc = Document::parse(source).unwrap();
        let value = doc.fetch(Some("/a"), crate::value::JsonValue::Null).unwrap();
        let expected = String::from_utf8_lossy(&[0x00, 0xe9]).into_owned();
        assert_eq!(value, crate::value::JsonValue::String(expected));
    }

    #[test]
    fn it_rejects_an_unterminated_string() {
        assert!(Document::parse(r#""abc"#).is_err());
    }

    #[test]
    fn it_rejects_malformed_literals() {
        assert!(Document::parse("tru").is_err());
        assert!(Document::parse("nul").is_err());
    }

    #[test]
    fn it_escalates_overflowing_integers_to_bigint() {
        let mut doc = Document::parse("99999999999999999999999999").unwrap();
        match doc.fetch(None, crate::value::JsonValue::Null).unwrap() {
            crate::value::JsonValue::BigInt(text) => {
                assert_eq!(text, "99999999999999999999999999");
            }
            other => panic!("expected BigInt, got {other:?}"),
        }
    }
}
