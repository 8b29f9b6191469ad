//! Owns the buffer, the arena, and the cursor stack: the session-scoped
//! handle every navigation operation is a method on.

use std::path::Path;

use tracing::instrument;

use crate::arena::Arena;
use crate::error::{Error, Result};
use crate::node::{Locator, NodeId, ParentKind};
use crate::scanner;
use crate::value::JsonValue;

/// Upper bound on cursor stack depth. A deliberate cap, not an
/// implementation limitation: past this many nested `move_to` steps,
/// navigation fails with [`Error::StackOverflow`] rather than growing
/// unbounded.
pub const MAX_STACK: usize = 100;

/// Text encoding tag attached to a [`Document`]. Opaque to the core: this
/// crate only recognizes `Utf8` directly, treating anything else as bytes
/// the caller has already validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
}

/// A parsed JSON document together with its navigation cursor.
///
/// Obtained from [`Document::open`], [`Document::open_file`], or the
/// [`Document::parse`] alias. The arena and input buffer are released when
/// the `Document` is dropped.
pub struct Document {
    pub(crate) buf: Vec<u8>,
    pub(crate) arena: Arena,
    pub(crate) root: NodeId,
    pub(crate) stack: Vec<NodeId>,
    pub(crate) encoding: Option<Encoding>,
    closed: bool,
}

impl Document {
    #[instrument(skip(text, visitor))]
    pub fn open<R>(text: &str, visitor: impl FnOnce(&mut Document) -> R) -> Result<R> {
        let mut doc = Document::from_text(text)?;
        Ok(visitor(&mut doc))
    }

    #[instrument(skip(path, visitor))]
    pub fn open_file<R>(
        path: impl AsRef<Path>,
        visitor: impl FnOnce(&mut Document) -> R,
    ) -> Result<R> {
        let bytes = std::fs::read(path)?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let mut doc = Document::from_text(&text)?;
        Ok(visitor(&mut doc))
    }

    /// Parse `text` and hand back a live `Document`, for callers who don't
    /// need the strict scoping [`Document::open`] provides. Slightly less
    /// idiomatic than `open`: the caller is responsible for not leaning on
    /// the `Document` past its usefulness, and may call [`Document::close`]
    /// to retire it explicitly.
    #[instrument(skip(text))]
    pub fn parse(text: &str) -> Result<Document> {
        Document::from_text(text)
    }

    fn from_text(text: &str) -> Result<Document> {
        let mut buf = text.as_bytes().to_vec();
        let mut arena = Arena::new();
        let root = scanner::scan(&mut buf, &mut arena)?;
        Ok(Document {
            buf,
            arena,
            root,
            stack: vec![root],
            encoding: Some(Encoding::Utf8),
            closed: false,
        })
    }

    /// Retire a `Document` obtained through [`Document::parse`]. Further
    /// operations fail with [`Error::Closed`].
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    /// Number of token nodes recorded by the scanner: every scalar and every
    /// container counts once.
    pub fn size(&self) -> usize {
        self.arena.len()
    }

    pub fn encoding(&self) -> Option<Encoding> {
        self.encoding
    }

    /// Reset the cursor to the root, returning `"/"`.
    pub fn home(&mut self) -> &'static str {
        self.stack.truncate(1);
        "/"
    }

    pub(crate) fn current(&self) -> NodeId {
        *self.stack.last().expect("cursor stack is never empty")
    }

    /// Absolute path from root to the current node.
    pub fn where_path(&self) -> String {
        if self.stack.len() <= 1 {
            return "/".to_string();
        }
        let mut out = String::new();
        for &id in &self.stack[1..] {
            out.push('/');
            out.push_str(&self.step_text(id));
        }
        out
    }

    pub(crate) fn step_text(&self, id: NodeId) -> String {
        let node = self.arena.get(id);
        match node.locator {
            Locator::Key(start, end) => {
                String::from_utf8_lossy(&self.buf[start as usize..end as usize]).into_owned()
            }
            Locator::Index(i) => i.to_string(),
            Locator::None => String::new(),
        }
    }

    /// The current node's address within its parent: a string for an object
    /// child, an integer for an array child, null at the root.
    pub fn local_key(&self) -> JsonValue {
        let id = self.current();
        match self.arena.get(id).parent_kind {
            ParentKind::Object => JsonValue::String(self.step_text(id)),
            ParentKind::Array => match self.arena.get(id).locator {
                Locator::Index(i) => JsonValue::Int(i as i64),
                _ => JsonValue::Null,
            },
            ParentKind::None => JsonValue::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Payload;

    #[test]
    fn it_counts_every_scalar_and_container_as_one_token() {
        let doc = Document::parse("[1,[2,3],{\"a\":4}]").unwrap();
        assert_eq!(doc.size(), 7);
    }

    #[test]
    fn it_reports_utf8_encoding() {
        let doc = Document::parse("1").unwrap();
        assert_eq!(doc.encoding(), Some(Encoding::Utf8));
    }

    #[test]
    fn it_reports_root_as_home_path() {
        let mut doc = Document::parse("[1,2,3]").unwrap();
        doc.move_to("/2").unwrap();
        doc.home();
        assert_eq!(doc.where_path(), "/");
    }

    #[test]
    fn it_caches_scalar_materialization() {
        let mut doc = Document::parse("[42]").unwrap();
        doc.move_to("/1").unwrap();
        let id = doc.current();
        assert!(!matches!(doc.arena.get(id).payload, Payload::Materialized(_)));
        doc.fetch(None, JsonValue::Null).unwrap();
        assert!(matches!(doc.arena.get(id).payload, Payload::Materialized(_)));
        assert_eq!(doc.fetch(None, JsonValue::Null).unwrap(), JsonValue::Int(42));
    }

    #[test]
    fn it_rejects_operations_after_close() {
        let mut doc = Document::parse("1").unwrap();
        doc.close();
        assert!(matches!(doc.fetch(None, JsonValue::Null), Err(Error::Closed)));
    }

    #[test]
    fn it_reports_local_key_for_object_and_array_children() {
        let mut doc = Document::parse(r#"{"one":[10,20]}"#).unwrap();
        doc.move_to("/one").unwrap();
        assert_eq!(doc.local_key(), JsonValue::String("one".to_string()));
        doc.move_to("2").unwrap();
        assert_eq!(doc.local_key(), JsonValue::Int(2));
    }
}
