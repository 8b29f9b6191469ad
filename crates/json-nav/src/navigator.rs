//! Path resolution and the traversal operators built on top of it.

use tracing::instrument;

use crate::document::{Document, MAX_STACK};
use crate::error::{Error, Result};
use crate::node::{Kind, NodeId};
use crate::render;
use crate::value::JsonValue;

/// One parsed step of a `/`-separated path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathStep {
    Up,
    Key(String),
    Index(u32),
}

/// Type of a node without materializing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeTag {
    Null,
    True,
    False,
    Int,
    Float,
    String,
    Array,
    Object,
}

impl From<Kind> for TypeTag {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Null => TypeTag::Null,
            Kind::True => TypeTag::True,
            Kind::False => TypeTag::False,
            Kind::Int => TypeTag::Int,
            Kind::Float => TypeTag::Float,
            Kind::String => TypeTag::String,
            Kind::Array => TypeTag::Array,
            Kind::Object => TypeTag::Object,
        }
    }
}

fn parse_path(path: &str) -> Result<(bool, Vec<PathStep>)> {
    if path.is_empty() || path == "/" {
        return Ok((true, Vec::new()));
    }
    let (absolute, rest) = match path.strip_prefix('/') {
        Some(rest) => (true, rest),
        None => (false, path),
    };
    if rest.is_empty() {
        return Ok((absolute, Vec::new()));
    }
    let mut steps = Vec::new();
    for segment in rest.split('/') {
        if segment.is_empty() {
            return Err(Error::Argument(format!(
                "empty path step in {path:?}"
            )));
        }
        let step = if segment == ".." {
            PathStep::Up
        } else if segment.bytes().all(|b| b.is_ascii_digit()) {
            let index: u32 = segment
                .parse()
                .map_err(|_| Error::Argument(format!("index step {segment:?} out of range")))?;
            PathStep::Index(index)
        } else {
            PathStep::Key(segment.to_string())
        };
        steps.push(step);
    }
    Ok((absolute, steps))
}

impl Document {
    fn find_child_by_key(&self, parent: NodeId, key: &str) -> Option<NodeId> {
        self.children_of(parent).into_iter().rev().find(|&child| {
            matches!(
                self.arena.get(child).parent_kind,
                crate::node::ParentKind::Object
            ) && self.step_text(child) == key
        })
    }

    fn find_child_by_index(&self, parent: NodeId, index: u32) -> Option<NodeId> {
        if index == 0 {
            return None;
        }
        self.children_of(parent)
            .into_iter()
            .nth((index - 1) as usize)
    }

    /// Resolve `path` against `stack`, mutating it in place. Used both for
    /// `move_to`'s real cursor stack and for the scratch stacks `fetch`,
    /// `type_of`, and `each_value` resolve against without disturbing the
    /// live cursor.
    fn resolve_on(&self, stack: &mut Vec<NodeId>, path: &str) -> Result<()> {
        let (absolute, steps) = parse_path(path)?;
        if absolute {
            stack.truncate(1);
        }
        for (index, step) in steps.iter().enumerate() {
            let current = *stack.last().expect("cursor stack is never empty");
            let next = match step {
                PathStep::Up => {
                    if stack.len() <= 1 {
                        None
                    } else {
                        stack.pop();
                        continue;
                    }
                }
                PathStep::Key(key) => self.find_child_by_key(current, key),
                PathStep::Index(i) => self.find_child_by_index(current, *i),
            };
            let next = next.ok_or_else(|| Error::InvalidPath {
                path: path.to_string(),
                step_index: index,
            })?;
            if stack.len() >= MAX_STACK {
                return Err(Error::StackOverflow { limit: MAX_STACK });
            }
            stack.push(next);
        }
        Ok(())
    }

    /// Resolve `path` (or the current node, if `None`) non-destructively,
    /// the way [`Document::fetch`], [`Document::type_of`], and
    /// [`Document::each_value`] do: a path that merely fails to *resolve*
    /// (missing key, out-of-range index, ascent above root, stack overflow)
    /// is reported as `Ok(None)` rather than `Err`, matching the ground
    /// truth's "only `move` raises a path error" rule. A malformed path
    /// string or a closed document are still hard errors and propagate as
    /// `Err`.
    fn resolve_scratch(&self, path: Option<&str>) -> Result<Option<NodeId>> {
        let mut scratch = self.stack.clone();
        if let Some(path) = path {
            match self.resolve_on(&mut scratch, path) {
                Ok(()) => {}
                Err(Error::InvalidPath { .. }) | Err(Error::StackOverflow { .. }) => {
                    return Ok(None)
                }
                Err(err) => return Err(err),
            }
        }
        Ok(Some(*scratch.last().expect("cursor stack is never empty")))
    }

    /// Move the cursor along `path`. On failure the cursor stack is restored
    /// to its state before the call.
    #[instrument(skip(self))]
    pub fn move_to(&mut self, path: &str) -> Result<()> {
        self.ensure_open()?;
        let snapshot = self.stack.clone();
        let mut stack = self.stack.clone();
        match self.resolve_on(&mut stack, path) {
            Ok(()) => {
                self.stack = stack;
                Ok(())
            }
            Err(err) => {
                self.stack = snapshot;
                Err(err)
            }
        }
    }

    /// Materialize the value at `path` (or the current node). If `path`
    /// does not resolve, returns `default` rather than an `InvalidPath`
    /// error — only [`Document::move_to`] raises on an unresolvable path.
    pub fn fetch(&mut self, path: Option<&str>, default: JsonValue) -> Result<JsonValue> {
        self.ensure_open()?;
        match self.resolve_scratch(path)? {
            Some(node) => self.value_of(node),
            None => Ok(default),
        }
    }

    /// Classify the node at `path` (or the current node) without
    /// materializing it. `Ok(None)` if `path` does not resolve.
    pub fn type_of(&self, path: Option<&str>) -> Result<Option<TypeTag>> {
        self.ensure_open()?;
        Ok(self
            .resolve_scratch(path)?
            .map(|node| self.arena.get(node).kind.into()))
    }

    /// Visit every leaf descendant of `path` (or the current node), cursor
    /// first, depth first, in source order. The real cursor stack is
    /// restored afterward regardless of outcome. If `path` does not
    /// resolve, this is a silent no-op (`Ok(())`, visitor never invoked),
    /// matching the ground truth's `doc_each_leaf`; only
    /// [`Document::move_to`] raises `InvalidPath`.
    #[instrument(skip(self, visitor))]
    pub fn each_leaf(
        &mut self,
        path: Option<&str>,
        mut visitor: impl FnMut(&mut Document) -> Result<()>,
    ) -> Result<()> {
        self.ensure_open()?;
        let snapshot = self.stack.clone();
        let mut stack = self.stack.clone();
        if let Some(path) = path {
            match self.resolve_on(&mut stack, path) {
                Ok(()) => {}
                Err(Error::InvalidPath { .. }) | Err(Error::StackOverflow { .. }) => {
                    self.stack = snapshot;
                    return Ok(());
                }
                Err(err) => {
                    self.stack = snapshot;
                    return Err(err);
                }
            }
        }
        let root = *stack.last().expect("cursor stack is never empty");
        self.stack = stack;
        let result = self.each_leaf_recursive(root, &mut visitor);
        self.stack = snapshot;
        result
    }

    fn each_leaf_recursive(
        &mut self,
        node: NodeId,
        visitor: &mut impl FnMut(&mut Document) -> Result<()>,
    ) -> Result<()> {
        if self.arena.get(node).kind.is_leaf() {
            self.stack.push(node);
            let result = visitor(self);
            self.stack.pop();
            return result;
        }
        for child in self.children_of(node) {
            self.each_leaf_recursive(child, visitor)?;
        }
        Ok(())
    }

    /// Visit each immediate child of `path` (or the current node). Yields
    /// nothing for a non-collection target, and likewise yields nothing
    /// (`Ok(())`, no `InvalidPath`) when `path` does not resolve at all —
    /// only [`Document::move_to`] raises on an unresolvable path.
    pub fn each_child(
        &mut self,
        path: Option<&str>,
        mut visitor: impl FnMut(&mut Document) -> Result<()>,
    ) -> Result<()> {
        self.ensure_open()?;
        let snapshot = self.stack.clone();
        let mut stack = self.stack.clone();
        if let Some(path) = path {
            match self.resolve_on(&mut stack, path) {
                Ok(()) => {}
                Err(Error::InvalidPath { .. }) | Err(Error::StackOverflow { .. }) => {
                    self.stack = snapshot;
                    return Ok(());
                }
                Err(err) => {
                    self.stack = snapshot;
                    return Err(err);
                }
            }
        }
        let parent = *stack.last().expect("cursor stack is never empty");
        self.stack = stack;
        let result = (|| {
            for child in self.children_of(parent) {
                self.stack.push(child);
                let outcome = visitor(self);
                self.stack.pop();
                outcome?;
            }
            Ok(())
        })();
        self.stack = snapshot;
        result
    }

    /// Like [`Document::each_leaf`], but hands the visitor each leaf's
    /// materialized value instead of positioning the cursor there. The real
    /// cursor stack is never touched. A `path` that does not resolve is a
    /// silent no-op, same as [`Document::each_leaf`]/[`Document::each_child`].
    pub fn each_value(
        &mut self,
        path: Option<&str>,
        mut visitor: impl FnMut(&JsonValue) -> Result<()>,
    ) -> Result<()> {
        self.ensure_open()?;
        match self.resolve_scratch(path)? {
            Some(node) => self.each_value_recursive(node, &mut visitor),
            None => Ok(()),
        }
    }

    fn each_value_recursive(
        &mut self,
        node: NodeId,
        visitor: &mut impl FnMut(&JsonValue) -> Result<()>,
    ) -> Result<()> {
        if self.arena.get(node).kind.is_leaf() {
            let value = self.value_of(node)?;
            return visitor(&value);
        }
        for child in self.children_of(node) {
            self.each_value_recursive(child, visitor)?;
        }
        Ok(())
    }

    /// Serialize the value at `path` (or the current node) as JSON text.
    /// `Ok(None)` if `path` does not resolve, matching the ground truth's
    /// `doc_dump`, which returns `nil` rather than raising in that case.
    pub fn dump(&mut self, path: Option<&str>) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self
            .resolve_scratch(path)?
            .map(|node| self.value_of(node))
            .transpose()?
            .map(|value| render::render(&value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_fetches_array_elements_by_one_based_index() {
        let mut doc = Document::parse("[1,2,3]").unwrap();
        assert_eq!(doc.size(), 4);
        assert_eq!(doc.fetch(Some("/2"), JsonValue::Null).unwrap(), JsonValue::Int(2));
        assert_eq!(doc.type_of(Some("/1")).unwrap(), Some(TypeTag::Int));
    }

    #[test]
    fn it_reads_object_keys_by_move_then_local_key() {
        let mut doc = Document::parse(r#"{"one":3}"#).unwrap();
        doc.move_to("/one").unwrap();
        assert_eq!(doc.local_key(), JsonValue::String("one".to_string()));
        assert_eq!(doc.fetch(None, JsonValue::Null).unwrap(), JsonValue::Int(3));
    }

    #[test]
    fn it_visits_leaves_in_source_order_with_correct_paths() {
        let mut doc = Document::parse("[3,[2,1]]").unwrap();
        let mut seen = Vec::new();
        doc.each_leaf(None, |d| {
            let value = d.fetch(None, JsonValue::Null)?;
            seen.push((d.where_path(), value));
            Ok(())
        })
        .unwrap();
        assert_eq!(
            seen,
            vec![
                ("/1".to_string(), JsonValue::Int(3)),
                ("/2/1".to_string(), JsonValue::Int(2)),
                ("/2/2".to_string(), JsonValue::Int(1)),
            ]
        );
    }

    #[test]
    fn it_resolves_absolute_paths_from_any_cursor_position() {
        let mut doc =
            Document::parse(r#"[{"one":1,"two":2},{"three":3,"four":4}]"#).unwrap();
        doc.move_to("/1/two").unwrap();
        assert_eq!(doc.fetch(None, JsonValue::Null).unwrap(), JsonValue::Int(2));
        assert_eq!(
            doc.fetch(Some("/2/three"), JsonValue::Null).unwrap(),
            JsonValue::Int(3)
        );
    }

    #[test]
    fn it_returns_the_default_instead_of_an_error_when_a_path_misses() {
        let mut doc = Document::parse("[1,2]").unwrap();
        assert_eq!(
            doc.fetch(Some("/9"), JsonValue::Int(-1)).unwrap(),
            JsonValue::Int(-1)
        );
        assert_eq!(doc.type_of(Some("/9")).unwrap(), None);
        assert_eq!(doc.dump(Some("/9")).unwrap(), None);

        let mut visits = 0;
        doc.each_leaf(Some("/9"), |_| {
            visits += 1;
            Ok(())
        })
        .unwrap();
        doc.each_child(Some("/9"), |_| {
            visits += 1;
            Ok(())
        })
        .unwrap();
        doc.each_value(Some("/9"), |_| {
            visits += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(visits, 0);
    }

    #[test]
    fn it_restores_the_cursor_when_move_to_fails() {
        let mut doc = Document::parse("[1,2]").unwrap();
        let before = doc.stack.clone();
        let err = doc.move_to("/5").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath { step_index: 0, .. }
        ));
        assert_eq!(doc.stack, before);
    }

    #[test]
    fn it_rejects_zero_as_an_array_index() {
        let mut doc = Document::parse("[1,2]").unwrap();
        assert!(doc.move_to("/0").is_err());
    }

    #[test]
    fn it_treats_ascent_above_root_as_failure_not_a_no_op() {
        let mut doc = Document::parse("1").unwrap();
        assert!(doc.move_to("..").is_err());
    }

    #[test]
    fn it_counts_each_child_exactly_once_per_immediate_child() {
        let mut doc = Document::parse(r#"{"a":1,"b":2,"c":3}"#).unwrap();
        let mut count = 0;
        doc.each_child(None, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 3);

        let mut scalar = Document::parse("1").unwrap();
        let mut scalar_count = 0;
        scalar
            .each_child(None, |_| {
                scalar_count += 1;
                Ok(())
            })
            .unwrap();
        assert_eq!(scalar_count, 0);
    }

    #[test]
    fn it_dumps_a_value_that_reparses_to_the_same_value() {
        let mut doc = Document::parse(r#"{"a":[1,2,"x"]}"#).unwrap();
        let dumped = doc.dump(None).unwrap().expect("root always resolves");
        let mut reparsed = Document::parse(&dumped).unwrap();
        assert_eq!(
            reparsed.fetch(None, JsonValue::Null).unwrap(),
            doc.fetch(None, JsonValue::Null).unwrap()
        );
    }

    #[test]
    fn it_dumps_a_whole_number_float_with_a_decimal_point() {
        let mut doc = Document::parse("[1.0]").unwrap();
        let dumped = doc.dump(Some("/1")).unwrap().expect("path resolves");
        assert_eq!(dumped, "1.0");
        let mut reparsed = Document::parse(&dumped).unwrap();
        assert_eq!(
            reparsed.fetch(None, JsonValue::Null).unwrap(),
            JsonValue::Float(1.0)
        );
    }

    #[test]
    fn it_stores_keys_containing_a_slash_verbatim() {
        let mut doc = Document::parse(r#"{"k/ey":1}"#).unwrap();
        doc.each_child(None, |child| {
            assert_eq!(child.where_path(), "/k/ey");
            Ok(())
        })
        .unwrap();
    }
}
