//! Converts raw node payloads into owned [`JsonValue`]s on demand.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::node::{Kind, Locator, NodeId, Payload};
use crate::value::JsonValue;

impl Document {
    /// Materialize `id` into a [`JsonValue`], caching the result for scalars.
    pub(crate) fn value_of(&mut self, id: NodeId) -> Result<JsonValue> {
        let kind = self.arena.get(id).kind;
        match kind {
            Kind::Null => Ok(JsonValue::Null),
            Kind::True => Ok(JsonValue::Bool(true)),
            Kind::False => Ok(JsonValue::Bool(false)),
            Kind::String | Kind::Int | Kind::Float => self.materialize_scalar(id, kind),
            Kind::Array => {
                let mut items = Vec::new();
                for child in self.children_of(id) {
                    items.push(self.value_of(child)?);
                }
                Ok(JsonValue::Array(items))
            }
            Kind::Object => {
                let mut entries = Vec::new();
                for child in self.children_of(id) {
                    let key = self.key_of(child)?;
                    let value = self.value_of(child)?;
                    entries.push((key, value));
                }
                Ok(JsonValue::Object(entries))
            }
        }
    }

    /// Read a scalar's payload, consulting and updating the materialization
    /// cache. Arrays and objects are never cached: every call rebuilds them.
    fn materialize_scalar(&mut self, id: NodeId, kind: Kind) -> Result<JsonValue> {
        if let Payload::Materialized(value) = &self.arena.get(id).payload {
            return Ok(value.clone());
        }
        let (start, end) = match self.arena.get(id).payload {
            Payload::Raw(s, e) => (s as usize, e as usize),
            _ => return Err(Error::Type(format!("expected raw payload for {kind:?}"))),
        };
        let bytes = &self.buf[start..end];
        let value = match kind {
            Kind::String => JsonValue::String(String::from_utf8_lossy(bytes).into_owned()),
            Kind::Int => match std::str::from_utf8(bytes).ok().and_then(|s| s.parse::<i64>().ok())
            {
                Some(n) => JsonValue::Int(n),
                None => {
                    let text = String::from_utf8_lossy(bytes).into_owned();
                    JsonValue::BigInt(text)
                }
            },
            Kind::Float => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| Error::Type("non-UTF-8 number literal".to_string()))?;
                let f: f64 = text
                    .parse()
                    .map_err(|_| Error::Type(format!("malformed float literal {text:?}")))?;
                JsonValue::Float(f)
            }
            _ => unreachable!("materialize_scalar only called for scalar kinds"),
        };
        self.arena.get_mut(id).payload = Payload::Materialized(value.clone());
        Ok(value)
    }

    fn key_of(&self, child: NodeId) -> Result<String> {
        match self.arena.get(child).locator {
            Locator::Key(start, end) => {
                let bytes = &self.buf[start as usize..end as usize];
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            _ => Err(Error::Type("object child missing key locator".to_string())),
        }
    }

    /// Walk the circular sibling ring of `id`'s children, head to tail.
    pub(crate) fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        let tail = match self.arena.get(id).payload {
            Payload::Collection(tail) => tail,
            _ => return Vec::new(),
        };
        let Some(tail) = tail else {
            return Vec::new();
        };
        let head = self
            .arena
            .get(tail)
            .next_sibling
            .expect("non-empty collection tail always has next_sibling set");
        let mut out = Vec::new();
        let mut cur = head;
        loop {
            out.push(cur);
            if cur == tail {
                break;
            }
            cur = self
                .arena
                .get(cur)
                .next_sibling
                .expect("sibling ring must close back to tail");
        }
        out
    }
}
