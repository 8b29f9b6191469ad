//! A fast, lazy JSON document navigator: parse once into an arena of
//! lightweight nodes, then walk it with a stateful cursor, materializing
//! host values only for the leaves actually inspected.
//!
//! ```
//! use json_nav::Document;
//!
//! Document::open(r#"{"one": [1, 2, 3]}"#, |doc| -> json_nav::Result<()> {
//!     doc.move_to("/one/2")?;
//!     assert_eq!(doc.fetch(None, json_nav::JsonValue::Null)?, json_nav::JsonValue::Int(2));
//!     Ok(())
//! }).unwrap().unwrap();
//! ```

mod arena;
mod document;
mod error;
#[cfg(test)]
mod fixtures;
mod limit;
mod materializer;
mod navigator;
mod node;
mod render;
mod scanner;
mod value;

pub use crate::document::{Document, Encoding, MAX_STACK};
pub use crate::error::{Error, Result};
pub use crate::navigator::TypeTag;
pub use crate::node::Kind;
pub use crate::value::JsonValue;
