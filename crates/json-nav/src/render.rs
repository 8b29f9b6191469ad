//! `dump`'s serializer: a small `Display`-driven JSON encoder, adapted from
//! the pattern of encoding values by recursive `fmt::Display`, but emitting
//! strict, minimal JSON (double-quoted keys, `:`/`,` with no extra
//! whitespace, no trailing commas) rather than another value syntax.

use std::fmt::{self, Write as _};

use crate::value::JsonValue;

/// Render `value` as JSON text.
pub fn render(value: &JsonValue) -> String {
    let mut out = String::new();
    write_value(&mut out, value).expect("writing to a String never fails");
    out
}

fn write_value(out: &mut String, value: &JsonValue) -> fmt::Result {
    match value {
        JsonValue::Null => out.push_str("null"),
        JsonValue::Bool(true) => out.push_str("true"),
        JsonValue::Bool(false) => out.push_str("false"),
        JsonValue::Int(n) => write!(out, "{n}")?,
        JsonValue::BigInt(text) => out.push_str(text),
        JsonValue::Float(f) => write_float(out, *f)?,
        JsonValue::String(s) => write_string(out, s)?,
        JsonValue::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item)?;
            }
            out.push(']');
        }
        JsonValue::Object(entries) => {
            out.push('{');
            for (i, (key, value)) in entries.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key)?;
                out.push(':');
                write_value(out, value)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

/// `f64`'s `Display` drops the decimal point for whole-number values
/// (`1.0` renders as `"1"`), which would reparse as `Kind::Int` rather than
/// `Kind::Float`. Force a `.0` onto any rendering that has neither a `.` nor
/// an exponent so the kind round-trips.
fn write_float(out: &mut String, f: f64) -> fmt::Result {
    let start = out.len();
    write!(out, "{f}")?;
    if !out[start..].contains(['.', 'e', 'E']) {
        out.push_str(".0");
    }
    Ok(())
}

fn write_string(out: &mut String, s: &str) -> fmt::Result {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => write!(out, "\\u{:04x}", c as u32)?,
            c => out.push(c),
        }
    }
    out.push('"');
    Ok(())
}
