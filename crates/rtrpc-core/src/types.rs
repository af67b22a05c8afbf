//! The typed value union exchanged with the daemon.
//!
//! `Value` mirrors the subset of XML-RPC types the client actually speaks:
//! strings, narrow and wide integers, ordered arrays, and opaque binary
//! payloads. Booleans, doubles and the rest of the daemon's type zoo are
//! deliberately absent; the transport degrades them to strings on the way
//! back in.

use std::fmt;

/// A protocol value. Produced by the argument typer from command-line
/// tokens and returned by the transport as a call result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Text. The default for any token without a recognized prefix.
    Str(String),
    /// Narrow integer (`<i4>` on the wire).
    Int(i32),
    /// Wide integer (`<i8>` on the wire), used when the magnitude does not
    /// fit 32 bits.
    Long(i64),
    /// Ordered sequence; element order is significant and preserved.
    Array(Vec<Value>),
    /// Opaque bytes, fully buffered (`<base64>` on the wire).
    Binary(Vec<u8>),
}

impl Value {
    /// Wrap a signed integer, selecting the narrow variant when the
    /// magnitude fits 32 bits.
    pub fn int(n: i64) -> Self {
        match i32::try_from(n) {
            Ok(narrow) => Value::Int(narrow),
            Err(_) => Value::Long(n),
        }
    }

    /// The string content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Plain-text result rendering: scalars bare, arrays recursive, binary as
/// a size marker rather than raw bytes.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Long(n) => write!(f, "{}", n),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Binary(bytes) => write!(f, "<{} bytes of binary data>", bytes.len()),
        }
    }
}
