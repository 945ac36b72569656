use super::types::AttributeType;
use std::fmt;

/// Decoded attribute value.
///
/// Pairs carry decoded values rather than raw wire bytes; the wire
/// codec is a separate concern from policy-module processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Printable text
    String(String),
    /// Opaque octet sequence
    Octets(Vec<u8>),
    /// 32-bit unsigned integer
    Integer(u32),
}

impl Value {
    /// View the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// View the value as raw octets.
    ///
    /// String values are viewed as their UTF-8 bytes; integers have no
    /// octet view.
    pub fn as_octets(&self) -> Option<&[u8]> {
        match self {
            Value::String(s) => Some(s.as_bytes()),
            Value::Octets(o) => Some(o),
            Value::Integer(_) => None,
        }
    }

    /// View the value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<u32> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Printable rendering, as used for subprocess environments and
    /// string expansion. Octets render as `0x`-prefixed lowercase hex.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.write_str(s),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Octets(o) => {
                f.write_str("0x")?;
                for byte in o {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

/// A RADIUS attribute: a dictionary-identified type paired with a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: AttributeType,
    pub value: Value,
}

impl Attribute {
    pub fn new(attr_type: AttributeType, value: Value) -> Self {
        Attribute { attr_type, value }
    }

    /// Create a string attribute
    pub fn string(attr_type: AttributeType, value: impl Into<String>) -> Self {
        Attribute::new(attr_type, Value::String(value.into()))
    }

    /// Create an opaque octets attribute
    pub fn octets(attr_type: AttributeType, value: impl Into<Vec<u8>>) -> Self {
        Attribute::new(attr_type, Value::Octets(value.into()))
    }

    /// Create an integer attribute
    pub fn integer(attr_type: AttributeType, value: u32) -> Self {
        Attribute::new(attr_type, Value::Integer(value))
    }
}
