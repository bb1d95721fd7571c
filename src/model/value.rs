//! Typed property values and their document string encodings

use thiserror::Error;

/// Error raised when a raw string cannot be decoded as a given kind
#[derive(Debug, Error)]
#[error("cannot decode '{raw}' as {kind:?}")]
pub struct ValueDecodeError {
    pub raw: String,
    pub kind: ValueKind,
}

/// The kind of a typed property value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed integer (positions, spans, capacities)
    Int,
    /// Boolean flag
    Bool,
    /// Free-form text
    Text,
    /// Enumerated token (family-defined mode strings)
    Token,
}

impl ValueKind {
    /// Parse a kind name as it appears in catalog metadata
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(ValueKind::Int),
            "bool" => Some(ValueKind::Bool),
            "text" => Some(ValueKind::Text),
            "token" => Some(ValueKind::Token),
            _ => None,
        }
    }
}

/// A typed value held by an element property or a packing property
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Int(i32),
    Bool(bool),
    Text(String),
    Token(String),
}

impl PropertyValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PropertyValue::Int(_) => ValueKind::Int,
            PropertyValue::Bool(_) => ValueKind::Bool,
            PropertyValue::Text(_) => ValueKind::Text,
            PropertyValue::Token(_) => ValueKind::Token,
        }
    }

    /// Decode a document string into a value of the given kind
    pub fn decode(kind: ValueKind, raw: &str) -> Result<Self, ValueDecodeError> {
        let err = || ValueDecodeError {
            raw: raw.to_string(),
            kind,
        };
        match kind {
            ValueKind::Int => raw.parse::<i32>().map(PropertyValue::Int).map_err(|_| err()),
            ValueKind::Bool => match raw {
                "true" | "True" | "yes" | "1" => Ok(PropertyValue::Bool(true)),
                "false" | "False" | "no" | "0" => Ok(PropertyValue::Bool(false)),
                _ => Err(err()),
            },
            ValueKind::Text => Ok(PropertyValue::Text(raw.to_string())),
            ValueKind::Token => Ok(PropertyValue::Token(raw.to_string())),
        }
    }

    /// Encode for the document format: integers and booleans in canonical
    /// form, text and tokens verbatim.
    pub fn encode(&self) -> String {
        match self {
            PropertyValue::Int(v) => v.to_string(),
            PropertyValue::Bool(v) => v.to_string(),
            PropertyValue::Text(v) | PropertyValue::Token(v) => v.clone(),
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_token(&self) -> Option<&str> {
        match self {
            PropertyValue::Token(v) => Some(v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_int() {
        let v = PropertyValue::decode(ValueKind::Int, "-3").expect("Should decode");
        assert_eq!(v, PropertyValue::Int(-3));
    }

    #[test]
    fn test_decode_bool_variants() {
        for raw in ["true", "True", "yes", "1"] {
            let v = PropertyValue::decode(ValueKind::Bool, raw).expect("Should decode");
            assert_eq!(v, PropertyValue::Bool(true));
        }
        assert!(PropertyValue::decode(ValueKind::Bool, "maybe").is_err());
    }

    #[test]
    fn test_encode_round_trip() {
        let v = PropertyValue::Int(42);
        let decoded = PropertyValue::decode(v.kind(), &v.encode()).expect("Should decode");
        assert_eq!(decoded, v);
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!(ValueKind::from_name("int"), Some(ValueKind::Int));
        assert_eq!(ValueKind::from_name("token"), Some(ValueKind::Token));
        assert_eq!(ValueKind::from_name("float"), None);
    }
}
