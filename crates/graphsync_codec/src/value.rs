//! Dynamic wire value type.

/// Kind tag for a null value.
pub(crate) const TAG_NULL: u8 = 0x00;
/// Kind tag for a boolean.
pub(crate) const TAG_BOOL: u8 = 0x01;
/// Kind tag for a 32-bit integer.
pub(crate) const TAG_INT: u8 = 0x02;
/// Kind tag for a 64-bit integer.
pub(crate) const TAG_LONG: u8 = 0x03;
/// Kind tag for a UTF-8 text string.
pub(crate) const TAG_TEXT: u8 = 0x04;
/// Kind tag for a byte string.
pub(crate) const TAG_BYTES: u8 = 0x05;
/// Kind tag for a string-keyed map.
pub(crate) const TAG_MAP: u8 = 0x06;

/// A dynamic wire value.
///
/// This type spans the closed universe of values the protocol can put
/// on the wire. Maps preserve insertion order; two maps with the same
/// entries in a different order are different values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Text string (UTF-8).
    Text(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// String-keyed map of values, in insertion order.
    Map(Vec<(String, Value)>),
}

impl Value {
    /// Returns the kind name, as used in decode errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Long(_) => "long",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Map(_) => "map",
        }
    }

    /// Returns the wire kind tag for this value.
    pub(crate) fn tag(&self) -> u8 {
        match self {
            Value::Null => TAG_NULL,
            Value::Bool(_) => TAG_BOOL,
            Value::Int(_) => TAG_INT,
            Value::Long(_) => TAG_LONG,
            Value::Text(_) => TAG_TEXT,
            Value::Bytes(_) => TAG_BYTES,
            Value::Map(_) => TAG_MAP,
        }
    }

    /// Returns the kind name for a wire tag, if the tag is known.
    pub(crate) fn kind_of_tag(tag: u8) -> Option<&'static str> {
        match tag {
            TAG_NULL => Some("null"),
            TAG_BOOL => Some("bool"),
            TAG_INT => Some("int"),
            TAG_LONG => Some("long"),
            TAG_TEXT => Some("text"),
            TAG_BYTES => Some("bytes"),
            TAG_MAP => Some("map"),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the integer if this is a `Long`, widening an `Int`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Long(n) => Some(*n),
            Value::Int(n) => Some(i64::from(*n)),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the byte slice if this is a `Bytes`.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the entry slice if this is a `Map`.
    pub fn as_map(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Map(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Looks up a map entry by key, if this is a `Map`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Long(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Bytes(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(5).as_i32(), Some(5));
        assert_eq!(Value::Int(5).as_i64(), Some(5));
        assert_eq!(Value::Long(9).as_i64(), Some(9));
        assert_eq!(Value::Text("x".into()).as_text(), Some("x"));
        assert_eq!(Value::Bytes(vec![1]).as_bytes(), Some(&[1u8][..]));
        assert!(Value::Null.is_null());
        assert_eq!(Value::Null.as_bool(), None);
    }

    #[test]
    fn map_lookup() {
        let map = Value::Map(vec![
            ("name".into(), Value::Text("home".into())),
            ("visible".into(), Value::Bool(true)),
        ]);
        assert_eq!(map.get("name").and_then(Value::as_text), Some("home"));
        assert!(map.get("missing").is_none());
    }

    #[test]
    fn kind_names() {
        assert_eq!(Value::Null.kind(), "null");
        assert_eq!(Value::Map(vec![]).kind(), "map");
        assert_eq!(Value::kind_of_tag(0x07), None);
    }
}
