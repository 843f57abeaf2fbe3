//! hconfig value representation.

use std::collections::HashMap;
use std::fmt;

/// A key-value map, as produced by `{ ... }` and by section bodies.
pub type Object = HashMap<String, Value>;

/// An hconfig value.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit floating-point number.
    Number(f64),
    /// String, quoted or bare.
    String(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Object (key-value map).
    Object(Object),
}

/// The runtime kind of a value, as named by schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    String,
    Number,
    Array,
    Object,
    Bool,
    Null,
}

impl Kind {
    /// All kinds, in the order schemas list them.
    pub const ALL: [Kind; 6] = [
        Kind::String,
        Kind::Number,
        Kind::Array,
        Kind::Object,
        Kind::Bool,
        Kind::Null,
    ];

    /// Look up a kind by its schema name. `any` is not a kind.
    pub fn from_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// The name schemas use for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Kind::String => "string",
            Kind::Number => "number",
            Kind::Array => "array",
            Kind::Object => "object",
            Kind::Bool => "bool",
            Kind::Null => "null",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Value {
    /// The kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Number(_) => Kind::Number,
            Value::String(_) => Kind::String,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    /// Returns `true` if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number if this is a `Number`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns a reference to the string if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns a reference to the array if this is an `Array`.
    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Returns a reference to the object if this is an `Object`.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Looks up a key if this is an `Object`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|obj| obj.get(key))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Array(arr) => f.debug_list().entries(arr).finish(),
            Value::Object(obj) => {
                let mut keys: Vec<&String> = obj.keys().collect();
                keys.sort();
                f.debug_map().entries(keys.into_iter().map(|k| (k, &obj[k]))).finish()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(arr: Vec<Value>) -> Self {
        Value::Array(arr)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(Value::Null.kind(), Kind::Null);
        assert_eq!(Value::from(true).kind(), Kind::Bool);
        assert_eq!(Value::from(1.5).kind(), Kind::Number);
        assert_eq!(Value::from("x").kind(), Kind::String);
        assert_eq!(Value::Array(Vec::new()).kind(), Kind::Array);
        assert_eq!(Value::from(Object::new()).kind(), Kind::Object);
    }

    #[test]
    fn test_kind_names() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(Kind::from_name("any"), None);
        assert_eq!(Kind::from_name("integer"), None);
    }

    #[test]
    fn test_debug_sorts_keys() {
        let value = Value::Object(Object::from([
            ("b".to_string(), Value::from(2)),
            ("a".to_string(), Value::from("x")),
        ]));
        assert_eq!(format!("{:?}", value), "{\"a\": \"x\", \"b\": 2}");
    }

    #[test]
    fn test_get() {
        let value = Value::Object(Object::from([("port".to_string(), Value::from(8080))]));
        assert_eq!(value.get("port").and_then(Value::as_f64), Some(8080.0));
        assert!(value.get("host").is_none());
        assert!(Value::Null.get("port").is_none());
    }
}
