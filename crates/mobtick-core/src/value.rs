//! Persisted value tree
//!
//! Save data is exchanged with the persistence codec as a `ValueMap`. Keys are
//! field names; values form a small self-describing tree so corrupt fields can
//! be detected and skipped one at a time.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A persisted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    /// Integer value (ages, counters, packed colours)
    Int(i64),
    /// Floating point value (radii, health, coordinates)
    Float(f64),
    String(String),
    /// Persistent identity of another entity (owner, experience source)
    Uuid(Uuid),
    List(Vec<Value>),
    Map(ValueMap),
}

/// A map of field names to persisted values
///
/// Uses IndexMap so serialized output keeps insertion order
pub type ValueMap = IndexMap<String, Value>;

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats and integers both read as f64
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Uuids may be stored natively or as their hyphenated string form
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Value::Uuid(id) => Some(*id),
            Value::String(s) => Uuid::parse_str(s).ok(),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Short name used in corruption warnings
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => |$v:ident| $body:expr),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from($v: $ty) -> Self {
                    $body
                }
            }
        )*
    };
}

value_from! {
    bool => |v| Value::Bool(v),
    i32 => |v| Value::Int(v.into()),
    i64 => |v| Value::Int(v),
    f32 => |v| Value::Float(v.into()),
    f64 => |v| Value::Float(v),
    &str => |v| Value::String(v.to_owned()),
    String => |v| Value::String(v),
    Uuid => |v| Value::Uuid(v),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_accessors() {
        assert!(Value::Null.is_null());
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(-24000).as_int(), Some(-24000));
        assert_eq!(Value::Int(3).as_float(), Some(3.0));
        assert_eq!(Value::Float(0.5).as_int(), None);
        assert_eq!(Value::String("minecraft:entity_effect".into()).as_str(), Some("minecraft:entity_effect"));
    }

    #[test]
    fn test_uuid_from_string() {
        let id = Uuid::new_v4();
        assert_eq!(Value::String(id.to_string()).as_uuid(), Some(id));
        assert_eq!(Value::Uuid(id).as_uuid(), Some(id));
        assert_eq!(Value::String("not-a-uuid".into()).as_uuid(), None);
    }

    #[test]
    fn test_numbers_widen() {
        assert_eq!(Value::from(-3i32), Value::Int(-3));
        assert_eq!(Value::from(0.5f32), Value::Float(0.5));
        assert_eq!(Value::from("sheep").type_name(), "string");
    }
}
