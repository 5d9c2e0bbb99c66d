//! Persistence codec boundary
//!
//! Entities save to and load from a [`ValueMap`]; a [`PersistenceCodec`] turns
//! that map into bytes. Loading is lenient field by field: [`FieldReader`]
//! logs a corrupt field and falls back to the caller's default, so one bad
//! field never aborts the rest of the entity.

use crate::error::{Error, Result};
use crate::value::{Value, ValueMap};
use tracing::warn;
use uuid::Uuid;

/// Converts attribute maps to and from persisted blobs
pub trait PersistenceCodec {
    fn read_attributes(&self, blob: &[u8]) -> Result<ValueMap>;

    fn write_attributes(&self, attributes: &ValueMap) -> Result<Vec<u8>>;
}

/// Human-readable RON encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct RonCodec;

impl PersistenceCodec for RonCodec {
    fn read_attributes(&self, blob: &[u8]) -> Result<ValueMap> {
        let text = std::str::from_utf8(blob).map_err(|e| Error::Codec(e.to_string()))?;
        ron::from_str(text).map_err(|e| Error::Codec(e.to_string()))
    }

    fn write_attributes(&self, attributes: &ValueMap) -> Result<Vec<u8>> {
        ron::to_string(attributes)
            .map(String::into_bytes)
            .map_err(|e| Error::Codec(e.to_string()))
    }
}

/// Compact binary encoding
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl PersistenceCodec for BincodeCodec {
    fn read_attributes(&self, blob: &[u8]) -> Result<ValueMap> {
        bincode::deserialize(blob).map_err(|e| Error::Codec(e.to_string()))
    }

    fn write_attributes(&self, attributes: &ValueMap) -> Result<Vec<u8>> {
        bincode::serialize(attributes).map_err(|e| Error::Codec(e.to_string()))
    }
}

/// Lenient typed access to a loaded attribute map
///
/// Missing fields silently yield the default. Present fields of the wrong
/// shape are reported as data corruption and also yield the default.
#[derive(Debug, Clone, Copy)]
pub struct FieldReader<'a> {
    map: &'a ValueMap,
    context: &'a str,
}

impl<'a> FieldReader<'a> {
    /// `context` names the entity in diagnostics
    pub fn new(map: &'a ValueMap, context: &'a str) -> Self {
        Self { map, context }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn raw(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key)
    }

    pub fn int(&self, key: &str, default: i64) -> i64 {
        self.typed(key, "int", Value::as_int).unwrap_or(default)
    }

    /// Integer narrowed to i32, saturating out-of-range values
    pub fn int32(&self, key: &str, default: i32) -> i32 {
        self.typed(key, "int", Value::as_int)
            .map(|v| v.clamp(i32::MIN as i64, i32::MAX as i64) as i32)
            .unwrap_or(default)
    }

    pub fn float(&self, key: &str, default: f64) -> f64 {
        self.typed(key, "float", Value::as_float).unwrap_or(default)
    }

    pub fn float32(&self, key: &str, default: f32) -> f32 {
        self.typed(key, "float", Value::as_float)
            .map(|v| v as f32)
            .unwrap_or(default)
    }

    pub fn bool(&self, key: &str, default: bool) -> bool {
        self.typed(key, "bool", Value::as_bool).unwrap_or(default)
    }

    pub fn string(&self, key: &str) -> Option<&'a str> {
        self.typed(key, "string", Value::as_str)
    }

    pub fn uuid(&self, key: &str) -> Option<Uuid> {
        self.typed(key, "uuid", Value::as_uuid)
    }

    pub fn list(&self, key: &str) -> Option<&'a [Value]> {
        self.typed(key, "list", Value::as_list)
    }

    /// Nested reader over a map-valued field
    pub fn map(&self, key: &str) -> Option<FieldReader<'a>> {
        self.typed(key, "map", Value::as_map)
            .map(|map| FieldReader::new(map, self.context))
    }

    /// Three floats stored as a list
    pub fn vec3(&self, key: &str) -> Option<[f64; 3]> {
        let list = self.list(key)?;
        match list {
            [x, y, z] => match (x.as_float(), y.as_float(), z.as_float()) {
                (Some(x), Some(y), Some(z)) => Some([x, y, z]),
                _ => {
                    self.corrupt(key, "expected three numbers");
                    None
                }
            },
            _ => {
                self.corrupt(key, &format!("expected three numbers, got {}", list.len()));
                None
            }
        }
    }

    /// Report a field that parsed but failed validation
    pub fn corrupt(&self, key: &str, reason: &str) {
        let err = Error::DataCorruption {
            field: key.to_string(),
            reason: reason.to_string(),
        };
        warn!(entity = self.context, "{err}; using default");
    }

    fn typed<T>(&self, key: &str, expected: &str, read: impl Fn(&'a Value) -> Option<T>) -> Option<T> {
        let value = self.map.get(key)?;
        if value.is_null() {
            return None;
        }
        let out = read(value);
        if out.is_none() {
            self.corrupt(key, &format!("expected {expected}, got {}", value.type_name()));
        }
        out
    }
}

/// Three floats as a persisted list
pub fn vec3_value(x: f64, y: f64, z: f64) -> Value {
    Value::List(vec![Value::Float(x), Value::Float(y), Value::Float(z)])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ValueMap {
        let mut map = ValueMap::new();
        map.insert("Age".into(), Value::Int(-24000));
        map.insert("Radius".into(), Value::Float(3.0));
        map.insert("Particle".into(), Value::Int(12));
        map.insert("Pos".into(), vec3_value(1.0, 64.0, -2.5));
        map.insert("Owner".into(), Value::Uuid(Uuid::new_v4()));
        map
    }

    #[test]
    fn test_ron_codec_preserves_fields() {
        let map = sample();
        let blob = RonCodec.write_attributes(&map).unwrap();
        let back = RonCodec.read_attributes(&blob).unwrap();
        assert_eq!(back.get("Age"), Some(&Value::Int(-24000)));
        assert_eq!(back.get("Radius"), Some(&Value::Float(3.0)));
        assert_eq!(back.keys().collect::<Vec<_>>(), map.keys().collect::<Vec<_>>());
    }

    #[test]
    fn test_bincode_codec_preserves_fields() {
        let map = sample();
        let blob = BincodeCodec.write_attributes(&map).unwrap();
        assert_eq!(BincodeCodec.read_attributes(&blob).unwrap(), map);
    }

    #[test]
    fn test_garbage_blob_is_codec_error() {
        assert!(matches!(
            RonCodec.read_attributes(b"{ not ron"),
            Err(Error::Codec(_))
        ));
        assert!(matches!(
            RonCodec.read_attributes(&[0xff, 0xfe]),
            Err(Error::Codec(_))
        ));
    }

    #[test]
    fn test_reader_skips_corrupt_fields() {
        let map = sample();
        let reader = FieldReader::new(&map, "cloud");
        assert_eq!(reader.int32("Age", 0), -24000);
        assert_eq!(reader.float32("Radius", 0.5), 3.0);
        // wrong shape falls back
        assert_eq!(reader.string("Particle"), None);
        assert_eq!(reader.float("Age", 1.0), -24000.0);
        assert!(!reader.bool("Age", false));
        // missing
        assert_eq!(reader.int("Duration", 600), 600);
        assert_eq!(reader.vec3("Pos"), Some([1.0, 64.0, -2.5]));
        assert!(reader.uuid("Owner").is_some());
    }

    #[test]
    fn test_reader_saturates_int32() {
        let mut map = ValueMap::new();
        map.insert("Duration".into(), Value::Int(i64::MAX));
        assert_eq!(FieldReader::new(&map, "cloud").int32("Duration", 0), i32::MAX);
    }
}
