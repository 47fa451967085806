//! value representation
//!
//! Every document payload is kept as a [Value] between loading and rendering. It contains the following data types
//! - null
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//!
//! Being self-describing lets merging ([Value::merge]) and pruning ([crate::normalize]) work on any payload
//! without knowing the provisioning schema.
//!
//! Every type has a zero value (see [Value::is_zero]). Zero means "absent": merging never lets a zero value
//! override something and normalization removes object entries holding one.
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

pub type Object = indexmap::IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

impl Value {
    /// Empty object
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// Is this the zero value of its type
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(value) => !value,
            Value::Integer(value) => *value == 0,
            Value::Decimal(value) => *value == 0.0,
            Value::String(value) => value.is_empty(),
            Value::Array(value) => value.is_empty(),
            Value::Object(value) => value.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Follow a path of object keys
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        path.iter()
            .try_fold(self, |current, key| current.as_object()?.get(*key))
    }

    /// Follow a path of object keys mutably
    pub fn pointer_mut(&mut self, path: &[&str]) -> Option<&mut Value> {
        path.iter()
            .try_fold(self, |current, key| current.as_object_mut()?.get_mut(*key))
    }

    /// Deep merge `other` into `self`
    ///
    /// - objects merge key by key, keys only known to `other` are appended
    /// - arrays concatenate, `self` first. Duplicates are kept.
    /// - anything else: `other` replaces `self` unless it is zero
    pub fn merge(&mut self, other: Value) {
        match (self, other) {
            (Value::Object(target), Value::Object(source)) => {
                for (key, value) in source {
                    match target.get_mut(&key) {
                        Some(existing) => existing.merge(value),
                        None => {
                            target.insert(key, value);
                        }
                    }
                }
            }
            (Value::Array(target), Value::Array(source)) => target.extend(source),
            (target, source) => {
                if !source.is_zero() {
                    *target = source;
                }
            }
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<serde_yaml::Number> for Value {
    fn from(value: serde_yaml::Number) -> Self {
        if let Some(int) = value.as_i64() {
            return Value::Integer(int);
        }

        // large unsigned integers do not fit i64 and degrade to decimals
        Value::Decimal(value.as_f64().unwrap_or(f64::NAN))
    }
}

impl From<serde_yaml::Mapping> for Value {
    fn from(value: serde_yaml::Mapping) -> Self {
        Value::Object(
            value
                .into_iter()
                .map(|(k, v)| (object_key(k), v.into()))
                .collect(),
        )
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Value {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Value::Null,
            Yaml::Bool(b) => b.into(),
            Yaml::Number(n) => n.into(),
            Yaml::String(s) => s.into(),
            Yaml::Sequence(a) => a.into(),
            Yaml::Mapping(m) => m.into(),
            Yaml::Tagged(tagged) => tagged.value.into(),
        }
    }
}

/// Textual form of a yaml mapping key
fn object_key(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::Null => String::new(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Number(n) => n.to_string(),
        Yaml::String(s) => s,
        Yaml::Tagged(tagged) => object_key(tagged.value),
        complex => serde_yaml::to_string(&complex)
            .map(|key| key.trim_end().to_string())
            .unwrap_or_default(),
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

impl<'de> serde::de::Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        serde_yaml::Value::deserialize(deserializer).map(Into::into)
    }
}

/// Convert any serializable structure into a [Value]
pub fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, serde_yaml::Error> {
    serde_yaml::to_value(value).map(Into::into)
}

/// Convert a [Value] into a typed structure
pub fn from_value<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, serde_yaml::Error> {
    serde_yaml::from_value(serde_yaml::to_value(value)?)
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn yaml(input: &str) -> Value {
        serde_yaml::from_str(input).expect("valid yaml")
    }

    #[test]
    fn zero_values() {
        for zero in ["~", "false", "0", "0.0", "''", "[]", "{}"] {
            assert!(yaml(zero).is_zero(), "{zero} must be zero");
        }

        for non_zero in ["true", "1", "-0.5", "a", "[0]", "{a: ~}"] {
            assert!(!yaml(non_zero).is_zero(), "{non_zero} must not be zero");
        }
    }

    #[test]
    fn merge_concatenates_arrays() {
        let mut target = yaml("units: [a, b]");
        target.merge(yaml("units: [b, c]"));

        assert_eq!(target, yaml("units: [a, b, b, c]"));
    }

    #[test]
    fn merge_overrides_scalars_unless_zero() {
        let mut target = yaml("{name: parent, enable: true, mode: 420}");
        target.merge(yaml("{name: child, enable: false, mode: ~}"));

        assert_eq!(target, yaml("{name: child, enable: true, mode: 420}"));
    }

    #[test]
    fn merge_recurses_into_objects_and_keeps_order() {
        let mut target = yaml("{storage: {files: [a]}, systemd: {units: [x]}}");
        target.merge(yaml("{passwd: {users: [u]}, storage: {files: [b], disks: [d]}}"));

        assert_eq!(
            target,
            yaml("{storage: {files: [a, b], disks: [d]}, systemd: {units: [x]}, passwd: {users: [u]}}")
        );

        let keys: Vec<_> = target.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["storage", "systemd", "passwd"]);
    }

    #[test]
    fn merge_replaces_on_shape_mismatch() {
        let mut target = yaml("{a: text}");
        target.merge(yaml("{a: [1]}"));
        assert_eq!(target, yaml("{a: [1]}"));
    }

    #[test]
    fn pointer() {
        let value = yaml("{a: {b: {c: 1}}}");
        assert_eq!(value.pointer(&["a", "b", "c"]), Some(&Value::Integer(1)));
        assert_eq!(value.pointer(&["a", "x"]), None);
    }

    #[test]
    fn typed_round_trip_through_value() {
        #[derive(serde::Deserialize, serde::Serialize, Debug, PartialEq)]
        struct Unit {
            name: String,
            enable: bool,
        }

        let value = yaml("{name: foo.service, enable: true}");
        let unit: Unit = from_value(&value).unwrap();
        assert_eq!(
            unit,
            Unit {
                name: "foo.service".into(),
                enable: true
            }
        );
        assert_eq!(to_value(&unit).unwrap(), value);
    }
}
