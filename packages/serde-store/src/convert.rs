//! Conversions between Value and serde types.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use clinicdb_core::{Error, Value};

/// Convert a Value to a Rust type via serde.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    // Convert Value to serde_json::Value first, then deserialize
    let json = value_to_json(value);
    serde_json::from_value(json).map_err(|e| Error::decode(e.to_string()))
}

/// Convert a Rust type to a Value via serde.
pub fn to_value<T: Serialize + ?Sized>(data: &T) -> Result<Value, Error> {
    // Serialize to serde_json::Value first, then convert to Value
    let json = serde_json::to_value(data).map_err(|e| Error::encode(e.to_string()))?;
    Ok(json_to_value(json))
}

/// Convert a Rust type to an update patch.
///
/// The type must serialize to a map (a struct or a map type); anything else
/// cannot be merged into a record.
pub fn to_patch<T: Serialize + ?Sized>(data: &T) -> Result<BTreeMap<String, Value>, Error> {
    match to_value(data)? {
        Value::Map(map) => Ok(map),
        other => Err(Error::invalid_request(format!(
            "update payload must be a map, got {}",
            kind(&other)
        ))),
    }
}

/// Convert our Value to serde_json::Value.
pub fn value_to_json(value: Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(b),
        Value::Integer(i) => serde_json::Value::Number(i.into()),
        Value::Float(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s),
        Value::Array(arr) => serde_json::Value::Array(arr.into_iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}

/// Convert serde_json::Value to our Value.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                // Fallback for very large numbers
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Integer(_) | Value::Float(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Map(_) => "a map",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Patient {
        name: String,
        age: u32,
        admitted: bool,
    }

    #[test]
    fn roundtrip_struct() {
        let original = Patient {
            name: "Asha".to_string(),
            age: 34,
            admitted: true,
        };

        let value = to_value(&original).unwrap();
        let recovered: Patient = from_value(value).unwrap();

        assert_eq!(original, recovered);
    }

    #[test]
    fn json_to_value_numbers() {
        let json = serde_json::json!({
            "integer": 42,
            "float": 2.75,
            "negative": -100
        });

        let value = json_to_value(json);
        match value {
            Value::Map(map) => {
                assert_eq!(map.get("integer"), Some(&Value::Integer(42)));
                assert_eq!(map.get("negative"), Some(&Value::Integer(-100)));
                if let Some(Value::Float(f)) = map.get("float") {
                    assert!((f - 2.75).abs() < 0.001);
                } else {
                    panic!("expected float");
                }
            }
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn value_to_json_nan_becomes_null() {
        assert_eq!(value_to_json(Value::Float(f64::NAN)), serde_json::Value::Null);
    }

    #[test]
    fn value_to_json_map() {
        let mut map = BTreeMap::new();
        map.insert("key".to_string(), Value::String("value".to_string()));
        map.insert("num".to_string(), Value::Integer(42));

        let json = value_to_json(Value::Map(map));
        assert_eq!(json, serde_json::json!({"key": "value", "num": 42}));
    }

    #[test]
    fn json_to_value_array() {
        let value = json_to_value(serde_json::json!([1, "two", true]));
        assert_eq!(
            value,
            Value::Array(vec![
                Value::Integer(1),
                Value::String("two".to_string()),
                Value::Bool(true),
            ])
        );
    }

    #[test]
    fn from_value_error() {
        let value = Value::String("not a struct".to_string());
        let result: Result<Patient, _> = from_value(value);
        assert!(matches!(result, Err(Error::Decode { .. })));
    }

    #[test]
    fn to_patch_requires_a_map() {
        let patch = to_patch(&serde_json::json!({"status": "booked", "slot": 3})).unwrap();
        assert_eq!(patch.get("status"), Some(&Value::from("booked")));
        assert_eq!(patch.get("slot"), Some(&Value::Integer(3)));

        let err = to_patch(&"booked").unwrap_err();
        assert!(err.to_string().contains("must be a map"));
        assert!(err.to_string().contains("a string"));
    }

    #[test]
    fn roundtrip_option() {
        let some_converted = to_value(&Some(42)).unwrap();
        let none_converted = to_value(&Option::<i32>::None).unwrap();

        assert_eq!(none_converted, Value::Null);
        let some_recovered: Option<i32> = from_value(some_converted).unwrap();
        let none_recovered: Option<i32> = from_value(none_converted).unwrap();

        assert_eq!(some_recovered, Some(42));
        assert_eq!(none_recovered, None);
    }
}
