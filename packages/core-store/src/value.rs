//! The Value type - a tree-shaped data structure.
//!
//! Everything the realtime store holds is a `Value`: single records are
//! maps, collections are maps keyed by record id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, Path};

/// A tree-shaped value that can be read from or written to a store.
///
/// # Design Notes
///
/// - Uses `BTreeMap` so a collection iterates in key order; store-generated
///   keys sort by creation time, so that is also insertion order
/// - Uses `i64` for integers, `f64` for everything else numeric
/// - Serializes as plain JSON-shaped data, so a `Value` can be read back
///   through any serde format
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absence of a value. Writing it removes whatever was there.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Key-value map with string keys. Also how collections are stored.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(BTreeMap::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a map (record or collection).
    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    /// Check if this value is an array.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Strip what the store cannot hold.
    ///
    /// Nulls and empty containers disappear; maps and arrays left with no
    /// children disappear with them. `None` means nothing would be stored.
    /// Nulls inside arrays are kept so indices stay stable.
    pub fn normalized(self) -> Option<Value> {
        match self {
            Value::Null => None,
            Value::Map(map) => {
                let map: BTreeMap<String, Value> = map
                    .into_iter()
                    .filter_map(|(k, v)| v.normalized().map(|v| (k, v)))
                    .collect();
                if map.is_empty() {
                    None
                } else {
                    Some(Value::Map(map))
                }
            }
            Value::Array(arr) => {
                let arr: Vec<Value> = arr
                    .into_iter()
                    .map(|v| v.normalized().unwrap_or(Value::Null))
                    .collect();
                if arr.iter().all(Value::is_null) {
                    None
                } else {
                    Some(Value::Array(arr))
                }
            }
            other => Some(other),
        }
    }

    /// Get a reference to a nested value by path.
    ///
    /// Returns `None` if the path doesn't exist or can't be navigated
    /// (e.g., trying to index into a string).
    pub fn get(&self, path: &Path) -> Option<&Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get(component)?,
                Value::Array(arr) => {
                    let index: usize = component.parse().ok()?;
                    arr.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Get a mutable reference to a nested value by path.
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut Value> {
        let mut current = self;
        for component in path.iter() {
            current = match current {
                Value::Map(map) => map.get_mut(component)?,
                Value::Array(arr) => {
                    let index: usize = component.parse().ok()?;
                    arr.get_mut(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set a value at a path, creating intermediate maps as needed.
    ///
    /// A scalar (or null) found on the way is replaced by a map, the same
    /// way the realtime store lets `a/b` be written over a leaf at `a`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path indexes into an array with a key that is
    /// not a valid index.
    pub fn set(&mut self, path: &Path, value: Value) -> Result<(), Error> {
        let mut current = self;

        for component in path.iter() {
            if !current.is_map() && !current.is_array() {
                *current = Value::map();
            }
            current = match current {
                Value::Map(map) => map.entry(component.clone()).or_insert(Value::Null),
                Value::Array(arr) => {
                    let index: usize = component.parse().map_err(|_| Error::InvalidData {
                        path: path.clone(),
                        message: format!("invalid array index: {}", component),
                    })?;
                    if index == arr.len() {
                        arr.push(Value::Null);
                    }
                    arr.get_mut(index).ok_or_else(|| Error::InvalidData {
                        path: path.clone(),
                        message: format!("array index {} out of bounds", index),
                    })?
                }
                _ => {
                    return Err(Error::InvalidData {
                        path: path.clone(),
                        message: format!("cannot set child '{}' on a leaf", component),
                    })
                }
            };
        }

        *current = value;
        Ok(())
    }

    /// Remove a value at a path, returning it if it existed.
    pub fn remove(&mut self, path: &Path) -> Option<Value> {
        let Some(parent_path) = path.parent() else {
            return Some(std::mem::replace(self, Value::Null));
        };
        let last_component = path.last()?;

        match self.get_mut(&parent_path)? {
            Value::Map(map) => map.remove(last_component),
            Value::Array(arr) => {
                let index: usize = last_component.parse().ok()?;
                let slot = arr.get_mut(index)?;
                // Keep sibling indices stable.
                Some(std::mem::replace(slot, Value::Null))
            }
            _ => None,
        }
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(v: BTreeMap<String, Value>) -> Self {
        Value::Map(v)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    #[test]
    fn get_nested_value() {
        let mut value = Value::map();
        value
            .set(&path!("patients/p1/name"), Value::from("Asha"))
            .unwrap();

        assert_eq!(
            value.get(&path!("patients/p1/name")),
            Some(&Value::from("Asha"))
        );
        assert!(value.get(&path!("patients")).unwrap().is_map());
        assert_eq!(value.get(&path!("doctors")), None);
    }

    #[test]
    fn set_replaces_scalars_on_the_way() {
        let mut value = Value::from("leaf");
        value.set(&path!("a/b"), Value::from(1i64)).unwrap();
        assert_eq!(value.get(&path!("a/b")), Some(&Value::from(1i64)));
    }

    #[test]
    fn set_at_root_replaces_everything() {
        let mut value = Value::from_iter([("a", 1i64)]);
        value.set(&Path::root(), Value::from(true)).unwrap();
        assert_eq!(value, Value::Bool(true));
    }

    #[test]
    fn set_into_array_checks_index() {
        let mut value = Value::from(vec!["a", "b"]);
        value.set(&path!("1"), Value::from("c")).unwrap();
        value.set(&path!("2"), Value::from("d")).unwrap();
        assert_eq!(value, Value::from(vec!["a", "c", "d"]));

        assert!(value.set(&path!("9"), Value::from("x")).is_err());
        assert!(value.set(&path!("name"), Value::from("x")).is_err());
    }

    #[test]
    fn remove_works() {
        let mut value = Value::map();
        value.set(&path!("foo/bar"), Value::from("hello")).unwrap();

        let removed = value.remove(&path!("foo/bar"));
        assert_eq!(removed, Some(Value::from("hello")));
        assert_eq!(value.get(&path!("foo/bar")), None);
        assert_eq!(value.remove(&path!("foo/bar")), None);
        assert_eq!(value.remove(&path!("nope/deeper")), None);
    }

    #[test]
    fn normalized_drops_nulls_and_empty_maps() {
        let value = Value::from_iter([
            ("name", Value::from("Asha")),
            ("phone", Value::Null),
            ("address", Value::map()),
            ("tags", Value::from_iter([("x", Value::Null)])),
        ]);
        assert_eq!(
            value.normalized(),
            Some(Value::from_iter([("name", "Asha")]))
        );

        assert_eq!(Value::Null.normalized(), None);
        assert_eq!(Value::map().normalized(), None);
        assert_eq!(
            Value::Array(vec![Value::Null, Value::from(1i64)]).normalized(),
            Some(Value::Array(vec![Value::Null, Value::from(1i64)]))
        );
    }

    #[test]
    fn serde_shape_is_plain_json() {
        let value = Value::from_iter([
            ("name", Value::from("Asha")),
            ("age", Value::from(34i64)),
            ("tags", Value::from(vec!["vip"])),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Asha", "age": 34, "tags": ["vip"]})
        );

        let back: Value = serde_json::from_value(json).unwrap();
        assert_eq!(back, value);
        let null: Value = serde_json::from_str("null").unwrap();
        assert_eq!(null, Value::Null);
        let float: Value = serde_json::from_str("2.5").unwrap();
        assert_eq!(float, Value::Float(2.5));
    }

    #[test]
    fn accessors() {
        assert_eq!(Value::from("x").as_str(), Some("x"));
        assert_eq!(Value::from(3i64).as_i64(), Some(3));
        assert_eq!(Value::from(3i64).as_f64(), Some(3.0));
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert!(Value::map().as_map().is_some());
        assert_eq!(Value::Null.as_str(), None);
    }
}
