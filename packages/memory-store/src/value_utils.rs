//! Realtime-store semantics on top of a `Value` tree.
//!
//! The store never holds nulls or empty maps: writing either one deletes,
//! and deleting the last child of a map deletes the map too. That keeps
//! "deleted" and "never written" indistinguishable, which is what readers
//! of the store expect.

use std::collections::BTreeMap;

use clinicdb_core::{Error, Path, Value};

/// Read the value at `path`. Absent and null are both `None`.
pub fn read(tree: &Value, path: &Path) -> Option<Value> {
    tree.get(path).filter(|v| !v.is_null()).cloned()
}

/// Overwrite the value at `path`.
///
/// The value is normalized first; if nothing is left, this is a delete.
pub fn write(tree: &mut Value, path: &Path, value: Value) -> Result<(), Error> {
    match value.normalized() {
        Some(value) => tree.set(path, value),
        None => {
            delete(tree, path);
            Ok(())
        }
    }
}

/// Remove the value at `path` and any ancestors left empty.
pub fn delete(tree: &mut Value, path: &Path) {
    if tree.remove(path).is_some() {
        prune(tree, path);
    }
}

/// Resolve an update patch into absolute paths below `base`.
///
/// Patch keys may be multi-segment relative paths. A key that is a prefix of
/// another key in the same patch is rejected, since the result would depend
/// on application order.
pub fn resolve_patch(
    base: &Path,
    patch: BTreeMap<String, Value>,
) -> Result<Vec<(Path, Value)>, Error> {
    let mut resolved = Vec::with_capacity(patch.len());
    for (key, value) in patch {
        let relative = Path::parse(&key)?;
        if relative.is_empty() {
            return Err(Error::InvalidData {
                path: base.clone(),
                message: "update keys must not be empty".to_string(),
            });
        }
        resolved.push((base.join(&relative)?, value));
    }

    for (i, (a, _)) in resolved.iter().enumerate() {
        if let Some((b, _)) = resolved.iter().skip(i + 1).find(|(b, _)| a.is_related(b)) {
            return Err(Error::InvalidData {
                path: base.clone(),
                message: format!("update keys '{}' and '{}' overlap", a, b),
            });
        }
    }

    Ok(resolved)
}

/// Apply a resolved patch. Each entry is an independent overwrite.
pub fn merge(tree: &mut Value, entries: Vec<(Path, Value)>) -> Result<(), Error> {
    for (path, value) in entries {
        write(tree, &path, value)?;
    }
    Ok(())
}

/// Walk up from `path`, removing containers that have become empty.
fn prune(tree: &mut Value, path: &Path) {
    let mut current = path.parent();
    while let Some(ancestor) = current {
        let empty = match tree.get(&ancestor) {
            Some(Value::Map(map)) => map.is_empty(),
            Some(Value::Array(arr)) => arr.iter().all(Value::is_null),
            _ => false,
        };
        if !empty {
            return;
        }
        if ancestor.is_empty() {
            *tree = Value::Null;
            return;
        }
        tree.remove(&ancestor);
        current = ancestor.parent();
    }
}
