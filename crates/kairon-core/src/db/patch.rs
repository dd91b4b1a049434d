use crate::{
    db::Record,
    error::{Error, ErrorClass, ErrorOrigin},
    value::Value,
};
use std::collections::BTreeMap;

///
/// UpdatePatch
///
/// Ordered field-level replacements keyed by dotted storage path.
/// `"stock"` replaces a top-level field; `"address.city"` replaces a field
/// one map deeper, creating the intermediate map if it is absent.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdatePatch {
    ops: Vec<(String, Value)>,
}

impl UpdatePatch {
    #[must_use]
    pub const fn new() -> Self {
        Self { ops: Vec::new() }
    }

    #[must_use]
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.ops.push((path.into(), value.into()));
        self
    }

    pub fn push(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        self.ops.push((path.into(), value.into()));
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether any replacement targets `path` exactly.
    #[must_use]
    pub fn touches(&self, path: &str) -> bool {
        self.ops.iter().any(|(p, _)| p == path)
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.ops.iter().rev().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.ops.iter().map(|(p, v)| (p.as_str(), v))
    }

    /// Apply every replacement in order.
    pub fn apply_to(&self, record: &mut Record) -> Result<(), Error> {
        for (path, value) in &self.ops {
            apply_path(record, path, value.clone())?;
        }

        Ok(())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for UpdatePatch {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            ops: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

fn apply_path(record: &mut Record, path: &str, value: Value) -> Result<(), Error> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid_path(path, "empty path segment"));
    }

    let (last, parents) = segments
        .split_last()
        .ok_or_else(|| invalid_path(path, "empty path"))?;

    let mut target: &mut BTreeMap<String, Value> = record;
    for segment in parents {
        let slot = target
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Map(BTreeMap::new()));

        target = match slot {
            Value::Map(map) => map,
            other => {
                return Err(invalid_path(
                    path,
                    &format!("'{segment}' holds {} rather than a map", other.kind_label()),
                ));
            }
        };
    }

    target.insert((*last).to_string(), value);

    Ok(())
}

fn invalid_path(path: &str, reason: &str) -> Error {
    Error::new(
        ErrorClass::InvalidInput,
        ErrorOrigin::Store,
        format!("invalid update path '{path}': {reason}"),
    )
}
