use crate::value::Value;
use chrono::{DateTime, Utc};
use derive_more::{Deref, DerefMut, From};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

///
/// CONSTANTS
///

/// Key under which every returned record carries its identifier.
pub const ID_FIELD: &str = "id";

/// Creation timestamp, backfilled from the backend when the payload lacks it.
pub const CREATION_DATE_FIELD: &str = "creation_date";

/// Modification timestamp, backfilled from the backend when the payload lacks it.
pub const MODIFICATION_DATE_FIELD: &str = "modification_date";

///
/// Record
///
/// Opaque attribute map for one persisted entity.
/// Never typed at the storage layer.
///

#[derive(Clone, Debug, Default, Deref, DerefMut, From, PartialEq)]
pub struct Record(BTreeMap<String, Value>);

impl Record {
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get(ID_FIELD).and_then(Value::as_text)
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Resolve a dotted path (`address.city`) through nested maps.
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;

        for segment in segments {
            match current {
                Value::Map(map) => current = map.get(segment)?,
                _ => return None,
            }
        }

        Some(current)
    }

    /// Merge write timestamps. Values the payload already carries win;
    /// an explicit null counts as absent.
    pub fn backfill_timestamps(&mut self, created: DateTime<Utc>, modified: DateTime<Utc>) {
        for (field, at) in [
            (CREATION_DATE_FIELD, created),
            (MODIFICATION_DATE_FIELD, modified),
        ] {
            let slot = self.0.entry(field.to_string()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::Timestamp(at);
            }
        }
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

///
/// Document
///
/// One stored record as the backend returns it, with the write metadata
/// the backend owns.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Record,
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Document {
    /// Caller-facing record: payload plus `id` and backfilled timestamps.
    #[must_use]
    pub fn into_record(self) -> Record {
        let mut record = self.data;
        record.insert(ID_FIELD.to_string(), Value::Text(self.id));
        record.backfill_timestamps(self.create_time, self.update_time);

        record
    }

    /// Whether the soft-delete flag at `deleted_field` is set.
    #[must_use]
    pub fn is_soft_deleted(&self, deleted_field: Option<&str>) -> bool {
        deleted_field
            .and_then(|field| self.data.get_path(field))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

///
/// WriteResult
/// Backend acknowledgement of a single write.
///

#[derive(Clone, Debug, PartialEq)]
pub struct WriteResult {
    pub id: String,
    pub update_time: DateTime<Utc>,
}
