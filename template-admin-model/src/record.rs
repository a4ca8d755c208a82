//! Records as the backend returns them, with typed access to the bookkeeping fields.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "id";
pub const VERSION_FIELD: &str = "_version";
pub const DELETED_FIELD: &str = "_deleted";
pub const LAST_CHANGED_AT_FIELD: &str = "_lastChangedAt";
pub const CREATED_AT_FIELD: &str = "createdAt";
pub const UPDATED_AT_FIELD: &str = "updatedAt";

/// Fields the backend manages on every record, beyond the schema's own.
pub const BOOKKEEPING_FIELDS: [&str; 5] = [
    VERSION_FIELD,
    DELETED_FIELD,
    LAST_CHANGED_AT_FIELD,
    CREATED_AT_FIELD,
    UPDATED_AT_FIELD,
];

/// A record as the backend returns it: field name → JSON value.
///
/// Schema fields and bookkeeping fields (`_version`, `_deleted`,
/// `_lastChangedAt`, `createdAt`, `updatedAt`) live side by side in the same
/// map, exactly as they come over the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Wraps a JSON value. Returns `None` unless it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Extract a string field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Extract a boolean field.
    pub fn get_bool(&self, field: &str) -> Option<bool> {
        self.get(field).and_then(Value::as_bool)
    }

    /// Extract a numeric field.
    pub fn get_number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(Value::as_f64)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// Builder-style [`Record::insert`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: Value) -> Self {
        self.insert(field, value);
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.get_str(ID_FIELD)
    }

    /// The optimistic-concurrency version the backend last assigned.
    pub fn version(&self) -> Option<i64> {
        self.get(VERSION_FIELD).and_then(Value::as_i64)
    }

    /// Whether the backend has tombstoned this record.
    pub fn is_deleted(&self) -> bool {
        self.get_bool(DELETED_FIELD).unwrap_or(false)
    }

    /// `_lastChangedAt` is epoch milliseconds.
    pub fn last_changed_at(&self) -> Option<DateTime<Utc>> {
        self.get(LAST_CHANGED_AT_FIELD)
            .and_then(Value::as_i64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.rfc3339(CREATED_AT_FIELD)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.rfc3339(UPDATED_AT_FIELD)
    }

    fn rfc3339(&self, field: &str) -> Option<DateTime<Utc>> {
        self.get_str(field)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        record.into_value()
    }
}
