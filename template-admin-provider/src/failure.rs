//! Turning a failed save into something the editor can show.
//!
//! The edit form hands its state over explicitly when a save fails; nothing
//! about the last form is remembered between requests.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::error::ProviderError;

/// The edit form's state at the moment a save failed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureContext {
    /// Every value the form held.
    pub values: Map<String, Value>,
    /// Fields the user changed before saving.
    pub dirty_fields: BTreeSet<String>,
}

impl FailureContext {
    pub fn new<I, S>(values: Map<String, Value>, dirty_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values,
            dirty_fields: dirty_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// The user's unsaved edits: each dirty field with its form value.
    pub fn dirty_values(&self) -> Map<String, Value> {
        self.dirty_fields
            .iter()
            .map(|field| {
                let value = self.values.get(field).cloned().unwrap_or(Value::Null);
                (field.clone(), value)
            })
            .collect()
    }

    /// Notification text for a failed save of `label`, carrying the unsaved
    /// edits so the user can re-apply them after reloading.
    pub fn notification(&self, label: &str, error: &ProviderError) -> String {
        format!(
            "Could not update {label}: {error}\n{}",
            Value::Object(self.dirty_values())
        )
    }
}
