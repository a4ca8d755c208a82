//! Entity schemas and the schema document they are loaded from.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::SchemaResult;
use crate::record::VERSION_FIELD;

/// The schema document the admin UI ships with (a single `Template` model).
const BUILTIN_SCHEMA: &str = include_str!("../schema/models.json");

/// The semantic type of a schema field.
///
/// Serialized the way the backend's generated schema writes it: scalar types
/// as bare strings (`"ID"`, `"Int"`, `"AWSDateTime"`), references as objects
/// (`{"model": "Post"}`, `{"enum": "Status"}`, `{"nonModel": "Address"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawFieldType", into = "RawFieldType")]
pub enum FieldType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    /// Any other named scalar (`AWSDateTime`, `AWSTimestamp`, `AWSJSON`, ...).
    Scalar(String),
    Model(String),
    Enum(String),
    NonModel(String),
}

impl FieldType {
    /// True for types whose values sort numerically.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldType::Int | FieldType::Float)
    }

    /// The type name as it appears in the schema document.
    pub fn name(&self) -> &str {
        match self {
            FieldType::Id => "ID",
            FieldType::String => "String",
            FieldType::Int => "Int",
            FieldType::Float => "Float",
            FieldType::Boolean => "Boolean",
            FieldType::Scalar(name)
            | FieldType::Model(name)
            | FieldType::Enum(name)
            | FieldType::NonModel(name) => name,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawFieldType {
    Name(String),
    Model {
        model: String,
    },
    Enum {
        #[serde(rename = "enum")]
        name: String,
    },
    NonModel {
        #[serde(rename = "nonModel")]
        name: String,
    },
}

impl From<RawFieldType> for FieldType {
    fn from(raw: RawFieldType) -> Self {
        match raw {
            RawFieldType::Name(name) => match name.as_str() {
                "ID" => FieldType::Id,
                "String" => FieldType::String,
                "Int" => FieldType::Int,
                "Float" => FieldType::Float,
                "Boolean" => FieldType::Boolean,
                _ => FieldType::Scalar(name),
            },
            RawFieldType::Model { model } => FieldType::Model(model),
            RawFieldType::Enum { name } => FieldType::Enum(name),
            RawFieldType::NonModel { name } => FieldType::NonModel(name),
        }
    }
}

impl From<FieldType> for RawFieldType {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Model(model) => RawFieldType::Model { model },
            FieldType::Enum(name) => RawFieldType::Enum { name },
            FieldType::NonModel(name) => RawFieldType::NonModel { name },
            other => RawFieldType::Name(other.name().to_string()),
        }
    }
}

/// One field of an entity schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    /// Defaults to the key the field is declared under.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_array: bool,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default)]
    pub attributes: Vec<serde_json::Value>,
}

impl FieldDef {
    /// An optional, non-array field of the given type.
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            is_array: false,
            field_type,
            is_required: false,
            attributes: Vec::new(),
        }
    }

    /// Shorthand for a required `ID` field.
    pub fn id(name: &str) -> Self {
        Self::new(name, FieldType::Id).required()
    }

    /// Shorthand for a `String` field.
    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    /// Shorthand for an `Int` field.
    pub fn int(name: &str) -> Self {
        Self::new(name, FieldType::Int)
    }

    /// Shorthand for a `Float` field.
    pub fn float(name: &str) -> Self {
        Self::new(name, FieldType::Float)
    }

    /// Shorthand for a `Boolean` field.
    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Marks the field as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.is_required = true;
        self
    }

    /// Marks the field as a list of its type.
    #[must_use]
    pub fn array(mut self) -> Self {
        self.is_array = true;
        self
    }
}

/// Static description of one record type.
///
/// Field order is the declaration order of the schema document and is
/// preserved on round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySchema {
    pub name: String,
    pub plural_name: String,
    #[serde(with = "ordered_fields")]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub syncable: bool,
    #[serde(default)]
    pub attributes: Vec<serde_json::Value>,
}

impl EntitySchema {
    pub fn new(name: &str, plural_name: &str, fields: Vec<FieldDef>) -> Self {
        Self {
            name: name.into(),
            plural_name: plural_name.into(),
            fields,
            syncable: true,
            attributes: Vec::new(),
        }
    }

    /// Looks up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Declared field names, in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| f.is_required)
    }

    /// The type used to order records by `field`.
    ///
    /// Declared fields use their declared type. `_version` is not declared but
    /// is an integer; every other undeclared field compares as a string.
    pub fn sort_type(&self, field: &str) -> FieldType {
        match self.field(field) {
            Some(def) => def.field_type.clone(),
            None if field == VERSION_FIELD => FieldType::Int,
            None => FieldType::String,
        }
    }
}

mod ordered_fields {
    use super::*;

    pub fn serialize<S: Serializer>(fields: &[FieldDef], serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(fields.len()))?;
        for field in fields {
            map.serialize_entry(&field.name, field)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<FieldDef>, D::Error> {
        struct FieldsVisitor;

        impl<'de> Visitor<'de> for FieldsVisitor {
            type Value = Vec<FieldDef>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to field definition")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut fields = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, mut def)) = access.next_entry::<String, FieldDef>()? {
                    if def.name.is_empty() {
                        def.name = key;
                    }
                    fields.push(def);
                }
                Ok(fields)
            }
        }

        deserializer.deserialize_map(FieldsVisitor)
    }
}

/// The static schema document: every model plus a fingerprint of the
/// schema version it was generated from.
///
/// The fingerprint is carried for diagnostics only; a mismatch with the
/// backend's schema is not detected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaDocument {
    pub models: BTreeMap<String, EntitySchema>,
    #[serde(default)]
    pub enums: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub non_models: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub version: String,
}

impl SchemaDocument {
    /// Parses a schema document from JSON text.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a schema document from a file.
    pub fn from_path(path: &Path) -> SchemaResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The embedded `Template` schema.
    pub fn builtin() -> SchemaResult<Self> {
        Self::from_json(BUILTIN_SCHEMA)
    }
}
