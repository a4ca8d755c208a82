//! Lookup of entity schemas by plural resource name.

use std::collections::HashMap;

use crate::error::{SchemaError, SchemaResult};
use crate::schema::{EntitySchema, SchemaDocument};

/// Plural resource name → entity schema.
///
/// Built once at startup and shared read-only for the life of the process.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, EntitySchema>,
    version: String,
}

impl SchemaRegistry {
    /// Indexes every model of the document by its plural name.
    pub fn from_document(document: SchemaDocument) -> SchemaResult<Self> {
        let mut schemas = HashMap::with_capacity(document.models.len());
        for schema in document.models.into_values() {
            if schemas.contains_key(&schema.plural_name) {
                return Err(SchemaError::Invalid(format!(
                    "plural name \"{}\" is used by more than one model",
                    schema.plural_name
                )));
            }
            schemas.insert(schema.plural_name.clone(), schema);
        }

        Ok(Self {
            schemas,
            version: document.version,
        })
    }

    /// Registry over explicitly constructed schemas, with no fingerprint.
    pub fn from_schemas(schemas: impl IntoIterator<Item = EntitySchema>) -> Self {
        Self {
            schemas: schemas
                .into_iter()
                .map(|s| (s.plural_name.clone(), s))
                .collect(),
            version: String::new(),
        }
    }

    /// Registry over the embedded `Template` schema.
    pub fn builtin() -> SchemaResult<Self> {
        Self::from_document(SchemaDocument::builtin()?)
    }

    /// Resolves a plural resource name to its schema.
    pub fn lookup(&self, resource: &str) -> SchemaResult<&EntitySchema> {
        self.schemas
            .get(resource)
            .ok_or_else(|| SchemaError::UnknownResource(resource.to_string()))
    }

    /// Registered plural names, sorted.
    pub fn resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// The schema fingerprint the document was generated with.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
