//! Entity model for the Template admin data layer.
//!
//! Defines the types every other crate in the workspace depends on:
//! - [`EntitySchema`]: one record type's ordered field definitions
//! - [`SchemaDocument`]: the static, fingerprinted schema document loaded at startup
//! - [`SchemaRegistry`]: plural resource name → schema lookup
//! - [`Record`]: a record as returned by the backend, bookkeeping fields included
//!
//! The registry is built once and shared read-only; nothing in this crate
//! performs I/O beyond reading a schema file from disk.

mod error;
mod record;
mod registry;
mod schema;

pub use error::{SchemaError, SchemaResult};
pub use record::{
    BOOKKEEPING_FIELDS, CREATED_AT_FIELD, DELETED_FIELD, ID_FIELD, LAST_CHANGED_AT_FIELD, Record,
    UPDATED_AT_FIELD, VERSION_FIELD,
};
pub use registry::SchemaRegistry;
pub use schema::{EntitySchema, FieldDef, FieldType, SchemaDocument};
