//! GraphQL documents generated from an entity schema.
//!
//! Mirrors the backend's generated operations: `list<Plural>`, `get<Name>`,
//! `create<Name>`, `update<Name>` and `delete<Name>`, each selecting the
//! schema's scalar fields plus the bookkeeping fields.

use serde_json::Value;
use template_admin_model::{BOOKKEEPING_FIELDS, EntitySchema, FieldType};

use crate::api::GraphqlRequest;

/// The five remote operations the gateway issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOp {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl RemoteOp {
    fn verb(self) -> &'static str {
        match self {
            RemoteOp::List => "list",
            RemoteOp::Get => "get",
            RemoteOp::Create => "create",
            RemoteOp::Update => "update",
            RemoteOp::Delete => "delete",
        }
    }

    fn noun(self, schema: &EntitySchema) -> &str {
        match self {
            RemoteOp::List => &schema.plural_name,
            _ => &schema.name,
        }
    }

    /// Field under which the response `data` carries the result, e.g. `listTemplates`.
    pub fn root_field(self, schema: &EntitySchema) -> String {
        format!("{}{}", self.verb(), self.noun(schema))
    }

    /// Operation name, e.g. `ListTemplates`.
    pub fn operation_name(self, schema: &EntitySchema) -> String {
        let verb = self.verb();
        let mut name = String::with_capacity(verb.len() + schema.plural_name.len());
        name.push_str(&verb[..1].to_ascii_uppercase());
        name.push_str(&verb[1..]);
        name.push_str(self.noun(schema));
        name
    }

    /// The full query or mutation text.
    pub fn document(self, schema: &EntitySchema) -> String {
        let op = self.operation_name(schema);
        let root = self.root_field(schema);
        let name = &schema.name;

        match self {
            RemoteOp::List => format!(
                "query {op}(\n  $filter: Model{name}FilterInput\n  $limit: Int\n  $nextToken: String\n) {{\n  \
                 {root}(filter: $filter, limit: $limit, nextToken: $nextToken) {{\n    items {{\n{fields}\n    }}\n    \
                 nextToken\n    startedAt\n  }}\n}}\n",
                fields = selection_set(schema, "      ")
            ),
            RemoteOp::Get => format!(
                "query {op}($id: ID!) {{\n  {root}(id: $id) {{\n{fields}\n  }}\n}}\n",
                fields = selection_set(schema, "    ")
            ),
            RemoteOp::Create | RemoteOp::Update | RemoteOp::Delete => format!(
                "mutation {op}(\n  $input: {op}Input!\n  $condition: Model{name}ConditionInput\n) {{\n  \
                 {root}(input: $input, condition: $condition) {{\n{fields}\n  }}\n}}\n",
                fields = selection_set(schema, "    ")
            ),
        }
    }

    /// Builds the request for this operation with `variables`.
    pub fn request(self, schema: &EntitySchema, variables: Value) -> GraphqlRequest {
        GraphqlRequest {
            query: self.document(schema),
            operation_name: self.operation_name(schema),
            variables,
        }
    }
}

/// Whether a field can be selected without a sub-selection.
pub fn is_scalar_field(field_type: &FieldType) -> bool {
    !matches!(field_type, FieldType::Model(_) | FieldType::NonModel(_))
}

fn selection_set(schema: &EntitySchema, indent: &str) -> String {
    schema
        .fields
        .iter()
        .filter(|f| is_scalar_field(&f.field_type))
        .map(|f| f.name.as_str())
        .chain(BOOKKEEPING_FIELDS)
        .map(|name| format!("{indent}{name}"))
        .collect::<Vec<_>>()
        .join("\n")
}
