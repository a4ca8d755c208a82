//! Remote record gateway: one entity's CRUD against the GraphQL backend.
//!
//! Reads materialize the whole collection: `fetch_all` follows the
//! continuation token until the backend has nothing left, so memory use is
//! bounded only by the collection size. Callers that need scale should push
//! filtering and paging to the backend instead.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use template_admin_model::{EntitySchema, ID_FIELD, Record, VERSION_FIELD};
use tracing::{debug, info, warn};

use crate::api::{ApiClient, ApiFailure, GraphqlError};
use crate::error::{ConflictDetails, FieldDiff, ProviderError, ProviderResult};
use crate::graphql::{RemoteOp, is_scalar_field};

/// Gateway tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Items requested per listing page. `None` leaves it to the backend.
    #[serde(default)]
    pub page_limit: Option<u32>,
}

/// Network-facing CRUD for records of one schema.
#[async_trait]
pub trait RecordGateway: Send + Sync {
    /// Every record of the collection, across all backend pages.
    async fn fetch_all(&self, schema: &EntitySchema) -> ProviderResult<Vec<Record>>;

    /// One record by id.
    async fn fetch_one(&self, schema: &EntitySchema, id: &str) -> ProviderResult<Record>;

    /// Creates a record from the schema fields present in `data`.
    async fn create_one(&self, schema: &EntitySchema, data: &Record) -> ProviderResult<Record>;

    /// Replaces a record's fields. `data` must carry the `_version` it was read at.
    async fn update_one(
        &self,
        schema: &EntitySchema,
        id: &str,
        data: &Record,
    ) -> ProviderResult<Record>;

    /// Deletes a record at its current version. Returns the deleted record.
    async fn delete_one(&self, schema: &EntitySchema, id: &str) -> ProviderResult<Record>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListPage {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    next_token: Option<String>,
}

/// [`RecordGateway`] over a GraphQL [`ApiClient`].
pub struct RemoteGateway<C> {
    client: C,
    config: GatewayConfig,
}

impl<C: ApiClient> RemoteGateway<C> {
    pub fn new(client: C, config: GatewayConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Issues `op` and returns the root field of the response data.
    async fn call(
        &self,
        op: RemoteOp,
        schema: &EntitySchema,
        variables: Value,
    ) -> Result<Value, ApiFailure> {
        let root = op.root_field(schema);
        debug!("{} variables={}", root, variables);
        let mut data = self.client.request(op.request(schema, variables)).await?;
        Ok(data.get_mut(&root).map(Value::take).unwrap_or(Value::Null))
    }

    fn expect_record(op: RemoteOp, schema: &EntitySchema, value: Value) -> ProviderResult<Record> {
        Record::from_value(value).ok_or_else(|| ProviderError::Remote {
            message: format!("{} returned no record", op.root_field(schema)),
            status: 500,
            data: None,
        })
    }
}

#[async_trait]
impl<C: ApiClient> RecordGateway for RemoteGateway<C> {
    async fn fetch_all(&self, schema: &EntitySchema) -> ProviderResult<Vec<Record>> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut variables = Map::new();
            if let Some(limit) = self.config.page_limit {
                variables.insert("limit".into(), json!(limit));
            }
            if let Some(token) = &next_token {
                variables.insert("nextToken".into(), json!(token));
            }

            let root = self
                .call(RemoteOp::List, schema, Value::Object(variables))
                .await
                .map_err(remote_failure)?;
            if root.is_null() {
                return Err(ProviderError::Remote {
                    message: format!("{} returned no page", RemoteOp::List.root_field(schema)),
                    status: 500,
                    data: None,
                });
            }

            let page: ListPage = serde_json::from_value(root)?;
            pages += 1;
            records.extend(page.items.into_iter().filter_map(Record::from_value));

            match page.next_token {
                None => break,
                Some(token) if next_token.as_deref() == Some(token.as_str()) => {
                    warn!("{} repeated continuation token after {} page(s)", schema.plural_name, pages);
                    return Err(ProviderError::Remote {
                        message: format!(
                            "{} returned the same continuation token twice",
                            RemoteOp::List.root_field(schema)
                        ),
                        status: 500,
                        data: None,
                    });
                }
                token => next_token = token,
            }
        }

        debug!(
            "Fetched {} {} across {} page(s)",
            records.len(),
            schema.plural_name,
            pages
        );
        Ok(records)
    }

    async fn fetch_one(&self, schema: &EntitySchema, id: &str) -> ProviderResult<Record> {
        let root = self
            .call(RemoteOp::Get, schema, json!({ "id": id }))
            .await
            .map_err(remote_failure)?;

        Record::from_value(root).ok_or_else(|| ProviderError::NotFound {
            resource: schema.plural_name.clone(),
            id: id.to_string(),
        })
    }

    async fn create_one(&self, schema: &EntitySchema, data: &Record) -> ProviderResult<Record> {
        let draft = submitted_fields(schema, data, true);

        let root = self
            .call(RemoteOp::Create, schema, json!({ "input": draft }))
            .await
            .map_err(remote_failure)?;

        let record = Self::expect_record(RemoteOp::Create, schema, root)?;
        info!("Created {} {}", schema.name, record.id().unwrap_or("<no id>"));
        Ok(record)
    }

    async fn update_one(
        &self,
        schema: &EntitySchema,
        id: &str,
        data: &Record,
    ) -> ProviderResult<Record> {
        let version = data.get(VERSION_FIELD).filter(|v| !v.is_null()).ok_or_else(|| {
            ProviderError::InvalidParams(format!(
                "update of {} {id} requires {VERSION_FIELD}",
                schema.name
            ))
        })?;

        let mut draft = Map::new();
        draft.insert(ID_FIELD.into(), json!(id));
        draft.insert(VERSION_FIELD.into(), version.clone());
        draft.extend(submitted_fields(schema, data, false));

        let root = match self
            .call(RemoteOp::Update, schema, json!({ "input": &draft }))
            .await
        {
            Ok(root) => root,
            Err(ApiFailure::Rejected(errors)) => {
                return Err(update_rejection(schema, id, errors, &draft));
            }
            Err(failure) => return Err(remote_failure(failure)),
        };

        Self::expect_record(RemoteOp::Update, schema, root)
    }

    async fn delete_one(&self, schema: &EntitySchema, id: &str) -> ProviderResult<Record> {
        // the backend authorizes deletes only at the record's current version
        let current = self.fetch_one(schema, id).await?;
        let version = current
            .get(VERSION_FIELD)
            .cloned()
            .ok_or_else(|| ProviderError::Remote {
                message: format!("{} {id} has no {VERSION_FIELD}", schema.name),
                status: 500,
                data: None,
            })?;

        let root = self
            .call(
                RemoteOp::Delete,
                schema,
                json!({ "input": { ID_FIELD: id, VERSION_FIELD: version } }),
            )
            .await
            .map_err(remote_failure)?;

        let record = Record::from_value(root).ok_or_else(|| ProviderError::NotFound {
            resource: schema.plural_name.clone(),
            id: id.to_string(),
        })?;
        info!("Deleted {} {}", schema.name, id);
        Ok(record)
    }
}

/// Schema fields present in `data`, in declaration order.
fn submitted_fields(schema: &EntitySchema, data: &Record, include_id: bool) -> Map<String, Value> {
    schema
        .fields
        .iter()
        .filter(|f| is_scalar_field(&f.field_type))
        .filter(|f| include_id || f.name != ID_FIELD)
        .filter_map(|f| data.get(&f.name).map(|v| (f.name.clone(), v.clone())))
        .collect()
}

fn remote_failure(failure: ApiFailure) -> ProviderError {
    match failure {
        ApiFailure::Transport(message) => ProviderError::Transport(message),
        ApiFailure::Rejected(errors) => {
            let first = errors.into_iter().next().unwrap_or_default();
            ProviderError::Remote {
                message: first.message,
                status: 500,
                data: first.data,
            }
        }
    }
}

fn update_rejection(
    schema: &EntitySchema,
    id: &str,
    errors: Vec<GraphqlError>,
    submitted: &Map<String, Value>,
) -> ProviderError {
    let first = errors.into_iter().next().unwrap_or_default();
    if !first.is_conflict() {
        return remote_failure(ApiFailure::Rejected(vec![first]));
    }

    let server_record = first.data.and_then(Record::from_value);
    let diff = server_record
        .as_ref()
        .map(|current| field_diff(schema, submitted, current))
        .unwrap_or_default();

    let changed_at = server_record
        .as_ref()
        .and_then(Record::last_changed_at)
        .map(|at| at.to_rfc3339())
        .unwrap_or_else(|| "unknown".to_string());
    warn!(
        "Conflict updating {} {}: {} field(s) differ from the version stored at {}",
        schema.name,
        id,
        diff.len(),
        changed_at
    );

    ProviderError::Conflict(ConflictDetails {
        message: first.message,
        server_record,
        diff,
    })
}

/// Submitted schema fields whose value differs from the stored record.
fn field_diff(
    schema: &EntitySchema,
    submitted: &Map<String, Value>,
    current: &Record,
) -> BTreeMap<String, FieldDiff> {
    schema
        .field_names()
        .filter(|name| *name != ID_FIELD)
        .filter_map(|name| {
            let submitted = submitted.get(name)?;
            let current = current.get(name).cloned().unwrap_or(Value::Null);
            (*submitted != current).then(|| {
                (
                    name.to_string(),
                    FieldDiff {
                        submitted: submitted.clone(),
                        current,
                    },
                )
            })
        })
        .collect()
}
