//! The data provider: the single entry point the admin UI calls.
//!
//! Every request names a resource and an [`Operation`]. Reads fetch the
//! whole collection through the gateway and filter, sort and page it in
//! memory; writes go straight to the gateway.
//!
//! Batch writes (`UpdateMany`, `DeleteMany`) run their per-id calls
//! concurrently and wait for all of them. If any fails, the first failure (in
//! id order) is returned and the writes that succeeded stay committed: there
//! is no rollback.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use template_admin_model::{EntitySchema, ID_FIELD, Record, SchemaRegistry};
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::filter::{Filter, FilterSpec};
use crate::gateway::RecordGateway;
use crate::sort::{Pagination, SortSpec, paginate, select_page, sort_records};

/// Parameters shared by the list-style reads.
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub filter: Option<Filter>,
    pub sort: SortSpec,
    /// `None` returns every matching record.
    pub pagination: Option<Pagination>,
}

/// One request against a resource.
#[derive(Debug, Clone)]
pub enum Operation {
    List(ListParams),
    Get {
        id: String,
    },
    GetMany {
        ids: Vec<String>,
    },
    /// A list constrained to records whose `target` field equals `id`.
    GetManyReference {
        target: String,
        id: Value,
        params: ListParams,
    },
    Update {
        id: String,
        data: Record,
    },
    UpdateMany {
        ids: Vec<String>,
        data: Record,
    },
    Create {
        data: Record,
    },
    Delete {
        id: String,
    },
    DeleteMany {
        ids: Vec<String>,
    },
}

/// The operation kinds, as named by the admin UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    List,
    Get,
    GetMany,
    GetManyReference,
    Update,
    UpdateMany,
    Create,
    Delete,
    DeleteMany,
}

impl OperationKind {
    pub const ALL: [OperationKind; 9] = [
        OperationKind::List,
        OperationKind::Get,
        OperationKind::GetMany,
        OperationKind::GetManyReference,
        OperationKind::Update,
        OperationKind::UpdateMany,
        OperationKind::Create,
        OperationKind::Delete,
        OperationKind::DeleteMany,
    ];

    /// Resolves a kind name. `getList`/`getOne` are accepted alongside
    /// `list`/`get`. Unknown names resolve to `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "list" | "getList" => Some(OperationKind::List),
            "get" | "getOne" => Some(OperationKind::Get),
            "getMany" => Some(OperationKind::GetMany),
            "getManyReference" => Some(OperationKind::GetManyReference),
            "update" => Some(OperationKind::Update),
            "updateMany" => Some(OperationKind::UpdateMany),
            "create" => Some(OperationKind::Create),
            "delete" => Some(OperationKind::Delete),
            "deleteMany" => Some(OperationKind::DeleteMany),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OperationKind::List => "list",
            OperationKind::Get => "get",
            OperationKind::GetMany => "getMany",
            OperationKind::GetManyReference => "getManyReference",
            OperationKind::Update => "update",
            OperationKind::UpdateMany => "updateMany",
            OperationKind::Create => "create",
            OperationKind::Delete => "delete",
            OperationKind::DeleteMany => "deleteMany",
        }
    }
}

/// Untyped request parameters, as the admin UI sends them.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawParams {
    id: Option<Value>,
    ids: Vec<Value>,
    data: Option<Value>,
    filter: Option<Value>,
    sort: Option<SortSpec>,
    pagination: Option<Pagination>,
    target: Option<String>,
}

impl RawParams {
    fn require_id(&self, kind: OperationKind) -> ProviderResult<String> {
        self.id
            .as_ref()
            .filter(|v| !v.is_null())
            .map(id_string)
            .ok_or_else(|| ProviderError::InvalidParams(format!("{} requires `id`", kind.name())))
    }

    fn ids(&self) -> Vec<String> {
        self.ids.iter().map(id_string).collect()
    }

    fn require_data(&mut self, kind: OperationKind) -> ProviderResult<Record> {
        self.data
            .take()
            .and_then(Record::from_value)
            .ok_or_else(|| {
                ProviderError::InvalidParams(format!("{} requires an object `data`", kind.name()))
            })
    }

    fn list_params(&mut self) -> ProviderResult<ListParams> {
        let filter = match self.filter.take() {
            None | Some(Value::Null) => None,
            Some(value) => Some(Filter::Spec(FilterSpec::from_value(value)?)),
        };
        Ok(ListParams {
            filter,
            sort: self.sort.take().unwrap_or_default(),
            pagination: self.pagination.take(),
        })
    }
}

fn id_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::List(_) => OperationKind::List,
            Operation::Get { .. } => OperationKind::Get,
            Operation::GetMany { .. } => OperationKind::GetMany,
            Operation::GetManyReference { .. } => OperationKind::GetManyReference,
            Operation::Update { .. } => OperationKind::Update,
            Operation::UpdateMany { .. } => OperationKind::UpdateMany,
            Operation::Create { .. } => OperationKind::Create,
            Operation::Delete { .. } => OperationKind::Delete,
            Operation::DeleteMany { .. } => OperationKind::DeleteMany,
        }
    }

    /// Builds an operation from JSON parameters
    /// (`id`, `ids`, `data`, `filter`, `sort`, `pagination`, `target`).
    pub fn from_params(kind: OperationKind, params: Value) -> ProviderResult<Self> {
        let mut raw: RawParams = if params.is_null() {
            RawParams::default()
        } else {
            serde_json::from_value(params).map_err(|e| ProviderError::InvalidParams(e.to_string()))?
        };

        let operation = match kind {
            OperationKind::List => Operation::List(raw.list_params()?),
            OperationKind::Get => Operation::Get {
                id: raw.require_id(kind)?,
            },
            OperationKind::GetMany => Operation::GetMany { ids: raw.ids() },
            OperationKind::GetManyReference => {
                let target = raw.target.take().ok_or_else(|| {
                    ProviderError::InvalidParams("getManyReference requires `target`".into())
                })?;
                let id = raw.id.take().unwrap_or(Value::Null);
                Operation::GetManyReference {
                    target,
                    id,
                    params: raw.list_params()?,
                }
            }
            OperationKind::Update => Operation::Update {
                id: raw.require_id(kind)?,
                data: raw.require_data(kind)?,
            },
            OperationKind::UpdateMany => Operation::UpdateMany {
                ids: raw.ids(),
                data: raw.require_data(kind)?,
            },
            OperationKind::Create => Operation::Create {
                data: raw.require_data(kind)?,
            },
            OperationKind::Delete => Operation::Delete {
                id: raw.require_id(kind)?,
            },
            OperationKind::DeleteMany => Operation::DeleteMany { ids: raw.ids() },
        };
        Ok(operation)
    }
}

/// The response shape of every operation: `{data, total?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    /// A page of records plus the match count before paging.
    List { data: Vec<Record>, total: usize },
    Many { data: Vec<Record> },
    One { data: Record },
    /// Ids a batch write acted on.
    Ids { data: Vec<String> },
}

impl Envelope {
    /// Records carried by a read envelope; empty for batch writes.
    pub fn records(&self) -> &[Record] {
        match self {
            Envelope::List { data, .. } | Envelope::Many { data } => data,
            Envelope::One { data } => std::slice::from_ref(data),
            Envelope::Ids { .. } => &[],
        }
    }

    pub fn total(&self) -> Option<usize> {
        match self {
            Envelope::List { total, .. } => Some(*total),
            _ => None,
        }
    }
}

/// Routes operations to the gateway and the in-memory engines.
///
/// Holds no per-request state; one instance serves every request.
#[derive(Clone)]
pub struct DataProvider {
    registry: Arc<SchemaRegistry>,
    gateway: Arc<dyn RecordGateway>,
}

impl DataProvider {
    pub fn new(registry: Arc<SchemaRegistry>, gateway: Arc<dyn RecordGateway>) -> Self {
        Self { registry, gateway }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Runs `operation` against `resource`.
    ///
    /// An unknown resource fails before the gateway is touched.
    pub async fn execute(&self, resource: &str, operation: Operation) -> ProviderResult<Envelope> {
        let schema = self.registry.lookup(resource)?;
        self.run(schema, operation).await
    }

    /// Runs an operation named by string with JSON parameters.
    ///
    /// An unrecognized `kind` is a no-op and yields `Ok(None)`.
    pub async fn execute_raw(
        &self,
        kind: &str,
        resource: &str,
        params: Value,
    ) -> ProviderResult<Option<Envelope>> {
        let schema = self.registry.lookup(resource)?;
        let Some(kind) = OperationKind::parse(kind) else {
            debug!("Ignoring unknown operation {:?} on {}", kind, resource);
            return Ok(None);
        };
        let operation = Operation::from_params(kind, params)?;
        self.run(schema, operation).await.map(Some)
    }

    async fn run(&self, schema: &EntitySchema, operation: Operation) -> ProviderResult<Envelope> {
        let kind = operation.kind();
        debug!("handle enter: {} {} {:?}", kind.name(), schema.plural_name, operation);

        let result = self.respond(schema, operation).await;
        match &result {
            Ok(envelope) => debug!(
                "handle exit: {} {} ({} record(s))",
                kind.name(),
                schema.plural_name,
                envelope.records().len()
            ),
            Err(e) => debug!("handle error: {} {}: {}", kind.name(), schema.plural_name, e),
        }
        result
    }

    async fn respond(&self, schema: &EntitySchema, operation: Operation) -> ProviderResult<Envelope> {
        match operation {
            Operation::List(params) => self.list(schema, params).await,
            Operation::Get { id } => Ok(Envelope::One {
                data: self.gateway.fetch_one(schema, &id).await?,
            }),
            Operation::GetMany { ids } => {
                let records = self.gateway.fetch_all(schema).await?;
                let ids = ids.into_iter().map(Value::String).collect();
                let spec = FilterSpec::new().with(ID_FIELD, Value::Array(ids));
                Ok(Envelope::Many {
                    data: spec.apply(&records),
                })
            }
            Operation::GetManyReference {
                target,
                id,
                mut params,
            } => {
                params.filter = Some(constrain(params.filter.take(), target, id));
                self.list(schema, params).await
            }
            Operation::Update { id, data } => Ok(Envelope::One {
                data: self.gateway.update_one(schema, &id, &data).await?,
            }),
            Operation::UpdateMany { ids, data } => {
                let outcomes =
                    join_all(ids.iter().map(|id| self.gateway.update_one(schema, id, &data))).await;
                first_failure(schema, "update", &ids, outcomes)?;
                Ok(Envelope::Ids { data: ids })
            }
            Operation::Create { data } => Ok(Envelope::One {
                data: self.gateway.create_one(schema, &data).await?,
            }),
            Operation::Delete { id } => Ok(Envelope::One {
                data: self.gateway.delete_one(schema, &id).await?,
            }),
            Operation::DeleteMany { ids } => {
                let outcomes =
                    join_all(ids.iter().map(|id| self.gateway.delete_one(schema, id))).await;
                first_failure(schema, "delete", &ids, outcomes)?;
                Ok(Envelope::Ids { data: ids })
            }
        }
    }

    async fn list(&self, schema: &EntitySchema, params: ListParams) -> ProviderResult<Envelope> {
        let mut records = self.gateway.fetch_all(schema).await?;

        if let Some(filter) = &params.filter {
            records = filter.apply(&records);
        }
        let total = records.len();

        if let Some(field) = params.sort.field.as_deref() {
            records = sort_records(records, Some(field), params.sort.order, &schema.sort_type(field));
        }

        if let Some(pagination) = params.pagination {
            records = select_page(paginate(records, pagination.per_page), pagination.page);
        }

        Ok(Envelope::List {
            data: records,
            total,
        })
    }
}

/// Adds `target == id` to an optional filter.
fn constrain(filter: Option<Filter>, target: String, id: Value) -> Filter {
    match filter {
        None => Filter::Spec(FilterSpec::new().with(target, id)),
        Some(Filter::Spec(spec)) => Filter::Spec(spec.with(target, id)),
        Some(Filter::Predicate(predicate)) => {
            let reference = FilterSpec::new().with(target, id).compile();
            Filter::predicate(move |record| predicate(record) && reference.matches(record))
        }
    }
}

/// Surfaces the first failed sub-operation of a batch, in id order.
fn first_failure(
    schema: &EntitySchema,
    action: &str,
    ids: &[String],
    outcomes: Vec<ProviderResult<Record>>,
) -> ProviderResult<()> {
    let mut first = None;
    let mut failed = 0usize;

    for (id, outcome) in ids.iter().zip(outcomes) {
        if let Err(e) = outcome {
            warn!("Batch {} of {} {} failed: {}", action, schema.name, id, e);
            failed += 1;
            first.get_or_insert(e);
        }
    }

    match first {
        Some(e) => {
            warn!(
                "Batch {} of {}: {} of {} failed; the rest stay committed",
                action,
                schema.plural_name,
                failed,
                ids.len()
            );
            Err(e)
        }
        None => Ok(()),
    }
}
