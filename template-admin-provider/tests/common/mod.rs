#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use template_admin_model::{EntitySchema, Record, SchemaRegistry, VERSION_FIELD};
use template_admin_provider::{
    ApiClient, ApiFailure, ConflictDetails, GraphqlError, GraphqlRequest, ProviderError,
    ProviderResult, RecordGateway,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn registry() -> SchemaRegistry {
    SchemaRegistry::builtin().unwrap()
}

pub fn template_schema() -> EntitySchema {
    registry().lookup("Templates").unwrap().clone()
}

pub fn record(value: Value) -> Record {
    Record::from_value(value).unwrap()
}

pub fn template(id: &str, site: &str, version: i64) -> Record {
    record(json!({
        "id": id,
        "site": site,
        "facility": null,
        "_version": version,
        "_deleted": null,
        "_lastChangedAt": 1_600_000_000_000i64 + version,
    }))
}

pub fn ids(records: &[Record]) -> Vec<&str> {
    records.iter().map(|r| r.id().unwrap_or("")).collect()
}

// ── Scripted API client ──────────────────────────────────────────

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedClient {
    responses: Mutex<VecDeque<Result<Value, ApiFailure>>>,
    requests: Mutex<Vec<GraphqlRequest>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_data(&self, data: Value) {
        self.responses.lock().unwrap().push_back(Ok(data));
    }

    pub fn push_failure(&self, failure: ApiFailure) {
        self.responses.lock().unwrap().push_back(Err(failure));
    }

    pub fn push_error(&self, error: GraphqlError) {
        self.push_failure(ApiFailure::Rejected(vec![error]));
    }

    pub fn requests(&self) -> Vec<GraphqlRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn operation_names(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| r.operation_name)
            .collect()
    }
}

#[async_trait]
impl ApiClient for ScriptedClient {
    async fn request(&self, request: GraphqlRequest) -> Result<Value, ApiFailure> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ApiFailure::Transport("no scripted response".into())))
    }
}

// ── In-memory gateway ────────────────────────────────────────────

/// A gateway over a vector of records that enforces `_version` like the
/// backend does and counts every call.
#[derive(Default)]
pub struct MemoryGateway {
    records: Mutex<Vec<Record>>,
    failing: Mutex<HashSet<String>>,
    next_id: AtomicUsize,
    pub fetch_all_calls: AtomicUsize,
    pub fetch_one_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
}

impl MemoryGateway {
    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Default::default()
        }
    }

    /// Makes every write to `id` fail with a remote error.
    pub fn fail_writes_to(&self, id: &str) {
        self.failing.lock().unwrap().insert(id.to_string());
    }

    pub fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        [
            &self.fetch_all_calls,
            &self.fetch_one_calls,
            &self.create_calls,
            &self.update_calls,
            &self.delete_calls,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }

    fn check_failing(&self, id: &str) -> ProviderResult<()> {
        if self.failing.lock().unwrap().contains(id) {
            return Err(ProviderError::Remote {
                message: format!("write to {id} refused"),
                status: 500,
                data: None,
            });
        }
        Ok(())
    }

    fn not_found(schema: &EntitySchema, id: &str) -> ProviderError {
        ProviderError::NotFound {
            resource: schema.plural_name.clone(),
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl RecordGateway for MemoryGateway {
    async fn fetch_all(&self, _schema: &EntitySchema) -> ProviderResult<Vec<Record>> {
        self.fetch_all_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.records())
    }

    async fn fetch_one(&self, schema: &EntitySchema, id: &str) -> ProviderResult<Record> {
        self.fetch_one_calls.fetch_add(1, Ordering::SeqCst);
        self.records()
            .into_iter()
            .find(|r| r.id() == Some(id))
            .ok_or_else(|| Self::not_found(schema, id))
    }

    async fn create_one(&self, schema: &EntitySchema, data: &Record) -> ProviderResult<Record> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let mut created = Record::new()
            .with("id", json!(format!("new-{n}")))
            .with(VERSION_FIELD, json!(1));
        for name in schema.field_names().filter(|f| *f != "id") {
            if let Some(v) = data.get(name) {
                created.insert(name, v.clone());
            }
        }
        self.records.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn update_one(
        &self,
        schema: &EntitySchema,
        id: &str,
        data: &Record,
    ) -> ProviderResult<Record> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        // let concurrent batch calls interleave
        tokio::task::yield_now().await;
        self.check_failing(id)?;

        let mut records = self.records.lock().unwrap();
        let stored = records
            .iter_mut()
            .find(|r| r.id() == Some(id))
            .ok_or_else(|| Self::not_found(schema, id))?;

        if data.version() != stored.version() {
            return Err(ProviderError::Conflict(ConflictDetails {
                message: "Conflict resolver rejects mutation.".into(),
                server_record: Some(stored.clone()),
                diff: Default::default(),
            }));
        }

        for name in schema.field_names().filter(|f| *f != "id") {
            if let Some(v) = data.get(name) {
                stored.insert(name, v.clone());
            }
        }
        let next = stored.version().unwrap_or(0) + 1;
        stored.insert(VERSION_FIELD, json!(next));
        Ok(stored.clone())
    }

    async fn delete_one(&self, schema: &EntitySchema, id: &str) -> ProviderResult<Record> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.check_failing(id)?;

        let mut records = self.records.lock().unwrap();
        let index = records
            .iter()
            .position(|r| r.id() == Some(id))
            .ok_or_else(|| Self::not_found(schema, id))?;
        Ok(records.remove(index))
    }
}
