//! List/CRUD data provider for the Template admin UI.
//!
//! Adapts the admin UI's generic operations (list, get, getMany,
//! getManyReference, create, update, updateMany, delete, deleteMany) onto a
//! GraphQL backend that versions every record for optimistic concurrency.
//!
//! # Architecture
//!
//! - **Dispatcher** ([`DataProvider`]): the entry point; resolves the
//!   resource's schema and routes the [`Operation`]
//! - **Gateway** ([`RecordGateway`]): remote CRUD for one entity type and
//!   mapping of backend errors, conflicts included, onto [`ProviderError`]
//! - **Filter** and **Sort** engines: in-memory narrowing, ordering and paging
//! - **API client** ([`ApiClient`]): the GraphQL transport; [`HttpApiClient`]
//!   posts JSON over HTTP
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use template_admin_model::SchemaRegistry;
//! use template_admin_provider::{
//!     ApiConfig, DataProvider, GatewayConfig, HttpApiClient, ListParams, Operation,
//!     RemoteGateway,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpApiClient::new(ApiConfig::default())?;
//! let gateway = RemoteGateway::new(client, GatewayConfig::default());
//! let provider = DataProvider::new(Arc::new(SchemaRegistry::builtin()?), Arc::new(gateway));
//!
//! let page = provider
//!     .execute("Templates", Operation::List(ListParams::default()))
//!     .await?;
//! println!("{} templates", page.total().unwrap_or(0));
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod client;
pub mod dispatcher;
mod error;
pub mod failure;
pub mod filter;
pub mod gateway;
pub mod graphql;
pub mod sort;

pub use api::{ApiClient, ApiFailure, CONFLICT_ERROR_TYPE, GraphqlError, GraphqlRequest};
pub use client::{ApiConfig, HttpApiClient};
pub use dispatcher::{DataProvider, Envelope, ListParams, Operation, OperationKind};
pub use error::{ConflictDetails, FieldDiff, ProviderError, ProviderResult};
pub use failure::FailureContext;
pub use filter::{CompiledFilter, FULL_TEXT_KEY, Filter, FilterSpec, Predicate, filter_records};
pub use gateway::{GatewayConfig, RecordGateway, RemoteGateway};
pub use graphql::RemoteOp;
pub use sort::{Pagination, SortOrder, SortSpec, paginate, select_page, sort_records};
