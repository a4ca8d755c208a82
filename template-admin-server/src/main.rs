//! Template admin server
//!
//! Serves the admin UI's list/CRUD operations over HTTP and forwards them to
//! the GraphQL backend.
//!
//! Usage:
//!   template-admin-server --endpoint https://example.appsync-api.aws/graphql --port 4100
//!
//! The server keeps no record state; every read goes to the backend.

use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use template_admin_model::{SchemaDocument, SchemaRegistry};
use template_admin_provider::{
    ApiConfig, DataProvider, GatewayConfig, HttpApiClient, RemoteGateway,
};
use template_admin_server::build_router;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "template-admin-server")]
#[command(about = "HTTP front end for the Template admin data provider")]
struct Args {
    /// GraphQL endpoint of the backend
    #[arg(long, env = "TEMPLATE_ADMIN_ENDPOINT", default_value = "http://localhost:20002/graphql")]
    endpoint: String,

    /// API key sent as x-api-key
    #[arg(long, env = "TEMPLATE_ADMIN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Schema document to load instead of the built-in one
    #[arg(short, long, env = "TEMPLATE_ADMIN_SCHEMA")]
    schema: Option<PathBuf>,

    /// HTTP port to listen on
    #[arg(short, long, default_value = "4100")]
    port: u16,

    /// Items requested per backend page
    #[arg(long)]
    page_limit: Option<u32>,

    /// Backend request timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = if args.verbose {
        EnvFilter::new(Level::DEBUG.as_str())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()))
    };
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Template admin server starting...");
    let registry = load_registry(args.schema.as_ref())?;
    info!(
        "Loaded {} resource(s): {}",
        registry.len(),
        registry.resources().join(", ")
    );

    let client = HttpApiClient::new(ApiConfig {
        endpoint: args.endpoint.clone(),
        api_key: args.api_key,
        timeout_secs: args.timeout,
    })
    .context("Failed to create API client")?;
    let gateway = RemoteGateway::new(
        client,
        GatewayConfig {
            page_limit: args.page_limit,
        },
    );
    let provider = Arc::new(DataProvider::new(Arc::new(registry), Arc::new(gateway)));

    let app = build_router(provider);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", args.port))?;

    println!("\n========================================");
    println!("  Template Admin Server Running");
    println!("========================================");
    println!("  Backend:   {}", args.endpoint);
    println!("  HTTP Port: {}", args.port);
    println!("========================================\n");

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

fn load_registry(path: Option<&PathBuf>) -> Result<SchemaRegistry> {
    let document = match path {
        Some(path) => {
            info!("Loading schema from {:?}", path);
            SchemaDocument::from_path(path)
                .with_context(|| format!("Failed to load schema document {}", path.display()))?
        }
        None => SchemaDocument::builtin().context("Failed to parse built-in schema")?,
    };
    SchemaRegistry::from_document(document).context("Invalid schema document")
}
