//! Daemon entry point for the ClickHouse MCP server.
//!
//! Loads configuration from flags and the environment, builds the database
//! registry, and serves the MCP protocol over stdio and/or streamable HTTP.

mod config;
mod logging;
mod registry;

use std::sync::Arc;

use clickhouse_core::services::DatabaseRegistry;
use clickhouse_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::{error, info, warn};

use crate::config::ClickHouseMcpConfig;
use crate::registry::build_registry;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    logging::init();
    let config = ClickHouseMcpConfig::from_args()?;
    info!(
        url = %config.connection.base_url(),
        user = %config.connection.username,
        database = %config.default_database(),
        "Starting ClickHouse MCP server..."
    );

    let registry = Arc::new(build_registry(&config)?);
    let _sweeper = registry.as_ref().clone().spawn_sweeper();

    if let Err(err) = registry.get_or_init(config.default_database()).await {
        warn!("default database is not reachable yet: {err}");
    }

    let result = run(&config, registry).await;
    if let Err(ref err) = result {
        error!("Server error: {err}");
    }
    result
}

async fn run(
    config: &ClickHouseMcpConfig,
    registry: Arc<DatabaseRegistry>,
) -> Result<(), BoxError> {
    let database = config.default_database();
    let http_config = McpHttpServerConfig::new(config.http_addr);
    match (config.enable_stdio, config.http_serve) {
        (true, true) => {
            let http = serve_streamable_http(registry.clone(), database, http_config);
            tokio::pin!(http);
            tokio::select! {
                result = &mut http => return result,
                result = serve_stdio(registry, database) => result?,
            }
            info!("stdio client disconnected; HTTP transport keeps serving");
            http.await
        }
        (true, false) => serve_stdio(registry, database).await,
        (false, true) => serve_streamable_http(registry, database, http_config).await,
        (false, false) => Ok(()),
    }
}
