//! MCP server implementation for clickhouse-mcp.
//!
//! This crate wires the ClickHouse control plane into rmcp tool handlers and
//! resource listings, and provides the stdio and streamable HTTP runners.

mod helpers;
mod tools;
pub mod server;

use std::sync::Arc;

use clickhouse_core::control::ClickHouseControlPlane;
use clickhouse_core::resources::ResourceDescriptor;
use clickhouse_core::services::DatabaseRegistry;
use rmcp::{
    ErrorData,
    RoleServer,
    ServerHandler,
    handler::server::tool::ToolRouter,
    service::RequestContext,
    tool,
    tool_handler,
    tool_router,
};
use rmcp::model::{
    AnnotateAble,
    CallToolResult,
    Content,
    Implementation,
    ListResourcesResult,
    PaginatedRequestParams,
    RawResource,
    ReadResourceRequestParams,
    ReadResourceResult,
    Resource,
    ResourceContents,
    ServerCapabilities,
    ServerInfo,
};
use tracing::info;

pub const SERVER_NAME: &str = "clickhouse_mcp_server";

const SERVER_INSTRUCTIONS: &str = r"clickhouse-mcp exposes a ClickHouse server through read-only MCP tools and resources.

Tools:
- `execute_select_query` runs a SELECT statement and returns tab-separated rows with a header line.
  Pass `database` to run against a database other than the configured default.
  Statements that do not start with SELECT are refused.
- `list_databases`, `list_tables`, and `describe_table` return catalog metadata as JSON.
- `help` lists the commands; `health` returns `ok`.

Resources:
- `clickhouse://{database}/tables` lists the tables of a database, one per line.
- `clickhouse://{database}/{table}/schema` lists `column - type` lines for a table.
System databases (`system`, `information_schema`) are not listed.";

/// MCP server wrapper around the database registry and tool routers.
#[derive(Clone)]
pub struct ClickHouseMcp {
    tool_router: ToolRouter<Self>,
    registry: Arc<DatabaseRegistry>,
    default_database: Arc<str>,
}

impl ClickHouseMcp {
    /// Creates a new server using a registry by value.
    #[must_use]
    pub fn new(registry: DatabaseRegistry, default_database: &str) -> Self {
        Self::with_registry(Arc::new(registry), default_database)
    }

    /// Creates a new server using a shared registry handle.
    #[must_use]
    pub fn with_registry(registry: Arc<DatabaseRegistry>, default_database: &str) -> Self {
        let tool_router = Self::tool_router_core()
            + Self::tool_router_query()
            + Self::tool_router_schema()
            + Self::tool_router_context();
        Self {
            tool_router,
            registry,
            default_database: Arc::from(default_database),
        }
    }

    #[must_use]
    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    /// Retrieves the control plane for a database, connecting on first use.
    ///
    /// `None` or a blank name selects the default database.
    pub(crate) async fn control_for_database(
        &self,
        database: Option<&str>,
    ) -> Result<ClickHouseControlPlane, ErrorData> {
        let database = database
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| self.default_database());
        let handle = self
            .registry
            .get_or_init(database)
            .await
            .map_err(helpers::map_registry_err)?;
        Ok(handle.control())
    }

    /// Lists the `clickhouse://` resources of every user database.
    ///
    /// # Errors
    /// Returns an MCP error if the catalog cannot be read.
    pub async fn resource_descriptors(&self) -> Result<Vec<ResourceDescriptor>, ErrorData> {
        info!("Listing resources");
        let control = self.control_for_database(None).await?;
        control.list_resources().await.map_err(helpers::map_err)
    }

    /// Reads a resource as plain text.
    ///
    /// # Errors
    /// Returns `INVALID_PARAMS` for malformed URIs and `INTERNAL_ERROR` when
    /// ClickHouse rejects the lookup.
    pub async fn read_resource_text(&self, uri: &str) -> Result<String, ErrorData> {
        let control = self.control_for_database(None).await?;
        control.read_resource(uri).await.map_err(helpers::map_err)
    }
}

fn to_resource(descriptor: ResourceDescriptor) -> Resource {
    let mut raw = RawResource::new(descriptor.uri, descriptor.name);
    raw.description = Some(descriptor.description);
    raw.mime_type = Some(descriptor.mime_type);
    raw.no_annotation()
}

#[tool_router(router = tool_router_core, vis = "pub")]
impl ClickHouseMcp {
    #[tool(description = "Health check. Returns 'ok'.")]
    async fn health(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::text("ok")]))
    }
}

#[tool_handler]
impl ServerHandler for ClickHouseMcp {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();
        ServerInfo {
            server_info,
            instructions: Some(SERVER_INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            ..Default::default()
        }
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, ErrorData> {
        let resources = self
            .resource_descriptors()
            .await?
            .into_iter()
            .map(to_resource)
            .collect();
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, ErrorData> {
        let text = self.read_resource_text(&request.uri).await?;
        Ok(ReadResourceResult {
            contents: vec![ResourceContents::text(text, request.uri)],
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use clickhouse_core::services::{
        BuildHandleFn,
        BuildHandleFuture,
        DatabaseHandle,
        DatabaseRegistry,
        DatabaseRegistryConfig,
        RegistryError,
    };
    use clickhouse_core::store::{ClickHouseStore, ConnectionConfig};
    use httpmock::MockServer;
    use rmcp::model::CallToolResult;

    use crate::ClickHouseMcp;

    /// Builds a server whose handles point at the mock ClickHouse server.
    pub fn server_for(mock: &MockServer) -> ClickHouseMcp {
        let host = mock.host();
        let port = mock.port();
        let build: BuildHandleFn = Arc::new(move |database: String| -> BuildHandleFuture {
            let config = ConnectionConfig::new(host.clone(), port)
                .with_credentials("default", "test")
                .with_database(database);
            Box::pin(async move {
                let store = ClickHouseStore::new(config)
                    .map_err(|err| RegistryError::BuildFailed(err.to_string()))?;
                Ok(Arc::new(DatabaseHandle::new(store)))
            })
        });
        let registry = DatabaseRegistry::new(DatabaseRegistryConfig::new(build));
        ClickHouseMcp::new(registry, "default")
    }

    pub fn result_text(result: &CallToolResult) -> String {
        result
            .content
            .iter()
            .filter_map(|content| content.as_text())
            .map(|text| text.text.clone())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
