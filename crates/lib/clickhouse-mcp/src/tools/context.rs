use rmcp::{
    ErrorData,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::ClickHouseMcp;

/// Payload listing the MCP commands this server offers.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HelpCommands {
    pub commands: Vec<String>,
}

impl Default for HelpCommands {
    fn default() -> Self {
        Self {
            commands: vec![
                "help - List the MCP commands offered by this server.".to_string(),
                "health - Returns 'ok' when the server is running.".to_string(),
                "execute_select_query - Run a SELECT query and get tab-separated rows back."
                    .to_string(),
                "list_databases - List user databases with their engines.".to_string(),
                "list_tables - List the tables of a database.".to_string(),
                "describe_table - Describe the columns of a table.".to_string(),
                "resources - clickhouse://{database}/tables and clickhouse://{database}/{table}/schema."
                    .to_string(),
            ],
        }
    }
}

#[tool_router(router = tool_router_context, vis = "pub")]
impl ClickHouseMcp {
    #[tool(description = "List the MCP commands offered by this server.")]
    async fn help(&self) -> Result<CallToolResult, ErrorData> {
        Ok(CallToolResult::success(vec![Content::json(HelpCommands::default())?]))
    }
}
