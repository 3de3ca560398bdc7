use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};

use crate::{ClickHouseMcp, helpers};

/// Parameters for listing tables in a database.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ListTablesParams {
    pub database: String,
}

/// Parameters for describing a table.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DescribeTableParams {
    pub database: String,
    pub table: String,
}

#[tool_router(router = tool_router_schema, vis = "pub")]
impl ClickHouseMcp {
    #[tool(description = "List user databases on the ClickHouse server.")]
    async fn list_databases(&self) -> Result<CallToolResult, ErrorData> {
        let control = self.control_for_database(None).await?;
        let databases = control.list_databases().await.map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(databases)?]))
    }

    #[tool(description = "List tables in a database.")]
    async fn list_tables(
        &self,
        Parameters(params): Parameters<ListTablesParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let control = self.control_for_database(None).await?;
        let tables = control
            .list_tables(&params.database)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(tables)?]))
    }

    #[tool(description = "Describe the columns of a table.")]
    async fn describe_table(
        &self,
        Parameters(params): Parameters<DescribeTableParams>,
    ) -> Result<CallToolResult, ErrorData> {
        let control = self.control_for_database(None).await?;
        let columns = control
            .describe_table(&params.database, &params.table)
            .await
            .map_err(helpers::map_err)?;
        Ok(CallToolResult::success(vec![Content::json(columns)?]))
    }
}
