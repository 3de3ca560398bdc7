use clickhouse_core::control::ControlError;
use clickhouse_store::schema::is_select_query;
use rmcp::{
    ErrorData,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ErrorCode},
    schemars,
    tool,
    tool_router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{ClickHouseMcp, helpers};

const NOT_SELECT_MESSAGE: &str = "Error: Only SELECT queries are allowed.";

/// Parameters for running a read-only query.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ExecuteSelectQueryParams {
    /// The SELECT query to execute
    pub query: String,
    /// Database to run the query against; defaults to the configured database
    pub database: Option<String>,
}

#[tool_router(router = tool_router_query, vis = "pub")]
impl ClickHouseMcp {
    #[tool(description = "Execute a SELECT query on the ClickHouse server")]
    async fn execute_select_query(
        &self,
        Parameters(params): Parameters<ExecuteSelectQueryParams>,
    ) -> Result<CallToolResult, ErrorData> {
        info!(
            query = %params.query,
            database = ?params.database,
            "Calling tool: execute_select_query"
        );

        let query = params.query.trim();
        if query.is_empty() {
            return Err(helpers::mcp_err(ErrorCode::INVALID_PARAMS, "Query is required"));
        }
        if !is_select_query(query) {
            return Ok(CallToolResult::error(vec![Content::text(NOT_SELECT_MESSAGE)]));
        }

        let control = match self.control_for_database(params.database.as_deref()).await {
            Ok(control) => control,
            Err(err) => {
                error!("Error executing SQL '{query}': {}", err.message);
                return Ok(CallToolResult::error(vec![Content::text(format!(
                    "Error executing query: {}",
                    err.message
                ))]));
            }
        };

        match control.execute_select(query).await {
            Ok(result) => Ok(CallToolResult::success(vec![Content::text(result.to_tsv())])),
            Err(ControlError::NotSelect) => {
                Ok(CallToolResult::error(vec![Content::text(NOT_SELECT_MESSAGE)]))
            }
            Err(err) => Ok(CallToolResult::error(vec![Content::text(format!(
                "Error executing query: {err}"
            ))])),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    use crate::test_support::{result_text, server_for};

    fn params(query: &str) -> Parameters<ExecuteSelectQueryParams> {
        Parameters(ExecuteSelectQueryParams {
            query: query.to_string(),
            database: None,
        })
    }

    #[tokio::test]
    async fn select_returns_tab_separated_rows() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(POST)
                .query_param("database", "default")
                .body("SELECT * FROM test_table ORDER BY value");
            then.status(200).json_body(json!({
                "meta": [
                    {"name": "name", "type": "String"},
                    {"name": "value", "type": "Int32"}
                ],
                "data": [["Test 1", 10], ["Test 2", 20], ["Test 3", 30]],
                "rows": 3
            }));
        })
        .await;

        let result = server_for(&mock)
            .execute_select_query(params("SELECT * FROM test_table ORDER BY value"))
            .await
            .expect("tool should return a result");

        assert_eq!(result.content.len(), 1);
        assert_ne!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(text.contains("Test 1\t10"));
        assert!(text.contains("Test 2\t20"));
        assert!(text.contains("Test 3\t30"));
    }

    #[tokio::test]
    async fn database_parameter_selects_target_database() {
        let mock = MockServer::start_async().await;
        let hit = mock
            .mock_async(|when, then| {
                when.method(POST).query_param("database", "analytics");
                then.status(200).json_body(json!({
                    "meta": [{"name": "c", "type": "UInt64"}],
                    "data": [["42"]],
                    "rows": 1
                }));
            })
            .await;

        let result = server_for(&mock)
            .execute_select_query(Parameters(ExecuteSelectQueryParams {
                query: "SELECT count() AS c FROM events".to_string(),
                database: Some("analytics".to_string()),
            }))
            .await
            .expect("tool should return a result");

        hit.assert_async().await;
        assert_eq!(result_text(&result), "c\n42");
    }

    #[tokio::test]
    async fn non_select_is_refused_as_error_result() {
        let mock = MockServer::start_async().await;
        let result = server_for(&mock)
            .execute_select_query(params(
                "INSERT INTO test_table (id, name, value) VALUES (1, 'Invalid', 100)",
            ))
            .await
            .expect("refusal is a tool result, not a protocol error");

        assert_eq!(result.content.len(), 1);
        assert_eq!(result.is_error, Some(true));
        assert!(result_text(&result).contains("Error: Only SELECT queries are allowed."));
    }

    #[tokio::test]
    async fn empty_query_is_invalid_params() {
        let mock = MockServer::start_async().await;
        let err = server_for(&mock)
            .execute_select_query(params("  "))
            .await
            .expect_err("blank query should be rejected");
        assert_eq!(err.code.0, ErrorCode::INVALID_PARAMS.0);
        assert_eq!(err.message, "Query is required");
    }

    #[tokio::test]
    async fn clickhouse_failures_are_reported_in_text() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(POST);
            then.status(400)
                .body("Code: 62. DB::Exception: Syntax error: failed at position 8. (SYNTAX_ERROR)");
        })
        .await;

        let result = server_for(&mock)
            .execute_select_query(params("SELECT FROM"))
            .await
            .expect("failure is a tool result");

        assert_eq!(result.is_error, Some(true));
        let text = result_text(&result);
        assert!(text.starts_with("Error executing query: "));
        assert!(text.contains("Syntax error"));
    }
}
