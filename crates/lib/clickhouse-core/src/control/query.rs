use clickhouse_store::models::QueryResult;
use clickhouse_store::schema::is_select_query;
use tracing::{error, info};

use super::{ClickHouseControlPlane, ControlError};
use crate::store::StoreError;

impl ClickHouseControlPlane {
    /// Runs a read-only `SELECT` statement.
    ///
    /// # Errors
    /// Returns `ControlError::NotSelect` for any other statement and
    /// `ControlError::Store` if the statement is empty or ClickHouse fails it.
    pub async fn execute_select(&self, sql: &str) -> Result<QueryResult, ControlError> {
        if sql.trim().is_empty() {
            return Err(ControlError::Store(StoreError::InvalidInput(
                "Query is required".to_string(),
            )));
        }
        if !is_select_query(sql) {
            info!("rejected non-SELECT statement");
            return Err(ControlError::NotSelect);
        }

        match self.store.query(sql).await {
            Ok(result) => {
                info!(
                    database = %self.store.database(),
                    rows = result.rows.len(),
                    "select query completed"
                );
                Ok(result)
            }
            Err(err) => {
                error!("Error executing SQL '{sql}': {err}");
                Err(err.into())
            }
        }
    }
}
