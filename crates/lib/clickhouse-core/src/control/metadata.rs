use clickhouse_store::models::{ColumnInfo, DatabaseInfo, TableInfo};
use clickhouse_store::schema::{LIST_DATABASES_SQL, describe_table_sql, show_tables_sql};
use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, info};

use super::{ClickHouseControlPlane, ControlError};
use crate::resources::{ResourceDescriptor, ResourceUri};
use crate::store::StoreError;

impl ClickHouseControlPlane {
    /// Lists user databases, skipping the system catalogs.
    ///
    /// # Errors
    /// Returns `ControlError` if the store query fails.
    pub async fn list_databases(&self) -> Result<Vec<DatabaseInfo>, ControlError> {
        let result = self.store.query(LIST_DATABASES_SQL).await?;
        let databases = result
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.first().and_then(Value::as_str)?.to_string();
                let engine = row.get(1).and_then(Value::as_str).map(str::to_string);
                Some(DatabaseInfo { name, engine })
            })
            .collect();
        Ok(databases)
    }

    /// Lists table names in a database.
    ///
    /// # Errors
    /// Returns `ControlError` if the database name is empty or the store query fails.
    pub async fn list_tables(&self, database: &str) -> Result<Vec<TableInfo>, ControlError> {
        ensure_identifier(database, "database")?;
        let result = self.store.query(&show_tables_sql(database)).await?;
        let tables = result
            .first_column()
            .into_iter()
            .map(|name| TableInfo {
                database: database.to_string(),
                name,
            })
            .collect();
        Ok(tables)
    }

    /// Describes the columns of a table.
    ///
    /// # Errors
    /// Returns `ControlError` if a name is empty or the store query fails.
    pub async fn describe_table(
        &self,
        database: &str,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, ControlError> {
        ensure_identifier(database, "database")?;
        ensure_identifier(table, "table")?;
        let result = self.store.query(&describe_table_sql(database, table)).await?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| ColumnInfo::from_describe_row(row))
            .collect())
    }

    /// Builds the resource listing: each database followed by its tables.
    ///
    /// # Errors
    /// Returns `ControlError` if any metadata query fails.
    pub async fn list_resources(&self) -> Result<Vec<ResourceDescriptor>, ControlError> {
        let databases = self.list_databases().await?;
        let tables = try_join_all(
            databases
                .iter()
                .map(|database| self.list_tables(&database.name)),
        )
        .await?;

        let mut resources = Vec::new();
        for (database, tables) in databases.iter().zip(tables) {
            resources.push(ResourceDescriptor::for_database(&database.name));
            resources.extend(
                tables
                    .iter()
                    .map(|table| ResourceDescriptor::for_table(&table.database, &table.name)),
            );
        }
        debug!(count = resources.len(), "listed resources");
        Ok(resources)
    }

    /// Reads a resource as plain text.
    ///
    /// # Errors
    /// Returns `ControlError::Resource` for malformed URIs and
    /// `ControlError::Store` if ClickHouse rejects the lookup.
    pub async fn read_resource(&self, uri: &str) -> Result<String, ControlError> {
        info!("Reading resource: {uri}");
        match ResourceUri::parse(uri)? {
            ResourceUri::Tables { database } => {
                let tables = self.list_tables(&database).await?;
                let names: Vec<String> = tables.into_iter().map(|table| table.name).collect();
                Ok(names.join("\n"))
            }
            ResourceUri::Schema { database, table } => {
                let columns = self.describe_table(&database, &table).await?;
                let lines: Vec<String> = columns.iter().map(ColumnInfo::summary_line).collect();
                Ok(lines.join("\n"))
            }
        }
    }
}

fn ensure_identifier(value: &str, field: &str) -> Result<(), ControlError> {
    if value.trim().is_empty() {
        return Err(ControlError::Store(StoreError::InvalidInput(format!(
            "{field} is required"
        ))));
    }
    Ok(())
}
