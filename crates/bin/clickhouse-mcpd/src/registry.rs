use std::sync::Arc;

use clickhouse_core::services::{
    BuildHandleFn,
    BuildHandleFuture,
    DatabaseHandle,
    DatabaseRegistry,
    DatabaseRegistryConfig,
    RegistryError,
};
use clickhouse_core::store::{ClickHouseStore, StoreError};
use tracing::info;

use crate::config::ClickHouseMcpConfig;

/// Builds the database registry.
///
/// Every handle shares one HTTP client; a handle is published only after its
/// database answers a ping.
pub fn build_registry(config: &ClickHouseMcpConfig) -> Result<DatabaseRegistry, StoreError> {
    let base = ClickHouseStore::new(config.connection.clone())?;
    let build: BuildHandleFn = Arc::new(move |database: String| -> BuildHandleFuture {
        let store = base.for_database(&database);
        Box::pin(async move {
            store.ping().await.map_err(map_build_error)?;
            info!(
                database = %store.database(),
                url = %store.config().base_url(),
                "connected to ClickHouse"
            );
            Ok(Arc::new(DatabaseHandle::new(store)))
        })
    });

    let mut registry_config =
        DatabaseRegistryConfig::new(build).with_sweep_interval(config.sweep_interval);
    if let Some(ttl) = config.registry_ttl {
        registry_config = registry_config.with_ttl(ttl);
    }
    if let Some(max_entries) = config.max_entries {
        registry_config = registry_config.with_max_entries(max_entries);
    }

    Ok(DatabaseRegistry::new(registry_config))
}

fn map_build_error(err: impl std::fmt::Display) -> RegistryError {
    RegistryError::BuildFailed(err.to_string())
}
