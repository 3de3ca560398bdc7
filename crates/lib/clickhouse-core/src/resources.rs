//! `clickhouse://` resource addressing.
//!
//! Two resource shapes exist: `clickhouse://{database}/tables` lists the
//! tables of a database and `clickhouse://{database}/{table}/schema` describes
//! one table.

use std::{error::Error, fmt};

use clickhouse_store::schema::{
    MIME_TEXT_PLAIN,
    RESOURCE_SCHEMA_SEGMENT,
    RESOURCE_SCHEME,
    RESOURCE_TABLES_SEGMENT,
    schema_resource_uri,
    tables_resource_uri,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUriError {
    InvalidScheme(String),
    InvalidResource(String),
}

impl fmt::Display for ResourceUriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScheme(uri) => write!(f, "Invalid URI scheme: {uri}"),
            Self::InvalidResource(uri) => write!(f, "Invalid resource URI: {uri}"),
        }
    }
}

impl Error for ResourceUriError {}

/// A parsed resource address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    Tables { database: String },
    Schema { database: String, table: String },
}

impl ResourceUri {
    /// Parses a `clickhouse://` URI.
    ///
    /// # Errors
    /// Returns `ResourceUriError::InvalidScheme` for foreign schemes and
    /// `ResourceUriError::InvalidResource` for unknown paths.
    pub fn parse(uri: &str) -> Result<Self, ResourceUriError> {
        let Some(path) = uri.strip_prefix(RESOURCE_SCHEME) else {
            return Err(ResourceUriError::InvalidScheme(uri.to_string()));
        };

        let parts: Vec<&str> = path.split('/').collect();
        match parts.as_slice() {
            [database, segment]
                if *segment == RESOURCE_TABLES_SEGMENT && !database.is_empty() =>
            {
                Ok(Self::Tables {
                    database: (*database).to_string(),
                })
            }
            [database, table, segment]
                if *segment == RESOURCE_SCHEMA_SEGMENT
                    && !database.is_empty()
                    && !table.is_empty() =>
            {
                Ok(Self::Schema {
                    database: (*database).to_string(),
                    table: (*table).to_string(),
                })
            }
            _ => Err(ResourceUriError::InvalidResource(uri.to_string())),
        }
    }

    #[must_use]
    pub fn database(&self) -> &str {
        match self {
            Self::Tables { database } | Self::Schema { database, .. } => database,
        }
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tables { database } => f.write_str(&tables_resource_uri(database)),
            Self::Schema { database, table } => {
                f.write_str(&schema_resource_uri(database, table))
            }
        }
    }
}

/// Listing entry for a resource exposed over MCP.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub uri: String,
    pub name: String,
    pub description: String,
    pub mime_type: String,
}

impl ResourceDescriptor {
    #[must_use]
    pub fn for_database(database: &str) -> Self {
        Self {
            uri: tables_resource_uri(database),
            name: format!("Database: {database}"),
            description: format!("Tables in database: {database}"),
            mime_type: MIME_TEXT_PLAIN.to_string(),
        }
    }

    #[must_use]
    pub fn for_table(database: &str, table: &str) -> Self {
        Self {
            uri: schema_resource_uri(database, table),
            name: format!("Table: {database}.{table}"),
            description: format!("Schema of table: {database}.{table}"),
            mime_type: MIME_TEXT_PLAIN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tables_uri() {
        let uri = ResourceUri::parse("clickhouse://default/tables").expect("valid uri");
        assert_eq!(
            uri,
            ResourceUri::Tables {
                database: "default".to_string()
            }
        );
        assert_eq!(uri.to_string(), "clickhouse://default/tables");
    }

    #[test]
    fn parses_schema_uri() {
        let uri =
            ResourceUri::parse("clickhouse://default/test_table/schema").expect("valid uri");
        assert_eq!(
            uri,
            ResourceUri::Schema {
                database: "default".to_string(),
                table: "test_table".to_string()
            }
        );
        assert_eq!(uri.database(), "default");
    }

    #[test]
    fn rejects_foreign_scheme() {
        let err = ResourceUri::parse("invalid://default/test_table/schema")
            .expect_err("scheme should be rejected");
        assert_eq!(
            err.to_string(),
            "Invalid URI scheme: invalid://default/test_table/schema"
        );
    }

    #[test]
    fn rejects_unknown_paths() {
        for uri in [
            "clickhouse://default/invalid",
            "clickhouse://default",
            "clickhouse://default/t/columns",
            "clickhouse:///tables",
            "clickhouse://a/b/c/schema",
        ] {
            let err = ResourceUri::parse(uri).expect_err("path should be rejected");
            assert_eq!(err, ResourceUriError::InvalidResource(uri.to_string()));
        }
    }

    #[test]
    fn descriptors_name_databases_and_tables() {
        let db = ResourceDescriptor::for_database("default");
        assert_eq!(db.uri, "clickhouse://default/tables");
        assert_eq!(db.name, "Database: default");
        assert_eq!(db.mime_type, "text/plain");

        let table = ResourceDescriptor::for_table("default", "events");
        assert_eq!(table.uri, "clickhouse://default/events/schema");
        assert_eq!(table.name, "Table: default.events");
        assert_eq!(table.description, "Schema of table: default.events");
    }
}
