pub const TABLE_SYSTEM_DATABASES: &str = "system.databases";

pub const EXCLUDED_DATABASES: [&str; 3] = ["system", "information_schema", "INFORMATION_SCHEMA"];

pub const RESOURCE_SCHEME: &str = "clickhouse://";
pub const RESOURCE_TABLES_SEGMENT: &str = "tables";
pub const RESOURCE_SCHEMA_SEGMENT: &str = "schema";
pub const MIME_TEXT_PLAIN: &str = "text/plain";

pub const DEFAULT_FORMAT: &str = "JSONCompact";

/// Lists user databases with their engines.
pub const LIST_DATABASES_SQL: &str = "SELECT name, engine FROM system.databases \
WHERE name NOT IN ('system', 'information_schema', 'INFORMATION_SCHEMA') ORDER BY name";

pub const PING_SQL: &str = "SELECT 1";

#[must_use]
pub fn is_excluded_database(name: &str) -> bool {
    EXCLUDED_DATABASES.contains(&name)
}

/// Backtick-quotes an identifier for interpolation into SQL.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for ch in name.chars() {
        match ch {
            '`' => quoted.push_str("\\`"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(ch),
        }
    }
    quoted.push('`');
    quoted
}

#[must_use]
pub fn show_tables_sql(database: &str) -> String {
    format!("SHOW TABLES FROM {}", quote_identifier(database))
}

#[must_use]
pub fn describe_table_sql(database: &str, table: &str) -> String {
    format!(
        "DESCRIBE TABLE {}.{}",
        quote_identifier(database),
        quote_identifier(table)
    )
}

/// Only statements starting with `SELECT` pass the read-only gate.
#[must_use]
pub fn is_select_query(sql: &str) -> bool {
    sql.trim().to_uppercase().starts_with("SELECT")
}

#[must_use]
pub fn tables_resource_uri(database: &str) -> String {
    format!("{RESOURCE_SCHEME}{database}/{RESOURCE_TABLES_SEGMENT}")
}

#[must_use]
pub fn schema_resource_uri(database: &str, table: &str) -> String {
    format!("{RESOURCE_SCHEME}{database}/{table}/{RESOURCE_SCHEMA_SEGMENT}")
}
