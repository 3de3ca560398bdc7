use std::{error::Error, fmt, sync::Arc, time::Duration};

use clickhouse_store::models::QueryResult;
use clickhouse_store::schema::{DEFAULT_FORMAT, PING_SQL};
use reqwest::Client;
use tracing::{debug, warn};
use uuid::Uuid;

const HEADER_USER: &str = "X-ClickHouse-User";
const HEADER_KEY: &str = "X-ClickHouse-Key";

#[derive(Debug)]
pub enum StoreError {
    Http(Box<reqwest::Error>),
    ClickHouse { status: u16, message: String },
    Decode(String),
    InvalidInput(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(err) => write!(f, "ClickHouse HTTP error: {err}"),
            Self::ClickHouse { status, message } => {
                write!(f, "ClickHouse error (HTTP {status}): {message}")
            }
            Self::Decode(message) => write!(f, "Invalid ClickHouse response: {message}"),
            Self::InvalidInput(message) => write!(f, "Invalid input: {message}"),
        }
    }
}

impl Error for StoreError {}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(Box::new(err))
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Connection settings for the ClickHouse HTTP interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub secure: bool,
    pub query_timeout: Duration,
}

impl ConnectionConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub const fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub const fn with_query_timeout(mut self, query_timeout: Duration) -> Self {
        self.query_timeout = query_timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!("{scheme}://{}:{}/", self.host, self.port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8123,
            username: "default".to_string(),
            password: String::new(),
            database: "default".to_string(),
            secure: false,
            query_timeout: Duration::from_secs(30),
        }
    }
}

/// ClickHouse client bound to a single database.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: Client,
    config: Arc<ConnectionConfig>,
}

impl ClickHouseStore {
    /// Creates a store with its own HTTP client.
    ///
    /// # Errors
    /// Returns `StoreError` if the HTTP client cannot be constructed.
    pub fn new(config: ConnectionConfig) -> StoreResult<Self> {
        let client = Client::builder().timeout(config.query_timeout).build()?;
        Ok(Self::with_client(client, config))
    }

    /// Creates a store that shares an existing HTTP client and its pool.
    #[must_use]
    pub fn with_client(client: Client, config: ConnectionConfig) -> Self {
        Self {
            client,
            config: Arc::new(config),
        }
    }

    /// Returns a store for another database on the same server.
    #[must_use]
    pub fn for_database(&self, database: &str) -> Self {
        let config = ConnectionConfig {
            database: database.to_string(),
            ..(*self.config).clone()
        };
        Self::with_client(self.client.clone(), config)
    }

    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    #[must_use]
    pub fn database(&self) -> &str {
        &self.config.database
    }

    /// Runs a statement and decodes the `JSONCompact` result.
    ///
    /// # Errors
    /// Returns `StoreError` if the SQL is empty, the request fails, ClickHouse
    /// rejects the statement, or the response cannot be decoded.
    pub async fn query(&self, sql: &str) -> StoreResult<QueryResult> {
        let body = self.execute(sql).await?;
        if body.trim().is_empty() {
            return Ok(QueryResult::default());
        }
        serde_json::from_str(&body).map_err(|err| StoreError::Decode(err.to_string()))
    }

    /// Runs a statement and discards any output.
    ///
    /// # Errors
    /// Returns `StoreError` if the request fails or ClickHouse rejects it.
    pub async fn command(&self, sql: &str) -> StoreResult<()> {
        self.execute(sql).await.map(|_| ())
    }

    /// Checks that the server is reachable and the database exists.
    ///
    /// # Errors
    /// Returns `StoreError` if the probe query fails.
    pub async fn ping(&self) -> StoreResult<()> {
        self.command(PING_SQL).await
    }

    async fn execute(&self, sql: &str) -> StoreResult<String> {
        let sql = sql.trim();
        ensure_non_empty(sql, "sql")?;

        let query_id = Uuid::new_v4().to_string();
        debug!(
            query_id = %query_id,
            database = %self.config.database,
            "sending query to ClickHouse"
        );

        let response = self
            .client
            .post(self.config.base_url())
            .query(&[
                ("database", self.config.database.as_str()),
                ("default_format", DEFAULT_FORMAT),
                ("query_id", query_id.as_str()),
            ])
            .header(HEADER_USER, self.config.username.as_str())
            .header(HEADER_KEY, self.config.password.as_str())
            .body(sql.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = body.trim().to_string();
            warn!(
                query_id = %query_id,
                status = status.as_u16(),
                "ClickHouse rejected query: {message}"
            );
            return Err(StoreError::ClickHouse {
                status: status.as_u16(),
                message,
            });
        }
        Ok(body)
    }
}

fn ensure_non_empty(value: &str, field: &str) -> StoreResult<()> {
    if value.is_empty() {
        return Err(StoreError::InvalidInput(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn store_for(server: &MockServer) -> ClickHouseStore {
        let config = ConnectionConfig::new(server.host(), server.port())
            .with_credentials("default", "test")
            .with_database("analytics");
        ClickHouseStore::new(config).expect("store should build")
    }

    #[test]
    fn base_url_follows_secure_flag() {
        let config = ConnectionConfig::new("ch.internal", 8443);
        assert_eq!(config.base_url(), "http://ch.internal:8443/");
        assert_eq!(config.with_secure(true).base_url(), "https://ch.internal:8443/");
    }

    #[test]
    fn for_database_keeps_connection_settings() {
        let store = ClickHouseStore::new(
            ConnectionConfig::new("localhost", 8123).with_credentials("reader", "pw"),
        )
        .expect("store should build");
        let other = store.for_database("logs");
        assert_eq!(other.database(), "logs");
        assert_eq!(other.config().username, "reader");
        assert_eq!(store.database(), "default");
    }

    #[tokio::test]
    async fn query_sends_credentials_and_decodes_rows() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/")
                    .query_param("database", "analytics")
                    .query_param("default_format", "JSONCompact")
                    .query_param_exists("query_id")
                    .header("x-clickhouse-user", "default")
                    .header("x-clickhouse-key", "test")
                    .body("SELECT name, value FROM t");
                then.status(200).json_body(json!({
                    "meta": [
                        {"name": "name", "type": "String"},
                        {"name": "value", "type": "Int32"}
                    ],
                    "data": [["a", 1], ["b", 2]],
                    "rows": 2
                }));
            })
            .await;

        let result = store_for(&server)
            .query("  SELECT name, value FROM t  ")
            .await
            .expect("query should succeed");

        mock.assert_async().await;
        assert_eq!(result.column_names(), vec!["name", "value"]);
        assert_eq!(result.rows.len(), 2);
    }

    #[tokio::test]
    async fn server_errors_carry_clickhouse_message() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(404).body(
                    "Code: 60. DB::Exception: Table analytics.missing doesn't exist. (UNKNOWN_TABLE)\n",
                );
            })
            .await;

        let err = store_for(&server)
            .query("SELECT * FROM missing")
            .await
            .expect_err("query should fail");

        match err {
            StoreError::ClickHouse { status, ref message } => {
                assert_eq!(status, 404);
                assert!(message.contains("Table analytics.missing doesn't exist"));
                assert!(!message.ends_with('\n'));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_body_decodes_to_empty_result() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).body("");
            })
            .await;

        let result = store_for(&server)
            .query("SELECT 1")
            .await
            .expect("empty body should decode");
        assert!(result.rows.is_empty());
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200).body("1\n");
            })
            .await;

        let err = store_for(&server)
            .query("SELECT 1 FORMAT TabSeparated")
            .await
            .expect_err("tab separated output should not decode");
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn empty_sql_is_rejected_without_request() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/");
                then.status(200);
            })
            .await;

        let err = store_for(&server)
            .query("   ")
            .await
            .expect_err("blank sql should fail");
        assert!(matches!(err, StoreError::InvalidInput(_)));
        mock.assert_hits_async(0).await;
    }
}
