use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A database row from `system.databases`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}

/// A table inside a database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableInfo {
    pub database: String,
    pub name: String,
}

/// One column as reported by `DESCRIBE TABLE`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnInfo {
    /// Builds a column from a positional `DESCRIBE TABLE` row.
    ///
    /// Returns `None` when the row lacks the name or type cell.
    #[must_use]
    pub fn from_describe_row(row: &[Value]) -> Option<Self> {
        let name = row.first().and_then(Value::as_str)?.to_string();
        let column_type = row.get(1).and_then(Value::as_str)?.to_string();
        Some(Self {
            name,
            column_type,
            default_type: non_empty_cell(row.get(2)),
            default_expression: non_empty_cell(row.get(3)),
            comment: non_empty_cell(row.get(4)),
        })
    }

    /// Single-line summary used by schema resources.
    #[must_use]
    pub fn summary_line(&self) -> String {
        format!("{} - {}", self.name, self.column_type)
    }
}

/// Column header of a query result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
}

/// Server-side statistics attached to a `JSONCompact` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryStatistics {
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default)]
    pub rows_read: u64,
    #[serde(default)]
    pub bytes_read: u64,
}

/// Tabular result of a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    #[serde(rename = "meta", default)]
    pub columns: Vec<ColumnMeta>,
    #[serde(rename = "data", default)]
    pub rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<QueryStatistics>,
}

impl QueryResult {
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Values of the first column rendered as text.
    #[must_use]
    pub fn first_column(&self) -> Vec<String> {
        self.rows
            .iter()
            .filter_map(|row| row.first())
            .map(render_value)
            .collect()
    }

    /// Renders the result as tab-separated text with a header line.
    #[must_use]
    pub fn to_tsv(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.column_names().join("\t"));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(render_value).collect();
            lines.push(cells.join("\t"));
        }
        lines.join("\n")
    }
}

/// Renders a single cell the way it is shown to MCP clients.
///
/// Strings are emitted without quotes and `null` becomes `NULL`; nested
/// values keep their compact JSON form.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

fn non_empty_cell(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}
