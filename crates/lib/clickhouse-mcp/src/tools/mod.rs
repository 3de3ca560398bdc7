//! MCP tool modules.
//!
//! Tools are grouped by domain: query execution, catalog metadata, and
//! contextual help.

pub mod query;
pub mod schema;
mod context;
