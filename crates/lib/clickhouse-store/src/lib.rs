//! Data model and schema helpers for clickhouse-mcp.
//!
//! This crate defines the records returned by the store layer and the SQL
//! fragments shared by the control plane and the MCP surface.

pub mod models;
pub mod schema;

pub use models::*;
