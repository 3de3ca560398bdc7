//! Core services for clickhouse-mcp.
//!
//! This crate owns the HTTP store that talks to ClickHouse, the control plane
//! that turns metadata and query requests into SQL, the `clickhouse://`
//! resource addressing, and the per-database handle registry.

pub mod control;
pub mod resources;
pub mod services;
pub mod store;
