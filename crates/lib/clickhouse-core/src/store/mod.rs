//! Store interfaces and the ClickHouse HTTP implementation.
//!
//! The store layer sends SQL over the ClickHouse HTTP interface and decodes
//! `JSONCompact` responses.

pub mod http;

pub use http::{ClickHouseStore, ConnectionConfig, StoreError, StoreResult};
