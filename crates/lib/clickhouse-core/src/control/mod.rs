use std::{error::Error, fmt};

use crate::resources::ResourceUriError;
use crate::store::{ClickHouseStore, StoreError};

pub mod metadata;
pub mod query;

#[derive(Debug)]
pub enum ControlError {
    Store(StoreError),
    Resource(ResourceUriError),
    NotSelect,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Resource(err) => write!(f, "{err}"),
            Self::NotSelect => f.write_str("Only SELECT queries are allowed."),
        }
    }
}

impl Error for ControlError {}

impl From<StoreError> for ControlError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<ResourceUriError> for ControlError {
    fn from(err: ResourceUriError) -> Self {
        Self::Resource(err)
    }
}

/// Metadata and query operations over a single ClickHouse store.
#[derive(Clone)]
pub struct ClickHouseControlPlane {
    store: ClickHouseStore,
}

impl ClickHouseControlPlane {
    #[must_use]
    pub const fn new(store: ClickHouseStore) -> Self {
        Self { store }
    }

    #[must_use]
    pub const fn store(&self) -> &ClickHouseStore {
        &self.store
    }
}
