use std::borrow::Cow;

use clickhouse_core::control::ControlError;
use clickhouse_core::services::RegistryError;
use clickhouse_core::store::StoreError;
use rmcp::ErrorData;
use rmcp::model::ErrorCode;

pub fn mcp_err(code: ErrorCode, message: impl Into<Cow<'static, str>>) -> ErrorData {
    ErrorData {
        code,
        message: message.into(),
        data: None,
    }
}

pub fn map_err(err: ControlError) -> ErrorData {
    match err {
        ControlError::Resource(err) => mcp_err(ErrorCode::INVALID_PARAMS, err.to_string()),
        ControlError::Store(StoreError::InvalidInput(message)) => {
            mcp_err(ErrorCode::INVALID_PARAMS, message)
        }
        ControlError::NotSelect => mcp_err(ErrorCode::INVALID_PARAMS, err.to_string()),
        ControlError::Store(err) => mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string()),
    }
}

pub fn map_registry_err(err: RegistryError) -> ErrorData {
    match err {
        RegistryError::InvalidDatabase(_) => mcp_err(ErrorCode::INVALID_PARAMS, err.to_string()),
        RegistryError::CapacityReached { .. } | RegistryError::BuildFailed(_) => {
            mcp_err(ErrorCode::INTERNAL_ERROR, err.to_string())
        }
    }
}
