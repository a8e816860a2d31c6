//! JSON-RPC error types following Ethereum error code conventions.
//!
//! Lookups that find nothing are not errors: they return `null`. Everything
//! here is either a bad request or a collaborator failure.

use ethcompat_backend::{BackendError, PoolError};
use jsonrpsee::types::ErrorObjectOwned;
use thiserror::Error;

/// Standard Ethereum JSON-RPC error codes.
pub mod codes {
    /// Invalid params
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = -32603;

    // Ethereum-specific error codes (in server error range -32000 to -32099)

    /// Execution reverted
    pub const EXECUTION_REVERTED: i32 = -32000;
    /// Resource not found
    pub const RESOURCE_NOT_FOUND: i32 = -32001;
    /// Resource unavailable
    pub const RESOURCE_UNAVAILABLE: i32 = -32002;
    /// Transaction rejected
    pub const TRANSACTION_REJECTED: i32 = -32003;
}

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("{0}")]
    InvalidParams(String),

    #[error("invalid transaction index")]
    InvalidTransactionIndex,

    #[error("invalid block range params: fromBlock {from} is after toBlock {to}")]
    InvalidBlockRange { from: u64, to: u64 },

    #[error("cannot specify both blockHash and fromBlock/toBlock")]
    BlockHashWithRange,

    #[error("too many topics: {0} positions, at most 4 allowed")]
    TooManyTopics(usize),

    #[error("account {0} has both 'state' and 'stateDiff'")]
    ConflictingStorageOverride(alloy_primitives::Address),

    #[error("both \"data\" and \"input\" are set and not equal")]
    ConflictingInput,

    #[error("header not found")]
    HeaderNotFound,

    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    #[error("{0}")]
    TransactionRejected(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("filter limit of {0} reached")]
    TooManyFilters(usize),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("{0}")]
    Internal(String),
}

impl From<BackendError> for RpcError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::HeaderNotFound => RpcError::HeaderNotFound,
            BackendError::ExecutionReverted(reason) => RpcError::ExecutionReverted(reason),
            BackendError::Unavailable(reason) => RpcError::Unavailable(reason),
            other => RpcError::Internal(other.to_string()),
        }
    }
}

impl From<PoolError> for RpcError {
    fn from(err: PoolError) -> Self {
        RpcError::TransactionRejected(err.to_string())
    }
}

impl RpcError {
    pub fn code(&self) -> i32 {
        match self {
            RpcError::InvalidParams(_)
            | RpcError::InvalidTransactionIndex
            | RpcError::InvalidBlockRange { .. }
            | RpcError::BlockHashWithRange
            | RpcError::TooManyTopics(_)
            | RpcError::ConflictingStorageOverride(_)
            | RpcError::ConflictingInput => codes::INVALID_PARAMS,
            RpcError::HeaderNotFound => codes::RESOURCE_NOT_FOUND,
            RpcError::ExecutionReverted(_) => codes::EXECUTION_REVERTED,
            RpcError::TransactionRejected(_) => codes::TRANSACTION_REJECTED,
            RpcError::Unavailable(_) | RpcError::TooManyFilters(_) | RpcError::Timeout(_) => {
                codes::RESOURCE_UNAVAILABLE
            }
            RpcError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }
}

impl From<RpcError> for ErrorObjectOwned {
    fn from(err: RpcError) -> Self {
        ErrorObjectOwned::owned(err.code(), err.to_string(), None::<()>)
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;
