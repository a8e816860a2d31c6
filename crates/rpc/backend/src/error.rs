//! Error types reported by collaborators.

use alloy_primitives::{Address, U256};
use thiserror::Error;

/// Failures of the chain database, state reader, executor or account
/// directory. Messages are forwarded to RPC callers verbatim.
#[derive(Debug, Error)]
pub enum BackendError {
    /// A state query named a block the database does not have.
    #[error("header not found")]
    HeaderNotFound,

    #[error("database error: {0}")]
    Database(String),

    /// The collaborator cannot serve this request right now.
    #[error("{0}")]
    Unavailable(String),

    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    #[error("unknown account {0}")]
    UnknownAccount(Address),

    #[error("account {0} is locked")]
    AccountLocked(Address),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for collaborator reads.
pub type BackendResult<T> = Result<T, BackendError>;

/// Rejections from the transaction pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("malformed transaction encoding: {0}")]
    MalformedEncoding(String),

    #[error("already known")]
    AlreadyKnown,

    #[error("nonce too low: sender {sender} next nonce {expected}, got {got}")]
    NonceTooLow {
        sender: Address,
        expected: u64,
        got: u64,
    },

    #[error("transaction underpriced: gas price {offered} below required {required}")]
    Underpriced { offered: U256, required: U256 },

    #[error("replacement transaction underpriced")]
    ReplacementUnderpriced,

    #[error("txpool is full")]
    PoolFull,

    #[error("internal pool error: {0}")]
    Internal(String),
}

pub type PoolResult<T> = Result<T, PoolError>;
