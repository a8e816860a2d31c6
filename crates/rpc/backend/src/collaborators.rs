//! Interfaces the facade consumes.
//!
//! Every method is a suspension point. Implementations own all chain and pool
//! data; callers receive owned snapshots and never mutate them.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};

use crate::error::{BackendResult, PoolResult};
use crate::types::{
    BlockRef, LogQuery, NativeBlock, NativeCallArgs, NativeHeader, NativeLog,
    NativeStateOverride, NativeTransaction, ReceiptLookup, TxLookup,
};

/// Read access to finalized blocks and the pending block.
#[async_trait]
pub trait ChainReader: Send + Sync + 'static {
    async fn head_number(&self) -> BackendResult<u64>;

    /// `None` when no block exists at `at`.
    async fn block(&self, at: BlockRef) -> BackendResult<Option<NativeBlock>>;

    async fn header(&self, at: BlockRef) -> BackendResult<Option<NativeHeader>>;

    /// Transaction plus inclusion point in one consistent read.
    async fn transaction(&self, hash: B256) -> BackendResult<Option<TxLookup>>;

    /// Transaction, inclusion point and receipt in one consistent read.
    async fn receipt(&self, hash: B256) -> BackendResult<Option<ReceiptLookup>>;

    async fn gas_price(&self) -> BackendResult<U256>;

    async fn max_priority_fee(&self) -> BackendResult<U256>;
}

/// Account state at a block. An unknown block is
/// [`BackendError::HeaderNotFound`](crate::BackendError::HeaderNotFound).
#[async_trait]
pub trait StateReader: Send + Sync + 'static {
    async fn balance(&self, address: Address, at: BlockRef) -> BackendResult<U256>;
    async fn nonce(&self, address: Address, at: BlockRef) -> BackendResult<u64>;
    async fn code(&self, address: Address, at: BlockRef) -> BackendResult<Bytes>;
    async fn storage_at(&self, address: Address, slot: B256, at: BlockRef) -> BackendResult<B256>;
}

/// Message-call execution against a block's state.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn call(
        &self,
        args: &NativeCallArgs,
        at: BlockRef,
        overrides: Option<&NativeStateOverride>,
    ) -> BackendResult<Bytes>;

    async fn estimate_gas(&self, args: &NativeCallArgs, at: BlockRef) -> BackendResult<u64>;
}

#[async_trait]
pub trait PoolReader: Send + Sync + 'static {
    async fn transaction(&self, hash: B256) -> BackendResult<Option<NativeTransaction>>;

    async fn pending(&self) -> BackendResult<Vec<NativeTransaction>>;

    /// Next nonce for `address` counting pool-resident transactions.
    async fn next_nonce(&self, address: Address) -> BackendResult<u64>;
}

#[async_trait]
pub trait PoolWriter: Send + Sync + 'static {
    /// Decode, validate and admit a canonically encoded transaction.
    async fn submit(&self, raw: Bytes) -> PoolResult<B256>;
}

/// Live event streams and historical log queries.
///
/// Each call to a `subscribe_*` method hands out an independent receiver;
/// dropping it detaches that consumer only.
#[async_trait]
pub trait FilterEngine: Send + Sync + 'static {
    fn subscribe_new_heads(&self) -> broadcast::Receiver<Arc<NativeHeader>>;

    /// Logs are delivered in per-block batches.
    fn subscribe_logs(&self) -> broadcast::Receiver<Arc<[NativeLog]>>;

    fn subscribe_pending_transactions(&self) -> broadcast::Receiver<B256>;

    /// Pending transaction hashes for a polling consumer. Unlike the
    /// broadcast streams this queue never drops entries.
    fn pending_transaction_queue(&self) -> mpsc::UnboundedReceiver<B256>;

    async fn logs(&self, query: &LogQuery) -> BackendResult<Vec<NativeLog>>;
}

/// Locally managed accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync + 'static {
    async fn addresses(&self) -> BackendResult<Vec<Address>>;

    /// Sign `message`, already wrapped in the personal-message envelope.
    async fn sign(&self, address: Address, message: &[u8]) -> BackendResult<Bytes>;
}

/// The complete set of collaborator handles. Every field is required, so a
/// facade cannot exist half-wired.
#[derive(Clone)]
pub struct Collaborators {
    pub chain: Arc<dyn ChainReader>,
    pub state: Arc<dyn StateReader>,
    pub executor: Arc<dyn Executor>,
    pub pool: Arc<dyn PoolReader>,
    pub submitter: Arc<dyn PoolWriter>,
    pub filters: Arc<dyn FilterEngine>,
    pub accounts: Arc<dyn AccountDirectory>,
}

impl Collaborators {
    /// Use one backend object for every role.
    pub fn from_shared<B>(backend: Arc<B>) -> Self
    where
        B: ChainReader
            + StateReader
            + Executor
            + PoolReader
            + PoolWriter
            + FilterEngine
            + AccountDirectory,
    {
        Self {
            chain: backend.clone(),
            state: backend.clone(),
            executor: backend.clone(),
            pool: backend.clone(),
            submitter: backend.clone(),
            filters: backend.clone(),
            accounts: backend,
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
