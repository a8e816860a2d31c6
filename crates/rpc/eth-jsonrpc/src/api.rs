//! JSON-RPC API trait definitions using jsonrpsee.
//!
//! Methods answered from the fixed stub table (mining, uncles, `accounts`,
//! `syncing`) are not declared here; see [`crate::unsupported`].

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use ethcompat_rpc_types::{
    BlockSelector, CallRequest, FilterChanges, FilterCriteria, RpcBlock, RpcHeader, RpcLog,
    RpcReceipt, RpcTransaction, StateOverride,
};
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;

use crate::filters::FilterId;

/// Ethereum namespace RPC API.
#[rpc(server, namespace = "eth")]
pub trait EthApi {
    #[method(name = "chainId")]
    async fn chain_id(&self) -> Result<U64, ErrorObjectOwned>;

    #[method(name = "blockNumber")]
    async fn block_number(&self) -> Result<U64, ErrorObjectOwned>;

    #[method(name = "getBalance")]
    async fn get_balance(
        &self,
        address: Address,
        block: Option<BlockSelector>,
    ) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "getCode")]
    async fn get_code(
        &self,
        address: Address,
        block: Option<BlockSelector>,
    ) -> Result<Bytes, ErrorObjectOwned>;

    #[method(name = "getStorageAt")]
    async fn get_storage_at(
        &self,
        address: Address,
        position: U256,
        block: Option<BlockSelector>,
    ) -> Result<B256, ErrorObjectOwned>;

    /// Account nonce; at `pending` this counts pool-resident transactions.
    #[method(name = "getTransactionCount")]
    async fn get_transaction_count(
        &self,
        address: Address,
        block: Option<BlockSelector>,
    ) -> Result<U64, ErrorObjectOwned>;

    #[method(name = "getBlockByNumber")]
    async fn get_block_by_number(
        &self,
        block: BlockSelector,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, ErrorObjectOwned>;

    #[method(name = "getBlockByHash")]
    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, ErrorObjectOwned>;

    #[method(name = "getHeaderByNumber")]
    async fn get_header_by_number(
        &self,
        block: BlockSelector,
    ) -> Result<Option<RpcHeader>, ErrorObjectOwned>;

    #[method(name = "getHeaderByHash")]
    async fn get_header_by_hash(&self, hash: B256) -> Result<Option<RpcHeader>, ErrorObjectOwned>;

    #[method(name = "getBlockTransactionCountByNumber")]
    async fn get_block_transaction_count_by_number(
        &self,
        block: BlockSelector,
    ) -> Result<Option<U64>, ErrorObjectOwned>;

    #[method(name = "getBlockTransactionCountByHash")]
    async fn get_block_transaction_count_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<U64>, ErrorObjectOwned>;

    #[method(name = "getUncleCountByBlockNumber")]
    async fn get_uncle_count_by_block_number(
        &self,
        block: BlockSelector,
    ) -> Result<Option<U64>, ErrorObjectOwned>;

    #[method(name = "getUncleCountByBlockHash")]
    async fn get_uncle_count_by_block_hash(
        &self,
        hash: B256,
    ) -> Result<Option<U64>, ErrorObjectOwned>;

    /// Finalized chain first, then the pool.
    #[method(name = "getTransactionByHash")]
    async fn get_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned>;

    #[method(name = "getTransactionByBlockNumberAndIndex")]
    async fn get_transaction_by_block_number_and_index(
        &self,
        block: BlockSelector,
        index: U64,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned>;

    #[method(name = "getTransactionByBlockHashAndIndex")]
    async fn get_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned>;

    #[method(name = "getRawTransactionByHash")]
    async fn get_raw_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<Bytes>, ErrorObjectOwned>;

    #[method(name = "getRawTransactionByBlockNumberAndIndex")]
    async fn get_raw_transaction_by_block_number_and_index(
        &self,
        block: BlockSelector,
        index: U64,
    ) -> Result<Option<Bytes>, ErrorObjectOwned>;

    #[method(name = "getRawTransactionByBlockHashAndIndex")]
    async fn get_raw_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> Result<Option<Bytes>, ErrorObjectOwned>;

    #[method(name = "getTransactionReceipt")]
    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<RpcReceipt>, ErrorObjectOwned>;

    /// Pool rejections come back verbatim.
    #[method(name = "sendRawTransaction")]
    async fn send_raw_transaction(&self, data: Bytes) -> Result<B256, ErrorObjectOwned>;

    #[method(name = "call")]
    async fn call(
        &self,
        request: CallRequest,
        block: Option<BlockSelector>,
        overrides: Option<StateOverride>,
    ) -> Result<Bytes, ErrorObjectOwned>;

    #[method(name = "estimateGas")]
    async fn estimate_gas(
        &self,
        request: CallRequest,
        block: Option<BlockSelector>,
    ) -> Result<U64, ErrorObjectOwned>;

    #[method(name = "gasPrice")]
    async fn gas_price(&self) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "maxPriorityFeePerGas")]
    async fn max_priority_fee_per_gas(&self) -> Result<U256, ErrorObjectOwned>;

    #[method(name = "getLogs")]
    async fn get_logs(&self, criteria: FilterCriteria) -> Result<Vec<RpcLog>, ErrorObjectOwned>;

    #[method(name = "newFilter")]
    async fn new_filter(&self, criteria: FilterCriteria) -> Result<FilterId, ErrorObjectOwned>;

    #[method(name = "newBlockFilter")]
    async fn new_block_filter(&self) -> Result<FilterId, ErrorObjectOwned>;

    #[method(name = "newPendingTransactionFilter")]
    async fn new_pending_transaction_filter(&self) -> Result<FilterId, ErrorObjectOwned>;

    /// Hashes or logs since the previous poll; empty for an unknown id.
    #[method(name = "getFilterChanges")]
    async fn get_filter_changes(&self, id: FilterId) -> Result<FilterChanges, ErrorObjectOwned>;

    #[method(name = "getFilterLogs")]
    async fn get_filter_logs(&self, id: FilterId) -> Result<Vec<RpcLog>, ErrorObjectOwned>;

    #[method(name = "uninstallFilter")]
    async fn uninstall_filter(&self, id: FilterId) -> Result<bool, ErrorObjectOwned>;

    /// Pool transactions sent from locally managed accounts.
    #[method(name = "pendingTransactions")]
    async fn pending_transactions(&self) -> Result<Vec<RpcTransaction>, ErrorObjectOwned>;

    #[method(name = "sign")]
    async fn sign(&self, address: Address, data: Bytes) -> Result<Bytes, ErrorObjectOwned>;
}

/// Ethereum pub/sub API for WebSocket subscriptions.
#[rpc(server, namespace = "eth")]
pub trait EthPubSubApi {
    /// `newHeads`, `logs` (with optional address/topics) or
    /// `newPendingTransactions`.
    #[subscription(name = "subscribe" => "subscription", unsubscribe = "unsubscribe", item = serde_json::Value)]
    async fn subscribe(
        &self,
        kind: String,
        params: Option<serde_json::Value>,
    ) -> SubscriptionResult;
}
