//! The facade itself and the transport bootstrap.
//!
//! [`EthFacade`] is built in one step from a complete [`Collaborators`] set;
//! there is no way to obtain a facade that is missing a dependency. Every
//! call that reaches a collaborator runs under the configured deadline, and
//! dropping the request future drops the collaborator call with it.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use async_trait::async_trait;
use ethcompat_backend::{Collaborators, PoolWriter};
use ethcompat_rpc_types::{
    BlockSelector, CallRequest, FilterChanges, FilterCriteria, RpcBlock, RpcHeader, RpcLog,
    RpcReceipt, RpcTransaction, StateOverride,
};
use jsonrpsee::core::{RegisterMethodError, SubscriptionResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::{PendingSubscriptionSink, RpcModule};

use crate::api::{EthApiServer, EthPubSubApiServer};
use crate::config::FacadeConfig;
use crate::error::{RpcError, RpcResult};
use crate::filters::{FilterId, FilterRegistry};
use crate::lookup::ChainLookup;
use crate::metrics::FacadeMetrics;
use crate::subscriptions::Subscriptions;
use crate::unsupported::register_stubs;

/// Ethereum JSON-RPC facade over a native node.
#[derive(Clone)]
pub struct EthFacade {
    chain_id: u64,
    request_timeout: Duration,
    lookup: Arc<ChainLookup>,
    filters: Arc<FilterRegistry>,
    subscriptions: Subscriptions,
    submitter: Arc<dyn PoolWriter>,
    metrics: FacadeMetrics,
}

impl EthFacade {
    pub fn new(config: &FacadeConfig, collaborators: &Collaborators, metrics: FacadeMetrics) -> Self {
        Self {
            chain_id: config.chain_id,
            request_timeout: config.rpc.request_timeout(),
            lookup: Arc::new(ChainLookup::new(collaborators)),
            filters: Arc::new(FilterRegistry::new(
                collaborators,
                config.filters.max_filters,
                metrics.clone(),
            )),
            subscriptions: Subscriptions::new(collaborators.filters.clone(), metrics.clone()),
            submitter: collaborators.submitter.clone(),
            metrics,
        }
    }

    /// Installed filters, for the owner's idle sweep.
    pub fn filters(&self) -> &Arc<FilterRegistry> {
        &self.filters
    }

    pub fn metrics(&self) -> &FacadeMetrics {
        &self.metrics
    }

    /// The full method table: the `eth_` API, pub/sub and the fixed stubs.
    pub fn into_module(self) -> Result<RpcModule<()>, RegisterMethodError> {
        let metrics = self.metrics.clone();
        let mut module = RpcModule::new(());
        module.merge(EthApiServer::into_rpc(self.clone()))?;
        module.merge(EthPubSubApiServer::into_rpc(self))?;
        register_stubs(&mut module, metrics)?;
        Ok(module)
    }

    async fn bounded<T, F>(&self, work: F) -> Result<T, ErrorObjectOwned>
    where
        F: Future<Output = RpcResult<T>>,
    {
        match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result.map_err(ErrorObjectOwned::from),
            Err(_) => {
                let millis = self.request_timeout.as_millis() as u64;
                tracing::warn!(timeout_ms = millis, "request deadline expired");
                Err(RpcError::Timeout(millis).into())
            }
        }
    }
}

#[async_trait]
impl EthApiServer for EthFacade {
    async fn chain_id(&self) -> Result<U64, ErrorObjectOwned> {
        Ok(U64::from(self.chain_id))
    }

    async fn block_number(&self) -> Result<U64, ErrorObjectOwned> {
        self.bounded(self.lookup.head_number()).await
    }

    async fn get_balance(
        &self,
        address: Address,
        block: Option<BlockSelector>,
    ) -> Result<U256, ErrorObjectOwned> {
        self.bounded(self.lookup.balance(address, block.unwrap_or_default()))
            .await
    }

    async fn get_code(
        &self,
        address: Address,
        block: Option<BlockSelector>,
    ) -> Result<Bytes, ErrorObjectOwned> {
        self.bounded(self.lookup.code(address, block.unwrap_or_default()))
            .await
    }

    async fn get_storage_at(
        &self,
        address: Address,
        position: U256,
        block: Option<BlockSelector>,
    ) -> Result<B256, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .storage_at(address, position, block.unwrap_or_default()),
        )
        .await
    }

    async fn get_transaction_count(
        &self,
        address: Address,
        block: Option<BlockSelector>,
    ) -> Result<U64, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .transaction_count(address, block.unwrap_or_default()),
        )
        .await
    }

    async fn get_block_by_number(
        &self,
        block: BlockSelector,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, ErrorObjectOwned> {
        self.bounded(self.lookup.block(block, full_transactions))
            .await
    }

    async fn get_block_by_hash(
        &self,
        hash: B256,
        full_transactions: bool,
    ) -> Result<Option<RpcBlock>, ErrorObjectOwned> {
        self.bounded(self.lookup.block(BlockSelector::Hash(hash), full_transactions))
            .await
    }

    async fn get_header_by_number(
        &self,
        block: BlockSelector,
    ) -> Result<Option<RpcHeader>, ErrorObjectOwned> {
        self.bounded(self.lookup.header(block)).await
    }

    async fn get_header_by_hash(&self, hash: B256) -> Result<Option<RpcHeader>, ErrorObjectOwned> {
        self.bounded(self.lookup.header(BlockSelector::Hash(hash)))
            .await
    }

    async fn get_block_transaction_count_by_number(
        &self,
        block: BlockSelector,
    ) -> Result<Option<U64>, ErrorObjectOwned> {
        self.bounded(self.lookup.block_transaction_count(block))
            .await
    }

    async fn get_block_transaction_count_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<U64>, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .block_transaction_count(BlockSelector::Hash(hash)),
        )
        .await
    }

    async fn get_uncle_count_by_block_number(
        &self,
        block: BlockSelector,
    ) -> Result<Option<U64>, ErrorObjectOwned> {
        self.bounded(self.lookup.uncle_count(block)).await
    }

    async fn get_uncle_count_by_block_hash(
        &self,
        hash: B256,
    ) -> Result<Option<U64>, ErrorObjectOwned> {
        self.bounded(self.lookup.uncle_count(BlockSelector::Hash(hash)))
            .await
    }

    async fn get_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned> {
        self.bounded(self.lookup.transaction_by_hash(hash)).await
    }

    async fn get_transaction_by_block_number_and_index(
        &self,
        block: BlockSelector,
        index: U64,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned> {
        self.bounded(self.lookup.transaction_by_block_and_index(block, index))
            .await
    }

    async fn get_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> Result<Option<RpcTransaction>, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .transaction_by_block_and_index(BlockSelector::Hash(hash), index),
        )
        .await
    }

    async fn get_raw_transaction_by_hash(
        &self,
        hash: B256,
    ) -> Result<Option<Bytes>, ErrorObjectOwned> {
        self.bounded(self.lookup.raw_transaction_by_hash(hash))
            .await
    }

    async fn get_raw_transaction_by_block_number_and_index(
        &self,
        block: BlockSelector,
        index: U64,
    ) -> Result<Option<Bytes>, ErrorObjectOwned> {
        self.bounded(self.lookup.raw_transaction_by_block_and_index(block, index))
            .await
    }

    async fn get_raw_transaction_by_block_hash_and_index(
        &self,
        hash: B256,
        index: U64,
    ) -> Result<Option<Bytes>, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .raw_transaction_by_block_and_index(BlockSelector::Hash(hash), index),
        )
        .await
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<RpcReceipt>, ErrorObjectOwned> {
        self.bounded(self.lookup.receipt(hash)).await
    }

    async fn send_raw_transaction(&self, data: Bytes) -> Result<B256, ErrorObjectOwned> {
        let hash = self
            .bounded(async { self.submitter.submit(data).await.map_err(RpcError::from) })
            .await?;
        tracing::debug!(%hash, "accepted raw transaction");
        Ok(hash)
    }

    async fn call(
        &self,
        request: CallRequest,
        block: Option<BlockSelector>,
        overrides: Option<StateOverride>,
    ) -> Result<Bytes, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .call(&request, block.unwrap_or_default(), overrides.as_ref()),
        )
        .await
    }

    async fn estimate_gas(
        &self,
        request: CallRequest,
        block: Option<BlockSelector>,
    ) -> Result<U64, ErrorObjectOwned> {
        self.bounded(
            self.lookup
                .estimate_gas(&request, block.unwrap_or_default()),
        )
        .await
    }

    async fn gas_price(&self) -> Result<U256, ErrorObjectOwned> {
        self.bounded(self.lookup.gas_price()).await
    }

    async fn max_priority_fee_per_gas(&self) -> Result<U256, ErrorObjectOwned> {
        self.bounded(self.lookup.max_priority_fee()).await
    }

    async fn get_logs(&self, criteria: FilterCriteria) -> Result<Vec<RpcLog>, ErrorObjectOwned> {
        self.bounded(self.filters.logs(&criteria)).await
    }

    async fn new_filter(&self, criteria: FilterCriteria) -> Result<FilterId, ErrorObjectOwned> {
        self.bounded(self.filters.new_log_filter(&criteria)).await
    }

    async fn new_block_filter(&self) -> Result<FilterId, ErrorObjectOwned> {
        self.bounded(self.filters.new_block_filter()).await
    }

    async fn new_pending_transaction_filter(&self) -> Result<FilterId, ErrorObjectOwned> {
        Ok(self.filters.new_pending_transaction_filter()?)
    }

    async fn get_filter_changes(&self, id: FilterId) -> Result<FilterChanges, ErrorObjectOwned> {
        self.bounded(self.filters.changes(&id)).await
    }

    async fn get_filter_logs(&self, id: FilterId) -> Result<Vec<RpcLog>, ErrorObjectOwned> {
        self.bounded(self.filters.filter_logs(&id)).await
    }

    async fn uninstall_filter(&self, id: FilterId) -> Result<bool, ErrorObjectOwned> {
        Ok(self.filters.uninstall(&id))
    }

    async fn pending_transactions(&self) -> Result<Vec<RpcTransaction>, ErrorObjectOwned> {
        self.bounded(self.lookup.pending_transactions()).await
    }

    async fn sign(&self, address: Address, data: Bytes) -> Result<Bytes, ErrorObjectOwned> {
        self.bounded(self.lookup.sign(address, &data)).await
    }
}

#[async_trait]
impl EthPubSubApiServer for EthFacade {
    async fn subscribe(
        &self,
        pending: PendingSubscriptionSink,
        kind: String,
        params: Option<serde_json::Value>,
    ) -> SubscriptionResult {
        self.subscriptions.accept(pending, &kind, params).await
    }
}

/// Bind the configured address and serve HTTP and WebSocket JSON-RPC.
pub async fn start_server(
    config: &FacadeConfig,
    facade: EthFacade,
) -> Result<ServerHandle, Box<dyn std::error::Error + Send + Sync>> {
    let server = Server::builder()
        .max_connections(config.rpc.max_connections)
        .build(config.rpc.http_addr)
        .await?;
    let addr = server.local_addr()?;
    let module = facade.into_module()?;

    tracing::info!(%addr, chain_id = config.chain_id, "JSON-RPC server listening");
    Ok(server.start(module))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::unsupported::UNSUPPORTED_METHODS;
    use ethcompat_backend::{
        BackendResult, ChainReader, MemoryBackend, NativeBlock, NativeHeader, NativeTransaction,
        PoolError, ReceiptLookup, TxLookup,
    };
    use jsonrpsee::rpc_params;
    use serde_json::{json, Value};

    const CHAIN_ID: u64 = 1001;

    /// Test encoding: byte 0 is the sender, byte 1 the nonce, byte 2 the gas
    /// price.
    fn backend() -> Arc<MemoryBackend> {
        Arc::new(MemoryBackend::default().with_decoder(|raw| {
            if raw.len() != 3 {
                return Err(PoolError::MalformedEncoding(format!("{} bytes", raw.len())));
            }
            Ok(NativeTransaction {
                hash: alloy_primitives::keccak256(raw),
                sender: Address::repeat_byte(raw[0]),
                recipient: Some(Address::repeat_byte(0xee)),
                nonce: u64::from(raw[1]),
                gas_limit: 21_000,
                gas_price: U256::from(raw[2]),
                ..Default::default()
            })
        }))
    }

    fn facade_with(collaborators: &Collaborators, config: &FacadeConfig) -> EthFacade {
        EthFacade::new(config, collaborators, FacadeMetrics::default())
    }

    fn facade(backend: &Arc<MemoryBackend>) -> EthFacade {
        facade_with(
            &Collaborators::from_shared(backend.clone()),
            &FacadeConfig::new(CHAIN_ID),
        )
    }

    #[tokio::test]
    async fn test_chain_id_and_block_number() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();

        let chain_id: String = module.call("eth_chainId", rpc_params![]).await.unwrap();
        assert_eq!(chain_id, "0x3e9");

        backend.mine_pending(1).unwrap();
        backend.mine_pending(2).unwrap();
        let number: U64 = module.call("eth_blockNumber", rpc_params![]).await.unwrap();
        assert_eq!(number, U64::from(2u64));
    }

    #[tokio::test]
    async fn test_missing_entities_are_null() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();

        for (method, params) in [
            ("eth_getBlockByNumber", rpc_params!["0xf423f", false]),
            ("eth_getBlockByHash", rpc_params![B256::repeat_byte(9), true]),
            ("eth_getTransactionByHash", rpc_params![B256::repeat_byte(9)]),
            ("eth_getTransactionReceipt", rpc_params![B256::repeat_byte(9)]),
            ("eth_getTransactionByBlockNumberAndIndex", rpc_params!["0xf423f", "0x0"]),
            ("eth_getBlockTransactionCountByNumber", rpc_params!["0xf423f"]),
            ("eth_getHeaderByHash", rpc_params![B256::repeat_byte(9)]),
        ] {
            let value: Value = module.call(method, params).await.unwrap();
            assert_eq!(value, Value::Null, "{method}");
        }
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_an_error() {
        let backend = backend();
        let facade = facade(&backend);

        let err = facade
            .get_transaction_by_block_number_and_index(BlockSelector::Earliest, U64::ZERO)
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
        assert_eq!(err.message(), "invalid transaction index");

        let err = facade
            .get_raw_transaction_by_block_hash_and_index(backend.genesis_hash(), U64::from(3u64))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_state_at_unknown_hash_is_header_not_found() {
        let backend = backend();
        let facade = facade(&backend);

        let err = facade
            .get_balance(Address::ZERO, Some(BlockSelector::Hash(B256::repeat_byte(7))))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::RESOURCE_NOT_FOUND);
        assert_eq!(err.message(), "header not found");
    }

    #[tokio::test]
    async fn test_send_raw_transaction_passes_pool_errors_through() {
        let backend = backend();
        let facade = facade(&backend);

        let hash = facade
            .send_raw_transaction(Bytes::from_static(&[1, 0, 5]))
            .await
            .unwrap();
        assert_eq!(hash, alloy_primitives::keccak256([1u8, 0, 5]));

        let err = facade
            .send_raw_transaction(Bytes::from_static(&[1, 0, 5]))
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::TRANSACTION_REJECTED);
        assert_eq!(err.message(), PoolError::AlreadyKnown.to_string());

        let err = facade
            .send_raw_transaction(Bytes::from_static(&[2, 0, 0]))
            .await
            .unwrap_err();
        assert_eq!(
            err.message(),
            PoolError::Underpriced {
                offered: U256::ZERO,
                required: U256::from(1u64),
            }
            .to_string()
        );

        let err = facade
            .send_raw_transaction(Bytes::from_static(&[1]))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "malformed transaction encoding: 1 bytes");
    }

    #[tokio::test]
    async fn test_pending_transaction_gains_linkage_when_mined() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();

        let hash: B256 = module
            .call("eth_sendRawTransaction", rpc_params!["0x010007"])
            .await
            .unwrap();

        let pending: Value = module
            .call("eth_getTransactionByHash", rpc_params![hash])
            .await
            .unwrap();
        assert_eq!(pending["blockHash"], Value::Null);
        assert_eq!(pending["blockNumber"], Value::Null);
        assert_eq!(pending["transactionIndex"], Value::Null);
        let receipt: Value = module
            .call("eth_getTransactionReceipt", rpc_params![hash])
            .await
            .unwrap();
        assert_eq!(receipt, Value::Null);

        let nonce: U64 = module
            .call(
                "eth_getTransactionCount",
                rpc_params![Address::repeat_byte(1), "pending"],
            )
            .await
            .unwrap();
        assert_eq!(nonce, U64::from(1u64));

        let header = backend.mine_pending(10).unwrap();
        let mined: Value = module
            .call("eth_getTransactionByHash", rpc_params![hash])
            .await
            .unwrap();
        assert_eq!(mined["blockHash"], json!(header.hash));
        assert_eq!(mined["blockNumber"], json!("0x1"));
        assert_eq!(mined["transactionIndex"], json!("0x0"));

        let receipt: Value = module
            .call("eth_getTransactionReceipt", rpc_params![hash])
            .await
            .unwrap();
        assert_eq!(receipt["status"], json!("0x1"));
        assert_eq!(receipt["contractAddress"], Value::Null);
        assert_eq!(receipt["logs"], json!([]));
    }

    #[tokio::test]
    async fn test_block_filter_over_the_wire() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();

        let id: String = module.call("eth_newBlockFilter", rpc_params![]).await.unwrap();
        let header = backend.mine_pending(1).unwrap();

        let changes: Vec<B256> = module
            .call("eth_getFilterChanges", rpc_params![id.clone()])
            .await
            .unwrap();
        assert_eq!(changes, vec![header.hash]);
        let changes: Vec<B256> = module
            .call("eth_getFilterChanges", rpc_params![id.clone()])
            .await
            .unwrap();
        assert!(changes.is_empty());

        let removed: bool = module
            .call("eth_uninstallFilter", rpc_params![id.clone()])
            .await
            .unwrap();
        assert!(removed);
        let removed: bool = module
            .call("eth_uninstallFilter", rpc_params![id])
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_get_logs_rejects_hash_with_range() {
        let backend = backend();
        let facade = facade(&backend);
        let err = facade
            .get_logs(FilterCriteria {
                from_block: Some(BlockSelector::Earliest),
                block_hash: Some(backend.genesis_hash()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), codes::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_subscriptions_cancel_independently() {
        let backend = backend();
        let facade = facade(&backend);
        let metrics = facade.metrics().clone();
        let module = facade.into_module().unwrap();

        let first = module
            .subscribe_unbounded("eth_subscribe", rpc_params!["newHeads"])
            .await
            .unwrap();
        let mut second = module
            .subscribe_unbounded("eth_subscribe", rpc_params!["newHeads"])
            .await
            .unwrap();
        drop(first);

        let header = backend.mine_pending(1).unwrap();
        let (notification, _) = tokio::time::timeout(Duration::from_secs(5), second.next::<Value>())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(notification["hash"], json!(header.hash));
        assert_eq!(notification["number"], json!("0x1"));

        for _ in 0..100 {
            if metrics.open_subscriptions.get() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(metrics.open_subscriptions.get(), 1);
    }

    #[tokio::test]
    async fn test_pending_transaction_subscription() {
        let backend = backend();
        let facade = facade(&backend);
        let submitter = facade.clone();
        let module = facade.into_module().unwrap();

        let mut sub = module
            .subscribe_unbounded("eth_subscribe", rpc_params!["newPendingTransactions"])
            .await
            .unwrap();
        let hash = submitter
            .send_raw_transaction(Bytes::from_static(&[3, 0, 9]))
            .await
            .unwrap();

        let (notified, _) = tokio::time::timeout(Duration::from_secs(5), sub.next::<B256>())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(notified, hash);
    }

    #[tokio::test]
    async fn test_unknown_subscription_kind_is_rejected() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();
        assert!(module
            .subscribe_unbounded("eth_subscribe", rpc_params!["syncing"])
            .await
            .is_err());
        assert!(module
            .subscribe_unbounded(
                "eth_subscribe",
                rpc_params![
                    "logs",
                    json!({"fromBlock": "0x0", "blockHash": backend.genesis_hash()})
                ]
            )
            .await
            .is_err());
        assert!(module
            .subscribe_unbounded(
                "eth_subscribe",
                rpc_params!["logs", json!({"fromBlock": "0x9", "toBlock": "0x1"})]
            )
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_log_subscription_takes_filter_object() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();
        for params in [
            json!({"fromBlock": "latest"}),
            json!({"fromBlock": "0x0", "toBlock": "pending"}),
            json!({"blockHash": backend.genesis_hash(), "address": []}),
        ] {
            assert!(
                module
                    .subscribe_unbounded("eth_subscribe", rpc_params!["logs", params.clone()])
                    .await
                    .is_ok(),
                "{params}"
            );
        }
    }

    #[tokio::test]
    async fn test_stub_table_is_served() {
        let backend = backend();
        let module = facade(&backend).into_module().unwrap();
        let names: Vec<&str> = module.method_names().collect();
        for (method, _) in UNSUPPORTED_METHODS {
            assert!(names.contains(method), "{method} not registered");
        }
        let mining: bool = module.call("eth_mining", rpc_params![]).await.unwrap();
        assert!(!mining);
    }

    /// Chain reader whose every call outlives any reasonable deadline.
    struct StalledChain;

    #[async_trait]
    impl ChainReader for StalledChain {
        async fn head_number(&self) -> BackendResult<u64> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(0)
        }
        async fn block(&self, _: ethcompat_backend::BlockRef) -> BackendResult<Option<NativeBlock>> {
            Ok(None)
        }
        async fn header(
            &self,
            _: ethcompat_backend::BlockRef,
        ) -> BackendResult<Option<NativeHeader>> {
            Ok(None)
        }
        async fn transaction(&self, _: B256) -> BackendResult<Option<TxLookup>> {
            Ok(None)
        }
        async fn receipt(&self, _: B256) -> BackendResult<Option<ReceiptLookup>> {
            Ok(None)
        }
        async fn gas_price(&self) -> BackendResult<U256> {
            Ok(U256::ZERO)
        }
        async fn max_priority_fee(&self) -> BackendResult<U256> {
            Ok(U256::ZERO)
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_an_error() {
        let mut collaborators = Collaborators::from_shared(backend());
        collaborators.chain = Arc::new(StalledChain);
        let mut config = FacadeConfig::new(CHAIN_ID);
        config.rpc.request_timeout_ms = 20;
        let facade = facade_with(&collaborators, &config);

        let err = facade.block_number().await.unwrap_err();
        assert_eq!(err.code(), codes::RESOURCE_UNAVAILABLE);
        assert_eq!(err.message(), "request timed out after 20 ms");

        // Calls that never reach a collaborator are not affected.
        assert_eq!(facade.chain_id().await.unwrap(), U64::from(CHAIN_ID));
    }
}
