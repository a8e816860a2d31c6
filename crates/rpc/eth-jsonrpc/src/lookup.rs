//! Selector resolution and collaborator lookups.
//!
//! Every block-scoped entry point funnels through [`ChainLookup::resolve`],
//! so `latest`, `pending`, `earliest`, numbers and hashes mean the same thing
//! for balances, code, storage, nonces, blocks and transactions alike.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use ethcompat_backend::{
    AccountDirectory, BlockRef, ChainReader, Collaborators, Executor, NativeBlock, PoolReader,
    StateReader,
};
use ethcompat_rpc_types::{
    BlockSelector, CallRequest, RpcBlock, RpcHeader, RpcReceipt, RpcTransaction, StateOverride,
};

use crate::error::{RpcError, RpcResult};
use crate::translate::{
    translate_block, translate_call_request, translate_header, translate_override_set,
    translate_receipt, translate_transaction, BlockLinkage,
};

pub struct ChainLookup {
    chain: Arc<dyn ChainReader>,
    state: Arc<dyn StateReader>,
    executor: Arc<dyn Executor>,
    pool: Arc<dyn PoolReader>,
    accounts: Arc<dyn AccountDirectory>,
}

impl ChainLookup {
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            chain: collaborators.chain.clone(),
            state: collaborators.state.clone(),
            executor: collaborators.executor.clone(),
            pool: collaborators.pool.clone(),
            accounts: collaborators.accounts.clone(),
        }
    }

    /// Symbolic positions are pinned to the current head; `pending` stays
    /// symbolic for the collaborator to interpret.
    pub async fn resolve(&self, selector: BlockSelector) -> RpcResult<BlockRef> {
        Ok(match selector {
            BlockSelector::Number(number) => BlockRef::Number(number),
            BlockSelector::Hash(hash) => BlockRef::Hash(hash),
            BlockSelector::Earliest => BlockRef::Number(0),
            BlockSelector::Latest => BlockRef::Number(self.chain.head_number().await?),
            BlockSelector::Pending => BlockRef::Pending,
        })
    }

    pub async fn head_number(&self) -> RpcResult<U64> {
        Ok(U64::from(self.chain.head_number().await?))
    }

    async fn native_block(&self, selector: BlockSelector) -> RpcResult<Option<NativeBlock>> {
        let at = self.resolve(selector).await?;
        Ok(self.chain.block(at).await?)
    }

    pub async fn block(
        &self,
        selector: BlockSelector,
        full_transactions: bool,
    ) -> RpcResult<Option<RpcBlock>> {
        let block = self.native_block(selector).await?;
        Ok(block.map(|block| translate_block(&block, full_transactions)))
    }

    pub async fn header(&self, selector: BlockSelector) -> RpcResult<Option<RpcHeader>> {
        let at = self.resolve(selector).await?;
        let header = self.chain.header(at).await?;
        Ok(header.as_ref().map(translate_header))
    }

    pub async fn block_transaction_count(&self, selector: BlockSelector) -> RpcResult<Option<U64>> {
        let block = self.native_block(selector).await?;
        Ok(block.map(|block| U64::from(block.transactions.len())))
    }

    /// Zero for any known block.
    pub async fn uncle_count(&self, selector: BlockSelector) -> RpcResult<Option<U64>> {
        let at = self.resolve(selector).await?;
        let header = self.chain.header(at).await?;
        Ok(header.map(|_| U64::ZERO))
    }

    /// Unknown block is `None`; a known block without that index is an error.
    pub async fn transaction_by_block_and_index(
        &self,
        selector: BlockSelector,
        index: U64,
    ) -> RpcResult<Option<RpcTransaction>> {
        let Some(block) = self.native_block(selector).await? else {
            return Ok(None);
        };
        let index = index.to::<u64>();
        let tx = block
            .transactions
            .get(index as usize)
            .ok_or(RpcError::InvalidTransactionIndex)?;
        let linkage = BlockLinkage::mined(block.header.hash, block.header.number, index);
        Ok(Some(translate_transaction(tx, linkage)))
    }

    pub async fn raw_transaction_by_block_and_index(
        &self,
        selector: BlockSelector,
        index: U64,
    ) -> RpcResult<Option<Bytes>> {
        let Some(block) = self.native_block(selector).await? else {
            return Ok(None);
        };
        let tx = block
            .transactions
            .get(index.to::<u64>() as usize)
            .ok_or(RpcError::InvalidTransactionIndex)?;
        Ok(Some(tx.raw.clone()))
    }

    /// Finalized chain first, then the pool.
    pub async fn transaction_by_hash(&self, hash: B256) -> RpcResult<Option<RpcTransaction>> {
        if let Some(found) = self.chain.transaction(hash).await? {
            let linkage = BlockLinkage::mined(found.block_hash, found.block_number, found.index);
            return Ok(Some(translate_transaction(&found.transaction, linkage)));
        }
        let pooled = self.pool.transaction(hash).await?;
        Ok(pooled.map(|tx| translate_transaction(&tx, BlockLinkage::PENDING)))
    }

    pub async fn raw_transaction_by_hash(&self, hash: B256) -> RpcResult<Option<Bytes>> {
        if let Some(found) = self.chain.transaction(hash).await? {
            return Ok(Some(found.transaction.raw));
        }
        Ok(self.pool.transaction(hash).await?.map(|tx| tx.raw))
    }

    pub async fn receipt(&self, hash: B256) -> RpcResult<Option<RpcReceipt>> {
        let lookup = self.chain.receipt(hash).await?;
        Ok(lookup.as_ref().and_then(translate_receipt))
    }

    pub async fn balance(&self, address: Address, selector: BlockSelector) -> RpcResult<U256> {
        let at = self.resolve(selector).await?;
        Ok(self.state.balance(address, at).await?)
    }

    pub async fn code(&self, address: Address, selector: BlockSelector) -> RpcResult<Bytes> {
        let at = self.resolve(selector).await?;
        Ok(self.state.code(address, at).await?)
    }

    pub async fn storage_at(
        &self,
        address: Address,
        slot: U256,
        selector: BlockSelector,
    ) -> RpcResult<B256> {
        let at = self.resolve(selector).await?;
        Ok(self.state.storage_at(address, B256::from(slot), at).await?)
    }

    /// At `pending` the pool's view wins, so queued transactions count.
    pub async fn transaction_count(
        &self,
        address: Address,
        selector: BlockSelector,
    ) -> RpcResult<U64> {
        let nonce = match self.resolve(selector).await? {
            BlockRef::Pending => self.pool.next_nonce(address).await?,
            at => self.state.nonce(address, at).await?,
        };
        Ok(U64::from(nonce))
    }

    pub async fn call(
        &self,
        request: &CallRequest,
        selector: BlockSelector,
        overrides: Option<&StateOverride>,
    ) -> RpcResult<Bytes> {
        let args = translate_call_request(request)?;
        let overrides = overrides.map(translate_override_set).transpose()?;
        let at = self.resolve(selector).await?;
        Ok(self.executor.call(&args, at, overrides.as_ref()).await?)
    }

    pub async fn estimate_gas(
        &self,
        request: &CallRequest,
        selector: BlockSelector,
    ) -> RpcResult<U64> {
        let args = translate_call_request(request)?;
        let at = self.resolve(selector).await?;
        Ok(U64::from(self.executor.estimate_gas(&args, at).await?))
    }

    pub async fn gas_price(&self) -> RpcResult<U256> {
        Ok(self.chain.gas_price().await?)
    }

    pub async fn max_priority_fee(&self) -> RpcResult<U256> {
        Ok(self.chain.max_priority_fee().await?)
    }

    /// Pool transactions sent from locally managed accounts.
    pub async fn pending_transactions(&self) -> RpcResult<Vec<RpcTransaction>> {
        let managed = self.accounts.addresses().await?;
        let pending = self.pool.pending().await?;
        Ok(pending
            .iter()
            .filter(|tx| managed.contains(&tx.sender))
            .map(|tx| translate_transaction(tx, BlockLinkage::PENDING))
            .collect())
    }

    /// Sign `data` with a managed key under the personal-message envelope.
    pub async fn sign(&self, address: Address, data: &[u8]) -> RpcResult<Bytes> {
        let message = personal_message(data);
        Ok(self.accounts.sign(address, &message).await?)
    }
}

/// `"\x19Ethereum Signed Message:\n" + len(data) + data`
pub fn personal_message(data: &[u8]) -> Vec<u8> {
    let prefix = format!("\x19Ethereum Signed Message:\n{}", data.len());
    let mut message = Vec::with_capacity(prefix.len() + data.len());
    message.extend_from_slice(prefix.as_bytes());
    message.extend_from_slice(data);
    message
}
