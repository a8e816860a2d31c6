//! In-memory implementation of every collaborator.
//!
//! Backs the development node and the facade's tests. Blocks are appended
//! with [`MemoryBackend::push_block`] or produced from the pool with
//! [`MemoryBackend::mine_pending`]; account state is snapshotted per block so
//! historical state queries work. There is no EVM: calls succeed only against
//! accounts without code.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use alloy_primitives::{keccak256, Address, Bloom, Bytes, B256, U256};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};

use crate::collaborators::{
    AccountDirectory, ChainReader, Executor, FilterEngine, PoolReader, PoolWriter, StateReader,
};
use crate::error::{BackendError, BackendResult, PoolError, PoolResult};
use crate::events::EventHub;
use crate::types::{
    BlockRef, LogQuery, LogRange, NativeBlock, NativeCallArgs, NativeHeader, NativeLog,
    NativeReceipt, NativeStateOverride, NativeTransaction, ReceiptLookup, TxLookup,
};

/// Gas charged for a plain value transfer.
pub const TRANSFER_GAS: u64 = 21_000;

/// Decodes a canonical transaction encoding into the native record.
pub type TxDecoder = dyn Fn(&[u8]) -> PoolResult<NativeTransaction> + Send + Sync;

/// Signs a message on behalf of a managed account.
pub type MessageSigner = dyn Fn(Address, &[u8]) -> BackendResult<Bytes> + Send + Sync;

#[derive(Debug, Clone)]
pub struct MemoryBackendConfig {
    pub chain_id: u64,
    pub pool_capacity: usize,
    pub min_gas_price: U256,
    /// Suggested gas price reported to clients.
    pub gas_price: U256,
    pub max_priority_fee: U256,
    pub block_gas_limit: u64,
    /// Replacement transactions must raise the gas price by this percentage.
    pub price_bump_percent: u64,
}

impl Default for MemoryBackendConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            pool_capacity: 4096,
            min_gas_price: U256::from(1u64),
            gas_price: U256::from(1_000_000_000u64),
            max_priority_fee: U256::from(1_000_000_000u64),
            block_gas_limit: 30_000_000,
            price_bump_percent: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountState {
    pub balance: U256,
    pub nonce: u64,
    pub code: Bytes,
    pub storage: BTreeMap<B256, B256>,
}

type Snapshot = Arc<BTreeMap<Address, AccountState>>;

#[derive(Default)]
struct ChainData {
    blocks: Vec<NativeBlock>,
    by_hash: HashMap<B256, u64>,
    /// tx hash -> (block number, index)
    tx_locations: HashMap<B256, (u64, u64)>,
    receipts: HashMap<B256, NativeReceipt>,
    /// State after each block, indexed by number.
    snapshots: Vec<Snapshot>,
    /// State the next block builds on.
    working: BTreeMap<Address, AccountState>,
}

impl ChainData {
    fn head(&self) -> Option<&NativeBlock> {
        self.blocks.last()
    }

    /// Link `block` onto the head and make `post_state` the working state.
    /// Nothing changes when the block does not extend the head.
    fn append(
        &mut self,
        block: &NativeBlock,
        receipts: Vec<NativeReceipt>,
        post_state: BTreeMap<Address, AccountState>,
    ) -> BackendResult<()> {
        let header = &block.header;
        if receipts.len() != block.transactions.len() {
            return Err(BackendError::Internal(format!(
                "block {} has {} transactions but {} receipts",
                header.number,
                block.transactions.len(),
                receipts.len()
            )));
        }
        let expected_number = self.blocks.len() as u64;
        if header.number != expected_number {
            return Err(BackendError::Internal(format!(
                "expected block {expected_number}, got {}",
                header.number
            )));
        }
        let parent = self.head().map(|b| b.header.hash).unwrap_or_default();
        if header.parent_hash != parent {
            return Err(BackendError::Internal(format!(
                "parent hash mismatch at height {}",
                header.number
            )));
        }

        for (index, (tx, receipt)) in block.transactions.iter().zip(receipts).enumerate() {
            self.tx_locations
                .insert(tx.hash, (header.number, index as u64));
            self.receipts.insert(tx.hash, receipt);
        }
        self.by_hash.insert(header.hash, header.number);
        self.working = post_state;
        self.snapshots.push(Arc::new(self.working.clone()));
        self.blocks.push(block.clone());
        Ok(())
    }

    fn number_of(&self, at: BlockRef) -> Option<u64> {
        match at {
            BlockRef::Number(number) => (number < self.blocks.len() as u64).then_some(number),
            BlockRef::Hash(hash) => self.by_hash.get(&hash).copied(),
            BlockRef::Pending => None,
        }
    }

    fn account(&self, address: Address, at: BlockRef) -> BackendResult<AccountState> {
        let accounts = match at {
            BlockRef::Pending => return Ok(self.working.get(&address).cloned().unwrap_or_default()),
            other => {
                let number = self.number_of(other).ok_or(BackendError::HeaderNotFound)?;
                self.snapshots
                    .get(number as usize)
                    .ok_or(BackendError::HeaderNotFound)?
            }
        };
        Ok(accounts.get(&address).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
struct PoolData {
    by_sender: BTreeMap<(Address, u64), NativeTransaction>,
    by_hash: HashMap<B256, (Address, u64)>,
}

pub struct MemoryBackend {
    config: MemoryBackendConfig,
    chain: RwLock<ChainData>,
    pool: RwLock<PoolData>,
    local_accounts: RwLock<BTreeSet<Address>>,
    events: EventHub,
    decoder: Option<Box<TxDecoder>>,
    signer: Option<Box<MessageSigner>>,
}

impl MemoryBackend {
    /// A chain holding only its genesis block.
    pub fn new(config: MemoryBackendConfig) -> Self {
        let mut genesis = NativeHeader {
            gas_limit: config.block_gas_limit,
            extra_data: Bytes::copy_from_slice(&config.chain_id.to_be_bytes()),
            ..Default::default()
        };
        genesis.hash = seal_hash(&genesis, &[]);

        let mut chain = ChainData::default();
        chain.by_hash.insert(genesis.hash, 0);
        chain.blocks.push(NativeBlock {
            header: genesis,
            transactions: vec![],
        });
        chain.snapshots.push(Arc::new(BTreeMap::new()));

        Self {
            config,
            chain: RwLock::new(chain),
            pool: RwLock::new(PoolData::default()),
            local_accounts: RwLock::new(BTreeSet::new()),
            events: EventHub::new(),
            decoder: None,
            signer: None,
        }
    }

    /// Install the transaction decoder used by [`PoolWriter::submit`].
    pub fn with_decoder<F>(mut self, decoder: F) -> Self
    where
        F: Fn(&[u8]) -> PoolResult<NativeTransaction> + Send + Sync + 'static,
    {
        self.decoder = Some(Box::new(decoder));
        self
    }

    /// Install the signer used by [`AccountDirectory::sign`].
    pub fn with_signer<F>(mut self, signer: F) -> Self
    where
        F: Fn(Address, &[u8]) -> BackendResult<Bytes> + Send + Sync + 'static,
    {
        self.signer = Some(Box::new(signer));
        self
    }

    pub fn config(&self) -> &MemoryBackendConfig {
        &self.config
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    pub fn genesis_hash(&self) -> B256 {
        self.chain.read().blocks[0].header.hash
    }

    pub fn head(&self) -> NativeHeader {
        let chain = self.chain.read();
        chain
            .head()
            .map(|block| block.header.clone())
            .unwrap_or_default()
    }

    /// Mark `address` as locally managed.
    pub fn add_local_account(&self, address: Address) {
        self.local_accounts.write().insert(address);
    }

    /// Overwrite an account in the working state. Takes effect for `pending`
    /// immediately and for `latest` once the next block is appended.
    pub fn set_account(&self, address: Address, state: AccountState) {
        self.chain.write().working.insert(address, state);
    }

    /// Append a fully formed block. `receipts` must align with the block's
    /// transactions. Included transactions leave the pool; the header and
    /// the block's logs are published.
    pub fn push_block(&self, block: NativeBlock, receipts: Vec<NativeReceipt>) -> BackendResult<()> {
        let logs: Vec<NativeLog> = receipts.iter().flat_map(|r| r.logs.iter().cloned()).collect();
        let mut chain = self.chain.write();
        let post_state = chain.working.clone();
        chain.append(&block, receipts, post_state)?;
        self.evict_included(&block.transactions);
        self.announce(block, logs);
        Ok(())
    }

    /// Seal every pool transaction into a new block at `timestamp`. Value
    /// transfers and nonces are applied; every transaction succeeds.
    ///
    /// The chain stays write-locked from reading the pool to publishing the
    /// header, and the transfers land in the working state only together with
    /// the block.
    pub fn mine_pending(&self, timestamp: u64) -> BackendResult<NativeHeader> {
        let mut chain = self.chain.write();
        let transactions: Vec<NativeTransaction> =
            self.pool.read().by_sender.values().cloned().collect();
        let parent = chain
            .head()
            .map(|block| block.header.clone())
            .unwrap_or_default();
        let mut post_state = chain.working.clone();

        let mut receipts = Vec::with_capacity(transactions.len());
        let mut cumulative = 0u64;
        for tx in &transactions {
            let gas_used = tx.gas_limit.min(TRANSFER_GAS);
            cumulative += gas_used;

            let sender = post_state.entry(tx.sender).or_default();
            sender.nonce = sender.nonce.max(tx.nonce + 1);
            sender.balance = sender.balance.saturating_sub(tx.value);

            let contract_address = match tx.recipient {
                Some(recipient) => {
                    let account = post_state.entry(recipient).or_default();
                    account.balance = account.balance.saturating_add(tx.value);
                    Address::ZERO
                }
                None => tx.sender.create(tx.nonce),
            };

            receipts.push(NativeReceipt {
                status: 1,
                cumulative_gas_used: cumulative,
                gas_used,
                logs: vec![],
                logs_bloom: Bloom::ZERO,
                contract_address,
            });
        }

        let tx_hashes: Vec<B256> = transactions.iter().map(|tx| tx.hash).collect();
        let mut header = NativeHeader {
            number: parent.number + 1,
            parent_hash: parent.hash,
            timestamp,
            gas_used: cumulative,
            gas_limit: self.config.block_gas_limit,
            base_fee: parent.base_fee,
            size: transactions.iter().map(|tx| tx.raw.len() as u64).sum(),
            ..Default::default()
        };
        header.hash = seal_hash(&header, &tx_hashes);

        let block = NativeBlock {
            header,
            transactions,
        };
        chain.append(&block, receipts, post_state)?;
        self.evict_included(&block.transactions);
        let header = block.header.clone();
        self.announce(block, vec![]);
        Ok(header)
    }

    fn evict_included(&self, transactions: &[NativeTransaction]) {
        let mut pool = self.pool.write();
        for tx in transactions {
            if let Some(key) = pool.by_hash.remove(&tx.hash) {
                pool.by_sender.remove(&key);
            }
        }
    }

    fn announce(&self, block: NativeBlock, logs: Vec<NativeLog>) {
        tracing::debug!(
            number = block.header.number,
            hash = %block.header.hash,
            txs = block.transactions.len(),
            "appended block"
        );
        self.events.publish_new_head(block.header);
        self.events.publish_logs(logs);
    }

    fn pending_block(&self, chain: &ChainData) -> NativeBlock {
        let parent = chain
            .head()
            .map(|block| block.header.clone())
            .unwrap_or_default();
        let transactions: Vec<NativeTransaction> =
            self.pool.read().by_sender.values().cloned().collect();
        NativeBlock {
            header: NativeHeader {
                number: parent.number + 1,
                hash: B256::ZERO,
                parent_hash: parent.hash,
                timestamp: parent.timestamp,
                gas_limit: self.config.block_gas_limit,
                base_fee: parent.base_fee,
                ..Default::default()
            },
            transactions,
        }
    }

    fn admit(&self, tx: NativeTransaction) -> PoolResult<B256> {
        let hash = tx.hash;
        if self.chain.read().tx_locations.contains_key(&hash) {
            return Err(PoolError::AlreadyKnown);
        }
        let account_nonce = self
            .chain
            .read()
            .working
            .get(&tx.sender)
            .map(|account| account.nonce)
            .unwrap_or_default();
        if tx.nonce < account_nonce {
            return Err(PoolError::NonceTooLow {
                sender: tx.sender,
                expected: account_nonce,
                got: tx.nonce,
            });
        }
        if tx.gas_price < self.config.min_gas_price {
            return Err(PoolError::Underpriced {
                offered: tx.gas_price,
                required: self.config.min_gas_price,
            });
        }

        let mut pool = self.pool.write();
        if pool.by_hash.contains_key(&hash) {
            return Err(PoolError::AlreadyKnown);
        }
        let key = (tx.sender, tx.nonce);
        match pool.by_sender.get(&key) {
            Some(existing) => {
                let bump = existing.gas_price * U256::from(self.config.price_bump_percent)
                    / U256::from(100u64);
                if tx.gas_price < existing.gas_price + bump {
                    return Err(PoolError::ReplacementUnderpriced);
                }
                let replaced = existing.hash;
                pool.by_hash.remove(&replaced);
            }
            None if pool.by_sender.len() >= self.config.pool_capacity => {
                return Err(PoolError::PoolFull);
            }
            None => {}
        }
        pool.by_hash.insert(hash, key);
        pool.by_sender.insert(key, tx);
        drop(pool);

        tracing::debug!(%hash, "admitted transaction to pool");
        self.events.publish_pending_transaction(hash);
        Ok(hash)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(MemoryBackendConfig::default())
    }
}

/// Deterministic block hash for blocks produced in memory.
pub fn seal_hash(header: &NativeHeader, tx_hashes: &[B256]) -> B256 {
    let mut preimage = Vec::with_capacity(32 * (3 + tx_hashes.len()) + 16);
    preimage.extend_from_slice(&header.number.to_be_bytes());
    preimage.extend_from_slice(header.parent_hash.as_slice());
    preimage.extend_from_slice(&header.timestamp.to_be_bytes());
    preimage.extend_from_slice(header.state_root.as_slice());
    preimage.extend_from_slice(&header.extra_data);
    for hash in tx_hashes {
        preimage.extend_from_slice(hash.as_slice());
    }
    keccak256(preimage)
}

#[async_trait]
impl ChainReader for MemoryBackend {
    async fn head_number(&self) -> BackendResult<u64> {
        Ok(self.chain.read().head().map(|b| b.header.number).unwrap_or_default())
    }

    async fn block(&self, at: BlockRef) -> BackendResult<Option<NativeBlock>> {
        let chain = self.chain.read();
        if at == BlockRef::Pending {
            return Ok(Some(self.pending_block(&chain)));
        }
        Ok(chain
            .number_of(at)
            .and_then(|number| chain.blocks.get(number as usize).cloned()))
    }

    async fn header(&self, at: BlockRef) -> BackendResult<Option<NativeHeader>> {
        Ok(ChainReader::block(self, at).await?.map(|block| block.header))
    }

    async fn transaction(&self, hash: B256) -> BackendResult<Option<TxLookup>> {
        let chain = self.chain.read();
        let Some(&(number, index)) = chain.tx_locations.get(&hash) else {
            return Ok(None);
        };
        let block = chain
            .blocks
            .get(number as usize)
            .ok_or_else(|| BackendError::Database(format!("missing block {number}")))?;
        let transaction = block
            .transactions
            .get(index as usize)
            .cloned()
            .ok_or_else(|| BackendError::Database(format!("missing tx {hash}")))?;
        Ok(Some(TxLookup {
            transaction,
            block_hash: block.header.hash,
            block_number: number,
            index,
        }))
    }

    async fn receipt(&self, hash: B256) -> BackendResult<Option<ReceiptLookup>> {
        let chain = self.chain.read();
        let Some(&(number, index)) = chain.tx_locations.get(&hash) else {
            return Ok(None);
        };
        let Some(block) = chain.blocks.get(number as usize) else {
            return Ok(None);
        };
        let Some(transaction) = block.transactions.get(index as usize).cloned() else {
            return Ok(None);
        };
        Ok(Some(ReceiptLookup {
            transaction,
            block_hash: block.header.hash,
            block_number: number,
            index,
            receipt: chain.receipts.get(&hash).cloned(),
        }))
    }

    async fn gas_price(&self) -> BackendResult<U256> {
        Ok(self.config.gas_price)
    }

    async fn max_priority_fee(&self) -> BackendResult<U256> {
        Ok(self.config.max_priority_fee)
    }
}

#[async_trait]
impl StateReader for MemoryBackend {
    async fn balance(&self, address: Address, at: BlockRef) -> BackendResult<U256> {
        Ok(self.chain.read().account(address, at)?.balance)
    }

    async fn nonce(&self, address: Address, at: BlockRef) -> BackendResult<u64> {
        Ok(self.chain.read().account(address, at)?.nonce)
    }

    async fn code(&self, address: Address, at: BlockRef) -> BackendResult<Bytes> {
        Ok(self.chain.read().account(address, at)?.code)
    }

    async fn storage_at(&self, address: Address, slot: B256, at: BlockRef) -> BackendResult<B256> {
        let account = self.chain.read().account(address, at)?;
        Ok(account.storage.get(&slot).copied().unwrap_or_default())
    }
}

#[async_trait]
impl Executor for MemoryBackend {
    async fn call(
        &self,
        args: &NativeCallArgs,
        at: BlockRef,
        overrides: Option<&NativeStateOverride>,
    ) -> BackendResult<Bytes> {
        let Some(target) = args.to else {
            return Err(BackendError::Unavailable(
                "contract creation requires an execution engine".to_string(),
            ));
        };
        let overridden_code = overrides
            .and_then(|set| set.get(&target))
            .and_then(|account| account.code.clone());
        let code = match overridden_code {
            Some(code) => code,
            None => self.chain.read().account(target, at)?.code,
        };
        if !code.is_empty() {
            return Err(BackendError::Unavailable(
                "no execution engine attached to the in-memory backend".to_string(),
            ));
        }
        Ok(Bytes::new())
    }

    async fn estimate_gas(&self, args: &NativeCallArgs, at: BlockRef) -> BackendResult<u64> {
        self.call(args, at, None).await?;
        if !args.input.is_empty() {
            return Err(BackendError::Unavailable(
                "gas estimation for payloads requires an execution engine".to_string(),
            ));
        }
        Ok(TRANSFER_GAS)
    }
}

#[async_trait]
impl PoolReader for MemoryBackend {
    async fn transaction(&self, hash: B256) -> BackendResult<Option<NativeTransaction>> {
        let pool = self.pool.read();
        Ok(pool
            .by_hash
            .get(&hash)
            .and_then(|key| pool.by_sender.get(key))
            .cloned())
    }

    async fn pending(&self) -> BackendResult<Vec<NativeTransaction>> {
        Ok(self.pool.read().by_sender.values().cloned().collect())
    }

    async fn next_nonce(&self, address: Address) -> BackendResult<u64> {
        let account_nonce = self
            .chain
            .read()
            .working
            .get(&address)
            .map(|account| account.nonce)
            .unwrap_or_default();
        let pool = self.pool.read();
        let pooled = pool
            .by_sender
            .range((address, 0)..=(address, u64::MAX))
            .map(|((_, nonce), _)| nonce + 1)
            .max()
            .unwrap_or_default();
        Ok(account_nonce.max(pooled))
    }
}

#[async_trait]
impl PoolWriter for MemoryBackend {
    async fn submit(&self, raw: Bytes) -> PoolResult<B256> {
        if raw.is_empty() {
            return Err(PoolError::MalformedEncoding("empty payload".to_string()));
        }
        let decoder = self.decoder.as_ref().ok_or_else(|| {
            PoolError::MalformedEncoding("no transaction decoder configured".to_string())
        })?;
        let mut tx = decoder(&raw)?;
        tx.raw = raw;
        self.admit(tx)
    }
}

#[async_trait]
impl FilterEngine for MemoryBackend {
    fn subscribe_new_heads(&self) -> broadcast::Receiver<Arc<NativeHeader>> {
        self.events.subscribe_new_heads()
    }

    fn subscribe_logs(&self) -> broadcast::Receiver<Arc<[NativeLog]>> {
        self.events.subscribe_logs()
    }

    fn subscribe_pending_transactions(&self) -> broadcast::Receiver<B256> {
        self.events.subscribe_pending_transactions()
    }

    fn pending_transaction_queue(&self) -> mpsc::UnboundedReceiver<B256> {
        self.events.pending_transaction_queue()
    }

    async fn logs(&self, query: &LogQuery) -> BackendResult<Vec<NativeLog>> {
        let chain = self.chain.read();
        let blocks: Vec<&NativeBlock> = match query.range {
            LogRange::Blocks { from, to } => {
                let to = to.min(chain.blocks.len().saturating_sub(1) as u64);
                if from > to {
                    return Ok(vec![]);
                }
                chain.blocks[from as usize..=to as usize].iter().collect()
            }
            LogRange::AtHash(hash) => chain
                .by_hash
                .get(&hash)
                .and_then(|number| chain.blocks.get(*number as usize))
                .into_iter()
                .collect(),
        };

        Ok(blocks
            .into_iter()
            .flat_map(|block| block.transactions.iter())
            .filter_map(|tx| chain.receipts.get(&tx.hash))
            .flat_map(|receipt| receipt.logs.iter())
            .filter(|log| query.matches(log))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl AccountDirectory for MemoryBackend {
    async fn addresses(&self) -> BackendResult<Vec<Address>> {
        Ok(self.local_accounts.read().iter().copied().collect())
    }

    async fn sign(&self, address: Address, message: &[u8]) -> BackendResult<Bytes> {
        if !self.local_accounts.read().contains(&address) {
            return Err(BackendError::UnknownAccount(address));
        }
        match &self.signer {
            Some(signer) => signer(address, message),
            None => Err(BackendError::AccountLocked(address)),
        }
    }
}
