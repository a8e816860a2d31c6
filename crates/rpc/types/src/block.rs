//! Ethereum-compatible block and header types.

use alloy_primitives::{b256, Address, Bloom, Bytes, B256, B64, U256, U64};
use serde::{Deserialize, Serialize};

use crate::transaction::RpcTransaction;

/// keccak256(rlp([])), the uncle hash of every block without uncles.
pub const EMPTY_UNCLES_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// Header object returned by `eth_getHeaderBy*` and flattened into blocks.
///
/// Proof-of-work artifacts (`difficulty`, `mixHash`, `nonce`) are zero. The
/// pending block has no `hash`, `number` is still reported, `nonce` is null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcHeader {
    pub hash: Option<B256>,
    pub parent_hash: B256,
    pub sha3_uncles: B256,
    pub miner: Address,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: U64,
    pub gas_limit: U64,
    pub gas_used: U64,
    pub timestamp: U64,
    pub extra_data: Bytes,
    pub mix_hash: B256,
    pub nonce: Option<B64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
}

/// Block object returned by `eth_getBlockByNumber` / `eth_getBlockByHash`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    #[serde(flatten)]
    pub header: RpcHeader,
    pub size: U64,
    pub total_difficulty: U256,
    pub transactions: BlockTransactions,
    /// Always empty.
    pub uncles: Vec<B256>,
}

/// Block transactions - either just hashes or full transaction objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    Hashes(Vec<B256>),
    Full(Vec<RpcTransaction>),
}

impl BlockTransactions {
    pub fn len(&self) -> usize {
        match self {
            BlockTransactions::Hashes(hashes) => hashes.len(),
            BlockTransactions::Full(transactions) => transactions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
