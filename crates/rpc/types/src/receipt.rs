//! Ethereum-compatible transaction receipt types.

use alloy_primitives::{Address, Bloom, B256, U256, U64};
use serde::{Deserialize, Serialize};

use crate::log::RpcLog;

/// Receipt object returned by `eth_getTransactionReceipt`.
///
/// The field set is fixed: `contractAddress` is always present (null unless a
/// contract was created), `logs` is always an array and `status` is always
/// emitted in place of the pre-Byzantium `root`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub block_hash: B256,
    pub block_number: U64,
    pub transaction_hash: B256,
    pub transaction_index: U64,
    pub from: Address,
    /// Recipient. Contract creations report the sender here.
    pub to: Option<Address>,
    pub gas_used: U64,
    pub cumulative_gas_used: U64,
    pub contract_address: Option<Address>,
    pub logs: Vec<RpcLog>,
    pub logs_bloom: Bloom,
    #[serde(rename = "type")]
    pub tx_type: U64,
    pub effective_gas_price: U256,
    pub status: U64,
}

impl RpcReceipt {
    /// Status code for successful transaction.
    pub const STATUS_SUCCESS: u64 = 1;
    /// Status code for failed transaction.
    pub const STATUS_FAILURE: u64 = 0;

    pub fn is_success(&self) -> bool {
        self.status == U64::from(Self::STATUS_SUCCESS)
    }
}
