//! Ethereum JSON-RPC wire types served by the ethcompat facade.
//!
//! Everything in this crate is the *foreign* shape: field names, hex widths
//! and null-vs-absent rules as Ethereum clients (wallets, Foundry, ethers)
//! expect them. Native node records live in `ethcompat-backend`; the facade
//! translates between the two.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

pub mod block;
pub mod log;
pub mod overrides;
pub mod receipt;
pub mod selector;
pub mod transaction;

pub use block::{BlockTransactions, RpcBlock, RpcHeader};
pub use log::RpcLog;
pub use overrides::{AccountOverride, StateOverride};
pub use receipt::RpcReceipt;
pub use selector::{BlockSelector, SelectorParseError};
pub use transaction::{AccessListItem, ForeignTxType, RpcTransaction};

/// Maximum number of topic positions a log filter may constrain.
pub const MAX_TOPICS: usize = 4;

/// Criteria for `eth_newFilter` and `eth_getLogs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Start block (inclusive), `latest` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockSelector>,
    /// End block (inclusive), `latest` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<FilterAddress>,
    /// Positional topic constraints, `null` meaning any topic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topics: Option<Vec<Option<FilterTopic>>>,
    /// Single-block query, mutually exclusive with the range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_hash: Option<B256>,
}

/// Address filter - single or multiple addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterAddress {
    Single(Address),
    Multiple(Vec<Address>),
}

impl FilterAddress {
    pub fn to_vec(&self) -> Vec<Address> {
        match self {
            FilterAddress::Single(address) => vec![*address],
            FilterAddress::Multiple(addresses) => addresses.clone(),
        }
    }
}

/// Topic filter - single topic or array of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterTopic {
    Single(B256),
    Multiple(Vec<B256>),
}

impl FilterTopic {
    pub fn to_vec(&self) -> Vec<B256> {
        match self {
            FilterTopic::Single(topic) => vec![*topic],
            FilterTopic::Multiple(topics) => topics.clone(),
        }
    }
}

/// Result of `eth_getFilterChanges`: hashes for block and pending-transaction
/// filters, log records for log filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterChanges {
    Hashes(Vec<B256>),
    Logs(Vec<RpcLog>),
}

impl FilterChanges {
    /// The empty answer for an unknown filter id. Serializes as `[]`.
    pub fn empty() -> Self {
        FilterChanges::Hashes(Vec::new())
    }

    pub fn len(&self) -> usize {
        match self {
            FilterChanges::Hashes(hashes) => hashes.len(),
            FilterChanges::Logs(logs) => logs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Call request for `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    /// Target address, absent for contract creation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
    /// Gas price (legacy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    /// Max fee per gas (EIP-1559)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    /// Max priority fee per gas (EIP-1559)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<U64>,
    /// Input data (legacy field name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
}

/// Raised when a call request carries different `data` and `input` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictingInput;

impl CallRequest {
    /// The call payload. `input` and `data` are aliases; setting both is only
    /// accepted when they agree.
    pub fn input_data(&self) -> Result<Option<&Bytes>, ConflictingInput> {
        match (&self.input, &self.data) {
            (Some(input), Some(data)) if input != data => Err(ConflictingInput),
            (Some(input), _) => Ok(Some(input)),
            (None, data) => Ok(data.as_ref()),
        }
    }
}
