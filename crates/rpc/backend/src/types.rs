//! Native chain records.
//!
//! These are the node's own shapes. They are produced by the chain database
//! and the pool, never by the facade, and carry no Ethereum wire conventions.

use std::collections::BTreeMap;

use alloy_primitives::{Address, Bloom, Bytes, B256, U256};

/// Native transaction kinds.
///
/// The first three have direct Ethereum counterparts. The rest exist only on
/// this node and have no foreign type tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum NativeTxType {
    #[default]
    Legacy,
    AccessList,
    DynamicFee,
    ValueTransfer,
    FeeDelegated,
    ContractDeploy,
    ContractExecution,
    AccountUpdate,
    Cancel,
    DataAnchoring,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TxSignature {
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

/// One access-list entry. Storage key order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessTuple {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeTransaction {
    pub hash: B256,
    pub tx_type: NativeTxType,
    pub sender: Address,
    /// `None` for contract creation.
    pub recipient: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub nonce: u64,
    pub payload: Bytes,
    pub chain_id: Option<u64>,
    pub access_list: Vec<AccessTuple>,
    /// Fee-delegated kinds carry a sender and a payer signature; the sender's
    /// comes first.
    pub signatures: Vec<TxSignature>,
    /// Canonical encoding as accepted by the pool.
    pub raw: Bytes,
}

impl NativeTransaction {
    pub fn is_contract_creation(&self) -> bool {
        self.recipient.is_none()
    }

    pub fn primary_signature(&self) -> TxSignature {
        self.signatures.first().copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeHeader {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
    pub proposer: Address,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub extra_data: Bytes,
    pub base_fee: Option<U256>,
    /// Encoded size in bytes.
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeBlock {
    pub header: NativeHeader,
    pub transactions: Vec<NativeTransaction>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    pub transaction_hash: B256,
    pub transaction_index: u64,
    pub log_index: u64,
    pub removed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeReceipt {
    /// Non-zero on success.
    pub status: u64,
    pub cumulative_gas_used: u64,
    pub gas_used: u64,
    pub logs: Vec<NativeLog>,
    pub logs_bloom: Bloom,
    /// Zero unless the transaction created a contract.
    pub contract_address: Address,
}

impl NativeReceipt {
    pub fn succeeded(&self) -> bool {
        self.status != 0
    }
}

/// A finalized transaction together with where it was included, read as one
/// unit from the chain database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxLookup {
    pub transaction: NativeTransaction,
    pub block_hash: B256,
    pub block_number: u64,
    pub index: u64,
}

/// A finalized transaction, its inclusion point and its receipt, read as one
/// unit. The receipt may be missing while the transaction is indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptLookup {
    pub transaction: NativeTransaction,
    pub block_hash: B256,
    pub block_number: u64,
    pub index: u64,
    pub receipt: Option<NativeReceipt>,
}

/// A block position already resolved against the chain head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockRef {
    Number(u64),
    Hash(B256),
    Pending,
}

/// Which blocks a log query scans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRange {
    /// Inclusive range.
    Blocks { from: u64, to: u64 },
    AtHash(B256),
}

/// Native log query: a block range plus address and positional topic
/// constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub range: LogRange,
    /// Empty means any address.
    pub addresses: Vec<Address>,
    /// One entry per topic position. An empty entry matches any topic.
    pub topics: Vec<Vec<B256>>,
}

impl LogQuery {
    /// Whether `log` satisfies the address and topic constraints. The block
    /// range is not consulted.
    pub fn matches(&self, log: &NativeLog) -> bool {
        matches_criteria(&self.addresses, &self.topics, log)
    }

    pub fn in_range(&self, log: &NativeLog) -> bool {
        match self.range {
            LogRange::Blocks { from, to } => (from..=to).contains(&log.block_number),
            LogRange::AtHash(hash) => log.block_hash == hash,
        }
    }
}

/// Ethereum log matching: empty address set or empty topic position is a
/// wildcard, a constrained position beyond the log's topics fails.
pub fn matches_criteria(addresses: &[Address], topics: &[Vec<B256>], log: &NativeLog) -> bool {
    if !addresses.is_empty() && !addresses.contains(&log.address) {
        return false;
    }
    topics.iter().enumerate().all(|(position, alternatives)| {
        if alternatives.is_empty() {
            return true;
        }
        log.topics
            .get(position)
            .is_some_and(|topic| alternatives.contains(topic))
    })
}

/// Call arguments after translation from the wire request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeCallArgs {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<U256>,
    pub max_fee_per_gas: Option<U256>,
    pub max_priority_fee_per_gas: Option<U256>,
    pub value: Option<U256>,
    pub nonce: Option<u64>,
    pub input: Bytes,
    pub access_list: Vec<AccessTuple>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOverride {
    /// Replace the account's whole storage.
    Replace(BTreeMap<B256, B256>),
    /// Patch individual slots, leaving the rest.
    Diff(BTreeMap<B256, B256>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeAccountOverride {
    pub nonce: Option<u64>,
    pub code: Option<Bytes>,
    pub balance: Option<U256>,
    pub storage: Option<StorageOverride>,
}

pub type NativeStateOverride = BTreeMap<Address, NativeAccountOverride>;

#[cfg(test)]
mod tests {
    use super::*;

    fn log(address: Address, topics: Vec<B256>) -> NativeLog {
        NativeLog {
            address,
            topics,
            block_number: 7,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_criteria_match_everything() {
        let entry = log(Address::repeat_byte(1), vec![B256::repeat_byte(9)]);
        assert!(matches_criteria(&[], &[], &entry));
        assert!(matches_criteria(&[], &[vec![]], &entry));
    }

    #[test]
    fn test_address_set() {
        let entry = log(Address::repeat_byte(1), vec![]);
        assert!(matches_criteria(&[Address::repeat_byte(1)], &[], &entry));
        assert!(matches_criteria(
            &[Address::repeat_byte(2), Address::repeat_byte(1)],
            &[],
            &entry
        ));
        assert!(!matches_criteria(&[Address::repeat_byte(2)], &[], &entry));
    }

    #[test]
    fn test_topic_positions() {
        let transfer = B256::repeat_byte(0xdd);
        let holder = B256::repeat_byte(0x01);
        let entry = log(Address::ZERO, vec![transfer, holder]);

        assert!(matches_criteria(&[], &[vec![transfer]], &entry));
        assert!(matches_criteria(&[], &[vec![], vec![holder]], &entry));
        assert!(matches_criteria(&[], &[vec![holder, transfer]], &entry));
        assert!(!matches_criteria(&[], &[vec![holder]], &entry));
        // Third position is constrained but the log only has two topics.
        assert!(!matches_criteria(&[], &[vec![], vec![], vec![holder]], &entry));
    }

    #[test]
    fn test_range() {
        let entry = log(Address::ZERO, vec![]);
        let query = |range| LogQuery {
            range,
            addresses: vec![],
            topics: vec![],
        };
        assert!(query(LogRange::Blocks { from: 7, to: 7 }).in_range(&entry));
        assert!(query(LogRange::Blocks { from: 0, to: 10 }).in_range(&entry));
        assert!(!query(LogRange::Blocks { from: 8, to: 10 }).in_range(&entry));
        assert!(query(LogRange::AtHash(B256::ZERO)).in_range(&entry));
        assert!(!query(LogRange::AtHash(B256::repeat_byte(1))).in_range(&entry));
    }

    #[test]
    fn test_primary_signature_defaults() {
        let tx = NativeTransaction::default();
        assert_eq!(tx.primary_signature(), TxSignature::default());
        assert!(tx.is_contract_creation());
    }
}
