//! Ethereum-compatible log/event types.

use alloy_primitives::{Address, Bytes, B256, U64};
use serde::{Deserialize, Serialize};

/// Log entry as returned by `eth_getLogs`, filter polls, `logs`
/// subscriptions and receipts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    /// Indexed topics (up to 4)
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: U64,
    pub transaction_hash: B256,
    pub transaction_index: U64,
    pub block_hash: B256,
    /// Position within the block, not within the transaction.
    pub log_index: U64,
    /// Set when the log was reverted by a reorganization.
    #[serde(default)]
    pub removed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_log_serialization() {
        let log = RpcLog {
            address: Address::ZERO,
            topics: vec![B256::ZERO],
            data: Bytes::from_static(&[1, 2, 3]),
            block_number: U64::from(100u64),
            transaction_hash: B256::ZERO,
            transaction_index: U64::ZERO,
            block_hash: B256::ZERO,
            log_index: U64::from(3u64),
            removed: false,
        };
        let json_value: Value = serde_json::to_value(&log).unwrap();
        assert_eq!(json_value["blockNumber"], "0x64");
        assert_eq!(json_value["logIndex"], "0x3");
        assert_eq!(json_value["data"], "0x010203");
        assert_eq!(json_value["removed"], false);
        assert_eq!(
            json_value["address"],
            "0x0000000000000000000000000000000000000000"
        );
    }
}
