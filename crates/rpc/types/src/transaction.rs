//! Ethereum-compatible transaction types.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::{Deserialize, Serialize};

/// The closed set of transaction types Ethereum clients understand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ForeignTxType {
    #[default]
    Legacy = 0x00,
    AccessList = 0x01,
    DynamicFee = 0x02,
}

impl ForeignTxType {
    pub fn as_quantity(self) -> U64 {
        U64::from(self as u8)
    }
}

/// Transaction object returned by `eth_getTransactionBy*` and embedded in
/// full blocks.
///
/// Block linkage is either fully populated (mined) or fully null (pending);
/// the three fields are always emitted so clients can tell the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub block_hash: Option<B256>,
    pub block_number: Option<U64>,
    pub from: Address,
    pub gas: U64,
    pub gas_price: U256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    pub hash: B256,
    pub input: Bytes,
    pub nonce: U64,
    /// Recipient. Contract creations report the sender here.
    pub to: Option<Address>,
    pub transaction_index: Option<U64>,
    pub value: U256,
    #[serde(rename = "type")]
    pub tx_type: U64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_list: Option<Vec<AccessListItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U64>,
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

impl RpcTransaction {
    /// Whether the transaction has been included in a block.
    pub fn is_mined(&self) -> bool {
        self.block_hash.is_some()
    }
}

/// Access list entry (EIP-2930). Key order is part of the signed payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListItem {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn pending_transfer() -> RpcTransaction {
        RpcTransaction {
            block_hash: None,
            block_number: None,
            from: Address::repeat_byte(0x01),
            gas: U64::from(21_000u64),
            gas_price: U256::from(1_000_000_000u64),
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            hash: B256::repeat_byte(0xaa),
            input: Bytes::new(),
            nonce: U64::from(1u64),
            to: Some(Address::repeat_byte(0x02)),
            transaction_index: None,
            value: U256::from(1000u64),
            tx_type: ForeignTxType::Legacy.as_quantity(),
            access_list: None,
            chain_id: None,
            v: U256::from(27u64),
            r: U256::from(1u64),
            s: U256::from(2u64),
        }
    }

    #[test]
    fn test_transaction_serialization() {
        let json_value: Value = serde_json::to_value(pending_transfer()).unwrap();
        assert_eq!(json_value["nonce"], "0x1");
        assert_eq!(json_value["type"], "0x0");
        assert_eq!(json_value["value"], "0x3e8");
        assert_eq!(json_value["gas"], "0x5208");
        assert_eq!(json_value["gasPrice"], "0x3b9aca00");
        assert_eq!(json_value["v"], "0x1b");
        assert_eq!(json_value["input"], "0x");
    }

    #[test]
    fn test_pending_linkage_is_explicit_null() {
        let json_value: Value = serde_json::to_value(pending_transfer()).unwrap();
        let object = json_value.as_object().unwrap();
        for key in ["blockHash", "blockNumber", "transactionIndex"] {
            assert_eq!(object.get(key), Some(&Value::Null), "{key} must be null");
        }
        assert!(!object.contains_key("accessList"));
        assert!(!object.contains_key("maxFeePerGas"));
    }

    #[test]
    fn test_access_list_order_on_wire() {
        let item = AccessListItem {
            address: Address::repeat_byte(0x03),
            storage_keys: vec![B256::with_last_byte(2), B256::with_last_byte(1)],
        };
        let json_value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json_value["storageKeys"],
            json!([B256::with_last_byte(2), B256::with_last_byte(1)])
        );
    }

    #[test]
    fn test_foreign_type_quantities() {
        assert_eq!(ForeignTxType::Legacy.as_quantity(), U64::ZERO);
        assert_eq!(ForeignTxType::AccessList.as_quantity(), U64::from(1u64));
        assert_eq!(ForeignTxType::DynamicFee.as_quantity(), U64::from(2u64));
    }
}
