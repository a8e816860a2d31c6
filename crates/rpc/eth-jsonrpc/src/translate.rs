//! Conversions between native records and Ethereum wire objects.
//!
//! Every function here is pure: no collaborator access, no suspension.
//! Absent native input stays absent at the call site (`Option::map`), so
//! none of these ever fabricates a zeroed object.

use alloy_primitives::{B256, B64, U256, U64};
use ethcompat_backend::{
    AccessTuple, NativeAccountOverride, NativeBlock, NativeCallArgs, NativeHeader, NativeLog,
    NativeStateOverride, NativeTransaction, NativeTxType, ReceiptLookup, StorageOverride,
};
use ethcompat_rpc_types::block::EMPTY_UNCLES_HASH;
use ethcompat_rpc_types::{
    AccessListItem, BlockTransactions, CallRequest, ForeignTxType, RpcBlock, RpcHeader, RpcLog,
    RpcReceipt, RpcTransaction, StateOverride,
};

use crate::error::{RpcError, RpcResult};

/// Where a transaction sits in the chain. A zero block hash means the
/// transaction is still in the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockLinkage {
    pub block_hash: B256,
    pub block_number: u64,
    pub index: u64,
}

impl BlockLinkage {
    pub const PENDING: Self = Self {
        block_hash: B256::ZERO,
        block_number: 0,
        index: 0,
    };

    pub fn mined(block_hash: B256, block_number: u64, index: u64) -> Self {
        Self {
            block_hash,
            block_number,
            index,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.block_hash.is_zero()
    }
}

/// Map a native type onto Ethereum's closed enumeration.
///
/// Node-specific kinds have no foreign tag and are reported as legacy. This
/// loses information: clients must treat `type` as advisory for them.
pub fn foreign_tx_type(native: NativeTxType) -> ForeignTxType {
    match native {
        NativeTxType::AccessList => ForeignTxType::AccessList,
        NativeTxType::DynamicFee => ForeignTxType::DynamicFee,
        _ => ForeignTxType::Legacy,
    }
}

pub fn translate_transaction(tx: &NativeTransaction, linkage: BlockLinkage) -> RpcTransaction {
    let tx_type = foreign_tx_type(tx.tx_type);
    let signature = tx.primary_signature();
    let (block_hash, block_number, transaction_index) = if linkage.is_pending() {
        (None, None, None)
    } else {
        (
            Some(linkage.block_hash),
            Some(U64::from(linkage.block_number)),
            Some(U64::from(linkage.index)),
        )
    };
    let access_list = match tx_type {
        ForeignTxType::Legacy => None,
        ForeignTxType::AccessList | ForeignTxType::DynamicFee => {
            Some(translate_access_list(&tx.access_list))
        }
    };
    let (max_fee_per_gas, max_priority_fee_per_gas) = match tx_type {
        ForeignTxType::DynamicFee => (tx.max_fee_per_gas, tx.max_priority_fee_per_gas),
        _ => (None, None),
    };

    RpcTransaction {
        block_hash,
        block_number,
        from: tx.sender,
        gas: U64::from(tx.gas_limit),
        gas_price: tx.gas_price,
        max_fee_per_gas,
        max_priority_fee_per_gas,
        hash: tx.hash,
        input: tx.payload.clone(),
        nonce: U64::from(tx.nonce),
        // Contract creation reports from == to.
        to: Some(tx.recipient.unwrap_or(tx.sender)),
        transaction_index,
        value: tx.value,
        tx_type: tx_type.as_quantity(),
        access_list,
        chain_id: tx.chain_id.map(U64::from),
        v: signature.v,
        r: signature.r,
        s: signature.s,
    }
}

/// `None` when the chain indexed the transaction but holds no receipt for it.
pub fn translate_receipt(lookup: &ReceiptLookup) -> Option<RpcReceipt> {
    let receipt = lookup.receipt.as_ref()?;
    let tx = &lookup.transaction;
    let status = if receipt.succeeded() {
        RpcReceipt::STATUS_SUCCESS
    } else {
        RpcReceipt::STATUS_FAILURE
    };
    let contract_address =
        (!receipt.contract_address.is_zero()).then_some(receipt.contract_address);

    Some(RpcReceipt {
        block_hash: lookup.block_hash,
        block_number: U64::from(lookup.block_number),
        transaction_hash: tx.hash,
        transaction_index: U64::from(lookup.index),
        from: tx.sender,
        to: Some(tx.recipient.unwrap_or(tx.sender)),
        gas_used: U64::from(receipt.gas_used),
        cumulative_gas_used: U64::from(receipt.cumulative_gas_used),
        contract_address,
        logs: receipt.logs.iter().map(translate_log).collect(),
        logs_bloom: receipt.logs_bloom,
        tx_type: foreign_tx_type(tx.tx_type).as_quantity(),
        effective_gas_price: tx.gas_price,
        status: U64::from(status),
    })
}

pub fn translate_log(log: &NativeLog) -> RpcLog {
    RpcLog {
        address: log.address,
        topics: log.topics.clone(),
        data: log.data.clone(),
        block_number: U64::from(log.block_number),
        transaction_hash: log.transaction_hash,
        transaction_index: U64::from(log.transaction_index),
        block_hash: log.block_hash,
        log_index: U64::from(log.log_index),
        removed: log.removed,
    }
}

/// The pending header (zero hash) reports null `hash` and `nonce`.
pub fn translate_header(header: &NativeHeader) -> RpcHeader {
    let pending = header.hash.is_zero();
    RpcHeader {
        hash: (!pending).then_some(header.hash),
        parent_hash: header.parent_hash,
        sha3_uncles: EMPTY_UNCLES_HASH,
        miner: header.proposer,
        state_root: header.state_root,
        transactions_root: header.transactions_root,
        receipts_root: header.receipts_root,
        logs_bloom: header.logs_bloom,
        difficulty: U256::ZERO,
        number: U64::from(header.number),
        gas_limit: U64::from(header.gas_limit),
        gas_used: U64::from(header.gas_used),
        timestamp: U64::from(header.timestamp),
        extra_data: header.extra_data.clone(),
        mix_hash: B256::ZERO,
        nonce: (!pending).then_some(B64::ZERO),
        base_fee_per_gas: header.base_fee,
    }
}

pub fn translate_block(block: &NativeBlock, full_transactions: bool) -> RpcBlock {
    let header = &block.header;
    let transactions = if full_transactions {
        BlockTransactions::Full(
            block
                .transactions
                .iter()
                .enumerate()
                .map(|(index, tx)| {
                    let linkage = BlockLinkage::mined(header.hash, header.number, index as u64);
                    translate_transaction(tx, linkage)
                })
                .collect(),
        )
    } else {
        BlockTransactions::Hashes(block.transactions.iter().map(|tx| tx.hash).collect())
    };

    RpcBlock {
        header: translate_header(header),
        size: U64::from(header.size),
        total_difficulty: U256::ZERO,
        transactions,
        uncles: vec![],
    }
}

/// Order of entries and of storage keys is preserved.
pub fn translate_access_list(list: &[AccessTuple]) -> Vec<AccessListItem> {
    list.iter()
        .map(|tuple| AccessListItem {
            address: tuple.address,
            storage_keys: tuple.storage_keys.clone(),
        })
        .collect()
}

pub fn native_access_list(list: &[AccessListItem]) -> Vec<AccessTuple> {
    list.iter()
        .map(|item| AccessTuple {
            address: item.address,
            storage_keys: item.storage_keys.clone(),
        })
        .collect()
}

/// Rejects any account that sets both `state` and `stateDiff`.
pub fn translate_override_set(overrides: &StateOverride) -> RpcResult<NativeStateOverride> {
    overrides
        .iter()
        .map(|(address, account)| {
            let storage = match (&account.state, &account.state_diff) {
                (Some(_), Some(_)) => return Err(RpcError::ConflictingStorageOverride(*address)),
                (Some(state), None) => Some(StorageOverride::Replace(state.clone())),
                (None, Some(diff)) => Some(StorageOverride::Diff(diff.clone())),
                (None, None) => None,
            };
            let native = NativeAccountOverride {
                nonce: account.nonce.map(|nonce| nonce.to::<u64>()),
                code: account.code.clone(),
                balance: account.balance,
                storage,
            };
            Ok((*address, native))
        })
        .collect()
}

pub fn translate_call_request(request: &CallRequest) -> RpcResult<NativeCallArgs> {
    let input = request
        .input_data()
        .map_err(|_| RpcError::ConflictingInput)?
        .cloned()
        .unwrap_or_default();

    Ok(NativeCallArgs {
        from: request.from,
        to: request.to,
        gas: request.gas.map(|gas| gas.to::<u64>()),
        gas_price: request.gas_price,
        max_fee_per_gas: request.max_fee_per_gas,
        max_priority_fee_per_gas: request.max_priority_fee_per_gas,
        value: request.value,
        nonce: request.nonce.map(|nonce| nonce.to::<u64>()),
        input,
        access_list: request
            .access_list
            .as_deref()
            .map(native_access_list)
            .unwrap_or_default(),
    })
}


#[cfg(test)]
mod proptests {
    use super::*;
    use alloy_primitives::{Address, Bytes};
    use ethcompat_backend::{NativeReceipt, TxSignature};
    use proptest::prelude::*;

    fn arb_address() -> impl Strategy<Value = Address> {
        any::<[u8; 20]>().prop_map(Address::from)
    }

    fn arb_b256() -> impl Strategy<Value = B256> {
        any::<[u8; 32]>().prop_map(B256::from)
    }

    fn arb_native_type() -> impl Strategy<Value = NativeTxType> {
        prop_oneof![
            Just(NativeTxType::Legacy),
            Just(NativeTxType::AccessList),
            Just(NativeTxType::DynamicFee),
            Just(NativeTxType::ValueTransfer),
            Just(NativeTxType::FeeDelegated),
            Just(NativeTxType::ContractDeploy),
            Just(NativeTxType::ContractExecution),
            Just(NativeTxType::AccountUpdate),
            Just(NativeTxType::Cancel),
            Just(NativeTxType::DataAnchoring),
        ]
    }

    fn arb_access_list() -> impl Strategy<Value = Vec<AccessTuple>> {
        prop::collection::vec(
            (arb_address(), prop::collection::vec(arb_b256(), 0..4)).prop_map(
                |(address, storage_keys)| AccessTuple {
                    address,
                    storage_keys,
                },
            ),
            0..3,
        )
    }

    fn arb_native_tx() -> impl Strategy<Value = NativeTransaction> {
        (
            arb_b256(),
            arb_native_type(),
            arb_address(),
            prop::option::of(arb_address()),
            any::<u64>(),
            any::<u64>(),
            prop::collection::vec(any::<u8>(), 0..64),
            arb_access_list(),
        )
            .prop_map(
                |(hash, tx_type, sender, recipient, nonce, gas_limit, payload, access_list)| {
                    NativeTransaction {
                        hash,
                        tx_type,
                        sender,
                        recipient,
                        gas_limit,
                        nonce,
                        payload: Bytes::from(payload),
                        access_list,
                        signatures: vec![TxSignature::default()],
                        ..Default::default()
                    }
                },
            )
    }

    fn arb_linkage() -> impl Strategy<Value = BlockLinkage> {
        prop_oneof![
            Just(BlockLinkage::PENDING),
            (arb_b256(), any::<u64>(), any::<u64>())
                .prop_map(|(hash, number, index)| BlockLinkage::mined(hash, number, index)),
        ]
    }

    proptest! {
        #[test]
        fn prop_creation_reports_sender_as_recipient(mut tx in arb_native_tx(), linkage in arb_linkage()) {
            tx.recipient = None;
            let rpc = translate_transaction(&tx, linkage);
            prop_assert_eq!(rpc.to, Some(rpc.from));
        }

        #[test]
        fn prop_linkage_is_all_or_nothing(tx in arb_native_tx(), linkage in arb_linkage()) {
            let rpc = translate_transaction(&tx, linkage);
            let present = [
                rpc.block_hash.is_some(),
                rpc.block_number.is_some(),
                rpc.transaction_index.is_some(),
            ];
            prop_assert!(present.iter().all(|p| *p == !linkage.block_hash.is_zero()));
        }

        #[test]
        fn prop_unmapped_types_become_legacy(tx in arb_native_tx()) {
            let rpc = translate_transaction(&tx, BlockLinkage::PENDING);
            let expected = match tx.tx_type {
                NativeTxType::AccessList => 1u64,
                NativeTxType::DynamicFee => 2,
                _ => 0,
            };
            prop_assert_eq!(rpc.tx_type, U64::from(expected));
        }

        #[test]
        fn prop_access_list_order_survives(list in arb_access_list()) {
            prop_assert_eq!(native_access_list(&translate_access_list(&list)), list);
        }

        #[test]
        fn prop_contract_address_null_iff_zero(tx in arb_native_tx(), created in prop::option::of(arb_address())) {
            let contract_address = created.unwrap_or(Address::ZERO);
            let lookup = ReceiptLookup {
                transaction: tx,
                block_hash: B256::repeat_byte(1),
                block_number: 1,
                index: 0,
                receipt: Some(NativeReceipt {
                    status: 1,
                    contract_address,
                    ..Default::default()
                }),
            };
            let rpc = translate_receipt(&lookup).unwrap();
            if contract_address.is_zero() {
                prop_assert_eq!(rpc.contract_address, None);
            } else {
                prop_assert_eq!(rpc.contract_address, Some(contract_address));
            }
            let json = serde_json::to_value(&rpc).unwrap();
            prop_assert!(json.as_object().unwrap().contains_key("contractAddress"));
        }
    }
}
