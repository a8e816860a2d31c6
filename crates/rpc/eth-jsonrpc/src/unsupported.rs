//! Methods for concepts the chain does not have.
//!
//! There is no mining, no proof of work, no uncles and no node-held accounts
//! behind `eth_accounts`. These methods still answer, always with the same
//! fixed value, so tooling that checks them keeps working. The values do not
//! depend on node state.

use jsonrpsee::core::RegisterMethodError;
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::RpcModule;
use serde_json::{json, Value};

use crate::metrics::FacadeMetrics;

/// Fixed answer of an unsupported method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubValue {
    False,
    /// `"0x0"`
    ZeroQuantity,
    /// Plain JSON `0`.
    Zero,
    ZeroAddress,
    EmptyList,
    /// Four empty strings, the shape of a `getWork` package.
    EmptyWork,
    Null,
}

impl StubValue {
    pub fn to_json(self) -> Value {
        match self {
            StubValue::False => Value::Bool(false),
            StubValue::ZeroQuantity => json!("0x0"),
            StubValue::Zero => json!(0),
            StubValue::ZeroAddress => json!(alloy_primitives::Address::ZERO),
            StubValue::EmptyList => json!([]),
            StubValue::EmptyWork => json!(["", "", "", ""]),
            StubValue::Null => Value::Null,
        }
    }
}

/// Every method answered from the table, by full wire name.
pub const UNSUPPORTED_METHODS: &[(&str, StubValue)] = &[
    ("eth_mining", StubValue::False),
    ("eth_hashrate", StubValue::ZeroQuantity),
    ("eth_getHashrate", StubValue::Zero),
    ("eth_getWork", StubValue::EmptyWork),
    ("eth_submitWork", StubValue::False),
    ("eth_submitHashrate", StubValue::False),
    ("eth_coinbase", StubValue::ZeroAddress),
    ("eth_etherbase", StubValue::ZeroAddress),
    ("eth_accounts", StubValue::EmptyList),
    ("eth_syncing", StubValue::False),
    ("eth_getUncleByBlockNumberAndIndex", StubValue::Null),
    ("eth_getUncleByBlockHashAndIndex", StubValue::Null),
];

pub fn stub_value(method: &str) -> Option<StubValue> {
    UNSUPPORTED_METHODS
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, value)| *value)
}

/// Register every table entry on `module`. Parameters are accepted and
/// ignored.
pub fn register_stubs<Context: Send + Sync + 'static>(
    module: &mut RpcModule<Context>,
    metrics: FacadeMetrics,
) -> Result<(), RegisterMethodError> {
    for &(method, value) in UNSUPPORTED_METHODS {
        let metrics = metrics.clone();
        module.register_method(method, move |_, _, _| {
            metrics.record_stub_call(method);
            Ok::<_, ErrorObjectOwned>(value.to_json())
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonrpsee::rpc_params;
    use std::collections::HashSet;

    #[test]
    fn test_table_has_no_duplicates() {
        let names: HashSet<&str> = UNSUPPORTED_METHODS.iter().map(|(name, _)| *name).collect();
        assert_eq!(names.len(), UNSUPPORTED_METHODS.len());
        assert_eq!(stub_value("eth_mining"), Some(StubValue::False));
        assert_eq!(stub_value("eth_blockNumber"), None);
    }

    #[test]
    fn test_zero_address_encoding() {
        assert_eq!(
            StubValue::ZeroAddress.to_json(),
            json!("0x0000000000000000000000000000000000000000")
        );
    }

    #[tokio::test]
    async fn test_stubs_answer_fixed_values() {
        let metrics = FacadeMetrics::default();
        let mut module = RpcModule::new(());
        register_stubs(&mut module, metrics.clone()).unwrap();

        let expected = [
            ("eth_mining", json!(false)),
            ("eth_hashrate", json!("0x0")),
            ("eth_getWork", json!(["", "", "", ""])),
            ("eth_accounts", json!([])),
            ("eth_coinbase", json!("0x0000000000000000000000000000000000000000")),
            ("eth_syncing", json!(false)),
        ];
        for (method, value) in expected {
            for _ in 0..2 {
                let answer: Value = module.call(method, rpc_params![]).await.unwrap();
                assert_eq!(answer, value, "{method}");
            }
        }

        let uncle: Value = module
            .call("eth_getUncleByBlockNumberAndIndex", rpc_params!["latest", "0x0"])
            .await
            .unwrap();
        assert_eq!(uncle, Value::Null);

        let submitted: Value = module
            .call(
                "eth_submitHashrate",
                rpc_params![
                    "0x500000",
                    "0x59daa26581d0acd1fce254fb7e85952f4c09d0915afd33d3886cd914bc7d283c"
                ],
            )
            .await
            .unwrap();
        assert_eq!(submitted, json!(false));

        assert_eq!(
            metrics
                .stub_calls
                .get_or_create(&crate::metrics::MethodLabel {
                    method: "eth_mining".to_string()
                })
                .get(),
            2
        );
    }
}
