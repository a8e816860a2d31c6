//! Push subscriptions for `eth_subscribe`.
//!
//! Every accepted subscription gets its own task and its own receiver on the
//! filter engine's broadcast stream, so closing one never disturbs siblings
//! fed by the same source.

use std::str::FromStr;
use std::sync::Arc;

use ethcompat_backend::FilterEngine;
use ethcompat_rpc_types::{BlockSelector, FilterCriteria};
use jsonrpsee::core::SubscriptionResult;
use jsonrpsee::types::ErrorObjectOwned;
use jsonrpsee::{PendingSubscriptionSink, SubscriptionMessage, SubscriptionSink};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};

use crate::error::{RpcError, RpcResult};
use crate::filters::LogCriteria;
use crate::metrics::FacadeMetrics;
use crate::translate::{translate_header, translate_log};

/// Subscription types supported by eth_subscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionKind {
    NewHeads,
    Logs,
    NewPendingTransactions,
}

impl SubscriptionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::NewHeads => "newHeads",
            SubscriptionKind::Logs => "logs",
            SubscriptionKind::NewPendingTransactions => "newPendingTransactions",
        }
    }
}

impl FromStr for SubscriptionKind {
    type Err = RpcError;

    fn from_str(kind: &str) -> Result<Self, Self::Err> {
        match kind {
            "newHeads" => Ok(SubscriptionKind::NewHeads),
            "logs" => Ok(SubscriptionKind::Logs),
            "newPendingTransactions" => Ok(SubscriptionKind::NewPendingTransactions),
            other => Err(RpcError::InvalidParams(format!(
                "unsupported subscription type: {other}"
            ))),
        }
    }
}

/// Parameters for log subscriptions: the same object `eth_newFilter` takes.
/// Symbolic bounds follow the head as it moves; numeric bounds hold back
/// logs outside them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogSubscriptionParams(pub FilterCriteria);

impl LogSubscriptionParams {
    pub fn parse(params: Option<serde_json::Value>) -> RpcResult<Self> {
        match params {
            None | Some(serde_json::Value::Null) => Ok(Self::default()),
            Some(value) => serde_json::from_value(value)
                .map_err(|err| RpcError::InvalidParams(format!("invalid log filter params: {err}"))),
        }
    }

    pub fn criteria(&self) -> RpcResult<LogCriteria> {
        let criteria = LogCriteria::from_wire(&self.0)?;
        if let (Some(BlockSelector::Number(from)), Some(BlockSelector::Number(to))) =
            (self.0.from_block, self.0.to_block)
        {
            if from > to {
                return Err(RpcError::InvalidBlockRange { from, to });
            }
        }
        Ok(criteria)
    }
}

/// Keeps the open-subscription gauge honest however the pump exits.
struct OpenSubscription(FacadeMetrics);

impl OpenSubscription {
    fn new(metrics: FacadeMetrics) -> Self {
        metrics.open_subscriptions.inc();
        Self(metrics)
    }
}

impl Drop for OpenSubscription {
    fn drop(&mut self) {
        self.0.open_subscriptions.dec();
    }
}

/// Forward events from `events` to `sink` until the client goes away or the
/// source closes. `render` turns one event into zero or more notifications.
async fn pump<T, M, F>(
    kind: SubscriptionKind,
    sink: SubscriptionSink,
    mut events: broadcast::Receiver<T>,
    metrics: FacadeMetrics,
    mut render: F,
) where
    T: Clone,
    M: Serialize,
    F: FnMut(T) -> Vec<M>,
{
    let _open = OpenSubscription::new(metrics);
    let id = sink.subscription_id();
    tracing::debug!(subscription = ?id, kind = kind.as_str(), "opened subscription");

    loop {
        tokio::select! {
            _ = sink.closed() => {
                tracing::debug!(subscription = ?id, "subscription closed by client");
                return;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    for item in render(event) {
                        let message = match SubscriptionMessage::from_json(&item) {
                            Ok(message) => message,
                            Err(err) => {
                                tracing::warn!(subscription = ?id, %err, "failed to encode notification");
                                continue;
                            }
                        };
                        if sink.send(message).await.is_err() {
                            return;
                        }
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(subscription = ?id, skipped, "subscription fell behind, events dropped");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!(subscription = ?id, "event source closed");
                    return;
                }
            }
        }
    }
}

/// Accepts subscriptions and spawns their delivery tasks.
#[derive(Clone)]
pub struct Subscriptions {
    engine: Arc<dyn FilterEngine>,
    metrics: FacadeMetrics,
}

impl Subscriptions {
    pub fn new(engine: Arc<dyn FilterEngine>, metrics: FacadeMetrics) -> Self {
        Self { engine, metrics }
    }

    pub async fn accept(
        &self,
        pending: PendingSubscriptionSink,
        kind: &str,
        params: Option<serde_json::Value>,
    ) -> SubscriptionResult {
        let feed = match SubscriptionKind::from_str(kind).and_then(|kind| Feed::new(kind, params)) {
            Ok(feed) => feed,
            Err(err) => {
                pending.reject(ErrorObjectOwned::from(err)).await;
                return Ok(());
            }
        };

        // Attach to the source before accepting so nothing published after
        // the client sees its id is missed.
        let metrics = self.metrics.clone();
        match feed {
            Feed::NewHeads => {
                let events = self.engine.subscribe_new_heads();
                let sink = pending.accept().await?;
                tokio::spawn(pump(SubscriptionKind::NewHeads, sink, events, metrics, |header| {
                    vec![translate_header(&header)]
                }));
            }
            Feed::Logs(criteria) => {
                let events = self.engine.subscribe_logs();
                let sink = pending.accept().await?;
                tokio::spawn(pump(SubscriptionKind::Logs, sink, events, metrics, move |batch| {
                    batch
                        .iter()
                        .filter(|log| criteria.accepts_live(log))
                        .map(translate_log)
                        .collect::<Vec<_>>()
                }));
            }
            Feed::NewPendingTransactions => {
                let events = self.engine.subscribe_pending_transactions();
                let sink = pending.accept().await?;
                tokio::spawn(pump(
                    SubscriptionKind::NewPendingTransactions,
                    sink,
                    events,
                    metrics,
                    |hash| vec![hash],
                ));
            }
        }
        Ok(())
    }
}

enum Feed {
    NewHeads,
    Logs(LogCriteria),
    NewPendingTransactions,
}

impl Feed {
    fn new(kind: SubscriptionKind, params: Option<serde_json::Value>) -> RpcResult<Self> {
        Ok(match kind {
            SubscriptionKind::NewHeads => Feed::NewHeads,
            SubscriptionKind::Logs => Feed::Logs(LogSubscriptionParams::parse(params)?.criteria()?),
            SubscriptionKind::NewPendingTransactions => Feed::NewPendingTransactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, B256};
    use ethcompat_backend::NativeLog;
    use ethcompat_rpc_types::{FilterAddress, FilterTopic};
    use serde_json::json;

    #[test]
    fn test_subscription_kinds() {
        for kind in [
            SubscriptionKind::NewHeads,
            SubscriptionKind::Logs,
            SubscriptionKind::NewPendingTransactions,
        ] {
            assert_eq!(SubscriptionKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(matches!(
            SubscriptionKind::from_str("syncing"),
            Err(RpcError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_log_params_parse() {
        assert_eq!(
            LogSubscriptionParams::parse(None).unwrap(),
            LogSubscriptionParams::default()
        );
        assert_eq!(
            LogSubscriptionParams::parse(Some(serde_json::Value::Null)).unwrap(),
            LogSubscriptionParams::default()
        );

        let params = LogSubscriptionParams::parse(Some(json!({
            "address": "0x1111111111111111111111111111111111111111",
            "topics": [null, ["0x2222222222222222222222222222222222222222222222222222222222222222"]]
        })))
        .unwrap();
        assert_eq!(
            params.0.address,
            Some(FilterAddress::Single(Address::repeat_byte(0x11)))
        );

        let params = LogSubscriptionParams::parse(Some(json!({ "fromBlock": "latest" }))).unwrap();
        assert_eq!(params.0.from_block, Some(BlockSelector::Latest));
        assert!(params.criteria().is_ok());

        assert!(matches!(
            LogSubscriptionParams::parse(Some(json!({ "address": 7 }))),
            Err(RpcError::InvalidParams(_))
        ));
    }

    #[test]
    fn test_log_params_range_checks() {
        let both = LogSubscriptionParams::parse(Some(json!({
            "fromBlock": "0x1",
            "blockHash": "0x2222222222222222222222222222222222222222222222222222222222222222"
        })))
        .unwrap();
        assert!(matches!(both.criteria(), Err(RpcError::BlockHashWithRange)));

        let inverted = LogSubscriptionParams::parse(Some(json!({
            "fromBlock": "0x9",
            "toBlock": "0x2"
        })))
        .unwrap();
        assert!(matches!(
            inverted.criteria(),
            Err(RpcError::InvalidBlockRange { from: 9, to: 2 })
        ));
    }

    #[test]
    fn test_log_params_numeric_bounds_gate_live_logs() {
        let criteria = LogSubscriptionParams::parse(Some(json!({
            "fromBlock": "0x5",
            "toBlock": "0x7"
        })))
        .unwrap()
        .criteria()
        .unwrap();

        let at = |block_number| NativeLog {
            block_number,
            ..Default::default()
        };
        assert!(!criteria.accepts_live(&at(4)));
        assert!(criteria.accepts_live(&at(5)));
        assert!(criteria.accepts_live(&at(7)));
        assert!(!criteria.accepts_live(&at(8)));

        let open = LogSubscriptionParams::parse(Some(json!({
            "fromBlock": "latest",
            "toBlock": "pending"
        })))
        .unwrap()
        .criteria()
        .unwrap();
        assert!(open.accepts_live(&at(1_000)));
    }

    #[test]
    fn test_log_params_criteria() {
        let criteria = LogSubscriptionParams(FilterCriteria {
            address: Some(FilterAddress::Multiple(vec![Address::repeat_byte(0xaa)])),
            topics: Some(vec![None, Some(FilterTopic::Single(B256::repeat_byte(2)))]),
            ..Default::default()
        })
        .criteria()
        .unwrap();

        let log = NativeLog {
            address: Address::repeat_byte(0xaa),
            topics: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
            block_number: 9,
            ..Default::default()
        };
        assert!(criteria.accepts_live(&log));
        assert!(!criteria.accepts_live(&NativeLog {
            address: Address::repeat_byte(0xbb),
            ..log.clone()
        }));
        assert!(!criteria.accepts_live(&NativeLog {
            topics: vec![B256::repeat_byte(1)],
            ..log
        }));

        let too_many = LogSubscriptionParams(FilterCriteria {
            topics: Some(vec![None; 5]),
            ..Default::default()
        });
        assert!(matches!(too_many.criteria(), Err(RpcError::TooManyTopics(5))));
    }
}
