//! Broadcast fan-out for chain events.
//!
//! A [`FilterEngine`](crate::FilterEngine) implementation publishes here and
//! hands out receivers. Consumers that fall behind the channel capacity lose
//! the oldest events and observe `RecvError::Lagged`.
//!
//! Pending transaction hashes also feed per-consumer unbounded queues, which
//! never drop anything; a queue is detached once its receiver is dropped.

use std::sync::Arc;

use alloy_primitives::B256;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc};

use crate::types::{NativeHeader, NativeLog};

const NEW_HEADS_CAPACITY: usize = 64;
const LOGS_CAPACITY: usize = 256;
const PENDING_TX_CAPACITY: usize = 1024;

pub struct EventHub {
    new_heads_tx: broadcast::Sender<Arc<NativeHeader>>,
    logs_tx: broadcast::Sender<Arc<[NativeLog]>>,
    pending_tx_tx: broadcast::Sender<B256>,
    pending_queues: Mutex<Vec<mpsc::UnboundedSender<B256>>>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventHub {
    pub fn new() -> Self {
        let (new_heads_tx, _) = broadcast::channel(NEW_HEADS_CAPACITY);
        let (logs_tx, _) = broadcast::channel(LOGS_CAPACITY);
        let (pending_tx_tx, _) = broadcast::channel(PENDING_TX_CAPACITY);

        Self {
            new_heads_tx,
            logs_tx,
            pending_tx_tx,
            pending_queues: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe_new_heads(&self) -> broadcast::Receiver<Arc<NativeHeader>> {
        self.new_heads_tx.subscribe()
    }

    pub fn subscribe_logs(&self) -> broadcast::Receiver<Arc<[NativeLog]>> {
        self.logs_tx.subscribe()
    }

    pub fn subscribe_pending_transactions(&self) -> broadcast::Receiver<B256> {
        self.pending_tx_tx.subscribe()
    }

    pub fn pending_transaction_queue(&self) -> mpsc::UnboundedReceiver<B256> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.pending_queues.lock().push(tx);
        rx
    }

    pub fn publish_new_head(&self, header: NativeHeader) {
        // A send error only means nobody is listening.
        let _ = self.new_heads_tx.send(Arc::new(header));
    }

    /// Publish the logs of one block. Empty batches are dropped.
    pub fn publish_logs(&self, logs: Vec<NativeLog>) {
        if logs.is_empty() {
            return;
        }
        let _ = self.logs_tx.send(logs.into());
    }

    pub fn publish_pending_transaction(&self, hash: B256) {
        let _ = self.pending_tx_tx.send(hash);
        self.pending_queues
            .lock()
            .retain(|queue| queue.send(hash).is_ok());
    }

    /// Total live receivers across all streams.
    pub fn receiver_count(&self) -> usize {
        self.new_heads_tx.receiver_count()
            + self.logs_tx.receiver_count()
            + self.pending_tx_tx.receiver_count()
            + self
                .pending_queues
                .lock()
                .iter()
                .filter(|queue| !queue.is_closed())
                .count()
    }
}
