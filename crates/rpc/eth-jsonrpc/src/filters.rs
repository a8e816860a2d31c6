//! Polling filters: `eth_newFilter`, `eth_newBlockFilter`,
//! `eth_newPendingTransactionFilter`, `eth_getFilterChanges`,
//! `eth_getFilterLogs`, `eth_uninstallFilter`, plus the one-shot `eth_getLogs`.
//!
//! Block and log filters remember the last block number they reported. A
//! poll claims `(cursor, head]` and reads that range back from the chain, so
//! nothing is lost however long a client waits between polls. Pending
//! transaction filters own an unbounded queue from the engine and drain it.
//!
//! Locking: the registry map is held only long enough to clone a filter's
//! handle; each filter has its own mutex, so polls on different ids never
//! contend. The cursor is claimed under the mutex and the range is read after
//! releasing it; no lock is held across a collaborator call.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, B256};
use ethcompat_backend::{
    matches_criteria, BlockRef, ChainReader, Collaborators, FilterEngine, LogQuery, LogRange,
    NativeLog,
};
use ethcompat_rpc_types::{BlockSelector, FilterChanges, FilterCriteria, RpcLog, MAX_TOPICS};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::error::{RpcError, RpcResult};
use crate::metrics::FacadeMetrics;
use crate::translate::translate_log;

/// Opaque filter identifier, a random 128-bit hex quantity on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterId(String);

impl FilterId {
    fn random() -> Self {
        Self(format!("{:#x}", rand::random::<u128>()))
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Validated log filter criteria. Symbolic range bounds stay symbolic and
/// are resolved against the head at query time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCriteria {
    from: BlockSelector,
    to: BlockSelector,
    block_hash: Option<B256>,
    addresses: Vec<Address>,
    topics: Vec<Vec<B256>>,
}

impl LogCriteria {
    pub fn from_wire(criteria: &FilterCriteria) -> RpcResult<Self> {
        if criteria.block_hash.is_some()
            && (criteria.from_block.is_some() || criteria.to_block.is_some())
        {
            return Err(RpcError::BlockHashWithRange);
        }
        let topics: Vec<Vec<B256>> = criteria
            .topics
            .iter()
            .flatten()
            .map(|position| position.as_ref().map(|t| t.to_vec()).unwrap_or_default())
            .collect();
        if topics.len() > MAX_TOPICS {
            return Err(RpcError::TooManyTopics(topics.len()));
        }
        let from = criteria.from_block.unwrap_or_default();
        let to = criteria.to_block.unwrap_or_default();
        if matches!(from, BlockSelector::Hash(_)) || matches!(to, BlockSelector::Hash(_)) {
            return Err(RpcError::InvalidParams(
                "fromBlock and toBlock take a number or tag; use blockHash for a single block"
                    .to_string(),
            ));
        }

        Ok(Self {
            from,
            to,
            block_hash: criteria.block_hash,
            addresses: criteria
                .address
                .as_ref()
                .map(|address| address.to_vec())
                .unwrap_or_default(),
            topics,
        })
    }

    /// Pin the range to `head`: `earliest` is 0, `latest` is the head and
    /// `pending` is the block after it.
    pub fn resolve(&self, head: u64) -> RpcResult<LogQuery> {
        let range = match self.block_hash {
            Some(hash) => LogRange::AtHash(hash),
            None => {
                let from = resolve_bound(self.from, head);
                let to = resolve_bound(self.to, head);
                if from > to {
                    return Err(RpcError::InvalidBlockRange { from, to });
                }
                LogRange::Blocks { from, to }
            }
        };
        Ok(LogQuery {
            range,
            addresses: self.addresses.clone(),
            topics: self.topics.clone(),
        })
    }

    /// The query for blocks `first..=last` newly seen by a poll, clamped to
    /// the numeric bounds. `None` when nothing in that window can match.
    fn window(&self, first: u64, last: u64) -> Option<LogQuery> {
        let range = match self.block_hash {
            Some(hash) => LogRange::AtHash(hash),
            None => {
                let from = fixed_bound(self.from).map_or(first, |from| from.max(first));
                let to = fixed_bound(self.to).map_or(last, |to| to.min(last));
                if from > to {
                    return None;
                }
                LogRange::Blocks { from, to }
            }
        };
        Some(LogQuery {
            range,
            addresses: self.addresses.clone(),
            topics: self.topics.clone(),
        })
    }

    /// Whether a freshly produced log belongs to this filter. Only explicit
    /// numeric bounds constrain live logs; symbolic ones follow the head.
    pub fn accepts_live(&self, log: &NativeLog) -> bool {
        if let Some(hash) = self.block_hash {
            if log.block_hash != hash {
                return false;
            }
        }
        if fixed_bound(self.from).is_some_and(|from| log.block_number < from) {
            return false;
        }
        if fixed_bound(self.to).is_some_and(|to| log.block_number > to) {
            return false;
        }
        matches_criteria(&self.addresses, &self.topics, log)
    }
}

fn resolve_bound(selector: BlockSelector, head: u64) -> u64 {
    match selector {
        BlockSelector::Number(number) => number,
        BlockSelector::Earliest => 0,
        BlockSelector::Pending => head.saturating_add(1),
        BlockSelector::Latest | BlockSelector::Hash(_) => head,
    }
}

fn fixed_bound(selector: BlockSelector) -> Option<u64> {
    match selector {
        BlockSelector::Number(number) => Some(number),
        BlockSelector::Earliest => Some(0),
        _ => None,
    }
}

enum FilterKind {
    /// Last block number reported.
    Blocks { cursor: u64 },
    PendingTransactions(mpsc::UnboundedReceiver<B256>),
    Logs { criteria: LogCriteria, cursor: u64 },
}

impl FilterKind {
    fn name(&self) -> &'static str {
        match self {
            FilterKind::Blocks { .. } => "blocks",
            FilterKind::PendingTransactions(_) => "pendingTransactions",
            FilterKind::Logs { .. } => "logs",
        }
    }

    fn cursor_mut(&mut self) -> Option<&mut u64> {
        match self {
            FilterKind::Blocks { cursor } | FilterKind::Logs { cursor, .. } => Some(cursor),
            FilterKind::PendingTransactions(_) => None,
        }
    }
}

struct ActiveFilter {
    kind: FilterKind,
    last_poll: Instant,
}

/// What a poll does once the filter lock is released.
enum Poll {
    Drained { hashes: Vec<B256>, closed: bool },
    Blocks,
    Logs(LogCriteria),
}

/// A poll's hold on `(previous, head]`. The cursor already sits at `head`,
/// so concurrent polls claim disjoint ranges. Dropping the claim without
/// committing (an error, or the request deadline cancelling the poll) hands
/// the range back for the next poll.
struct Claim<'a> {
    filter: &'a Mutex<ActiveFilter>,
    previous: u64,
    head: u64,
    committed: bool,
}

impl<'a> Claim<'a> {
    fn take(filter: &'a Mutex<ActiveFilter>, head: u64) -> Option<Self> {
        let mut active = filter.lock();
        let cursor = active.kind.cursor_mut()?;
        if head <= *cursor {
            return None;
        }
        let previous = std::mem::replace(cursor, head);
        Some(Self {
            filter,
            previous,
            head,
            committed: false,
        })
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(cursor) = self.filter.lock().kind.cursor_mut() {
            if *cursor == self.head {
                *cursor = self.previous;
            }
        }
    }
}

/// Pull everything queued on `receiver`. Returns the items and whether the
/// sending side is gone.
fn drain<T>(receiver: &mut mpsc::UnboundedReceiver<T>) -> (Vec<T>, bool) {
    let mut items = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(item) => items.push(item),
            Err(TryRecvError::Empty) => return (items, false),
            Err(TryRecvError::Disconnected) => return (items, true),
        }
    }
}

pub struct FilterRegistry {
    engine: Arc<dyn FilterEngine>,
    chain: Arc<dyn ChainReader>,
    filters: RwLock<HashMap<FilterId, Arc<Mutex<ActiveFilter>>>>,
    max_filters: usize,
    metrics: FacadeMetrics,
}

impl FilterRegistry {
    pub fn new(collaborators: &Collaborators, max_filters: usize, metrics: FacadeMetrics) -> Self {
        Self {
            engine: collaborators.filters.clone(),
            chain: collaborators.chain.clone(),
            filters: RwLock::new(HashMap::new()),
            max_filters,
            metrics,
        }
    }

    pub fn len(&self) -> usize {
        self.filters.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn install(&self, kind: FilterKind) -> RpcResult<FilterId> {
        let name = kind.name();
        let mut filters = self.filters.write();
        if filters.len() >= self.max_filters {
            return Err(RpcError::TooManyFilters(self.max_filters));
        }
        let mut id = FilterId::random();
        while filters.contains_key(&id) {
            id = FilterId::random();
        }
        filters.insert(
            id.clone(),
            Arc::new(Mutex::new(ActiveFilter {
                kind,
                last_poll: Instant::now(),
            })),
        );
        drop(filters);

        self.metrics.installed_filters.inc();
        tracing::debug!(filter = %id, kind = name, "installed filter");
        Ok(id)
    }

    /// Validation happens before anything is installed. Only blocks after
    /// the current head count as changes.
    pub async fn new_log_filter(&self, criteria: &FilterCriteria) -> RpcResult<FilterId> {
        let criteria = LogCriteria::from_wire(criteria)?;
        let head = self.chain.head_number().await?;
        criteria.resolve(head)?;
        self.install(FilterKind::Logs {
            criteria,
            cursor: head,
        })
    }

    pub async fn new_block_filter(&self) -> RpcResult<FilterId> {
        let head = self.chain.head_number().await?;
        self.install(FilterKind::Blocks { cursor: head })
    }

    pub fn new_pending_transaction_filter(&self) -> RpcResult<FilterId> {
        self.install(FilterKind::PendingTransactions(
            self.engine.pending_transaction_queue(),
        ))
    }

    fn handle(&self, id: &FilterId) -> Option<Arc<Mutex<ActiveFilter>>> {
        self.filters.read().get(id).cloned()
    }

    /// Everything that arrived since the previous poll of `id`. An unknown
    /// id yields an empty result.
    pub async fn changes(&self, id: &FilterId) -> RpcResult<FilterChanges> {
        let Some(filter) = self.handle(id) else {
            return Ok(FilterChanges::empty());
        };

        let poll = {
            let mut active = filter.lock();
            active.last_poll = Instant::now();
            match &mut active.kind {
                FilterKind::PendingTransactions(queue) => {
                    let (hashes, closed) = drain(queue);
                    Poll::Drained { hashes, closed }
                }
                FilterKind::Blocks { .. } => Poll::Blocks,
                FilterKind::Logs { criteria, .. } => Poll::Logs(criteria.clone()),
            }
        };
        if let Poll::Drained { hashes, closed } = poll {
            if closed {
                tracing::debug!(filter = %id, "event source closed, removing filter");
                self.remove(id);
            }
            return Ok(FilterChanges::Hashes(hashes));
        }

        let head = self.chain.head_number().await?;
        let Some(claim) = Claim::take(&filter, head) else {
            return Ok(FilterChanges::empty());
        };
        let (first, last) = (claim.previous + 1, claim.head);

        let changes = match poll {
            Poll::Logs(criteria) => {
                FilterChanges::Logs(self.window_logs(&criteria, first, last).await?)
            }
            _ => FilterChanges::Hashes(self.block_hashes(first, last).await?),
        };
        claim.commit();
        Ok(changes)
    }

    async fn block_hashes(&self, first: u64, last: u64) -> RpcResult<Vec<B256>> {
        let mut hashes = Vec::with_capacity((last + 1 - first) as usize);
        for number in first..=last {
            if let Some(header) = self.chain.header(BlockRef::Number(number)).await? {
                hashes.push(header.hash);
            }
        }
        Ok(hashes)
    }

    async fn window_logs(
        &self,
        criteria: &LogCriteria,
        first: u64,
        last: u64,
    ) -> RpcResult<Vec<RpcLog>> {
        let Some(query) = criteria.window(first, last) else {
            return Ok(vec![]);
        };
        let logs = self.engine.logs(&query).await?;
        Ok(logs
            .iter()
            .filter(|log| (first..=last).contains(&log.block_number))
            .map(translate_log)
            .collect())
    }

    /// The full current match set of a log filter, independent of polling.
    /// Unknown ids and non-log filters yield an empty result.
    pub async fn filter_logs(&self, id: &FilterId) -> RpcResult<Vec<RpcLog>> {
        let criteria = {
            let Some(filter) = self.handle(id) else {
                return Ok(vec![]);
            };
            let active = filter.lock();
            match &active.kind {
                FilterKind::Logs { criteria, .. } => criteria.clone(),
                _ => return Ok(vec![]),
            }
        };
        self.query_logs(&criteria).await
    }

    /// One-shot `eth_getLogs`.
    pub async fn logs(&self, criteria: &FilterCriteria) -> RpcResult<Vec<RpcLog>> {
        let criteria = LogCriteria::from_wire(criteria)?;
        self.query_logs(&criteria).await
    }

    async fn query_logs(&self, criteria: &LogCriteria) -> RpcResult<Vec<RpcLog>> {
        let head = self.chain.head_number().await?;
        let query = criteria.resolve(head)?;
        let logs = self.engine.logs(&query).await?;
        Ok(logs.iter().map(translate_log).collect())
    }

    pub fn uninstall(&self, id: &FilterId) -> bool {
        let removed = self.remove(id);
        if removed {
            tracing::debug!(filter = %id, "uninstalled filter");
        }
        removed
    }

    fn remove(&self, id: &FilterId) -> bool {
        let removed = self.filters.write().remove(id);
        match removed {
            Some(filter) => {
                // Wait out a poll that grabbed the handle before removal.
                drop(filter.lock());
                self.metrics.installed_filters.dec();
                true
            }
            None => false,
        }
    }

    /// Drop filters nobody polled for `max_idle`. Returns how many went.
    pub fn expire_idle(&self, max_idle: Duration) -> usize {
        let expired: Vec<FilterId> = self
            .filters
            .read()
            .iter()
            .filter(|(_, filter)| {
                filter
                    .try_lock()
                    .is_some_and(|active| active.last_poll.elapsed() > max_idle)
            })
            .map(|(id, _)| id.clone())
            .collect();

        let removed = expired.iter().filter(|id| self.remove(id)).count();
        if removed > 0 {
            tracing::debug!(removed, "expired idle filters");
        }
        removed
    }
}
