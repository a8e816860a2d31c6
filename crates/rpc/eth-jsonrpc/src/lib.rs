//! Ethereum JSON-RPC compatibility facade over a native node.
//!
//! Standard wallets and tooling speak the `eth_` namespace; the node speaks
//! its own model. This crate translates between the two: native blocks,
//! transactions, receipts and logs become their Ethereum wire shapes, block
//! selectors resolve uniformly against the native chain, polling filters and
//! push subscriptions ride on the node's event streams, and methods for
//! concepts the chain lacks answer from a fixed table.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ethcompat_backend::{Collaborators, MemoryBackend};
//! use ethcompat_eth_jsonrpc::{start_server, EthFacade, FacadeConfig, FacadeMetrics};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = FacadeConfig::new(1);
//!     let collaborators = Collaborators::from_shared(Arc::new(MemoryBackend::default()));
//!     let facade = EthFacade::new(&config, &collaborators, FacadeMetrics::default());
//!     let handle = start_server(&config, facade).await.unwrap();
//!     handle.stopped().await;
//! }
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod lookup;
pub mod metrics;
pub mod server;
pub mod subscriptions;
pub mod translate;
pub mod unsupported;

pub use api::{EthApiServer, EthPubSubApiServer};
pub use config::{load_config, load_config_from_str, validate_config, ConfigError, FacadeConfig};
pub use error::{RpcError, RpcResult};
pub use filters::{FilterId, FilterRegistry, LogCriteria};
pub use lookup::ChainLookup;
pub use metrics::FacadeMetrics;
pub use server::{start_server, EthFacade};
pub use subscriptions::{SubscriptionKind, Subscriptions};
pub use unsupported::{StubValue, UNSUPPORTED_METHODS};
