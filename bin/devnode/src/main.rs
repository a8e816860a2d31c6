//! Development node serving the Ethereum compatibility facade.
//!
//! Runs an in-memory chain behind the `eth_` JSON-RPC namespace so wallets
//! and tooling can be pointed at it without a full node.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                ethcompat-devnode             │
//! │                                              │
//! │  HTTP/WS :8545 ──► EthFacade ──► Collaborators
//! │                       │              │       │
//! │               FilterRegistry   MemoryBackend │
//! │                       ▲              │       │
//! │   idle sweep ─────────┘    block timer ──────┘
//! └──────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```bash
//! # Defaults: chain id 1337, 127.0.0.1:8545, one block every 2s
//! ethcompat-devnode
//!
//! # From a config file, with a funded account
//! ethcompat-devnode --config facade.yaml \
//!     --prefund 0x00000000000000000000000000000000000000aa
//!
//! # Only seal blocks when asked to (no timer)
//! ethcompat-devnode --block-time-ms 0
//! ```
//!
//! The in-memory chain installs no transaction decoder, so
//! `eth_sendRawTransaction` answers with a malformed-encoding error. Embed
//! [`MemoryBackend::with_decoder`] in a custom binary to accept submissions.

use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, U256};
use clap::Parser;
use ethcompat_backend::{AccountState, Collaborators, MemoryBackend, MemoryBackendConfig};
use ethcompat_eth_jsonrpc::{
    load_config, start_server, validate_config, EthFacade, FacadeConfig, FacadeMetrics,
};
use prometheus_client::encoding::text::encode;
use prometheus_client::registry::Registry;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_CHAIN_ID: u64 = 1337;

/// 1000 ether, in wei.
const PREFUND_BALANCE: u128 = 1_000_000_000_000_000_000_000;

#[derive(Debug, Parser)]
#[command(name = "ethcompat-devnode")]
#[command(about = "Ethereum JSON-RPC facade over an in-memory chain")]
#[command(version)]
struct Cli {
    /// Config YAML path; built-in defaults are used when omitted
    #[arg(long, env = "ETHCOMPAT_CONFIG")]
    config: Option<PathBuf>,

    /// Chain ID override
    #[arg(long)]
    chain_id: Option<u64>,

    /// JSON-RPC listen address override
    #[arg(long)]
    rpc_addr: Option<SocketAddr>,

    /// Log level override
    #[arg(long)]
    log_level: Option<String>,

    /// Seal the pool into a block this often; 0 disables the timer
    #[arg(long, default_value_t = 2000)]
    block_time_ms: u64,

    /// Fund this address at genesis and mark it locally managed (repeatable)
    #[arg(long)]
    prefund: Vec<Address>,
}

impl Cli {
    /// Defaults < YAML < CLI flags.
    fn resolve_config(&self) -> Result<FacadeConfig, Box<dyn Error + Send + Sync>> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => FacadeConfig::new(DEFAULT_CHAIN_ID),
        };
        if let Some(chain_id) = self.chain_id {
            config.chain_id = chain_id;
        }
        if let Some(addr) = self.rpc_addr {
            config.rpc.http_addr = addr;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        validate_config(&config)?;
        Ok(config)
    }
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    if json {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    init_tracing(&config.logging.level, config.logging.json);

    tracing::info!("=== ethcompat devnode ===");
    tracing::info!(chain_id = config.chain_id, "Starting in-memory chain");

    let backend = Arc::new(MemoryBackend::new(MemoryBackendConfig {
        chain_id: config.chain_id,
        ..Default::default()
    }));
    for address in &cli.prefund {
        backend.set_account(
            *address,
            AccountState {
                balance: U256::from(PREFUND_BALANCE),
                ..Default::default()
            },
        );
        backend.add_local_account(*address);
        tracing::info!(%address, "Prefunded account");
    }
    if !cli.prefund.is_empty() {
        // Funds are visible at `latest` once a block carries them.
        backend.mine_pending(unix_now())?;
    }

    let mut registry = Registry::default();
    let metrics = FacadeMetrics::register(&mut registry);
    let collaborators = Collaborators::from_shared(backend.clone());
    let facade = EthFacade::new(&config, &collaborators, metrics);
    let filters = facade.filters().clone();

    let handle = start_server(&config, facade).await?;

    let idle_timeout = config.filters.idle_timeout();
    let sweep = tokio::spawn(async move {
        let mut interval = tokio::time::interval(idle_timeout / 2);
        loop {
            interval.tick().await;
            let evicted = filters.expire_idle(idle_timeout);
            if evicted > 0 {
                tracing::debug!(evicted, remaining = filters.len(), "Evicted idle filters");
            }
            let mut snapshot = String::new();
            if encode(&mut snapshot, &registry).is_ok() {
                tracing::trace!(metrics = %snapshot, "Facade metrics");
            }
        }
    });

    let miner = (cli.block_time_ms > 0).then(|| {
        let backend = backend.clone();
        let period = Duration::from_millis(cli.block_time_ms);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                match backend.mine_pending(unix_now()) {
                    Ok(header) => tracing::debug!(number = header.number, hash = %header.hash, "Sealed block"),
                    Err(e) => tracing::warn!("Failed to seal block: {}", e),
                }
            }
        })
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal, stopping JSON-RPC server");

    sweep.abort();
    if let Some(miner) = miner {
        miner.abort();
    }
    handle.stop()?;
    handle.stopped().await;

    tracing::info!("Shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ethcompat-devnode").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = cli(&["--chain-id", "42", "--rpc-addr", "127.0.0.1:9545"])
            .resolve_config()
            .unwrap();
        assert_eq!(config.chain_id, 42);
        assert_eq!(config.rpc.http_addr, "127.0.0.1:9545".parse::<SocketAddr>().unwrap());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_overrides_are_refused() {
        assert!(cli(&["--chain-id", "0"]).resolve_config().is_err());
        assert!(cli(&["--log-level", "bogus"]).resolve_config().is_err());
    }
}
