//! Native chain model and the collaborator interfaces behind the ethcompat
//! facade.
//!
//! The facade never owns chain data. It reads through the traits in
//! [`collaborators`] and translates what they return:
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │           ethcompat-eth-jsonrpc (facade)           │
//! └──────────────────────────┬─────────────────────────┘
//!                            │ Collaborators
//!      ┌─────────┬───────────┼───────────┬────────────┐
//!      ▼         ▼           ▼           ▼            ▼
//! ChainReader StateReader PoolReader  FilterEngine AccountDirectory
//!             Executor    PoolWriter
//! ```
//!
//! [`MemoryBackend`] implements every interface over in-process maps.

pub mod collaborators;
pub mod error;
pub mod events;
pub mod memory;
pub mod types;

pub use collaborators::{
    AccountDirectory, ChainReader, Collaborators, Executor, FilterEngine, PoolReader, PoolWriter,
    StateReader,
};
pub use error::{BackendError, BackendResult, PoolError, PoolResult};
pub use events::EventHub;
pub use memory::{AccountState, MemoryBackend, MemoryBackendConfig};
pub use types::*;
