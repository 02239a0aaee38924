//! Distributed mutual exclusion over a shared key-value store.
//!
//! Processes never talk to each other; the store entry `key -> token` is the
//! lock. Acquisition is an atomic set-if-absent with a TTL, release is an
//! atomic compare-and-delete against the mutex's own token, and the TTL frees
//! locks whose holder crashed.
//!
//! ```ignore
//! use std::time::Duration;
//! use kv_mutex::Client;
//!
//! let client = Client::builder("127.0.0.1:6379").pool_size(4).node_id(7).connect()?;
//! let mutex = client.new_mutex("job-42", Duration::from_secs(10));
//! if mutex.lock()? {
//!     run_job();
//!     mutex.unlock()?;
//! }
//! ```
//!
//! Tokens embed a 10-bit node id. Hosts left on the default host-name
//! derivation can collide on that id, which makes equal tokens (and thus a
//! foreign release) possible though unlikely. Assign distinct ids with
//! [`ClientBuilder::node_id`] or a custom [`NodeIdResolver`] where that matters.

mod client;
pub mod config;
mod error;
mod mutex;
pub mod node_id;
pub mod store;
pub mod token;

pub use client::{Client, ClientBuilder};
pub use config::ClientConfig;
pub use error::{ConfigError, MutexError, Result, StoreError};
pub use mutex::{Mutex, MutexGuard};
pub use node_id::{FixedNodeId, HostnameNodeId, NodeIdResolver};
#[cfg(feature = "redis")]
pub use store::RedisStore;
pub use store::{InMemoryStore, Store};
pub use token::{Token, TokenGenerator};
