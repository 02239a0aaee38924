#![allow(dead_code)]

use std::time::Duration;

use kv_mutex::{Client, InMemoryStore};

pub const LONG: Duration = Duration::from_secs(30);

/// A client over `store`, as if it ran in its own process with `node_id`.
pub fn memory_client(store: &InMemoryStore, node_id: i64) -> Client<InMemoryStore> {
    Client::builder("memory")
        .node_id(node_id)
        .build_with_store(store.clone())
        .unwrap()
}

/// Address of the server used by ignored live tests.
pub fn redis_address() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "127.0.0.1:6379".to_string())
}

/// Unique key per test run so parallel tests never share an entry.
pub fn unique_key(prefix: &str) -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("kv_mutex_test:{}:{}", prefix, nanos)
}
