//! Lock protocol integration tests.
//!
//! Every property runs against `InMemoryStore`, with separate clients standing
//! in for separate processes. The `live_redis` module repeats the core
//! scenarios against a real server and is ignored by default:
//!
//! ```text
//! REDIS_URL=127.0.0.1:6379 cargo test -- --ignored
//! ```

mod support;
mod protocol;
mod concurrency;
