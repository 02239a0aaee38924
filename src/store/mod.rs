mod in_memory;
#[cfg(feature = "redis")]
mod redis;

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;

pub use in_memory::InMemoryStore;
#[cfg(feature = "redis")]
pub use self::redis::{RedisStore, UNLOCK_SCRIPT};

/// The key-value operations the lock protocol needs from its backing store.
///
/// Every method is a single atomic operation on the store side. Redis
/// implements the conditional delete with a Lua script; a store without
/// scripting can use any compare-and-delete primitive, as long as the
/// comparison and the deletion cannot be interleaved with other writers.
pub trait Store: Send + Sync {
    /// Liveness check, performed once when a client is built.
    fn ping(&self) -> Result<(), StoreError>;

    /// Sets `key` to `value` only if `key` does not exist.
    /// Returns `Ok(true)` if this call created the key.
    ///
    /// A zero `ttl` creates a key that never expires.
    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError>;

    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Deletes `key` only if it currently holds `value`.
    /// Returns `Ok(true)` if a deletion happened.
    fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn ping(&self) -> Result<(), StoreError> {
        (**self).ping()
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        (**self).set_if_absent(key, value, ttl)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        (**self).delete_if_equals(key, value)
    }
}

/// TTL in whole milliseconds as sent to the store; `None` means no expiry.
/// Sub-millisecond durations round up so they still expire.
pub(crate) fn ttl_millis(ttl: Duration) -> Option<u64> {
    if ttl.is_zero() {
        return None;
    }
    let millis = ttl.as_millis().max(1);
    Some(u64::try_from(millis).unwrap_or(u64::MAX))
}
