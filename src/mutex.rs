use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::store::Store;
use crate::token::Token;

/// One acquisition attempt on one key.
///
/// The store entry `key -> token` is the lock. [`lock`](Mutex::lock) creates
/// it only if absent; [`unlock`](Mutex::unlock) deletes it only while it still
/// holds this mutex's token, so a release that arrives after expiry can never
/// remove a lock taken by someone else in the meantime.
pub struct Mutex<S> {
    store: Arc<S>,
    key: String,
    token: Token,
    value: String,
    expiration: Duration,
}

impl<S> Mutex<S> {
    pub(crate) fn new(store: Arc<S>, key: String, token: Token, expiration: Duration) -> Self {
        Mutex {
            store,
            key,
            value: token.to_string(),
            token,
            expiration,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn token(&self) -> Token {
        self.token
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }
}

impl<S: Store> Mutex<S> {
    /// Tries once to take the lock. Never blocks beyond one store round trip.
    ///
    /// `Ok(false)` means the key is held, by another mutex or by an earlier
    /// successful `lock` of this one that has not expired yet.
    pub fn lock(&self) -> Result<bool> {
        let acquired = self
            .store
            .set_if_absent(&self.key, &self.value, self.expiration)?;
        tracing::debug!(key = %self.key, token = %self.token, acquired, "lock");
        Ok(acquired)
    }

    /// Releases the lock if this mutex still owns it.
    ///
    /// Returns whether an entry was deleted. Releasing an expired, foreign or
    /// never-acquired lock is a no-op, so this is safe in cleanup paths.
    pub fn unlock(&self) -> Result<bool> {
        let released = self.store.delete_if_equals(&self.key, &self.value)?;
        tracing::debug!(key = %self.key, token = %self.token, released, "unlock");
        Ok(released)
    }

    /// Whether the store currently holds this mutex's token.
    pub fn is_held(&self) -> Result<bool> {
        Ok(self.store.get(&self.key)?.as_deref() == Some(self.value.as_str()))
    }

    /// Polls [`lock`](Mutex::lock) every `interval` until it succeeds or
    /// `timeout` elapses. A zero timeout makes exactly one attempt; a timeout
    /// too large to represent as an instant (e.g. `Duration::MAX`) waits
    /// without a deadline.
    ///
    /// Built on top of the single-shot primitive; there is no queuing, so
    /// waiters are not served in order.
    pub fn lock_wait(&self, timeout: Duration, interval: Duration) -> Result<bool> {
        let deadline = Instant::now().checked_add(timeout);
        loop {
            if self.lock()? {
                return Ok(true);
            }
            let pause = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        tracing::debug!(key = %self.key, ?timeout, "lock wait timed out");
                        return Ok(false);
                    }
                    interval.min(deadline - now)
                }
                None => interval,
            };
            thread::sleep(pause);
        }
    }

    /// Takes the lock and returns a guard that releases it on drop.
    pub fn try_guard(&self) -> Result<Option<MutexGuard<'_, S>>> {
        Ok(self.lock()?.then(|| MutexGuard {
            mutex: self,
            released: false,
        }))
    }
}

impl<S> fmt::Debug for Mutex<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex")
            .field("key", &self.key)
            .field("token", &self.token)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// Held lock that is released when dropped.
///
/// A failed release on drop is logged, not raised; the entry then lives until
/// its expiration.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct MutexGuard<'a, S: Store> {
    mutex: &'a Mutex<S>,
    released: bool,
}

impl<S: Store> MutexGuard<'_, S> {
    pub fn mutex(&self) -> &Mutex<S> {
        self.mutex
    }

    /// Releases now and reports the outcome instead of logging it.
    pub fn release(mut self) -> Result<bool> {
        self.released = true;
        self.mutex.unlock()
    }
}

impl<S: Store> Drop for MutexGuard<'_, S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.mutex.unlock() {
            tracing::warn!(key = %self.mutex.key, error = %e, "failed to release lock on drop");
        }
    }
}
