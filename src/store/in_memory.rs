use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::{ttl_millis, Store};
use crate::error::StoreError;

/// Expired entries are swept from the whole map once per this many inserts.
const SWEEP_EVERY: usize = 64;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Process-local store backed by a `HashMap` behind a `Mutex`.
///
/// Expired entries are dropped when their key is touched, and the whole map
/// is swept every `SWEEP_EVERY` inserts, so keys whose holders never come
/// back do not accumulate. Clones share the same map, so several clients in
/// one process can contend on it the way separate processes contend on a
/// shared Redis.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    inserts: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes `key` unconditionally. Returns whether a live entry existed.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned("remove"))?;
        let now = Instant::now();
        Ok(entries.remove(key).is_some_and(|entry| entry.is_live(now)))
    }

    /// Remaining time to live; `None` if the key is absent or never expires.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned("ttl"))?;
        let now = Instant::now();
        Ok(entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .and_then(|entry| entry.expires_at)
            .map(|at| at.saturating_duration_since(now)))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned("len"))?;
        let now = Instant::now();
        Ok(entries.values().filter(|entry| entry.is_live(now)).count())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

impl Store for InMemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.entries
            .lock()
            .map(|_| ())
            .map_err(|_| StoreError::Poisoned("ping"))
    }

    fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> Result<bool, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned("set_if_absent"))?;
        let now = Instant::now();

        if entries.get(key).is_some_and(|entry| entry.is_live(now)) {
            return Ok(false);
        }

        if self.inserts.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            entries.retain(|_, entry| entry.is_live(now));
        }

        // a TTL past the end of the clock never expires
        let expires_at = ttl_millis(ttl)
            .and_then(|millis| now.checked_add(Duration::from_millis(millis)));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(true)
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned("get"))?;
        let now = Instant::now();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn delete_if_equals(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| StoreError::Poisoned("delete_if_equals"))?;
        let now = Instant::now();

        let (live, matches) = match entries.get(key) {
            Some(entry) => {
                let live = entry.is_live(now);
                (live, live && entry.value == value)
            }
            None => return Ok(false),
        };
        if matches || !live {
            entries.remove(key);
        }
        Ok(matches)
    }
}
