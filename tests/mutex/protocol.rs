//! Mutual exclusion, safe release, expiry-safety and idempotent unlock.

use std::thread;
use std::time::Duration;

use kv_mutex::{InMemoryStore, Store};

use crate::support::{memory_client, LONG};

// ============================================================================
// Mutual exclusion
// ============================================================================

#[test]
fn second_holder_is_refused_while_first_holds() {
    let store = InMemoryStore::new();
    let a = memory_client(&store, 1).new_mutex("resource", LONG);
    let b = memory_client(&store, 2).new_mutex("resource", LONG);

    assert!(a.lock().unwrap());
    assert!(!b.lock().unwrap());
    assert!(!b.lock().unwrap());
    assert_eq!(store.get("resource").unwrap(), Some(a.token().to_string()));
}

#[test]
fn different_keys_do_not_contend() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 1);
    let a = client.new_mutex("left", LONG);
    let b = client.new_mutex("right", LONG);

    assert!(a.lock().unwrap());
    assert!(b.lock().unwrap());
}

// ============================================================================
// Safe release
// ============================================================================

#[test]
fn release_lets_the_next_holder_in() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 1);
    let a = client.new_mutex("resource", LONG);
    let b = client.new_mutex("resource", LONG);

    assert!(a.lock().unwrap());
    assert!(!b.lock().unwrap());
    assert!(a.unlock().unwrap());
    assert_eq!(store.get("resource").unwrap(), None);

    assert!(b.lock().unwrap());
    assert_eq!(store.get("resource").unwrap(), Some(b.token().to_string()));
    assert!(b.unlock().unwrap());
    assert_eq!(store.get("resource").unwrap(), None);
}

// ============================================================================
// Expiry-safety
// ============================================================================

#[test]
fn late_unlock_does_not_release_the_new_holder() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 1);
    let a = client.new_mutex("resource", Duration::from_millis(30));
    assert!(a.lock().unwrap());

    thread::sleep(Duration::from_millis(60));

    let b = client.new_mutex("resource", LONG);
    assert!(b.lock().unwrap());

    assert!(!a.unlock().unwrap());
    assert_eq!(store.get("resource").unwrap(), Some(b.token().to_string()));
    assert!(b.is_held().unwrap());
}

#[test]
fn forced_removal_behaves_like_expiry() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 1);
    let a = client.new_mutex("resource", LONG);
    assert!(a.lock().unwrap());

    store.remove("resource").unwrap();

    let b = client.new_mutex("resource", LONG);
    assert!(b.lock().unwrap());
    a.unlock().unwrap();
    assert!(b.is_held().unwrap());
    b.unlock().unwrap();
    assert!(store.is_empty().unwrap());
}

// ============================================================================
// Idempotent unlock
// ============================================================================

#[test]
fn unlock_is_always_safe() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 1);
    let holder = client.new_mutex("resource", LONG);
    let never_locked = client.new_mutex("resource", LONG);

    assert!(!never_locked.unlock().unwrap());

    assert!(holder.lock().unwrap());
    assert!(!never_locked.unlock().unwrap());
    assert!(holder.is_held().unwrap());

    assert!(holder.unlock().unwrap());
    assert!(!holder.unlock().unwrap());
    assert!(store.is_empty().unwrap());
}

#[test]
fn zero_expiration_never_expires() {
    let store = InMemoryStore::new();
    let m = memory_client(&store, 1).new_mutex("forever", Duration::ZERO);
    assert!(m.lock().unwrap());
    assert_eq!(store.ttl("forever").unwrap(), None);
    thread::sleep(Duration::from_millis(20));
    assert!(m.is_held().unwrap());
}

#[test]
fn expiration_becomes_the_entry_ttl() {
    let store = InMemoryStore::new();
    let m = memory_client(&store, 1).new_mutex("resource", Duration::from_secs(10));
    assert!(m.lock().unwrap());
    let ttl = store.ttl("resource").unwrap().unwrap();
    assert!(ttl <= Duration::from_secs(10) && ttl > Duration::from_secs(9));
}
