//! Contention and token uniqueness across threads sharing one client.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Barrier;
use std::thread;

use kv_mutex::{InMemoryStore, Token};

use crate::support::{memory_client, LONG};

#[test]
fn concurrent_mutex_creation_yields_unique_tokens() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 9);

    let tokens: Vec<Token> = thread::scope(|scope| {
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let client = &client;
                scope.spawn(move || {
                    (0..500)
                        .map(|j| client.new_mutex(format!("key-{}-{}", i, j), LONG).token())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    let unique: HashSet<_> = tokens.iter().collect();
    assert_eq!(tokens.len(), 8_000);
    assert_eq!(unique.len(), tokens.len());
}

#[test]
fn exactly_one_contender_wins() {
    let store = InMemoryStore::new();
    let client = memory_client(&store, 3);
    let barrier = Barrier::new(16);
    let winners = AtomicUsize::new(0);

    thread::scope(|scope| {
        for _ in 0..16 {
            scope.spawn(|| {
                let m = client.new_mutex("hot-key", LONG);
                barrier.wait();
                if m.lock().unwrap() {
                    winners.fetch_add(1, Ordering::SeqCst);
                }
            });
        }
    });

    assert_eq!(winners.load(Ordering::SeqCst), 1);
}

#[test]
fn clients_sharing_a_store_serialize_a_counter() {
    let store = InMemoryStore::new();
    let counter = AtomicUsize::new(0);
    let inside = AtomicUsize::new(0);

    thread::scope(|scope| {
        for node in 0..4 {
            let client = memory_client(&store, node);
            let counter = &counter;
            let inside = &inside;
            scope.spawn(move || {
                let mut done = 0;
                while done < 25 {
                    let m = client.new_mutex("counter", LONG);
                    if !m.lock().unwrap() {
                        thread::yield_now();
                        continue;
                    }
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    counter.fetch_add(1, Ordering::SeqCst);
                    inside.fetch_sub(1, Ordering::SeqCst);
                    assert!(m.unlock().unwrap());
                    done += 1;
                }
            });
        }
    });

    assert_eq!(counter.load(Ordering::SeqCst), 100);
}
