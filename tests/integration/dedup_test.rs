//! Deduplication Cache Integration Tests
//!
//! Exercises the idempotence contract, TTL expiry under paused time, and
//! the background sweeper lifecycle.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use chorus_engine::DedupCache;

#[test]
fn idempotence_check_register_check() {
    let cache = DedupCache::new();

    assert!(!cache.is_duplicate("alice", "bot1", "hello"));
    cache.register_message("alice", "bot1", "hello");
    assert!(cache.is_duplicate("alice", "bot1", "hello"));
}

#[tokio::test(start_paused = true)]
async fn registered_entry_expires_after_ttl() {
    let cache = DedupCache::with_ttl(Duration::from_secs(5));

    cache.register_message("alice", "bot1", "hello");
    assert!(cache.is_duplicate("alice", "bot1", "hello"));

    tokio::time::advance(Duration::from_secs(5)).await;
    assert!(!cache.is_duplicate("alice", "bot1", "hello"));
}

#[tokio::test(start_paused = true)]
async fn reregistration_refreshes_the_window() {
    let cache = DedupCache::with_ttl(Duration::from_secs(5));

    cache.register_message("alice", "bot1", "hello");
    tokio::time::advance(Duration::from_secs(3)).await;
    cache.register_message("alice", "bot1", "hello");
    tokio::time::advance(Duration::from_secs(3)).await;

    // 6s since first insert, 3s since refresh
    assert!(cache.is_duplicate("alice", "bot1", "hello"));
}

#[tokio::test(start_paused = true)]
async fn sweeper_removes_expired_entries_on_period() {
    let cache = Arc::new(DedupCache::with_ttl(Duration::from_secs(5)));
    let shutdown = CancellationToken::new();
    let handle = cache.spawn_sweeper_with_period(Duration::from_secs(10), shutdown.clone());

    cache.register_message("alice", "bot1", "one");
    cache.register_message("bob", "bot2", "two");
    assert_eq!(cache.len(), 2);

    tokio::time::advance(Duration::from_secs(11)).await;
    tokio::task::yield_now().await;
    assert!(cache.is_empty());

    shutdown.cancel();
    handle.await.unwrap();
}

#[test]
fn check_and_register_races_resolve_to_one_winner() {
    let cache = Arc::new(DedupCache::new());

    // Many racing triggers for the same logical message: exactly one may win
    let winners: usize = (0..16)
        .map(|_| {
            let cache = cache.clone();
            std::thread::spawn(move || !cache.check_and_register("alice", "bot1", "hello"))
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|h| h.join().unwrap() as usize)
        .sum();

    assert_eq!(winners, 1);
}
