//! Deduplication Cache
//!
//! Time-windowed idempotence guard keyed by (participant, bot, content
//! hash). Prevents the same logical message from being answered twice when
//! racing triggers (network retry, optimistic UI event) fire concurrently.
//!
//! Entries expire after a fixed TTL (default 5 s): lazily on lookup, and
//! physically via a background sweep on a fixed period (default 10 s). This
//! is a fixed-TTL cache, not an LRU, because its purpose is race
//! suppression rather than general caching.
//!
//! The key is a fast, non-cryptographic hash; a collision only causes a
//! false "duplicate" which degrades to an informational reply.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Default entry time-to-live.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

/// Default background sweep period.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// Shared, mutex-guarded TTL cache of recently processed messages.
///
/// One instance per process, owned by the host and shared by `Arc`. The
/// `check_and_register` path is a single atomic check-and-set under one
/// lock, so two racing orchestration rounds cannot both observe "not a
/// duplicate" for the same message.
pub struct DedupCache {
    entries: Mutex<HashMap<u64, Instant>>,
    ttl: Duration,
}

impl DedupCache {
    /// Create a cache with the default 5 second TTL.
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }

    /// Create a cache with an explicit TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// The configured entry time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Derive the cache key for a (participant, bot, content) triple.
    fn key(participant_id: &str, bot_id: &str, content: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        (participant_id, bot_id, content).hash(&mut hasher);
        hasher.finish()
    }

    /// True iff an unexpired entry exists for the derived key.
    ///
    /// An expired entry is removed on the spot (lazy expiry).
    pub fn is_duplicate(&self, participant_id: &str, bot_id: &str, content: &str) -> bool {
        let key = Self::key(participant_id, bot_id, content);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(inserted_at) if inserted_at.elapsed() < self.ttl => true,
            Some(_) => {
                entries.remove(&key);
                false
            }
            None => false,
        }
    }

    /// Insert/overwrite the entry for a triple with the current timestamp.
    pub fn register_message(&self, participant_id: &str, bot_id: &str, content: &str) {
        let key = Self::key(participant_id, bot_id, content);
        self.lock().insert(key, Instant::now());
    }

    /// Atomic check-and-set: returns true if the triple was already
    /// registered within the TTL window, otherwise registers it now and
    /// returns false. Single lock acquisition for the whole pair.
    pub fn check_and_register(&self, participant_id: &str, bot_id: &str, content: &str) -> bool {
        let key = Self::key(participant_id, bot_id, content);
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(inserted_at) if inserted_at.elapsed() < self.ttl => true,
            _ => {
                entries.insert(key, Instant::now());
                false
            }
        }
    }

    /// Physically remove all expired entries; returns how many were removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        let ttl = self.ttl;
        entries.retain(|_, inserted_at| inserted_at.elapsed() < ttl);
        before - entries.len()
    }

    /// Number of entries currently held (including not-yet-swept expired ones).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Spawn the background sweep task on the default 10 second period.
    pub fn spawn_sweeper(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        self.spawn_sweeper_with_period(DEFAULT_SWEEP_INTERVAL, shutdown)
    }

    /// Spawn the background sweep task on an explicit period. The task runs
    /// until the cancellation token trips.
    pub fn spawn_sweeper_with_period(
        self: &Arc<Self>,
        period: Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let cache = Arc::clone(self);
        // Create the interval here so its period is anchored to spawn time,
        // not to whenever the task is first polled.
        let mut interval = tokio::time::interval(period);
        tokio::spawn(async move {
            // The first tick completes immediately; skip it so the first
            // sweep happens one full period after startup.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("dedup sweeper shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            tracing::debug!(removed, "dedup sweep removed expired entries");
                        }
                    }
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Instant>> {
        // Nothing we run under this lock can panic, so recover rather than
        // propagate a poison.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}
