//! In-memory key/value store whose entries expire after a fixed interval
//!
//! Expiry is passive: an entry is checked when it is read, or when
//! [`TtlCache::purge_expired_entries`] sweeps the whole map. Nothing runs in
//! the background.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::config::DEFAULT_CACHE_EXPIRY_MS;
use crate::lookup::types::Metadata;

/// Registry metadata keyed by package name
pub type MetadataCache = TtlCache<String, Arc<Metadata>>;

/// Source of the current time in milliseconds
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock (milliseconds since UNIX epoch)
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or_default()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(start_ms),
        }
    }

    pub fn advance(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    expires_at: i64,
}

pub struct TtlCache<K, V> {
    entries: Mutex<HashMap<K, Entry<V>>>,
    expiry_ms: i64,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Creates a cache whose entries live for `expiry_ms` milliseconds
    pub fn new(expiry_ms: i64) -> Self {
        Self::with_clock(expiry_ms, Arc::new(SystemClock))
    }

    /// Negative expiries are treated as 0, so entries expire immediately.
    pub fn with_clock(expiry_ms: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            expiry_ms: expiry_ms.max(0),
            clock,
        }
    }

    pub fn expiry_ms(&self) -> i64 {
        self.expiry_ms
    }

    // A panic while holding the lock cannot leave a half-written entry, so a
    // poisoned map is still usable.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<K, Entry<V>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the stored value, or `None` if it is missing or expired.
    /// Expired entries are removed as a side effect.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let now = self.clock.now_ms();
        let mut entries = self.lock_entries();

        let expired = entries.get(key)?.expires_at <= now;
        if expired {
            entries.remove(key);
            return None;
        }

        entries.get(key).map(|entry| entry.value.clone())
    }

    pub fn set(&self, key: K, value: V) {
        let expires_at = self.clock.now_ms().saturating_add(self.expiry_ms);
        self.lock_entries().insert(key, Entry { value, expires_at });
    }

    pub fn delete<Q>(&self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.lock_entries().remove(key);
    }

    /// Removes every expired entry and returns how many were dropped
    pub fn purge_expired_entries(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.lock_entries();

        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        let purged = before - entries.len();

        if purged > 0 {
            debug!("Purged {} expired cache entries", purged);
        }
        purged
    }

    /// Number of stored entries, expired ones included until they are read or purged
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, V> Default for TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_EXPIRY_MS)
    }
}
