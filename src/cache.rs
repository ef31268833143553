//! Memoization of batch probability computations
//!
//! Batch queries walk every requested date year by year, so the engines keep
//! their results in a shared, bounded cache. Entries expire after a sliding
//! period without access; when the cache is full, expired entries go first,
//! then the lowest priority and least recently used ones.
//!
//! Results are pure functions of their key, so two threads missing on the
//! same key at once both compute it and the second write simply wins.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ahash::RandomState;
use chrono::NaiveDate;
use dashmap::DashMap;
use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::decrement::{MultipleDecrementProbabilities, ProbabilityKind};
use crate::error::Result;
use crate::individual::IndividualKey;
use crate::schedule::OrderedDates;

/// Order in which entries are evicted under size pressure (lowest first)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntryPriority {
    Low,
    Normal,
    High,
}

/// Lifetime settings attached to each stored entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryOptions {
    /// Entry expires after this long without being read
    pub sliding_expiration: Duration,
    pub priority: EntryPriority,
}

impl Default for EntryOptions {
    fn default() -> Self {
        CacheConfig::default().entry_options()
    }
}

/// Sizing and eviction settings of a [`MemoryCache`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub capacity: usize,

    /// Default sliding expiration of entries
    pub sliding_expiration: Duration,

    /// Share of the capacity removed when the cache overflows
    pub compaction_percentage: f64,

    /// Default eviction priority of entries
    pub priority: EntryPriority,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 5_000,
            sliding_expiration: Duration::from_secs(300),
            compaction_percentage: 0.05,
            priority: EntryPriority::Low,
        }
    }
}

impl CacheConfig {
    /// Sizing for improvement factors: one entry per individual and year pair
    pub fn improvement() -> Self {
        Self {
            capacity: 14_000,
            ..Default::default()
        }
    }

    pub fn entry_options(&self) -> EntryOptions {
        EntryOptions {
            sliding_expiration: self.sliding_expiration,
            priority: self.priority,
        }
    }
}

/// Keyed store with per-entry time to live and priority.
///
/// Implementations must be safe to read and write from several threads.
pub trait Cache<K, V: Clone>: Send + Sync {
    fn try_get(&self, key: &K) -> Option<V>;

    fn set(&self, key: K, value: V, options: EntryOptions);

    /// Cached value for `key`, computing and storing it on a miss.
    /// Errors from `compute` are returned and nothing is stored.
    fn get_or_compute(&self, key: K, options: EntryOptions, compute: &dyn Fn() -> Result<V>) -> Result<V> {
        if let Some(value) = self.try_get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.set(key, value.clone(), options);
        Ok(value)
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    last_access: Instant,
    options: EntryOptions,
}

impl<V> Entry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_access) > self.options.sliding_expiration
    }
}

/// In-process [`Cache`] over a sharded concurrent map
pub struct MemoryCache<K, V> {
    entries: DashMap<K, Entry<V>, RandomState>,
    capacity: usize,
    compaction_percentage: f64,

    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K, V> MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: DashMap::with_hasher(RandomState::new()),
            capacity: config.capacity.max(1),
            compaction_percentage: config.compaction_percentage.clamp(0.0, 1.0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the statistics
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    /// Remove expired entries, then enough of the remaining ones to get back
    /// under capacity with some headroom.
    fn compact(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        if self.entries.len() <= self.capacity {
            return;
        }

        let excess = self.entries.len() - self.capacity;
        let headroom = (self.capacity as f64 * self.compaction_percentage).ceil() as usize;
        let count = excess.max(headroom);

        // Keys are collected first: removing while iterating would deadlock on the shard
        let mut candidates: Vec<(EntryPriority, Instant, K)> = self
            .entries
            .iter()
            .map(|entry| (entry.options.priority, entry.last_access, entry.key().clone()))
            .collect();
        candidates.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, _, key) in candidates.into_iter().take(count) {
            self.entries.remove(&key);
        }
        debug!("cache compacted to {} entries", self.entries.len());
    }
}

impl<K, V> Cache<K, V> for MemoryCache<K, V>
where
    K: Eq + Hash + Clone + Send + Sync,
    V: Clone + Send + Sync,
{
    fn try_get(&self, key: &K) -> Option<V> {
        let now = Instant::now();
        if let Some(mut entry) = self.entries.get_mut(key) {
            if !entry.is_expired(now) {
                entry.last_access = now;
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
        }
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn set(&self, key: K, value: V, options: EntryOptions) {
        self.entries.insert(
            key,
            Entry {
                value,
                last_access: Instant::now(),
                options,
            },
        );
        if self.entries.len() > self.capacity {
            self.compact();
        }
    }
}

static NEXT_SOURCE: AtomicU64 = AtomicU64::new(1);

/// Fresh engine identity for cache keys.
///
/// Table and strategy names are host-chosen labels and may repeat, so the
/// description is suffixed with a number no other engine in the process draws.
pub(crate) fn source_identity(description: &str) -> Arc<str> {
    let id = NEXT_SOURCE.fetch_add(1, Ordering::Relaxed);
    format!("{description}#{id}").into()
}

/// Identity of a batch computation.
///
/// Every engine draws its own `source`, so keys built by different engines
/// never collide on a shared cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProbabilityKey {
    /// Engine description and its process-unique number
    pub source: Arc<str>,
    pub individual: IndividualKey,
    pub calculation_date: NaiveDate,
    pub dates: OrderedDates,
    pub kind: ProbabilityKind,

    /// Bits of the male proportion for blended queries
    pub blend: Option<u64>,
}

/// Values stored by the engines
#[derive(Debug, Clone, PartialEq)]
pub enum CachedProbabilities {
    Series(Arc<[f64]>),
    Multiple(Arc<MultipleDecrementProbabilities>),
}

/// Cache shared by the engines for their batch results
pub type ProbabilityCache = Arc<dyn Cache<ProbabilityKey, CachedProbabilities>>;

/// A [`MemoryCache`] for probability batches, ready to hand to the engines
pub fn probability_cache(config: &CacheConfig) -> ProbabilityCache {
    Arc::new(MemoryCache::<ProbabilityKey, CachedProbabilities>::new(config))
}

/// Cached probability series for `key`, computed on a miss
pub(crate) fn cached_series(
    cache: &dyn Cache<ProbabilityKey, CachedProbabilities>,
    key: ProbabilityKey,
    options: EntryOptions,
    compute: impl FnOnce() -> Result<Vec<f64>>,
) -> Result<Arc<[f64]>> {
    if let Some(CachedProbabilities::Series(values)) = cache.try_get(&key) {
        trace!("{:?} probabilities for {} dates served from cache", key.kind, key.dates.len());
        return Ok(values);
    }
    debug!(
        "computing {:?} probabilities for {} dates from {}",
        key.kind,
        key.dates.len(),
        key.calculation_date
    );
    let values: Arc<[f64]> = compute()?.into();
    cache.set(key, CachedProbabilities::Series(values.clone()), options);
    Ok(values)
}

/// Cached multiple decrement arrays for `key`, computed on a miss
pub(crate) fn cached_multiple(
    cache: &dyn Cache<ProbabilityKey, CachedProbabilities>,
    key: ProbabilityKey,
    options: EntryOptions,
    compute: impl FnOnce() -> Result<MultipleDecrementProbabilities>,
) -> Result<Arc<MultipleDecrementProbabilities>> {
    if let Some(CachedProbabilities::Multiple(values)) = cache.try_get(&key) {
        trace!("dependent probabilities for {} dates served from cache", key.dates.len());
        return Ok(values);
    }
    debug!(
        "computing dependent probabilities for {} dates from {}",
        key.dates.len(),
        key.calculation_date
    );
    let values = Arc::new(compute()?);
    cache.set(key, CachedProbabilities::Multiple(values.clone()), options);
    Ok(values)
}
