//! Bounded cache of per-destination client configurations.
//!
//! Building a [`ClientConfiguration`] can be expensive (transport setup, TLS
//! configuration, interface registry), so a producer keeps one per
//! destination address and shares it between concurrent calls instead of
//! re-pointing a single client at a new address for every call.
//!
//! ## Invariants
//!
//! - At most one configuration per address is ever exposed: lookup, creation,
//!   insertion and eviction all happen inside one critical section.
//! - The cache never holds more than `capacity` entries; the least recently
//!   used entry is evicted first.
//! - Entries may disappear at any time through [`ClientConfigCache::reclaim`];
//!   the next lookup is then an ordinary miss.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{Address, BridgeError, ClientConfiguration, ConfigurationFactory};

/// Usage counters since the last [`ClientConfigCache::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStatistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub reclaimed: u64,
}

struct Entry {
    config: Arc<dyn ClientConfiguration>,
    last_used: u64,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Address, Entry>,
    /// Monotonic use counter; the entry with the smallest `last_used` is the
    /// least recently used.
    clock: u64,
    stats: CacheStatistics,
}

/// Thread-safe LRU cache of [`ClientConfiguration`]s keyed by [`Address`].
pub struct ClientConfigCache {
    factory: Arc<dyn ConfigurationFactory>,
    capacity: usize,
    state: Mutex<CacheState>,
}

impl ClientConfigCache {
    /// Creates an empty cache. A `capacity` of 0 is treated as 1.
    pub fn new(factory: Arc<dyn ConfigurationFactory>, capacity: usize) -> Self {
        Self {
            factory,
            capacity: capacity.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    /// Returns the configuration for `address`, creating it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates the factory's error; nothing is cached in that case.
    pub fn get(&self, address: &Address) -> Result<Arc<dyn ClientConfiguration>, BridgeError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.clock += 1;
        let now = state.clock;

        if let Some(entry) = state.entries.get_mut(address) {
            entry.last_used = now;
            state.stats.hits += 1;
            trace!(%address, "Retrieved client configuration from cache");
            return Ok(Arc::clone(&entry.config));
        }

        state.stats.misses += 1;
        let config = self.factory.create(address)?;
        state.entries.insert(
            address.clone(),
            Entry {
                config: Arc::clone(&config),
                last_used: now,
            },
        );
        trace!(%address, "Created client configuration and added it to cache");

        while state.entries.len() > self.capacity {
            let Some(lru) = state
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(key, _)| key.clone())
            else {
                break;
            };
            state.entries.remove(&lru);
            state.stats.evictions += 1;
            debug!(address = %lru, "Evicted least recently used client configuration");
        }

        Ok(config)
    }

    /// Drops the entry for `address`, as memory pressure would.
    ///
    /// Returns `true` if an entry was present.
    pub fn reclaim(&self, address: &Address) -> bool {
        let mut state = self.state.lock();
        let removed = state.entries.remove(address).is_some();
        if removed {
            state.stats.reclaimed += 1;
            debug!(%address, "Reclaimed client configuration");
        }
        removed
    }

    /// Drops every entry, as memory pressure would.
    pub fn reclaim_all(&self) {
        let mut state = self.state.lock();
        let count = state.entries.len() as u64;
        state.entries.clear();
        state.stats.reclaimed += count;
        debug!(count, "Reclaimed all client configurations");
    }

    /// Resets the usage statistics.
    pub fn start(&self) {
        self.state.lock().stats = CacheStatistics::default();
    }

    /// Clears all entries, releasing the configurations held by the cache.
    ///
    /// Configurations still held by in-flight calls stay alive until those
    /// calls finish.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        debug!(count = state.entries.len(), "Clearing client configuration cache");
        state.entries.clear();
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.state.lock().stats
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.state.lock().entries.contains_key(address)
    }
}

impl std::fmt::Debug for ClientConfigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfigCache")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{HttpResponse, InvocationRequest, ResourceRegistry};

    #[derive(Debug)]
    struct StubConfiguration {
        address: Address,
        registry: ResourceRegistry,
    }

    #[async_trait]
    impl ClientConfiguration for StubConfiguration {
        fn address(&self) -> &Address {
            &self.address
        }

        fn registry(&self) -> &ResourceRegistry {
            &self.registry
        }

        async fn execute(&self, _request: InvocationRequest) -> Result<HttpResponse, BridgeError> {
            Ok(HttpResponse::new(200))
        }
    }

    /// Counts constructions and refuses addresses containing `"bad"`.
    #[derive(Default)]
    struct CountingFactory {
        created: AtomicUsize,
    }

    impl CountingFactory {
        fn created(&self) -> usize {
            self.created.load(Ordering::SeqCst)
        }
    }

    impl ConfigurationFactory for CountingFactory {
        fn create(&self, address: &Address) -> Result<Arc<dyn ClientConfiguration>, BridgeError> {
            if address.as_str().contains("bad") {
                return Err(BridgeError::Configuration {
                    address: address.clone(),
                    message: "refused".into(),
                });
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubConfiguration {
                address: address.clone(),
                registry: ResourceRegistry::default(),
            }))
        }
    }

    fn addr(s: &str) -> Address {
        Address::new(s).unwrap()
    }

    fn cache(capacity: usize) -> (Arc<CountingFactory>, ClientConfigCache) {
        let factory = Arc::new(CountingFactory::default());
        let cache = ClientConfigCache::new(factory.clone(), capacity);
        (factory, cache)
    }

    #[test]
    fn first_get_constructs_once_and_later_gets_share_the_instance() {
        let (factory, cache) = cache(4);
        let a = addr("http://a");

        let first = cache.get(&a).unwrap();
        let second = cache.get(&a).unwrap();

        assert_eq!(factory.created(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.address(), &a);
        assert_eq!(
            cache.statistics(),
            CacheStatistics {
                hits: 1,
                misses: 1,
                ..CacheStatistics::default()
            }
        );
    }

    #[test]
    fn inserting_beyond_capacity_evicts_least_recently_used() {
        let (factory, cache) = cache(2);
        let (a, b, c) = (addr("http://a"), addr("http://b"), addr("http://c"));

        cache.get(&a).unwrap();
        cache.get(&b).unwrap();
        // Touch `a` so that `b` becomes the least recently used entry.
        cache.get(&a).unwrap();
        cache.get(&c).unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&a));
        assert!(!cache.contains(&b));
        assert!(cache.contains(&c));
        assert_eq!(cache.statistics().evictions, 1);
        assert_eq!(factory.created(), 3);
    }

    #[test]
    fn never_exceeds_capacity() {
        let (_, cache) = cache(3);
        for i in 0..20 {
            cache.get(&addr(&format!("http://host-{i}"))).unwrap();
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.statistics().evictions, 17);
    }

    #[test]
    fn reclaimed_entries_are_rebuilt_on_next_access() {
        let (factory, cache) = cache(4);
        let a = addr("http://a");

        let before = cache.get(&a).unwrap();
        assert!(cache.reclaim(&a));
        assert!(!cache.reclaim(&a));

        let after = cache.get(&a).unwrap();
        assert_eq!(factory.created(), 2);
        assert!(!Arc::ptr_eq(&before, &after));

        cache.reclaim_all();
        assert!(cache.is_empty());
        cache.get(&a).unwrap();
        assert_eq!(factory.created(), 3);
        assert_eq!(cache.statistics().reclaimed, 2);
    }

    #[test]
    fn construction_failure_propagates_and_caches_nothing() {
        let (factory, cache) = cache(4);
        let bad = addr("http://bad");

        let err = cache.get(&bad).unwrap_err();
        assert!(matches!(err, BridgeError::Configuration { .. }));
        assert!(!cache.contains(&bad));
        assert_eq!(factory.created(), 0);
    }

    #[test]
    fn start_resets_statistics_and_stop_clears_entries() {
        let (_, cache) = cache(4);
        cache.get(&addr("http://a")).unwrap();
        cache.get(&addr("http://a")).unwrap();

        cache.start();
        assert_eq!(cache.statistics(), CacheStatistics::default());
        assert_eq!(cache.len(), 1);

        cache.stop();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_is_coerced_to_one() {
        let (_, cache) = cache(0);
        assert_eq!(cache.capacity(), 1);
        cache.get(&addr("http://a")).unwrap();
        cache.get(&addr("http://b")).unwrap();
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_callers_share_one_configuration_per_address() {
        let (factory, cache) = cache(8);
        let a = addr("http://shared");

        let configs: Vec<Arc<dyn ClientConfiguration>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|_| scope.spawn(|| cache.get(&a).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(factory.created(), 1);
        assert!(configs.iter().all(|c| Arc::ptr_eq(c, &configs[0])));
    }
}
