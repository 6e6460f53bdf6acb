//! Query embedding cache.
//!
//! Repeated questions skip the round trip to the embedding service. Entries
//! expire after a TTL; when full, the least recently used entry is evicted.
//! Keys are the question with surrounding whitespace removed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

pub const DEFAULT_CACHE_SIZE: usize = 256;
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

struct Slot {
    vector: Vec<f32>,
    stored: Instant,
    /// Value of the use counter at the last read or write.
    last_use: u64,
}

struct Slots {
    map: HashMap<String, Slot>,
    clock: u64,
    hits: u64,
    misses: u64,
}

/// Hit/miss counters, reported on the status endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

pub struct QueryCache {
    slots: Mutex<Slots>,
    capacity: usize,
    ttl: Duration,
}

impl QueryCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            slots: Mutex::new(Slots {
                map: HashMap::new(),
                clock: 0,
                hits: 0,
                misses: 0,
            }),
            capacity: capacity.max(1),
            ttl,
        }
    }

    pub fn get(&self, question: &str) -> Option<Vec<f32>> {
        let key = question.trim();
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        slots.clock += 1;

        let expired = match slots.map.get(key) {
            Some(slot) => slot.stored.elapsed() >= self.ttl,
            None => {
                slots.misses += 1;
                return None;
            }
        };
        if expired {
            slots.map.remove(key);
            slots.misses += 1;
            return None;
        }

        slots.hits += 1;
        let slot = slots.map.get_mut(key)?;
        slot.last_use = slots.clock;
        Some(slot.vector.clone())
    }

    pub fn put(&self, question: &str, vector: Vec<f32>) {
        let key = question.trim().to_string();
        let mut guard = self.slots.lock();
        let slots = &mut *guard;
        slots.clock += 1;
        let now = slots.clock;

        if !slots.map.contains_key(&key) && slots.map.len() >= self.capacity {
            let stalest = slots
                .map
                .iter()
                .min_by_key(|(_, slot)| slot.last_use)
                .map(|(k, _)| k.clone());
            if let Some(stalest) = stalest {
                slots.map.remove(&stalest);
            }
        }
        slots.map.insert(
            key,
            Slot {
                vector,
                stored: Instant::now(),
                last_use: now,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.slots.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let slots = self.slots.lock();
        CacheStats {
            entries: slots.map.len(),
            hits: slots.hits,
            misses: slots.misses,
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE, DEFAULT_CACHE_TTL)
    }
}
