// Copyright 2025 Sqlbind Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Per-key blocking decorator
//!
//! A lookup takes the key's latch. A hit releases it immediately; a miss
//! keeps it held so at most one caller rebuilds the entry. The latch is
//! released by the follow-up put, or by `remove` (which the transactional
//! staging uses to unlock missed keys on commit/rollback).

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

#[derive(Default)]
struct KeyLatch {
    held: Mutex<bool>,
    released: Condvar,
}

/// At-most-one concurrent rebuild per key
pub struct BlockingCache {
    delegate: Box<dyn Cache>,
    latches: Mutex<FxHashMap<CacheKey, Arc<KeyLatch>>>,
}

impl BlockingCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        Self {
            delegate,
            latches: Mutex::new(FxHashMap::default()),
        }
    }

    fn acquire(&self, key: &CacheKey) {
        let latch = self
            .latches
            .lock()
            .entry(key.clone())
            .or_default()
            .clone();
        let mut held = latch.held.lock();
        while *held {
            latch.released.wait(&mut held);
        }
        *held = true;
    }

    fn release(&self, key: &CacheKey) {
        let latch = self.latches.lock().get(key).cloned();
        if let Some(latch) = latch {
            let mut held = latch.held.lock();
            *held = false;
            latch.released.notify_one();
        }
    }
}

impl Cache for BlockingCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.acquire(key);
        let value = self.delegate.get(key);
        if value.is_some() {
            self.release(key);
        }
        value
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.delegate.put(key.clone(), value);
        self.release(&key);
    }

    /// Releases the key's latch without touching the delegate
    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.release(key);
        None
    }

    fn clear(&self) {
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PerpetualCache;
    use std::thread;
    use std::time::Duration;

    fn key(n: i64) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(Value::Integer(n));
        key
    }

    #[test]
    fn test_hit_does_not_hold_latch() {
        let cache = BlockingCache::new(Box::new(PerpetualCache::new("ns")));
        cache.put(key(1), Arc::new(Value::Integer(1)));
        assert!(cache.get(&key(1)).is_some());
        // a second lookup would deadlock if the latch were still held
        assert!(cache.get(&key(1)).is_some());
    }

    #[test]
    fn test_miss_blocks_second_reader_until_put() {
        let cache = Arc::new(BlockingCache::new(Box::new(PerpetualCache::new("ns"))));
        assert!(cache.get(&key(1)).is_none()); // latch now held

        let reader = {
            let cache = cache.clone();
            thread::spawn(move || cache.get(&key(1)))
        };
        thread::sleep(Duration::from_millis(50));
        assert!(!reader.is_finished());

        cache.put(key(1), Arc::new(Value::Integer(1)));
        let seen = reader.join().unwrap();
        assert_eq!(seen.unwrap().as_ref(), &Value::Integer(1));
    }

    #[test]
    fn test_remove_releases_latch() {
        let cache = Arc::new(BlockingCache::new(Box::new(PerpetualCache::new("ns"))));
        assert!(cache.get(&key(1)).is_none()); // latch held
        cache.remove(&key(1)); // rollback path
        assert!(cache.get(&key(1)).is_none()); // re-acquirable, still a miss
        cache.put(key(1), Arc::new(Value::Integer(1)));
        assert!(cache.get(&key(1)).is_some());
    }
}
