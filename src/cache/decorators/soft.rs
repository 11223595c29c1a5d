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

//! Soft-reference eviction decorator
//!
//! Keys are strong, values are weak handles; a strong FIFO ring pins the N
//! most recently touched values so they cannot be reclaimed prematurely.
//! Every operation sweeps reclaimed entries and propagates their removal to
//! the delegate.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// Default number of values pinned by strong references
pub const DEFAULT_HARD_LINKS: usize = 256;

struct SoftState {
    entries: FxHashMap<CacheKey, Weak<Value>>,
    hard_links: VecDeque<Arc<Value>>,
}

/// Reclaimable value storage with a bounded strong-reference ring
pub struct SoftCache {
    delegate: Box<dyn Cache>,
    state: Mutex<SoftState>,
    num_hard_links: usize,
}

impl SoftCache {
    /// Wrap `delegate`, pinning the `num_hard_links` most recent values
    pub fn new(delegate: Box<dyn Cache>, num_hard_links: usize) -> Self {
        Self {
            delegate,
            state: Mutex::new(SoftState {
                entries: FxHashMap::default(),
                hard_links: VecDeque::new(),
            }),
            num_hard_links,
        }
    }

    /// Drop reclaimed entries, notifying the delegate of each removal
    fn sweep(&self) {
        let dead: Vec<CacheKey> = {
            let state = self.state.lock();
            state
                .entries
                .iter()
                .filter(|(_, weak)| weak.strong_count() == 0)
                .map(|(key, _)| key.clone())
                .collect()
        };
        for key in dead {
            self.state.lock().entries.remove(&key);
            self.delegate.remove(&key);
        }
    }

    fn pin(&self, value: Arc<Value>) {
        let mut state = self.state.lock();
        state.hard_links.push_back(value);
        while state.hard_links.len() > self.num_hard_links {
            state.hard_links.pop_front();
        }
    }
}

impl Cache for SoftCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.sweep();
        let upgraded = self.state.lock().entries.get(key).and_then(Weak::upgrade);
        match upgraded {
            Some(value) => {
                self.pin(value.clone());
                Some(value)
            }
            None => {
                self.state.lock().entries.remove(key);
                self.delegate.remove(key);
                None
            }
        }
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.sweep();
        self.state
            .lock()
            .entries
            .insert(key, Arc::downgrade(&value));
        self.pin(value);
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.sweep();
        let removed = self.state.lock().entries.remove(key);
        self.delegate.remove(key);
        removed.and_then(|weak| weak.upgrade())
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.hard_links.clear();
        drop(state);
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.sweep();
        self.state.lock().entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PerpetualCache;

    fn key(n: i64) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(Value::Integer(n));
        key
    }

    #[test]
    fn test_recent_values_pinned() {
        let cache = SoftCache::new(Box::new(PerpetualCache::new("ns")), 4);
        cache.put(key(1), Arc::new(Value::Integer(1)));
        // no outside strong reference, but the ring pins it
        assert!(cache.get(&key(1)).is_some());
    }

    #[test]
    fn test_unpinned_values_reclaimed() {
        let cache = SoftCache::new(Box::new(PerpetualCache::new("ns")), 1);
        cache.put(key(1), Arc::new(Value::Integer(1)));
        // pushes key(1)'s value out of the one-slot ring
        cache.put(key(2), Arc::new(Value::Integer(2)));
        assert!(cache.get(&key(1)).is_none());
        assert!(cache.get(&key(2)).is_some());
    }

    #[test]
    fn test_externally_held_values_survive() {
        let cache = SoftCache::new(Box::new(PerpetualCache::new("ns")), 1);
        let held = Arc::new(Value::Integer(1));
        cache.put(key(1), held.clone());
        cache.put(key(2), Arc::new(Value::Integer(2)));
        // the caller still holds a strong reference
        assert!(cache.get(&key(1)).is_some());
    }
}
