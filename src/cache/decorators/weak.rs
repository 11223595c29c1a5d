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

//! Weak-reference eviction decorator
//!
//! Entries survive only while some caller still holds the value; once the
//! last strong reference drops, the entry is reclaimable and swept on the
//! next operation.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// Weak value storage over a delegate
pub struct WeakCache {
    delegate: Box<dyn Cache>,
    entries: Mutex<FxHashMap<CacheKey, Weak<Value>>>,
}

impl WeakCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        Self {
            delegate,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    fn sweep(&self) {
        let dead: Vec<CacheKey> = {
            let entries = self.entries.lock();
            entries
                .iter()
                .filter(|(_, weak)| weak.strong_count() == 0)
                .map(|(key, _)| key.clone())
                .collect()
        };
        for key in dead {
            self.entries.lock().remove(&key);
            self.delegate.remove(&key);
        }
    }
}

impl Cache for WeakCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.sweep();
        self.entries.lock().get(key).and_then(Weak::upgrade)
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.sweep();
        self.entries.lock().insert(key, Arc::downgrade(&value));
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let removed = self.entries.lock().remove(key);
        self.delegate.remove(key);
        removed.and_then(|weak| weak.upgrade())
    }

    fn clear(&self) {
        self.entries.lock().clear();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.sweep();
        self.entries.lock().len()
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
    fn test_entry_lives_while_held() {
        let cache = WeakCache::new(Box::new(PerpetualCache::new("ns")));
        let held = Arc::new(Value::Integer(1));
        cache.put(key(1), held.clone());
        assert!(cache.get(&key(1)).is_some());
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_entry_reclaimed_after_drop() {
        let cache = WeakCache::new(Box::new(PerpetualCache::new("ns")));
        cache.put(key(1), Arc::new(Value::Integer(1)));
        // nothing holds the value anymore
        assert!(cache.get(&key(1)).is_none());
        assert_eq!(cache.size(), 0);
    }
}
