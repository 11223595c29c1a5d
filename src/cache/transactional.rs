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

//! Transactional staging over shared second-level caches
//!
//! A session never writes a shared cache directly. Each touched cache gets a
//! per-session [`TransactionalCache`] that stages puts until commit, records
//! missed keys so Blocking latches can be released, and turns an explicit
//! clear into a delegate clear-on-commit. Rollback discards the staging and
//! unlocks the missed keys.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::Value;

use super::key::CacheKey;
use super::Cache;

/// Per-session staging buffer over one shared cache
pub struct TransactionalCache {
    delegate: Arc<dyn Cache>,
    clear_on_commit: bool,
    entries_to_add_on_commit: FxHashMap<CacheKey, Arc<Value>>,
    entries_missed_in_cache: FxHashSet<CacheKey>,
}

impl TransactionalCache {
    pub fn new(delegate: Arc<dyn Cache>) -> Self {
        Self {
            delegate,
            clear_on_commit: false,
            entries_to_add_on_commit: FxHashMap::default(),
            entries_missed_in_cache: FxHashSet::default(),
        }
    }

    /// Read through to the delegate, recording misses
    ///
    /// After an explicit clear, reads return nothing regardless of the
    /// delegate's contents.
    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<Value>> {
        let value = self.delegate.get(key);
        if value.is_none() {
            self.entries_missed_in_cache.insert(key.clone());
        }
        if self.clear_on_commit {
            None
        } else {
            value
        }
    }

    /// Stage a put; the delegate sees it only on commit
    pub fn put(&mut self, key: CacheKey, value: Arc<Value>) {
        self.entries_to_add_on_commit.insert(key, value);
    }

    /// Drop staged puts and clear the delegate on commit
    pub fn clear(&mut self) {
        self.clear_on_commit = true;
        self.entries_to_add_on_commit.clear();
    }

    /// Promote staged entries into the delegate
    pub fn commit(&mut self) {
        if self.clear_on_commit {
            self.delegate.clear();
        }
        self.flush_pending_entries();
        self.reset();
    }

    /// Discard staged entries and unlock missed keys
    pub fn rollback(&mut self) {
        self.unlock_missed_entries();
        self.reset();
    }

    fn reset(&mut self) {
        self.clear_on_commit = false;
        self.entries_to_add_on_commit.clear();
        self.entries_missed_in_cache.clear();
    }

    fn flush_pending_entries(&mut self) {
        for (key, value) in self.entries_to_add_on_commit.drain() {
            self.entries_missed_in_cache.remove(&key);
            self.delegate.put(key, value);
        }
        // put-null for remaining misses releases any Blocking latch
        for key in self.entries_missed_in_cache.drain() {
            self.delegate.put(key, Arc::new(Value::Null));
        }
    }

    fn unlock_missed_entries(&mut self) {
        for key in self.entries_missed_in_cache.drain() {
            self.delegate.remove(&key);
        }
    }
}

/// All transactional caches of one session, keyed by cache id
#[derive(Default)]
pub struct TransactionalCacheManager {
    caches: FxHashMap<String, TransactionalCache>,
}

impl TransactionalCacheManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, cache: &Arc<dyn Cache>) -> &mut TransactionalCache {
        self.caches
            .entry(cache.id().to_string())
            .or_insert_with(|| TransactionalCache::new(cache.clone()))
    }

    /// Read through the session view of `cache`
    pub fn get(&mut self, cache: &Arc<dyn Cache>, key: &CacheKey) -> Option<Arc<Value>> {
        self.entry(cache).get(key)
    }

    /// Stage a put into the session view of `cache`
    pub fn put(&mut self, cache: &Arc<dyn Cache>, key: CacheKey, value: Arc<Value>) {
        self.entry(cache).put(key, value);
    }

    /// Stage a clear of `cache`
    pub fn clear(&mut self, cache: &Arc<dyn Cache>) {
        self.entry(cache).clear();
    }

    /// Commit every staged view
    pub fn commit(&mut self) {
        for cache in self.caches.values_mut() {
            cache.commit();
        }
    }

    /// Roll back every staged view
    pub fn rollback(&mut self) {
        for cache in self.caches.values_mut() {
            cache.rollback();
        }
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

    fn shared() -> Arc<dyn Cache> {
        Arc::new(PerpetualCache::new("ns"))
    }

    #[test]
    fn test_put_visible_only_after_commit() {
        let delegate = shared();
        let mut tx = TransactionalCache::new(delegate.clone());

        tx.put(key(1), Arc::new(Value::Integer(1)));
        assert!(delegate.get(&key(1)).is_none());

        tx.commit();
        assert_eq!(delegate.get(&key(1)).unwrap().as_ref(), &Value::Integer(1));
    }

    #[test]
    fn test_rollback_discards_staged_puts() {
        let delegate = shared();
        let mut tx = TransactionalCache::new(delegate.clone());

        tx.put(key(1), Arc::new(Value::Integer(1)));
        tx.rollback();
        assert!(delegate.get(&key(1)).is_none());
    }

    #[test]
    fn test_clear_hides_delegate_reads() {
        let delegate = shared();
        delegate.put(key(1), Arc::new(Value::Integer(1)));
        let mut tx = TransactionalCache::new(delegate.clone());

        assert!(tx.get(&key(1)).is_some());
        tx.clear();
        assert!(tx.get(&key(1)).is_none());

        tx.commit();
        // clear-on-commit wiped the delegate
        assert!(delegate.get(&key(1)).is_none());
    }

    #[test]
    fn test_missed_keys_put_null_on_commit() {
        let delegate = shared();
        let mut tx = TransactionalCache::new(delegate.clone());

        assert!(tx.get(&key(9)).is_none());
        tx.commit();
        // the null placeholder releases a Blocking latch without caching data
        assert_eq!(delegate.get(&key(9)).unwrap().as_ref(), &Value::Null);
    }

    #[test]
    fn test_missed_keys_removed_on_rollback() {
        let delegate = shared();
        delegate.put(key(2), Arc::new(Value::Integer(2)));
        let mut tx = TransactionalCache::new(delegate.clone());

        assert!(tx.get(&key(9)).is_none());
        tx.rollback();
        // the missed key was removed; unrelated entries survive
        assert!(delegate.get(&key(9)).is_none());
        assert!(delegate.get(&key(2)).is_some());
    }

    #[test]
    fn test_manager_spans_caches() {
        let a: Arc<dyn Cache> = Arc::new(PerpetualCache::new("a"));
        let b: Arc<dyn Cache> = Arc::new(PerpetualCache::new("b"));
        let mut manager = TransactionalCacheManager::new();

        manager.put(&a, key(1), Arc::new(Value::Integer(1)));
        manager.put(&b, key(2), Arc::new(Value::Integer(2)));
        manager.commit();

        assert!(a.get(&key(1)).is_some());
        assert!(b.get(&key(2)).is_some());
    }
}
