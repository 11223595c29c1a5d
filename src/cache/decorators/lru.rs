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

//! LRU eviction decorator
//!
//! Bounded by access recency: `get` promotes a key, `put` past capacity
//! evicts the least recently used key and removes it from the delegate.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// Default number of retained entries
pub const DEFAULT_LRU_SIZE: usize = 1024;

struct LruState {
    ticks: FxHashMap<CacheKey, u64>,
    order: BTreeMap<u64, CacheKey>,
    counter: u64,
}

impl LruState {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(tick) = self.ticks.get(key).copied() {
            self.order.remove(&tick);
            self.insert(key.clone());
        }
    }

    fn insert(&mut self, key: CacheKey) {
        self.counter += 1;
        self.ticks.insert(key.clone(), self.counter);
        self.order.insert(self.counter, key);
    }

    fn forget(&mut self, key: &CacheKey) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    fn eldest(&self) -> Option<CacheKey> {
        self.order.values().next().cloned()
    }
}

/// Least-recently-used eviction over a delegate
pub struct LruCache {
    delegate: Box<dyn Cache>,
    state: Mutex<LruState>,
    size: usize,
}

impl LruCache {
    /// Wrap `delegate` with an LRU bound of `size` entries
    pub fn new(delegate: Box<dyn Cache>, size: usize) -> Self {
        Self {
            delegate,
            state: Mutex::new(LruState {
                ticks: FxHashMap::default(),
                order: BTreeMap::new(),
                counter: 0,
            }),
            size,
        }
    }
}

impl Cache for LruCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.state.lock().touch(key);
        self.delegate.get(key)
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.delegate.put(key.clone(), value);
        let evicted = {
            let mut state = self.state.lock();
            state.forget(&key);
            state.insert(key);
            if state.ticks.len() > self.size {
                let eldest = state.eldest();
                if let Some(eldest) = &eldest {
                    state.forget(eldest);
                }
                eldest
            } else {
                None
            }
        };
        if let Some(eldest) = evicted {
            self.delegate.remove(&eldest);
        }
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.state.lock().forget(key);
        self.delegate.remove(key)
    }

    fn clear(&self) {
        let mut state = self.state.lock();
        state.ticks.clear();
        state.order.clear();
        drop(state);
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
