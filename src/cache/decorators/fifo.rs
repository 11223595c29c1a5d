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

//! FIFO eviction decorator: insertion order, oldest out first

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// First-in-first-out eviction over a delegate
pub struct FifoCache {
    delegate: Box<dyn Cache>,
    queue: Mutex<VecDeque<CacheKey>>,
    size: usize,
}

impl FifoCache {
    /// Wrap `delegate` with a FIFO bound of `size` entries
    pub fn new(delegate: Box<dyn Cache>, size: usize) -> Self {
        Self {
            delegate,
            queue: Mutex::new(VecDeque::new()),
            size,
        }
    }
}

impl Cache for FifoCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.delegate.get(key)
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        let evicted = {
            let mut queue = self.queue.lock();
            if !queue.contains(&key) {
                queue.push_back(key.clone());
            }
            if queue.len() > self.size {
                queue.pop_front()
            } else {
                None
            }
        };
        if let Some(oldest) = evicted {
            self.delegate.remove(&oldest);
        }
        self.delegate.put(key, value);
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.queue.lock().retain(|k| k != key);
        self.delegate.remove(key)
    }

    fn clear(&self) {
        self.queue.lock().clear();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
