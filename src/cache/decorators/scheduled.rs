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

//! Interval-flush decorator: clears the delegate when the flush interval
//! has elapsed, checked on every operation

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// Clears the delegate on a fixed interval
pub struct ScheduledCache {
    delegate: Box<dyn Cache>,
    interval: Duration,
    last_clear: Mutex<Instant>,
}

impl ScheduledCache {
    pub fn new(delegate: Box<dyn Cache>, interval: Duration) -> Self {
        Self {
            delegate,
            interval,
            last_clear: Mutex::new(Instant::now()),
        }
    }

    /// Clear the delegate if the interval has elapsed; true when cleared
    fn clear_when_stale(&self) -> bool {
        let mut last_clear = self.last_clear.lock();
        if last_clear.elapsed() >= self.interval {
            *last_clear = Instant::now();
            drop(last_clear);
            self.delegate.clear();
            true
        } else {
            false
        }
    }
}

impl Cache for ScheduledCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        if self.clear_when_stale() {
            return None;
        }
        self.delegate.get(key)
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.clear_when_stale();
        self.delegate.put(key, value);
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.clear_when_stale();
        self.delegate.remove(key)
    }

    fn clear(&self) {
        *self.last_clear.lock() = Instant::now();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.clear_when_stale();
        self.delegate.size()
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
    fn test_entries_survive_within_interval() {
        let cache = ScheduledCache::new(
            Box::new(PerpetualCache::new("ns")),
            Duration::from_secs(3600),
        );
        cache.put(key(1), Arc::new(Value::Integer(1)));
        assert!(cache.get(&key(1)).is_some());
    }

    #[test]
    fn test_entries_flushed_after_interval() {
        let cache =
            ScheduledCache::new(Box::new(PerpetualCache::new("ns")), Duration::from_millis(0));
        cache.put(key(1), Arc::new(Value::Integer(1)));
        assert!(cache.get(&key(1)).is_none());
    }
}
