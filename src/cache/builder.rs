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

//! Second-level cache stack assembly
//!
//! Builds the decorator stack declared by a `<cache>` element: the perpetual
//! base, the eviction decorator, interval flushing, copy-on-read for
//! read-write caches, logging, the coarse lock, and per-key blocking
//! outermost.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{Error, Result};

use super::decorators::{
    BlockingCache, FifoCache, LoggingCache, LruCache, ScheduledCache, SerializedCache, SoftCache,
    SynchronizedCache, WeakCache, DEFAULT_HARD_LINKS,
};
use super::perpetual::PerpetualCache;
use super::Cache;

/// Default bound of the eviction decorator
pub const DEFAULT_CACHE_SIZE: usize = 1024;

/// Eviction policy of a namespace cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eviction {
    #[default]
    Lru,
    Fifo,
    Soft,
    Weak,
}

impl FromStr for Eviction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "LRU" => Ok(Eviction::Lru),
            "FIFO" => Ok(Eviction::Fifo),
            "SOFT" => Ok(Eviction::Soft),
            "WEAK" => Ok(Eviction::Weak),
            other => Err(Error::configuration(format!(
                "unknown cache eviction '{}'",
                other
            ))),
        }
    }
}

/// Builder for one namespace's cache stack
pub struct CacheBuilder {
    namespace: String,
    eviction: Eviction,
    size: usize,
    flush_interval: Option<Duration>,
    read_write: bool,
    blocking: bool,
}

impl CacheBuilder {
    /// Start building the cache of `namespace`
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            eviction: Eviction::Lru,
            size: DEFAULT_CACHE_SIZE,
            flush_interval: None,
            read_write: true,
            blocking: false,
        }
    }

    pub fn eviction(mut self, eviction: Eviction) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    /// `readOnly=true` disables the copy-on-read decorator
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_write = !read_only;
        self
    }

    pub fn blocking(mut self, blocking: bool) -> Self {
        self.blocking = blocking;
        self
    }

    /// Assemble the stack
    pub fn build(self) -> Arc<dyn Cache> {
        let mut cache: Box<dyn Cache> = Box::new(PerpetualCache::new(self.namespace));
        cache = match self.eviction {
            Eviction::Lru => Box::new(LruCache::new(cache, self.size)),
            Eviction::Fifo => Box::new(FifoCache::new(cache, self.size)),
            Eviction::Soft => Box::new(SoftCache::new(cache, DEFAULT_HARD_LINKS)),
            Eviction::Weak => Box::new(WeakCache::new(cache)),
        };
        if let Some(interval) = self.flush_interval {
            cache = Box::new(ScheduledCache::new(cache, interval));
        }
        if self.read_write {
            cache = Box::new(SerializedCache::new(cache));
        }
        cache = Box::new(LoggingCache::new(cache));
        cache = Box::new(SynchronizedCache::new(cache));
        if self.blocking {
            cache = Box::new(BlockingCache::new(cache));
        }
        Arc::from(cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheKey;
    use crate::core::Value;

    fn key(n: i64) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(Value::Integer(n));
        key
    }

    #[test]
    fn test_default_stack_works() {
        let cache = CacheBuilder::new("blog.PostMapper").build();
        assert_eq!(cache.id(), "blog.PostMapper");
        cache.put(key(1), Arc::new(Value::Integer(1)));
        assert_eq!(cache.get(&key(1)).unwrap().as_ref(), &Value::Integer(1));
    }

    #[test]
    fn test_read_write_stack_copies() {
        let cache = CacheBuilder::new("ns").read_only(false).build();
        let original = Arc::new(Value::array(vec![Value::Integer(1)]));
        cache.put(key(1), original.clone());
        let read = cache.get(&key(1)).unwrap();
        assert_eq!(read, original);
        assert!(!Arc::ptr_eq(&read, &original));
    }

    #[test]
    fn test_read_only_stack_shares() {
        let cache = CacheBuilder::new("ns").read_only(true).build();
        let original = Arc::new(Value::array(vec![Value::Integer(1)]));
        cache.put(key(1), original.clone());
        let read = cache.get(&key(1)).unwrap();
        assert!(Arc::ptr_eq(&read, &original));
    }

    #[test]
    fn test_eviction_parse() {
        assert_eq!("lru".parse::<Eviction>().unwrap(), Eviction::Lru);
        assert_eq!("FIFO".parse::<Eviction>().unwrap(), Eviction::Fifo);
        assert!("CLOCK".parse::<Eviction>().is_err());
    }

    #[test]
    fn test_fifo_stack_bounds_size() {
        let cache = CacheBuilder::new("ns")
            .eviction(Eviction::Fifo)
            .size(2)
            .read_only(true)
            .build();
        for n in 0..4 {
            cache.put(key(n), Arc::new(Value::Integer(n)));
        }
        assert!(cache.get(&key(0)).is_none());
        assert!(cache.get(&key(3)).is_some());
    }
}
