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

//! The two-tier cache layer: keys, the cache capability, eviction
//! decorators and per-session transactional staging
//!
//! Cached payloads are shared as `Arc<Value>`: result lists are immutable
//! once materialized, so sharing is safe, and the weak-reference decorators
//! key their lifetimes off the strong count.

use std::sync::Arc;

use crate::core::Value;

pub mod builder;
pub mod decorators;
pub mod key;
pub mod perpetual;
pub mod transactional;

pub use builder::{CacheBuilder, Eviction, DEFAULT_CACHE_SIZE};
pub use decorators::{
    BlockingCache, FifoCache, LoggingCache, LruCache, ScheduledCache, SerializedCache, SoftCache,
    SynchronizedCache, WeakCache,
};
pub use key::CacheKey;
pub use perpetual::PerpetualCache;
pub use transactional::{TransactionalCache, TransactionalCacheManager};

/// The cache capability every store and decorator implements
///
/// A stored `Value::Null` is a latch-release placeholder, not data; readers
/// treat it as a miss.
pub trait Cache: Send + Sync {
    /// Identifier of this cache (its namespace)
    fn id(&self) -> &str;

    /// Look up an entry
    fn get(&self, key: &CacheKey) -> Option<Arc<Value>>;

    /// Store an entry
    fn put(&self, key: CacheKey, value: Arc<Value>);

    /// Remove an entry, returning it when the store still held it
    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>>;

    /// Drop all entries
    fn clear(&self);

    /// Number of stored entries
    fn size(&self) -> usize;
}
