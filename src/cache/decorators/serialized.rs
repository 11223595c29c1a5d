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

//! Copy-on-read decorator for read-write caches
//!
//! Stores a private copy on put and hands out a fresh copy on every get, so
//! no two readers ever observe the same instance. Value trees are immutable
//! at their text/bytes leaves, which keeps the structural copy equivalent to
//! full serialization.

use std::sync::Arc;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// Deep-copying decorator guaranteeing read-write isolation
pub struct SerializedCache {
    delegate: Box<dyn Cache>,
}

impl SerializedCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        Self { delegate }
    }
}

impl Cache for SerializedCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.delegate
            .get(key)
            .map(|value| Arc::new(value.as_ref().clone()))
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.delegate.put(key, Arc::new(value.as_ref().clone()));
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.delegate.remove(key)
    }

    fn clear(&self) {
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        self.delegate.size()
    }
}
