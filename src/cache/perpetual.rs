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

//! Perpetual cache: the unbounded keyed store at the base of every stack

use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::core::Value;

use super::key::CacheKey;
use super::Cache;

/// Unbounded keyed store
pub struct PerpetualCache {
    id: String,
    entries: Mutex<FxHashMap<CacheKey, Arc<Value>>>,
}

impl PerpetualCache {
    /// Create a cache identified by `id` (its namespace)
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            entries: Mutex::new(FxHashMap::default()),
        }
    }
}

impl Cache for PerpetualCache {
    fn id(&self) -> &str {
        &self.id
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.entries.lock().get(key).cloned()
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        self.entries.lock().insert(key, value);
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        self.entries.lock().remove(key)
    }

    fn clear(&self) {
        self.entries.lock().clear();
    }

    fn size(&self) -> usize {
        self.entries.lock().len()
    }
}
