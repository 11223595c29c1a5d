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

//! Coarse-lock decorator: serializes every operation on the stack below

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::Value;

use super::super::key::CacheKey;
use super::super::Cache;

/// One lock around all operations of the wrapped stack
pub struct SynchronizedCache {
    delegate: Box<dyn Cache>,
    lock: Mutex<()>,
}

impl SynchronizedCache {
    pub fn new(delegate: Box<dyn Cache>) -> Self {
        Self {
            delegate,
            lock: Mutex::new(()),
        }
    }
}

impl Cache for SynchronizedCache {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn get(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let _guard = self.lock.lock();
        self.delegate.get(key)
    }

    fn put(&self, key: CacheKey, value: Arc<Value>) {
        let _guard = self.lock.lock();
        self.delegate.put(key, value);
    }

    fn remove(&self, key: &CacheKey) -> Option<Arc<Value>> {
        let _guard = self.lock.lock();
        self.delegate.remove(key)
    }

    fn clear(&self) {
        let _guard = self.lock.lock();
        self.delegate.clear();
    }

    fn size(&self) -> usize {
        let _guard = self.lock.lock();
        self.delegate.size()
    }
}
