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

//! Lazy-loaded objects
//!
//! A row object with lazy property mappings is materialized as
//! [`crate::core::Value::Lazy`] wrapping a [`LazyObject`]: the eagerly
//! mapped properties plus one pending loader per lazy property. The first
//! property access through the meta layer resolves the loader and caches
//! the loaded value; writing a property discards its pending loader.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::error::Result;
use super::value::{ObjectMap, Value};

/// A pending property load
///
/// Implementations re-execute the nested statement through a fresh one-shot
/// executor over the owning configuration, so a loader stays valid after the
/// session that produced the object is closed.
pub trait LazyLoad: Send + Sync {
    /// Execute the pending load and return the property value
    fn load(&self) -> Result<Value>;
}

/// A materialized object carrying pending lazy loads
///
/// Interior mutability keeps lazy resolution transparent to readers holding
/// a shared reference through [`crate::core::Value`].
pub struct LazyObject {
    fields: Mutex<ObjectMap>,
    loaders: Mutex<FxHashMap<String, Box<dyn LazyLoad>>>,
    /// The first property access resolves every pending loader
    aggressive: AtomicBool,
}

impl LazyObject {
    /// Create a lazy object around eagerly mapped fields
    pub fn new(fields: ObjectMap) -> Self {
        Self {
            fields: Mutex::new(fields),
            loaders: Mutex::new(FxHashMap::default()),
            aggressive: AtomicBool::new(false),
        }
    }

    /// Resolve every pending loader on the first property access
    pub fn mark_aggressive(&self) {
        self.aggressive.store(true, Ordering::Relaxed);
    }

    /// Register a pending loader for `property`
    pub fn add_loader(&self, property: impl Into<String>, loader: Box<dyn LazyLoad>) {
        self.loaders.lock().insert(property.into(), loader);
    }

    /// Number of properties pending a lazy load
    pub fn pending_count(&self) -> usize {
        self.loaders.lock().len()
    }

    /// Number of resolved fields
    pub fn field_count(&self) -> usize {
        self.fields.lock().len()
    }

    /// True if `property` has a pending loader
    pub fn is_pending(&self, property: &str) -> bool {
        self.loaders.lock().contains_key(property)
    }

    /// Read a property, resolving its loader on first access
    pub fn get(&self, property: &str) -> Result<Option<Value>> {
        if self.aggressive.swap(false, Ordering::Relaxed) {
            self.load_all()?;
        }
        if let Some(value) = self.fields.lock().get(property) {
            return Ok(Some(value.clone()));
        }
        let loader = self.loaders.lock().remove(property);
        match loader {
            Some(loader) => {
                let value = loader.load()?;
                self.fields
                    .lock()
                    .insert(property.to_string(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    /// Write a property, discarding any pending loader for it
    pub fn set(&self, property: impl Into<String>, value: Value) {
        let property = property.into();
        self.loaders.lock().remove(&property);
        self.fields.lock().insert(property, value);
    }

    /// Resolve every pending loader
    pub fn load_all(&self) -> Result<()> {
        let pending: Vec<String> = self.loaders.lock().keys().cloned().collect();
        for property in pending {
            self.get(&property)?;
        }
        Ok(())
    }

    /// Snapshot the resolved fields without triggering pending loads
    pub fn snapshot(&self) -> ObjectMap {
        self.fields.lock().clone()
    }
}

impl fmt::Debug for LazyObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyObject")
            .field("fields", &*self.fields.lock())
            .field("pending", &self.loaders.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}
