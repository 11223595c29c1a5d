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

//! Cache keys
//!
//! An order-sensitive digest over a sequence of updates. Two keys are equal
//! iff their hashcode, checksum, count and pairwise update values all match;
//! array values compare element-wise. Query keys digest the statement id,
//! row bounds, SQL text, every non-OUT parameter value and the environment
//! id, in that order.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::core::Value;

const DEFAULT_MULTIPLIER: i64 = 37;
const DEFAULT_HASHCODE: i64 = 17;

/// Order-sensitive composite cache key
#[derive(Debug, Clone)]
pub struct CacheKey {
    hashcode: i64,
    checksum: i64,
    count: usize,
    update_list: Vec<Value>,
}

impl CacheKey {
    /// Create an empty key
    pub fn new() -> Self {
        Self {
            hashcode: DEFAULT_HASHCODE,
            checksum: 0,
            count: 0,
            update_list: Vec::new(),
        }
    }

    /// Number of digested updates
    pub fn update_count(&self) -> usize {
        self.count
    }

    /// Digest one value into the key
    pub fn update(&mut self, value: impl Into<Value>) {
        let value = value.into();
        let base = value_hash(&value);
        self.count += 1;
        self.checksum = self.checksum.wrapping_add(base);
        let base = base.wrapping_mul(self.count as i64);
        self.hashcode = DEFAULT_MULTIPLIER
            .wrapping_mul(self.hashcode)
            .wrapping_add(base);
        self.update_list.push(value);
    }

    /// Digest a sequence of values in order
    pub fn update_all<I: IntoIterator<Item = Value>>(&mut self, values: I) {
        for value in values {
            self.update(value);
        }
    }

    /// Derive a key scoped inside `parent`: this key's digest extended by
    /// every update of the parent key
    pub fn combine(&self, parent: &CacheKey) -> CacheKey {
        let mut combined = self.clone();
        for value in &parent.update_list {
            combined.update(value.clone());
        }
        combined
    }
}

impl Default for CacheKey {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for CacheKey {
    fn eq(&self, other: &Self) -> bool {
        if self.hashcode != other.hashcode
            || self.checksum != other.checksum
            || self.count != other.count
        {
            return false;
        }
        self.update_list
            .iter()
            .zip(other.update_list.iter())
            .all(|(a, b)| a == b)
    }
}

impl Eq for CacheKey {}

impl Hash for CacheKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_i64(self.hashcode);
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hashcode, self.checksum)?;
        for value in &self.update_list {
            write!(f, ":{}", value)?;
        }
        Ok(())
    }
}

/// Stable content hash of a value; arrays and objects fold element-wise
fn value_hash(value: &Value) -> i64 {
    match value {
        Value::Null => 1,
        Value::Boolean(b) => {
            if *b {
                1231
            } else {
                1237
            }
        }
        Value::Integer(v) => *v,
        Value::Float(v) => v.to_bits() as i64,
        Value::Text(s) => str_hash(s.as_bytes()),
        Value::Bytes(b) => str_hash(b),
        Value::Timestamp(t) => t.timestamp_millis(),
        Value::Array(items) => items
            .iter()
            .fold(1i64, |acc, item| {
                acc.wrapping_mul(31).wrapping_add(value_hash(item))
            }),
        Value::Object(map) => map.iter().fold(1i64, |acc, (k, v)| {
            acc.wrapping_mul(31)
                .wrapping_add(str_hash(k.as_bytes()))
                .wrapping_mul(31)
                .wrapping_add(value_hash(v))
        }),
        Value::Lazy(lazy) => lazy.field_count() as i64,
    }
}

fn str_hash(bytes: &[u8]) -> i64 {
    bytes
        .iter()
        .fold(0i64, |acc, &b| acc.wrapping_mul(31).wrapping_add(b as i64))
}
