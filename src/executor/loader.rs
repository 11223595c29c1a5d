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

//! Nested-query loaders
//!
//! A [`ResultLoader`] resolves one lazy property by re-executing its nested
//! statement through a fresh one-shot executor over the configuration's
//! data source, so it stays valid after the producing session is gone. A
//! [`DeferredLoad`] fills a property from the session-local cache once the
//! in-flight query that will populate it completes (the placeholder-sentinel
//! circular case); the shared lazy object makes the late write visible to
//! every clone of the row.

use std::sync::Arc;

use crate::cache::CacheKey;
use crate::config::{Configuration, ExecutorType};
use crate::core::{Error, LazyLoad, LazyObject, Result, Value};
use crate::mapping::RowBounds;

use super::transaction::Transaction;
use super::Executor;

/// Re-executes a nested statement on demand
pub struct ResultLoader {
    config: Arc<Configuration>,
    statement_id: String,
    parameter: Value,
    as_list: bool,
}

impl ResultLoader {
    pub fn new(
        config: Arc<Configuration>,
        statement_id: impl Into<String>,
        parameter: Value,
        as_list: bool,
    ) -> Self {
        Self {
            config,
            statement_id: statement_id.into(),
            parameter,
            as_list,
        }
    }

    /// Run the nested statement through a fresh one-shot executor
    pub fn load(&self) -> Result<Value> {
        let ms = self.config.statement(&self.statement_id)?;
        let environment = self.config.environment.as_ref().ok_or_else(|| {
            Error::configuration("an environment is required to run nested statement loads")
        })?;
        let transaction = Transaction::new(
            environment.data_source.clone(),
            true,
            environment.managed,
        );
        let mut executor = Executor::new(
            self.config.clone(),
            transaction,
            ExecutorType::Simple,
            false,
        );
        let rows = executor.query(&ms, self.parameter.clone(), RowBounds::DEFAULT, None);
        executor.close(false);
        extract_result(rows?, self.as_list)
    }
}

impl LazyLoad for ResultLoader {
    fn load(&self) -> Result<Value> {
        ResultLoader::load(self)
    }
}

/// Shape a nested-query result list into the mapped property value
pub fn extract_result(rows: Value, as_list: bool) -> Result<Value> {
    match rows {
        Value::Array(items) => {
            if as_list {
                Ok(Value::Array(items))
            } else {
                let count = items.len();
                match count {
                    0 => Ok(Value::Null),
                    1 => Ok(items.into_iter().next().unwrap_or(Value::Null)),
                    n => Err(Error::TooManyRows(n)),
                }
            }
        }
        other => Ok(other),
    }
}

/// A property fill waiting for an in-flight query's cache entry
pub struct DeferredLoad {
    /// First-level cache key of the query that will produce the value
    pub key: CacheKey,
    /// Property to fill on the target object
    pub property: String,
    /// Shared row object; every clone observes the late write
    pub target: Arc<LazyObject>,
    /// Property is a collection
    pub as_list: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_single() {
        assert_eq!(
            extract_result(Value::array(vec![Value::Integer(1)]), false).unwrap(),
            Value::Integer(1)
        );
        assert_eq!(
            extract_result(Value::array(vec![]), false).unwrap(),
            Value::Null
        );
        assert!(matches!(
            extract_result(
                Value::array(vec![Value::Integer(1), Value::Integer(2)]),
                false
            ),
            Err(Error::TooManyRows(2))
        ));
    }

    #[test]
    fn test_extract_list() {
        assert_eq!(
            extract_result(Value::array(vec![Value::Integer(1)]), true).unwrap(),
            Value::array(vec![Value::Integer(1)])
        );
    }
}
