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

//! Sessions
//!
//! A [`SqlSessionFactory`] freezes a validated configuration and opens
//! [`SqlSession`]s over it. A session owns one executor and is
//! single-threaded; mapper proxies and their method caches are shared
//! across sessions through the factory.

use std::sync::Arc;

use crate::binding::{Args, Mapper, ProxyCache};
use crate::config::{Configuration, ExecutorType};
use crate::core::{meta, Error, FromValue, ObjectMap, Result, Value};
use crate::executor::{BatchResult, Cursor, Executor, ResultHandler, Transaction};
use crate::mapping::RowBounds;

/// Opens sessions over one frozen configuration
pub struct SqlSessionFactory {
    config: Arc<Configuration>,
    proxies: Arc<ProxyCache>,
}

impl SqlSessionFactory {
    /// Validate the configuration and freeze it
    pub fn new(config: Configuration) -> Result<Self> {
        config.validate_references()?;
        Ok(Self {
            config: Arc::new(config),
            proxies: Arc::new(ProxyCache::new()),
        })
    }

    /// The shared configuration
    pub fn configuration(&self) -> Arc<Configuration> {
        self.config.clone()
    }

    /// Open a session with the configured defaults (manual commit)
    pub fn open_session(&self) -> Result<SqlSession> {
        self.open_session_with(self.config.settings.default_executor_type, false)
    }

    /// Open a session with an explicit executor type and commit mode
    pub fn open_session_with(
        &self,
        executor_type: ExecutorType,
        auto_commit: bool,
    ) -> Result<SqlSession> {
        let environment = self.config.environment.as_ref().ok_or_else(|| {
            Error::configuration("cannot open a session without an environment")
        })?;
        let transaction = Transaction::new(
            environment.data_source.clone(),
            auto_commit,
            environment.managed,
        );
        let executor = Executor::new(
            self.config.clone(),
            transaction,
            executor_type,
            self.config.settings.cache_enabled,
        );
        Ok(SqlSession {
            config: self.config.clone(),
            executor,
            proxies: self.proxies.clone(),
            auto_commit,
            dirty: false,
        })
    }
}

/// One unit of database work: queries, writes, transaction boundary
pub struct SqlSession {
    config: Arc<Configuration>,
    executor: Executor,
    proxies: Arc<ProxyCache>,
    auto_commit: bool,
    dirty: bool,
}

impl SqlSession {
    /// The shared configuration
    pub fn configuration(&self) -> Arc<Configuration> {
        self.config.clone()
    }

    // =========================================================================
    // Selects
    // =========================================================================

    /// Run a select, collecting every row
    pub fn select_list(&mut self, statement: &str, parameter: Value) -> Result<Vec<Value>> {
        self.select_list_bounds(statement, parameter, RowBounds::DEFAULT)
    }

    /// Run a select over a row window
    pub fn select_list_bounds(
        &mut self,
        statement: &str,
        parameter: Value,
        row_bounds: RowBounds,
    ) -> Result<Vec<Value>> {
        let ms = self.config.statement(statement)?;
        let result =
            self.executor
                .query(&ms, wrap_collection(parameter), row_bounds, None)?;
        match result {
            Value::Array(rows) => Ok(rows),
            other => Ok(vec![other]),
        }
    }

    /// Run a select expecting at most one row
    pub fn select_one(&mut self, statement: &str, parameter: Value) -> Result<Value> {
        self.select_one_bounds(statement, parameter, RowBounds::DEFAULT)
    }

    /// Single-row select over a row window
    pub fn select_one_bounds(
        &mut self,
        statement: &str,
        parameter: Value,
        row_bounds: RowBounds,
    ) -> Result<Value> {
        let mut rows = self.select_list_bounds(statement, parameter, row_bounds)?;
        match rows.len() {
            0 => Ok(Value::Null),
            1 => Ok(rows.remove(0)),
            n => Err(Error::TooManyRows(n)),
        }
    }

    /// Single-row select converted to the declared type
    pub fn select_one_as<T: FromValue>(&mut self, statement: &str, parameter: Value) -> Result<T> {
        let row = self.select_one(statement, parameter)?;
        T::from_value(&row)
    }

    /// Run a select and key the rows by one row property
    pub fn select_map(
        &mut self,
        statement: &str,
        parameter: Value,
        map_key: &str,
    ) -> Result<ObjectMap> {
        let rows = self.select_list(statement, parameter)?;
        let mut map = ObjectMap::new();
        for row in rows {
            let key = meta::get_path(&row, map_key)?;
            map.insert(key.as_string().unwrap_or_default(), row);
        }
        Ok(map)
    }

    /// Run a select as a streaming cursor
    pub fn select_cursor(
        &mut self,
        statement: &str,
        parameter: Value,
        row_bounds: RowBounds,
    ) -> Result<Cursor> {
        let ms = self.config.statement(statement)?;
        self.executor
            .query_cursor(&ms, wrap_collection(parameter), row_bounds)
    }

    /// Run a select, streaming each row into `handler`
    pub fn select_with_handler(
        &mut self,
        statement: &str,
        parameter: Value,
        row_bounds: RowBounds,
        handler: &mut dyn ResultHandler,
    ) -> Result<()> {
        let ms = self.config.statement(statement)?;
        self.executor
            .query(&ms, wrap_collection(parameter), row_bounds, Some(handler))
            .map(|_| ())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Run a write; generated keys land back in `parameter`
    pub fn update(&mut self, statement: &str, parameter: &mut Value) -> Result<i64> {
        let ms = self.config.statement(statement)?;
        self.dirty = true;
        let mut wrapped = wrap_collection(std::mem::replace(parameter, Value::Null));
        let result = self.executor.update(&ms, &mut wrapped);
        *parameter = unwrap_collection(wrapped);
        result
    }

    /// Insert alias for [`SqlSession::update`]
    pub fn insert(&mut self, statement: &str, parameter: &mut Value) -> Result<i64> {
        self.update(statement, parameter)
    }

    /// Delete alias for [`SqlSession::update`]
    pub fn delete(&mut self, statement: &str, parameter: &mut Value) -> Result<i64> {
        self.update(statement, parameter)
    }

    /// Submit pending batches
    pub fn flush_statements(&mut self) -> Result<Vec<BatchResult>> {
        self.executor.flush_statements()
    }

    // =========================================================================
    // Transaction boundary
    // =========================================================================

    /// Commit when work is pending
    pub fn commit(&mut self) -> Result<()> {
        self.commit_force(false)
    }

    /// Commit, forcing the driver commit even when nothing is pending
    pub fn commit_force(&mut self, force: bool) -> Result<()> {
        let required = (!self.auto_commit && self.dirty) || force;
        self.executor.commit(required)?;
        self.dirty = false;
        Ok(())
    }

    /// Roll back when work is pending
    pub fn rollback(&mut self) -> Result<()> {
        self.rollback_force(false)
    }

    /// Roll back, forcing the driver rollback
    pub fn rollback_force(&mut self, force: bool) -> Result<()> {
        let required = (!self.auto_commit && self.dirty) || force;
        self.executor.rollback(required)?;
        self.dirty = false;
        Ok(())
    }

    /// Close the session, rolling back uncommitted work
    pub fn close(&mut self) {
        let force_rollback = !self.auto_commit && self.dirty;
        self.executor.close(force_rollback);
        self.dirty = false;
    }

    // =========================================================================
    // Mappers
    // =========================================================================

    /// A mapper handle over this session
    pub fn mapper(&mut self, namespace: &str) -> Result<Mapper<'_>> {
        if !self.config.mapper_registry.has(namespace) {
            return Err(Error::configuration(format!(
                "mapper '{}' is not registered",
                namespace
            )));
        }
        let proxy = self.proxies.proxy(namespace);
        Ok(Mapper::new(self, proxy))
    }

    /// Convenience: call one mapper method
    pub fn call(&mut self, namespace: &str, method: &str, args: Args) -> Result<Value> {
        self.mapper(namespace)?.call(method, args)
    }
}

impl Drop for SqlSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Wrap bare collections so statements can reference them by name
///
/// An array parameter becomes an object exposing it as `collection`, `list`
/// and `array`, matching what `<foreach collection="list">` expects.
fn wrap_collection(parameter: Value) -> Value {
    match parameter {
        Value::Array(items) => {
            let mut map = ObjectMap::new();
            map.insert("collection".to_string(), Value::Array(items.clone()));
            map.insert("list".to_string(), Value::Array(items.clone()));
            map.insert("array".to_string(), Value::Array(items));
            Value::Object(map)
        }
        other => other,
    }
}

/// Undo [`wrap_collection`] so callers see their own parameter shape
fn unwrap_collection(parameter: Value) -> Value {
    if let Value::Object(map) = &parameter {
        if map.len() == 3 && map.contains_key("collection") && map.contains_key("array") {
            if let Some(list) = map.get("list") {
                return list.clone();
            }
        }
    }
    parameter
}
