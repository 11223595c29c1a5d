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

//! The execution pipeline
//!
//! One [`Executor`] per session. It layers: the second-level transactional
//! cache view (when caching is enabled), the session-local first-level
//! cache with its in-flight placeholder sentinel, deferred loads drained at
//! query depth zero, and the statement runner - fresh statements, reused
//! prepared statements keyed by SQL text, or driver-level batches.
//!
//! The second-level layer is flattened into the executor rather than
//! stacked as a wrapper: the transactional cache manager sits alongside the
//! local cache, which is what lets re-entrant nested queries participate in
//! the second level without a back-reference to an outer wrapper.

use std::collections::VecDeque;
use std::sync::{Arc, OnceLock};

use log::debug;
use rustc_hash::FxHashMap;

use crate::cache::{CacheKey, PerpetualCache, TransactionalCacheManager};
use crate::cache::Cache as _;
use crate::config::{Configuration, ExecutorType, LocalCacheScope};
use crate::core::{meta, Error, Result, Value};
use crate::driver::{Connection, PreparedStatement};
use crate::mapping::{
    BoundSql, KeyGeneratorSpec, MappedStatement, RowBounds, StatementType,
};

pub mod loader;
pub mod result_set;
pub mod statement;
pub mod transaction;

pub use loader::{DeferredLoad, ResultLoader};
pub use result_set::{Cursor, DefaultResultHandler, ResultContext, ResultHandler, ResultSetHandler};
pub use statement::StatementHandler;
pub use transaction::Transaction;

use result_set::wrapper::ResultSetWrapper;
use statement::assign_generated_keys;

/// Update-count sentinel returned by batched writes until flush
pub const BATCH_UPDATE_RETURN_VALUE: i64 = i64::MIN + 1002;

/// In-flight marker stored in the local cache during execution
fn execution_placeholder() -> Arc<Value> {
    static PLACEHOLDER: OnceLock<Arc<Value>> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| Arc::new(Value::text("__EXECUTION_PLACEHOLDER__")))
        .clone()
}

/// State of one first-level cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalCacheState {
    /// Not cached
    Absent,
    /// Query currently executing (placeholder sentinel present)
    InFlight,
    /// Fully loaded
    Ready,
}

/// Outcome of one flushed batch
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub statement_id: String,
    pub sql: String,
    /// Parameter objects in batch order, with generated keys written back
    pub parameter_objects: Vec<Value>,
    pub update_counts: Vec<i64>,
}

/// One queued batch: a statement plus its accumulated bindings
struct BatchHolder {
    statement: Box<dyn PreparedStatement>,
    statement_id: String,
    sql: String,
    parameters: Vec<Value>,
    key_generator: KeyGeneratorSpec,
}

/// Statement-execution strategy state
enum Runner {
    Simple,
    Reuse {
        statements: FxHashMap<String, Box<dyn PreparedStatement>>,
    },
    Batch {
        current_sql: Option<String>,
        current_id: Option<String>,
        batches: Vec<BatchHolder>,
    },
}

impl Runner {
    fn new(executor_type: ExecutorType) -> Self {
        match executor_type {
            ExecutorType::Simple => Runner::Simple,
            ExecutorType::Reuse => Runner::Reuse {
                statements: FxHashMap::default(),
            },
            ExecutorType::Batch => Runner::Batch {
                current_sql: None,
                current_id: None,
                batches: Vec::new(),
            },
        }
    }

    fn do_query(
        &mut self,
        executor: &mut Executor,
        ms: &MappedStatement,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
        bound_sql: &BoundSql,
    ) -> Result<Value> {
        // a select interleaved with pending batches flushes them first
        if matches!(self, Runner::Batch { .. }) {
            self.do_flush(executor, false)?;
        }
        let config = executor.configuration();
        let handler = StatementHandler::new(&config, ms, bound_sql);
        let timeout = executor.transaction_timeout();
        let multiple = executor.multiple_results_supported()?;

        match self {
            Runner::Reuse { statements } => {
                let sql = bound_sql.sql.clone();
                let reusable = statements
                    .get(&sql)
                    .map(|s| s.connection_open())
                    .unwrap_or(false);
                if !reusable {
                    let prepared = handler.prepare(executor.connection()?, timeout)?;
                    statements.insert(sql.clone(), prepared);
                }
                let statement = match statements.get_mut(&sql) {
                    Some(statement) => statement,
                    None => return Err(Error::driver("reusable statement vanished")),
                };
                handler.parameterize(statement.as_mut())?;
                handler.execute(statement.as_mut())?;
                let rsh = ResultSetHandler::new(executor, ms, row_bounds, multiple);
                rsh.handle_result_sets(statement.as_mut(), result_handler)
            }
            _ => {
                let mut statement = handler.prepare(executor.connection()?, timeout)?;
                handler.parameterize(statement.as_mut())?;
                handler.execute(statement.as_mut())?;
                let rsh = ResultSetHandler::new(executor, ms, row_bounds, multiple);
                let result = rsh.handle_result_sets(statement.as_mut(), result_handler);
                statement.close();
                result
            }
        }
    }

    fn do_update(
        &mut self,
        executor: &mut Executor,
        ms: &MappedStatement,
        parameter: &mut Value,
    ) -> Result<i64> {
        executor.process_select_key(ms, parameter, true)?;
        let config = executor.configuration();
        let bound_sql = ms.bound_sql(
            &config.type_handlers,
            parameter,
            config.database_id.as_deref(),
        )?;
        let handler = StatementHandler::new(&config, ms, &bound_sql);
        let timeout = executor.transaction_timeout();

        match self {
            Runner::Batch {
                current_sql,
                current_id,
                batches,
            } => {
                let sql = bound_sql.sql.clone();
                let same = current_sql.as_deref() == Some(sql.as_str())
                    && current_id.as_deref() == Some(ms.id.as_str());
                if same {
                    if let Some(holder) = batches.last_mut() {
                        handler.parameterize(holder.statement.as_mut())?;
                        holder.statement.add_batch()?;
                        holder.parameters.push(parameter.clone());
                        return Ok(BATCH_UPDATE_RETURN_VALUE);
                    }
                }
                let mut statement = handler.prepare(executor.connection()?, timeout)?;
                handler.parameterize(statement.as_mut())?;
                statement.add_batch()?;
                batches.push(BatchHolder {
                    statement,
                    statement_id: ms.id.clone(),
                    sql: sql.clone(),
                    parameters: vec![parameter.clone()],
                    key_generator: ms.key_generator.clone(),
                });
                *current_sql = Some(sql);
                *current_id = Some(ms.id.clone());
                Ok(BATCH_UPDATE_RETURN_VALUE)
            }
            Runner::Reuse { statements } => {
                let sql = bound_sql.sql.clone();
                let reusable = statements
                    .get(&sql)
                    .map(|s| s.connection_open())
                    .unwrap_or(false);
                if !reusable {
                    let prepared = handler.prepare(executor.connection()?, timeout)?;
                    statements.insert(sql.clone(), prepared);
                }
                let statement = match statements.get_mut(&sql) {
                    Some(statement) => statement,
                    None => return Err(Error::driver("reusable statement vanished")),
                };
                let rows =
                    run_update(&handler, statement.as_mut(), ms, parameter)?;
                executor.process_select_key(ms, parameter, false)?;
                Ok(rows)
            }
            Runner::Simple => {
                let mut statement = handler.prepare(executor.connection()?, timeout)?;
                let result = run_update(&handler, statement.as_mut(), ms, parameter);
                statement.close();
                let rows = result?;
                executor.process_select_key(ms, parameter, false)?;
                Ok(rows)
            }
        }
    }

    fn do_flush(&mut self, _executor: &mut Executor, is_rollback: bool) -> Result<Vec<BatchResult>> {
        match self {
            Runner::Simple => Ok(Vec::new()),
            Runner::Reuse { statements } => {
                for (_, mut statement) in statements.drain() {
                    statement.close();
                }
                Ok(Vec::new())
            }
            Runner::Batch {
                current_sql,
                current_id,
                batches,
            } => {
                *current_sql = None;
                *current_id = None;
                let holders = std::mem::take(batches);
                if is_rollback {
                    for mut holder in holders {
                        holder.statement.close();
                    }
                    return Ok(Vec::new());
                }
                let mut results = Vec::with_capacity(holders.len());
                for mut holder in holders {
                    let counts = holder.statement.execute_batch();
                    let outcome = counts.and_then(|counts| {
                        if let KeyGeneratorSpec::GeneratedKeys {
                            key_properties,
                            key_columns,
                        } = &holder.key_generator
                        {
                            if let Some(mut rs) = holder.statement.generated_keys()? {
                                let mut bundle =
                                    Value::Array(std::mem::take(&mut holder.parameters));
                                assign_generated_keys(
                                    rs.as_mut(),
                                    key_properties,
                                    key_columns,
                                    &mut bundle,
                                )?;
                                if let Value::Array(items) = bundle {
                                    holder.parameters = items;
                                }
                            }
                        }
                        Ok(counts)
                    });
                    holder.statement.close();
                    let counts = outcome?;
                    results.push(BatchResult {
                        statement_id: holder.statement_id,
                        sql: holder.sql,
                        parameter_objects: holder.parameters,
                        update_counts: counts,
                    });
                }
                Ok(results)
            }
        }
    }
}

/// Parameterize, execute, read the count, and apply key generation
fn run_update(
    handler: &StatementHandler<'_>,
    statement: &mut dyn PreparedStatement,
    ms: &MappedStatement,
    parameter: &mut Value,
) -> Result<i64> {
    handler.parameterize(statement)?;
    handler.execute(statement)?;
    let rows = statement.update_count()?;
    handler.handle_output_parameters(statement, parameter)?;
    if let KeyGeneratorSpec::GeneratedKeys {
        key_properties,
        key_columns,
    } = &ms.key_generator
    {
        if let Some(mut rs) = statement.generated_keys()? {
            assign_generated_keys(rs.as_mut(), key_properties, key_columns, parameter)?;
        }
    }
    Ok(rows)
}

/// The session execution pipeline
pub struct Executor {
    config: Arc<Configuration>,
    transaction: Transaction,
    runner: Runner,
    local_cache: PerpetualCache,
    local_out_cache: PerpetualCache,
    deferred_loads: VecDeque<DeferredLoad>,
    query_stack: u32,
    closed: bool,
    /// Second-level staging; present when caching is enabled
    tcm: Option<TransactionalCacheManager>,
}

impl Executor {
    pub fn new(
        config: Arc<Configuration>,
        transaction: Transaction,
        executor_type: ExecutorType,
        cache_enabled: bool,
    ) -> Self {
        Self {
            config,
            transaction,
            runner: Runner::new(executor_type),
            local_cache: PerpetualCache::new("LocalCache"),
            local_out_cache: PerpetualCache::new("LocalOutputParameterCache"),
            deferred_loads: VecDeque::new(),
            query_stack: 0,
            closed: false,
            tcm: cache_enabled.then(TransactionalCacheManager::new),
        }
    }

    /// The shared configuration
    pub fn configuration(&self) -> Arc<Configuration> {
        self.config.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn connection(&mut self) -> Result<&mut dyn Connection> {
        self.transaction.connection()
    }

    fn transaction_timeout(&self) -> Option<u64> {
        self.transaction.timeout()
    }

    fn multiple_results_supported(&mut self) -> Result<bool> {
        if !self.config.settings.multiple_result_sets_enabled {
            return Ok(false);
        }
        Ok(self.connection()?.supports_multiple_result_sets())
    }

    // =========================================================================
    // Cache keys and first-level cache state
    // =========================================================================

    /// Digest a query identity: statement id, row bounds, SQL, every non-OUT
    /// parameter's effective value, and the environment id
    pub fn create_cache_key(
        &self,
        ms: &MappedStatement,
        parameter: &Value,
        row_bounds: RowBounds,
        bound_sql: &BoundSql,
    ) -> CacheKey {
        let mut key = CacheKey::new();
        key.update(Value::text(ms.id.clone()));
        key.update(Value::Integer(row_bounds.offset as i64));
        key.update(Value::Integer(row_bounds.limit as u64 as i64));
        key.update(Value::text(bound_sql.sql.clone()));
        for mapping in &bound_sql.parameter_mappings {
            if !mapping.is_input() {
                continue;
            }
            let value = if bound_sql.has_additional_parameter(&mapping.property) {
                bound_sql
                    .additional_parameter(&mapping.property)
                    .unwrap_or(Value::Null)
            } else if self.config.type_handlers.has_handler_for_value(parameter) {
                parameter.clone()
            } else {
                meta::get_path(parameter, &mapping.property).unwrap_or(Value::Null)
            };
            key.update(value);
        }
        if let Some(environment) = &self.config.environment {
            key.update(Value::text(environment.id.clone()));
        }
        key
    }

    /// State of the first-level entry under `key`
    pub fn local_cache_state(&self, key: &CacheKey) -> LocalCacheState {
        match self.local_cache.get(key) {
            None => LocalCacheState::Absent,
            Some(entry) if Arc::ptr_eq(&entry, &execution_placeholder()) => {
                LocalCacheState::InFlight
            }
            Some(_) => LocalCacheState::Ready,
        }
    }

    /// True when a fully loaded entry exists under `key`
    pub fn is_cached(&self, key: &CacheKey) -> bool {
        self.local_cache_state(key) == LocalCacheState::Ready
    }

    /// Drop every first-level entry
    pub fn clear_local_cache(&mut self) {
        if !self.closed {
            self.local_cache.clear();
            self.local_out_cache.clear();
        }
    }

    /// Queue a property fill, or apply it now when the entry is ready
    pub fn defer_load(&mut self, load: DeferredLoad) {
        if self.local_cache_state(&load.key) == LocalCacheState::Ready {
            // already loaded; no need to wait for depth zero
            if let Err(err) = self.apply_deferred(&load) {
                debug!("immediate deferred load failed: {}", err);
            }
        } else {
            self.deferred_loads.push_back(load);
        }
    }

    fn apply_deferred(&self, load: &DeferredLoad) -> Result<()> {
        if let Some(entry) = self.local_cache.get(&load.key) {
            if !Arc::ptr_eq(&entry, &execution_placeholder()) {
                let value = loader::extract_result(entry.as_ref().clone(), load.as_list)?;
                load.target.set(&load.property, value);
            }
        }
        Ok(())
    }

    // =========================================================================
    // Query
    // =========================================================================

    /// Run a select and materialize its rows
    pub fn query(
        &mut self,
        ms: &MappedStatement,
        parameter: Value,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Value> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        let bound_sql = ms.bound_sql(
            &self.config.type_handlers,
            &parameter,
            self.config.database_id.as_deref(),
        )?;
        let key = self.create_cache_key(ms, &parameter, row_bounds, &bound_sql);
        self.query_with_key(ms, parameter, row_bounds, result_handler, key, bound_sql)
    }

    /// Query with a precomputed cache key and bound SQL
    pub fn query_with_key(
        &mut self,
        ms: &MappedStatement,
        parameter: Value,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
        key: CacheKey,
        bound_sql: BoundSql,
    ) -> Result<Value> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        // second level first, when this statement participates
        if self.tcm.is_some() {
            if let Some(namespace) = &ms.cache_namespace {
                if let Some(cache) = self.config.cache(namespace) {
                    if ms.flush_cache {
                        if let Some(tcm) = &mut self.tcm {
                            tcm.clear(&cache);
                        }
                    }
                    if ms.use_cache && result_handler.is_none() {
                        ensure_no_out_params(ms, &bound_sql)?;
                        if let Some(tcm) = &mut self.tcm {
                            if let Some(hit) = tcm.get(&cache, &key) {
                                if !hit.is_null() {
                                    debug!("second-level cache hit: {}", ms.id);
                                    return Ok(hit.as_ref().clone());
                                }
                            }
                        }
                        let result =
                            self.query_local(ms, parameter, row_bounds, None, &key, &bound_sql)?;
                        if let Some(tcm) = &mut self.tcm {
                            tcm.put(&cache, key, Arc::new(result.clone()));
                        }
                        return Ok(result);
                    }
                }
            }
        }
        self.query_local(ms, parameter, row_bounds, result_handler, &key, &bound_sql)
    }

    /// First-level cached query with deferred-load draining at depth zero
    fn query_local(
        &mut self,
        ms: &MappedStatement,
        parameter: Value,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
        key: &CacheKey,
        bound_sql: &BoundSql,
    ) -> Result<Value> {
        if self.query_stack == 0 && ms.flush_cache {
            self.clear_local_cache();
        }
        self.query_stack += 1;
        let outcome = self.query_cached_or_database(
            ms,
            parameter,
            row_bounds,
            result_handler,
            key,
            bound_sql,
        );
        self.query_stack -= 1;

        if self.query_stack == 0 {
            let drained: Vec<DeferredLoad> = self.deferred_loads.drain(..).collect();
            if outcome.is_ok() {
                for load in &drained {
                    self.apply_deferred(load)?;
                }
            }
            if self.config.settings.local_cache_scope == LocalCacheScope::Statement {
                self.clear_local_cache();
            }
        }
        outcome
    }

    fn query_cached_or_database(
        &mut self,
        ms: &MappedStatement,
        parameter: Value,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
        key: &CacheKey,
        bound_sql: &BoundSql,
    ) -> Result<Value> {
        if result_handler.is_none() {
            if let Some(entry) = self.local_cache.get(key) {
                if !Arc::ptr_eq(&entry, &execution_placeholder()) {
                    debug!("first-level cache hit: {}", ms.id);
                    return Ok(entry.as_ref().clone());
                }
            }
        }
        self.query_from_database(ms, parameter, row_bounds, result_handler, key, bound_sql)
    }

    fn query_from_database(
        &mut self,
        ms: &MappedStatement,
        parameter: Value,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
        key: &CacheKey,
        bound_sql: &BoundSql,
    ) -> Result<Value> {
        let caching = result_handler.is_none();
        self.local_cache.put(key.clone(), execution_placeholder());
        let result = self.dispatch_query(ms, row_bounds, result_handler, bound_sql);
        // the placeholder never survives, so a retry cannot see a stale
        // in-flight sentinel after an error
        self.local_cache.remove(key);
        let result = result?;
        if caching {
            self.local_cache.put(key.clone(), Arc::new(result.clone()));
        }
        if ms.statement_type == StatementType::Callable {
            self.local_out_cache
                .put(key.clone(), Arc::new(parameter.clone()));
        }
        Ok(result)
    }

    fn dispatch_query(
        &mut self,
        ms: &MappedStatement,
        row_bounds: RowBounds,
        result_handler: Option<&mut dyn ResultHandler>,
        bound_sql: &BoundSql,
    ) -> Result<Value> {
        let mut runner = std::mem::replace(&mut self.runner, Runner::Simple);
        let result = runner.do_query(self, ms, row_bounds, result_handler, bound_sql);
        self.runner = runner;
        result
    }

    /// Run a select as a streaming cursor (bypasses both cache tiers)
    pub fn query_cursor(
        &mut self,
        ms: &MappedStatement,
        parameter: Value,
        row_bounds: RowBounds,
    ) -> Result<Cursor> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        self.flush_pending_batches()?;
        let bound_sql = ms.bound_sql(
            &self.config.type_handlers,
            &parameter,
            self.config.database_id.as_deref(),
        )?;
        let result_map_id = ms
            .result_map_ids
            .first()
            .ok_or_else(|| {
                Error::configuration(format!("statement '{}' declares no result map", ms.id))
            })?
            .clone();
        let result_map = self.config.result_map(&result_map_id)?;

        let config = self.configuration();
        let handler = StatementHandler::new(&config, ms, &bound_sql);
        let timeout = self.transaction_timeout();
        let mut statement = handler.prepare(self.connection()?, timeout)?;
        handler.parameterize(statement.as_mut())?;
        handler.execute(statement.as_mut())?;
        let rsw = statement.result_set()?.map(ResultSetWrapper::new);
        Cursor::new(statement, rsw, config, result_map, row_bounds)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Run a write; generated keys are written back into `parameter`
    pub fn update(&mut self, ms: &MappedStatement, parameter: &mut Value) -> Result<i64> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        if self.tcm.is_some() && ms.flush_cache {
            if let Some(namespace) = &ms.cache_namespace {
                if let Some(cache) = self.config.cache(namespace) {
                    if let Some(tcm) = &mut self.tcm {
                        tcm.clear(&cache);
                    }
                }
            }
        }
        self.clear_local_cache();
        let mut runner = std::mem::replace(&mut self.runner, Runner::Simple);
        let result = runner.do_update(self, ms, parameter);
        self.runner = runner;
        result
    }

    fn process_select_key(
        &mut self,
        ms: &MappedStatement,
        parameter: &mut Value,
        before: bool,
    ) -> Result<()> {
        let KeyGeneratorSpec::SelectKey {
            statement_id,
            key_properties,
            before: declared_before,
        } = &ms.key_generator
        else {
            return Ok(());
        };
        if *declared_before != before {
            return Ok(());
        }
        let key_statement = self.config.statement(statement_id)?;
        let rows = self.query(&key_statement, parameter.clone(), RowBounds::DEFAULT, None)?;
        let row = loader::extract_result(rows, false)?;
        if row.is_null() {
            return Ok(());
        }
        if key_properties.len() == 1 && row.is_simple() {
            meta::set_path(parameter, &key_properties[0], row)?;
        } else {
            for property in key_properties {
                let value = meta::get_path(&row, property)?;
                meta::set_path(parameter, property, value)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Flush / commit / rollback / close
    // =========================================================================

    /// Submit pending batches, returning their results
    pub fn flush_statements(&mut self) -> Result<Vec<BatchResult>> {
        self.flush_with(false)
    }

    fn flush_with(&mut self, is_rollback: bool) -> Result<Vec<BatchResult>> {
        if self.closed {
            return Err(Error::ExecutorClosed);
        }
        let mut runner = std::mem::replace(&mut self.runner, Runner::Simple);
        let result = runner.do_flush(self, is_rollback);
        self.runner = runner;
        result
    }

    fn flush_pending_batches(&mut self) -> Result<()> {
        if matches!(self.runner, Runner::Batch { .. }) {
            self.flush_with(false)?;
        }
        Ok(())
    }

    /// Commit: clear the local cache, flush batches, commit the driver
    /// transaction when `required`, promote second-level staging
    pub fn commit(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Err(Error::TransactionClosed {
                operation: "commit",
            });
        }
        self.clear_local_cache();
        self.flush_with(false)?;
        if required {
            self.transaction.commit()?;
        }
        if let Some(tcm) = &mut self.tcm {
            tcm.commit();
        }
        Ok(())
    }

    /// Rollback: discard batches and second-level staging
    pub fn rollback(&mut self, required: bool) -> Result<()> {
        if self.closed {
            return Err(Error::TransactionClosed {
                operation: "rollback",
            });
        }
        self.clear_local_cache();
        let flush_result = self.flush_with(true);
        if required {
            self.transaction.rollback()?;
        }
        if let Some(tcm) = &mut self.tcm {
            tcm.rollback();
        }
        flush_result.map(|_| ())
    }

    /// Close the executor, releasing driver resources on every path
    pub fn close(&mut self, force_rollback: bool) {
        if self.closed {
            return;
        }
        if let Some(tcm) = &mut self.tcm {
            if force_rollback {
                tcm.rollback();
            } else {
                tcm.commit();
            }
        }
        let _ = self.flush_with(force_rollback);
        if force_rollback {
            let _ = self.transaction.rollback();
        }
        let _ = self.transaction.close();
        self.local_cache.clear();
        self.local_out_cache.clear();
        self.deferred_loads.clear();
        self.closed = true;
    }
}

/// Callable OUT parameters never flow through the shared cache
fn ensure_no_out_params(ms: &MappedStatement, bound_sql: &BoundSql) -> Result<()> {
    if ms.statement_type == StatementType::Callable
        && bound_sql
            .parameter_mappings
            .iter()
            .any(|mapping| mapping.is_output())
    {
        return Err(Error::OutParamsNotCacheable);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_identity() {
        let a = execution_placeholder();
        let b = execution_placeholder();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_batch_sentinel_is_distinct() {
        assert!(BATCH_UPDATE_RETURN_VALUE < 0);
    }
}
