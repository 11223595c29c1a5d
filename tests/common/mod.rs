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

// Scripted in-memory driver for integration tests: responses are keyed by
// the exact SQL the engine produces, and every execution is recorded with
// its bound parameters.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use sqlbind::core::{Error, Result, Value};
use sqlbind::driver::{
    ColumnMetadata, Connection, DataSource, KeyRetrieval, PreparedStatement, ResultSet,
    ResultSetMetadata, ResultSetType,
};
use sqlbind::types::JdbcType;

/// One scripted result set
#[derive(Debug, Clone)]
pub struct MockRows {
    pub metadata: ResultSetMetadata,
    pub rows: Vec<Vec<Value>>,
}

/// Build a result-set script from (label, type) columns and row data
pub fn rows(columns: &[(&str, JdbcType)], data: Vec<Vec<Value>>) -> MockRows {
    MockRows {
        metadata: ResultSetMetadata {
            columns: columns
                .iter()
                .map(|(label, jdbc)| ColumnMetadata {
                    name: label.to_string(),
                    label: label.to_string(),
                    jdbc_type: *jdbc,
                    type_name: jdbc.data_type().to_string(),
                })
                .collect(),
        },
        rows: data,
    }
}

/// Scripted response for one SQL string
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// One or more result sets
    Rows(Vec<MockRows>),
    /// An update count with optional generated keys
    Update {
        count: i64,
        keys: Option<MockRows>,
    },
}

/// Shared driver state: scripts, execution log, lifecycle counters
#[derive(Default)]
pub struct MockDb {
    responses: Mutex<HashMap<String, MockResponse>>,
    pub executed: Mutex<Vec<(String, Vec<Value>)>>,
    pub prepares: AtomicUsize,
    pub connections: AtomicUsize,
    pub commits: AtomicUsize,
    pub rollbacks: AtomicUsize,
}

impl MockDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Script a response for `sql`
    pub fn on(&self, sql: &str, response: MockResponse) {
        self.responses.lock().unwrap().insert(sql.to_string(), response);
    }

    /// Script a single result set for `sql`
    pub fn on_rows(&self, sql: &str, rows: MockRows) {
        self.on(sql, MockResponse::Rows(vec![rows]));
    }

    /// Script an update count for `sql`
    pub fn on_update(&self, sql: &str, count: i64) {
        self.on(sql, MockResponse::Update { count, keys: None });
    }

    fn response(&self, sql: &str) -> Result<MockResponse> {
        self.responses
            .lock()
            .unwrap()
            .get(sql)
            .cloned()
            .ok_or_else(|| Error::driver(format!("no scripted response for: {}", sql)))
    }

    /// Number of recorded executions of `sql`
    pub fn execution_count(&self, sql: &str) -> usize {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == sql)
            .count()
    }

    /// Bound parameters of the `n`th recorded execution of `sql`
    pub fn params_of(&self, sql: &str, n: usize) -> Option<Vec<Value>> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| s == sql)
            .nth(n)
            .map(|(_, p)| p.clone())
    }
}

/// Data source handing out connections over the shared state
pub struct MockDataSource {
    pub db: Arc<MockDb>,
}

impl MockDataSource {
    pub fn new(db: Arc<MockDb>) -> Self {
        Self { db }
    }
}

impl DataSource for MockDataSource {
    fn connection(&self) -> Result<Box<dyn Connection>> {
        self.db.connections.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnection {
            db: self.db.clone(),
            open: Arc::new(AtomicBool::new(true)),
            auto_commit: true,
        }))
    }
}

pub struct MockConnection {
    db: Arc<MockDb>,
    open: Arc<AtomicBool>,
    auto_commit: bool,
}

impl Connection for MockConnection {
    fn prepare(
        &mut self,
        sql: &str,
        _keys: &KeyRetrieval,
        _result_set_type: ResultSetType,
    ) -> Result<Box<dyn PreparedStatement>> {
        self.db.prepares.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStatement::new(
            self.db.clone(),
            self.open.clone(),
            Some(sql.to_string()),
        )))
    }

    fn prepare_callable(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement>> {
        self.db.prepares.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStatement::new(
            self.db.clone(),
            self.open.clone(),
            Some(sql.to_string()),
        )))
    }

    fn create_statement(
        &mut self,
        _result_set_type: ResultSetType,
    ) -> Result<Box<dyn PreparedStatement>> {
        Ok(Box::new(MockStatement::new(
            self.db.clone(),
            self.open.clone(),
            None,
        )))
    }

    fn supports_multiple_result_sets(&self) -> bool {
        true
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()> {
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.db.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        self.db.rollbacks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.open.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        !self.open.load(Ordering::SeqCst)
    }
}

pub struct MockStatement {
    db: Arc<MockDb>,
    connection_open: Arc<AtomicBool>,
    sql: Option<String>,
    params: BTreeMap<usize, Value>,
    batch: Vec<Vec<Value>>,
    results: Vec<MockRows>,
    update_count: i64,
    keys: Option<MockRows>,
    current: usize,
    executed: bool,
    timeout: Option<u64>,
}

impl MockStatement {
    fn new(db: Arc<MockDb>, connection_open: Arc<AtomicBool>, sql: Option<String>) -> Self {
        Self {
            db,
            connection_open,
            sql,
            params: BTreeMap::new(),
            batch: Vec::new(),
            results: Vec::new(),
            update_count: -1,
            keys: None,
            current: 0,
            executed: false,
            timeout: None,
        }
    }

    fn ordered_params(&self) -> Vec<Value> {
        self.params.values().cloned().collect()
    }

    fn run(&mut self, sql: &str) -> Result<bool> {
        let response = self.db.response(sql)?;
        self.db
            .executed
            .lock()
            .unwrap()
            .push((sql.to_string(), self.ordered_params()));
        self.current = 0;
        self.executed = true;
        match response {
            MockResponse::Rows(sets) => {
                self.results = sets;
                self.update_count = -1;
                self.keys = None;
                Ok(true)
            }
            MockResponse::Update { count, keys } => {
                self.results = Vec::new();
                self.update_count = count;
                self.keys = keys;
                Ok(false)
            }
        }
    }
}

impl PreparedStatement for MockStatement {
    fn set_parameter(&mut self, index: usize, value: Value) -> Result<()> {
        self.params.insert(index, value);
        Ok(())
    }

    fn set_null(&mut self, index: usize, _jdbc_type: JdbcType) -> Result<()> {
        self.params.insert(index, Value::Null);
        Ok(())
    }

    fn register_out_parameter(&mut self, _index: usize, _jdbc_type: JdbcType) -> Result<()> {
        Ok(())
    }

    fn set_query_timeout(&mut self, seconds: u64) -> Result<()> {
        self.timeout = Some(seconds);
        Ok(())
    }

    fn execute(&mut self) -> Result<bool> {
        let sql = self
            .sql
            .clone()
            .ok_or_else(|| Error::driver("statement has no prepared sql"))?;
        self.run(&sql)
    }

    fn execute_sql(&mut self, sql: &str) -> Result<bool> {
        self.run(sql)
    }

    fn update_count(&mut self) -> Result<i64> {
        if self.current == 0 && self.update_count >= 0 {
            Ok(self.update_count)
        } else {
            Ok(-1)
        }
    }

    fn result_set(&mut self) -> Result<Option<Box<dyn ResultSet>>> {
        Ok(self
            .results
            .get(self.current)
            .cloned()
            .map(|rows| Box::new(MockResultSet::new(rows)) as Box<dyn ResultSet>))
    }

    fn more_results(&mut self) -> Result<bool> {
        self.current += 1;
        Ok(self.current < self.results.len())
    }

    fn generated_keys(&mut self) -> Result<Option<Box<dyn ResultSet>>> {
        Ok(self
            .keys
            .clone()
            .map(|rows| Box::new(MockResultSet::new(rows)) as Box<dyn ResultSet>))
    }

    fn add_batch(&mut self) -> Result<()> {
        self.batch.push(self.ordered_params());
        self.params.clear();
        Ok(())
    }

    fn execute_batch(&mut self) -> Result<Vec<i64>> {
        let sql = self
            .sql
            .clone()
            .ok_or_else(|| Error::driver("statement has no prepared sql"))?;
        let response = self.db.response(&sql)?;
        let count = match response {
            MockResponse::Update { count, keys } => {
                self.keys = keys;
                count
            }
            MockResponse::Rows(_) => {
                return Err(Error::driver("batch on a query statement"));
            }
        };
        let entries = std::mem::take(&mut self.batch);
        let mut counts = Vec::with_capacity(entries.len());
        for entry in entries {
            self.db.executed.lock().unwrap().push((sql.clone(), entry));
            counts.push(count);
        }
        Ok(counts)
    }

    fn out_parameter(&mut self, _index: usize) -> Result<Value> {
        Ok(Value::Null)
    }

    fn connection_open(&self) -> bool {
        self.connection_open.load(Ordering::SeqCst)
    }

    fn close(&mut self) {}
}

pub struct MockResultSet {
    rows: MockRows,
    /// 0 = before the first row
    position: usize,
}

impl MockResultSet {
    fn new(rows: MockRows) -> Self {
        Self { rows, position: 0 }
    }

    fn current_row(&self) -> Result<&Vec<Value>> {
        if self.position == 0 || self.position > self.rows.rows.len() {
            return Err(Error::driver("result set is not positioned on a row"));
        }
        Ok(&self.rows.rows[self.position - 1])
    }
}

impl ResultSet for MockResultSet {
    fn metadata(&self) -> &ResultSetMetadata {
        &self.rows.metadata
    }

    fn next(&mut self) -> Result<bool> {
        if self.position < self.rows.rows.len() {
            self.position += 1;
            Ok(true)
        } else {
            self.position = self.rows.rows.len() + 1;
            Ok(false)
        }
    }

    fn supports_absolute(&self) -> bool {
        true
    }

    fn absolute(&mut self, row: usize) -> Result<bool> {
        self.position = row;
        Ok(row <= self.rows.rows.len())
    }

    fn get_by_index(&self, index: usize) -> Result<Value> {
        let row = self.current_row()?;
        row.get(index - 1)
            .cloned()
            .ok_or_else(|| Error::driver(format!("no column at index {}", index)))
    }

    fn get_by_label(&self, label: &str) -> Result<Value> {
        let index = self
            .rows
            .metadata
            .index_of(label)
            .ok_or_else(|| Error::driver(format!("no column labelled '{}'", label)))?;
        self.get_by_index(index)
    }

    fn close(&mut self) {}
}
