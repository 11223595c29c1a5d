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

//! Driver contract
//!
//! The engine executes against any relational driver exposing these traits:
//! prepare / execute / result-set iteration / generated keys. Indexes are
//! 1-based for parameters and columns, matching the wire conventions of the
//! drivers this contract abstracts. Drivers fold their NULL indicator into
//! [`Value::Null`].

use crate::core::{Result, Value};
use crate::types::JdbcType;

/// How generated keys should be made available after an insert
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeyRetrieval {
    /// No generated keys requested
    #[default]
    None,
    /// Driver-default generated-keys result set
    GeneratedKeys,
    /// Generated keys restricted to the named columns
    Columns(Vec<String>),
}

/// Requested result-set scroll capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSetType {
    /// Use the driver default
    #[default]
    Default,
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

/// A factory of driver connections
pub trait DataSource: Send + Sync {
    /// Open a new connection
    fn connection(&self) -> Result<Box<dyn Connection>>;
}

/// One driver connection
pub trait Connection: Send {
    /// Prepare a parameterized statement
    fn prepare(
        &mut self,
        sql: &str,
        keys: &KeyRetrieval,
        result_set_type: ResultSetType,
    ) -> Result<Box<dyn PreparedStatement>>;

    /// Prepare a callable (stored-procedure) statement
    fn prepare_callable(&mut self, sql: &str) -> Result<Box<dyn PreparedStatement>>;

    /// Create an unparameterized statement for literal SQL
    fn create_statement(
        &mut self,
        result_set_type: ResultSetType,
    ) -> Result<Box<dyn PreparedStatement>>;

    /// Whether the driver can yield several result sets per execute
    fn supports_multiple_result_sets(&self) -> bool {
        false
    }

    fn auto_commit(&self) -> bool;

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn close(&mut self) -> Result<()>;

    fn is_closed(&self) -> bool;
}

/// One prepared (or literal) statement
pub trait PreparedStatement: Send {
    /// Bind a parameter (1-based index)
    fn set_parameter(&mut self, index: usize, value: Value) -> Result<()>;

    /// Bind NULL with a JDBC type hint (1-based index)
    fn set_null(&mut self, index: usize, jdbc_type: JdbcType) -> Result<()>;

    /// Register an OUT parameter of a callable statement
    fn register_out_parameter(&mut self, index: usize, jdbc_type: JdbcType) -> Result<()>;

    /// Apply a query timeout in seconds
    fn set_query_timeout(&mut self, seconds: u64) -> Result<()>;

    /// Execute the prepared statement; true if the first result is a result set
    fn execute(&mut self) -> Result<bool>;

    /// Execute literal SQL on an unparameterized statement
    fn execute_sql(&mut self, sql: &str) -> Result<bool>;

    /// Update count of the current result, -1 when the result is a result set
    fn update_count(&mut self) -> Result<i64>;

    /// The current result set, if the current result is one
    fn result_set(&mut self) -> Result<Option<Box<dyn ResultSet>>>;

    /// Advance to the next result; true if it is a result set
    fn more_results(&mut self) -> Result<bool>;

    /// Generated keys of the last insert, when requested
    fn generated_keys(&mut self) -> Result<Option<Box<dyn ResultSet>>>;

    /// Queue the current parameter bindings as one batch entry
    fn add_batch(&mut self) -> Result<()>;

    /// Execute all queued batch entries, returning per-entry update counts
    fn execute_batch(&mut self) -> Result<Vec<i64>>;

    /// Read a registered OUT parameter after execution
    fn out_parameter(&mut self, index: usize) -> Result<Value>;

    /// Whether this statement's connection is still open
    fn connection_open(&self) -> bool {
        true
    }

    fn close(&mut self);
}

/// Metadata for one result-set column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Underlying column name
    pub name: String,
    /// Column label (alias when the query renames it)
    pub label: String,
    /// Driver-reported JDBC type
    pub jdbc_type: JdbcType,
    /// Driver-reported host type name
    pub type_name: String,
}

/// Result-set shape metadata
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSetMetadata {
    pub columns: Vec<ColumnMetadata>,
}

impl ResultSetMetadata {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Label of the column at `index` (1-based)
    pub fn label(&self, index: usize) -> Option<&str> {
        self.columns.get(index - 1).map(|c| c.label.as_str())
    }

    /// 1-based index of the column with `label` (case-insensitive)
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.label.eq_ignore_ascii_case(label))
            .map(|i| i + 1)
    }

    /// JDBC type of the column with `label`
    pub fn jdbc_type_of(&self, label: &str) -> Option<JdbcType> {
        self.index_of(label)
            .and_then(|i| self.columns.get(i - 1))
            .map(|c| c.jdbc_type)
    }
}

/// One forward-iterable result set
pub trait ResultSet {
    fn metadata(&self) -> &ResultSetMetadata;

    /// Advance to the next row; false at the end
    fn next(&mut self) -> Result<bool>;

    /// Whether [`ResultSet::absolute`] positioning is available
    fn supports_absolute(&self) -> bool {
        false
    }

    /// Jump to the 1-based row position
    fn absolute(&mut self, row: usize) -> Result<bool>;

    /// Read the column at the 1-based index of the current row
    fn get_by_index(&self, index: usize) -> Result<Value>;

    /// Read the column with `label` of the current row
    fn get_by_label(&self, label: &str) -> Result<Value>;

    fn close(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ResultSetMetadata {
        ResultSetMetadata {
            columns: vec![
                ColumnMetadata {
                    name: "id".to_string(),
                    label: "post_id".to_string(),
                    jdbc_type: JdbcType::BigInt,
                    type_name: "Integer".to_string(),
                },
                ColumnMetadata {
                    name: "subject".to_string(),
                    label: "subject".to_string(),
                    jdbc_type: JdbcType::Varchar,
                    type_name: "Text".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_metadata_lookup() {
        let meta = meta();
        assert_eq!(meta.column_count(), 2);
        assert_eq!(meta.label(1), Some("post_id"));
        assert_eq!(meta.index_of("SUBJECT"), Some(2));
        assert_eq!(meta.jdbc_type_of("post_id"), Some(JdbcType::BigInt));
        assert_eq!(meta.index_of("missing"), None);
    }
}
