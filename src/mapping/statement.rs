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

//! Mapped statements: the compiled representation of one SQL operation
//!
//! Built once during configuration load and immutable afterwards; sessions
//! share them through the configuration registry.

use std::str::FromStr;

use crate::core::{Error, Result, Value};
use crate::driver::ResultSetType;
use crate::scripting::SqlSource;

use super::bound_sql::BoundSql;

/// The SQL operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Flush,
}

impl StatementKind {
    /// True for INSERT/UPDATE/DELETE
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }
}

impl FromStr for StatementKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SELECT" => Ok(StatementKind::Select),
            "INSERT" => Ok(StatementKind::Insert),
            "UPDATE" => Ok(StatementKind::Update),
            "DELETE" => Ok(StatementKind::Delete),
            "FLUSH" => Ok(StatementKind::Flush),
            other => Err(Error::configuration(format!(
                "unknown statement kind '{}'",
                other
            ))),
        }
    }
}

/// How the statement reaches the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatementType {
    /// Literal SQL on an unparameterized statement
    Simple,
    /// Prepared statement with `?` binding
    #[default]
    Prepared,
    /// Callable statement with OUT parameter support
    Callable,
}

impl FromStr for StatementType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "STATEMENT" => Ok(StatementType::Simple),
            "PREPARED" => Ok(StatementType::Prepared),
            "CALLABLE" => Ok(StatementType::Callable),
            other => Err(Error::configuration(format!(
                "unknown statement type '{}'",
                other
            ))),
        }
    }
}

/// Generated-key strategy of a statement
#[derive(Debug, Clone, PartialEq, Default)]
pub enum KeyGeneratorSpec {
    /// No key generation
    #[default]
    None,
    /// Read driver-generated keys after execution and write them back into
    /// the parameter object at the key properties
    GeneratedKeys {
        key_properties: Vec<String>,
        key_columns: Vec<String>,
    },
    /// Run a companion SELECT before or after the main statement
    SelectKey {
        statement_id: String,
        key_properties: Vec<String>,
        before: bool,
    },
}

/// The compiled representation of one SQL operation
#[derive(Debug, Clone)]
pub struct MappedStatement {
    /// Stable identifier: `namespace.methodName`
    pub id: String,
    /// Operation kind
    pub kind: StatementKind,
    /// Driver statement strategy
    pub statement_type: StatementType,
    /// SQL production for this statement
    pub sql_source: SqlSource,
    /// Result maps applied per result set, in order
    pub result_map_ids: Vec<String>,
    /// Namespace whose second-level cache this statement participates in
    pub cache_namespace: Option<String>,
    /// Generated-key strategy
    pub key_generator: KeyGeneratorSpec,
    /// Flush the namespace cache before running
    pub flush_cache: bool,
    /// Serve and stage results through the namespace cache
    pub use_cache: bool,
    /// Statement timeout in seconds
    pub timeout: Option<u64>,
    /// Rows of one logical aggregate arrive contiguously
    pub result_ordered: bool,
    /// Names of the result sets a multi-result-set statement yields
    pub result_sets: Vec<String>,
    /// Requested driver scroll capability
    pub result_set_type: ResultSetType,
    /// Vendor the statement is specific to
    pub database_id: Option<String>,
}

impl MappedStatement {
    /// Start building a statement
    pub fn builder(
        id: impl Into<String>,
        kind: StatementKind,
        sql_source: SqlSource,
    ) -> MappedStatementBuilder {
        let is_select = kind == StatementKind::Select;
        MappedStatementBuilder {
            statement: MappedStatement {
                id: id.into(),
                kind,
                statement_type: StatementType::Prepared,
                sql_source,
                result_map_ids: Vec::new(),
                cache_namespace: None,
                key_generator: KeyGeneratorSpec::None,
                flush_cache: !is_select,
                use_cache: is_select,
                timeout: None,
                result_ordered: false,
                result_sets: Vec::new(),
                result_set_type: ResultSetType::Default,
                database_id: None,
            },
        }
    }

    /// The namespace part of the statement id
    pub fn namespace(&self) -> &str {
        self.id.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("")
    }

    /// Produce this invocation's bound SQL
    pub fn bound_sql(
        &self,
        registry: &crate::types::TypeHandlerRegistry,
        parameter: &Value,
        database_id: Option<&str>,
    ) -> Result<BoundSql> {
        self.sql_source.bound_sql(registry, parameter, database_id)
    }
}

/// Builder for [`MappedStatement`]
pub struct MappedStatementBuilder {
    statement: MappedStatement,
}

impl MappedStatementBuilder {
    pub fn statement_type(mut self, statement_type: StatementType) -> Self {
        self.statement.statement_type = statement_type;
        self
    }

    pub fn result_map(mut self, id: impl Into<String>) -> Self {
        self.statement.result_map_ids.push(id.into());
        self
    }

    pub fn result_maps(mut self, ids: Vec<String>) -> Self {
        self.statement.result_map_ids = ids;
        self
    }

    pub fn cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.statement.cache_namespace = Some(namespace.into());
        self
    }

    pub fn key_generator(mut self, spec: KeyGeneratorSpec) -> Self {
        self.statement.key_generator = spec;
        self
    }

    pub fn flush_cache(mut self, flush: bool) -> Self {
        self.statement.flush_cache = flush;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.statement.use_cache = use_cache;
        self
    }

    pub fn timeout(mut self, seconds: u64) -> Self {
        self.statement.timeout = Some(seconds);
        self
    }

    pub fn result_ordered(mut self, ordered: bool) -> Self {
        self.statement.result_ordered = ordered;
        self
    }

    pub fn result_sets(mut self, names: Vec<String>) -> Self {
        self.statement.result_sets = names;
        self
    }

    pub fn result_set_type(mut self, result_set_type: ResultSetType) -> Self {
        self.statement.result_set_type = result_set_type;
        self
    }

    pub fn database_id(mut self, database_id: impl Into<String>) -> Self {
        self.statement.database_id = Some(database_id.into());
        self
    }

    pub fn build(self) -> MappedStatement {
        self.statement
    }
}
