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

//! Statement handling: prepare, parameterize, execute, generated keys
//!
//! One handler per statement strategy: literal SQL on a plain statement,
//! `?`-bound prepared statements, and callables with OUT parameter
//! registration. The handler also applies the effective timeout, the lesser
//! of the statement's and the transaction's remaining budget.

use log::debug;

use crate::config::Configuration;
use crate::core::{meta, Error, Result, Value};
use crate::driver::{Connection, KeyRetrieval, PreparedStatement, ResultSet};
use crate::mapping::{BoundSql, KeyGeneratorSpec, MappedStatement, ParameterMode, StatementType};
use crate::types::JdbcType;

/// Per-invocation statement handler
pub struct StatementHandler<'a> {
    config: &'a Configuration,
    ms: &'a MappedStatement,
    bound_sql: &'a BoundSql,
}

impl<'a> StatementHandler<'a> {
    pub fn new(
        config: &'a Configuration,
        ms: &'a MappedStatement,
        bound_sql: &'a BoundSql,
    ) -> Self {
        Self {
            config,
            ms,
            bound_sql,
        }
    }

    /// Create the driver statement and apply the effective timeout
    pub fn prepare(
        &self,
        connection: &mut dyn Connection,
        transaction_timeout: Option<u64>,
    ) -> Result<Box<dyn PreparedStatement>> {
        debug!("preparing: {}", self.bound_sql.sql);
        let mut statement = match self.ms.statement_type {
            StatementType::Simple => connection.create_statement(self.ms.result_set_type)?,
            StatementType::Prepared => connection.prepare(
                &self.bound_sql.sql,
                &self.key_retrieval(),
                self.ms.result_set_type,
            )?,
            StatementType::Callable => connection.prepare_callable(&self.bound_sql.sql)?,
        };
        if let Some(timeout) = effective_timeout(
            self.ms
                .timeout
                .or(self.config.settings.default_statement_timeout),
            transaction_timeout,
        ) {
            statement.set_query_timeout(timeout)?;
        }
        Ok(statement)
    }

    /// Bind parameters (no-op for literal statements)
    pub fn parameterize(&self, statement: &mut dyn PreparedStatement) -> Result<()> {
        if self.ms.statement_type == StatementType::Simple {
            return Ok(());
        }
        set_parameters(statement, self.config, self.bound_sql)
    }

    /// Execute; true if the first result is a result set
    pub fn execute(&self, statement: &mut dyn PreparedStatement) -> Result<bool> {
        if self.ms.statement_type == StatementType::Simple {
            statement.execute_sql(&self.bound_sql.sql)
        } else {
            statement.execute()
        }
    }

    /// Read OUT parameters of a callable back into the parameter object
    pub fn handle_output_parameters(
        &self,
        statement: &mut dyn PreparedStatement,
        parameter: &mut Value,
    ) -> Result<()> {
        if self.ms.statement_type != StatementType::Callable {
            return Ok(());
        }
        for (i, mapping) in self.bound_sql.parameter_mappings.iter().enumerate() {
            if mapping.is_output() {
                let value = statement.out_parameter(i + 1)?;
                meta::set_path(parameter, &mapping.property, value)?;
            }
        }
        Ok(())
    }

    fn key_retrieval(&self) -> KeyRetrieval {
        match &self.ms.key_generator {
            KeyGeneratorSpec::GeneratedKeys { key_columns, .. } => {
                if key_columns.is_empty() {
                    KeyRetrieval::GeneratedKeys
                } else {
                    KeyRetrieval::Columns(key_columns.clone())
                }
            }
            _ => KeyRetrieval::None,
        }
    }
}

/// The lesser of the statement timeout and the transaction's remaining time
pub fn effective_timeout(
    statement_timeout: Option<u64>,
    transaction_timeout: Option<u64>,
) -> Option<u64> {
    match (statement_timeout, transaction_timeout) {
        (Some(s), Some(t)) => Some(s.min(t)),
        (Some(s), None) => Some(s),
        (None, Some(t)) => Some(t),
        (None, None) => None,
    }
}

/// Bind every IN parameter and register every OUT parameter, in order
///
/// Value resolution per mapping: a dynamic-evaluation runtime binding wins,
/// then a simple-typed parameter binds itself, then the property is read
/// off the parameter object.
pub fn set_parameters(
    statement: &mut dyn PreparedStatement,
    config: &Configuration,
    bound_sql: &BoundSql,
) -> Result<()> {
    for (i, mapping) in bound_sql.parameter_mappings.iter().enumerate() {
        let index = i + 1;
        if mapping.mode == ParameterMode::Out {
            statement
                .register_out_parameter(index, mapping.jdbc_type.unwrap_or(JdbcType::Other))?;
            continue;
        }
        let value = if bound_sql.has_additional_parameter(&mapping.property) {
            bound_sql.additional_parameter(&mapping.property)?
        } else if config
            .type_handlers
            .has_handler_for_value(&bound_sql.parameter)
        {
            bound_sql.parameter.clone()
        } else {
            meta::get_path(&bound_sql.parameter, &mapping.property)?
        };
        if mapping.mode == ParameterMode::InOut {
            statement
                .register_out_parameter(index, mapping.jdbc_type.unwrap_or(JdbcType::Other))?;
        }
        let handler = config.type_handlers.resolve(
            mapping.type_handler.as_deref(),
            mapping.data_type,
            mapping.jdbc_type,
        )?;
        handler.set_parameter(statement, index, &value, mapping.jdbc_type)?;
    }
    Ok(())
}

/// Write driver-generated key columns back into the parameter object(s)
///
/// An array parameter (multi-row insert) consumes one key row per element;
/// a single parameter object consumes the first key row.
pub fn assign_generated_keys(
    result_set: &mut dyn ResultSet,
    key_properties: &[String],
    key_columns: &[String],
    parameter: &mut Value,
) -> Result<()> {
    if key_properties.is_empty() {
        return Ok(());
    }
    match parameter {
        Value::Array(items) => {
            for item in items.iter_mut() {
                if !result_set.next()? {
                    break;
                }
                assign_key_row(result_set, key_properties, key_columns, item)?;
            }
        }
        single => {
            if result_set.next()? {
                assign_key_row(result_set, key_properties, key_columns, single)?;
            }
        }
    }
    Ok(())
}

fn assign_key_row(
    result_set: &mut dyn ResultSet,
    key_properties: &[String],
    key_columns: &[String],
    target: &mut Value,
) -> Result<()> {
    for (i, property) in key_properties.iter().enumerate() {
        let value = match key_columns.get(i) {
            Some(column) => result_set.get_by_label(column)?,
            None => result_set.get_by_index(i + 1)?,
        };
        if target.is_simple() && !matches!(target, Value::Null) {
            return Err(Error::AmbiguousParameter(format!(
                "cannot write generated key '{}' into a scalar parameter",
                property
            )));
        }
        meta::set_path(target, property, value)?;
    }
    Ok(())
}
