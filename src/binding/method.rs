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

//! Compiled mapper methods
//!
//! A [`MapperMethod`] binds one interface method to its mapped statement:
//! the resolved statement id and kind, plus the declared signature used to
//! coerce arguments in and the result shape out.

use crate::config::Configuration;
use crate::core::{meta, Error, ObjectMap, Result, Value};
use crate::executor::{Cursor, ResultHandler};
use crate::mapping::{RowBounds, StatementKind};
use crate::session::SqlSession;

use super::params::Args;
use super::registry::{MethodSpec, ReturnShape};
use super::resolver::resolve_parameter;

/// The statement a mapper method routes to
#[derive(Debug, Clone)]
pub struct SqlCommand {
    /// Full statement id (`namespace.method`)
    pub name: String,
    /// Statement kind
    pub kind: StatementKind,
}

impl SqlCommand {
    /// Resolve `method` on `namespace`, falling back to super-interfaces
    fn resolve(config: &Configuration, namespace: &str, method: &str) -> Result<Self> {
        let mut candidates = vec![namespace.to_string()];
        collect_super_namespaces(config, namespace, &mut candidates);
        for candidate in &candidates {
            let id = format!("{}.{}", candidate, method);
            if config.has_statement(&id) {
                let statement = config.statement(&id)?;
                return Ok(SqlCommand {
                    name: id,
                    kind: statement.kind,
                });
            }
        }
        Err(Error::StatementNotFound(format!(
            "{}.{}",
            namespace, method
        )))
    }
}

fn collect_super_namespaces(config: &Configuration, namespace: &str, out: &mut Vec<String>) {
    if let Some(spec) = config.mapper_registry.get(namespace) {
        for parent in &spec.super_namespaces {
            if !out.contains(parent) {
                out.push(parent.clone());
                collect_super_namespaces(config, parent, out);
            }
        }
    }
}

/// One compiled, dispatchable mapper method
#[derive(Debug, Clone)]
pub struct MapperMethod {
    command: SqlCommand,
    spec: MethodSpec,
}

impl MapperMethod {
    /// Compile `namespace.method` against the configuration
    pub fn compile(config: &Configuration, namespace: &str, method: &str) -> Result<Self> {
        let (_, spec) = config
            .mapper_registry
            .find_method(namespace, method)
            .ok_or_else(|| Error::MethodNotResolved {
                namespace: namespace.to_string(),
                method: method.to_string(),
            })?;
        let command = SqlCommand::resolve(config, namespace, method)?;
        Ok(Self {
            command,
            spec: spec.clone(),
        })
    }

    /// The resolved statement id
    pub fn statement_id(&self) -> &str {
        &self.command.name
    }

    /// Dispatch the call and coerce the result to the declared shape
    pub fn execute(
        &self,
        session: &mut SqlSession,
        args: Args,
        row_bounds: Option<RowBounds>,
        result_handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Value> {
        let parameter = resolve_parameter(&self.spec, args);
        match self.command.kind {
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete => {
                let mut parameter = parameter;
                let rows = session.update(&self.command.name, &mut parameter)?;
                Ok(coerce_row_count(rows, self.spec.return_shape))
            }
            StatementKind::Flush => {
                session.flush_statements()?;
                Ok(Value::Null)
            }
            StatementKind::Select => {
                let bounds = row_bounds.unwrap_or_default();
                if let Some(handler) = result_handler {
                    session.select_with_handler(&self.command.name, parameter, bounds, handler)?;
                    return Ok(Value::Null);
                }
                match self.spec.return_shape {
                    ReturnShape::Many => Ok(Value::Array(session.select_list_bounds(
                        &self.command.name,
                        parameter,
                        bounds,
                    )?)),
                    ReturnShape::MapKeyed => {
                        let key = self.spec.map_key.as_deref().ok_or_else(|| {
                            Error::configuration(format!(
                                "method '{}' returns a keyed map but declares no map key",
                                self.command.name
                            ))
                        })?;
                        let rows =
                            session.select_list_bounds(&self.command.name, parameter, bounds)?;
                        let mut map = ObjectMap::new();
                        for row in rows {
                            let key_value = meta::get_path(&row, key)?;
                            let key_string = key_value.as_string().unwrap_or_default();
                            map.insert(key_string, row);
                        }
                        Ok(Value::Object(map))
                    }
                    ReturnShape::Cursor => Err(Error::configuration(format!(
                        "method '{}' returns a cursor, call it through cursor()",
                        self.command.name
                    ))),
                    ReturnShape::Void => {
                        session.select_list_bounds(&self.command.name, parameter, bounds)?;
                        Ok(Value::Null)
                    }
                    _ => session.select_one_bounds(&self.command.name, parameter, bounds),
                }
            }
        }
    }

    /// Dispatch a cursor-returning call
    pub fn execute_cursor(
        &self,
        session: &mut SqlSession,
        args: Args,
        row_bounds: Option<RowBounds>,
    ) -> Result<Cursor> {
        if self.command.kind != StatementKind::Select {
            return Err(Error::configuration(format!(
                "cursor call on non-select statement '{}'",
                self.command.name
            )));
        }
        let parameter = resolve_parameter(&self.spec, args);
        session.select_cursor(
            &self.command.name,
            parameter,
            row_bounds.unwrap_or_default(),
        )
    }
}

/// Coerce an affected-row count to the declared return shape
fn coerce_row_count(rows: i64, shape: ReturnShape) -> Value {
    match shape {
        ReturnShape::Void => Value::Null,
        ReturnShape::AffectedBool => Value::Boolean(rows > 0),
        _ => Value::Integer(rows),
    }
}
