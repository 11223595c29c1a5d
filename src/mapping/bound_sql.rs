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

//! Bound SQL: the executable form of a statement invocation

use crate::core::{meta, ObjectMap, Result, Value};

use super::parameter::ParameterMapping;

/// The `?`-form SQL of one invocation plus everything needed to bind it
///
/// `additional_parameters` carries bindings produced during dynamic SQL
/// evaluation (`<bind>` variables and `__frch_` foreach items); they shadow
/// the parameter object during binding.
#[derive(Debug, Clone)]
pub struct BoundSql {
    /// Executable SQL with `?` placeholders
    pub sql: String,
    /// One mapping per `?`, in placeholder order
    pub parameter_mappings: Vec<ParameterMapping>,
    /// The caller's parameter object
    pub parameter: Value,
    /// Runtime bindings created during dynamic evaluation
    pub additional_parameters: ObjectMap,
}

impl BoundSql {
    /// Create bound SQL without additional runtime bindings
    pub fn new(sql: String, parameter_mappings: Vec<ParameterMapping>, parameter: Value) -> Self {
        Self {
            sql,
            parameter_mappings,
            parameter,
            additional_parameters: ObjectMap::new(),
        }
    }

    /// True if a runtime binding exists for the head of `property`
    pub fn has_additional_parameter(&self, property: &str) -> bool {
        let head = property
            .split(['.', '['])
            .next()
            .unwrap_or(property);
        self.additional_parameters.contains_key(head)
    }

    /// Read a runtime binding (supports nested paths below the binding)
    pub fn additional_parameter(&self, property: &str) -> Result<Value> {
        let scope = Value::Object(self.additional_parameters.clone());
        meta::get_path(&scope, property)
    }

    /// Create or replace a runtime binding
    pub fn set_additional_parameter(&mut self, name: impl Into<String>, value: Value) {
        self.additional_parameters.insert(name.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additional_parameters_shadow() {
        let mut bound = BoundSql::new("select 1".to_string(), Vec::new(), Value::Null);
        assert!(!bound.has_additional_parameter("__frch_item_0"));

        bound.set_additional_parameter("__frch_item_0", Value::Integer(5));
        assert!(bound.has_additional_parameter("__frch_item_0"));
        assert_eq!(
            bound.additional_parameter("__frch_item_0").unwrap(),
            Value::Integer(5)
        );
    }

    #[test]
    fn test_nested_additional_parameter() {
        let mut bound = BoundSql::new("select 1".to_string(), Vec::new(), Value::Null);
        let mut item = ObjectMap::new();
        item.insert("sku".to_string(), Value::text("A1"));
        bound.set_additional_parameter("__frch_item_0", Value::Object(item));

        assert!(bound.has_additional_parameter("__frch_item_0.sku"));
        assert_eq!(
            bound.additional_parameter("__frch_item_0.sku").unwrap(),
            Value::text("A1")
        );
    }
}
