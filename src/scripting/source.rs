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

//! SQL sources: from mapped statement to executable SQL
//!
//! A `Static` source is a finished `?`-form string with its parameter
//! mappings. A `Raw` source is a static source built eagerly at load time
//! from a non-dynamic node tree. A `Dynamic` source evaluates its tree per
//! invocation and rewrites the produced `#{}` placeholders to `?`.

use crate::core::{meta, DataType, Result, Value};
use crate::mapping::{BoundSql, ParameterMapping};
use crate::parsing::GenericTokenParser;
use crate::types::TypeHandlerRegistry;

use super::context::DynamicContext;
use super::node::SqlNode;

/// SQL production strategy of one mapped statement
#[derive(Debug, Clone)]
pub enum SqlSource {
    /// Finished `?`-form SQL
    Static {
        sql: String,
        parameter_mappings: Vec<ParameterMapping>,
    },
    /// Static source built eagerly from a non-dynamic tree at load time
    Raw {
        sql: String,
        parameter_mappings: Vec<ParameterMapping>,
    },
    /// Node tree evaluated per invocation
    Dynamic { root: SqlNode },
}

impl SqlSource {
    /// Create a static source
    pub fn static_sql(sql: impl Into<String>, parameter_mappings: Vec<ParameterMapping>) -> Self {
        SqlSource::Static {
            sql: sql.into(),
            parameter_mappings,
        }
    }

    /// Build a raw source by evaluating a non-dynamic tree now
    pub fn raw(root: &SqlNode, registry: &TypeHandlerRegistry) -> Result<Self> {
        let mut ctx = DynamicContext::new(&Value::Null, None);
        root.apply(&mut ctx)?;
        let sql = ctx.sql();
        let (sql, parameter_mappings) =
            build_static_sql(&sql, registry, &Value::Null, &Value::Null)?;
        Ok(SqlSource::Raw {
            sql,
            parameter_mappings,
        })
    }

    /// Create a dynamic source around a node tree
    pub fn dynamic(root: SqlNode) -> Self {
        SqlSource::Dynamic { root }
    }

    /// Pick raw or dynamic depending on the tree
    pub fn from_node(root: SqlNode, registry: &TypeHandlerRegistry) -> Result<Self> {
        if root.is_dynamic() {
            Ok(SqlSource::dynamic(root))
        } else {
            SqlSource::raw(&root, registry)
        }
    }

    /// Produce the bound SQL of one invocation
    pub fn bound_sql(
        &self,
        registry: &TypeHandlerRegistry,
        parameter: &Value,
        database_id: Option<&str>,
    ) -> Result<BoundSql> {
        match self {
            SqlSource::Static {
                sql,
                parameter_mappings,
            }
            | SqlSource::Raw {
                sql,
                parameter_mappings,
            } => Ok(BoundSql::new(
                sql.clone(),
                parameter_mappings.clone(),
                parameter.clone(),
            )),
            SqlSource::Dynamic { root } => {
                let mut ctx = DynamicContext::new(parameter, database_id);
                root.apply(&mut ctx)?;
                let produced = ctx.sql();
                let bindings_scope = Value::Object(ctx.bindings().clone());
                let (sql, parameter_mappings) =
                    build_static_sql(&produced, registry, parameter, &bindings_scope)?;
                let mut bound = BoundSql::new(sql, parameter_mappings, parameter.clone());
                bound.additional_parameters = ctx.into_bindings();
                Ok(bound)
            }
        }
    }
}

/// Rewrite `#{...}` placeholders to `?` and extract parameter descriptors
///
/// Host-type inference per placeholder: a runtime binding's value type wins,
/// then a simple-typed parameter's own registered handler, then the property
/// type read off the parameter object, then untyped.
fn build_static_sql(
    sql: &str,
    registry: &TypeHandlerRegistry,
    parameter: &Value,
    bindings_scope: &Value,
) -> Result<(String, Vec<ParameterMapping>)> {
    let mut mappings: Vec<ParameterMapping> = Vec::new();
    let parser = GenericTokenParser::new("#{", "}");
    let rewritten = parser.parse(sql, &mut |content| {
        let mut mapping = ParameterMapping::from_placeholder(content)?;
        if mapping.data_type.is_none() {
            mapping.data_type = infer_type(&mapping.property, registry, parameter, bindings_scope);
        }
        mappings.push(mapping);
        Ok("?".to_string())
    })?;
    Ok((rewritten, mappings))
}

fn infer_type(
    property: &str,
    registry: &TypeHandlerRegistry,
    parameter: &Value,
    bindings_scope: &Value,
) -> Option<DataType> {
    if meta::has_path(bindings_scope, property) {
        return data_type_of(meta::get_path(bindings_scope, property).ok()?);
    }
    if registry.has_handler_for_value(parameter) {
        return Some(parameter.data_type());
    }
    if meta::has_path(parameter, property) {
        return data_type_of(meta::get_path(parameter, property).ok()?);
    }
    None
}

fn data_type_of(value: Value) -> Option<DataType> {
    match value.data_type() {
        DataType::Null => None,
        dt => Some(dt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ObjectMap;

    fn registry() -> TypeHandlerRegistry {
        TypeHandlerRegistry::new()
    }

    fn object(pairs: &[(&str, Value)]) -> Value {
        let mut map = ObjectMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Value::Object(map)
    }

    #[test]
    fn test_static_source_passthrough() {
        let source = SqlSource::static_sql(
            "select * from posts where id = ?",
            vec![ParameterMapping::new("id", Some(DataType::Integer))],
        );
        let bound = source
            .bound_sql(&registry(), &Value::Integer(1), None)
            .unwrap();
        assert_eq!(bound.sql, "select * from posts where id = ?");
        assert_eq!(bound.parameter_mappings.len(), 1);
        assert!(bound.additional_parameters.is_empty());
    }

    #[test]
    fn test_raw_source_builds_at_load_time() {
        let root = SqlNode::Mixed(vec![SqlNode::static_text(
            "select * from posts where id = #{id}",
        )]);
        assert!(!root.is_dynamic());
        let source = SqlSource::from_node(root, &registry()).unwrap();
        match &source {
            SqlSource::Raw {
                sql,
                parameter_mappings,
            } => {
                assert_eq!(sql, "select * from posts where id = ?");
                assert_eq!(parameter_mappings[0].property, "id");
            }
            other => panic!("expected raw source, got {:?}", other),
        }
    }

    #[test]
    fn test_dynamic_source_rewrites_placeholders() {
        let root = SqlNode::Mixed(vec![
            SqlNode::static_text("select * from posts"),
            SqlNode::where_node(SqlNode::If {
                test: "title != null".to_string(),
                body: Box::new(SqlNode::static_text("AND title = #{title}")),
            }),
        ]);
        let source = SqlSource::from_node(root, &registry()).unwrap();
        let parameter = object(&[("title", Value::text("rust"))]);
        let bound = source.bound_sql(&registry(), &parameter, None).unwrap();
        assert_eq!(bound.sql, "select * from posts WHERE title = ?");
        assert_eq!(bound.parameter_mappings.len(), 1);
        assert_eq!(bound.parameter_mappings[0].property, "title");
        assert_eq!(
            bound.parameter_mappings[0].data_type,
            Some(DataType::Text)
        );
    }

    #[test]
    fn test_foreach_produces_one_mapping_per_iteration() {
        let root = SqlNode::Mixed(vec![
            SqlNode::static_text("select * from posts where id in"),
            SqlNode::Foreach {
                collection: "list".to_string(),
                item: Some("x".to_string()),
                index: None,
                open: Some("(".to_string()),
                close: Some(")".to_string()),
                separator: Some(",".to_string()),
                body: Box::new(SqlNode::static_text("#{x}")),
            },
        ]);
        let source = SqlSource::from_node(root, &registry()).unwrap();
        let parameter = object(&[(
            "list",
            Value::array(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]),
        )]);
        let bound = source.bound_sql(&registry(), &parameter, None).unwrap();
        assert_eq!(bound.sql, "select * from posts where id in (?,?,?)");
        let names: Vec<&str> = bound
            .parameter_mappings
            .iter()
            .map(|m| m.property.as_str())
            .collect();
        assert_eq!(names, vec!["__frch_x_0", "__frch_x_1", "__frch_x_2"]);
        // iteration bindings are available as additional parameters
        assert_eq!(
            bound.additional_parameter("__frch_x_2").unwrap(),
            Value::Integer(3)
        );
    }

    #[test]
    fn test_simple_parameter_type_inference() {
        let root = SqlNode::Mixed(vec![
            SqlNode::text("select ${value}"),
            SqlNode::static_text("where id = #{id}"),
        ]);
        let source = SqlSource::from_node(root, &registry()).unwrap();
        let bound = source
            .bound_sql(&registry(), &Value::Integer(9), None)
            .unwrap();
        assert_eq!(bound.sql, "select 9 where id = ?");
        assert_eq!(
            bound.parameter_mappings[0].data_type,
            Some(DataType::Integer)
        );
    }
}
