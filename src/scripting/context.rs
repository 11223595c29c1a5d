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

//! Dynamic evaluation context
//!
//! The accumulator threaded through SQL-node evaluation: a binding scope
//! seeded with the parameter object, a SQL buffer joined by single spaces,
//! and the monotonic counter that uniquifies `#{}` placeholders inside
//! `<foreach>` bodies.

use crate::core::{meta, ObjectMap, Result, Value};
use crate::expr::Bindings;

/// Binding name of the caller's parameter object
pub const PARAMETER_OBJECT_KEY: &str = "_parameter";

/// Binding name of the active environment's database id
pub const DATABASE_ID_KEY: &str = "_databaseId";

/// Alias exposing a simple-typed parameter to `${value}` substitution
const VALUE_ALIAS: &str = "value";

/// Accumulator for one dynamic SQL evaluation
#[derive(Debug)]
pub struct DynamicContext {
    bindings: ObjectMap,
    sql: String,
    unique_number: u32,
}

impl DynamicContext {
    /// Create a context seeded with `_parameter` and `_databaseId`
    pub fn new(parameter: &Value, database_id: Option<&str>) -> Self {
        let mut bindings = ObjectMap::new();
        bindings.insert(PARAMETER_OBJECT_KEY.to_string(), parameter.clone());
        bindings.insert(
            DATABASE_ID_KEY.to_string(),
            database_id.map(Value::text).unwrap_or(Value::Null),
        );
        Self {
            bindings,
            sql: String::new(),
            unique_number: 0,
        }
    }

    /// Create or replace a binding
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Remove a binding
    pub fn unbind(&mut self, name: &str) {
        self.bindings.remove(name);
    }

    /// The full binding map (carried into bound SQL as runtime bindings)
    pub fn bindings(&self) -> &ObjectMap {
        &self.bindings
    }

    /// Consume the context, yielding its bindings
    pub fn into_bindings(self) -> ObjectMap {
        self.bindings
    }

    /// The parameter object this context was created with
    pub fn parameter(&self) -> &Value {
        self.bindings
            .get(PARAMETER_OBJECT_KEY)
            .unwrap_or(&Value::Null)
    }

    /// Append one SQL fragment; fragments are joined by single spaces
    pub fn append_sql(&mut self, part: &str) {
        if !part.is_empty() {
            self.sql.push_str(part);
            self.sql.push(' ');
        }
    }

    /// The accumulated SQL
    pub fn sql(&self) -> String {
        self.sql.trim().to_string()
    }

    /// Allocate the next unique placeholder number
    ///
    /// The counter persists across loop iterations so every `<foreach>`
    /// iteration produces distinct placeholder names.
    pub fn next_unique(&mut self) -> u32 {
        let n = self.unique_number;
        self.unique_number += 1;
        n
    }

    /// Run `f` against an empty SQL buffer, restoring the outer buffer after
    ///
    /// Returns `f`'s produced-content flag and the captured SQL. Bindings
    /// and the unique counter are shared with the outer scope.
    pub fn capture<F>(&mut self, f: F) -> Result<(bool, String)>
    where
        F: FnOnce(&mut Self) -> Result<bool>,
    {
        let saved = std::mem::take(&mut self.sql);
        let result = f(self);
        let captured = std::mem::replace(&mut self.sql, saved);
        Ok((result?, captured))
    }
}

impl Bindings for DynamicContext {
    /// Resolve a path: explicit bindings win, then properties of the
    /// parameter object; `value` aliases a simple-typed parameter.
    fn resolve(&self, path: &str) -> Result<Value> {
        let head = path.split(['.', '[']).next().unwrap_or(path);
        if self.bindings.contains_key(head) {
            let scope = Value::Object(self.bindings.clone());
            return meta::get_path(&scope, path);
        }
        let parameter = self.parameter();
        if head == VALUE_ALIAS && parameter.is_simple() {
            return Ok(parameter.clone());
        }
        meta::get_path(parameter, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(pairs: &[(&str, Value)]) -> Value {
        let mut map = ObjectMap::new();
        for (k, v) in pairs {
            map.insert(k.to_string(), v.clone());
        }
        Value::Object(map)
    }

    #[test]
    fn test_sql_joined_by_spaces() {
        let mut ctx = DynamicContext::new(&Value::Null, None);
        ctx.append_sql("SELECT *");
        ctx.append_sql("FROM posts");
        ctx.append_sql("");
        ctx.append_sql("WHERE id = ?");
        assert_eq!(ctx.sql(), "SELECT * FROM posts WHERE id = ?");
    }

    #[test]
    fn test_unique_counter_monotonic() {
        let mut ctx = DynamicContext::new(&Value::Null, None);
        assert_eq!(ctx.next_unique(), 0);
        assert_eq!(ctx.next_unique(), 1);
        let (_, _) = ctx.capture(|inner| {
            assert_eq!(inner.next_unique(), 2);
            Ok(true)
        })
        .unwrap();
        assert_eq!(ctx.next_unique(), 3);
    }

    #[test]
    fn test_capture_restores_outer_buffer() {
        let mut ctx = DynamicContext::new(&Value::Null, None);
        ctx.append_sql("outer");
        let (produced, captured) = ctx
            .capture(|inner| {
                inner.append_sql("inner");
                Ok(true)
            })
            .unwrap();
        assert!(produced);
        assert_eq!(captured.trim(), "inner");
        assert_eq!(ctx.sql(), "outer");
    }

    #[test]
    fn test_resolution_order() {
        let parameter = object(&[("title", Value::text("param"))]);
        let mut ctx = DynamicContext::new(&parameter, Some("pg"));
        assert_eq!(ctx.resolve("title").unwrap(), Value::text("param"));

        ctx.bind("title", Value::text("bound"));
        assert_eq!(ctx.resolve("title").unwrap(), Value::text("bound"));
        assert_eq!(ctx.resolve(DATABASE_ID_KEY).unwrap(), Value::text("pg"));
    }

    #[test]
    fn test_value_alias_for_simple_parameter() {
        let ctx = DynamicContext::new(&Value::Integer(42), None);
        assert_eq!(ctx.resolve("value").unwrap(), Value::Integer(42));

        // a composite parameter exposes its own properties instead
        let parameter = object(&[("value", Value::Integer(1))]);
        let ctx = DynamicContext::new(&parameter, None);
        assert_eq!(ctx.resolve("value").unwrap(), Value::Integer(1));
    }
}
