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

//! Type handler registry
//!
//! Resolution order for a column or parameter: an explicitly named handler,
//! then the declared host type, then the JDBC type's natural host type,
//! then the passthrough handler.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::core::{DataType, Error, Result, Value};

use super::handler::{
    BooleanTypeHandler, BytesTypeHandler, FloatTypeHandler, IntegerTypeHandler,
    StringTypeHandler, TimestampTypeHandler, TypeHandler, UnknownTypeHandler,
};
use super::jdbc::JdbcType;

/// Registry of type handlers by host type and by name
pub struct TypeHandlerRegistry {
    by_type: FxHashMap<DataType, Arc<dyn TypeHandler>>,
    by_name: FxHashMap<String, Arc<dyn TypeHandler>>,
    unknown: Arc<dyn TypeHandler>,
}

impl TypeHandlerRegistry {
    /// Create a registry with the built-in handlers registered
    pub fn new() -> Self {
        let mut registry = Self {
            by_type: FxHashMap::default(),
            by_name: FxHashMap::default(),
            unknown: Arc::new(UnknownTypeHandler),
        };
        registry.register(DataType::Boolean, "boolean", Arc::new(BooleanTypeHandler));
        registry.register(DataType::Integer, "integer", Arc::new(IntegerTypeHandler));
        registry.register(DataType::Float, "float", Arc::new(FloatTypeHandler));
        registry.register(DataType::Text, "string", Arc::new(StringTypeHandler));
        registry.register(
            DataType::Timestamp,
            "timestamp",
            Arc::new(TimestampTypeHandler),
        );
        registry.register(DataType::Bytes, "bytes", Arc::new(BytesTypeHandler));
        registry
    }

    /// Register a handler under a host type and a lookup name
    pub fn register(
        &mut self,
        data_type: DataType,
        name: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) {
        self.by_type.insert(data_type, handler.clone());
        self.by_name.insert(name.into(), handler);
    }

    /// Register a handler under a lookup name only
    pub fn register_named(&mut self, name: impl Into<String>, handler: Arc<dyn TypeHandler>) {
        self.by_name.insert(name.into(), handler);
    }

    /// True if a dedicated handler exists for `data_type`
    pub fn has_handler(&self, data_type: DataType) -> bool {
        self.by_type.contains_key(&data_type)
    }

    /// True if the whole value (a simple type) has a dedicated handler
    pub fn has_handler_for_value(&self, value: &Value) -> bool {
        value.is_simple() && self.has_handler(value.data_type())
    }

    /// Look up a handler by its registered name
    pub fn named(&self, name: &str) -> Result<Arc<dyn TypeHandler>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| Error::configuration(format!("type handler '{}' is not registered", name)))
    }

    /// The passthrough handler
    pub fn unknown(&self) -> Arc<dyn TypeHandler> {
        self.unknown.clone()
    }

    /// Resolve a handler from the available hints
    pub fn resolve(
        &self,
        handler_name: Option<&str>,
        data_type: Option<DataType>,
        jdbc_type: Option<JdbcType>,
    ) -> Result<Arc<dyn TypeHandler>> {
        if let Some(name) = handler_name {
            return self.named(name);
        }
        if let Some(dt) = data_type {
            if let Some(handler) = self.by_type.get(&dt) {
                return Ok(handler.clone());
            }
        }
        if let Some(jdbc) = jdbc_type {
            if let Some(handler) = self.by_type.get(&jdbc.data_type()) {
                return Ok(handler.clone());
            }
        }
        Ok(self.unknown.clone())
    }
}

impl Default for TypeHandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
