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

//! Mapper interface declarations
//!
//! Without runtime reflection, a mapper interface is declared as data: a
//! namespace plus one [`MethodSpec`] per method, naming the declared return
//! shape and parameter names. The proxy compiles each method into a
//! dispatchable [`super::method::MapperMethod`] on first use.

use rustc_hash::FxHashMap;

use crate::core::{Error, Result};

/// Declared return shape of a mapper method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReturnShape {
    /// No return value (row count discarded)
    Void,
    /// One row (error on more), NULL allowed
    #[default]
    One,
    /// One row, absent allowed (`Optional<T>`)
    Optional,
    /// All rows as a list
    Many,
    /// All rows as a map keyed by one row property
    MapKeyed,
    /// Streaming cursor over the rows
    Cursor,
    /// Affected row count (writes)
    Affected,
    /// Affected row count as boolean (> 0)
    AffectedBool,
}

/// One declared mapper method
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Method name (statement id is `namespace.name`)
    pub name: String,
    /// Declared return shape
    pub return_shape: ReturnShape,
    /// Row property keying the map for `ReturnShape::MapKeyed`
    pub map_key: Option<String>,
    /// Declared parameter names (`@Param` equivalents), by position;
    /// None falls back to positional names
    pub param_names: Vec<Option<String>>,
    /// Method accepts a RowBounds argument
    pub accepts_row_bounds: bool,
    /// Method accepts a user result handler
    pub accepts_result_handler: bool,
}

impl MethodSpec {
    /// Declare a method with defaults (single-row return, no special args)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            return_shape: ReturnShape::One,
            map_key: None,
            param_names: Vec::new(),
            accepts_row_bounds: false,
            accepts_result_handler: false,
        }
    }

    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.return_shape = shape;
        self
    }

    pub fn map_key(mut self, key: impl Into<String>) -> Self {
        self.map_key = Some(key.into());
        self.return_shape = ReturnShape::MapKeyed;
        self
    }

    pub fn param(mut self, name: impl Into<String>) -> Self {
        self.param_names.push(Some(name.into()));
        self
    }

    pub fn positional_param(mut self) -> Self {
        self.param_names.push(None);
        self
    }

    pub fn row_bounds(mut self) -> Self {
        self.accepts_row_bounds = true;
        self
    }

    pub fn result_handler(mut self) -> Self {
        self.accepts_result_handler = true;
        self
    }
}

/// One declared mapper interface
#[derive(Debug, Clone)]
pub struct MapperSpec {
    /// Fully qualified interface name; doubles as the statement namespace
    pub namespace: String,
    /// Declared methods by name
    pub methods: FxHashMap<String, MethodSpec>,
    /// Namespaces of super-interfaces searched when a method is not found
    pub super_namespaces: Vec<String>,
}

impl MapperSpec {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            methods: FxHashMap::default(),
            super_namespaces: Vec::new(),
        }
    }

    pub fn method(mut self, spec: MethodSpec) -> Self {
        self.methods.insert(spec.name.clone(), spec);
        self
    }

    pub fn extends(mut self, namespace: impl Into<String>) -> Self {
        self.super_namespaces.push(namespace.into());
        self
    }
}

/// All declared mapper interfaces
#[derive(Debug, Clone, Default)]
pub struct MapperRegistry {
    mappers: FxHashMap<String, MapperSpec>,
}

impl MapperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mapper; duplicate namespaces are fatal
    pub fn add(&mut self, spec: MapperSpec) -> Result<()> {
        if self.mappers.contains_key(&spec.namespace) {
            return Err(Error::DuplicateNamespace(spec.namespace));
        }
        self.mappers.insert(spec.namespace.clone(), spec);
        Ok(())
    }

    /// Look up a declared mapper
    pub fn get(&self, namespace: &str) -> Option<&MapperSpec> {
        self.mappers.get(namespace)
    }

    /// True if `namespace` is declared
    pub fn has(&self, namespace: &str) -> bool {
        self.mappers.contains_key(namespace)
    }

    /// Find `method` on `namespace`, searching super-interfaces
    pub fn find_method(&self, namespace: &str, method: &str) -> Option<(&str, &MethodSpec)> {
        let spec = self.mappers.get(namespace)?;
        if let Some(found) = spec.methods.get(method) {
            return Some((spec.namespace.as_str(), found));
        }
        for parent in &spec.super_namespaces {
            if let Some(found) = self.find_method(parent, method) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_namespace_rejected() {
        let mut registry = MapperRegistry::new();
        registry.add(MapperSpec::new("blog.PostMapper")).unwrap();
        assert!(matches!(
            registry.add(MapperSpec::new("blog.PostMapper")),
            Err(Error::DuplicateNamespace(_))
        ));
    }

    #[test]
    fn test_method_lookup_falls_back_to_super() {
        let mut registry = MapperRegistry::new();
        registry
            .add(
                MapperSpec::new("blog.BaseMapper")
                    .method(MethodSpec::new("count").returns(ReturnShape::One)),
            )
            .unwrap();
        registry
            .add(
                MapperSpec::new("blog.PostMapper")
                    .extends("blog.BaseMapper")
                    .method(MethodSpec::new("findById")),
            )
            .unwrap();

        let (ns, _) = registry.find_method("blog.PostMapper", "findById").unwrap();
        assert_eq!(ns, "blog.PostMapper");

        let (ns, _) = registry.find_method("blog.PostMapper", "count").unwrap();
        assert_eq!(ns, "blog.BaseMapper");

        assert!(registry.find_method("blog.PostMapper", "missing").is_none());
    }
}
