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

//! Object factory and type descriptors
//!
//! Materialized rows are dynamic objects; a [`TypeDescriptor`] optionally
//! declares a result type's constructor signatures so constructor mapping
//! and column-arity constructor matching have something to match against.
//! Unregistered types get a default constructor (an empty object).

use rustc_hash::FxHashMap;

use crate::core::{DataType, Value};

/// One declared constructor: ordered (property, type) parameters
pub type ConstructorSignature = Vec<(String, DataType)>;

/// Declared shape of a result type
#[derive(Debug, Clone)]
pub struct TypeDescriptor {
    /// Type name (alias) this descriptor is registered under
    pub name: String,
    /// Whether a default (no-argument) constructor exists
    pub has_default_constructor: bool,
    /// Declared constructor signatures
    pub constructors: Vec<ConstructorSignature>,
}

/// Creates result objects and resolves declared constructors
#[derive(Debug, Clone, Default)]
pub struct ObjectFactory {
    types: FxHashMap<String, TypeDescriptor>,
}

impl ObjectFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a result type's descriptor
    pub fn register(&mut self, descriptor: TypeDescriptor) {
        self.types.insert(descriptor.name.clone(), descriptor);
    }

    /// Descriptor of `type_name`, if registered
    pub fn descriptor(&self, type_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(type_name)
    }

    /// True if `type_name` can be default-constructed
    pub fn has_default_constructor(&self, type_name: &str) -> bool {
        self.types
            .get(type_name)
            .map(|d| d.has_default_constructor)
            .unwrap_or(true)
    }

    /// Create an empty instance of `type_name`
    pub fn create(&self, _type_name: &str) -> Value {
        Value::empty_object()
    }

    /// Find a declared constructor whose arity matches `column_count`
    pub fn constructor_for_arity(
        &self,
        type_name: &str,
        column_count: usize,
    ) -> Option<&ConstructorSignature> {
        self.types
            .get(type_name)?
            .constructors
            .iter()
            .find(|signature| signature.len() == column_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unregistered_type_default_constructs() {
        let factory = ObjectFactory::new();
        assert!(factory.has_default_constructor("Post"));
        assert_eq!(factory.create("Post"), Value::empty_object());
    }

    #[test]
    fn test_arity_matching() {
        let mut factory = ObjectFactory::new();
        factory.register(TypeDescriptor {
            name: "Point".to_string(),
            has_default_constructor: false,
            constructors: vec![vec![
                ("x".to_string(), DataType::Integer),
                ("y".to_string(), DataType::Integer),
            ]],
        });

        assert!(!factory.has_default_constructor("Point"));
        assert!(factory.constructor_for_arity("Point", 2).is_some());
        assert!(factory.constructor_for_arity("Point", 3).is_none());
        assert!(factory.constructor_for_arity("Unknown", 2).is_none());
    }
}
