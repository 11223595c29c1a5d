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

//! Result maps: declarative column-to-property mappings
//!
//! A [`ResultMap`] is built once at configuration load and immutable
//! afterwards. Derived subsets (id, constructor and property mappings) are
//! computed by the builder, which also enforces the structural invariants:
//! a mapping never carries both a nested query and a nested result map, and
//! constructor mappings are disjoint from property mappings.

use rustc_hash::FxHashSet;

use crate::core::{DataType, Error, Result};
use crate::types::JdbcType;

/// Role flags on one result mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResultFlags {
    /// Participates in the row identity key
    pub id: bool,
    /// Feeds a constructor argument rather than a property write
    pub constructor: bool,
}

/// One column-to-property mapping
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMapping {
    /// Target property path
    pub property: String,
    /// Source column label; None for pure nested mappings
    pub column: Option<String>,
    /// Declared host type
    pub data_type: Option<DataType>,
    /// Declared JDBC type
    pub jdbc_type: Option<JdbcType>,
    /// Named type handler override
    pub type_handler: Option<String>,
    /// Nested result map reference (joined results)
    pub nested_result_map_id: Option<String>,
    /// Nested select reference (sub-query per row)
    pub nested_query_id: Option<String>,
    /// Column prefix applied to the nested result map's columns
    pub column_prefix: Option<String>,
    /// Columns that must be non-null for a nested row to materialize
    pub not_null_columns: Vec<String>,
    /// Composite key sub-mappings: (nested property, column) pairs
    pub composites: Vec<(String, String)>,
    /// Column in a linked result set matched against `column`
    pub foreign_column: Option<String>,
    /// Name of the result set this mapping is filled from
    pub result_set: Option<String>,
    /// Defer the nested query until first property access
    pub lazy: bool,
    /// Role flags
    pub flags: ResultFlags,
}

impl ResultMapping {
    /// Create a plain column-to-property mapping
    pub fn column(property: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            column: Some(column.into()),
            data_type: None,
            jdbc_type: None,
            type_handler: None,
            nested_result_map_id: None,
            nested_query_id: None,
            column_prefix: None,
            not_null_columns: Vec::new(),
            composites: Vec::new(),
            foreign_column: None,
            result_set: None,
            lazy: false,
            flags: ResultFlags::default(),
        }
    }

    /// Mark this mapping as an id mapping
    pub fn id(mut self) -> Self {
        self.flags.id = true;
        self
    }

    /// Mark this mapping as a constructor argument
    pub fn constructor(mut self) -> Self {
        self.flags.constructor = true;
        self
    }

    /// Attach a nested result map
    pub fn nested_result_map(mut self, id: impl Into<String>) -> Self {
        self.nested_result_map_id = Some(id.into());
        self
    }

    /// Attach a nested select
    pub fn nested_query(mut self, id: impl Into<String>) -> Self {
        self.nested_query_id = Some(id.into());
        self
    }

    /// Set the declared host type
    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Set the lazy flag
    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    /// Validate structural invariants of this mapping
    pub fn validate(&self) -> Result<()> {
        if self.nested_query_id.is_some() && self.nested_result_map_id.is_some() {
            return Err(Error::ConflictingNesting {
                property: self.property.clone(),
            });
        }
        Ok(())
    }

    /// True for a nested result map that maps joined columns of this result
    /// set (a named result set is filled later instead)
    pub fn is_joined_nested(&self) -> bool {
        self.nested_result_map_id.is_some() && self.result_set.is_none()
    }
}

/// Column-value switch selecting a sub-result-map per row
#[derive(Debug, Clone, PartialEq)]
pub struct Discriminator {
    /// Column whose value selects the case
    pub column: String,
    /// Declared host type of the column
    pub data_type: Option<DataType>,
    /// Declared JDBC type of the column
    pub jdbc_type: Option<JdbcType>,
    /// Case value (string form) to result-map id
    pub cases: Vec<(String, String)>,
}

impl Discriminator {
    /// Resolve a column value's string form to the case result map
    pub fn resolve(&self, value: &str) -> Option<&str> {
        self.cases
            .iter()
            .find(|(case, _)| case == value)
            .map(|(_, id)| id.as_str())
    }
}

/// A compiled result map
#[derive(Debug, Clone)]
pub struct ResultMap {
    /// Unique id (`namespace.mapId`)
    pub id: String,
    /// Target type alias of materialized rows
    pub type_name: String,
    /// All mappings in declaration order
    pub mappings: Vec<ResultMapping>,
    /// Indexes into `mappings` carrying the id flag
    pub id_indices: Vec<usize>,
    /// Indexes of constructor mappings, in declaration order
    pub constructor_indices: Vec<usize>,
    /// Indexes of plain property mappings
    pub property_indices: Vec<usize>,
    /// Uppercased labels of every explicitly mapped column
    pub mapped_columns: FxHashSet<String>,
    /// Optional per-row discriminator
    pub discriminator: Option<Discriminator>,
    /// Some mapping references a nested result map of this result set
    pub has_nested_result_maps: bool,
    /// Some mapping references a nested select
    pub has_nested_queries: bool,
    /// Per-map auto-mapping override
    pub auto_mapping: Option<bool>,
}

impl ResultMap {
    /// Start building a result map
    pub fn builder(id: impl Into<String>, type_name: impl Into<String>) -> ResultMapBuilder {
        ResultMapBuilder {
            id: id.into(),
            type_name: type_name.into(),
            mappings: Vec::new(),
            discriminator: None,
            auto_mapping: None,
        }
    }

    /// Mappings carrying the id flag
    pub fn id_mappings(&self) -> impl Iterator<Item = &ResultMapping> {
        self.id_indices.iter().map(|&i| &self.mappings[i])
    }

    /// Constructor mappings in declaration order
    pub fn constructor_mappings(&self) -> impl Iterator<Item = &ResultMapping> {
        self.constructor_indices.iter().map(|&i| &self.mappings[i])
    }

    /// Plain property mappings
    pub fn property_mappings(&self) -> impl Iterator<Item = &ResultMapping> {
        self.property_indices.iter().map(|&i| &self.mappings[i])
    }

    /// True if `column` (any case) is explicitly mapped
    pub fn maps_column(&self, column: &str) -> bool {
        self.mapped_columns.contains(&column.to_ascii_uppercase())
    }
}

/// Builder enforcing result-map invariants
pub struct ResultMapBuilder {
    id: String,
    type_name: String,
    mappings: Vec<ResultMapping>,
    discriminator: Option<Discriminator>,
    auto_mapping: Option<bool>,
}

impl ResultMapBuilder {
    /// Add one mapping
    pub fn mapping(mut self, mapping: ResultMapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Set the discriminator
    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    /// Override the global auto-mapping behavior for this map
    pub fn auto_mapping(mut self, enabled: bool) -> Self {
        self.auto_mapping = Some(enabled);
        self
    }

    /// Validate and derive the compiled result map
    pub fn build(self) -> Result<ResultMap> {
        let mut id_indices = Vec::new();
        let mut constructor_indices = Vec::new();
        let mut property_indices = Vec::new();
        let mut mapped_columns = FxHashSet::default();
        let mut has_nested_result_maps = false;
        let mut has_nested_queries = false;

        for (i, mapping) in self.mappings.iter().enumerate() {
            mapping.validate()?;
            if mapping.flags.id {
                id_indices.push(i);
            }
            if mapping.flags.constructor {
                constructor_indices.push(i);
            } else {
                property_indices.push(i);
            }
            if let Some(column) = &mapping.column {
                mapped_columns.insert(column.to_ascii_uppercase());
            }
            for (_, column) in &mapping.composites {
                mapped_columns.insert(column.to_ascii_uppercase());
            }
            if mapping.is_joined_nested() {
                has_nested_result_maps = true;
            }
            if mapping.nested_query_id.is_some() {
                has_nested_queries = true;
            }
        }

        Ok(ResultMap {
            id: self.id,
            type_name: self.type_name,
            mappings: self.mappings,
            id_indices,
            constructor_indices,
            property_indices,
            mapped_columns,
            discriminator: self.discriminator,
            has_nested_result_maps,
            has_nested_queries,
            auto_mapping: self.auto_mapping,
        })
    }
}
