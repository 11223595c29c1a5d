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

//! The streaming result-set mapper
//!
//! Drives the driver across every result set of a statement and
//! materializes rows: automatic column mapping, explicit and constructor
//! mappings, discriminator dispatch (cycle-safe), joined nested result maps
//! deduplicated by row keys, nested sub-queries (eager, lazy or deferred),
//! and multi-result-set linkage by foreign columns. A per-row mapping
//! failure aborts the whole call; no partial results are returned.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::CacheKey;
use crate::config::{AutoMappingBehavior, Configuration};
use crate::core::{meta, DataType, Error, LazyLoad, LazyObject, Result, Value};
use crate::driver::PreparedStatement;
use crate::mapping::{
    parse_data_type, MappedStatement, ResultMap, ResultMapping, RowBounds,
};
use crate::types::ColumnRef;

use super::loader::{extract_result, DeferredLoad, ResultLoader};
use super::{Executor, LocalCacheState};

pub mod context;
pub mod cursor;
pub mod wrapper;

pub use context::{DefaultResultHandler, ResultContext, ResultHandler};
pub use cursor::Cursor;
pub use wrapper::{prefixed, strip_prefix, ResultSetWrapper};

/// A parent property waiting for rows of a named result set
struct PendingRelation {
    target: Arc<LazyObject>,
    property: String,
    as_list: bool,
}

/// Row destination: collect into a list or stream to a user handler
enum Sink<'h> {
    Collect { rows: Vec<Value> },
    User {
        handler: &'h mut dyn ResultHandler,
        count: usize,
        stopped: bool,
    },
}

impl Sink<'_> {
    fn push(&mut self, row: Value) {
        match self {
            Sink::Collect { rows } => rows.push(row),
            Sink::User {
                handler,
                count,
                stopped,
            } => {
                *count += 1;
                let mut context = ResultContext::new(row, *count);
                handler.handle_result(&mut context);
                if context.is_stopped() {
                    *stopped = true;
                }
            }
        }
    }

    fn stopped(&self) -> bool {
        matches!(self, Sink::User { stopped: true, .. })
    }

    fn into_rows(self) -> Vec<Value> {
        match self {
            Sink::Collect { rows } => rows,
            Sink::User { .. } => Vec::new(),
        }
    }
}

/// Accumulates one row's state before materialization
struct RowBuilder {
    root: Value,
    found: bool,
    lazy_loaders: Vec<(String, Box<dyn LazyLoad>)>,
    deferrals: Vec<(String, CacheKey, bool)>,
    relations: Vec<(CacheKey, ResultMapping, String)>,
}

impl RowBuilder {
    fn new() -> Self {
        Self {
            root: Value::empty_object(),
            found: false,
            lazy_loaders: Vec::new(),
            deferrals: Vec::new(),
            relations: Vec::new(),
        }
    }

    fn set(&mut self, property: &str, value: Value) -> Result<()> {
        meta::set_path(&mut self.root, property, value)
    }
}

/// Reborrow a `&mut dyn ResultHandler` with a lifetime tied to this call,
/// so repeated reborrows across loop iterations don't extend the borrow.
fn reborrow_handler<'a>(
    h: &'a mut Option<&mut dyn ResultHandler>,
) -> Option<&'a mut dyn ResultHandler> {
    match h {
        Some(h) => Some(&mut **h),
        None => None,
    }
}

/// Maps the result sets of one executed statement
pub struct ResultSetHandler<'a> {
    executor: &'a mut Executor,
    config: Arc<Configuration>,
    ms: &'a MappedStatement,
    row_bounds: RowBounds,
    multiple_supported: bool,
    pending_relations: FxHashMap<CacheKey, Vec<PendingRelation>>,
    next_result_maps: FxHashMap<String, ResultMapping>,
    /// Joined-nesting dedup: combined row key -> (root index, path from root)
    nested_paths: FxHashMap<CacheKey, (usize, String)>,
}

impl<'a> ResultSetHandler<'a> {
    pub fn new(
        executor: &'a mut Executor,
        ms: &'a MappedStatement,
        row_bounds: RowBounds,
        multiple_supported: bool,
    ) -> Self {
        let config = executor.configuration();
        Self {
            executor,
            config,
            ms,
            row_bounds,
            multiple_supported,
            pending_relations: FxHashMap::default(),
            next_result_maps: FxHashMap::default(),
            nested_paths: FxHashMap::default(),
        }
    }

    /// Map every result set the statement produced
    pub fn handle_result_sets(
        mut self,
        statement: &mut dyn PreparedStatement,
        mut user_handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Value> {
        let mut multiple_results: Vec<Value> = Vec::new();
        let mut rs_count = 0usize;
        let map_count = self.ms.result_map_ids.len();
        let mut current = first_result_set(statement)?;

        if current.is_some() && map_count == 0 {
            return Err(Error::configuration(format!(
                "statement '{}' returned a result set but declares no result map",
                self.ms.id
            )));
        }

        while let Some(mut rsw) = current {
            if rs_count < map_count {
                let rm = self.config.result_map(&self.ms.result_map_ids[rs_count])?;
                let has_user_handler = user_handler.is_some();
                let rows =
                    self.handle_result_set(&mut rsw, &rm, reborrow_handler(&mut user_handler))?;
                if !has_user_handler {
                    multiple_results.push(Value::Array(rows));
                }
            } else if let Some(rs_name) = self.ms.result_sets.get(rs_count).cloned() {
                if let Some(parent_mapping) = self.next_result_maps.get(&rs_name).cloned() {
                    if let Some(nested_id) = parent_mapping.nested_result_map_id.clone() {
                        let rm = self.config.result_map(&nested_id)?;
                        self.handle_linked_rows(&mut rsw, &rm, &parent_mapping, &rs_name)?;
                    }
                }
            }
            rsw.close();
            rs_count += 1;
            current = if self.multiple_supported {
                next_result_set(statement)?
            } else {
                None
            };
        }

        Ok(collapse(multiple_results))
    }

    // =========================================================================
    // Per-result-set row loops
    // =========================================================================

    fn handle_result_set(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        user_handler: Option<&mut dyn ResultHandler>,
    ) -> Result<Vec<Value>> {
        let mut sink = match user_handler {
            Some(handler) => Sink::User {
                handler,
                count: 0,
                stopped: false,
            },
            None => Sink::Collect { rows: Vec::new() },
        };
        if rm.has_nested_result_maps {
            self.handle_rows_nested(rsw, rm, &mut sink)?;
        } else {
            self.handle_rows_simple(rsw, rm, &mut sink)?;
        }
        Ok(sink.into_rows())
    }

    fn handle_rows_simple(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        sink: &mut Sink<'_>,
    ) -> Result<()> {
        self.skip_rows(rsw)?;
        let mut processed = 0usize;
        while processed < self.row_bounds.limit && !sink.stopped() && rsw.next()? {
            let resolved = self.resolve_discriminator(rsw, rm.clone(), None)?;
            let row = self.map_row(rsw, &resolved, None, false)?;
            sink.push(row);
            processed += 1;
        }
        Ok(())
    }

    /// Joined one-to-many / one-to-one rows with row-key deduplication
    fn handle_rows_nested(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        sink: &mut Sink<'_>,
    ) -> Result<()> {
        self.skip_rows(rsw)?;
        let mut parents: Vec<Value> = Vec::new();
        let mut parent_keys: FxHashMap<CacheKey, usize> = FxHashMap::default();
        let mut previous_key: Option<CacheKey> = None;
        let mut processed = 0usize;

        while processed < self.row_bounds.limit && !sink.stopped() && rsw.next()? {
            let resolved = self.resolve_discriminator(rsw, rm.clone(), None)?;
            let (row_key, _) = self.create_row_key(&resolved, rsw, None)?;

            if self.ms.result_ordered {
                // a new distinct parent completes the previous aggregate
                if previous_key.as_ref().is_some_and(|prev| prev != &row_key) {
                    for parent in parents.drain(..) {
                        sink.push(parent);
                    }
                    parent_keys.clear();
                    self.nested_paths.clear();
                }
            }

            if let Some(&index) = parent_keys.get(&row_key) {
                let mut root = std::mem::replace(&mut parents[index], Value::Null);
                self.apply_nested_mappings(rsw, &resolved, &mut root, index, "", &row_key)?;
                parents[index] = root;
            } else {
                let mut root = self.map_row(rsw, &resolved, None, true)?;
                let index = parents.len();
                if !root.is_null() {
                    self.apply_nested_mappings(rsw, &resolved, &mut root, index, "", &row_key)?;
                }
                parent_keys.insert(row_key.clone(), index);
                parents.push(root);
                processed += 1;
            }
            previous_key = Some(row_key);
        }

        for parent in parents {
            sink.push(parent);
        }
        self.nested_paths.clear();
        Ok(())
    }

    /// Recurse into every joined nested mapping of `rm` for the current row
    fn apply_nested_mappings(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        root: &mut Value,
        root_index: usize,
        base_path: &str,
        parent_key: &CacheKey,
    ) -> Result<()> {
        for mapping in rm.mappings.clone() {
            if !mapping.is_joined_nested() {
                continue;
            }
            let nested_id = match &mapping.nested_result_map_id {
                Some(id) => id.clone(),
                None => continue,
            };
            let prefix = mapping.column_prefix.clone();
            let nested_rm = self.config.result_map(&nested_id)?;
            let nested_rm =
                self.resolve_discriminator(rsw, nested_rm, prefix.as_deref())?;

            if !mapping.not_null_columns.is_empty()
                && !self.any_not_null_column(rsw, &mapping, prefix.as_deref())?
            {
                continue;
            }

            let (child_key, has_values) =
                self.create_row_key(&nested_rm, rsw, prefix.as_deref())?;
            if !has_values {
                continue;
            }
            let combined = child_key.combine(parent_key);
            let as_list = mapping.data_type == Some(DataType::Array);

            if let Some((_, existing_path)) = self.nested_paths.get(&combined).cloned() {
                // same child again: only recurse for deeper collections
                let mut child = meta::get_path(root, &existing_path)?;
                self.apply_nested_mappings(
                    rsw,
                    &nested_rm,
                    &mut child,
                    root_index,
                    &existing_path,
                    &combined,
                )?;
                meta::set_path(root, &existing_path, child)?;
            } else {
                let child = self.map_row(rsw, &nested_rm, prefix.as_deref(), true)?;
                if child.is_null() {
                    continue;
                }
                let property_path = if base_path.is_empty() {
                    mapping.property.clone()
                } else {
                    format!("{}.{}", base_path, mapping.property)
                };
                let child_path = if as_list {
                    let existing = meta::get_path(root, &property_path)?;
                    let index = match existing {
                        Value::Array(ref items) => items.len(),
                        _ => 0,
                    };
                    meta::append_path(root, &property_path, child)?;
                    format!("{}[{}]", property_path, index)
                } else {
                    meta::set_path(root, &property_path, child)?;
                    property_path
                };
                let mut grown = meta::get_path(root, &child_path)?;
                self.apply_nested_mappings(
                    rsw,
                    &nested_rm,
                    &mut grown,
                    root_index,
                    &child_path,
                    &combined,
                )?;
                meta::set_path(root, &child_path, grown)?;
                self.nested_paths
                    .insert(combined, (root_index, child_path));
            }
        }
        Ok(())
    }

    /// Link rows of a named result set into their pending parents
    fn handle_linked_rows(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        parent_mapping: &ResultMapping,
        rs_name: &str,
    ) -> Result<()> {
        let parent_columns = split_columns(parent_mapping.column.as_deref());
        let foreign_columns = split_columns(parent_mapping.foreign_column.as_deref());

        while rsw.next()? {
            let resolved = self.resolve_discriminator(rsw, rm.clone(), None)?;
            let row = self.map_row(rsw, &resolved, None, false)?;

            let mut key = CacheKey::new();
            key.update(Value::text(rs_name));
            for (i, column) in parent_columns.iter().enumerate() {
                let foreign = foreign_columns.get(i).unwrap_or(column);
                key.update(Value::text(column.clone()));
                key.update(rsw.get_by_label(foreign)?);
            }

            if let Some(relations) = self.pending_relations.get(&key) {
                for relation in relations {
                    if relation.as_list {
                        let current = relation
                            .target
                            .get(&relation.property)?
                            .unwrap_or(Value::Null);
                        let mut items = match current {
                            Value::Array(items) => items,
                            Value::Null => Vec::new(),
                            other => vec![other],
                        };
                        items.push(row.clone());
                        relation
                            .target
                            .set(&relation.property, Value::Array(items));
                    } else {
                        relation.target.set(&relation.property, row.clone());
                    }
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // One row
    // =========================================================================

    /// Materialize the current row under `rm`
    fn map_row(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        prefix: Option<&str>,
        is_nested: bool,
    ) -> Result<Value> {
        // a scalar target with one column short-circuits property mapping
        if rm.mappings.is_empty() && rsw.column_count() == 1 {
            let type_name = self.config.resolve_type_alias(&rm.type_name).to_string();
            if let Ok(data_type) = parse_data_type(&type_name) {
                if self.config.type_handlers.has_handler(data_type) {
                    let handler =
                        self.config
                            .type_handlers
                            .resolve(None, Some(data_type), None)?;
                    return handler.get_result(rsw.as_result_set(), ColumnRef::Index(1));
                }
            }
        }

        let mut builder = RowBuilder::new();

        if !rm.constructor_indices.is_empty() {
            self.apply_constructor_mappings(rsw, rm, prefix, &mut builder)?;
        } else if !self
            .config
            .object_factory
            .has_default_constructor(&rm.type_name)
        {
            self.apply_arity_constructor(rsw, rm, &mut builder)?;
        }

        if self.should_auto_map(rm, is_nested) {
            self.apply_auto_mappings(rsw, rm, prefix, &mut builder)?;
        }
        self.apply_property_mappings(rsw, rm, prefix, &mut builder)?;

        self.finish_row(builder)
    }

    fn should_auto_map(&self, rm: &ResultMap, is_nested: bool) -> bool {
        if let Some(override_flag) = rm.auto_mapping {
            return override_flag;
        }
        let nested = is_nested || rm.has_nested_result_maps;
        match self.config.settings.auto_mapping_behavior {
            AutoMappingBehavior::None => false,
            AutoMappingBehavior::Partial => !nested,
            AutoMappingBehavior::Full => true,
        }
    }

    fn apply_constructor_mappings(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        prefix: Option<&str>,
        builder: &mut RowBuilder,
    ) -> Result<()> {
        for mapping in rm.constructor_mappings().cloned().collect::<Vec<_>>() {
            let value = if let Some(nested_id) = &mapping.nested_query_id {
                let parameter = self.nested_query_parameter(rsw, &mapping, prefix)?;
                match parameter {
                    None => Value::Null,
                    Some(parameter) => {
                        let nested_ms = self.config.statement(nested_id)?;
                        let rows = self.executor.query(
                            &nested_ms,
                            parameter,
                            RowBounds::DEFAULT,
                            None,
                        )?;
                        extract_result(rows, mapping.data_type == Some(DataType::Array))?
                    }
                }
            } else if let Some(nested_id) = &mapping.nested_result_map_id {
                let nested_rm = self.config.result_map(nested_id)?;
                let combined = combine_prefix(prefix, mapping.column_prefix.as_deref());
                self.map_row(rsw, &nested_rm, combined.as_deref(), true)?
            } else if let Some(column) = &mapping.column {
                let label = prefixed(column, prefix);
                let handler = self.config.type_handlers.resolve(
                    mapping.type_handler.as_deref(),
                    mapping.data_type,
                    mapping.jdbc_type.or_else(|| rsw.jdbc_type_of(&label)),
                )?;
                handler.get_result(rsw.as_result_set(), ColumnRef::Label(&label))?
            } else {
                Value::Null
            };
            if !value.is_null() {
                builder.found = true;
            }
            builder.set(&mapping.property, value)?;
        }
        Ok(())
    }

    /// Pick a declared constructor whose arity matches the column count
    fn apply_arity_constructor(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        builder: &mut RowBuilder,
    ) -> Result<()> {
        let type_name = rm.type_name.clone();
        let signature = self
            .config
            .object_factory
            .constructor_for_arity(&type_name, rsw.column_count())
            .cloned()
            .ok_or(Error::ConstructorMismatch {
                type_name: type_name.clone(),
                columns: rsw.column_count(),
            })?;
        for (i, (property, data_type)) in signature.iter().enumerate() {
            if !self.config.type_handlers.has_handler(*data_type) {
                return Err(Error::ConstructorMismatch {
                    type_name,
                    columns: rsw.column_count(),
                });
            }
            let handler = self
                .config
                .type_handlers
                .resolve(None, Some(*data_type), None)?;
            let value = handler.get_result(rsw.as_result_set(), ColumnRef::Index(i + 1))?;
            if !value.is_null() {
                builder.found = true;
            }
            builder.set(property, value)?;
        }
        Ok(())
    }

    fn apply_auto_mappings(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        prefix: Option<&str>,
        builder: &mut RowBuilder,
    ) -> Result<()> {
        for label in rsw.unmapped_labels(rm, prefix) {
            let stripped = strip_prefix(&label, prefix);
            if stripped.is_empty() {
                continue;
            }
            let property = meta::auto_mapped_property(
                &stripped,
                self.config.settings.map_underscore_to_camel_case,
            );
            let handler =
                self.config
                    .type_handlers
                    .resolve(None, None, rsw.jdbc_type_of(&label))?;
            let value = handler.get_result(rsw.as_result_set(), ColumnRef::Label(&label))?;
            if !value.is_null() {
                builder.found = true;
                builder.set(&property, value)?;
            } else if self.config.settings.call_setters_on_nulls {
                builder.set(&property, Value::Null)?;
            }
        }
        Ok(())
    }

    fn apply_property_mappings(
        &mut self,
        rsw: &mut ResultSetWrapper,
        rm: &Arc<ResultMap>,
        prefix: Option<&str>,
        builder: &mut RowBuilder,
    ) -> Result<()> {
        for mapping in rm.property_mappings().cloned().collect::<Vec<_>>() {
            if mapping.is_joined_nested() {
                // joined nesting is driven by the row-key algorithm
                continue;
            }
            if let Some(rs_name) = &mapping.result_set {
                let mut key = CacheKey::new();
                key.update(Value::text(rs_name.clone()));
                for column in split_columns(mapping.column.as_deref()) {
                    let label = prefixed(&column, prefix);
                    key.update(Value::text(column.clone()));
                    key.update(rsw.get_by_label(&label)?);
                }
                builder
                    .relations
                    .push((key, mapping.clone(), rs_name.clone()));
                continue;
            }
            if let Some(nested_id) = &mapping.nested_query_id {
                self.apply_nested_query(rsw, &mapping, nested_id, prefix, builder)?;
                continue;
            }
            let Some(column) = &mapping.column else {
                continue;
            };
            let label = prefixed(column, prefix);
            let handler = self.config.type_handlers.resolve(
                mapping.type_handler.as_deref(),
                mapping.data_type,
                mapping.jdbc_type.or_else(|| rsw.jdbc_type_of(&label)),
            )?;
            let value = handler.get_result(rsw.as_result_set(), ColumnRef::Label(&label))?;
            if !value.is_null() {
                builder.found = true;
                builder.set(&mapping.property, value)?;
            } else if self.config.settings.call_setters_on_nulls {
                builder.set(&mapping.property, Value::Null)?;
            }
        }
        Ok(())
    }

    /// One nested sub-query property: eager, lazy, or deferred
    fn apply_nested_query(
        &mut self,
        rsw: &mut ResultSetWrapper,
        mapping: &ResultMapping,
        nested_id: &str,
        prefix: Option<&str>,
        builder: &mut RowBuilder,
    ) -> Result<()> {
        let Some(parameter) = self.nested_query_parameter(rsw, mapping, prefix)? else {
            return Ok(());
        };
        let as_list = mapping.data_type == Some(DataType::Array);
        let nested_ms = self.config.statement(nested_id)?;
        let bound = nested_ms.bound_sql(
            &self.config.type_handlers,
            &parameter,
            self.config.database_id.as_deref(),
        )?;
        let key =
            self.executor
                .create_cache_key(&nested_ms, &parameter, RowBounds::DEFAULT, &bound);

        if self.executor.local_cache_state(&key) == LocalCacheState::InFlight {
            // circular: fill once the in-flight query completes
            builder
                .deferrals
                .push((mapping.property.clone(), key, as_list));
            builder.found = true;
            return Ok(());
        }

        if mapping.lazy {
            builder.lazy_loaders.push((
                mapping.property.clone(),
                Box::new(ResultLoader::new(
                    self.config.clone(),
                    nested_id,
                    parameter,
                    as_list,
                )),
            ));
            builder.found = true;
            return Ok(());
        }

        let rows = self
            .executor
            .query(&nested_ms, parameter, RowBounds::DEFAULT, None)?;
        let value = extract_result(rows, as_list)?;
        if !value.is_null() {
            builder.found = true;
        }
        builder.set(&mapping.property, value)
    }

    /// The nested query's parameter: one column or a composite object
    fn nested_query_parameter(
        &self,
        rsw: &ResultSetWrapper,
        mapping: &ResultMapping,
        prefix: Option<&str>,
    ) -> Result<Option<Value>> {
        if mapping.composites.is_empty() {
            let Some(column) = &mapping.column else {
                return Ok(None);
            };
            let value = rsw.get_by_label(&prefixed(column, prefix))?;
            if value.is_null() {
                return Ok(None);
            }
            return Ok(Some(value));
        }
        let mut composite = Value::empty_object();
        let mut found = false;
        for (property, column) in &mapping.composites {
            let value = rsw.get_by_label(&prefixed(column, prefix))?;
            if !value.is_null() {
                found = true;
            }
            meta::set_path(&mut composite, property, value)?;
        }
        Ok(if found { Some(composite) } else { None })
    }

    /// Materialize the row: plain object, or lazy-backed when loads remain
    fn finish_row(&mut self, builder: RowBuilder) -> Result<Value> {
        if !builder.found {
            return Ok(Value::Null);
        }
        let fields = match builder.root {
            Value::Object(map) => map,
            other => return Ok(other),
        };
        if builder.lazy_loaders.is_empty()
            && builder.deferrals.is_empty()
            && builder.relations.is_empty()
        {
            return Ok(Value::Object(fields));
        }
        let lazy = Arc::new(LazyObject::new(fields));
        if self.config.settings.aggressive_lazy_loading {
            lazy.mark_aggressive();
        }
        for (property, loader) in builder.lazy_loaders {
            lazy.add_loader(property, loader);
        }
        for (property, key, as_list) in builder.deferrals {
            self.executor.defer_load(DeferredLoad {
                key,
                property,
                target: lazy.clone(),
                as_list,
            });
        }
        for (key, mapping, rs_name) in builder.relations {
            self.register_pending(key, &mapping, &rs_name, lazy.clone())?;
        }
        Ok(Value::Lazy(lazy))
    }

    fn register_pending(
        &mut self,
        key: CacheKey,
        mapping: &ResultMapping,
        rs_name: &str,
        target: Arc<LazyObject>,
    ) -> Result<()> {
        if let Some(previous) = self.next_result_maps.get(rs_name) {
            if previous.property != mapping.property {
                return Err(Error::DuplicateResultSet(rs_name.to_string()));
            }
        } else {
            self.next_result_maps
                .insert(rs_name.to_string(), mapping.clone());
        }
        self.pending_relations
            .entry(key)
            .or_default()
            .push(PendingRelation {
                target,
                property: mapping.property.clone(),
                as_list: mapping.data_type == Some(DataType::Array),
            });
        Ok(())
    }

    // =========================================================================
    // Keys, discriminators, positioning
    // =========================================================================

    /// Resolve the discriminator chain, breaking on revisited maps
    fn resolve_discriminator(
        &self,
        rsw: &ResultSetWrapper,
        rm: Arc<ResultMap>,
        prefix: Option<&str>,
    ) -> Result<Arc<ResultMap>> {
        let mut current = rm;
        let mut visited: FxHashSet<String> = FxHashSet::default();
        visited.insert(current.id.clone());

        while let Some(discriminator) = current.discriminator.clone() {
            let label = prefixed(&discriminator.column, prefix);
            let handler = self.config.type_handlers.resolve(
                None,
                discriminator.data_type,
                discriminator.jdbc_type.or_else(|| rsw.jdbc_type_of(&label)),
            )?;
            let value = handler.get_result(rsw.as_result_set(), ColumnRef::Label(&label))?;
            let case_value = value.as_string().unwrap_or_default();
            match discriminator.resolve(&case_value) {
                Some(id) if self.config.has_result_map(id) && visited.insert(id.to_string()) => {
                    current = self.config.result_map(id)?;
                }
                _ => break,
            }
        }
        Ok(current)
    }

    /// Digest a row identity: id columns first, else all mapped non-nested
    /// columns, else (map targets) every column of the result set
    fn create_row_key(
        &self,
        rm: &ResultMap,
        rsw: &ResultSetWrapper,
        prefix: Option<&str>,
    ) -> Result<(CacheKey, bool)> {
        let mut key = CacheKey::new();
        key.update(Value::text(rm.id.clone()));
        let mut found = false;

        let candidates: Vec<&ResultMapping> = if !rm.id_indices.is_empty() {
            rm.id_mappings().collect()
        } else {
            rm.property_mappings()
                .filter(|m| {
                    m.column.is_some()
                        && m.nested_result_map_id.is_none()
                        && m.nested_query_id.is_none()
                })
                .collect()
        };

        for mapping in candidates {
            if let Some(column) = &mapping.column {
                let label = prefixed(column, prefix);
                if !rsw.has_column(&label) {
                    continue;
                }
                let value = rsw.get_by_label(&label)?;
                if !value.is_null() {
                    key.update(Value::text(label));
                    key.update(value);
                    found = true;
                }
            }
        }

        if !found && rm.mappings.is_empty() {
            // a map target digests the full row
            for label in rsw.labels().to_vec() {
                let value = rsw.get_by_label(&label)?;
                if !value.is_null() {
                    key.update(Value::text(label));
                    key.update(value);
                    found = true;
                }
            }
        }

        Ok((key, found))
    }

    fn any_not_null_column(
        &self,
        rsw: &ResultSetWrapper,
        mapping: &ResultMapping,
        prefix: Option<&str>,
    ) -> Result<bool> {
        for column in &mapping.not_null_columns {
            let label = prefixed(column, prefix);
            if rsw.has_column(&label) && !rsw.get_by_label(&label)?.is_null() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn skip_rows(&self, rsw: &mut ResultSetWrapper) -> Result<()> {
        let offset = self.row_bounds.offset;
        if offset == 0 {
            return Ok(());
        }
        if rsw.supports_absolute() {
            rsw.absolute(offset)?;
        } else {
            for _ in 0..offset {
                if !rsw.next()? {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Split a `col` / `col1,col2` attribute into its columns
fn split_columns(columns: Option<&str>) -> Vec<String> {
    columns
        .map(|c| {
            c.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// A single result set collapses to its row list
fn collapse(mut results: Vec<Value>) -> Value {
    if results.len() == 1 {
        results.remove(0)
    } else {
        Value::Array(results)
    }
}

fn combine_prefix(outer: Option<&str>, inner: Option<&str>) -> Option<String> {
    match (outer, inner) {
        (Some(o), Some(i)) => Some(format!("{}{}", o, i)),
        (Some(o), None) => Some(o.to_string()),
        (None, Some(i)) => Some(i.to_string()),
        (None, None) => None,
    }
}

fn first_result_set(
    statement: &mut dyn PreparedStatement,
) -> Result<Option<ResultSetWrapper>> {
    loop {
        if let Some(rs) = statement.result_set()? {
            return Ok(Some(ResultSetWrapper::new(rs)));
        }
        if !statement.more_results()? && statement.update_count()? == -1 {
            return Ok(None);
        }
    }
}

fn next_result_set(
    statement: &mut dyn PreparedStatement,
) -> Result<Option<ResultSetWrapper>> {
    if statement.more_results()? {
        Ok(statement.result_set()?.map(ResultSetWrapper::new))
    } else {
        Ok(None)
    }
}
