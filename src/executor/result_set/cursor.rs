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

//! Streaming cursor over mapped rows
//!
//! A cursor keeps the driver statement open and maps one row per `next`.
//! Cursors cover flat result maps (auto mapping, explicit columns,
//! discriminator dispatch); joined nesting and nested sub-queries need the
//! full result-set handler and are rejected at construction.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::config::{AutoMappingBehavior, Configuration};
use crate::core::{meta, Error, Result, Value};
use crate::driver::PreparedStatement;
use crate::mapping::{parse_data_type, ResultMap, RowBounds};
use crate::types::ColumnRef;

use super::wrapper::{prefixed, strip_prefix, ResultSetWrapper};

/// Lazily maps rows as the caller iterates
pub struct Cursor {
    statement: Box<dyn PreparedStatement>,
    rsw: Option<ResultSetWrapper>,
    config: Arc<Configuration>,
    result_map: Arc<ResultMap>,
    row_bounds: RowBounds,
    fetched: usize,
    skipped: bool,
    closed: bool,
}

impl Cursor {
    pub(crate) fn new(
        statement: Box<dyn PreparedStatement>,
        rsw: Option<ResultSetWrapper>,
        config: Arc<Configuration>,
        result_map: Arc<ResultMap>,
        row_bounds: RowBounds,
    ) -> Result<Self> {
        if result_map.has_nested_result_maps || result_map.has_nested_queries {
            return Err(Error::configuration(format!(
                "cursor over result map '{}' is not supported: nested mappings require a full query",
                result_map.id
            )));
        }
        Ok(Self {
            statement,
            rsw,
            config,
            result_map,
            row_bounds,
            fetched: 0,
            skipped: false,
            closed: false,
        })
    }

    /// Rows fetched so far
    pub fn fetched(&self) -> usize {
        self.fetched
    }

    /// Close the underlying result set and statement
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        if let Some(rsw) = &mut self.rsw {
            rsw.close();
        }
        self.rsw = None;
        self.statement.close();
        self.closed = true;
    }

    fn skip_rows(&mut self) -> Result<()> {
        if self.skipped {
            return Ok(());
        }
        self.skipped = true;
        let offset = self.row_bounds.offset;
        let Some(rsw) = &mut self.rsw else {
            return Ok(());
        };
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

    fn fetch_row(&mut self) -> Result<Option<Value>> {
        self.skip_rows()?;
        if self.fetched >= self.row_bounds.limit {
            return Ok(None);
        }
        let Some(rsw) = &mut self.rsw else {
            return Ok(None);
        };
        if !rsw.next()? {
            return Ok(None);
        }
        let rm = resolve_discriminator(&self.config, rsw, self.result_map.clone())?;
        let row = map_simple_row(&self.config, rsw, &rm)?;
        self.fetched += 1;
        Ok(Some(row))
    }
}

impl Iterator for Cursor {
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        match self.fetch_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.close();
                None
            }
            Err(err) => {
                self.close();
                Some(Err(err))
            }
        }
    }
}

impl Drop for Cursor {
    fn drop(&mut self) {
        self.close();
    }
}

/// Discriminator dispatch without executor access
fn resolve_discriminator(
    config: &Configuration,
    rsw: &ResultSetWrapper,
    rm: Arc<ResultMap>,
) -> Result<Arc<ResultMap>> {
    let mut current = rm;
    let mut visited: FxHashSet<String> = FxHashSet::default();
    visited.insert(current.id.clone());
    while let Some(discriminator) = current.discriminator.clone() {
        let handler = config.type_handlers.resolve(
            None,
            discriminator.data_type,
            discriminator
                .jdbc_type
                .or_else(|| rsw.jdbc_type_of(&discriminator.column)),
        )?;
        let value = handler.get_result(rsw.as_result_set(), ColumnRef::Label(&discriminator.column))?;
        let case_value = value.as_string().unwrap_or_default();
        match discriminator.resolve(&case_value) {
            Some(id) if config.has_result_map(id) && visited.insert(id.to_string()) => {
                current = config.result_map(id)?;
            }
            _ => break,
        }
    }
    Ok(current)
}

/// Flat row mapping: scalar shortcut, auto mapping, explicit columns
fn map_simple_row(
    config: &Configuration,
    rsw: &ResultSetWrapper,
    rm: &ResultMap,
) -> Result<Value> {
    if rm.mappings.is_empty() && rsw.column_count() == 1 {
        let type_name = config.resolve_type_alias(&rm.type_name).to_string();
        if let Ok(data_type) = parse_data_type(&type_name) {
            if config.type_handlers.has_handler(data_type) {
                let handler = config.type_handlers.resolve(None, Some(data_type), None)?;
                return handler.get_result(rsw.as_result_set(), ColumnRef::Index(1));
            }
        }
    }

    let mut row = Value::empty_object();
    let mut found = false;

    let auto = rm
        .auto_mapping
        .unwrap_or(config.settings.auto_mapping_behavior != AutoMappingBehavior::None);
    if auto {
        for label in rsw.unmapped_labels(rm, None) {
            let stripped = strip_prefix(&label, None);
            let property = meta::auto_mapped_property(
                &stripped,
                config.settings.map_underscore_to_camel_case,
            );
            let handler = config
                .type_handlers
                .resolve(None, None, rsw.jdbc_type_of(&label))?;
            let value = handler.get_result(rsw.as_result_set(), ColumnRef::Label(&label))?;
            if !value.is_null() {
                found = true;
                meta::set_path(&mut row, &property, value)?;
            }
        }
    }

    for mapping in rm.property_mappings() {
        let Some(column) = &mapping.column else {
            continue;
        };
        let label = prefixed(column, None);
        let handler = config.type_handlers.resolve(
            mapping.type_handler.as_deref(),
            mapping.data_type,
            mapping.jdbc_type.or_else(|| rsw.jdbc_type_of(&label)),
        )?;
        let value = handler.get_result(rsw.as_result_set(), ColumnRef::Label(&label))?;
        if !value.is_null() {
            found = true;
            meta::set_path(&mut row, &mapping.property, value)?;
        }
    }

    if found {
        Ok(row)
    } else {
        Ok(Value::Null)
    }
}
