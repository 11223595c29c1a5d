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

//! Result-set wrapper: metadata-aware access during row mapping

use crate::core::{Result, Value};
use crate::driver::ResultSet;
use crate::mapping::ResultMap;
use crate::types::JdbcType;

/// A driver result set plus cached metadata helpers
pub struct ResultSetWrapper {
    result_set: Box<dyn ResultSet>,
    labels: Vec<String>,
}

impl ResultSetWrapper {
    pub fn new(result_set: Box<dyn ResultSet>) -> Self {
        let labels = result_set
            .metadata()
            .columns
            .iter()
            .map(|c| c.label.clone())
            .collect();
        Self { result_set, labels }
    }

    pub fn column_count(&self) -> usize {
        self.labels.len()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn jdbc_type_of(&self, label: &str) -> Option<JdbcType> {
        self.result_set.metadata().jdbc_type_of(label)
    }

    pub fn has_column(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    pub fn next(&mut self) -> Result<bool> {
        self.result_set.next()
    }

    pub fn supports_absolute(&self) -> bool {
        self.result_set.supports_absolute()
    }

    pub fn absolute(&mut self, row: usize) -> Result<bool> {
        self.result_set.absolute(row)
    }

    pub fn get_by_label(&self, label: &str) -> Result<Value> {
        self.result_set.get_by_label(label)
    }

    pub fn get_by_index(&self, index: usize) -> Result<Value> {
        self.result_set.get_by_index(index)
    }

    pub fn as_result_set(&self) -> &dyn ResultSet {
        self.result_set.as_ref()
    }

    pub fn close(&mut self) {
        self.result_set.close();
    }

    /// Column labels not explicitly mapped by `result_map` under `prefix`
    ///
    /// With a prefix, only columns carrying the prefix are candidates; the
    /// prefix is stripped before the mapped-column check and the returned
    /// label keeps its original form.
    pub fn unmapped_labels(&self, result_map: &ResultMap, prefix: Option<&str>) -> Vec<String> {
        self.labels
            .iter()
            .filter(|label| match prefix {
                None => !result_map.maps_column(label),
                Some(prefix) => {
                    let upper = label.to_ascii_uppercase();
                    let upper_prefix = prefix.to_ascii_uppercase();
                    match upper.strip_prefix(&upper_prefix) {
                        Some(stripped) => !result_map.maps_column(stripped),
                        None => false,
                    }
                }
            })
            .cloned()
            .collect()
    }
}

/// Prepend a column prefix to a column label
pub fn prefixed(column: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{}{}", prefix, column),
        _ => column.to_string(),
    }
}

/// Strip a column prefix off a label, case-insensitively
pub fn strip_prefix(label: &str, prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) if !prefix.is_empty() => {
            let upper = label.to_ascii_uppercase();
            let upper_prefix = prefix.to_ascii_uppercase();
            if upper.starts_with(&upper_prefix) {
                label[prefix.len()..].to_string()
            } else {
                label.to_string()
            }
        }
        _ => label.to_string(),
    }
}
