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

//! Streaming result handling
//!
//! A user-supplied [`ResultHandler`] receives each mapped row through a
//! [`ResultContext`] and may stop the stream early.

use crate::core::Value;

/// One mapped row handed to a result handler
#[derive(Debug)]
pub struct ResultContext {
    object: Value,
    result_count: usize,
    stopped: bool,
}

impl ResultContext {
    pub(crate) fn new(object: Value, result_count: usize) -> Self {
        Self {
            object,
            result_count,
            stopped: false,
        }
    }

    /// The mapped row object
    pub fn result_object(&self) -> &Value {
        &self.object
    }

    /// Rows delivered so far, including this one
    pub fn result_count(&self) -> usize {
        self.result_count
    }

    /// Stop processing after this row
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    /// True once [`ResultContext::stop`] was called
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Receives mapped rows as they stream out of the result set
pub trait ResultHandler {
    fn handle_result(&mut self, context: &mut ResultContext);
}

/// Collects every row into a list
#[derive(Debug, Default)]
pub struct DefaultResultHandler {
    rows: Vec<Value>,
}

impl DefaultResultHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected rows
    pub fn into_rows(self) -> Vec<Value> {
        self.rows
    }
}

impl ResultHandler for DefaultResultHandler {
    fn handle_result(&mut self, context: &mut ResultContext) {
        self.rows.push(context.result_object().clone());
    }
}
