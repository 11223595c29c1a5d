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

//! The dynamic SQL compiler: node trees, evaluation context, SQL sources

pub mod context;
pub mod node;
pub mod source;

pub use context::{DynamicContext, DATABASE_ID_KEY, PARAMETER_OBJECT_KEY};
pub use node::{itemize, SqlNode};
pub use source::SqlSource;
