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

//! Compiled mapping model: statements, parameter mappings, result maps and
//! bound SQL

pub mod bound_sql;
pub mod parameter;
pub mod result_map;
pub mod row_bounds;
pub mod statement;

pub use bound_sql::BoundSql;
pub use parameter::{parse_data_type, ParameterMapping, ParameterMode};
pub use result_map::{Discriminator, ResultFlags, ResultMap, ResultMapBuilder, ResultMapping};
pub use row_bounds::RowBounds;
pub use statement::{
    KeyGeneratorSpec, MappedStatement, MappedStatementBuilder, StatementKind, StatementType,
};
