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

//! # Sqlbind - SQL mapping and execution engine
//!
//! Sqlbind turns declarative XML statement mappings into parameterized SQL,
//! executes it against any JDBC-style relational driver, and materializes
//! rows into object trees - including joined one-to-many nesting, nested
//! sub-queries with lazy loading, and discriminator dispatch.
//!
//! ## Key Features
//!
//! - **Dynamic SQL** - `<if>`, `<choose>`, `<where>`, `<set>`, `<trim>`,
//!   `<foreach>`, `<bind>`, `${}` substitution and `#{}` binding
//! - **Two-tier caching** - a session-scoped first level and a shared
//!   namespace second level with LRU/FIFO/soft/weak eviction, interval
//!   flushing, per-key blocking and transactional staging
//! - **Result mapping** - automatic column mapping, constructor mapping,
//!   discriminators, nested result maps with row-key deduplication,
//!   multi-result-set linkage and streaming cursors
//! - **Mapper dispatch** - declared mapper interfaces routed through
//!   memoized per-method dispatch tables
//!
//! ## Quick Start
//!
//! ```ignore
//! use sqlbind::session::SqlSessionFactory;
//! use sqlbind::config::{Configuration, Environment};
//! use sqlbind::config::xml::XmlMapperBuilder;
//! use sqlbind::{args, Value};
//!
//! let mut config = Configuration::new();
//! config.environment = Some(Environment::new("dev", data_source));
//! XmlMapperBuilder::parse(&mut config, mapper_xml)?;
//!
//! let factory = SqlSessionFactory::new(config)?;
//! let mut session = factory.open_session()?;
//! let posts = session.select_list("blog.PostMapper.selectPosts", Value::Null)?;
//! session.commit()?;
//! ```
//!
//! ## Modules
//!
//! - [`core`] - values, errors, lazy objects, property traversal
//! - [`parsing`] - placeholder token scanning and property paths
//! - [`expr`] - the test-expression engine
//! - [`scripting`] - dynamic SQL nodes, evaluation context, SQL sources
//! - [`mapping`] - compiled statements, result maps, bound SQL
//! - [`cache`] - cache keys, decorators, transactional staging
//! - [`types`] - JDBC type codes and type handlers
//! - [`driver`] - the driver contract this engine executes against
//! - [`executor`] - the execution pipeline and result-set mapper
//! - [`binding`] - mapper interfaces and dispatch
//! - [`session`] - session factory and sessions
//! - [`config`] - the configuration registry and XML builders

pub mod binding;
pub mod cache;
pub mod config;
pub mod core;
pub mod driver;
pub mod executor;
pub mod expr;
pub mod mapping;
pub mod parsing;
pub mod scripting;
pub mod session;
pub mod types;

// Re-export core types for convenience
pub use core::{DataType, Error, FromValue, LazyObject, MetaObject, ObjectMap, Result, Value};

// Re-export the mapping model
pub use mapping::{
    BoundSql, MappedStatement, ParameterMapping, ParameterMode, ResultMap, ResultMapping,
    RowBounds, StatementKind, StatementType,
};

// Re-export cache types
pub use cache::{Cache, CacheBuilder, CacheKey, Eviction, PerpetualCache, TransactionalCache};

// Re-export the execution surface
pub use executor::{
    BatchResult, Cursor, DefaultResultHandler, Executor, ResultContext, ResultHandler,
};

// Re-export session and binding entry points
pub use binding::{Args, Mapper, MapperSpec, MethodSpec, ReturnShape, ToParam};
pub use config::{Configuration, Environment, ExecutorType, Settings};
pub use session::{SqlSession, SqlSessionFactory};

// Re-export type handling
pub use types::{JdbcType, TypeHandler, TypeHandlerRegistry};
