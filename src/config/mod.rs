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

//! The configuration registry
//!
//! Holds everything built at load time: settings, the environment, type
//! handlers and aliases, mapped statements, result maps, namespace caches
//! and cache refs, and the declared mapper interfaces. Mutable while
//! building, then frozen behind an `Arc` and shared by every session.

use std::collections::HashMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::binding::MapperRegistry;
use crate::cache::Cache;
use crate::core::{Error, Result};
use crate::driver::DataSource;
use crate::mapping::{MappedStatement, ResultMap};
use crate::types::TypeHandlerRegistry;

pub mod object_factory;
pub mod settings;
pub mod xml;

pub use object_factory::{ConstructorSignature, ObjectFactory, TypeDescriptor};
pub use settings::{AutoMappingBehavior, ExecutorType, LocalCacheScope, Settings};

/// One configured environment: a data source plus its transaction policy
#[derive(Clone)]
pub struct Environment {
    /// Environment id from the configuration document
    pub id: String,
    /// Connection factory
    pub data_source: Arc<dyn DataSource>,
    /// Transactions are managed by an external coordinator (the engine
    /// then never calls commit/rollback on the connection itself)
    pub managed: bool,
}

impl Environment {
    pub fn new(id: impl Into<String>, data_source: Arc<dyn DataSource>) -> Self {
        Self {
            id: id.into(),
            data_source,
            managed: false,
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("id", &self.id)
            .field("managed", &self.managed)
            .finish()
    }
}

/// The registry of everything the engine compiled at load time
pub struct Configuration {
    /// Engine settings
    pub settings: Settings,
    /// Vendor id used to filter `databaseId`-tagged statements
    pub database_id: Option<String>,
    /// Properties available to `${}` placeholder resolution
    pub properties: HashMap<String, String>,
    /// Type handler registry
    pub type_handlers: TypeHandlerRegistry,
    /// Result object factory
    pub object_factory: ObjectFactory,
    /// Declared mapper interfaces
    pub mapper_registry: MapperRegistry,
    /// Active environment
    pub environment: Option<Environment>,

    type_aliases: FxHashMap<String, String>,
    mapped_statements: FxHashMap<String, Arc<MappedStatement>>,
    result_maps: FxHashMap<String, Arc<ResultMap>>,
    caches: FxHashMap<String, Arc<dyn Cache>>,
    cache_refs: FxHashMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new()
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            database_id: None,
            properties: HashMap::new(),
            type_handlers: TypeHandlerRegistry::new(),
            object_factory: ObjectFactory::new(),
            mapper_registry: MapperRegistry::new(),
            environment: None,
            type_aliases: FxHashMap::default(),
            mapped_statements: FxHashMap::default(),
            result_maps: FxHashMap::default(),
            caches: FxHashMap::default(),
            cache_refs: FxHashMap::default(),
        }
    }

    // =========================================================================
    // Statements
    // =========================================================================

    /// Register a mapped statement; duplicate ids are fatal
    pub fn add_statement(&mut self, statement: MappedStatement) -> Result<()> {
        if self.mapped_statements.contains_key(&statement.id) {
            return Err(Error::DuplicateStatement(statement.id));
        }
        self.mapped_statements
            .insert(statement.id.clone(), Arc::new(statement));
        Ok(())
    }

    /// Look up a mapped statement by its full id
    pub fn statement(&self, id: &str) -> Result<Arc<MappedStatement>> {
        self.mapped_statements
            .get(id)
            .cloned()
            .ok_or_else(|| Error::StatementNotFound(id.to_string()))
    }

    /// True if a statement is registered under `id`
    pub fn has_statement(&self, id: &str) -> bool {
        self.mapped_statements.contains_key(id)
    }

    // =========================================================================
    // Result maps
    // =========================================================================

    /// Register a result map
    pub fn add_result_map(&mut self, result_map: ResultMap) -> Result<()> {
        if self.result_maps.contains_key(&result_map.id) {
            return Err(Error::Configuration(format!(
                "result map '{}' is already registered",
                result_map.id
            )));
        }
        self.result_maps
            .insert(result_map.id.clone(), Arc::new(result_map));
        Ok(())
    }

    /// Look up a result map by id
    pub fn result_map(&self, id: &str) -> Result<Arc<ResultMap>> {
        self.result_maps
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnresolvedResultMap(id.to_string()))
    }

    /// True if a result map is registered under `id`
    pub fn has_result_map(&self, id: &str) -> bool {
        self.result_maps.contains_key(id)
    }

    // =========================================================================
    // Caches
    // =========================================================================

    /// Register a namespace cache
    pub fn add_cache(&mut self, cache: Arc<dyn Cache>) {
        self.caches.insert(cache.id().to_string(), cache);
    }

    /// Register a cache-ref: `namespace` shares `referenced`'s cache
    pub fn add_cache_ref(
        &mut self,
        namespace: impl Into<String>,
        referenced: impl Into<String>,
    ) {
        self.cache_refs.insert(namespace.into(), referenced.into());
    }

    /// The cache of `namespace`, following at most one cache-ref hop
    pub fn cache(&self, namespace: &str) -> Option<Arc<dyn Cache>> {
        if let Some(cache) = self.caches.get(namespace) {
            return Some(cache.clone());
        }
        let referenced = self.cache_refs.get(namespace)?;
        self.caches.get(referenced).cloned()
    }

    /// Validate that every cache-ref points at an existing cache
    pub fn check_cache_refs(&self) -> Result<()> {
        for referenced in self.cache_refs.values() {
            if !self.caches.contains_key(referenced) {
                return Err(Error::CacheRefNotFound(referenced.clone()));
            }
        }
        Ok(())
    }

    /// Iterate over every registered statement
    pub fn statements(&self) -> impl Iterator<Item = &Arc<MappedStatement>> {
        self.mapped_statements.values()
    }

    /// Iterate over every registered result map
    pub fn result_maps(&self) -> impl Iterator<Item = &Arc<ResultMap>> {
        self.result_maps.values()
    }

    /// Resolve every deferred cross-reference or fail
    ///
    /// Checks cache-refs, statement result-map references, nested
    /// result-map references and discriminator cases. Called once when the
    /// session factory is built, after all mappers loaded.
    pub fn validate_references(&self) -> Result<()> {
        self.check_cache_refs()?;
        for statement in self.mapped_statements.values() {
            for id in &statement.result_map_ids {
                if !self.result_maps.contains_key(id) {
                    return Err(Error::UnresolvedResultMap(id.clone()));
                }
            }
        }
        for result_map in self.result_maps.values() {
            for mapping in &result_map.mappings {
                if let Some(nested) = &mapping.nested_result_map_id {
                    if !self.result_maps.contains_key(nested) {
                        return Err(Error::UnresolvedResultMap(nested.clone()));
                    }
                }
            }
            if let Some(discriminator) = &result_map.discriminator {
                for (_, case_id) in &discriminator.cases {
                    if !self.result_maps.contains_key(case_id) {
                        return Err(Error::UnresolvedResultMap(case_id.clone()));
                    }
                }
            }
        }
        Ok(())
    }

    // =========================================================================
    // Type aliases
    // =========================================================================

    /// Register a type alias
    pub fn add_type_alias(&mut self, alias: impl Into<String>, type_name: impl Into<String>) {
        self.type_aliases.insert(alias.into(), type_name.into());
    }

    /// Resolve an alias to its type name; unaliased names pass through
    pub fn resolve_type_alias<'a>(&'a self, alias: &'a str) -> &'a str {
        self.type_aliases
            .get(alias)
            .map(String::as_str)
            .unwrap_or(alias)
    }
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("settings", &self.settings)
            .field("database_id", &self.database_id)
            .field("statements", &self.mapped_statements.len())
            .field("result_maps", &self.result_maps.len())
            .field("caches", &self.caches.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheBuilder;
    use crate::mapping::StatementKind;
    use crate::scripting::SqlSource;

    fn statement(id: &str) -> MappedStatement {
        MappedStatement::builder(
            id,
            StatementKind::Select,
            SqlSource::static_sql("select 1", Vec::new()),
        )
        .build()
    }

    #[test]
    fn test_duplicate_statement_rejected() {
        let mut config = Configuration::new();
        config.add_statement(statement("blog.selectPost")).unwrap();
        assert!(matches!(
            config.add_statement(statement("blog.selectPost")),
            Err(Error::DuplicateStatement(_))
        ));
    }

    #[test]
    fn test_statement_lookup() {
        let mut config = Configuration::new();
        config.add_statement(statement("blog.selectPost")).unwrap();
        assert!(config.statement("blog.selectPost").is_ok());
        assert!(matches!(
            config.statement("blog.missing"),
            Err(Error::StatementNotFound(_))
        ));
    }

    #[test]
    fn test_cache_ref_resolution() {
        let mut config = Configuration::new();
        config.add_cache(CacheBuilder::new("blog.PostMapper").build());
        config.add_cache_ref("blog.CommentMapper", "blog.PostMapper");

        let direct = config.cache("blog.PostMapper").unwrap();
        let referenced = config.cache("blog.CommentMapper").unwrap();
        assert_eq!(direct.id(), referenced.id());
        assert!(config.cache("blog.Other").is_none());
        config.check_cache_refs().unwrap();
    }

    #[test]
    fn test_dangling_cache_ref_detected() {
        let mut config = Configuration::new();
        config.add_cache_ref("blog.CommentMapper", "blog.Missing");
        assert!(matches!(
            config.check_cache_refs(),
            Err(Error::CacheRefNotFound(_))
        ));
    }

    #[test]
    fn test_type_alias_passthrough() {
        let mut config = Configuration::new();
        config.add_type_alias("Post", "blog.model.Post");
        assert_eq!(config.resolve_type_alias("Post"), "blog.model.Post");
        assert_eq!(config.resolve_type_alias("Other"), "Other");
    }
}
