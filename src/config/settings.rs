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

//! Engine settings
//!
//! The `<settings>` vocabulary. Keys are validated against the known names;
//! an unknown key is fatal at configuration load.

use std::str::FromStr;

use crate::core::{Error, Result};

/// Global automatic column-to-property mapping behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoMappingBehavior {
    /// Never auto-map
    None,
    /// Auto-map only results without nested result maps
    #[default]
    Partial,
    /// Auto-map everything, nested or not
    Full,
}

impl FromStr for AutoMappingBehavior {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(AutoMappingBehavior::None),
            "PARTIAL" => Ok(AutoMappingBehavior::Partial),
            "FULL" => Ok(AutoMappingBehavior::Full),
            other => Err(Error::configuration(format!(
                "unknown autoMappingBehavior '{}'",
                other
            ))),
        }
    }
}

/// Lifetime of the session-scoped first-level cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocalCacheScope {
    /// Entries live until commit/rollback/close
    #[default]
    Session,
    /// Entries are dropped after each top-level statement
    Statement,
}

impl FromStr for LocalCacheScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SESSION" => Ok(LocalCacheScope::Session),
            "STATEMENT" => Ok(LocalCacheScope::Statement),
            other => Err(Error::configuration(format!(
                "unknown localCacheScope '{}'",
                other
            ))),
        }
    }
}

/// Statement execution strategy of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutorType {
    /// Fresh statement per call
    #[default]
    Simple,
    /// Reuse prepared statements keyed by SQL text
    Reuse,
    /// Group consecutive writes into driver batches
    Batch,
}

impl FromStr for ExecutorType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(ExecutorType::Simple),
            "REUSE" => Ok(ExecutorType::Reuse),
            "BATCH" => Ok(ExecutorType::Batch),
            other => Err(Error::configuration(format!(
                "unknown executor type '{}'",
                other
            ))),
        }
    }
}

/// All engine settings with their defaults
#[derive(Debug, Clone)]
pub struct Settings {
    pub cache_enabled: bool,
    pub lazy_loading_enabled: bool,
    pub aggressive_lazy_loading: bool,
    pub multiple_result_sets_enabled: bool,
    pub use_generated_keys: bool,
    pub auto_mapping_behavior: AutoMappingBehavior,
    pub map_underscore_to_camel_case: bool,
    pub local_cache_scope: LocalCacheScope,
    pub default_executor_type: ExecutorType,
    pub default_statement_timeout: Option<u64>,
    pub call_setters_on_nulls: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            lazy_loading_enabled: false,
            aggressive_lazy_loading: false,
            multiple_result_sets_enabled: true,
            use_generated_keys: false,
            auto_mapping_behavior: AutoMappingBehavior::Partial,
            map_underscore_to_camel_case: false,
            local_cache_scope: LocalCacheScope::Session,
            default_executor_type: ExecutorType::Simple,
            default_statement_timeout: None,
            call_setters_on_nulls: false,
        }
    }
}

impl Settings {
    /// Apply one named setting; unknown names are fatal
    pub fn apply(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "cacheEnabled" => self.cache_enabled = parse_bool(name, value)?,
            "lazyLoadingEnabled" => self.lazy_loading_enabled = parse_bool(name, value)?,
            "aggressiveLazyLoading" => self.aggressive_lazy_loading = parse_bool(name, value)?,
            "multipleResultSetsEnabled" => {
                self.multiple_result_sets_enabled = parse_bool(name, value)?
            }
            "useGeneratedKeys" => self.use_generated_keys = parse_bool(name, value)?,
            "autoMappingBehavior" => self.auto_mapping_behavior = value.parse()?,
            "mapUnderscoreToCamelCase" => {
                self.map_underscore_to_camel_case = parse_bool(name, value)?
            }
            "localCacheScope" => self.local_cache_scope = value.parse()?,
            "defaultExecutorType" => self.default_executor_type = value.parse()?,
            "defaultStatementTimeout" => {
                self.default_statement_timeout = Some(value.parse().map_err(|_| {
                    Error::configuration(format!("invalid defaultStatementTimeout '{}'", value))
                })?)
            }
            "callSettersOnNulls" => self.call_setters_on_nulls = parse_bool(name, value)?,
            other => return Err(Error::UnknownSetting(other.to_string())),
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(Error::configuration(format!(
            "setting '{}' expects true/false, got '{}'",
            name, other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.cache_enabled);
        assert!(!settings.lazy_loading_enabled);
        assert_eq!(
            settings.auto_mapping_behavior,
            AutoMappingBehavior::Partial
        );
        assert_eq!(settings.local_cache_scope, LocalCacheScope::Session);
        assert_eq!(settings.default_executor_type, ExecutorType::Simple);
    }

    #[test]
    fn test_apply_known_settings() {
        let mut settings = Settings::default();
        settings.apply("cacheEnabled", "false").unwrap();
        settings.apply("autoMappingBehavior", "FULL").unwrap();
        settings.apply("localCacheScope", "STATEMENT").unwrap();
        settings.apply("defaultStatementTimeout", "30").unwrap();

        assert!(!settings.cache_enabled);
        assert_eq!(settings.auto_mapping_behavior, AutoMappingBehavior::Full);
        assert_eq!(settings.local_cache_scope, LocalCacheScope::Statement);
        assert_eq!(settings.default_statement_timeout, Some(30));
    }

    #[test]
    fn test_unknown_setting_is_fatal() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.apply("cacheSize", "10"),
            Err(Error::UnknownSetting("cacheSize".to_string()))
        );
    }

    #[test]
    fn test_bad_boolean_rejected() {
        let mut settings = Settings::default();
        assert!(settings.apply("cacheEnabled", "yes").is_err());
    }
}
