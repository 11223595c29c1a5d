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

//! Mapper proxies: the explicit dispatch table
//!
//! A proxy routes each method call to its compiled [`MapperMethod`],
//! memoized per method name with compute-if-absent semantics. Proxies are
//! long-lived and thread-safe; the [`Mapper`] handle borrows one session
//! and is as single-threaded as the session itself.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::config::Configuration;
use crate::core::{FromValue, Result, Value};
use crate::executor::{Cursor, ResultHandler};
use crate::mapping::RowBounds;
use crate::session::SqlSession;

use super::method::MapperMethod;
use super::params::Args;

/// Dispatch table of one mapper interface
pub struct MapperProxy {
    namespace: String,
    methods: RwLock<FxHashMap<String, Arc<MapperMethod>>>,
}

impl MapperProxy {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            methods: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The compiled method, built on first use
    pub fn method(&self, config: &Configuration, name: &str) -> Result<Arc<MapperMethod>> {
        if let Some(method) = self.methods.read().get(name) {
            return Ok(method.clone());
        }
        let compiled = Arc::new(MapperMethod::compile(config, &self.namespace, name)?);
        let mut methods = self.methods.write();
        Ok(methods
            .entry(name.to_string())
            .or_insert(compiled)
            .clone())
    }
}

/// Shared cache of mapper proxies across sessions
#[derive(Default)]
pub struct ProxyCache {
    proxies: RwLock<FxHashMap<String, Arc<MapperProxy>>>,
}

impl ProxyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The proxy of `namespace`, created on first use
    pub fn proxy(&self, namespace: &str) -> Arc<MapperProxy> {
        if let Some(proxy) = self.proxies.read().get(namespace) {
            return proxy.clone();
        }
        let created = Arc::new(MapperProxy::new(namespace));
        let mut proxies = self.proxies.write();
        proxies
            .entry(namespace.to_string())
            .or_insert(created)
            .clone()
    }
}

/// A mapper interface bound to one session
pub struct Mapper<'s> {
    session: &'s mut SqlSession,
    proxy: Arc<MapperProxy>,
}

impl<'s> Mapper<'s> {
    pub(crate) fn new(session: &'s mut SqlSession, proxy: Arc<MapperProxy>) -> Self {
        Self { session, proxy }
    }

    /// Call a mapper method
    pub fn call(&mut self, method: &str, args: Args) -> Result<Value> {
        let config = self.session.configuration();
        let compiled = self.proxy.method(&config, method)?;
        compiled.execute(self.session, args, None, None)
    }

    /// Call a mapper method with row bounds
    pub fn call_bounds(&mut self, method: &str, args: Args, bounds: RowBounds) -> Result<Value> {
        let config = self.session.configuration();
        let compiled = self.proxy.method(&config, method)?;
        compiled.execute(self.session, args, Some(bounds), None)
    }

    /// Call a mapper method, streaming rows into `handler`
    pub fn call_with_handler(
        &mut self,
        method: &str,
        args: Args,
        handler: &mut dyn ResultHandler,
    ) -> Result<()> {
        let config = self.session.configuration();
        let compiled = self.proxy.method(&config, method)?;
        compiled
            .execute(self.session, args, None, Some(handler))
            .map(|_| ())
    }

    /// Call a mapper method and convert the result to `T`
    pub fn call_as<T: FromValue>(&mut self, method: &str, args: Args) -> Result<T> {
        let value = self.call(method, args)?;
        T::from_value(&value)
    }

    /// Call a cursor-returning mapper method
    pub fn cursor(&mut self, method: &str, args: Args) -> Result<Cursor> {
        let config = self.session.configuration();
        let compiled = self.proxy.method(&config, method)?;
        compiled.execute_cursor(self.session, args, None)
    }
}
