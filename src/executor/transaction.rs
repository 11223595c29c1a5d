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

//! Transaction-scoped connection holder
//!
//! A connection is acquired lazily on first use and released when the
//! executor closes. Under a managed environment, commit and rollback are
//! left to the external coordinator.

use std::sync::Arc;

use log::debug;

use crate::core::{Error, Result};
use crate::driver::{Connection, DataSource};

/// Connection lifecycle for one executor
pub struct Transaction {
    data_source: Arc<dyn DataSource>,
    connection: Option<Box<dyn Connection>>,
    auto_commit: bool,
    managed: bool,
    /// Remaining transaction budget in seconds, when the caller set one
    timeout: Option<u64>,
}

impl Transaction {
    pub fn new(data_source: Arc<dyn DataSource>, auto_commit: bool, managed: bool) -> Self {
        Self {
            data_source,
            connection: None,
            auto_commit,
            managed,
            timeout: None,
        }
    }

    /// Limit the whole transaction to `seconds`
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = Some(seconds);
        self
    }

    /// The transaction's remaining-time budget
    pub fn timeout(&self) -> Option<u64> {
        self.timeout
    }

    /// True once a connection has been acquired
    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    /// The connection, acquired on first use
    pub fn connection(&mut self) -> Result<&mut dyn Connection> {
        if self.connection.is_none() {
            debug!("opening driver connection (auto_commit={})", self.auto_commit);
            let mut connection = self.data_source.connection()?;
            connection.set_auto_commit(self.auto_commit)?;
            self.connection = Some(connection);
        }
        match &mut self.connection {
            Some(connection) => Ok(connection.as_mut()),
            None => Err(Error::driver("connection unavailable")),
        }
    }

    /// Commit the driver transaction (no-op when managed or auto-commit)
    pub fn commit(&mut self) -> Result<()> {
        if self.managed || self.auto_commit {
            return Ok(());
        }
        if let Some(connection) = &mut self.connection {
            connection.commit()?;
        }
        Ok(())
    }

    /// Roll back the driver transaction (no-op when managed or auto-commit)
    pub fn rollback(&mut self) -> Result<()> {
        if self.managed || self.auto_commit {
            return Ok(());
        }
        if let Some(connection) = &mut self.connection {
            connection.rollback()?;
        }
        Ok(())
    }

    /// Release the connection
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut connection) = self.connection.take() {
            connection.close()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("auto_commit", &self.auto_commit)
            .field("managed", &self.managed)
            .field("open", &self.connection.is_some())
            .finish()
    }
}
