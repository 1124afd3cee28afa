// Operation registry
//
// Binds catalog entries to capability provider operations. The binding
// table is built once at startup; a catalog entry with no operation (or an
// operation with no catalog entry) is a build-time integrity violation and
// fails construction.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::ProviderError;
use crate::tools::catalog::{self, ToolSpec};
use crate::tools::normalize::Args;

/// A provider-owned operation, invoked with normalized arguments.
///
/// Implementations must return a described failure rather than panic;
/// the dispatcher treats `call` as the whole provider contract.
#[async_trait]
pub trait Operation: Send + Sync {
    async fn call(&self, args: &Args) -> Result<String, ProviderError>;
}

/// Immutable binding table from tool name to operation
pub struct Registry {
    ops: HashMap<String, Box<dyn Operation>>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("ops", &self.ops.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            ops: HashMap::new(),
        }
    }

    /// Look up the operation bound to a catalog name
    pub fn get(&self, name: &str) -> Option<&dyn Operation> {
        self.ops.get(name).map(|op| op.as_ref())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Builder collecting bindings before the integrity check
pub struct RegistryBuilder {
    ops: HashMap<String, Box<dyn Operation>>,
}

impl RegistryBuilder {
    /// Bind an operation to a tool name
    pub fn register(mut self, name: &str, op: Box<dyn Operation>) -> Self {
        self.ops.insert(name.to_string(), op);
        self
    }

    /// Verify the bindings cover the catalog exactly and build the registry
    pub fn finish(self) -> Result<Registry> {
        self.finish_against(catalog::catalog())
    }

    /// Integrity check against an explicit catalog (tests use a subset)
    pub fn finish_against(self, specs: &[ToolSpec]) -> Result<Registry> {
        for spec in specs {
            if !self.ops.contains_key(spec.name) {
                bail!("catalog entry '{}' has no bound operation", spec.name);
            }
        }
        for name in self.ops.keys() {
            if !specs.iter().any(|spec| spec.name == name) {
                bail!("operation '{}' has no catalog entry", name);
            }
        }
        Ok(Registry { ops: self.ops })
    }
}
