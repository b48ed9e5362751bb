//! Capability bridge shape.
//!
//! The bridge is owned by the caller and passed to the engine at
//! construction. It enumerates the host modules a plugin may import from,
//! each a set of named functions with i32-only signatures. The engine
//! registers every entry into its backend linker before instantiation;
//! imports the bridge cannot satisfy fail construction, never a later call.

use std::sync::Arc;

use crate::error::HostFnError;

/// A host-callable implementation backing one imported function.
///
/// Receives the module's arguments and returns the values to hand back.
/// Returning an error traps the calling module.
pub type HostFn = Arc<dyn Fn(&[i32]) -> Result<Vec<i32>, HostFnError> + Send + Sync>;

/// One named function inside a host module.
#[derive(Clone)]
pub struct HostFunction {
  name: String,
  params: usize,
  results: usize,
  callback: HostFn,
}

impl HostFunction {
  /// The import name a module uses to reference this function.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// Number of i32 parameters in the declared signature.
  pub fn params(&self) -> usize {
    self.params
  }

  /// Number of i32 results in the declared signature.
  pub fn results(&self) -> usize {
    self.results
  }

  /// The host implementation.
  pub fn callback(&self) -> HostFn {
    self.callback.clone()
  }
}

/// A named host module: a group of functions a plugin imports under one
/// module name (e.g. `env` or `wasi_snapshot_preview1`).
#[derive(Clone)]
pub struct HostModule {
  name: String,
  functions: Vec<HostFunction>,
}

impl HostModule {
  /// Create an empty host module with the given import-module name.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      functions: Vec::new(),
    }
  }

  /// Add a function with `params` i32 parameters and `results` i32
  /// results, backed by `callback`.
  pub fn func(
    mut self,
    name: impl Into<String>,
    params: usize,
    results: usize,
    callback: impl Fn(&[i32]) -> Result<Vec<i32>, HostFnError> + Send + Sync + 'static,
  ) -> Self {
    self.functions.push(HostFunction {
      name: name.into(),
      params,
      results,
      callback: Arc::new(callback),
    });
    self
  }

  /// The import-module name.
  pub fn name(&self) -> &str {
    &self.name
  }

  /// The functions this module exposes.
  pub fn functions(&self) -> &[HostFunction] {
    &self.functions
  }
}

/// The full table of host modules supplied to an engine at construction.
#[derive(Clone, Default)]
pub struct CapabilityBridge {
  modules: Vec<HostModule>,
}

impl CapabilityBridge {
  /// A bridge exposing no host modules. Only importless plugins can be
  /// instantiated against it.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Add a host module to the bridge.
  pub fn host_module(mut self, module: HostModule) -> Self {
    self.modules.push(module);
    self
  }

  /// The host modules in registration order.
  pub fn modules(&self) -> &[HostModule] {
    &self.modules
  }
}
