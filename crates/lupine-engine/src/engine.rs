//! The engine and function-handle traits every backend implements.

use std::path::Path;

use crate::bridge::CapabilityBridge;
use crate::error::{InstantiationError, InvocationError};

/// A live plugin engine: one module, one instance, one runtime context,
/// for the engine's entire lifetime.
///
/// Construction loads the module at `path`, registers the bridge's host
/// modules, and instantiates — running any module start code. There is no
/// close or unload operation: a plugin stays loaded until its engine is
/// dropped, and drop is the only reclamation path.
///
/// Invocations against one engine are serialized internally; callers that
/// need concurrent plugin calls use one engine per call site.
pub trait WasmEngine: Sized {
  /// The handle type returned by [`function`](Self::function).
  type Function: WasmFunction;

  /// Load the module at `path` and instantiate it against `bridge`.
  fn new(path: &Path, bridge: CapabilityBridge) -> Result<Self, InstantiationError>;

  /// Look up an exported function by exact name.
  ///
  /// Returns `None` when no export has that name or the export is not a
  /// function (memory, global, table). Absence is the normal signal that
  /// a plugin does not implement an optional entry point — it is never an
  /// error. Lookup does not invoke anything.
  fn function(&self, name: &str) -> Option<Self::Function>;
}

/// A callable handle to one exported function.
///
/// Handles borrow their engine's runtime context for the duration of each
/// call; two handles from the same engine observe the same linear memory
/// and table state.
pub trait WasmFunction {
  /// Invoke the export with positional i32 arguments.
  ///
  /// The result mirrors the export's declared result arity. Arity or type
  /// mismatches and traps fail with [`InvocationError`]; a failed call
  /// does not invalidate the engine unless the trap corrupted shared
  /// runtime state.
  fn invoke(&self, args: &[i32]) -> Result<Vec<i32>, InvocationError>;
}
