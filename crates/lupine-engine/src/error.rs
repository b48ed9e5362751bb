//! Error taxonomy for plugin loading, instantiation, and invocation.

use std::path::PathBuf;

/// Errors that can occur while reading and parsing a module from disk.
///
/// Always fatal to engine construction; no partial module is ever produced.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
  /// The file at the given path could not be read.
  #[error("failed to read module at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The bytes do not parse as a valid module (malformed binary,
  /// unsupported section).
  #[error("failed to parse module: {message}")]
  Parse { message: String },
}

/// Errors that can occur while constructing an engine.
///
/// Fatal to construction; no instance is observably created.
#[derive(Debug, thiserror::Error)]
pub enum InstantiationError {
  /// The module loader failed.
  #[error(transparent)]
  Load(#[from] LoadError),

  /// A declared import could not be satisfied by the capability bridge.
  #[error("unsatisfied import: {message}")]
  Link { message: String },

  /// Module initialization code trapped during instantiation.
  #[error("module start trapped: {message}")]
  Start { message: String },
}

/// Errors that can occur while invoking an exported function.
///
/// Fatal to that call only — the engine stays usable unless the trap
/// corrupted shared runtime state, in which case the caller must treat
/// the engine as dead.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
  /// Argument count does not match the export's declared signature.
  #[error("signature mismatch: function takes {expected} argument(s), got {actual}")]
  SignatureMismatch { expected: usize, actual: usize },

  /// The export declares a parameter or result type outside the i32-only
  /// surface this host supports.
  #[error("unsupported type: {message}")]
  UnsupportedType { message: String },

  /// The call trapped (unreachable, out-of-bounds access, stack
  /// exhaustion, or a host function error).
  #[error("trap: {message}")]
  Trap { message: String },
}

/// Error returned by a capability-bridge host function.
///
/// Surfaces inside the running module as a trap, and at the call site as
/// [`InvocationError::Trap`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HostFnError {
  message: String,
}

impl HostFnError {
  /// Create a host function error with the given message.
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
    }
  }
}
