//! Lupine — a pluggable WebAssembly plugin execution host.
//!
//! Loads a compiled module from disk, instantiates it against a
//! caller-supplied [`CapabilityBridge`], and exposes exported entry points
//! as invokable handles taking and returning i32s. Built for hosts (a
//! compiler, a build tool) that load versioned or untrusted plugin
//! binaries and probe them for optional capabilities.
//!
//! # Backends
//!
//! Two engine backends implement the same contract; exactly one is active
//! per build, selected by cargo feature:
//!
//! - `wasmtime` (default): the wasmtime compiler-based runtime.
//! - `wasmi`: the wasmi interpreter, for targets the compiler can't serve.
//!
//! Callers use the [`DefaultEngine`] alias and stay backend-agnostic.
//!
//! # Lifetime
//!
//! One engine hosts one module and one instance for its entire lifetime.
//! There is no unload or close operation — a plugin stays loaded until the
//! owning engine value is dropped, which is the only reclamation path.
//!
//! # Example
//!
//! ```rust,ignore
//! use lupine::{CapabilityBridge, DefaultEngine, WasmEngine, WasmFunction};
//!
//! let engine = DefaultEngine::new(path, CapabilityBridge::empty())?;
//! if let Some(add) = engine.function("add") {
//!   let sum = add.invoke(&[2, 3])?;
//! }
//! ```

pub use lupine_engine::{
  CapabilityBridge, HostFn, HostFnError, HostFunction, HostModule, InstantiationError,
  InvocationError, LoadError, WasmEngine, WasmFunction,
};

#[cfg(feature = "wasmtime")]
pub use lupine_engine_wasmtime::{WasmtimeEngine, WasmtimeFunction};

#[cfg(feature = "wasmi")]
pub use lupine_engine_wasmi::{WasmiEngine, WasmiFunction};

/// The engine backend active in this build.
///
/// When both backend features are enabled the wasmtime backend wins, so a
/// dependency adding `wasmi` cannot silently change a caller's runtime.
#[cfg(feature = "wasmtime")]
pub type DefaultEngine = WasmtimeEngine;

/// The engine backend active in this build.
#[cfg(all(feature = "wasmi", not(feature = "wasmtime")))]
pub type DefaultEngine = WasmiEngine;

#[cfg(not(any(feature = "wasmtime", feature = "wasmi")))]
compile_error!("lupine needs an engine backend: enable the `wasmtime` (default) or `wasmi` feature");
